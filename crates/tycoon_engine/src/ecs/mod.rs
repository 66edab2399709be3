//! Entity identity shared between the simulation and its subsystems
//!
//! Entities themselves live in the game layer; subsystems only see their identifiers.

mod entity;

pub use entity::Entity;
