//! Physics module for collision detection
//!
//! Swept sweep-and-prune collision detection over axis-aligned bounding boxes. Game
//! entities implement [`CollisionBody`] and register with a [`CollisionDetection`],
//! which is driven once per tick by the simulation loop:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tycoon_engine::core::CollisionConfig;
//! use tycoon_engine::physics::{CollisionBody, CollisionDetection, CollisionError};
//!
//! fn tick(
//!     detection: &mut CollisionDetection,
//!     spawned: Vec<Arc<dyn CollisionBody>>,
//!     time: f32,
//!     delta_time: f32,
//! ) -> Result<(), CollisionError> {
//!     detection.add_entities(spawned)?;
//!     detection.pre_update_entities(time)?;
//!     let report = detection.analyse_collisions(time, delta_time)?;
//!     log::debug!("{} candidate pairs", report.candidate_pairs);
//!     Ok(())
//! }
//! # let _ = CollisionDetection::new(CollisionConfig::default());
//! ```

pub mod body;
pub mod bounding_box;
pub mod collision_detection;
pub mod collision_entity;
pub mod error;
pub mod registrar;
pub mod sorting;
pub mod world;

#[cfg(test)]
pub(crate) mod tests;

pub use body::{CollisionBody, CollisionTarget, MapMarker};
pub use bounding_box::BoundingBox;
pub use collision_detection::{CollisionDetection, CollisionReport, EntryKey, MAX_COLLISION_ITERATIONS};
pub use collision_entity::{Axis, CollisionEntity};
pub use error::CollisionError;
pub use registrar::Registrar;
pub use world::{ObstacleField, WorldCollider};
