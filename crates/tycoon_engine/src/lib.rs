//! # Tycoon Engine
//!
//! Simulation-side engine subsystems for a tycoon game, starting with swept
//! sweep-and-prune collision detection.
//!
//! ## Features
//!
//! - **Collision Detection**: Axis-sorted broad phase over swept bounding boxes
//! - **Swept Narrow Phase**: Earliest time of contact within a step
//! - **Parallel Resolution**: Candidate pairs resolved on the rayon thread pool
//! - **Configuration**: TOML and RON settings files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tycoon_engine::prelude::*;
//!
//! fn simulate(bodies: Vec<Arc<dyn CollisionBody>>) -> Result<(), CollisionError> {
//!     let mut detection = CollisionDetection::new(CollisionConfig::default());
//!     detection.add_entities(bodies)?;
//!
//!     let mut clock = SimulationClock::new(0.0, 1.0 / 30.0);
//!     for _ in 0..300 {
//!         detection.pre_update_entities(clock.time())?;
//!         detection.analyse_collisions(clock.time(), clock.delta_time())?;
//!         clock.advance();
//!     }
//!
//!     detection.cleanup();
//!     Ok(())
//! }
//! # simulate(Vec::new()).unwrap();
//! ```

#![warn(missing_docs)]

pub mod core;

pub mod config;
pub mod foundation;
pub mod ecs;
pub mod physics;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::{CollisionConfig, EngineConfig},
        ecs::Entity,
        foundation::{
            math::Vec3,
            time::{SimulationClock, Stopwatch},
        },
        physics::{
            BoundingBox, CollisionBody, CollisionDetection, CollisionError, CollisionReport,
            CollisionTarget, MapMarker, ObstacleField, Registrar, WorldCollider,
        },
    };
}
