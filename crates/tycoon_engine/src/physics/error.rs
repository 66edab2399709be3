//! Collision subsystem errors

use thiserror::Error;

use super::collision_entity::Axis;
use crate::ecs::Entity;

/// Errors raised by the collision detector and the handlers it calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// An entity was registered while already active or already pending insertion
    #[error("{0} is already registered with the collision detector")]
    DuplicateEntity(Entity),

    /// The sorted axis arrays disagree with each other or are out of order
    #[error("collision invariant violated on {axis} axis: {detail}")]
    InvariantViolation {
        /// Axis whose array failed the check
        axis: Axis,
        /// What failed, followed by a dump of the offending array
        detail: String,
    },

    /// A `collide_with` handler failed; the current pass is aborted
    #[error("collision handler of {entity} failed: {message}")]
    Handler {
        /// Entity whose handler failed
        entity: Entity,
        /// Handler-supplied reason
        message: String,
    },
}

impl CollisionError {
    /// Convenience constructor for handler failures
    pub fn handler(entity: Entity, message: impl Into<String>) -> Self {
        Self::Handler {
            entity,
            message: message.into(),
        }
    }
}
