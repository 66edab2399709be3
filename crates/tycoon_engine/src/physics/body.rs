//! The interface between the collision detector and the entities it tracks
//!
//! The detector never owns game behaviour. It reads a body's local hitbox and its
//! position as a function of time, and reports contacts back through
//! [`CollisionBody::collide_with`].

use super::bounding_box::BoundingBox;
use super::error::CollisionError;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;

/// An entity taking part in collision detection
///
/// Bodies are shared as `Arc<dyn CollisionBody>` and may be called from rayon worker
/// threads while pairs are resolved, so any state changed by a handler needs interior
/// mutability.
pub trait CollisionBody: Send + Sync {
    /// Stable identity of this body, unique among registered bodies
    fn entity(&self) -> Entity;

    /// Local-space bounding box, read once when the body is registered
    fn hitbox(&self) -> BoundingBox;

    /// World-space centre at an arbitrary time within the current or next tick
    fn position_at(&self, time: f32) -> Vec3;

    /// Whether this body has been disposed and must be ignored
    fn is_disposed(&self) -> bool;

    /// Dispose this body; called for every remaining body on detector cleanup
    fn dispose(&self);

    /// Contact notification at game time `time`
    ///
    /// The detector notifies every broad-phase candidate pair, including pairs whose swept
    /// boxes never actually touch during the step (then `time` is the end of the step).
    /// The handler decides whether a real collision happened.
    fn collide_with(&self, other: CollisionTarget<'_>, time: f32) -> Result<(), CollisionError>;
}

/// What a body collided with
#[derive(Clone, Copy)]
pub enum CollisionTarget<'a> {
    /// Another registered body
    Entity(&'a dyn CollisionBody),
    /// A piece of static world geometry
    World(&'a MapMarker),
}

impl CollisionTarget<'_> {
    /// Entity on the other side, if it is a body
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::Entity(body) => Some(body.entity()),
            Self::World(_) => None,
        }
    }
}

impl std::fmt::Debug for CollisionTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(body) => f.debug_tuple("Entity").field(&body.entity()).finish(),
            Self::World(marker) => f.debug_tuple("World").field(marker).finish(),
        }
    }
}

/// Static world geometry that bodies can run into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMarker {
    /// Identifier assigned by the map
    pub id: u32,
    /// World-space centre
    pub position: Vec3,
    /// Local-space bounds around `position`
    pub bounds: BoundingBox,
}

impl MapMarker {
    /// Create a marker
    pub fn new(id: u32, position: Vec3, bounds: BoundingBox) -> Self {
        Self { id, position, bounds }
    }

    /// World-space bounding box
    pub fn world_bounds(&self) -> BoundingBox {
        self.bounds.translated(self.position)
    }
}
