//! Per-entity collision data cached for one detection pass

use std::fmt;
use std::sync::Arc;

use super::body::CollisionBody;
use super::bounding_box::BoundingBox;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;

/// Coordinate axis along which an array of entities is sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All three axes in array order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into a vector
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Wrapper around a registered body
///
/// Holds the hitbox captured at registration, the centre sampled at the start of the
/// current pass and the motion over the step being analysed. The projections are the
/// world-space extent of the box over that motion, so they collapse to the plain box
/// whenever `sweep` is zero.
pub struct CollisionEntity {
    body: Arc<dyn CollisionBody>,
    range: BoundingBox,
    position: Vec3,
    sweep: Vec3,
}

impl CollisionEntity {
    /// Wrap a body, reading its hitbox once
    ///
    /// A body whose hitbox changes shape later keeps its registration-time box.
    pub fn new(body: Arc<dyn CollisionBody>, time: f32) -> Self {
        let range = body.hitbox();
        let position = body.position_at(time);
        Self {
            body,
            range,
            position,
            sweep: Vec3::zeros(),
        }
    }

    /// The wrapped body
    pub fn body(&self) -> &Arc<dyn CollisionBody> {
        &self.body
    }

    /// Identity of the wrapped body
    pub fn entity(&self) -> Entity {
        self.body.entity()
    }

    /// Local bounding box captured at registration
    pub fn range(&self) -> &BoundingBox {
        &self.range
    }

    /// Centre sampled by the last `update` or `sweep_to`
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Motion over the step being analysed
    pub fn sweep(&self) -> Vec3 {
        self.sweep
    }

    /// Resample the centre at `time` and drop any swept motion
    pub fn update(&mut self, time: f32) {
        self.position = self.body.position_at(time);
        self.sweep = Vec3::zeros();
    }

    /// Sample the centre at `start` and the motion until `end`
    pub fn sweep_to(&mut self, start: f32, end: f32) {
        self.position = self.body.position_at(start);
        self.sweep = self.body.position_at(end) - self.position;
    }

    /// Lower world-space bound on `axis`
    pub fn lower(&self, axis: Axis) -> f32 {
        let i = axis.index();
        self.position[i].min(self.position[i] + self.sweep[i]) + self.range.min[i]
    }

    /// Upper world-space bound on `axis`
    pub fn upper(&self, axis: Axis) -> f32 {
        let i = axis.index();
        self.position[i].max(self.position[i] + self.sweep[i]) + self.range.max[i]
    }

    /// Lower X bound
    pub fn x_lower(&self) -> f32 {
        self.lower(Axis::X)
    }

    /// Upper X bound
    pub fn x_upper(&self) -> f32 {
        self.upper(Axis::X)
    }

    /// Lower Y bound
    pub fn y_lower(&self) -> f32 {
        self.lower(Axis::Y)
    }

    /// Upper Y bound
    pub fn y_upper(&self) -> f32 {
        self.upper(Axis::Y)
    }

    /// Lower Z bound
    pub fn z_lower(&self) -> f32 {
        self.lower(Axis::Z)
    }

    /// Upper Z bound
    pub fn z_upper(&self) -> f32 {
        self.upper(Axis::Z)
    }
}

impl fmt::Debug for CollisionEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionEntity")
            .field("entity", &self.entity())
            .field("position", &self.position)
            .field("sweep", &self.sweep)
            .field("range", &self.range)
            .finish()
    }
}
