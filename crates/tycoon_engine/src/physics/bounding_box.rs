//! Axis-aligned bounding boxes and swept collision arithmetic
//!
//! A [`BoundingBox`] is expressed in an entity's local space: `min` and `max` are offsets
//! from the entity's centre, so `min` is usually negative. World-space extents are
//! obtained by adding the entity position.

use crate::foundation::math::{utils, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a box from its six bounds
    pub fn new(min_x: f32, min_y: f32, min_z: f32, max_x: f32, max_y: f32, max_z: f32) -> Self {
        Self {
            min: Vec3::new(min_x, min_y, min_z),
            max: Vec3::new(max_x, max_y, max_z),
        }
    }

    /// Create a box from its minimum and maximum corners
    pub fn from_corners(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centred on the origin with the given half-size on every axis
    pub fn from_half_extents(half_extents: Vec3) -> Self {
        Self {
            min: -half_extents,
            max: half_extents,
        }
    }

    /// Create a cube centred on the origin with the given edge length
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;
        Self::from_half_extents(Vec3::new(half, half, half))
    }

    /// Lower X bound
    pub fn min_x(&self) -> f32 {
        self.min.x
    }

    /// Lower Y bound
    pub fn min_y(&self) -> f32 {
        self.min.y
    }

    /// Lower Z bound
    pub fn min_z(&self) -> f32 {
        self.min.z
    }

    /// Upper X bound
    pub fn max_x(&self) -> f32 {
        self.max.x
    }

    /// Upper Y bound
    pub fn max_y(&self) -> f32 {
        self.max.y
    }

    /// Upper Z bound
    pub fn max_z(&self) -> f32 {
        self.max.z
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Translate all six bounds by `displacement`
    pub fn translate(&mut self, displacement: Vec3) {
        self.min += displacement;
        self.max += displacement;
    }

    /// Copy of this box translated by `displacement`
    pub fn translated(&self, displacement: Vec3) -> Self {
        let mut moved = *self;
        moved.translate(displacement);
        moved
    }

    /// The eight corners, ordered by the bit pattern `zyx` of max-ness
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Check if this box contains a point (boundaries included)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box intersects another box in the same space (touching counts)
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: utils::component_min(&self.min, &other.min),
            max: utils::component_max(&self.max, &other.max),
        }
    }

    /// Fraction `t >= 0` at which the ray `origin + t * dir` enters this box
    ///
    /// Slab test: returns `0.0` when `origin` already lies inside the box and
    /// `f32::INFINITY` when the ray never enters it. There is no upper bound on `t`.
    pub fn intersect_movement(&self, origin: Vec3, dir: Vec3) -> f32 {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;

        for axis in 0..3 {
            let (o, d) = (origin[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d == 0.0 {
                // Parallel to this slab: either always inside it or never
                if o < lo || o > hi {
                    return f32::INFINITY;
                }
                continue;
            }

            let inv = 1.0 / d;
            let t1 = (lo - o) * inv;
            let t2 = (hi - o) * inv;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_exit < t_enter || t_exit < 0.0 {
            f32::INFINITY
        } else {
            t_enter.max(0.0)
        }
    }

    /// Fraction of a unit time step at which this box first runs into `other`
    ///
    /// Both boxes translate linearly over `[0, 1]`: this one from `this_pos` by
    /// `this_move`, the other from `other_pos` by `other_move`. Each corner of this box is
    /// cast as a ray through the other box in the frame where the other box is at rest,
    /// and the earliest entry wins, clamped to `1.0`. Identical movements yield `1.0`
    /// even when the boxes already overlap.
    ///
    /// Corner sampling is an approximation: an edge or face of this box crossing a corner
    /// of `other` is missed, which is why callers evaluate both perspectives.
    pub fn relative_collision_fraction(
        &self,
        this_pos: Vec3,
        this_move: Vec3,
        other: &BoundingBox,
        other_pos: Vec3,
        other_move: Vec3,
    ) -> f32 {
        if this_move == other_move {
            return 1.0;
        }

        let relative_pos = this_pos - other_pos;
        let relative_move = this_move - other_move;

        self.corners()
            .iter()
            .map(|corner| other.intersect_movement(corner + relative_pos, relative_move))
            .fold(1.0, f32::min)
    }
}
