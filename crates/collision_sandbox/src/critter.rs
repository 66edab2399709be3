//! Sandbox bodies

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use tycoon_engine::ecs::Entity;
use tycoon_engine::foundation::math::Vec3;
use tycoon_engine::physics::{
    BoundingBox, CollisionBody, CollisionError, CollisionTarget, MapMarker, Registrar,
};

/// Slack allowed when deciding whether two boxes touch at the reported time
const CONTACT_TOLERANCE: f32 = 1e-3;

/// Piecewise-linear path with one turning point
#[derive(Debug, Clone, Copy)]
struct Trajectory {
    turn_time: f32,
    turn_position: Vec3,
    incoming: Vec3,
    outgoing: Vec3,
}

impl Trajectory {
    fn velocity_at(&self, time: f32) -> Vec3 {
        if time < self.turn_time {
            self.incoming
        } else {
            self.outgoing
        }
    }

    fn position_at(&self, time: f32) -> Vec3 {
        self.turn_position + self.velocity_at(time) * (time - self.turn_time)
    }

    fn turn(&mut self, time: f32, outgoing: Vec3) {
        let position = self.position_at(time);
        self.incoming = self.velocity_at(time);
        self.turn_position = position;
        self.turn_time = time;
        self.outgoing = outgoing;
    }
}

/// Ballistic body that bounces off walls and backs away from other critters
pub struct Critter {
    entity: Entity,
    hitbox: BoundingBox,
    trajectory: Mutex<Trajectory>,
    durability: u32,
    hits: AtomicU32,
    disposed: AtomicBool,
    registrar: Option<Registrar>,
}

impl Critter {
    /// Critter at `position` when `time` is `spawn_time`, moving by `velocity`
    pub fn new(
        id: u32,
        size: f32,
        spawn_time: f32,
        position: Vec3,
        velocity: Vec3,
        durability: u32,
    ) -> Self {
        Self {
            entity: Entity::new(id),
            hitbox: BoundingBox::cube(size),
            trajectory: Mutex::new(Trajectory {
                turn_time: spawn_time,
                turn_position: position,
                incoming: velocity,
                outgoing: velocity,
            }),
            durability,
            hits: AtomicU32::new(0),
            disposed: AtomicBool::new(false),
            registrar: None,
        }
    }

    /// Unregister through `registrar` once worn out
    pub fn with_registrar(mut self, registrar: Registrar) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Velocity in effect at `time`
    pub fn velocity_at(&self, time: f32) -> Vec3 {
        self.trajectory().velocity_at(time)
    }

    /// Entity hits taken so far
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::Relaxed)
    }

    fn trajectory(&self) -> std::sync::MutexGuard<'_, Trajectory> {
        self.trajectory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touches(&self, here: Vec3, other: &BoundingBox) -> bool {
        let slack = Vec3::repeat(CONTACT_TOLERANCE);
        let world = self.hitbox.translated(here);
        BoundingBox::from_corners(world.min - slack, world.max + slack).intersects(other)
    }

    fn bump_into(&self, other: &dyn CollisionBody, time: f32) {
        // Sample the other body before locking our own path
        let there = other.position_at(time);
        let other_box = other.hitbox().translated(there);

        let mut trajectory = self.trajectory();
        let here = trajectory.position_at(time);
        let velocity = trajectory.velocity_at(time);
        if !self.touches(here, &other_box) || velocity.dot(&(there - here)) <= 0.0 {
            return;
        }
        trajectory.turn(time, -velocity);
        drop(trajectory);

        let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        if self.durability > 0 && hits >= self.durability {
            log::debug!("{} worn out after {hits} hits at t={time:.3}", self.entity);
            self.dispose();
            if let Some(registrar) = &self.registrar {
                registrar.remove_entity(self.entity);
            }
        }
    }

    fn bounce_off(&self, marker: &MapMarker, time: f32) {
        let mut trajectory = self.trajectory();
        let here = trajectory.position_at(time);
        let velocity = trajectory.velocity_at(time);
        let offset = marker.position - here;
        let axis = facing_axis(offset, marker.bounds.extents());

        if velocity[axis] * offset[axis] > 0.0 {
            let mut reflected = velocity;
            reflected[axis] = -reflected[axis];
            trajectory.turn(time, reflected);
        }
    }
}

/// Axis along which `offset` leaves a box with the given half-size soonest
fn facing_axis(offset: Vec3, extents: Vec3) -> usize {
    let reach = |axis: usize| offset[axis].abs() / extents[axis].max(f32::EPSILON);
    (0..3)
        .max_by(|&a, &b| reach(a).total_cmp(&reach(b)))
        .unwrap_or(0)
}

impl CollisionBody for Critter {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn hitbox(&self) -> BoundingBox {
        self.hitbox
    }

    fn position_at(&self, time: f32) -> Vec3 {
        self.trajectory().position_at(time)
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn collide_with(&self, other: CollisionTarget<'_>, time: f32) -> Result<(), CollisionError> {
        match other {
            CollisionTarget::Entity(body) => self.bump_into(body, time),
            CollisionTarget::World(marker) => self.bounce_off(marker, time),
        }
        Ok(())
    }
}
