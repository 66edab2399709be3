//! Shared fixtures for the collision tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::body::{CollisionBody, CollisionTarget};
use super::bounding_box::BoundingBox;
use super::error::CollisionError;
use super::registrar::Registrar;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;


/// One-shot registration run from inside a handler
enum HitHook {
    RemoveSelf(Registrar),
    Spawn(Registrar, Arc<TestBody>),
}

/// Body moving at constant velocity that records every notification it receives
pub(crate) struct TestBody {
    entity: Entity,
    origin: Vec3,
    velocity: Vec3,
    hitbox: Mutex<BoundingBox>,
    disposed: AtomicBool,
    dispose_on_hit: AtomicBool,
    fail_on_hit: AtomicBool,
    hits: Mutex<Vec<(Option<Entity>, f32)>>,
    hooks: Mutex<Vec<HitHook>>,
}

impl TestBody {
    /// Cube of edge `size` at `origin` when t = 0, moving by `velocity` per unit time
    pub(crate) fn moving(id: u32, origin: Vec3, velocity: Vec3, size: f32) -> Arc<Self> {
        Arc::new(Self {
            entity: Entity::new(id),
            origin,
            velocity,
            hitbox: Mutex::new(BoundingBox::cube(size)),
            disposed: AtomicBool::new(false),
            dispose_on_hit: AtomicBool::new(false),
            fail_on_hit: AtomicBool::new(false),
            hits: Mutex::new(Vec::new()),
            hooks: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn stationary(id: u32, position: Vec3, size: f32) -> Arc<Self> {
        Self::moving(id, position, Vec3::zeros(), size)
    }

    pub(crate) fn set_hitbox(&self, hitbox: BoundingBox) {
        *self.hitbox.lock().unwrap() = hitbox;
    }

    /// Dispose itself on the next notification
    pub(crate) fn dispose_on_hit(&self) {
        self.dispose_on_hit.store(true, Ordering::SeqCst);
    }

    /// Fail every notification from now on
    pub(crate) fn fail_on_hit(&self) {
        self.fail_on_hit.store(true, Ordering::SeqCst);
    }

    /// Unregister itself through `registrar` on the next notification
    pub(crate) fn remove_self_on_hit(&self, registrar: Registrar) {
        self.hooks.lock().unwrap().push(HitHook::RemoveSelf(registrar));
    }

    /// Register `child` through `registrar` on the next notification
    pub(crate) fn spawn_on_hit(&self, registrar: Registrar, child: Arc<TestBody>) {
        self.hooks.lock().unwrap().push(HitHook::Spawn(registrar, child));
    }

    /// Notifications so far as `(other entity, time)`, `None` for world geometry
    pub(crate) fn hits(&self) -> Vec<(Option<Entity>, f32)> {
        self.hits.lock().unwrap().clone()
    }

    pub(crate) fn hit_entities(&self) -> Vec<u32> {
        self.hits().iter().filter_map(|(other, _)| other.map(|e| e.id())).collect()
    }
}

impl CollisionBody for TestBody {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn hitbox(&self) -> BoundingBox {
        *self.hitbox.lock().unwrap()
    }

    fn position_at(&self, time: f32) -> Vec3 {
        self.origin + self.velocity * time
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    fn collide_with(&self, other: CollisionTarget<'_>, time: f32) -> Result<(), CollisionError> {
        if self.fail_on_hit.load(Ordering::SeqCst) {
            return Err(CollisionError::handler(self.entity, "refused contact"));
        }
        self.hits.lock().unwrap().push((other.entity(), time));
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap());
        for hook in hooks {
            match hook {
                HitHook::RemoveSelf(registrar) => registrar.remove_entity(self.entity),
                HitHook::Spawn(registrar, child) => registrar.add_entity(child)?,
            }
        }
        if self.dispose_on_hit.load(Ordering::SeqCst) {
            self.dispose();
        }
        Ok(())
    }
}
