//! Buffered registration shared between the detector and its callers
//!
//! A [`Registrar`] is a cheap, cloneable handle onto the detector's pending buffers.
//! Bodies can keep one and register or unregister entities from inside their own
//! `collide_with` handler, and other threads can do the same while a sweep runs. Nothing
//! takes effect until the next [`CollisionDetection::pre_update_entities`].
//!
//! [`CollisionDetection::pre_update_entities`]: super::CollisionDetection::pre_update_entities

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::body::CollisionBody;
use super::error::CollisionError;
use crate::ecs::Entity;

/// Registrations buffered until the next pre-update
#[derive(Default)]
pub(crate) struct PendingChanges {
    pub(crate) inserts: Vec<Arc<dyn CollisionBody>>,
    pub(crate) insert_ids: HashSet<Entity>,
    pub(crate) removals: HashSet<Entity>,
}

/// Pending buffers plus the ids that are currently active, kept in step by each flush
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) pending: PendingChanges,
    pub(crate) active_ids: HashSet<Entity>,
}

/// Handle for queueing insertions and removals from any thread or handler
#[derive(Clone, Default)]
pub struct Registrar {
    shared: Arc<Mutex<Registry>>,
}

impl Registrar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pending state survives a panic in another holder: it is plain data
    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a body for insertion at the next pre-update
    ///
    /// Registering an entity that is already active or already queued is a caller bug and
    /// is rejected with [`CollisionError::DuplicateEntity`].
    pub fn add_entity(&self, body: Arc<dyn CollisionBody>) -> Result<(), CollisionError> {
        let entity = body.entity();
        let mut registry = self.lock();

        if registry.active_ids.contains(&entity) || !registry.pending.insert_ids.insert(entity) {
            return Err(CollisionError::DuplicateEntity(entity));
        }
        registry.pending.inserts.push(body);
        Ok(())
    }

    /// Queue several bodies for insertion, stopping at the first duplicate
    pub fn add_entities<I>(&self, bodies: I) -> Result<(), CollisionError>
    where
        I: IntoIterator<Item = Arc<dyn CollisionBody>>,
    {
        bodies.into_iter().try_for_each(|body| self.add_entity(body))
    }

    /// Queue an entity for removal at the next pre-update
    pub fn remove_entity(&self, entity: Entity) {
        self.lock().pending.removals.insert(entity);
    }

    /// Whether the entity is active or awaiting insertion
    pub fn contains(&self, entity: Entity) -> bool {
        let registry = self.lock();
        registry.active_ids.contains(&entity) || registry.pending.insert_ids.contains(&entity)
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("Registrar")
            .field("active", &registry.active_ids.len())
            .field("pending_inserts", &registry.pending.inserts.len())
            .field("pending_removals", &registry.pending.removals.len())
            .finish()
    }
}
