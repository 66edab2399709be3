//! Broad-phase collision detection with swept narrow-phase resolution
//!
//! Every registered body is wrapped once in an arena and referenced from three arrays,
//! each kept sorted on the lower bound of one axis. A tick runs in two steps driven by
//! the simulation loop:
//!
//! 1. [`CollisionDetection::pre_update_entities`] merges buffered registrations into the
//!    arrays, drops buffered removals, resamples every centre and re-sorts.
//! 2. [`CollisionDetection::analyse_collisions`] sweeps every box over the step, counts
//!    per-pair axis overlaps in an `n × n` matrix (sweep and prune on each sorted array),
//!    takes the pairs overlapping on all three axes as candidates and resolves them up
//!    to [`MAX_COLLISION_ITERATIONS`] times.
//!
//! Candidate extraction walks the full matrix, so its cost is quadratic in the number of
//! entities regardless of how sparse the scene is.

use std::collections::{HashMap, HashSet};
use std::cmp::Ordering;
use std::sync::Arc;

use rayon::prelude::*;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use super::body::{CollisionBody, CollisionTarget};
use super::bounding_box::BoundingBox;
use super::collision_entity::{Axis, CollisionEntity};
use super::error::CollisionError;
use super::registrar::{PendingChanges, Registrar};
use super::sorting::{first_unsorted_by, merge_sorted_by, resort_by};
use super::world::WorldCollider;
use crate::core::config::CollisionConfig;
use crate::ecs::Entity;

/// Upper bound on resolution passes over the candidate pairs in one step
pub const MAX_COLLISION_ITERATIONS: usize = 5;

/// Overlapping axes needed for a pair to become a candidate
const CANDIDATE_AXIS_COUNT: u8 = 3;

new_key_type! {
    /// Arena key of a [`CollisionEntity`]
    pub struct EntryKey;
}

/// Outcome of one [`CollisionDetection::analyse_collisions`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Pairs overlapping on all three axes
    pub candidate_pairs: usize,
    /// Resolution passes run over the candidates
    pub iterations: usize,
    /// Pairs that met within the step, summed over all passes
    pub collisions: usize,
}

/// Broad-phase candidate frozen for the resolution loop
struct CandidatePair {
    alpha: Arc<dyn CollisionBody>,
    alpha_range: BoundingBox,
    beta: Arc<dyn CollisionBody>,
    beta_range: BoundingBox,
}

impl CandidatePair {
    fn new(alpha: &CollisionEntity, beta: &CollisionEntity) -> Self {
        Self {
            alpha: Arc::clone(alpha.body()),
            alpha_range: *alpha.range(),
            beta: Arc::clone(beta.body()),
            beta_range: *beta.range(),
        }
    }

    /// Notify both bodies; `Ok(true)` when their boxes meet within the step
    ///
    /// Disposal is checked here, right before acting, since a handler of another pair
    /// may have disposed either body in the meantime.
    fn resolve(&self, current_time: f32, delta_time: f32) -> Result<bool, CollisionError> {
        if self.alpha.is_disposed() || self.beta.is_disposed() {
            return Ok(false);
        }

        let end_time = current_time + delta_time;
        let alpha_start = self.alpha.position_at(current_time);
        let alpha_move = self.alpha.position_at(end_time) - alpha_start;
        let beta_start = self.beta.position_at(current_time);
        let beta_move = self.beta.position_at(end_time) - beta_start;

        // Corner sampling is not symmetric, so both perspectives are evaluated
        let from_alpha = self.alpha_range.relative_collision_fraction(
            alpha_start, alpha_move, &self.beta_range, beta_start, beta_move,
        );
        let from_beta = self.beta_range.relative_collision_fraction(
            beta_start, beta_move, &self.alpha_range, alpha_start, alpha_move,
        );
        let fraction = from_alpha.min(from_beta);
        let collision_time = current_time + fraction * delta_time;

        self.alpha.collide_with(CollisionTarget::Entity(&*self.beta), collision_time)?;
        self.beta.collide_with(CollisionTarget::Entity(&*self.alpha), collision_time)?;

        Ok(fraction < 1.0)
    }
}

/// Sweep-and-prune collision detector over axis-aligned bounding boxes
///
/// Registration is buffered in a shared [`Registrar`]. Handlers and other threads hold a
/// clone from [`CollisionDetection::registrar`], so they can queue changes while a sweep
/// runs. Everything touching the sorted arrays takes `&mut self`.
pub struct CollisionDetection {
    config: CollisionConfig,
    entries: SlotMap<EntryKey, CollisionEntity>,
    /// Entry keys sorted on the lower bound of x, y and z respectively
    sorted: [Vec<EntryKey>; 3],
    active: HashMap<Entity, EntryKey>,
    registrar: Registrar,
    world: Option<Box<dyn WorldCollider>>,
}

impl CollisionDetection {
    /// Create an empty detector
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            entries: SlotMap::with_key(),
            sorted: [Vec::new(), Vec::new(), Vec::new()],
            active: HashMap::new(),
            registrar: Registrar::new(),
            world: None,
        }
    }

    /// Create an empty detector that also checks bodies against static world geometry
    pub fn with_world(config: CollisionConfig, world: Box<dyn WorldCollider>) -> Self {
        let mut detection = Self::new(config);
        detection.world = Some(world);
        detection
    }

    /// Install or replace the world collider
    pub fn set_world_collider(&mut self, world: Box<dyn WorldCollider>) {
        self.world = Some(world);
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Handle onto the pending buffers, for handlers and other threads
    pub fn registrar(&self) -> Registrar {
        self.registrar.clone()
    }

    /// Queue a body for insertion at the next pre-update, see [`Registrar::add_entity`]
    pub fn add_entity(&self, body: Arc<dyn CollisionBody>) -> Result<(), CollisionError> {
        self.registrar.add_entity(body)
    }

    /// Queue several bodies for insertion, stopping at the first duplicate
    pub fn add_entities<I>(&self, bodies: I) -> Result<(), CollisionError>
    where
        I: IntoIterator<Item = Arc<dyn CollisionBody>>,
    {
        self.registrar.add_entities(bodies)
    }

    /// Queue an entity for removal at the next pre-update
    pub fn remove_entity(&self, entity: Entity) {
        self.registrar.remove_entity(entity);
    }

    /// Apply buffered registrations, resample every centre at `game_time` and re-sort
    ///
    /// Insertions are applied before removals, so an entity added and removed within the
    /// same tick never becomes active.
    pub fn pre_update_entities(&mut self, game_time: f32) -> Result<(), CollisionError> {
        // Held across the flush so the active ids never lag behind a queued insertion
        let registrar = self.registrar.clone();
        let mut registry = registrar.lock();
        let PendingChanges { inserts, removals, .. } = std::mem::take(&mut registry.pending);

        let inserted = inserts.len();
        registry.active_ids.extend(inserts.iter().map(|body| body.entity()));
        self.flush_insertions(inserts, game_time);
        let removed = self.flush_removals(&removals);
        for entity in &removals {
            registry.active_ids.remove(entity);
        }
        drop(registry);
        if inserted > 0 || removed > 0 {
            log::debug!(
                "Collision pre-update at t={game_time}: +{inserted} -{removed}, {} active",
                self.entries.len()
            );
        }

        for entry in self.entries.values_mut() {
            entry.update(game_time);
        }
        self.resort_axes();

        if self.config.check_invariants {
            self.test_invariants()?;
        }
        Ok(())
    }

    /// Wrap new bodies and merge them into the sorted arrays
    fn flush_insertions(&mut self, bodies: Vec<Arc<dyn CollisionBody>>, time: f32) {
        if bodies.is_empty() {
            return;
        }

        let mut keys = Vec::with_capacity(bodies.len());
        for body in bodies {
            let entity = body.entity();
            let key = self.entries.insert(CollisionEntity::new(body, time));
            self.active.insert(entity, key);
            keys.push(key);
        }

        let entries = &self.entries;
        for axis in Axis::ALL {
            let compare = |a: &EntryKey, b: &EntryKey| compare_lower(entries, axis, *a, *b);
            let mut incoming = keys.clone();
            incoming.sort_by(compare);
            let existing = std::mem::take(&mut self.sorted[axis.index()]);
            self.sorted[axis.index()] = merge_sorted_by(existing, incoming, compare);
        }
    }

    /// Drop removed entities from all arrays, keeping survivors in order
    fn flush_removals(&mut self, removals: &HashSet<Entity>) -> usize {
        if removals.is_empty() {
            return 0;
        }

        let entries = &self.entries;
        for order in &mut self.sorted {
            order.retain(|key| !removals.contains(&entries[*key].entity()));
        }

        let mut removed = 0;
        for entity in removals {
            if let Some(key) = self.active.remove(entity) {
                self.entries.remove(key);
                removed += 1;
            }
        }
        removed
    }

    fn resort_axes(&mut self) {
        let entries = &self.entries;
        let threshold = self.config.insertion_sort_threshold;
        for axis in Axis::ALL {
            resort_by(&mut self.sorted[axis.index()], threshold, |a, b| {
                compare_lower(entries, axis, *a, *b)
            });
        }
    }

    /// Detect and report collisions over `[current_time, current_time + delta_time]`
    ///
    /// Every candidate pair is notified on each pass, whether or not the swept boxes meet
    /// within the step; only pairs that do meet count towards [`CollisionReport::collisions`]
    /// and keep the loop going. A handler error aborts the pass and is returned as is.
    pub fn analyse_collisions(
        &mut self,
        current_time: f32,
        delta_time: f32,
    ) -> Result<CollisionReport, CollisionError> {
        let end_time = current_time + delta_time;
        for entry in self.entries.values_mut() {
            entry.sweep_to(current_time, end_time);
        }
        self.resort_axes();

        if let Some(world) = &self.world {
            for key in &self.sorted[Axis::X.index()] {
                let entry = &self.entries[*key];
                if !entry.body().is_disposed() {
                    world.collide_entity(&**entry.body(), entry.range(), current_time, end_time)?;
                }
            }
        }

        let pairs: Vec<CandidatePair> = self
            .intersecting_pairs()
            .into_iter()
            .map(|(alpha, beta)| CandidatePair::new(&self.entries[alpha], &self.entries[beta]))
            .collect();

        let mut report = CollisionReport {
            candidate_pairs: pairs.len(),
            ..CollisionReport::default()
        };
        if pairs.is_empty() {
            return Ok(report);
        }

        let mut collided = 0;
        while report.iterations < MAX_COLLISION_ITERATIONS {
            collided = self.resolve_pairs(&pairs, current_time, delta_time)?;
            report.iterations += 1;
            report.collisions += collided;
            log::trace!(
                "Collision pass {} at t={current_time}: {collided} of {} pairs met",
                report.iterations,
                pairs.len()
            );
            if collided == 0 {
                break;
            }
        }

        if collided > 0 {
            log::debug!(
                "Collision resolution hit the {MAX_COLLISION_ITERATIONS} pass cap at t={current_time} with {collided} pairs still meeting"
            );
        }
        Ok(report)
    }

    /// One pass over the candidates, returning how many met within the step
    fn resolve_pairs(
        &self,
        pairs: &[CandidatePair],
        current_time: f32,
        delta_time: f32,
    ) -> Result<usize, CollisionError> {
        if self.config.resolves_in_parallel(pairs.len()) {
            pairs
                .par_iter()
                .map(|pair| pair.resolve(current_time, delta_time).map(usize::from))
                .try_reduce(|| 0, |a, b| Ok(a + b))
        } else {
            pairs
                .iter()
                .map(|pair| pair.resolve(current_time, delta_time).map(usize::from))
                .sum()
        }
    }

    /// Pairs whose current projections overlap on all three axes
    ///
    /// Each entity's dense id is its position in the x-sorted array. Every axis is swept
    /// forward from each entity while the next lower bound does not exceed its upper
    /// bound, counting overlaps symmetrically. Pairs come out ordered by `(i, j)`, `i < j`.
    fn intersecting_pairs(&self) -> Vec<(EntryKey, EntryKey)> {
        let by_x = &self.sorted[Axis::X.index()];
        let n = by_x.len();
        if n < 2 {
            return Vec::new();
        }

        let mut ids: SecondaryMap<EntryKey, usize> = SecondaryMap::with_capacity(n);
        for (id, key) in by_x.iter().enumerate() {
            ids.insert(*key, id);
        }

        let mut overlaps = vec![0u8; n * n];
        for axis in Axis::ALL {
            let order = &self.sorted[axis.index()];
            for (position, key) in order.iter().enumerate() {
                let upper = self.entries[*key].upper(axis);
                let i = ids[*key];
                for other in &order[position + 1..] {
                    if self.entries[*other].lower(axis) > upper {
                        break;
                    }
                    let j = ids[*other];
                    overlaps[i * n + j] += 1;
                    overlaps[j * n + i] += 1;
                }
            }
        }

        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if overlaps[i * n + j] >= CANDIDATE_AXIS_COUNT {
                    pairs.push((by_x[i], by_x[j]));
                }
            }
        }
        pairs
    }

    /// Broad-phase candidates for the current projections, lower x-rank first
    pub fn candidate_pairs(&self) -> Vec<(Entity, Entity)> {
        self.intersecting_pairs()
            .into_iter()
            .map(|(alpha, beta)| (self.entries[alpha].entity(), self.entries[beta].entity()))
            .collect()
    }

    /// Verify that the three arrays hold the same entities, each sorted on its axis
    pub fn test_invariants(&self) -> Result<(), CollisionError> {
        if self.active.len() != self.entries.len() {
            return Err(self.violation(
                Axis::X,
                format!("{} active ids for {} wrappers", self.active.len(), self.entries.len()),
            ));
        }

        let expected: HashSet<EntryKey> = self.entries.keys().collect();
        for axis in Axis::ALL {
            let order = &self.sorted[axis.index()];
            if order.len() != expected.len() {
                return Err(self.violation(
                    axis,
                    format!("holds {} entries, expected {}", order.len(), expected.len()),
                ));
            }
            let present: HashSet<EntryKey> = order.iter().copied().collect();
            if present != expected {
                return Err(self.violation(axis, "holds a different entity set".to_string()));
            }
            let unsorted = first_unsorted_by(order, |a, b| compare_lower(&self.entries, axis, *a, *b));
            if let Some(position) = unsorted {
                return Err(self.violation(
                    axis,
                    format!("entry {position} sorts before its predecessor"),
                ));
            }
        }
        Ok(())
    }

    fn violation(&self, axis: Axis, reason: String) -> CollisionError {
        let detail = format!("{reason}; [{}]", self.dump_axis(axis));
        log::error!("Collision invariant violated on {axis} axis: {detail}");
        CollisionError::InvariantViolation { axis, detail }
    }

    fn dump_axis(&self, axis: Axis) -> String {
        self.sorted[axis.index()]
            .iter()
            .map(|key| match self.entries.get(*key) {
                Some(entry) => format!("{}@{:.3}", entry.entity(), entry.lower(axis)),
                None => format!("{key:?}@dangling"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Snapshot of active bodies followed by bodies awaiting insertion
    pub fn entity_list(&self) -> Vec<Arc<dyn CollisionBody>> {
        let mut bodies: Vec<Arc<dyn CollisionBody>> = self.sorted[Axis::X.index()]
            .iter()
            .map(|key| Arc::clone(self.entries[*key].body()))
            .collect();
        bodies.extend(self.registrar.lock().pending.inserts.iter().cloned());
        bodies
    }

    /// Whether the entity is active or awaiting insertion
    pub fn contains(&self, entity: Entity) -> bool {
        self.registrar.contains(entity)
    }

    /// Visit every active body in x order
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&dyn CollisionBody),
    {
        for key in &self.sorted[Axis::X.index()] {
            f(&**self.entries[*key].body());
        }
    }

    /// Number of active bodies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no body is active
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active entities in the order of the array sorted on `axis`
    pub fn axis_order(&self, axis: Axis) -> Vec<Entity> {
        self.sorted[axis.index()]
            .iter()
            .map(|key| self.entries[*key].entity())
            .collect()
    }

    /// Dispose every active and pending body and tear the detector down
    ///
    /// Outstanding [`Registrar`] clones stay usable but no longer feed any detector.
    pub fn cleanup(self) {
        let pending = {
            let mut registry = self.registrar.lock();
            registry.active_ids.clear();
            std::mem::take(&mut registry.pending)
        };
        let disposed = self.entries.len() + pending.inserts.len();

        for entry in self.entries.values() {
            entry.body().dispose();
        }
        for body in &pending.inserts {
            body.dispose();
        }
        log::info!("Collision detection cleaned up, disposed {disposed} entities");
    }
}

fn compare_lower(
    entries: &SlotMap<EntryKey, CollisionEntity>,
    axis: Axis,
    a: EntryKey,
    b: EntryKey,
) -> Ordering {
    entries[a].lower(axis).total_cmp(&entries[b].lower(axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::tests::TestBody;

    fn detector() -> CollisionDetection {
        CollisionDetection::new(CollisionConfig::debug())
    }

    #[test]
    fn test_add_is_buffered_until_pre_update() {
        let mut detection = detector();
        let body = TestBody::stationary(1, Vec3::zeros(), 1.0);

        detection.add_entity(body).unwrap();
        assert!(detection.contains(Entity::new(1)));
        assert_eq!(detection.len(), 0);
        assert_eq!(detection.entity_list().len(), 1);

        detection.pre_update_entities(0.0).unwrap();
        assert_eq!(detection.len(), 1);
        assert_eq!(detection.axis_order(Axis::Y), vec![Entity::new(1)]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut detection = detector();
        let body = TestBody::stationary(1, Vec3::zeros(), 1.0);

        detection.add_entity(body.clone()).unwrap();
        assert_eq!(
            detection.add_entity(body.clone()),
            Err(CollisionError::DuplicateEntity(Entity::new(1)))
        );

        detection.pre_update_entities(0.0).unwrap();
        assert_eq!(
            detection.add_entity(body),
            Err(CollisionError::DuplicateEntity(Entity::new(1)))
        );
    }

    #[test]
    fn test_add_entities_stops_at_duplicate() {
        let detection = detector();
        let a: Arc<dyn CollisionBody> = TestBody::stationary(1, Vec3::zeros(), 1.0);
        let b: Arc<dyn CollisionBody> = TestBody::stationary(2, Vec3::zeros(), 1.0);

        let result = detection.add_entities(vec![Arc::clone(&a), b, a]);

        assert_eq!(result, Err(CollisionError::DuplicateEntity(Entity::new(1))));
        assert!(detection.contains(Entity::new(2)));
    }

    #[test]
    fn test_insertion_merges_into_sorted_arrays() {
        let mut detection = detector();
        for (id, x) in [(1, 10.0), (2, -4.0), (3, 3.0)] {
            detection.add_entity(TestBody::stationary(id, Vec3::new(x, -x, 0.0), 1.0)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();

        for (id, x) in [(4, 0.0), (5, 20.0), (6, -9.0)] {
            detection.add_entity(TestBody::stationary(id, Vec3::new(x, -x, 0.0), 1.0)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();

        let ids = |order: Vec<Entity>| order.iter().map(Entity::id).collect::<Vec<_>>();
        assert_eq!(ids(detection.axis_order(Axis::X)), vec![6, 2, 4, 3, 1, 5]);
        assert_eq!(ids(detection.axis_order(Axis::Y)), vec![5, 1, 3, 4, 2, 6]);
        detection.test_invariants().unwrap();
    }

    #[test]
    fn test_removal_preserves_survivor_order() {
        let mut detection = detector();
        for id in 0..6 {
            detection.add_entity(TestBody::stationary(id, Vec3::new(id as f32 * 3.0, 0.0, 0.0), 1.0)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();

        detection.remove_entity(Entity::new(1));
        detection.remove_entity(Entity::new(4));
        detection.remove_entity(Entity::new(99));
        detection.pre_update_entities(0.0).unwrap();

        let ids: Vec<u32> = detection.axis_order(Axis::X).iter().map(Entity::id).collect();
        assert_eq!(ids, vec![0, 2, 3, 5]);
        assert_eq!(detection.len(), 4);
        assert!(!detection.contains(Entity::new(4)));
    }

    #[test]
    fn test_resort_after_motion() {
        let mut detection = detector();
        // 1 starts left of 2 and overtakes it by t=10
        detection.add_entity(TestBody::moving(1, Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), 1.0)).unwrap();
        detection.add_entity(TestBody::stationary(2, Vec3::new(5.0, 0.0, 0.0), 1.0)).unwrap();

        detection.pre_update_entities(0.0).unwrap();
        assert_eq!(detection.axis_order(Axis::X), vec![Entity::new(1), Entity::new(2)]);

        detection.pre_update_entities(10.0).unwrap();
        assert_eq!(detection.axis_order(Axis::X), vec![Entity::new(2), Entity::new(1)]);
    }

    #[test]
    fn test_comparison_sort_above_threshold() {
        let config = CollisionConfig {
            insertion_sort_threshold: 0,
            ..CollisionConfig::debug()
        };
        let mut detection = CollisionDetection::new(config);
        for id in 0..20u32 {
            let x = ((id * 7) % 20) as f32;
            detection.add_entity(TestBody::stationary(id, Vec3::new(x, 0.0, 0.0), 0.5)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();
        detection.test_invariants().unwrap();
    }

    #[test]
    fn test_for_each_visits_active_bodies() {
        let mut detection = detector();
        for id in 0..3 {
            detection.add_entity(TestBody::stationary(id, Vec3::new(id as f32, 0.0, 0.0), 0.5)).unwrap();
        }
        detection.add_entity(TestBody::stationary(9, Vec3::zeros(), 0.5)).unwrap();
        detection.remove_entity(Entity::new(9));
        detection.pre_update_entities(0.0).unwrap();

        let mut seen = Vec::new();
        detection.for_each(|body| seen.push(body.entity().id()));
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_invariant_breach_is_reported() {
        let mut detection = detector();
        for id in 0..3 {
            detection.add_entity(TestBody::stationary(id, Vec3::new(id as f32, 0.0, 0.0), 0.5)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();

        detection.sorted[Axis::Y.index()].pop();
        let error = detection.test_invariants().unwrap_err();
        assert!(matches!(error, CollisionError::InvariantViolation { axis: Axis::Y, .. }));

        detection.pre_update_entities(0.0).unwrap_err();
    }

    #[test]
    fn test_unsorted_axis_is_reported() {
        let mut detection = detector();
        for id in 0..3 {
            detection.add_entity(TestBody::stationary(id, Vec3::new(0.0, 0.0, id as f32), 0.5)).unwrap();
        }
        detection.pre_update_entities(0.0).unwrap();

        detection.sorted[Axis::Z.index()].swap(0, 2);
        match detection.test_invariants() {
            Err(CollisionError::InvariantViolation { axis, detail }) => {
                assert_eq!(axis, Axis::Z);
                assert!(detail.contains("entity#2"));
            }
            other => panic!("expected an invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn test_cleanup_disposes_active_and_pending() {
        let mut detection = detector();
        let active = TestBody::stationary(1, Vec3::zeros(), 1.0);
        let pending = TestBody::stationary(2, Vec3::zeros(), 1.0);

        detection.add_entity(active.clone()).unwrap();
        detection.pre_update_entities(0.0).unwrap();
        detection.add_entity(pending.clone()).unwrap();

        detection.cleanup();

        assert!(active.is_disposed());
        assert!(pending.is_disposed());
    }
}
