//! Collisions against static world geometry

use super::body::{CollisionBody, CollisionTarget, MapMarker};
use super::bounding_box::BoundingBox;
use super::error::CollisionError;
use crate::foundation::math::Vec3;

/// Hook consulted once per body per analysis step, before pairs are resolved
pub trait WorldCollider: Send + Sync {
    /// Check `body`, whose local box is `hitbox`, over `[start_time, end_time]`
    ///
    /// Implementations report contacts through [`CollisionBody::collide_with`] with a
    /// [`CollisionTarget::World`] target. An error aborts the analysis step.
    ///
    /// Unlike entity pairs, which are notified on every pass even when they never meet,
    /// a world hook only reports markers the body actually reaches within the step.
    fn collide_entity(
        &self,
        body: &dyn CollisionBody,
        hitbox: &BoundingBox,
        start_time: f32,
        end_time: f32,
    ) -> Result<(), CollisionError>;
}

/// A flat list of static markers tested by brute force
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    markers: Vec<MapMarker>,
}

impl ObstacleField {
    /// Create an empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a field from a set of markers
    pub fn with_markers(markers: Vec<MapMarker>) -> Self {
        Self { markers }
    }

    /// Add a marker
    pub fn add_marker(&mut self, marker: MapMarker) {
        self.markers.push(marker);
    }

    /// All markers
    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    /// Number of markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the field has no markers
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl WorldCollider for ObstacleField {
    /// A marker is reported only if the body reaches it before `end_time`. A body resting
    /// inside a marker is left alone.
    fn collide_entity(
        &self,
        body: &dyn CollisionBody,
        hitbox: &BoundingBox,
        start_time: f32,
        end_time: f32,
    ) -> Result<(), CollisionError> {
        let start = body.position_at(start_time);
        let movement = body.position_at(end_time) - start;
        let swept = hitbox.translated(start).union(&hitbox.translated(start + movement));

        for marker in &self.markers {
            if !swept.intersects(&marker.world_bounds()) {
                continue;
            }

            let still = Vec3::zeros();
            let fraction = hitbox
                .relative_collision_fraction(start, movement, &marker.bounds, marker.position, still)
                .min(marker.bounds.relative_collision_fraction(
                    marker.position,
                    still,
                    hitbox,
                    start,
                    movement,
                ));
            if fraction >= 1.0 {
                continue;
            }

            let time = start_time + fraction * (end_time - start_time);
            log::trace!("{} hit marker {} at t={time}", body.entity(), marker.id);
            body.collide_with(CollisionTarget::World(marker), time)?;
            if body.is_disposed() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::tests::TestBody;
    use approx::assert_relative_eq;

    fn wall_at(x: f32) -> MapMarker {
        MapMarker::new(1, Vec3::new(x, 0.0, 0.0), BoundingBox::new(-0.5, -5.0, -5.0, 0.5, 5.0, 5.0))
    }

    #[test]
    fn test_moving_body_hits_wall() {
        let field = ObstacleField::with_markers(vec![wall_at(5.0)]);
        let body = TestBody::moving(3, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1.0);

        field.collide_entity(&*body, &body.hitbox(), 0.0, 10.0).unwrap();

        let hits = body.hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, None);
        // Faces meet when the centre reaches x = 4
        assert_relative_eq!(hits[0].1, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_far_or_resting_bodies_are_ignored() {
        let mut field = ObstacleField::new();
        field.add_marker(wall_at(50.0));
        field.add_marker(wall_at(0.0));
        assert_eq!(field.len(), 2);

        let resting = TestBody::stationary(1, Vec3::zeros(), 1.0);
        field.collide_entity(&*resting, &resting.hitbox(), 0.0, 1.0).unwrap();

        assert!(resting.hits().is_empty());
    }

    #[test]
    fn test_swept_box_overlap_without_contact_is_not_reported() {
        // Diagonal path whose swept box covers the post but never touches it
        let post = MapMarker::new(2, Vec3::new(4.0, 0.0, 0.0), BoundingBox::cube(1.0));
        let field = ObstacleField::with_markers(vec![post]);
        let body = TestBody::moving(5, Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0), 1.0);

        let swept = body.hitbox().union(&body.hitbox().translated(body.position_at(4.0)));
        assert!(swept.intersects(&post.world_bounds()));

        field.collide_entity(&*body, &body.hitbox(), 0.0, 4.0).unwrap();

        assert!(body.hits().is_empty());
    }

    #[test]
    fn test_handler_error_propagates() {
        let field = ObstacleField::with_markers(vec![wall_at(2.0)]);
        let body = TestBody::moving(4, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1.0);
        body.fail_on_hit();

        let result = field.collide_entity(&*body, &body.hitbox(), 0.0, 5.0);

        assert!(matches!(result, Err(CollisionError::Handler { .. })));
    }
}
