//! Collider capability and the built-in box shape

use crate::ecs::EntityId;
use crate::foundation::any::AsAny;
use crate::foundation::math::{Aabb, Transform, Vec2};

slotmap::new_key_type! {
    /// Identifies a collider within its entity's collider list
    pub struct ColliderId;
}

/// Identifies one collider in a scene, as seen by the broad-phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle {
    /// Owning entity
    pub entity: EntityId,
    /// Collider within the entity's collider list
    pub collider: ColliderId,
}

impl ColliderHandle {
    /// Create a new handle
    pub fn new(entity: EntityId, collider: ColliderId) -> Self {
        Self { entity, collider }
    }
}

/// Collision shape attached to an entity
///
/// Shapes are described in the entity's local space; the owning
/// [`ColliderList`](super::ColliderList) hands the world bounds to the
/// broad-phase whenever the collider is registered or the entity moves.
pub trait Collider: AsAny {
    /// Bounds in entity-local space
    fn local_bounds(&self) -> Aabb;

    /// Bounds in world space under `transform`
    fn bounds(&self, transform: &Transform) -> Aabb {
        let local = self.local_bounds();
        let corners = [
            transform.transform_point(local.min),
            transform.transform_point(Vec2::new(local.max.x, local.min.y)),
            transform.transform_point(local.max),
            transform.transform_point(Vec2::new(local.min.x, local.max.y)),
        ];
        Aabb::from_points(&corners).unwrap_or(local)
    }

    /// Called when the collider is registered with the broad-phase
    fn on_entity_added_to_scene(&mut self) {}

    /// Called when the collider leaves the broad-phase
    fn on_entity_removed_from_scene(&mut self) {}

    /// Called when the owning entity moves
    fn on_entity_transform_changed(&mut self, _transform: &Transform) {}
}

/// Axis-aligned rectangle collider
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCollider {
    /// Full width and height
    pub size: Vec2,
    /// Offset of the box center from the entity origin
    pub offset: Vec2,
}

impl BoxCollider {
    /// Box of the given size centered on the entity
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::zeros(),
        }
    }

    /// Move the box center away from the entity origin
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }
}

impl Collider for BoxCollider {
    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_size(self.offset, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_bounds_follow_transform() {
        let collider = BoxCollider::new(2.0, 4.0).with_offset(Vec2::new(1.0, 0.0));
        let transform = Transform::from_position(Vec2::new(10.0, 10.0));

        let bounds = collider.bounds(&transform);
        assert_relative_eq!(bounds.min.x, 10.0);
        assert_relative_eq!(bounds.max.x, 12.0);
        assert_relative_eq!(bounds.min.y, 8.0);
        assert_relative_eq!(bounds.max.y, 12.0);
    }

    #[test]
    fn test_rotated_bounds_stay_axis_aligned() {
        let collider = BoxCollider::new(4.0, 2.0);
        let transform = Transform {
            rotation: std::f32::consts::FRAC_PI_2,
            ..Transform::identity()
        };

        let bounds = collider.bounds(&transform);
        assert_relative_eq!(bounds.size().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.size().y, 4.0, epsilon = 1e-5);
    }
}
