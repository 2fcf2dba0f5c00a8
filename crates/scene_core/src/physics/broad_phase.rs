//! Broad-phase interface and a brute-force registry
//!
//! The scene core only needs to tell the physics world which colliders exist
//! and where they are. [`PhysicsBroadPhase`] is that seam; any spatial
//! partitioning scheme (grid, quadtree, BVH) can sit behind it without the
//! collider bookkeeping changing.

use std::collections::HashMap;

use super::collider::ColliderHandle;
use crate::foundation::math::Aabb;

/// Receiver of collider registrations
pub trait PhysicsBroadPhase {
    /// Start tracking a collider at the given world bounds
    fn register_collider(&mut self, handle: ColliderHandle, bounds: Aabb);

    /// Stop tracking a collider
    fn unregister_collider(&mut self, handle: ColliderHandle);

    /// Move a tracked collider
    fn update_collider(&mut self, handle: ColliderHandle, bounds: Aabb);

    /// Check if a collider is currently tracked
    fn is_registered(&self, handle: ColliderHandle) -> bool;

    /// Number of tracked colliders
    fn collider_count(&self) -> usize;
}

/// Broad-phase that tests every registered collider on each query
///
/// Adequate for scenes with a few hundred colliders and used as the scene
/// default.
#[derive(Debug, Default)]
pub struct ColliderRegistry {
    colliders: HashMap<ColliderHandle, Aabb>,
}

impl ColliderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// World bounds of a registered collider
    pub fn bounds(&self, handle: ColliderHandle) -> Option<Aabb> {
        self.colliders.get(&handle).copied()
    }

    /// Colliders whose bounds overlap `area`
    pub fn overlapping(&self, area: &Aabb) -> Vec<ColliderHandle> {
        self.colliders
            .iter()
            .filter(|(_, bounds)| bounds.intersects(area))
            .map(|(&handle, _)| handle)
            .collect()
    }

    /// Iterate registered colliders
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, Aabb)> + '_ {
        self.colliders.iter().map(|(&handle, &bounds)| (handle, bounds))
    }
}

impl PhysicsBroadPhase for ColliderRegistry {
    fn register_collider(&mut self, handle: ColliderHandle, bounds: Aabb) {
        if self.colliders.insert(handle, bounds).is_some() {
            log::warn!("Collider {:?} registered twice", handle);
        }
    }

    fn unregister_collider(&mut self, handle: ColliderHandle) {
        if self.colliders.remove(&handle).is_none() {
            log::warn!("Tried to unregister collider {:?} that is not registered", handle);
        }
    }

    fn update_collider(&mut self, handle: ColliderHandle, bounds: Aabb) {
        match self.colliders.get_mut(&handle) {
            Some(stored) => *stored = bounds,
            None => log::warn!("Tried to move collider {:?} that is not registered", handle),
        }
    }

    fn is_registered(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains_key(&handle)
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityId;
    use crate::foundation::math::Vec2;
    use crate::physics::ColliderId;
    use slotmap::SlotMap;

    fn handles(count: usize) -> Vec<ColliderHandle> {
        let mut entities: SlotMap<EntityId, ()> = SlotMap::with_key();
        let mut colliders: SlotMap<ColliderId, ()> = SlotMap::with_key();
        let entity = entities.insert(());
        (0..count)
            .map(|_| ColliderHandle::new(entity, colliders.insert(())))
            .collect()
    }

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::from_center_size(Vec2::new(x, 0.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn test_register_and_unregister() {
        let h = handles(2);
        let mut registry = ColliderRegistry::new();
        registry.register_collider(h[0], unit_box_at(0.0));
        registry.register_collider(h[1], unit_box_at(5.0));
        assert_eq!(registry.collider_count(), 2);

        registry.unregister_collider(h[0]);
        assert!(!registry.is_registered(h[0]));
        assert!(registry.is_registered(h[1]));
    }

    #[test]
    fn test_overlapping_query() {
        let h = handles(3);
        let mut registry = ColliderRegistry::new();
        registry.register_collider(h[0], unit_box_at(0.0));
        registry.register_collider(h[1], unit_box_at(0.8));
        registry.register_collider(h[2], unit_box_at(10.0));

        let mut hits = registry.overlapping(&unit_box_at(0.2));
        hits.sort_by_key(|handle| h.iter().position(|other| other == handle));
        assert_eq!(hits, vec![h[0], h[1]]);
    }

    #[test]
    fn test_update_moves_bounds() {
        let h = handles(1);
        let mut registry = ColliderRegistry::new();
        registry.register_collider(h[0], unit_box_at(0.0));
        registry.update_collider(h[0], unit_box_at(10.0));

        assert!(registry.overlapping(&unit_box_at(0.0)).is_empty());
        assert_eq!(registry.bounds(h[0]), Some(unit_box_at(10.0)));
    }
}
