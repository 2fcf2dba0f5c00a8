//! Per-entity collider collection
//!
//! Additions are deferred to the next flush so a collider added mid-update
//! does not take part in the current physics step. Removals are immediate:
//! the collider leaves the broad-phase before `remove` returns, so no stale
//! entry can produce a ghost contact.

use slotmap::SlotMap;

use super::broad_phase::PhysicsBroadPhase;
use super::collider::{Collider, ColliderHandle, ColliderId};
use crate::ecs::{EntityId, EntityInfo};

struct ColliderEntry {
    collider: Box<dyn Collider>,
    /// Owning entity, set as soon as the owner is known
    entity: Option<EntityId>,
    /// Currently tracked by the broad-phase
    registered: bool,
}

/// Colliders owned by one entity
#[derive(Default)]
pub struct ColliderList {
    slots: SlotMap<ColliderId, ColliderEntry>,

    /// Live colliders in insertion order
    colliders: Vec<ColliderId>,

    /// Colliders waiting for the next flush
    colliders_to_add: Vec<ColliderId>,

    owner: Option<EntityId>,
}

impl std::fmt::Debug for ColliderList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderList")
            .field("live", &self.colliders.len())
            .field("pending_add", &self.colliders_to_add.len())
            .field("owner", &self.owner)
            .finish()
    }
}

impl ColliderList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Check if there are no live colliders
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Number of colliders waiting to be flushed in
    pub fn pending_add_count(&self) -> usize {
        self.colliders_to_add.len()
    }

    /// Entity owning this list, once known
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Record the owning entity on the list and on every collider in it
    pub(crate) fn set_owner(&mut self, entity: EntityId) {
        self.owner = Some(entity);
        for (_, entry) in self.slots.iter_mut() {
            entry.entity = Some(entity);
        }
    }

    /// Queue a collider; it joins the broad-phase at the next flush
    ///
    /// Ownership is recorded immediately.
    pub fn add<T: Collider>(&mut self, collider: T) -> ColliderId {
        self.add_boxed(Box::new(collider))
    }

    /// Queue a boxed collider
    pub fn add_boxed(&mut self, collider: Box<dyn Collider>) -> ColliderId {
        let id = self.slots.insert(ColliderEntry {
            collider,
            entity: self.owner,
            registered: false,
        });
        self.colliders_to_add.push(id);
        id
    }

    /// Remove a collider right away, unregistering it from the broad-phase
    ///
    /// Returns the detached collider, or `None` if the id is unknown.
    pub fn remove(
        &mut self,
        id: ColliderId,
        broad_phase: &mut dyn PhysicsBroadPhase,
    ) -> Option<Box<dyn Collider>> {
        if let Some(index) = self.colliders_to_add.iter().position(|&c| c == id) {
            self.colliders_to_add.remove(index);
            return self.slots.remove(id).map(|entry| entry.collider);
        }

        let Some(index) = self.colliders.iter().position(|&c| c == id) else {
            debug_assert!(false, "collider {:?} is not owned by this entity", id);
            log::error!("Tried to remove collider {:?} not owned by this entity", id);
            return None;
        };

        self.unregister(id, broad_phase);
        self.colliders.remove(index);

        let mut entry = self.slots.remove(id)?;
        entry.entity = None;
        log::trace!("Removed collider {:?}", id);
        Some(entry.collider)
    }

    /// Remove the live collider at `index` right away
    pub fn remove_at(
        &mut self,
        index: usize,
        broad_phase: &mut dyn PhysicsBroadPhase,
    ) -> Option<Box<dyn Collider>> {
        let id = *self.colliders.get(index)?;
        self.remove(id, broad_phase)
    }

    /// Make pending colliders live
    ///
    /// They are registered with the broad-phase when the entity is in a
    /// scene and enabled, and receive `on_entity_added_to_scene` when the
    /// entity is in a scene.
    pub fn update_lists(
        &mut self,
        entity: &EntityInfo,
        broad_phase: &mut dyn PhysicsBroadPhase,
    ) -> usize {
        if self.colliders_to_add.is_empty() {
            return 0;
        }

        let batch = std::mem::take(&mut self.colliders_to_add);
        for &id in &batch {
            let Some(entry) = self.slots.get_mut(id) else {
                continue;
            };
            entry.entity = Some(entity.id());
            self.colliders.push(id);

            if entity.in_scene() {
                if entity.is_enabled() {
                    self.register(id, entity, broad_phase);
                }
                if let Some(entry) = self.slots.get_mut(id) {
                    entry.collider.on_entity_added_to_scene();
                }
            }
        }

        log::trace!("Entity '{}' flushed {} collider(s)", entity.name(), batch.len());
        batch.len()
    }

    /// Register every live collider and notify it that the entity entered a scene
    pub fn on_entity_added_to_scene(
        &mut self,
        entity: &EntityInfo,
        broad_phase: &mut dyn PhysicsBroadPhase,
    ) {
        for index in 0..self.colliders.len() {
            let id = self.colliders[index];
            if entity.is_enabled() {
                self.register(id, entity, broad_phase);
            }
            if let Some(entry) = self.slots.get_mut(id) {
                entry.collider.on_entity_added_to_scene();
            }
        }
    }

    /// Unregister every live collider and notify it that the entity left its scene
    pub fn on_entity_removed_from_scene(&mut self, broad_phase: &mut dyn PhysicsBroadPhase) {
        for index in 0..self.colliders.len() {
            let id = self.colliders[index];
            self.unregister(id, broad_phase);
            if let Some(entry) = self.slots.get_mut(id) {
                entry.collider.on_entity_removed_from_scene();
            }
        }
    }

    /// Forward a transform change and move registered colliders
    pub fn on_entity_transform_changed(
        &mut self,
        entity: &EntityInfo,
        broad_phase: &mut dyn PhysicsBroadPhase,
    ) {
        for &id in &self.colliders {
            let Some(entry) = self.slots.get_mut(id) else {
                continue;
            };
            entry.collider.on_entity_transform_changed(entity.transform());
            if entry.registered {
                let bounds = entry.collider.bounds(entity.transform());
                broad_phase.update_collider(ColliderHandle::new(entity.id(), id), bounds);
            }
        }
    }

    /// Register every live collider in bulk
    pub fn on_entity_enabled(&mut self, entity: &EntityInfo, broad_phase: &mut dyn PhysicsBroadPhase) {
        if !entity.in_scene() {
            return;
        }
        for index in 0..self.colliders.len() {
            let id = self.colliders[index];
            self.register(id, entity, broad_phase);
        }
    }

    /// Unregister every live collider in bulk
    pub fn on_entity_disabled(&mut self, broad_phase: &mut dyn PhysicsBroadPhase) {
        for index in 0..self.colliders.len() {
            let id = self.colliders[index];
            self.unregister(id, broad_phase);
        }
    }

    /// The entity's primary collider: first live, else first pending
    pub fn main_collider(&self) -> Option<ColliderId> {
        self.colliders
            .first()
            .or_else(|| self.colliders_to_add.first())
            .copied()
    }

    /// Collider by id, live or pending
    pub fn get_by_id(&self, id: ColliderId) -> Option<&dyn Collider> {
        self.slots.get(id).map(|entry| entry.collider.as_ref())
    }

    /// First collider of type `T`
    ///
    /// With `only_initialized` the search is limited to live colliders.
    pub fn get<T: Collider>(&self, only_initialized: bool) -> Option<&T> {
        let pending: &[ColliderId] = if only_initialized {
            &[]
        } else {
            &self.colliders_to_add
        };

        self.colliders
            .iter()
            .chain(pending)
            .filter_map(|&id| self.slots.get(id))
            .find_map(|entry| entry.collider.as_ref().as_any().downcast_ref::<T>())
    }

    /// Mutable access to a collider by id, downcast to `T`
    pub fn get_mut<T: Collider>(&mut self, id: ColliderId) -> Option<&mut T> {
        self.slots
            .get_mut(id)?
            .collider
            .as_mut()
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Owner recorded on a collider
    pub fn collider_entity(&self, id: ColliderId) -> Option<EntityId> {
        self.slots.get(id)?.entity
    }

    /// Check if a collider is currently registered with the broad-phase
    pub fn is_registered(&self, id: ColliderId) -> bool {
        self.slots.get(id).is_some_and(|entry| entry.registered)
    }

    /// Check if a collider is live
    pub fn is_live(&self, id: ColliderId) -> bool {
        self.colliders.contains(&id)
    }

    /// Check if a collider is waiting to be flushed in
    pub fn is_pending_add(&self, id: ColliderId) -> bool {
        self.colliders_to_add.contains(&id)
    }

    /// Live collider at `index`
    pub fn at(&self, index: usize) -> Option<&dyn Collider> {
        self.get_by_id(*self.colliders.get(index)?)
    }

    /// Iterate live colliders in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ColliderId, &dyn Collider)> + '_ {
        self.colliders
            .iter()
            .filter_map(|&id| self.get_by_id(id).map(|collider| (id, collider)))
    }

    fn register(&mut self, id: ColliderId, entity: &EntityInfo, broad_phase: &mut dyn PhysicsBroadPhase) {
        let Some(entry) = self.slots.get_mut(id) else {
            return;
        };
        if entry.registered {
            return;
        }

        let bounds = entry.collider.bounds(entity.transform());
        broad_phase.register_collider(ColliderHandle::new(entity.id(), id), bounds);
        entry.registered = true;
    }

    fn unregister(&mut self, id: ColliderId, broad_phase: &mut dyn PhysicsBroadPhase) {
        let Some(entry) = self.slots.get_mut(id) else {
            return;
        };
        if !entry.registered {
            return;
        }

        if let Some(entity) = entry.entity {
            broad_phase.unregister_collider(ColliderHandle::new(entity, id));
        }
        entry.registered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;
    use crate::foundation::math::{Aabb, Vec2};
    use crate::physics::{BoxCollider, ColliderRegistry};

    struct Sensor;

    impl Collider for Sensor {
        fn local_bounds(&self) -> Aabb {
            Aabb::from_center_size(Vec2::zeros(), Vec2::new(0.5, 0.5))
        }
    }

    fn scene_entity() -> Entity {
        let mut entity = Entity::new("collider-owner");
        entity.info.id = slotmap::KeyData::from_ffi(1).into();
        entity.info.in_scene = true;
        entity.colliders.set_owner(entity.info.id);
        entity
    }

    #[test]
    fn test_add_is_deferred_but_owned() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        let id = entity.colliders.add(BoxCollider::new(1.0, 1.0));

        assert!(entity.colliders.is_pending_add(id));
        assert_eq!(entity.colliders.owner(), Some(entity.id()));
        assert_eq!(entity.colliders.collider_entity(id), Some(entity.id()));
        assert_eq!(registry.collider_count(), 0);

        entity.colliders.update_lists(&entity.info, &mut registry);
        assert!(entity.colliders.is_live(id));
        assert!(!entity.colliders.is_pending_add(id));
        assert!(registry.is_registered(ColliderHandle::new(entity.id(), id)));
    }

    #[test]
    fn test_remove_is_immediate() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        let id = entity.colliders.add(BoxCollider::new(1.0, 1.0));
        entity.colliders.update_lists(&entity.info, &mut registry);

        let removed = entity.colliders.remove(id, &mut registry);
        assert!(removed.is_some());
        assert_eq!(registry.collider_count(), 0);
        assert!(!entity.colliders.is_live(id));
    }

    #[test]
    fn test_remove_at_unregisters_by_index() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        let first = entity.colliders.add(BoxCollider::new(1.0, 1.0));
        let second = entity.colliders.add(Sensor);
        entity.colliders.update_lists(&entity.info, &mut registry);

        let removed = entity.colliders.remove_at(1, &mut registry);
        assert!(removed.is_some_and(|c| c.as_ref().as_any().is::<Sensor>()));
        assert!(!registry.is_registered(ColliderHandle::new(entity.id(), second)));
        assert!(registry.is_registered(ColliderHandle::new(entity.id(), first)));
        assert!(entity.colliders.remove_at(1, &mut registry).is_none());
    }

    #[test]
    fn test_not_registered_outside_scene() {
        let mut entity = Entity::new("loose");
        let mut registry = ColliderRegistry::new();
        entity.colliders.add(BoxCollider::new(1.0, 1.0));

        entity.colliders.update_lists(&entity.info, &mut registry);
        assert_eq!(entity.colliders.len(), 1);
        assert_eq!(registry.collider_count(), 0);
    }

    #[test]
    fn test_enable_toggles_registration() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        entity.colliders.add(BoxCollider::new(1.0, 1.0));
        entity.colliders.add(Sensor);
        entity.colliders.update_lists(&entity.info, &mut registry);
        assert_eq!(registry.collider_count(), 2);

        entity.colliders.on_entity_disabled(&mut registry);
        assert_eq!(registry.collider_count(), 0);

        entity.colliders.on_entity_enabled(&entity.info, &mut registry);
        entity.colliders.on_entity_enabled(&entity.info, &mut registry);
        assert_eq!(registry.collider_count(), 2);
    }

    #[test]
    fn test_main_collider_and_typed_lookup() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        let first = entity.colliders.add(Sensor);
        entity.colliders.add(BoxCollider::new(2.0, 2.0));

        assert_eq!(entity.colliders.main_collider(), Some(first));
        assert!(entity.colliders.get::<BoxCollider>(true).is_none());
        assert!(entity.colliders.get::<BoxCollider>(false).is_some());

        entity.colliders.update_lists(&entity.info, &mut registry);
        assert_eq!(entity.colliders.main_collider(), Some(first));
        assert!(entity.colliders.get::<BoxCollider>(true).is_some());
    }

    #[test]
    fn test_transform_change_moves_registered_bounds() {
        let mut entity = scene_entity();
        let mut registry = ColliderRegistry::new();
        let id = entity.colliders.add(BoxCollider::new(1.0, 1.0));
        entity.colliders.update_lists(&entity.info, &mut registry);

        entity.info.transform.position = Vec2::new(20.0, 0.0);
        entity.colliders.on_entity_transform_changed(&entity.info, &mut registry);

        let bounds = registry.bounds(ColliderHandle::new(entity.id(), id)).unwrap();
        assert!(bounds.contains_point(Vec2::new(20.0, 0.0)));
    }
}
