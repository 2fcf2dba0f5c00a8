//! Scene-wide entity collection
//!
//! Owns every entity of a scene, live or pending. Membership changes are
//! buffered and applied by [`EntityList::update_lists`] once per frame:
//! removals first, then additions, then the owed sorts. A tag index maps each
//! tag to the live entities carrying it and is kept in step with the live
//! list at every frame boundary.

use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;

use super::component::Component;
use super::entity::{Entity, EntityId};
use super::error::EcsError;
use crate::render::{DrawOrder, DrawOrderSource, RenderableHandle};
use crate::scene::SceneContext;

/// Entities of one scene
#[derive(Debug, Default)]
pub struct EntityList {
    /// Every entity, live or pending
    entities: SlotMap<EntityId, Entity>,

    /// Live entities sorted by update order
    live: Vec<EntityId>,

    /// Entities waiting to join the scene
    entities_to_add: Vec<EntityId>,

    /// Live entities whose removal is owed
    entities_to_remove: Vec<EntityId>,

    /// Live entities grouped by tag
    entity_dict: HashMap<i32, Vec<EntityId>>,

    /// Tags whose bucket owes a sort
    unsorted_tags: HashSet<i32>,

    /// Live list owes a sort
    is_entity_list_unsorted: bool,
}

impl EntityList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty list with room for `capacity` entities
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: SlotMap::with_capacity_and_key(capacity),
            live: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check if there are no live entities
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of entities waiting to join the scene
    pub fn pending_add_count(&self) -> usize {
        self.entities_to_add.len()
    }

    /// Number of live entities waiting to leave the scene
    pub fn pending_remove_count(&self) -> usize {
        self.entities_to_remove.len()
    }

    /// Queue an entity; it joins the scene at the next flush
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let id = self.entities.insert_with_key(|id| {
            entity.info.id = id;
            entity.colliders.set_owner(id);
            entity
        });
        self.entities_to_add.push(id);
        log::trace!("Queued entity {:?} for add", id);
        id
    }

    /// Queue an entity's removal
    ///
    /// An entity that has not joined the scene yet is dropped right away.
    /// Removing twice before a flush is a warning.
    pub fn remove(&mut self, id: EntityId) {
        if self.entities_to_remove.contains(&id) {
            log::warn!(
                "Entity {:?} removed twice in the same frame; ignoring the second removal",
                id
            );
            return;
        }

        if let Some(index) = self.entities_to_add.iter().position(|&e| e == id) {
            self.entities_to_add.remove(index);
            self.entities.remove(id);
            log::trace!("Cancelled pending add of entity {:?}", id);
            return;
        }

        if !self.live.contains(&id) {
            debug_assert!(false, "entity {:?} is not in this scene", id);
            log::warn!("Tried to remove entity {:?} that is not in this scene", id);
            return;
        }

        self.entities_to_remove.push(id);
    }

    /// Check if an entity is live
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(|e| e.info.in_scene)
    }

    /// Check if an entity is waiting to join the scene
    pub fn is_pending_add(&self, id: EntityId) -> bool {
        self.entities_to_add.contains(&id)
    }

    /// Check if a live entity is waiting to leave the scene
    pub fn is_pending_remove(&self, id: EntityId) -> bool {
        self.entities_to_remove.contains(&id)
    }

    /// Entity by id, live or pending
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable entity by id, live or pending
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Entity by id, or [`EcsError::EntityNotFound`]
    pub fn try_get(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.entities.get(id).ok_or(EcsError::EntityNotFound(id))
    }

    /// Mutable entity by id, or [`EcsError::EntityNotFound`]
    pub fn try_get_mut(&mut self, id: EntityId) -> Result<&mut Entity, EcsError> {
        self.entities.get_mut(id).ok_or(EcsError::EntityNotFound(id))
    }

    /// Live entity at `index` in update order
    pub fn at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(*self.live.get(index)?)
    }

    /// Ids of live entities in update order
    pub fn ids(&self) -> &[EntityId] {
        &self.live
    }

    /// Iterate live entities in update order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.live.iter().filter_map(|&id| self.entities.get(id))
    }

    /// Apply pending removals and additions, then perform owed sorts
    pub fn update_lists(&mut self, ctx: &mut SceneContext<'_>) {
        if !self.entities_to_remove.is_empty() {
            let to_remove = std::mem::take(&mut self.entities_to_remove);
            for id in to_remove {
                self.flush_remove(id, ctx);
            }
            log::debug!("Flushed entity removals; {} live", self.live.len());
        }

        if !self.entities_to_add.is_empty() {
            let batch = std::mem::take(&mut self.entities_to_add);

            for &id in &batch {
                let Some(tag) = self.entities.get(id).map(|e| e.info.tag) else {
                    continue;
                };
                self.live.push(id);
                self.add_to_tag_list(id, tag);

                if let Some(entity) = self.entities.get_mut(id) {
                    entity.info.in_scene = true;
                    if let Some(processors) = ctx.processors.as_deref_mut() {
                        processors.on_entity_added(entity);
                    }
                }
            }

            // Every entity of the batch is live before any of them hears about it
            for &id in &batch {
                if let Some(entity) = self.entities.get_mut(id) {
                    entity.on_added_to_scene(ctx);
                }
            }

            self.is_entity_list_unsorted = true;
            log::debug!("Flushed {} entity addition(s); {} live", batch.len(), self.live.len());
        }

        if self.is_entity_list_unsorted {
            let entities = &self.entities;
            self.live
                .sort_by_key(|&id| entities.get(id).map_or(0, |e| e.info.update_order));
            self.is_entity_list_unsorted = false;
        }

        if !self.unsorted_tags.is_empty() {
            let entities = &self.entities;
            for tag in self.unsorted_tags.drain() {
                if let Some(list) = self.entity_dict.get_mut(&tag) {
                    list.sort_by_key(|&id| entities.get(id).map_or(0, |e| e.info.update_order));
                }
            }
        }
    }

    /// Per-frame entity work, in update order
    ///
    /// For each live entity: flush its components (telling processors about
    /// signature changes), run component updates when the entity is enabled
    /// and due, then flush its colliders. Entities whose components asked for
    /// destruction are queued for removal afterwards.
    pub fn update(&mut self, ctx: &mut SceneContext<'_>, frame: u64) {
        let mut destroyed = Vec::new();

        for index in 0..self.live.len() {
            let id = self.live[index];
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };

            let changes = entity.update_component_lists(ctx);
            if let Some(processors) = ctx.processors.as_deref_mut() {
                if changes.removed > 0 {
                    processors.on_component_removed(entity);
                }
                if changes.added > 0 {
                    processors.on_component_added(entity);
                }
            }

            entity.update_components(frame);
            entity.update_collider_lists(ctx);

            if entity.take_destroy_request() {
                destroyed.push(id);
            }
        }

        for id in destroyed {
            if !self.entities_to_remove.contains(&id) {
                self.remove(id);
            }
        }
    }

    /// Tear down every entity; used when a scene ends
    pub fn remove_all(&mut self, ctx: &mut SceneContext<'_>) {
        for id in std::mem::take(&mut self.entities_to_add) {
            self.entities.remove(id);
        }

        for index in 0..self.live.len() {
            let id = self.live[index];
            if !self.entities_to_remove.contains(&id) {
                self.entities_to_remove.push(id);
            }
        }

        self.update_lists(ctx);
        debug_assert!(self.live.is_empty());
        debug_assert!(self.entity_dict.values().all(Vec::is_empty));
    }

    /// Change an entity's tag, moving it between tag buckets if it is live
    pub fn set_tag(&mut self, id: EntityId, tag: i32) -> Result<(), EcsError> {
        let entity = self.entities.get_mut(id).ok_or(EcsError::EntityNotFound(id))?;
        let old_tag = entity.info.tag;
        if old_tag == tag {
            return Ok(());
        }
        entity.info.tag = tag;

        if entity.info.in_scene {
            self.remove_from_tag_list(id, old_tag);
            self.add_to_tag_list(id, tag);
        }
        Ok(())
    }

    /// Change an entity's update order and mark the owed sorts
    pub fn set_update_order(&mut self, id: EntityId, update_order: i32) -> Result<(), EcsError> {
        let entity = self.entities.get_mut(id).ok_or(EcsError::EntityNotFound(id))?;
        if entity.info.update_order == update_order {
            return Ok(());
        }
        entity.info.update_order = update_order;

        if entity.info.in_scene {
            let tag = entity.info.tag;
            self.is_entity_list_unsorted = true;
            self.unsorted_tags.insert(tag);
        }
        Ok(())
    }

    /// First entity named `name`: live first, then pending adds
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.live
            .iter()
            .chain(&self.entities_to_add)
            .filter_map(|&id| self.entities.get(id))
            .find(|e| e.info.name == name)
    }

    /// Live entities with `tag`; the bucket is created if absent
    pub fn entities_with_tag(&mut self, tag: i32) -> &[EntityId] {
        self.entity_dict.entry(tag).or_default()
    }

    /// Bucket for `tag` without creating it
    pub fn tag_list(&self, tag: i32) -> Option<&[EntityId]> {
        self.entity_dict.get(&tag).map(Vec::as_slice)
    }

    /// First entity with a component of type `T`
    ///
    /// Searches enabled live entities, then pending adds.
    pub fn find_entity_of_type<T: Component>(&self) -> Option<&Entity> {
        self.entities_of_type::<T>().next()
    }

    /// Entities with a component of type `T`: enabled live entities, then pending adds
    pub fn entities_of_type<T: Component>(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.query_candidates()
            .filter(|e| e.components.get::<T>().is_some())
    }

    /// First component of type `T` across the scene
    pub fn find_component_of_type<T: Component>(&self) -> Option<&T> {
        self.query_candidates().find_map(|e| e.components.get::<T>())
    }

    /// Every component of type `T` across the scene
    pub fn find_components_of_type<T: Component>(&self) -> impl Iterator<Item = &T> + '_ {
        self.query_candidates().flat_map(|e| e.components.get_all::<T>())
    }

    fn query_candidates(&self) -> impl Iterator<Item = &Entity> + '_ {
        let live = self
            .live
            .iter()
            .filter_map(|&id| self.entities.get(id))
            .filter(|e| e.info.enabled);
        let pending = self
            .entities_to_add
            .iter()
            .filter_map(|&id| self.entities.get(id));
        live.chain(pending)
    }

    fn flush_remove(&mut self, id: EntityId, ctx: &mut SceneContext<'_>) {
        let Some(tag) = self.entities.get(id).map(|e| e.info.tag) else {
            return;
        };

        self.remove_from_tag_list(id, tag);
        if let Some(index) = self.live.iter().position(|&e| e == id) {
            self.live.remove(index);
        }

        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        entity.on_removed_from_scene(ctx);
        entity.info.in_scene = false;

        if let Some(processors) = ctx.processors.as_deref_mut() {
            processors.on_entity_removed(entity);
        }

        entity.info.destroyed = true;
        log::trace!("Entity '{}' left the scene", entity.info.name);
        self.entities.remove(id);
    }

    fn add_to_tag_list(&mut self, id: EntityId, tag: i32) {
        let list = self.entity_dict.entry(tag).or_default();
        debug_assert!(!list.contains(&id), "entity {:?} is already tagged {}", id, tag);

        list.push(id);
        self.unsorted_tags.insert(tag);
    }

    fn remove_from_tag_list(&mut self, id: EntityId, tag: i32) {
        let position = self
            .entity_dict
            .get(&tag)
            .and_then(|list| list.iter().position(|&e| e == id));

        match position {
            Some(index) => {
                if let Some(list) = self.entity_dict.get_mut(&tag) {
                    list.remove(index);
                }
            }
            None => {
                debug_assert!(false, "entity {:?} is not in tag bucket {}", id, tag);
                log::error!("Stale tag {} used to remove entity {:?}", tag, id);
            }
        }
    }
}

impl DrawOrderSource for EntityList {
    fn draw_order(&self, handle: RenderableHandle) -> Option<DrawOrder> {
        let entity = self.entities.get(handle.entity)?;
        entity
            .components
            .renderable(handle.component)
            .map(|renderable| renderable.draw_order())
    }
}
