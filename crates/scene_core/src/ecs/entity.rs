//! Entity state and lifecycle
//!
//! An [`Entity`] owns one [`ComponentList`] and one [`ColliderList`]. Its
//! identity is an [`EntityId`] assigned when it is handed to an
//! [`EntityList`](super::EntityList); until then it is a free-standing builder
//! that components and colliders can already be queued on.

use super::component::{Component, ComponentId};
use super::component_list::{ComponentList, ListChanges};
use crate::foundation::math::{Transform, Vec2};
use crate::physics::{Collider, ColliderId, ColliderList};
use crate::scene::SceneContext;

slotmap::new_key_type! {
    /// Stable identity of an entity within its scene
    pub struct EntityId;
}

/// Plain entity state, readable from component hooks
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) tag: i32,
    pub(crate) enabled: bool,
    pub(crate) destroyed: bool,
    pub(crate) in_scene: bool,
    pub(crate) update_order: i32,
    pub(crate) update_interval: u32,
    pub(crate) transform: Transform,
}

impl EntityInfo {
    fn new(name: String) -> Self {
        Self {
            id: EntityId::default(),
            name,
            tag: 0,
            enabled: true,
            destroyed: false,
            in_scene: false,
            update_order: 0,
            update_interval: 1,
            transform: Transform::identity(),
        }
    }

    /// Entity id; the null key until the entity is added to a list
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification tag
    pub fn tag(&self) -> i32 {
        self.tag
    }

    /// Whether the entity is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the entity has been flushed out of its scene
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether the entity is live in a scene
    pub fn in_scene(&self) -> bool {
        self.in_scene
    }

    /// Sort key of the scene's live entity list (lower updates first)
    pub fn update_order(&self) -> i32 {
        self.update_order
    }

    /// Components are updated every `update_interval` frames
    pub fn update_interval(&self) -> u32 {
        self.update_interval
    }

    /// World transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Check if components should update on `frame`
    pub fn should_update(&self, frame: u64) -> bool {
        frame % u64::from(self.update_interval.max(1)) == 0
    }
}

/// Scene object owning components and colliders
pub struct Entity {
    pub(crate) info: EntityInfo,
    pub(crate) components: ComponentList,
    pub(crate) colliders: ColliderList,

    /// Raised by component hooks; collected after each per-entity update
    pub(crate) destroy_requested: bool,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("info", &self.info)
            .field("components", &self.components)
            .field("colliders", &self.colliders)
            .finish()
    }
}

impl Entity {
    /// Create an enabled entity at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: EntityInfo::new(name.into()),
            components: ComponentList::new(),
            colliders: ColliderList::new(),
            destroy_requested: false,
        }
    }

    /// Set the tag before the entity joins a scene
    pub fn with_tag(mut self, tag: i32) -> Self {
        self.info.tag = tag;
        self
    }

    /// Set the update order before the entity joins a scene
    pub fn with_update_order(mut self, update_order: i32) -> Self {
        self.info.update_order = update_order;
        self
    }

    /// Update components only every `interval` frames (0 is treated as 1)
    pub fn with_update_interval(mut self, interval: u32) -> Self {
        self.info.update_interval = interval.max(1);
        self
    }

    /// Place the entity
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.info.transform.position = position;
        self
    }

    /// Start enabled or disabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.info.enabled = enabled;
        self
    }

    /// Queue a component and keep building
    pub fn with_component<T: Component>(mut self, component: T) -> Self {
        self.components.add(component);
        self
    }

    /// Queue a collider and keep building
    pub fn with_collider<T: Collider>(mut self, collider: T) -> Self {
        self.colliders.add(collider);
        self
    }

    /// Entity state
    pub fn info(&self) -> &EntityInfo {
        &self.info
    }

    /// Entity id
    pub fn id(&self) -> EntityId {
        self.info.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Classification tag
    pub fn tag(&self) -> i32 {
        self.info.tag
    }

    /// Whether the entity is enabled
    pub fn is_enabled(&self) -> bool {
        self.info.enabled
    }

    /// Whether the entity has been flushed out of its scene
    pub fn is_destroyed(&self) -> bool {
        self.info.destroyed
    }

    /// Whether the entity is live in a scene
    pub fn in_scene(&self) -> bool {
        self.info.in_scene
    }

    /// World transform
    pub fn transform(&self) -> &Transform {
        &self.info.transform
    }

    /// Components of this entity
    pub fn components(&self) -> &ComponentList {
        &self.components
    }

    /// Mutable components of this entity
    ///
    /// Adds and removes are deferred to the next flush.
    pub fn components_mut(&mut self) -> &mut ComponentList {
        &mut self.components
    }

    /// Colliders of this entity
    pub fn colliders(&self) -> &ColliderList {
        &self.colliders
    }

    /// Queue a component
    pub fn add_component<T: Component>(&mut self, component: T) -> ComponentId {
        self.components.add(component)
    }

    /// Queue a collider
    pub fn add_collider<T: Collider>(&mut self, collider: T) -> ColliderId {
        self.colliders.add(collider)
    }

    /// First component of type `T`, live or pending
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// First component of type `T`, live or pending
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    pub(crate) fn take_destroy_request(&mut self) -> bool {
        std::mem::take(&mut self.destroy_requested)
    }

    pub(crate) fn on_added_to_scene(&mut self, ctx: &mut SceneContext<'_>) {
        self.colliders.on_entity_added_to_scene(&self.info, &mut *ctx.broad_phase);
    }

    pub(crate) fn on_removed_from_scene(&mut self, ctx: &mut SceneContext<'_>) {
        self.colliders.on_entity_removed_from_scene(&mut *ctx.broad_phase);
        self.components
            .remove_all(&self.info, ctx, &mut self.destroy_requested);
    }

    pub(crate) fn update_component_lists(&mut self, ctx: &mut SceneContext<'_>) -> ListChanges {
        self.components
            .update_lists(&self.info, ctx, &mut self.destroy_requested)
    }

    pub(crate) fn update_collider_lists(&mut self, ctx: &mut SceneContext<'_>) -> usize {
        self.colliders.update_lists(&self.info, &mut *ctx.broad_phase)
    }

    pub(crate) fn update_components(&mut self, frame: u64) {
        if self.info.enabled && self.info.should_update(frame) {
            self.components.update(&self.info, &mut self.destroy_requested);
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool, ctx: &mut SceneContext<'_>) {
        if self.info.enabled == enabled {
            return;
        }
        self.info.enabled = enabled;

        self.components
            .on_entity_enabled_changed(&self.info, &mut self.destroy_requested);

        if enabled {
            self.colliders.on_entity_enabled(&self.info, &mut *ctx.broad_phase);
        } else {
            self.colliders.on_entity_disabled(&mut *ctx.broad_phase);
        }
    }

    pub(crate) fn set_transform(&mut self, transform: Transform, ctx: &mut SceneContext<'_>) {
        self.info.transform = transform;
        self.components
            .on_entity_transform_changed(&self.info, &mut self.destroy_requested);
        self.colliders
            .on_entity_transform_changed(&self.info, &mut *ctx.broad_phase);
    }

    pub(crate) fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) {
        self.components
            .set_enabled(id, enabled, &self.info, &mut self.destroy_requested);
    }
}
