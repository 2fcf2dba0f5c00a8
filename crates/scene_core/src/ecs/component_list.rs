//! Per-entity component collection
//!
//! Buffers membership changes so hooks and updates never observe a list
//! being mutated mid-iteration. Pending components become live at the next
//! [`ComponentList::update_lists`], which runs removals first, then additions
//! with two-phase activation:
//!
//! 1. every newly flushed component is appended to the live list (renderables
//!    are forwarded to the scene) and receives `on_added_to_entity`;
//! 2. only after the whole batch has been through pass 1, each component
//!    receives `on_awake`, then `on_enabled` if it and its entity are enabled.

use std::any::TypeId;

use slotmap::SlotMap;

use super::component::{Capabilities, Component, ComponentContext, ComponentId};
use super::entity::EntityInfo;
use super::matcher::Signature;
use crate::render::{Renderable, RenderableHandle};
use crate::scene::SceneContext;

/// Storage for one component plus its bookkeeping
struct ComponentSlot {
    /// `None` only while one of the component's own hooks is running
    component: Option<Box<dyn Component>>,
    capabilities: Capabilities,
    type_id: TypeId,
    type_name: &'static str,
    enabled: bool,
}

/// Number of components flushed in and out by one `update_lists`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListChanges {
    /// Components that became live
    pub added: usize,
    /// Components that were removed
    pub removed: usize,
}

impl ListChanges {
    /// Check if the flush changed nothing
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Components owned by one entity
#[derive(Default)]
pub struct ComponentList {
    slots: SlotMap<ComponentId, ComponentSlot>,

    /// Live components in insertion order
    components: Vec<ComponentId>,

    /// Components waiting for the next flush
    components_to_add: Vec<ComponentId>,

    /// Live components whose removal is owed
    components_to_remove: Vec<ComponentId>,

    /// Components in the removal batch currently being torn down
    components_being_removed: Vec<ComponentId>,

    /// One bit per component type present in the live list
    signature: Signature,
}

impl std::fmt::Debug for ComponentList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self
            .components
            .iter()
            .filter_map(|&id| self.slots.get(id).map(|slot| slot.type_name))
            .collect();
        f.debug_struct("ComponentList")
            .field("components", &names)
            .field("pending_add", &self.components_to_add.len())
            .field("pending_remove", &self.components_to_remove.len())
            .finish()
    }
}

impl ComponentList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if there are no live components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of components waiting to be flushed in
    pub fn pending_add_count(&self) -> usize {
        self.components_to_add.len()
    }

    /// Number of live components waiting to be flushed out
    pub fn pending_remove_count(&self) -> usize {
        self.components_to_remove.len()
    }

    /// Signature of the live components
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[cfg(test)]
    pub(crate) fn signature_mut(&mut self) -> &mut Signature {
        &mut self.signature
    }

    /// Queue a component; it becomes live at the next flush
    pub fn add<T: Component>(&mut self, component: T) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    /// Queue a boxed component; it becomes live at the next flush
    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        let component_ref: &dyn Component = component.as_ref();
        let slot = ComponentSlot {
            capabilities: Capabilities::of(component_ref),
            type_id: component_ref.as_any().type_id(),
            type_name: component_ref.type_name(),
            enabled: true,
            component: Some(component),
        };

        let id = self.slots.insert(slot);
        self.components_to_add.push(id);
        id
    }

    /// Queue removal of a component
    ///
    /// A component still waiting to be added is dropped immediately without
    /// ever receiving a hook. Removing twice before a flush, or removing a
    /// component that is already being torn down, is a warning.
    pub fn remove(&mut self, id: ComponentId) {
        if self.components_to_remove.contains(&id) {
            log::warn!(
                "Component {:?} removed twice in the same frame; ignoring the second removal",
                id
            );
            return;
        }

        // Slot outlives the live entry until on_removed_from_entity returns
        let mid_teardown = self.components_being_removed.contains(&id)
            || (self.slots.contains_key(id) && !self.components.contains(&id) && !self.is_pending_add(id));
        if mid_teardown {
            log::warn!("Component {:?} is already being removed; ignoring the removal", id);
            return;
        }

        if let Some(index) = self.components_to_add.iter().position(|&c| c == id) {
            self.components_to_add.remove(index);
            self.slots.remove(id);
            log::trace!("Cancelled pending add of component {:?}", id);
            return;
        }

        if !self.components.contains(&id) {
            debug_assert!(false, "component {:?} is not owned by this entity", id);
            log::error!("Tried to remove component {:?} not owned by this entity", id);
            return;
        }

        self.components_to_remove.push(id);
    }

    /// Check if a component is live
    pub fn is_live(&self, id: ComponentId) -> bool {
        self.components.contains(&id)
    }

    /// Check if a component is waiting to be flushed in
    pub fn is_pending_add(&self, id: ComponentId) -> bool {
        self.components_to_add.contains(&id)
    }

    /// Check if a live component is waiting to be flushed out
    pub fn is_pending_remove(&self, id: ComponentId) -> bool {
        self.components_to_remove.contains(&id)
    }

    /// Check if a component is enabled
    pub fn is_enabled(&self, id: ComponentId) -> bool {
        self.slots.get(id).is_some_and(|slot| slot.enabled)
    }

    /// Capabilities recorded when the component was added
    pub fn capabilities(&self, id: ComponentId) -> Option<Capabilities> {
        self.slots.get(id).map(|slot| slot.capabilities)
    }

    /// Live component at `index`
    pub fn at(&self, index: usize) -> Option<&dyn Component> {
        let id = *self.components.get(index)?;
        self.get_by_id(id)
    }

    /// Component by id, live or pending
    pub fn get_by_id(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slots.get(id)?.component.as_deref()
    }

    /// Mutable component by id, live or pending
    pub fn get_by_id_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        match self.slots.get_mut(id)?.component.as_mut() {
            Some(component) => Some(component.as_mut()),
            None => None,
        }
    }

    /// Component by id, downcast to `T`
    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.get_by_id(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutable component by id, downcast to `T`
    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.get_by_id_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Renderable capability of a component
    pub fn renderable(&self, id: ComponentId) -> Option<&dyn Renderable> {
        self.get_by_id(id)?.as_renderable()
    }

    /// Mutable renderable capability of a component
    pub fn renderable_mut(&mut self, id: ComponentId) -> Option<&mut dyn Renderable> {
        self.get_by_id_mut(id)?.as_renderable_mut()
    }

    /// First component of type `T`: live list first, then pending adds
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .chain(&self.components_to_add)
            .find_map(|&id| self.component::<T>(id))
    }

    /// First live component of type `T`, ignoring pending adds
    pub fn get_live<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|&id| self.component::<T>(id))
    }

    /// Mutable access to the first component of type `T`
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let id = self.find_id::<T>()?;
        self.component_mut::<T>(id)
    }

    /// Id of the first component of type `T`, live or pending
    pub fn find_id<T: Component>(&self) -> Option<ComponentId> {
        let type_id = TypeId::of::<T>();
        self.components
            .iter()
            .chain(&self.components_to_add)
            .copied()
            .find(|&id| {
                self.slots
                    .get(id)
                    .is_some_and(|slot| slot.type_id == type_id && slot.component.is_some())
            })
    }

    /// Every component of type `T`, live first, then pending
    pub fn get_all<T: Component>(&self) -> impl Iterator<Item = &T> + '_ {
        self.components
            .iter()
            .chain(&self.components_to_add)
            .filter_map(|&id| self.component::<T>(id))
    }

    /// Iterate live components in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> + '_ {
        self.components
            .iter()
            .filter_map(|&id| self.get_by_id(id).map(|component| (id, component)))
    }

    /// Apply pending removals, then pending additions with two-phase activation
    pub fn update_lists(
        &mut self,
        entity: &EntityInfo,
        scene: &mut SceneContext<'_>,
        destroy_requested: &mut bool,
    ) -> ListChanges {
        let mut changes = ListChanges::default();

        if !self.components_to_remove.is_empty() {
            self.components_being_removed = std::mem::take(&mut self.components_to_remove);
            for index in 0..self.components_being_removed.len() {
                let id = self.components_being_removed[index];
                self.handle_remove(id, entity, scene, destroy_requested);
                changes.removed += 1;
            }
            self.components_being_removed.clear();
        }

        if !self.components_to_add.is_empty() {
            let batch = std::mem::take(&mut self.components_to_add);

            for &id in &batch {
                self.make_live(id, entity, scene);
            }

            for &id in &batch {
                self.invoke(id, entity, destroy_requested, |component, ctx| {
                    component.on_added_to_entity(ctx);
                });
            }

            // Every sibling of the batch is live now, so on_awake can find them
            for &id in &batch {
                self.invoke(id, entity, destroy_requested, |component, ctx| {
                    component.on_awake(ctx);
                });

                if entity.is_enabled() && self.is_enabled(id) {
                    self.invoke(id, entity, destroy_requested, |component, ctx| {
                        component.on_enabled(ctx);
                    });
                }
            }

            changes.added = batch.len();
            log::trace!(
                "Entity '{}' flushed {} component(s) in, {} out",
                entity.name(),
                changes.added,
                changes.removed
            );
        }

        changes
    }

    /// Tear down every component; pending additions are dropped unhooked
    pub fn remove_all(
        &mut self,
        entity: &EntityInfo,
        scene: &mut SceneContext<'_>,
        destroy_requested: &mut bool,
    ) -> usize {
        for id in std::mem::take(&mut self.components_to_add) {
            self.slots.remove(id);
        }
        self.components_to_remove.clear();

        self.components_being_removed = self.components.clone();
        for index in 0..self.components_being_removed.len() {
            let id = self.components_being_removed[index];
            self.handle_remove(id, entity, scene, destroy_requested);
        }
        let removed = self.components_being_removed.len();
        self.components_being_removed.clear();
        removed
    }

    /// Enable or disable a component, firing the matching hook when the
    /// component is live and its entity is enabled
    pub fn set_enabled(
        &mut self,
        id: ComponentId,
        enabled: bool,
        entity: &EntityInfo,
        destroy_requested: &mut bool,
    ) {
        let Some(slot) = self.slots.get_mut(id) else {
            return;
        };
        if slot.enabled == enabled {
            return;
        }
        slot.enabled = enabled;

        if !entity.is_enabled() || !self.components.contains(&id) {
            return;
        }

        if enabled {
            self.invoke(id, entity, destroy_requested, |component, ctx| component.on_enabled(ctx));
        } else {
            self.invoke(id, entity, destroy_requested, |component, ctx| component.on_disabled(ctx));
        }
    }

    /// Fan out an entity enable/disable to every enabled live component
    pub fn on_entity_enabled_changed(&mut self, entity: &EntityInfo, destroy_requested: &mut bool) {
        for index in 0..self.components.len() {
            let id = self.components[index];
            if !self.is_enabled(id) {
                continue;
            }

            if entity.is_enabled() {
                self.invoke(id, entity, destroy_requested, |component, ctx| component.on_enabled(ctx));
            } else {
                self.invoke(id, entity, destroy_requested, |component, ctx| component.on_disabled(ctx));
            }
        }
    }

    /// Fan out a transform change to every live component
    pub fn on_entity_transform_changed(&mut self, entity: &EntityInfo, destroy_requested: &mut bool) {
        for index in 0..self.components.len() {
            let id = self.components[index];
            self.invoke(id, entity, destroy_requested, |component, ctx| {
                component.on_entity_transform_changed(ctx);
            });
        }
    }

    /// Run `update` on every enabled, updatable live component
    pub fn update(&mut self, entity: &EntityInfo, destroy_requested: &mut bool) {
        // Hooks only queue changes, so the live list is stable while iterating
        for index in 0..self.components.len() {
            let id = self.components[index];
            let updatable = self.slots.get(id).is_some_and(|slot| {
                slot.enabled && slot.capabilities.contains(Capabilities::UPDATABLE)
            });

            if updatable {
                self.invoke(id, entity, destroy_requested, |component, ctx| component.update(ctx));
            }
        }
    }

    fn make_live(&mut self, id: ComponentId, entity: &EntityInfo, scene: &mut SceneContext<'_>) {
        let Some(slot) = self.slots.get(id) else {
            return;
        };
        let type_id = slot.type_id;
        let type_name = slot.type_name;

        if slot.capabilities.contains(Capabilities::RENDERABLE) {
            if let Some(layer) = self.renderable(id).map(|r| r.render_layer()) {
                scene
                    .renderables
                    .add(RenderableHandle::new(entity.id(), id), layer);
            }
        }

        debug_assert!(!self.components.contains(&id), "component {:?} is already live", id);
        self.components.push(id);

        let bit = scene.types.register(type_id, type_name);
        if bit >= self.signature.len() {
            self.signature.grow(bit + 1);
        }
        self.signature.insert(bit);
    }

    fn handle_remove(
        &mut self,
        id: ComponentId,
        entity: &EntityInfo,
        scene: &mut SceneContext<'_>,
        destroy_requested: &mut bool,
    ) {
        let Some(slot) = self.slots.get(id) else {
            return;
        };
        let type_id = slot.type_id;

        if slot.capabilities.contains(Capabilities::RENDERABLE) {
            scene.renderables.remove(RenderableHandle::new(entity.id(), id));
        }

        if let Some(index) = self.components.iter().position(|&c| c == id) {
            self.components.remove(index);
        }

        // The bit stays while another live component of the same type remains
        let type_still_present = self
            .components
            .iter()
            .any(|&other| self.slots.get(other).is_some_and(|s| s.type_id == type_id));
        if !type_still_present {
            if let Some(bit) = scene.types.try_index_of(type_id) {
                if bit < self.signature.len() {
                    self.signature.set(bit, false);
                }
            }
        }

        self.invoke(id, entity, destroy_requested, |component, ctx| {
            component.on_removed_from_entity(ctx);
        });
        self.slots.remove(id);
    }

    /// Run a hook with the component temporarily moved out of its slot, so
    /// the hook can borrow the rest of the list
    fn invoke<F>(&mut self, id: ComponentId, entity: &EntityInfo, destroy_requested: &mut bool, hook: F)
    where
        F: FnOnce(&mut dyn Component, &mut ComponentContext<'_>),
    {
        let Some(mut component) = self.slots.get_mut(id).and_then(|slot| slot.component.take()) else {
            return;
        };

        {
            let mut ctx = ComponentContext::new(entity, id, self, destroy_requested);
            hook(component.as_mut(), &mut ctx);
        }

        if let Some(slot) = self.slots.get_mut(id) {
            slot.component = Some(component);
        }
    }
}
