//! Component trait and hook context
//!
//! Components are behaviour/data attached to exactly one entity. The owning
//! [`ComponentList`] drives their lifecycle hooks; every hook receives a
//! [`ComponentContext`] giving access to the owning entity's state and to
//! sibling components. Structural changes requested from a hook (adding or
//! removing components, destroying the entity) are only ever queued, never
//! applied to the list being iterated.

use bitflags::bitflags;

use super::component_list::ComponentList;
use super::entity::EntityInfo;
use crate::foundation::any::AsAny;
use crate::render::Renderable;

slotmap::new_key_type! {
    /// Identifies a component within its entity's component list
    pub struct ComponentId;
}

bitflags! {
    /// Capabilities of a component, decided once when it is added
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Indexed by the scene's renderable list
        const RENDERABLE = 1 << 0;
        /// Receives a per-frame `update` call
        const UPDATABLE = 1 << 1;
    }
}

impl Capabilities {
    /// Inspect a component's capabilities
    pub fn of(component: &dyn Component) -> Self {
        let mut capabilities = Self::empty();
        if component.as_renderable().is_some() {
            capabilities |= Self::RENDERABLE;
        }
        if component.is_updatable() {
            capabilities |= Self::UPDATABLE;
        }
        capabilities
    }
}

/// Behaviour or data attached to one entity
///
/// Every hook has an empty default; implement only what the component needs.
pub trait Component: AsAny {
    /// Called when the component is flushed into its entity's live list
    fn on_added_to_entity(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called once, when the component's removal is flushed
    fn on_removed_from_entity(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called after every component flushed in the same batch has received
    /// `on_added_to_entity`, so siblings added this frame can be looked up
    fn on_awake(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the component becomes active (entity and component enabled)
    fn on_enabled(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the component or its entity is disabled
    fn on_disabled(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the owning entity's transform changes
    fn on_entity_transform_changed(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Per-frame update, only called when [`Component::is_updatable`] is true
    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Opt into per-frame updates
    fn is_updatable(&self) -> bool {
        false
    }

    /// Renderable capability
    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    /// Mutable renderable capability
    fn as_renderable_mut(&mut self) -> Option<&mut dyn Renderable> {
        None
    }
}

/// Access handed to component hooks
pub struct ComponentContext<'a> {
    entity: &'a EntityInfo,
    id: ComponentId,
    components: &'a mut ComponentList,
    destroy_requested: &'a mut bool,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        entity: &'a EntityInfo,
        id: ComponentId,
        components: &'a mut ComponentList,
        destroy_requested: &'a mut bool,
    ) -> Self {
        Self {
            entity,
            id,
            components,
            destroy_requested,
        }
    }

    /// State of the owning entity
    pub fn entity(&self) -> &EntityInfo {
        self.entity
    }

    /// Id of the component receiving the hook
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Sibling components (the component receiving the hook is not visible)
    pub fn components(&self) -> &ComponentList {
        &*self.components
    }

    /// First sibling of type `T`, live or pending
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// First sibling of type `T`, live or pending
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    /// Queue a new component on the owning entity
    pub fn add_component<T: Component>(&mut self, component: T) -> ComponentId {
        self.components.add(component)
    }

    /// Queue removal of a sibling component
    pub fn remove_component(&mut self, id: ComponentId) {
        self.components.remove(id);
    }

    /// Queue removal of the component receiving the hook
    pub fn remove_self(&mut self) {
        self.components.remove(self.id);
    }

    /// Request destruction of the owning entity
    ///
    /// The entity is queued for removal once the current hook batch ends and
    /// leaves the scene at the next flush.
    pub fn destroy_entity(&mut self) {
        *self.destroy_requested = true;
    }
}
