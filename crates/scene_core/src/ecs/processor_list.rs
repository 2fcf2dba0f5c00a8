//! Ordered collection of entity systems

use super::entity::Entity;
use super::entity_list::EntityList;
use super::system::EntitySystem;

/// Systems of one scene, run in insertion order
#[derive(Default)]
pub struct EntityProcessorList {
    processors: Vec<Box<dyn EntitySystem>>,
}

impl std::fmt::Debug for EntityProcessorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.processors.iter().map(|p| p.as_ref().type_name()).collect();
        f.debug_struct("EntityProcessorList")
            .field("processors", &names)
            .finish()
    }
}

impl EntityProcessorList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of systems
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if there are no systems
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Append a system; it runs after every system already in the list
    pub fn add<T: EntitySystem>(&mut self, system: T) {
        self.add_boxed(Box::new(system));
    }

    /// Append a boxed system
    pub fn add_boxed(&mut self, system: Box<dyn EntitySystem>) {
        log::debug!("Added entity system {}", system.as_ref().type_name());
        self.processors.push(system);
    }

    /// Remove the first system of type `T`
    pub fn remove<T: EntitySystem>(&mut self) -> Option<Box<dyn EntitySystem>> {
        let index = self
            .processors
            .iter()
            .position(|p| p.as_ref().as_any().is::<T>())?;
        Some(self.processors.remove(index))
    }

    /// First system of type `T`
    pub fn get<T: EntitySystem>(&self) -> Option<&T> {
        self.processors
            .iter()
            .find_map(|p| p.as_ref().as_any().downcast_ref::<T>())
    }

    /// Mutable first system of type `T`
    pub fn get_mut<T: EntitySystem>(&mut self) -> Option<&mut T> {
        self.processors
            .iter_mut()
            .find_map(|p| p.as_mut().as_any_mut().downcast_mut::<T>())
    }

    /// Iterate systems in run order
    pub fn iter(&self) -> impl Iterator<Item = &dyn EntitySystem> + '_ {
        self.processors.iter().map(|p| p.as_ref())
    }

    /// A component was flushed into `entity`
    pub fn on_component_added(&mut self, entity: &Entity) {
        self.notify_all(entity);
    }

    /// A component was flushed out of `entity`
    pub fn on_component_removed(&mut self, entity: &Entity) {
        self.notify_all(entity);
    }

    /// `entity` joined the scene
    pub fn on_entity_added(&mut self, entity: &Entity) {
        self.notify_all(entity);
    }

    /// `entity` left the scene; every system drops it
    pub fn on_entity_removed(&mut self, entity: &Entity) {
        for processor in &mut self.processors {
            processor.remove(entity.id());
        }
    }

    /// Run every system's per-frame update in list order
    pub fn update(&mut self, entities: &mut EntityList) {
        for processor in &mut self.processors {
            processor.update(entities);
        }
    }

    /// Run every system's late update in list order
    pub fn late_update(&mut self, entities: &mut EntityList) {
        for processor in &mut self.processors {
            processor.late_update(entities);
        }
    }

    fn notify_all(&mut self, entity: &Entity) {
        for processor in &mut self.processors {
            processor.on_change(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, ComponentTypeManager, EntityId, Matcher, SystemState};
    use std::any::TypeId;

    struct Position;
    impl Component for Position {}

    struct Counter {
        state: SystemState,
        added: Vec<EntityId>,
        removed: Vec<EntityId>,
        runs: usize,
    }

    impl Counter {
        fn new(matcher: Matcher) -> Self {
            Self {
                state: SystemState::new(matcher),
                added: Vec::new(),
                removed: Vec::new(),
                runs: 0,
            }
        }
    }

    impl EntitySystem for Counter {
        fn state(&self) -> &SystemState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut SystemState {
            &mut self.state
        }

        fn process(&mut self, _entities: &mut EntityList) {
            self.runs += 1;
        }

        fn on_added(&mut self, entity: EntityId) {
            self.added.push(entity);
        }

        fn on_removed(&mut self, entity: EntityId) {
            self.removed.push(entity);
        }
    }

    struct Other {
        state: SystemState,
    }

    impl EntitySystem for Other {
        fn state(&self) -> &SystemState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut SystemState {
            &mut self.state
        }

        fn process(&mut self, _entities: &mut EntityList) {}
    }

    fn entity_with_position(types: &ComponentTypeManager) -> Entity {
        let mut entity = Entity::new("e");
        entity.info.id = slotmap::KeyData::from_ffi(1).into();
        let bit = types.index_of::<Position>();
        entity.components.signature_mut().grow(bit + 1);
        entity.components.signature_mut().insert(bit);
        entity
    }

    #[test]
    fn test_on_change_tracks_membership() {
        let types = ComponentTypeManager::new();
        let matcher = Matcher::empty().all(&types, &[TypeId::of::<Position>()]);
        let mut list = EntityProcessorList::new();
        list.add(Counter::new(matcher));

        let bare = {
            let mut entity = Entity::new("bare");
            entity.info.id = slotmap::KeyData::from_ffi(2).into();
            entity
        };
        list.on_entity_added(&bare);

        let matching = entity_with_position(&types);
        list.on_component_added(&matching);
        list.on_component_added(&matching);

        let counter = list.get::<Counter>().unwrap();
        assert_eq!(counter.state().entities(), &[matching.id()]);
        assert_eq!(counter.added, vec![matching.id()]);

        list.on_entity_removed(&matching);
        let counter = list.get::<Counter>().unwrap();
        assert!(counter.state().entities().is_empty());
        assert_eq!(counter.removed, vec![matching.id()]);
    }

    #[test]
    fn test_typed_lookup_and_remove() {
        let mut list = EntityProcessorList::new();
        list.add(Counter::new(Matcher::empty()));
        list.add(Other {
            state: SystemState::new(Matcher::empty()),
        });

        assert!(list.get::<Other>().is_some());
        assert!(list.remove::<Counter>().is_some());
        assert!(list.get::<Counter>().is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_update_skips_disabled_systems() {
        let mut list = EntityProcessorList::new();
        let mut entities = EntityList::new();
        list.add(Counter::new(Matcher::empty()));

        list.update(&mut entities);
        list.get_mut::<Counter>().unwrap().state_mut().set_enabled(false);
        list.update(&mut entities);

        assert_eq!(list.get::<Counter>().unwrap().runs, 1);
    }
}
