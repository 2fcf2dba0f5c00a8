//! Entity systems
//!
//! A system declares the component signature it cares about through a
//! [`Matcher`] and keeps a working set of the matching entities. The owning
//! [`EntityProcessorList`](super::EntityProcessorList) tells it whenever an
//! entity's signature may have changed; the default [`EntitySystem::on_change`]
//! re-evaluates membership and fires [`EntitySystem::on_added`] /
//! [`EntitySystem::on_removed`] as entities enter and leave the set.

use super::entity::{Entity, EntityId};
use super::entity_list::EntityList;
use super::matcher::Matcher;
use crate::foundation::any::AsAny;

/// Matcher and working set shared by every system
#[derive(Debug, Clone)]
pub struct SystemState {
    matcher: Matcher,
    entities: Vec<EntityId>,
    enabled: bool,
}

impl SystemState {
    /// Create an enabled state with an empty working set
    pub fn new(matcher: Matcher) -> Self {
        Self {
            matcher,
            entities: Vec::new(),
            enabled: true,
        }
    }

    /// Matcher deciding working-set membership
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Entities currently matched, in the order they started matching
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Check if an entity is in the working set
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    /// Whether the system runs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pause or resume the system; membership tracking continues either way
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// System processing the entities matched by its [`Matcher`]
pub trait EntitySystem: AsAny {
    /// Shared state
    fn state(&self) -> &SystemState;

    /// Mutable shared state
    fn state_mut(&mut self) -> &mut SystemState;

    /// Per-frame work over the working set
    fn process(&mut self, entities: &mut EntityList);

    /// Work run after every entity has updated this frame
    fn late_process(&mut self, _entities: &mut EntityList) {}

    /// Called before `process`
    fn begin(&mut self, _entities: &mut EntityList) {}

    /// Called after `process`
    fn end(&mut self, _entities: &mut EntityList) {}

    /// Called when an entity enters the working set
    fn on_added(&mut self, _entity: EntityId) {}

    /// Called when an entity leaves the working set
    fn on_removed(&mut self, _entity: EntityId) {}

    /// Re-evaluate whether `entity` belongs in the working set
    fn on_change(&mut self, entity: &Entity) {
        let id = entity.id();
        let interested = self
            .state()
            .matcher()
            .is_interested(entity.components().signature());
        let contains = self.state().contains(id);

        if interested && !contains {
            self.state_mut().entities.push(id);
            self.on_added(id);
        } else if !interested && contains {
            self.remove(id);
        }
    }

    /// Drop an entity from the working set
    fn remove(&mut self, entity: EntityId) {
        let entities = &mut self.state_mut().entities;
        if let Some(index) = entities.iter().position(|&e| e == entity) {
            entities.remove(index);
            self.on_removed(entity);
        }
    }

    /// Run `begin`, `process`, `end` if the system is enabled
    fn update(&mut self, entities: &mut EntityList) {
        if !self.state().is_enabled() {
            return;
        }
        self.begin(entities);
        self.process(entities);
        self.end(entities);
    }

    /// Run `late_process` if the system is enabled
    fn late_update(&mut self, entities: &mut EntityList) {
        if self.state().is_enabled() {
            self.late_process(entities);
        }
    }
}
