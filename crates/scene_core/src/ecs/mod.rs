//! Entity-Component-System bookkeeping
//!
//! Entities own components; scenes own entities. Every collection buffers
//! membership changes and applies them in a per-frame flush, removals first,
//! so nothing observes a half-applied batch.

pub mod component;
pub mod component_list;
pub mod component_type_manager;
pub mod entity;
pub mod entity_list;
pub mod error;
pub mod matcher;
pub mod processor_list;
pub mod system;

pub use component::{Capabilities, Component, ComponentContext, ComponentId};
pub use component_list::{ComponentList, ListChanges};
pub use component_type_manager::ComponentTypeManager;
pub use entity::{Entity, EntityId, EntityInfo};
pub use entity_list::EntityList;
pub use error::EcsError;
pub use matcher::{Matcher, Signature};
pub use processor_list::EntityProcessorList;
pub use system::{EntitySystem, SystemState};
