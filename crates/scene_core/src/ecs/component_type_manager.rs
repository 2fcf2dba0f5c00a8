//! Component type registry
//!
//! Maps every component type to a stable bit index used in entity
//! signatures. Indices are handed out lazily in first-use order, starting at
//! zero, and are never reused or reordered for the lifetime of the registry.
//!
//! The registry is an explicit object owned by the application root and
//! shared (via `Rc`) with every scene and system construction site, so two
//! independent registries never disagree about a scene's signatures.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;

/// Registry assigning bit indices to component types
#[derive(Debug, Default)]
pub struct ComponentTypeManager {
    inner: RefCell<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    indices: HashMap<TypeId, usize>,
    names: Vec<&'static str>,
}

impl ComponentTypeManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bit index for a component type, registering it on first use
    pub fn get_index_for(&self, type_id: TypeId) -> usize {
        self.register(type_id, "<unnamed>")
    }

    /// Get the bit index for `T`, registering it on first use
    pub fn index_of<T: 'static>(&self) -> usize {
        self.register(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Look up an index without registering the type
    pub fn try_index_of(&self, type_id: TypeId) -> Option<usize> {
        self.inner.borrow().indices.get(&type_id).copied()
    }

    /// Name recorded for a registered index
    pub fn type_name(&self, index: usize) -> Option<&'static str> {
        self.inner.borrow().names.get(index).copied()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.inner.borrow().names.len()
    }

    /// Check if no type has been registered yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn register(&self, type_id: TypeId, name: &'static str) -> usize {
        let mut registry = self.inner.borrow_mut();
        if let Some(&index) = registry.indices.get(&type_id) {
            // A name registered through `get_index_for` is upgraded once known
            if registry.names[index] == "<unnamed>" {
                registry.names[index] = name;
            }
            return index;
        }

        let index = registry.names.len();
        registry.indices.insert(type_id, index);
        registry.names.push(name);
        log::trace!("Registered component type {} as bit {}", name, index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Sprite;

    #[test]
    fn test_indices_are_sequential_in_first_use_order() {
        let types = ComponentTypeManager::new();

        assert_eq!(types.index_of::<Velocity>(), 0);
        assert_eq!(types.index_of::<Position>(), 1);
        assert_eq!(types.get_index_for(TypeId::of::<Sprite>()), 2);
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn test_indices_are_stable() {
        let types = ComponentTypeManager::new();
        let first = types.index_of::<Position>();
        types.index_of::<Velocity>();

        assert_eq!(types.index_of::<Position>(), first);
        assert_eq!(types.get_index_for(TypeId::of::<Position>()), first);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_lookup_does_not_register() {
        let types = ComponentTypeManager::new();
        assert!(types.try_index_of(TypeId::of::<Sprite>()).is_none());
        assert!(types.is_empty());
    }

    #[test]
    fn test_type_names() {
        let types = ComponentTypeManager::new();
        let unnamed = types.get_index_for(TypeId::of::<Sprite>());
        assert_eq!(types.type_name(unnamed), Some("<unnamed>"));

        types.index_of::<Sprite>();
        assert!(types.type_name(unnamed).unwrap().ends_with("Sprite"));
        assert!(types.type_name(7).is_none());
    }
}
