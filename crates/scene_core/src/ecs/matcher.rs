//! Component signature matching
//!
//! A [`Matcher`] compiles a declarative component-type query into three
//! bitsets and answers "is this signature of interest" with a handful of
//! word-wide operations. Systems use it to select the entities they process.

use std::any::TypeId;

use fixedbitset::FixedBitSet;

use super::component_type_manager::ComponentTypeManager;

/// Per-entity set of component type bits
pub type Signature = FixedBitSet;

/// Bitset predicate over component signatures
///
/// ```
/// use std::any::TypeId;
/// use scene_core::ecs::{ComponentTypeManager, Matcher};
///
/// struct Position;
/// struct Velocity;
/// struct Frozen;
///
/// let types = ComponentTypeManager::new();
/// let matcher = Matcher::empty()
///     .all(&types, &[TypeId::of::<Position>(), TypeId::of::<Velocity>()])
///     .exclude(&types, &[TypeId::of::<Frozen>()]);
///
/// let mut signature = scene_core::ecs::Signature::with_capacity(types.len());
/// signature.insert(types.index_of::<Position>());
/// signature.insert(types.index_of::<Velocity>());
/// assert!(matcher.is_interested(&signature));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matcher {
    all_set: FixedBitSet,
    exclusion_set: FixedBitSet,
    one_set: FixedBitSet,
}

impl Matcher {
    /// Matcher interested in every signature
    pub fn empty() -> Self {
        Self::default()
    }

    /// Require every listed type
    pub fn all(mut self, types: &ComponentTypeManager, type_ids: &[TypeId]) -> Self {
        set_bits(&mut self.all_set, types, type_ids);
        self
    }

    /// Reject signatures containing any listed type
    pub fn exclude(mut self, types: &ComponentTypeManager, type_ids: &[TypeId]) -> Self {
        set_bits(&mut self.exclusion_set, types, type_ids);
        self
    }

    /// Require at least one of the listed types
    pub fn one(mut self, types: &ComponentTypeManager, type_ids: &[TypeId]) -> Self {
        set_bits(&mut self.one_set, types, type_ids);
        self
    }

    /// Require-all bits
    pub fn all_set(&self) -> &FixedBitSet {
        &self.all_set
    }

    /// Exclude-any bits
    pub fn exclusion_set(&self) -> &FixedBitSet {
        &self.exclusion_set
    }

    /// Require-one bits
    pub fn one_set(&self) -> &FixedBitSet {
        &self.one_set
    }

    /// Check a signature against the three sets, in all → exclude → one order
    pub fn is_interested(&self, signature: &Signature) -> bool {
        if !self.all_set.is_subset(signature) {
            return false;
        }

        if !self.exclusion_set.is_disjoint(signature) {
            return false;
        }

        if self.one_set.count_ones(..) > 0 && self.one_set.is_disjoint(signature) {
            return false;
        }

        true
    }
}

fn set_bits(set: &mut FixedBitSet, types: &ComponentTypeManager, type_ids: &[TypeId]) {
    for &type_id in type_ids {
        let index = types.get_index_for(type_id);
        if index >= set.len() {
            set.grow(index + 1);
        }
        set.insert(index);
    }
}
