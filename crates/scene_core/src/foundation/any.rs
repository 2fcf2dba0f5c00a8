//! Downcasting support for boxed trait objects

use std::any::Any;

/// Upcast to `Any` so boxed components, colliders and systems can be
/// looked up by concrete type
///
/// Implemented for every `'static` type; trait objects inherit it as a
/// supertrait. Always call it through the trait object (`&dyn Component`),
/// never through the `Box`, or the box itself is what gets downcast.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type, for diagnostics
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
