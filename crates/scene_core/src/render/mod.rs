//! Renderable bookkeeping
//!
//! The scene core does not draw anything. It keeps renderable components
//! indexed by render layer and sorted by draw order, ready for a renderer
//! to walk.

pub mod renderable;
pub mod renderable_list;

pub use renderable::{DrawOrder, DrawOrderSource, Renderable, RenderableHandle};
pub use renderable_list::RenderableComponentList;
