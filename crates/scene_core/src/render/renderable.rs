//! Renderable capability for components
//!
//! A renderable component exposes a render layer (integer grouping used for
//! draw-order buckets) and a layer depth (ordering inside a layer). The
//! rendering pipeline itself lives outside the scene core; it only consumes
//! the ordered lists maintained by [`RenderableComponentList`].
//!
//! [`RenderableComponentList`]: super::RenderableComponentList

use std::cmp::Ordering;

use crate::ecs::{ComponentId, EntityId};

/// Capability implemented by components that produce visual output
pub trait Renderable {
    /// Current render layer
    fn render_layer(&self) -> i32;

    /// Change the render layer
    ///
    /// [`Scene::set_render_layer`](crate::scene::Scene::set_render_layer)
    /// moves the component between layer buckets right away. A component
    /// changing its own layer is rebucketed at the end of the frame.
    fn set_render_layer(&mut self, layer: i32);

    /// Depth inside the render layer
    fn layer_depth(&self) -> f32 {
        0.0
    }

    /// Change the depth inside the render layer
    fn set_layer_depth(&mut self, _depth: f32) {}

    /// Draw order key used to sort the scene's renderable list
    fn draw_order(&self) -> DrawOrder {
        DrawOrder::new(self.render_layer(), self.layer_depth())
    }
}

/// Identifies one renderable component in a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableHandle {
    /// Owning entity
    pub entity: EntityId,
    /// Component within the entity's component list
    pub component: ComponentId,
}

impl RenderableHandle {
    /// Create a new handle
    pub fn new(entity: EntityId, component: ComponentId) -> Self {
        Self { entity, component }
    }
}

/// Comparable draw order value
///
/// Higher render layers sort first (they are drawn behind lower layers),
/// then higher layer depths within the same layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawOrder {
    /// Render layer
    pub render_layer: i32,
    /// Depth inside the layer
    pub layer_depth: f32,
}

impl DrawOrder {
    /// Create a new draw order
    pub fn new(render_layer: i32, layer_depth: f32) -> Self {
        Self { render_layer, layer_depth }
    }
}

impl PartialEq for DrawOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DrawOrder {}

impl PartialOrd for DrawOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrawOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .render_layer
            .cmp(&self.render_layer)
            .then_with(|| other.layer_depth.total_cmp(&self.layer_depth))
    }
}

/// Read access to the current draw order of renderables
///
/// Implemented by the entity list, which owns the components; the renderable
/// list only stores handles.
pub trait DrawOrderSource {
    /// Draw order of a renderable, or `None` if the handle is stale
    fn draw_order(&self, handle: RenderableHandle) -> Option<DrawOrder>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_layer_sorts_first() {
        let back = DrawOrder::new(10, 0.0);
        let front = DrawOrder::new(0, 0.0);
        assert!(back < front);
    }

    #[test]
    fn test_higher_depth_sorts_first_within_layer() {
        let deep = DrawOrder::new(1, 0.9);
        let shallow = DrawOrder::new(1, 0.1);
        assert!(deep < shallow);
        assert_eq!(DrawOrder::new(1, 0.5), DrawOrder::new(1, 0.5));
    }
}
