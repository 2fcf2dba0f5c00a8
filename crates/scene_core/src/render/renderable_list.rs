//! Scene-wide renderable bookkeeping
//!
//! Keeps one master list of every renderable component in draw order plus a
//! bucket per render layer. Both are sorted lazily: mutations only mark a
//! sort as owed, and [`RenderableComponentList::update_lists`] pays for it at
//! most once per frame.
//!
//! The layer each renderable is bucketed under is recorded when it is added.
//! A component may change its own layer without telling the list; the next
//! `update_lists` moves it to the bucket matching its current layer.

use std::collections::{HashMap, HashSet};

use super::renderable::{DrawOrderSource, RenderableHandle};

/// Render-layer indexed list of renderable components
#[derive(Debug, Default)]
pub struct RenderableComponentList {
    /// All renderables, sorted by draw order after `update_lists`
    components: Vec<RenderableHandle>,

    /// Renderables grouped by render layer
    component_lists: HashMap<i32, Vec<RenderableHandle>>,

    /// Layer each renderable is currently bucketed under
    registered_layers: HashMap<RenderableHandle, i32>,

    /// Layers whose bucket owes a sort
    unsorted_render_layers: HashSet<i32>,

    /// Master list owes a sort
    components_need_sort: bool,
}

impl RenderableComponentList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty list with room for `capacity` renderables
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            components: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Number of renderables
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if there are no renderables
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Renderable at `index` in draw order
    pub fn get(&self, index: usize) -> Option<RenderableHandle> {
        self.components.get(index).copied()
    }

    /// Iterate renderables in draw order
    pub fn iter(&self) -> impl Iterator<Item = RenderableHandle> + '_ {
        self.components.iter().copied()
    }

    /// Check if a renderable is in the master list
    pub fn contains(&self, handle: RenderableHandle) -> bool {
        self.components.contains(&handle)
    }

    /// Add a renderable on its current render layer
    pub fn add(&mut self, handle: RenderableHandle, render_layer: i32) {
        debug_assert!(
            !self.components.contains(&handle),
            "renderable {:?} added twice",
            handle
        );

        self.components.push(handle);
        self.add_to_render_layer_list(handle, render_layer);
        self.components_need_sort = true;
    }

    /// Remove a renderable from the master list and the bucket it is on
    pub fn remove(&mut self, handle: RenderableHandle) {
        match self.components.iter().position(|&h| h == handle) {
            Some(index) => {
                self.components.remove(index);
            }
            None => {
                debug_assert!(false, "renderable {:?} is not in the scene list", handle);
                log::error!("Tried to remove renderable {:?} that is not in the scene list", handle);
                return;
            }
        }

        if let Some(render_layer) = self.registered_layers.get(&handle).copied() {
            self.remove_from_render_layer_list(handle, render_layer);
        }
    }

    /// Layer bucket a renderable is currently on
    pub fn registered_layer(&self, handle: RenderableHandle) -> Option<i32> {
        self.registered_layers.get(&handle).copied()
    }

    /// Move a renderable between layer buckets after its layer changed
    ///
    /// The move starts from the bucket the renderable is recorded on, which
    /// differs from `old_render_layer` only when the component changed its
    /// own layer since the last flush. A renderable that has not been flushed
    /// into the scene yet is not in any bucket; it picks up its new layer when
    /// it is added, so the call is a no-op for it.
    pub fn update_renderable_render_layer(
        &mut self,
        handle: RenderableHandle,
        old_render_layer: i32,
        new_render_layer: i32,
    ) {
        let Some(registered) = self.registered_layer(handle) else {
            return;
        };
        if registered != old_render_layer {
            log::debug!(
                "Renderable {:?} is bucketed on layer {}, not {}",
                handle,
                registered,
                old_render_layer
            );
        }
        self.move_to_render_layer(handle, registered, new_render_layer);
    }

    /// Bucket for a render layer, created if absent
    pub fn components_with_render_layer(&mut self, render_layer: i32) -> &[RenderableHandle] {
        self.component_lists.entry(render_layer).or_default()
    }

    /// Bucket for a render layer without creating it
    pub fn render_layer(&self, render_layer: i32) -> Option<&[RenderableHandle]> {
        self.component_lists.get(&render_layer).map(Vec::as_slice)
    }

    /// Mark the master list as owing a sort
    pub fn set_needs_component_sort(&mut self) {
        self.components_need_sort = true;
    }

    /// Mark a layer bucket (and the master list) as owing a sort
    ///
    /// Called when the depth of a renderable on that layer changes.
    pub fn set_render_layer_needs_component_sort(&mut self, render_layer: i32) {
        self.unsorted_render_layers.insert(render_layer);
        self.components_need_sort = true;
    }

    /// Check if any sort is owed
    pub fn needs_sort(&self) -> bool {
        self.components_need_sort || !self.unsorted_render_layers.is_empty()
    }

    /// Rebucket renderables whose layer changed, then perform owed sorts;
    /// called once per frame
    pub fn update_lists(&mut self, source: &dyn DrawOrderSource) {
        let moved: Vec<_> = self
            .components
            .iter()
            .filter_map(|&handle| {
                let current = source.draw_order(handle)?.render_layer;
                let registered = self.registered_layer(handle)?;
                (current != registered).then_some((handle, registered, current))
            })
            .collect();
        for (handle, registered, current) in moved {
            log::trace!("Renderable {:?} moved from layer {} to {}", handle, registered, current);
            self.move_to_render_layer(handle, registered, current);
        }

        if self.components_need_sort {
            self.components
                .sort_by_cached_key(|&handle| source.draw_order(handle).unwrap_or_default());
            self.components_need_sort = false;
        }

        for render_layer in self.unsorted_render_layers.drain() {
            if let Some(list) = self.component_lists.get_mut(&render_layer) {
                list.sort_by_cached_key(|&handle| source.draw_order(handle).unwrap_or_default());
            }
        }
    }

    fn move_to_render_layer(&mut self, handle: RenderableHandle, from: i32, to: i32) {
        if from == to {
            return;
        }
        self.remove_from_render_layer_list(handle, from);
        self.add_to_render_layer_list(handle, to);
        self.components_need_sort = true;
    }

    fn add_to_render_layer_list(&mut self, handle: RenderableHandle, render_layer: i32) {
        let list = self.component_lists.entry(render_layer).or_default();
        debug_assert!(
            !list.contains(&handle),
            "renderable {:?} is already on render layer {}",
            handle,
            render_layer
        );

        list.push(handle);
        self.registered_layers.insert(handle, render_layer);
        self.unsorted_render_layers.insert(render_layer);
    }

    fn remove_from_render_layer_list(&mut self, handle: RenderableHandle, render_layer: i32) {
        let position = self
            .component_lists
            .get(&render_layer)
            .and_then(|list| list.iter().position(|&h| h == handle));

        match position {
            Some(index) => {
                if let Some(list) = self.component_lists.get_mut(&render_layer) {
                    list.remove(index);
                }
                self.registered_layers.remove(&handle);
            }
            None => {
                debug_assert!(
                    false,
                    "renderable {:?} is not on render layer {}",
                    handle,
                    render_layer
                );
                log::error!(
                    "Stale render layer {} used to remove renderable {:?}",
                    render_layer,
                    handle
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ComponentId, EntityId};
    use crate::render::renderable::DrawOrder;
    use slotmap::SlotMap;

    #[derive(Default)]
    struct Orders(HashMap<RenderableHandle, DrawOrder>);

    impl DrawOrderSource for Orders {
        fn draw_order(&self, handle: RenderableHandle) -> Option<DrawOrder> {
            self.0.get(&handle).copied()
        }
    }

    fn handles(count: usize) -> Vec<RenderableHandle> {
        let mut entities: SlotMap<EntityId, ()> = SlotMap::with_key();
        let mut components: SlotMap<ComponentId, ()> = SlotMap::with_key();
        let entity = entities.insert(());
        (0..count)
            .map(|_| RenderableHandle::new(entity, components.insert(())))
            .collect()
    }

    #[test]
    fn test_add_indexes_by_layer() {
        let h = handles(3);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 1);
        list.add(h[1], 2);
        list.add(h[2], 1);

        assert_eq!(list.len(), 3);
        assert_eq!(list.components_with_render_layer(1), &[h[0], h[2]]);
        assert_eq!(list.components_with_render_layer(2), &[h[1]]);
        assert!(list.components_with_render_layer(9).is_empty());
        assert!(list.render_layer(9).is_some());
        assert!(list.render_layer(10).is_none());
    }

    #[test]
    fn test_remove_drops_from_master_and_bucket() {
        let h = handles(2);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 0);
        list.add(h[1], 0);

        list.remove(h[0]);
        assert!(!list.contains(h[0]));
        assert_eq!(list.components_with_render_layer(0), &[h[1]]);
    }

    #[test]
    fn test_update_lists_sorts_by_draw_order() {
        let h = handles(3);
        let mut orders = Orders::default();
        orders.0.insert(h[0], DrawOrder::new(0, 0.0));
        orders.0.insert(h[1], DrawOrder::new(5, 0.0));
        orders.0.insert(h[2], DrawOrder::new(0, 0.5));

        let mut list = RenderableComponentList::new();
        for &handle in &h {
            list.add(handle, orders.0[&handle].render_layer);
        }
        assert!(list.needs_sort());

        list.update_lists(&orders);
        assert!(!list.needs_sort());
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![h[1], h[2], h[0]]);
        assert_eq!(list.components_with_render_layer(0), &[h[2], h[0]]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let h = handles(4);
        let mut orders = Orders::default();
        // Equal keys within each pair; insertion order breaks the tie
        for (i, &handle) in h.iter().enumerate() {
            orders.0.insert(handle, DrawOrder::new((i % 2) as i32, 0.0));
        }

        let mut list = RenderableComponentList::new();
        for &handle in &h {
            list.add(handle, orders.0[&handle].render_layer);
        }
        list.update_lists(&orders);
        let first: Vec<_> = list.iter().collect();

        list.set_needs_component_sort();
        list.update_lists(&orders);
        let second: Vec<_> = list.iter().collect();

        assert_eq!(first, second);
        assert_eq!(first, vec![h[1], h[3], h[0], h[2]]);
    }

    #[test]
    fn test_layer_change_moves_bucket() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 5);

        list.update_renderable_render_layer(h[0], 5, 3);
        assert!(list.components_with_render_layer(5).is_empty());
        assert_eq!(list.components_with_render_layer(3), &[h[0]]);
    }

    #[test]
    fn test_layer_change_before_add_is_tolerated() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();

        // Not added yet: nothing to move
        list.update_renderable_render_layer(h[0], 5, 3);
        assert!(list.render_layer(3).is_none());

        list.add(h[0], 3);
        assert_eq!(list.components_with_render_layer(3), &[h[0]]);
        assert!(list.components_with_render_layer(5).is_empty());
    }

    #[test]
    fn test_depth_change_resorts_layer() {
        let h = handles(2);
        let mut orders = Orders::default();
        orders.0.insert(h[0], DrawOrder::new(0, 0.1));
        orders.0.insert(h[1], DrawOrder::new(0, 0.2));

        let mut list = RenderableComponentList::new();
        list.add(h[0], 0);
        list.add(h[1], 0);
        list.update_lists(&orders);
        assert_eq!(list.components_with_render_layer(0), &[h[1], h[0]]);

        orders.0.insert(h[0], DrawOrder::new(0, 0.9));
        list.set_render_layer_needs_component_sort(0);
        list.update_lists(&orders);
        assert_eq!(list.components_with_render_layer(0), &[h[0], h[1]]);
        assert_eq!(list.get(0), Some(h[0]));
    }

    #[test]
    fn test_update_lists_follows_unannounced_layer_change() {
        let h = handles(2);
        let mut orders = Orders::default();
        orders.0.insert(h[0], DrawOrder::new(1, 0.0));
        orders.0.insert(h[1], DrawOrder::new(1, 0.0));

        let mut list = RenderableComponentList::new();
        list.add(h[0], 1);
        list.add(h[1], 1);
        list.update_lists(&orders);

        // The component changed its own layer without going through the list
        orders.0.insert(h[0], DrawOrder::new(7, 0.0));
        list.update_lists(&orders);

        assert_eq!(list.registered_layer(h[0]), Some(7));
        assert_eq!(list.components_with_render_layer(1), &[h[1]]);
        assert_eq!(list.components_with_render_layer(7), &[h[0]]);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![h[0], h[1]]);

        list.remove(h[0]);
        assert!(list.components_with_render_layer(7).is_empty());
        assert_eq!(list.registered_layer(h[0]), None);
    }

    #[test]
    fn test_layer_change_uses_registered_layer() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 1);

        // Caller's idea of the old layer is out of date
        list.update_renderable_render_layer(h[0], 7, 3);
        assert!(list.components_with_render_layer(1).is_empty());
        assert_eq!(list.components_with_render_layer(3), &[h[0]]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "added twice")]
    fn test_double_add_panics_in_debug() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 1);
        list.add(h[0], 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is already on render layer 2")]
    fn test_double_bucket_insert_panics_in_debug() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.add_to_render_layer_list(h[0], 2);
        list.add_to_render_layer_list(h[0], 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not on render layer 4")]
    fn test_stale_layer_removal_panics_in_debug() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.add(h[0], 1);
        list.remove_from_render_layer_list(h[0], 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not in the scene list")]
    fn test_remove_unknown_renderable_panics_in_debug() {
        let h = handles(1);
        let mut list = RenderableComponentList::new();
        list.remove(h[0]);
    }
}
