//! # Scene
//!
//! Composition root for one frame-driven scene. A [`Scene`] owns the entity
//! list, the renderable index, the optional entity systems and the physics
//! broad-phase, and drives them in a fixed order every frame:
//!
//! 1. flush entity membership (removals, then additions);
//! 2. run entity systems;
//! 3. update entities (component flush, component updates, collider flush);
//! 4. run entity systems' late update;
//! 5. perform owed renderable sorts.
//!
//! Calls that take an id which may have gone stale return
//! `Result<_, EcsError>`; everything else follows the deferred bookkeeping
//! rules of the underlying lists.

use std::rc::Rc;

use crate::config::SceneConfig;
use crate::ecs::{
    Component, ComponentId, ComponentTypeManager, EcsError, Entity, EntityId, EntityList,
    EntityProcessorList, EntitySystem,
};
use crate::foundation::math::{Transform, Vec2};
use crate::physics::{Collider, ColliderId, ColliderRegistry, PhysicsBroadPhase};
use crate::render::{RenderableComponentList, RenderableHandle};

/// Scene-wide collaborators lent to entity and component flushes
///
/// Split out of [`Scene`] so the entity list can be borrowed mutably at the
/// same time.
pub struct SceneContext<'a> {
    /// Renderable index receiving forwarded renderables
    pub renderables: &'a mut RenderableComponentList,
    /// Entity systems, when enabled for the scene
    pub processors: Option<&'a mut EntityProcessorList>,
    /// Physics broad-phase receiving collider registrations
    pub broad_phase: &'a mut dyn PhysicsBroadPhase,
    /// Component type registry backing signatures
    pub types: &'a ComponentTypeManager,
}

/// A frame-driven collection of entities
pub struct Scene {
    config: SceneConfig,
    types: Rc<ComponentTypeManager>,
    entities: EntityList,
    renderables: RenderableComponentList,
    processors: Option<EntityProcessorList>,
    broad_phase: Box<dyn PhysicsBroadPhase>,
    frame: u64,
}

impl Scene {
    /// Create a scene backed by a brute-force [`ColliderRegistry`]
    pub fn new(config: SceneConfig, types: Rc<ComponentTypeManager>) -> Self {
        log::info!(
            "Creating scene '{}' (entity systems {})",
            config.name,
            if config.enable_entity_systems { "enabled" } else { "disabled" }
        );

        Self {
            entities: EntityList::with_capacity(config.entity_capacity),
            renderables: RenderableComponentList::with_capacity(config.renderable_capacity),
            processors: config.enable_entity_systems.then(EntityProcessorList::new),
            broad_phase: Box::new(ColliderRegistry::new()),
            types,
            config,
            frame: 0,
        }
    }

    /// Replace the physics broad-phase
    ///
    /// Must be called before any collider has been registered.
    pub fn with_broad_phase(mut self, broad_phase: Box<dyn PhysicsBroadPhase>) -> Self {
        debug_assert_eq!(self.broad_phase.collider_count(), 0);
        self.broad_phase = broad_phase;
        self
    }

    /// Scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Shared component type registry
    pub fn types(&self) -> &Rc<ComponentTypeManager> {
        &self.types
    }

    /// Number of completed frames
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Entity list
    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    /// Renderable index, in draw order after each update
    pub fn renderables(&self) -> &RenderableComponentList {
        &self.renderables
    }

    /// Physics broad-phase
    pub fn broad_phase(&self) -> &dyn PhysicsBroadPhase {
        self.broad_phase.as_ref()
    }

    /// Entity systems, if enabled
    pub fn processors(&self) -> Option<&EntityProcessorList> {
        self.processors.as_ref()
    }

    /// Create an empty entity; it joins the scene at the next update
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.entities.add(Entity::new(name))
    }

    /// Add a prepared entity; it joins the scene at the next update
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.add(entity)
    }

    /// Queue an entity for destruction
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        self.entities.try_get(id)?;
        self.entities.remove(id);
        Ok(())
    }

    /// Entity by id, live or pending
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Queue a component on an entity
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<ComponentId, EcsError> {
        Ok(self.entities.try_get_mut(entity)?.add_component(component))
    }

    /// Queue removal of a component
    pub fn remove_component(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Result<(), EcsError> {
        let entity = self.entities.try_get_mut(entity)?;
        if entity.components().get_by_id(component).is_none() {
            return Err(EcsError::ComponentNotFound(component));
        }
        entity.components_mut().remove(component);
        Ok(())
    }

    /// First component of type `T` on an entity, live or pending
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.entities.get(entity)?.get_component::<T>()
    }

    /// Mutable first component of type `T` on an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities.get_mut(entity)?.get_component_mut::<T>()
    }

    /// Enable or disable a component
    pub fn set_component_enabled(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        enabled: bool,
    ) -> Result<(), EcsError> {
        let entity = self.entities.try_get_mut(entity)?;
        if entity.components().get_by_id(component).is_none() {
            return Err(EcsError::ComponentNotFound(component));
        }
        entity.set_component_enabled(component, enabled);
        Ok(())
    }

    /// Queue a collider on an entity
    pub fn add_collider<T: Collider>(
        &mut self,
        entity: EntityId,
        collider: T,
    ) -> Result<ColliderId, EcsError> {
        Ok(self.entities.try_get_mut(entity)?.add_collider(collider))
    }

    /// Remove a collider; it leaves the broad-phase immediately
    pub fn remove_collider(
        &mut self,
        entity: EntityId,
        collider: ColliderId,
    ) -> Result<Box<dyn Collider>, EcsError> {
        let entity = self.entities.try_get_mut(entity)?;
        if entity.colliders().get_by_id(collider).is_none() {
            return Err(EcsError::ColliderNotFound(collider));
        }
        entity
            .colliders
            .remove(collider, self.broad_phase.as_mut())
            .ok_or(EcsError::ColliderNotFound(collider))
    }

    /// Change an entity's tag
    pub fn set_tag(&mut self, entity: EntityId, tag: i32) -> Result<(), EcsError> {
        self.entities.set_tag(entity, tag)
    }

    /// Change an entity's update order
    pub fn set_update_order(&mut self, entity: EntityId, update_order: i32) -> Result<(), EcsError> {
        self.entities.set_update_order(entity, update_order)
    }

    /// Enable or disable an entity
    ///
    /// Components receive `on_enabled`/`on_disabled` and colliders are
    /// registered or unregistered in bulk.
    pub fn set_entity_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<(), EcsError> {
        let (entities, mut ctx) = self.parts();
        entities.try_get_mut(entity)?.set_enabled(enabled, &mut ctx);
        Ok(())
    }

    /// Move an entity
    pub fn set_position(&mut self, entity: EntityId, position: Vec2) -> Result<(), EcsError> {
        let mut transform = self.entities.try_get(entity)?.transform().clone();
        transform.position = position;
        self.set_transform(entity, transform)
    }

    /// Replace an entity's transform and notify its components and colliders
    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) -> Result<(), EcsError> {
        let (entities, mut ctx) = self.parts();
        entities.try_get_mut(entity)?.set_transform(transform, &mut ctx);
        Ok(())
    }

    /// Change a renderable's render layer, keeping the layer index in step
    pub fn set_render_layer(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        render_layer: i32,
    ) -> Result<(), EcsError> {
        let owner = self.entities.try_get_mut(entity)?;
        if owner.components().get_by_id(component).is_none() {
            return Err(EcsError::ComponentNotFound(component));
        }

        let renderable = owner
            .components_mut()
            .renderable_mut(component)
            .ok_or(EcsError::NotRenderable(component))?;
        let old_render_layer = renderable.render_layer();
        renderable.set_render_layer(render_layer);

        // Not flushed yet: the layer is picked up when it is added
        self.renderables.update_renderable_render_layer(
            RenderableHandle::new(entity, component),
            old_render_layer,
            render_layer,
        );
        Ok(())
    }

    /// Change a renderable's depth inside its layer
    pub fn set_layer_depth(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        layer_depth: f32,
    ) -> Result<(), EcsError> {
        let owner = self.entities.try_get_mut(entity)?;
        if owner.components().get_by_id(component).is_none() {
            return Err(EcsError::ComponentNotFound(component));
        }
        let live = owner.components().is_live(component);

        let renderable = owner
            .components_mut()
            .renderable_mut(component)
            .ok_or(EcsError::NotRenderable(component))?;
        renderable.set_layer_depth(layer_depth);
        let render_layer = renderable.render_layer();

        if live {
            self.renderables
                .set_render_layer_needs_component_sort(render_layer);
        }
        Ok(())
    }

    /// Add an entity system
    ///
    /// Live entities are evaluated against its matcher right away.
    pub fn add_processor<T: EntitySystem>(&mut self, system: T) -> Result<(), EcsError> {
        let processors = self.processors.as_mut().ok_or(EcsError::SystemsDisabled)?;

        let mut system: Box<dyn EntitySystem> = Box::new(system);
        for entity in self.entities.iter() {
            system.on_change(entity);
        }
        processors.add_boxed(system);
        Ok(())
    }

    /// Remove the first entity system of type `T`
    pub fn remove_processor<T: EntitySystem>(&mut self) -> Option<Box<dyn EntitySystem>> {
        self.processors.as_mut()?.remove::<T>()
    }

    /// First entity system of type `T`
    pub fn processor<T: EntitySystem>(&self) -> Option<&T> {
        self.processors.as_ref()?.get::<T>()
    }

    /// Mutable first entity system of type `T`
    pub fn processor_mut<T: EntitySystem>(&mut self) -> Option<&mut T> {
        self.processors.as_mut()?.get_mut::<T>()
    }

    /// First entity named `name`, live or pending
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.find_entity(name)
    }

    /// Live entities with `tag`
    pub fn entities_with_tag(&mut self, tag: i32) -> &[EntityId] {
        self.entities.entities_with_tag(tag)
    }

    /// First component of type `T` across the scene
    pub fn find_component_of_type<T: Component>(&self) -> Option<&T> {
        self.entities.find_component_of_type::<T>()
    }

    /// Advance one frame
    pub fn update(&mut self) {
        let frame = self.frame;

        {
            let (entities, mut ctx) = self.parts();
            entities.update_lists(&mut ctx);
        }

        if let Some(processors) = self.processors.as_mut() {
            processors.update(&mut self.entities);
        }

        {
            let (entities, mut ctx) = self.parts();
            entities.update(&mut ctx, frame);
        }

        if let Some(processors) = self.processors.as_mut() {
            processors.late_update(&mut self.entities);
        }

        self.renderables.update_lists(&self.entities);
        self.frame += 1;

        log::trace!(
            "Scene '{}' frame {}: {} entities, {} renderables, {} colliders",
            self.config.name,
            frame,
            self.entities.len(),
            self.renderables.len(),
            self.broad_phase.collider_count()
        );
    }

    /// Tear down every entity
    pub fn end(&mut self) {
        {
            let (entities, mut ctx) = self.parts();
            entities.remove_all(&mut ctx);
        }

        debug_assert!(self.renderables.is_empty());
        debug_assert_eq!(self.broad_phase.collider_count(), 0);
        log::debug!("Scene '{}' ended after {} frames", self.config.name, self.frame);
    }

    fn parts(&mut self) -> (&mut EntityList, SceneContext<'_>) {
        let ctx = SceneContext {
            renderables: &mut self.renderables,
            processors: self.processors.as_mut(),
            broad_phase: self.broad_phase.as_mut(),
            types: self.types.as_ref(),
        };
        (&mut self.entities, ctx)
    }
}
