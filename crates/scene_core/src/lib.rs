//! # Scene Core
//!
//! Entity, component, renderable and collider bookkeeping for a frame-driven
//! game scene.
//!
//! ## Features
//!
//! - **Deferred membership**: entities, components and colliders are queued
//!   and applied in a per-frame flush, so hooks never see a list change under
//!   them
//! - **Two-phase component activation**: a component added this frame can find
//!   its same-frame siblings in `on_awake`
//! - **Tag and render-layer indices** with lazily sorted buckets
//! - **Signature matching** for entity systems through bitset matchers
//! - **Broad-phase bridge** registering colliders with a pluggable physics
//!   backend
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use scene_core::prelude::*;
//!
//! struct Health(i32);
//! impl Component for Health {}
//!
//! let types = Rc::new(ComponentTypeManager::new());
//! let mut scene = Scene::new(SceneConfig::new("demo"), types);
//!
//! let ship = scene.add_entity(
//!     Entity::new("ship")
//!         .with_tag(1)
//!         .with_component(Health(100))
//!         .with_collider(BoxCollider::new(2.0, 2.0)),
//! );
//!
//! // Visible right away, live after the next update
//! assert!(scene.get_component::<Health>(ship).is_some());
//! scene.update();
//! assert_eq!(scene.entities_with_tag(1), &[ship]);
//! assert_eq!(scene.broad_phase().collider_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        config::{Config, SceneConfig},
        ecs::{
            Component, ComponentContext, ComponentId, ComponentTypeManager, EcsError, Entity,
            EntityId, EntityList, EntitySystem, Matcher, SystemState,
        },
        foundation::math::{Aabb, Transform, Vec2},
        physics::{BoxCollider, Collider, ColliderHandle, ColliderId, PhysicsBroadPhase},
        render::{DrawOrder, Renderable, RenderableHandle},
        scene::Scene,
    };
}
