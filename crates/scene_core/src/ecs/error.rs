//! Errors for scene calls that take a possibly stale handle

use thiserror::Error;

use super::component::ComponentId;
use super::entity::EntityId;
use crate::physics::ColliderId;

/// Errors returned by scene-level operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity was never added or has been destroyed
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// The component is not owned by the given entity
    #[error("Component not found: {0:?}")]
    ComponentNotFound(ComponentId),

    /// The collider is not owned by the given entity
    #[error("Collider not found: {0:?}")]
    ColliderNotFound(ColliderId),

    /// The component has no renderable capability
    #[error("Component is not renderable: {0:?}")]
    NotRenderable(ComponentId),

    /// The scene was created without entity systems
    #[error("Entity systems are disabled for this scene")]
    SystemsDisabled,
}
