//! Physics bookkeeping for scene entities
//!
//! Colliders are collision shapes attached to entities. Each entity keeps
//! them in a [`ColliderList`], which bridges their lifecycle to a
//! [`PhysicsBroadPhase`]. Contact generation and response live outside the
//! scene core.

pub mod broad_phase;
pub mod collider;
pub mod collider_list;

pub use broad_phase::{ColliderRegistry, PhysicsBroadPhase};
pub use collider::{BoxCollider, Collider, ColliderHandle, ColliderId};
pub use collider_list::ColliderList;
