//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the scene core:
//! - 2D math types (transforms, bounds)
//! - Type-erasure helpers for trait objects
//! - Logging utilities

pub mod math;
pub mod any;
pub mod logging;
