//! Core engine types and utilities for Starglider.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial helpers
//! - Fixed-step time management
//! - Rigid body state snapshots and force accumulation
//! - The shared world bounds cube

pub mod bounds;
pub mod components;
pub mod time;
pub mod transform;

pub use bounds::*;
pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
