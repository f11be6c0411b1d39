//! Core class-graph types and operations.
//!
//! This module defines the fundamental building blocks:
//! - [`ClassEntity`]: Classes discovered from source or synthesized as placeholders
//! - [`ClassGraph`]: Arena storage plus hierarchy queries
//! - [`PendingBase`]: Base references captured before resolution

mod class_graph;
mod types;

pub use class_graph::{ClassGraph, DEFAULT_ABSTRACT_MARKER};
pub use types::{ClassEntity, ClassId, MethodEntity, NameAttr, PendingBase};
