//! # classgraph
//!
//! An in-memory class hierarchy graph with post-filters and Graphviz record
//! export.
//!
//! ## Core Principles
//!
//! - **Parser Agnostic**: any frontend that produces [`ClassEntity`] values
//!   can feed the graph
//! - **Append Only**: classes are appended and keep their [`ClassId`] for the
//!   lifetime of the graph
//! - **Filters Over Deletion**: filters narrow a set of class ids, the graph
//!   itself is never mutated by rendering
//! - **Deterministic Output**: iteration orders are stable so DOT output
//!   diffs cleanly
//!
//! ## Architecture
//!
//! ```text
//! Language Frontends (discovery, resolution)
//!     ↓
//! Class Graph (entities, bases, children)
//!     ↓
//! Filter Pipeline (removers, keepers)
//!     ↓
//! DOT Export (record labels, styles)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use classgraph::{ClassEntity, ClassGraph};
//!
//! let mut graph = ClassGraph::new();
//! let shape = graph.add_class(ClassEntity::new("Shape", "geo.base"));
//! let circle = graph.add_class(ClassEntity::new("Circle", "geo.round"));
//! graph.add_base(circle, shape);
//!
//! assert_eq!(graph[circle].bases, vec![shape]);
//! assert_eq!(graph[shape].children, vec![circle]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod graph;

// Re-export main types
pub use config::Config;
pub use error::{GraphError, Result};
pub use export::{export_dot, NodeStyle, RecordOptions, StyleSet};
pub use filter::{apply_filters, load_filters, ClassFilter, Filter, FilterRecord, FilterRegistry};
pub use graph::{ClassEntity, ClassGraph, ClassId, MethodEntity, NameAttr, PendingBase};
