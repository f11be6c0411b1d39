//! # classgraph-python
//!
//! Python frontend for classgraph - discovers class hierarchies across
//! packages by walking definitions, imports and wildcard re-exports.
//!
//! ## Features
//!
//! - Scan package roots without parsing anything up front
//! - Resolve base classes through aliases, relative and wildcard imports
//! - Converge circular and forward references to a fixed point
//! - Keep unresolved names as placeholder classes instead of dropping them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use classgraph::{export_dot, RecordOptions};
//! use classgraph_python::PackageManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = PackageManager::new();
//! manager.add_package("path/to/mypackage")?;
//!
//! let classes = manager.find_all()?;
//! manager.update_inheritance()?;
//!
//! let dot = export_dot(manager.graph(), &classes, &RecordOptions::default());
//! println!("{dot}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod files;
pub mod manager;
pub mod module;
pub mod package;

pub use error::{ResolveError, Result};
pub use extract::{import_anchor, ImportBinding, ModuleIr, RawClass, VisitorFlags};
pub use files::{scan_package, DiscoveryOptions, ModuleFile, PackageLayout};
pub use manager::{PackageManager, PYTHON_PROTECTED_CLASSES};
pub use module::Module;
pub use package::{ClassPath, Package};
