//! A scanned package root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ResolveError, Result};
use crate::files::{scan_package, DiscoveryOptions, PackageLayout};
use crate::module::Module;

/// Where a dotted name lives inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassPath {
    /// The name splits into a parseable module and a class path inside it
    Module {
        /// Long name of the owning module
        module: String,
        /// Nesting-qualified class path within the module
        class_path: String,
    },
    /// The name belongs to a stub module
    Stub,
}

/// A package root with its scan results and loaded modules
#[derive(Debug)]
pub struct Package {
    /// Package name, the root directory's name
    pub name: String,

    /// Root directory the package was scanned from
    pub path: PathBuf,

    /// Modules, stubs and subpackages found at scan time
    pub layout: PackageLayout,

    /// Modules parsed so far, by long name
    pub modules: HashMap<String, Module>,
}

impl Package {
    /// Scan `root` into a package.
    pub fn discover(root: impl AsRef<Path>, options: &DiscoveryOptions) -> Result<Self> {
        let root = root.as_ref();
        let layout = scan_package(root, options)?;
        Ok(Self {
            name: layout.package.clone(),
            path: root.to_path_buf(),
            layout,
            modules: HashMap::new(),
        })
    }

    /// Split `dotted` into its owning module and the class path inside it.
    ///
    /// The longest module prefix wins, so `pkg.sub.mod.Outer.Inner` prefers
    /// module `pkg.sub.mod` over `pkg.sub`.
    pub fn class_path(&self, dotted: &str) -> Result<ClassPath> {
        let segments: Vec<&str> = dotted.split('.').collect();
        for i in 1..segments.len() {
            let module_name = segments[..segments.len() - i].join(".");
            if self.layout.modules.contains_key(&module_name) {
                return Ok(ClassPath::Module {
                    module: module_name,
                    class_path: segments[segments.len() - i..].join("."),
                });
            }
            if self.layout.stub_modules.contains(&module_name) {
                return Ok(ClassPath::Stub);
            }
        }
        Err(ResolveError::unresolvable_dotted_name(dotted, &self.name))
    }

    /// Whether `name` is a directory below the package root.
    pub fn is_subpackage(&self, name: &str) -> bool {
        self.layout.subpackages.contains(name)
    }

    /// Long names of every module inside subpackage `name`, in sorted order.
    pub fn subpackage_modules(&self, name: &str) -> Vec<String> {
        let prefix = format!("{name}.");
        self.layout
            .modules
            .keys()
            .filter(|module| module.as_str() == name || module.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Long names of every module found at scan time, in sorted order.
    pub fn module_names(&self) -> Vec<String> {
        self.layout.modules.keys().cloned().collect()
    }
}
