//! A parsed module and its per-name resolution caches.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use classgraph::ClassId;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::extract::{extract_module, ModuleIr, VisitorFlags};
use crate::files::ModuleFile;

/// One parsed module.
///
/// Caches remember every name ever asked of this module so repeated lookups,
/// including failed ones, stay O(1).
#[derive(Debug)]
pub struct Module {
    /// Dotted long name, rooted at the package name
    pub long_name: String,

    /// Whether the module is a package `__init__`
    pub is_init: bool,

    /// Path the module was parsed from
    pub path: PathBuf,

    /// Extracted classes and imports
    pub ir: Rc<ModuleIr>,

    /// Materialized classes by nesting-qualified name
    pub classes: HashMap<String, ClassId>,

    /// Resolved import bindings by requested name
    pub import_class_map: HashMap<String, ClassId>,

    /// Placeholders synthesized here, by requested name
    pub not_found: HashMap<String, ClassId>,

    /// Names recursive lookups walked through without an answer
    pub not_found_trial: HashSet<String>,
}

impl Module {
    /// Read and parse the module stored at `file`.
    pub fn load(
        long_name: impl Into<String>,
        file: &ModuleFile,
        flags: &VisitorFlags,
    ) -> Result<Self> {
        let long_name = long_name.into();
        let source =
            fs::read_to_string(&file.path).map_err(|e| ResolveError::io(&file.path, e))?;
        let ir = extract_module(&source, &file.path, &long_name, file.is_init, flags)?;
        debug!(
            module = %long_name,
            classes = ir.classes.len(),
            imports = ir.imports.len(),
            "module parsed"
        );
        Ok(Self {
            long_name,
            is_init: file.is_init,
            path: file.path.clone(),
            ir: Rc::new(ir),
            classes: HashMap::new(),
            import_class_map: HashMap::new(),
            not_found: HashMap::new(),
            not_found_trial: HashSet::new(),
        })
    }

    /// Previously resolved id for `name`, if any.
    ///
    /// Own classes win over import bindings, which win over placeholders.
    pub fn cached(&self, name: &str) -> Option<ClassId> {
        self.classes
            .get(name)
            .or_else(|| self.import_class_map.get(name))
            .or_else(|| self.not_found.get(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_module(dir: &Path, name: &str, content: &str) -> ModuleFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        ModuleFile {
            path,
            is_init: false,
        }
    }

    #[test]
    fn test_load_parses_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_module(
            dir.path(),
            "base.py",
            "from abc import ABC\n\nclass Shape(ABC):\n    pass\n",
        );

        let module = Module::load("geo.base", &file, &VisitorFlags::default()).unwrap();
        assert_eq!(module.long_name, "geo.base");
        assert!(!module.is_init);
        assert_eq!(module.ir.classes.len(), 1);
        assert_eq!(module.ir.imports.len(), 1);
        assert!(module.classes.is_empty());
    }

    #[test]
    fn test_load_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_module(dir.path(), "broken.py", "class :\n");

        let err = Module::load("pkg.broken", &file, &VisitorFlags::default());
        assert!(matches!(err, Err(ResolveError::MalformedSource { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let file = ModuleFile {
            path: PathBuf::from("/nonexistent/gone.py"),
            is_init: false,
        };
        let err = Module::load("pkg.gone", &file, &VisitorFlags::default());
        assert!(matches!(err, Err(ResolveError::Io { .. })));
    }

    #[test]
    fn test_cached_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_module(dir.path(), "mod.py", "class A:\n    pass\n");
        let mut module = Module::load("pkg.mod", &file, &VisitorFlags::default()).unwrap();

        let mut graph = classgraph::ClassGraph::new();
        let own = graph.add_class(classgraph::ClassEntity::new("A", "pkg.mod"));
        let imported = graph.add_class(classgraph::ClassEntity::new("A", "pkg.other"));
        let placeholder = graph.add_class(classgraph::ClassEntity::placeholder("A"));

        assert_eq!(module.cached("A"), None);
        module.not_found.insert("A".to_string(), placeholder);
        assert_eq!(module.cached("A"), Some(placeholder));
        module.import_class_map.insert("A".to_string(), imported);
        assert_eq!(module.cached("A"), Some(imported));
        module.classes.insert("A".to_string(), own);
        assert_eq!(module.cached("A"), Some(own));
    }
}
