//! Package layout discovery.
//!
//! Walks a package root once and records every Python module by its dotted
//! long name. Modules are parsed later, on demand, so scanning a large tree
//! stays cheap.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ResolveError, Result};

/// Configuration for package discovery behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// File extensions parsed as Python source (default: ["py"])
    pub source_extensions: Vec<String>,

    /// File extensions treated as opaque stubs (default: ["pyi", "pyx", "pyc"])
    ///
    /// Classes imported from stub modules become placeholders instead of
    /// parse attempts.
    pub stub_extensions: Vec<String>,

    /// Directories to exclude from scanning
    pub exclude_dirs: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            source_extensions: vec!["py".to_string()],
            stub_extensions: vec![
                "pyi".to_string(),
                "pyx".to_string(),
                "pyc".to_string(),
            ],
            exclude_dirs: vec![
                "__pycache__".to_string(),
                ".git".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "env".to_string(),
                ".tox".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".eggs".to_string(),
                "*.egg-info".to_string(),
            ],
        }
    }
}

impl DiscoveryOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.source_extensions.is_empty() {
            return Err(ResolveError::invalid_options(
                "source_extensions cannot be empty",
            ));
        }
        for ext in &self.source_extensions {
            if self.is_stub_extension(ext) {
                return Err(ResolveError::invalid_options(format!(
                    "extension '{ext}' listed as both source and stub"
                )));
            }
        }
        Ok(())
    }

    /// Check if an extension is parsed as Python source
    pub fn is_source_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.source_extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.') == extension)
    }

    /// Check if an extension marks a stub module
    pub fn is_stub_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.stub_extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.') == extension)
    }

    /// Check if a directory should be excluded
    pub fn should_exclude_dir(&self, dir_name: &str) -> bool {
        self.exclude_dirs.iter().any(|excluded| {
            // Handle glob patterns like *.egg-info
            if excluded.contains('*') {
                let pattern = excluded.replace('*', "");
                dir_name.contains(&pattern)
            } else {
                dir_name == excluded
            }
        })
    }
}

/// Location of a single module source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Whether the file is a package `__init__`
    pub is_init: bool,
}

/// Everything discovery learned about one package root.
///
/// Keys are dotted long names rooted at the package name, so the file
/// `root/sub/mod.py` of package `root` appears as `root.sub.mod` and
/// `root/sub/__init__.py` as `root.sub`.
#[derive(Debug, Clone, Default)]
pub struct PackageLayout {
    /// Package name, taken from the root directory
    pub package: String,
    /// Parseable modules by dotted long name
    pub modules: BTreeMap<String, ModuleFile>,
    /// Stub modules by dotted long name
    pub stub_modules: BTreeSet<String>,
    /// Dotted names of directories below the root, at every depth
    pub subpackages: BTreeSet<String>,
}

/// Scan `root` and record every module of the package named after it.
pub fn scan_package(root: &Path, options: &DiscoveryOptions) -> Result<PackageLayout> {
    if !root.is_dir() {
        return Err(ResolveError::invalid_root(root, "not a directory"));
    }
    let package_name = root
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ResolveError::invalid_root(root, "unusable directory name"))?
        .to_string();

    let mut layout = PackageLayout {
        package: package_name.clone(),
        ..PackageLayout::default()
    };

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.file_type().is_dir() && e.depth() > 0 {
                if let Some(name) = e.file_name().to_str() {
                    return !options.should_exclude_dir(name);
                }
            }
            true
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        if entry.file_type().is_dir() {
            if entry.depth() > 0 {
                if let Some(name) = dotted_name(&package_name, relative, None) {
                    layout.subpackages.insert(name);
                }
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(extension) = entry.path().extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        let Some(parent) = relative.parent() else {
            continue;
        };
        let Some(stem) = entry.path().file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let is_init = stem == "__init__";
        let module_stem = if is_init { None } else { Some(stem) };
        let Some(long_name) = dotted_name(&package_name, parent, module_stem) else {
            continue;
        };

        if options.is_source_extension(extension) {
            let file = ModuleFile {
                path: entry.path().to_path_buf(),
                is_init,
            };
            // A package __init__ shadows a same-named sibling module.
            match layout.modules.get(&long_name) {
                Some(existing) if existing.is_init && !is_init => {}
                _ => {
                    layout.modules.insert(long_name, file);
                }
            }
        } else if options.is_stub_extension(extension) {
            layout.stub_modules.insert(long_name);
        }
    }

    Ok(layout)
}

/// Join package name, a root-relative directory path, and an optional stem
/// into a dotted name. Returns `None` when a path component is not valid
/// UTF-8.
fn dotted_name(package: &str, relative_dir: &Path, stem: Option<&str>) -> Option<String> {
    let mut segments = vec![package.to_string()];
    for component in relative_dir.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }
    if let Some(stem) = stem {
        segments.push(stem.to_string());
    }
    Some(segments.join("."))
}
