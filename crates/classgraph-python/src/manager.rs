//! Cross-package resolution and the inheritance fixed point.
//!
//! The manager owns every [`Package`], the shared class arena, and the
//! registry of external placeholders. All name resolution funnels through
//! it: a module asks the manager for anything it cannot answer from its own
//! definitions, and the manager routes the request to the owning package or
//! mints a deduplicated placeholder for names outside the analyzed roots.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use classgraph::{ClassEntity, ClassGraph, ClassId, PendingBase};
use tracing::{debug, info, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::extract::VisitorFlags;
use crate::files::DiscoveryOptions;
use crate::module::Module;
use crate::package::{ClassPath, Package};

/// Built-in type names resolvable from any module without an import.
pub const PYTHON_PROTECTED_CLASSES: &[&str] = &[
    "Exception",
    "type",
    "object",
    "dict",
    "list",
    "tuple",
    "set",
    "RuntimeError",
    "UserWarning",
    "RuntimeWarning",
    "ValueError",
    "AttributeError",
];

/// Discovers and resolves classes across a set of package roots.
///
/// Resolution is demand-driven: modules parse on first reference, classes
/// materialize on first lookup, and base references resolve in the
/// [`update_inheritance`](Self::update_inheritance) fixed point. Names that
/// never resolve to a definition become placeholder entities, deduplicated
/// by long name, so the final graph renders unresolved bases instead of
/// dropping them.
#[derive(Debug, Default)]
pub struct PackageManager {
    graph: ClassGraph,
    packages: HashMap<String, Package>,
    unknown: HashMap<String, ClassId>,
    in_flight: HashSet<(String, String)>,
    flags: VisitorFlags,
    options: DiscoveryOptions,
    trial_dirty: bool,
}

impl PackageManager {
    /// Create a manager with default extraction flags and discovery options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with explicit extraction flags and discovery options.
    pub fn with_options(flags: VisitorFlags, options: DiscoveryOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            graph: ClassGraph::new(),
            packages: HashMap::new(),
            unknown: HashMap::new(),
            in_flight: HashSet::new(),
            flags,
            options,
            trial_dirty: false,
        })
    }

    /// Scan `root` and register it as a package.
    ///
    /// Nothing is parsed yet; modules load on first reference.
    #[instrument(skip(self, root), fields(root = %root.as_ref().display()))]
    pub fn add_package(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let package = Package::discover(root, &self.options)?;
        info!(
            package = %package.name,
            modules = package.layout.modules.len(),
            stubs = package.layout.stub_modules.len(),
            "package registered"
        );
        self.packages.insert(package.name.clone(), package);
        Ok(())
    }

    /// The class arena.
    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    /// Consume the manager and keep the arena.
    pub fn into_graph(self) -> ClassGraph {
        self.graph
    }

    /// Replace the dotted prefix that marks base classes as abstract.
    pub fn set_abstract_marker(&mut self, marker: impl Into<String>) {
        self.graph.set_abstract_marker(marker);
    }

    /// Resolve a discovery target into a set of class ids.
    ///
    /// A target naming a registered package expands to every class of every
    /// module under it; a subpackage name expands to its subtree; a module
    /// name expands to the module's top-level classes; anything else is
    /// resolved as a single dotted class path.
    #[instrument(skip(self))]
    pub fn find(&mut self, target: &str) -> Result<HashSet<ClassId>> {
        let root = target.split('.').next().unwrap_or(target);
        let Some(package) = self.packages.get(root) else {
            return Err(ResolveError::unknown_package(root));
        };

        let expansion = if self.packages.contains_key(target) {
            Some(package.module_names())
        } else if package.is_subpackage(target) {
            Some(package.subpackage_modules(target))
        } else if package.layout.modules.contains_key(target) {
            Some(vec![target.to_string()])
        } else {
            None
        };

        let mut found = HashSet::new();
        match expansion {
            Some(module_names) => {
                for module_name in module_names {
                    found.extend(self.expand_module(root, &module_name)?);
                }
            }
            None => {
                let resolved = self.resolve_class(target, &mut Vec::new());
                self.finish_trial();
                if let Some(id) = resolved? {
                    found.insert(id);
                }
            }
        }
        info!(target, classes = found.len(), "target resolved");
        Ok(found)
    }

    /// Materialize the top-level classes of every module of every package.
    #[instrument(skip(self))]
    pub fn find_all(&mut self) -> Result<HashSet<ClassId>> {
        let mut package_names: Vec<String> = self.packages.keys().cloned().collect();
        package_names.sort();

        let mut found = HashSet::new();
        for package_name in package_names {
            let module_names = match self.packages.get(&package_name) {
                Some(package) => package.module_names(),
                None => continue,
            };
            for module_name in module_names {
                found.extend(self.expand_module(&package_name, &module_name)?);
            }
        }
        info!(classes = found.len(), "all packages expanded");
        Ok(found)
    }

    /// Every class materialized so far, sorted by qualified short name.
    pub fn classes(&self) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self.graph.ids().collect();
        ids.sort_by(|&a, &b| {
            let left = &self.graph[a];
            let right = &self.graph[b];
            left.name
                .cmp(&right.name)
                .then_with(|| left.long_name.cmp(&right.long_name))
        });
        ids
    }

    /// Resolve one fully dotted class path.
    ///
    /// Always yields a class id: names outside the registered packages come
    /// back as placeholders. The only failure is a dotted name that cannot be
    /// split against any module of its owning package.
    #[instrument(skip(self))]
    pub fn find_class(&mut self, long_name: &str) -> Result<ClassId> {
        let resolved = self.resolve_class(long_name, &mut Vec::new());
        self.finish_trial();
        Ok(match resolved? {
            Some(id) => id,
            None => self.intern_unknown(long_name),
        })
    }

    /// Resolve every pending base reference to a fixed point.
    ///
    /// Each pass drains `pending_bases` across all loaded modules; resolving
    /// a base may materialize new classes with pending bases of their own, so
    /// passes repeat until one completes without resolving anything.
    #[instrument(skip(self))]
    pub fn update_inheritance(&mut self) -> Result<()> {
        loop {
            let mut done = true;

            let mut module_keys: Vec<(String, String)> = self
                .packages
                .iter()
                .flat_map(|(package_name, package)| {
                    package
                        .modules
                        .keys()
                        .map(move |module_name| (package_name.clone(), module_name.clone()))
                })
                .collect();
            module_keys.sort();

            for (package_name, module_name) in &module_keys {
                let mut class_ids: Vec<ClassId> = self
                    .module(package_name, module_name)?
                    .classes
                    .values()
                    .copied()
                    .collect();
                class_ids.sort();

                for class_id in class_ids {
                    let pending = match self.graph.get_mut(class_id) {
                        Some(entity) => std::mem::take(&mut entity.pending_bases),
                        None => continue,
                    };
                    if pending.is_empty() {
                        continue;
                    }
                    done = false;
                    for base in &pending {
                        let base_id = self.resolve_base(package_name, module_name, base)?;
                        self.graph.add_base(class_id, base_id);
                    }
                }
            }

            if done {
                break;
            }
        }
        info!(classes = self.graph.len(), "inheritance resolved");
        Ok(())
    }

    /// Resolve one pending base of a class owned by `module_name`.
    ///
    /// A qualified token is anchored through the owning module's import table
    /// and resolved as an absolute path; an unqualified token goes through
    /// the module's own resolution. An unparseable module behind the token
    /// degrades to a placeholder instead of aborting the pass.
    fn resolve_base(
        &mut self,
        package_name: &str,
        module_name: &str,
        base: &PendingBase,
    ) -> Result<ClassId> {
        let attempt = if base.qualified {
            let target = self.qualified_base_target(package_name, module_name, &base.name)?;
            match self.resolve_class(&target, &mut Vec::new()) {
                Err(ResolveError::MalformedSource { path, message }) => {
                    warn!(
                        %target,
                        path = %path.display(),
                        %message,
                        "base behind unparseable module, placeholder kept"
                    );
                    Ok(Some(self.intern_unknown(&target)))
                }
                other => other,
            }
        } else {
            match self.resolve_in_module(package_name, module_name, &base.name, &mut Vec::new()) {
                Err(ResolveError::MalformedSource { path, message }) => {
                    warn!(
                        base = %base.name,
                        path = %path.display(),
                        %message,
                        "base behind unparseable module, placeholder kept"
                    );
                    Ok(Some(self.intern_unknown(&base.name)))
                }
                other => other,
            }
        };
        self.finish_trial();
        Ok(match attempt? {
            Some(id) => id,
            None => self.intern_unknown(&base.name),
        })
    }

    /// Absolute target for a dotted base token.
    fn qualified_base_target(
        &self,
        package_name: &str,
        module_name: &str,
        token: &str,
    ) -> Result<String> {
        let ir = Rc::clone(&self.module(package_name, module_name)?.ir);
        Ok(match token.split_once('.') {
            Some((anchor, rest)) => match ir.find_import(anchor) {
                Some(binding) => format!("{}.{rest}", binding.target),
                None => token.to_string(),
            },
            None => token.to_string(),
        })
    }

    /// Route a fully dotted name to its owning package.
    ///
    /// Names whose first segment matches no registered package are external:
    /// the outermost call mints a deduplicated placeholder, a recursive call
    /// reports no result so the caller can try its next candidate.
    fn resolve_class(
        &mut self,
        long_name: &str,
        visited: &mut Vec<String>,
    ) -> Result<Option<ClassId>> {
        let root = long_name.split('.').next().unwrap_or(long_name);
        if !self.packages.contains_key(root) {
            if !visited.is_empty() {
                return Ok(None);
            }
            return Ok(Some(self.intern_unknown(long_name)));
        }

        let class_path = {
            let package = self
                .packages
                .get(root)
                .ok_or_else(|| ResolveError::unknown_package(root))?;
            package.class_path(long_name)?
        };
        match class_path {
            ClassPath::Stub => Ok(Some(self.intern_unknown(long_name))),
            ClassPath::Module { module, class_path } => {
                self.resolve_in_module(root, &module, &class_path, visited)
            }
        }
    }

    /// Resolve `name` inside one module.
    ///
    /// Steps, first hit wins: cycle guard, caches, built-ins, own class
    /// definitions, direct imports (guarded against re-export cycles),
    /// wildcard imports. An outermost call that exhausts all steps
    /// synthesizes a module-qualified placeholder; a recursive call records
    /// the miss and reports no result.
    fn resolve_in_module(
        &mut self,
        package_name: &str,
        module_name: &str,
        name: &str,
        visited: &mut Vec<String>,
    ) -> Result<Option<ClassId>> {
        self.ensure_module(package_name, module_name)?;

        let (module_long, ir) = {
            let module = self.module(package_name, module_name)?;
            (module.long_name.clone(), Rc::clone(&module.ir))
        };

        if visited.iter().any(|seen| seen == &module_long) {
            return Ok(None);
        }
        let is_outermost = visited.is_empty();

        {
            let module = self.module(package_name, module_name)?;
            if let Some(id) = module.cached(name) {
                return Ok(Some(id));
            }
            if !is_outermost && module.not_found_trial.contains(name) {
                return Ok(None);
            }
        }

        if PYTHON_PROTECTED_CLASSES.contains(&name) {
            return Ok(Some(self.intern_unknown(name)));
        }

        if let Some(position) = ir.class_position(name) {
            return self.materialize(package_name, module_name, position).map(Some);
        }

        if let Some(binding) = ir.find_import(name) {
            // Mutual re-exports would chase each other's bindings forever;
            // the second visit of a binding degrades to a placeholder.
            let key = (module_long.clone(), name.to_string());
            if !self.in_flight.insert(key.clone()) {
                warn!(module = %module_long, name, "re-export cycle, placeholder kept");
                let id = self.intern_unknown(&binding.target);
                self.module_mut(package_name, module_name)?
                    .import_class_map
                    .insert(name.to_string(), id);
                return Ok(Some(id));
            }
            let resolved = self.resolve_class(&binding.target, &mut Vec::new());
            self.in_flight.remove(&key);
            let id = match resolved? {
                Some(id) => id,
                None => self.intern_unknown(&binding.target),
            };
            self.module_mut(package_name, module_name)?
                .import_class_map
                .insert(name.to_string(), id);
            return Ok(Some(id));
        }

        if !ir.star_imports.is_empty() {
            visited.push(module_long.clone());
            for star in &ir.star_imports {
                let target = format!("{star}.{name}");
                if let Some(id) = self.resolve_class(&target, visited)? {
                    self.module_mut(package_name, module_name)?
                        .import_class_map
                        .insert(name.to_string(), id);
                    return Ok(Some(id));
                }
            }
        }

        if is_outermost {
            let id = self.intern_module_placeholder(name, &module_long);
            self.module_mut(package_name, module_name)?
                .not_found
                .insert(name.to_string(), id);
            warn!(module = %module_long, name, "unresolved symbol, placeholder kept");
            return Ok(Some(id));
        }

        self.module_mut(package_name, module_name)?
            .not_found_trial
            .insert(name.to_string());
        self.trial_dirty = true;
        Ok(None)
    }

    /// Turn the extracted class at `position` into an arena entity.
    ///
    /// The class registers in the module's own cache before its bases
    /// resolve, so mutual and forward references find it mid-flight.
    fn materialize(
        &mut self,
        package_name: &str,
        module_name: &str,
        position: usize,
    ) -> Result<ClassId> {
        let (module_long, ir) = {
            let module = self.module(package_name, module_name)?;
            (module.long_name.clone(), Rc::clone(&module.ir))
        };
        let raw = &ir.classes[position];

        if let Some(&id) = self.module(package_name, module_name)?.classes.get(&raw.name) {
            return Ok(id);
        }

        let entity = ClassEntity::new(raw.name.clone(), module_long)
            .with_pending_bases(raw.pending_bases.clone())
            .with_methods(raw.methods.clone())
            .with_attrs(raw.attrs.clone(), raw.cls_attrs.clone());
        let id = self.graph.add_class(entity);
        self.module_mut(package_name, module_name)?
            .classes
            .insert(raw.name.clone(), id);
        debug!(class = %self.graph[id].long_name, "class materialized");
        Ok(id)
    }

    /// Materialize every class of a module, returning the top-level ones.
    fn expand_module(&mut self, package_name: &str, module_name: &str) -> Result<Vec<ClassId>> {
        self.ensure_module(package_name, module_name)?;
        let ir = Rc::clone(&self.module(package_name, module_name)?.ir);

        let mut top_level = Vec::new();
        for (position, raw) in ir.classes.iter().enumerate() {
            let id = self.materialize(package_name, module_name, position)?;
            if raw.is_top_level {
                top_level.push(id);
            }
        }
        Ok(top_level)
    }

    /// Parse the module on first reference.
    fn ensure_module(&mut self, package_name: &str, module_name: &str) -> Result<()> {
        let package = self
            .packages
            .get_mut(package_name)
            .ok_or_else(|| ResolveError::unknown_package(package_name))?;
        if package.modules.contains_key(module_name) {
            return Ok(());
        }
        let file = package
            .layout
            .modules
            .get(module_name)
            .ok_or_else(|| ResolveError::unresolvable_dotted_name(module_name, package_name))?
            .clone();
        let module = Module::load(module_name, &file, &self.flags)?;
        package.modules.insert(module_name.to_string(), module);
        Ok(())
    }

    fn module(&self, package_name: &str, module_name: &str) -> Result<&Module> {
        self.packages
            .get(package_name)
            .ok_or_else(|| ResolveError::unknown_package(package_name))?
            .modules
            .get(module_name)
            .ok_or_else(|| ResolveError::unresolvable_dotted_name(module_name, package_name))
    }

    fn module_mut(&mut self, package_name: &str, module_name: &str) -> Result<&mut Module> {
        self.packages
            .get_mut(package_name)
            .ok_or_else(|| ResolveError::unknown_package(package_name))?
            .modules
            .get_mut(module_name)
            .ok_or_else(|| ResolveError::unresolvable_dotted_name(module_name, package_name))
    }

    /// Placeholder for a name with no owning module, deduplicated by name.
    fn intern_unknown(&mut self, long_name: &str) -> ClassId {
        if let Some(&id) = self.unknown.get(long_name) {
            return id;
        }
        let id = self.graph.add_class(ClassEntity::placeholder(long_name));
        self.unknown.insert(long_name.to_string(), id);
        id
    }

    /// Module-qualified placeholder, deduplicated by long name.
    fn intern_module_placeholder(&mut self, name: &str, module_long: &str) -> ClassId {
        let long_name = format!("{module_long}.{name}");
        if let Some(&id) = self.unknown.get(&long_name) {
            return id;
        }
        let id = self
            .graph
            .add_class(ClassEntity::module_placeholder(name, module_long));
        self.unknown.insert(long_name, id);
        id
    }

    /// Drop in-progress miss records once an outermost resolution completes.
    fn finish_trial(&mut self) {
        if !self.trial_dirty {
            return;
        }
        for package in self.packages.values_mut() {
            for module in package.modules.values_mut() {
                module.not_found_trial.clear();
            }
        }
        self.trial_dirty = false;
    }
}
