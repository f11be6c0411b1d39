//! Core graph types: class entities, methods, and pending base references.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a class entity (index into the graph arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// Position of the entity in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Which entity attribute a name-based operation matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameAttr {
    /// The class name as qualified within its module ("Outer.Inner").
    Name,
    /// The fully dotted name ("pkg.mod.Outer.Inner").
    LongName,
}

impl NameAttr {
    /// Select the matching attribute from an entity.
    pub fn select<'a>(&self, entity: &'a ClassEntity) -> &'a str {
        match self {
            NameAttr::Name => &entity.name,
            NameAttr::LongName => &entity.long_name,
        }
    }
}

/// A method discovered directly on a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntity {
    /// Method name qualified by its owning class ("Circle.area").
    pub name: String,
    /// Decorator names applied to the definition, dotted where written so.
    pub decorators: Vec<String>,
}

impl MethodEntity {
    /// Create a method with no decorators.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
        }
    }

    /// Attach the decorator names captured at extraction time.
    pub fn with_decorators(mut self, decorators: Vec<String>) -> Self {
        self.decorators = decorators;
        self
    }

    /// True when decorated with `property`.
    pub fn is_property(&self) -> bool {
        self.decorators.iter().any(|d| d == "property")
    }

    /// True when decorated with `classmethod`.
    pub fn is_classmethod(&self) -> bool {
        self.decorators.iter().any(|d| d == "classmethod")
    }

    /// True when decorated with `abstractmethod` or `abc.abstractmethod`.
    pub fn is_abstractmethod(&self) -> bool {
        self.decorators
            .iter()
            .any(|d| d == "abstractmethod" || d == "abc.abstractmethod")
    }

    /// True when this is the setter half of a property pair.
    pub fn is_setter(&self) -> bool {
        let marker = format!("{}.setter", self.short_name());
        self.decorators.iter().any(|d| *d == marker)
    }

    /// Last segment of the method name, as written in the source.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A base-class reference captured at extraction time, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBase {
    /// Base name as written: a bare identifier or a dotted path.
    pub name: String,
    /// True when the reference was written as a dotted attribute path.
    pub qualified: bool,
}

impl PendingBase {
    /// Create a pending base reference.
    pub fn new(name: impl Into<String>, qualified: bool) -> Self {
        Self {
            name: name.into(),
            qualified,
        }
    }
}

/// A class in the hierarchy graph.
///
/// Entities are either discovered from source (`found == true`) or synthesized
/// as placeholders standing in for names that never resolved (`found == false`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntity {
    /// Class name, qualified with enclosing class names ("Outer.Inner").
    pub name: String,
    /// Fully dotted name, unique across the graph.
    pub long_name: String,
    /// Long name of the defining module, when known.
    pub module: Option<String>,
    /// False for placeholder entities.
    pub found: bool,
    /// Resolved base classes, in declaration order.
    pub bases: Vec<ClassId>,
    /// Classes that declare this one as a base.
    pub children: Vec<ClassId>,
    /// Base references not yet resolved to entities.
    pub pending_bases: Vec<PendingBase>,
    /// Methods defined directly in the class body.
    pub methods: Vec<MethodEntity>,
    /// Instance attributes assigned through the receiver parameter.
    pub attrs: BTreeSet<String>,
    /// Class-level attributes assigned in the class body.
    pub cls_attrs: BTreeSet<String>,
}

impl ClassEntity {
    /// Create a class discovered in `module`.
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        let name = name.into();
        let module = module.into();
        let long_name = format!("{module}.{name}");
        Self {
            name,
            long_name,
            module: Some(module),
            found: true,
            bases: Vec::new(),
            children: Vec::new(),
            pending_bases: Vec::new(),
            methods: Vec::new(),
            attrs: BTreeSet::new(),
            cls_attrs: BTreeSet::new(),
        }
    }

    /// Create a placeholder for a name with no known owning module.
    ///
    /// The bare dotted name doubles as both `name` and `long_name`.
    pub fn placeholder(long_name: impl Into<String>) -> Self {
        let long_name = long_name.into();
        Self {
            name: long_name.clone(),
            long_name,
            module: None,
            found: false,
            bases: Vec::new(),
            children: Vec::new(),
            pending_bases: Vec::new(),
            methods: Vec::new(),
            attrs: BTreeSet::new(),
            cls_attrs: BTreeSet::new(),
        }
    }

    /// Create a placeholder owned by `module`, so its long name is module-qualified.
    pub fn module_placeholder(name: impl Into<String>, module: impl Into<String>) -> Self {
        let name = name.into();
        let module = module.into();
        let long_name = format!("{module}.{name}");
        Self {
            name,
            long_name,
            module: Some(module),
            found: false,
            bases: Vec::new(),
            children: Vec::new(),
            pending_bases: Vec::new(),
            methods: Vec::new(),
            attrs: BTreeSet::new(),
            cls_attrs: BTreeSet::new(),
        }
    }

    /// Attach pending bases captured at extraction time.
    pub fn with_pending_bases(mut self, pending: Vec<PendingBase>) -> Self {
        self.pending_bases = pending;
        self
    }

    /// Attach the methods captured at extraction time.
    pub fn with_methods(mut self, methods: Vec<MethodEntity>) -> Self {
        self.methods = methods;
        self
    }

    /// Attach instance and class-level attributes captured at extraction time.
    pub fn with_attrs(mut self, attrs: BTreeSet<String>, cls_attrs: BTreeSet<String>) -> Self {
        self.attrs = attrs;
        self.cls_attrs = cls_attrs;
        self
    }

    /// Last segment of the class name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// First segment of the long name.
    pub fn root_package(&self) -> &str {
        self.long_name.split('.').next().unwrap_or(&self.long_name)
    }

    /// Identifier safe for DOT output, derived from the long name.
    pub fn dot_id(&self) -> String {
        self.long_name.replace(['.', '-'], "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_long_name() {
        let entity = ClassEntity::new("Circle", "shapes.round");
        assert_eq!(entity.long_name, "shapes.round.Circle");
        assert_eq!(entity.module.as_deref(), Some("shapes.round"));
        assert!(entity.found);
    }

    #[test]
    fn test_short_name_of_nested_class() {
        let entity = ClassEntity::new("Outer.Inner", "pkg.mod");
        assert_eq!(entity.short_name(), "Inner");
        assert_eq!(entity.long_name, "pkg.mod.Outer.Inner");
    }

    #[test]
    fn test_placeholder_uses_bare_name() {
        let entity = ClassEntity::placeholder("numpy.ndarray");
        assert_eq!(entity.name, "numpy.ndarray");
        assert_eq!(entity.long_name, "numpy.ndarray");
        assert!(entity.module.is_none());
        assert!(!entity.found);
    }

    #[test]
    fn test_module_placeholder_is_qualified() {
        let entity = ClassEntity::module_placeholder("Missing", "pkg.mod");
        assert_eq!(entity.name, "Missing");
        assert_eq!(entity.long_name, "pkg.mod.Missing");
        assert!(!entity.found);
    }

    #[test]
    fn test_dot_id_replaces_separators() {
        let entity = ClassEntity::new("A", "my-pkg.mod");
        assert_eq!(entity.dot_id(), "my_pkg_mod_A");
    }

    #[test]
    fn test_root_package() {
        let entity = ClassEntity::new("A", "pkg.sub.mod");
        assert_eq!(entity.root_package(), "pkg");
    }

    #[test]
    fn test_method_flags() {
        let prop = MethodEntity::new("Circle.area").with_decorators(vec!["property".to_string()]);
        assert!(prop.is_property());
        assert!(!prop.is_classmethod());

        let ctor = MethodEntity::new("Circle.from_radius")
            .with_decorators(vec!["classmethod".to_string()]);
        assert!(ctor.is_classmethod());

        let abstract_short = MethodEntity::new("Shape.draw")
            .with_decorators(vec!["abstractmethod".to_string()]);
        let abstract_dotted = MethodEntity::new("Shape.draw")
            .with_decorators(vec!["abc.abstractmethod".to_string()]);
        assert!(abstract_short.is_abstractmethod());
        assert!(abstract_dotted.is_abstractmethod());
    }

    #[test]
    fn test_setter_matches_own_name_only() {
        // Decorators carry the bare name, so the marker strips the class.
        let setter = MethodEntity::new("Circle.radius")
            .with_decorators(vec!["radius.setter".to_string()]);
        assert!(setter.is_setter());

        let other = MethodEntity::new("Circle.diameter")
            .with_decorators(vec!["radius.setter".to_string()]);
        assert!(!other.is_setter());
    }

    #[test]
    fn test_method_short_name() {
        assert_eq!(MethodEntity::new("Circle.area").short_name(), "area");
        assert_eq!(MethodEntity::new("Outer.Inner.run").short_name(), "run");
    }

    #[test]
    fn test_name_attr_select() {
        let entity = ClassEntity::new("A", "pkg.mod");
        assert_eq!(NameAttr::Name.select(&entity), "A");
        assert_eq!(NameAttr::LongName.select(&entity), "pkg.mod.A");
    }
}
