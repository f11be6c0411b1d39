//! Arena storage for class entities and hierarchy queries.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use super::types::{ClassEntity, ClassId, MethodEntity};

/// Default dotted prefix that marks a base class as abstract.
pub const DEFAULT_ABSTRACT_MARKER: &str = "abc";

/// Arena-backed storage for every class entity discovered or synthesized.
///
/// Ids are handed out sequentially and never invalidated. Filtering drops ids
/// from working sets instead of deleting entities, so hierarchy edges stay
/// walkable even through classes a filter has hidden.
#[derive(Debug, Clone)]
pub struct ClassGraph {
    entities: Vec<ClassEntity>,
    abstract_marker: String,
}

impl ClassGraph {
    /// Create an empty graph with the default abstract marker.
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            abstract_marker: DEFAULT_ABSTRACT_MARKER.to_string(),
        }
    }

    /// Create an empty graph with a custom abstract marker prefix.
    pub fn with_abstract_marker(marker: impl Into<String>) -> Self {
        Self {
            entities: Vec::new(),
            abstract_marker: marker.into(),
        }
    }

    /// Replace the abstract marker prefix.
    pub fn set_abstract_marker(&mut self, marker: impl Into<String>) {
        self.abstract_marker = marker.into();
    }

    /// Dotted prefix marking a base class as abstract.
    pub fn abstract_marker(&self) -> &str {
        &self.abstract_marker
    }

    /// Store an entity and return its id.
    pub fn add_class(&mut self, entity: ClassEntity) -> ClassId {
        let id = ClassId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entity has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity for `id`, if the id belongs to this graph.
    pub fn get(&self, id: ClassId) -> Option<&ClassEntity> {
        self.entities.get(id.index())
    }

    /// Mutable entity for `id`, if the id belongs to this graph.
    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ClassEntity> {
        self.entities.get_mut(id.index())
    }

    /// Iterate over all entities with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassEntity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, entity)| (ClassId(i as u32), entity))
    }

    /// Iterate over all ids.
    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.entities.len() as u32).map(ClassId)
    }

    /// Linear scan for an entity by its fully dotted name.
    pub fn find_by_long_name(&self, long_name: &str) -> Option<ClassId> {
        self.iter()
            .find(|(_, entity)| entity.long_name == long_name)
            .map(|(id, _)| id)
    }

    /// Link `base` as a resolved base of `class`.
    ///
    /// Registers the edge on both endpoints: `class.bases` gains `base` and
    /// `base.children` gains `class`.
    pub fn add_base(&mut self, class: ClassId, base: ClassId) {
        if let Some(entity) = self.get_mut(class) {
            entity.bases.push(base);
        }
        if let Some(entity) = self.get_mut(base) {
            entity.children.push(class);
        }
    }

    /// True when any resolved base lives under the abstract marker prefix.
    pub fn is_abstract(&self, id: ClassId) -> bool {
        let Some(entity) = self.get(id) else {
            return false;
        };
        let prefix = format!("{}.", self.abstract_marker);
        entity
            .bases
            .iter()
            .filter_map(|&base| self.get(base))
            .any(|base| base.long_name.starts_with(&prefix))
    }

    /// Instance attributes inherited through the resolved base closure.
    ///
    /// The walk is cycle-guarded; placeholder bases contribute nothing but do
    /// not stop the traversal.
    pub fn inherited_attrs(&self, id: ClassId) -> BTreeSet<String> {
        let mut acc = BTreeSet::new();
        self.walk_bases(id, |entity| {
            acc.extend(entity.attrs.iter().cloned());
        });
        acc
    }

    /// Methods inherited through the resolved base closure.
    ///
    /// Duplicates across bases are kept; display layers deduplicate by name.
    pub fn inherited_methods(&self, id: ClassId) -> Vec<&MethodEntity> {
        let mut acc = Vec::new();
        self.walk_bases(id, |entity| {
            acc.extend(entity.methods.iter());
        });
        acc
    }

    fn walk_bases<'a>(&'a self, id: ClassId, mut visit: impl FnMut(&'a ClassEntity)) {
        let mut seen: HashSet<ClassId> = HashSet::new();
        seen.insert(id);
        let mut stack: Vec<ClassId> = match self.get(id) {
            Some(entity) => entity.bases.clone(),
            None => return,
        };
        while let Some(base) = stack.pop() {
            if !seen.insert(base) {
                continue;
            }
            if let Some(entity) = self.get(base) {
                visit(entity);
                stack.extend(entity.bases.iter().copied());
            }
        }
    }
}

impl Default for ClassGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<ClassId> for ClassGraph {
    type Output = ClassEntity;

    fn index(&self, id: ClassId) -> &ClassEntity {
        &self.entities[id.index()]
    }
}

impl IndexMut<ClassId> for ClassGraph {
    fn index_mut(&mut self, id: ClassId) -> &mut ClassEntity {
        &mut self.entities[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::MethodEntity;

    fn sample_graph() -> (ClassGraph, ClassId, ClassId, ClassId) {
        let mut graph = ClassGraph::new();
        let mut base = ClassEntity::new("Shape", "geo.base");
        base.attrs.insert("area".to_string());
        base.methods.push(MethodEntity::new("Shape.draw"));
        let base = graph.add_class(base);

        let mut mid = ClassEntity::new("Polygon", "geo.base");
        mid.attrs.insert("sides".to_string());
        let mid = graph.add_class(mid);

        let leaf = graph.add_class(ClassEntity::new("Square", "geo.shapes"));

        graph.add_base(mid, base);
        graph.add_base(leaf, mid);
        (graph, base, mid, leaf)
    }

    #[test]
    fn test_add_and_index() {
        let (graph, base, _, leaf) = sample_graph();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph[base].name, "Shape");
        assert_eq!(graph[leaf].long_name, "geo.shapes.Square");
    }

    #[test]
    fn test_add_base_registers_both_sides() {
        let (graph, base, mid, leaf) = sample_graph();
        assert_eq!(graph[mid].bases, vec![base]);
        assert_eq!(graph[base].children, vec![mid]);
        assert_eq!(graph[leaf].bases, vec![mid]);
        assert_eq!(graph[mid].children, vec![leaf]);
    }

    #[test]
    fn test_self_base_does_not_panic() {
        let mut graph = ClassGraph::new();
        let id = graph.add_class(ClassEntity::new("Weird", "pkg.mod"));
        graph.add_base(id, id);
        assert_eq!(graph[id].bases, vec![id]);
        assert_eq!(graph[id].children, vec![id]);
    }

    #[test]
    fn test_find_by_long_name() {
        let (graph, _, mid, _) = sample_graph();
        assert_eq!(graph.find_by_long_name("geo.base.Polygon"), Some(mid));
        assert_eq!(graph.find_by_long_name("geo.base.Missing"), None);
    }

    #[test]
    fn test_inherited_attrs_walks_whole_chain() {
        let (graph, _, _, leaf) = sample_graph();
        let inherited = graph.inherited_attrs(leaf);
        assert!(inherited.contains("area"));
        assert!(inherited.contains("sides"));
    }

    #[test]
    fn test_inherited_methods_walks_whole_chain() {
        let (graph, _, _, leaf) = sample_graph();
        let names: Vec<&str> = graph
            .inherited_methods(leaf)
            .iter()
            .map(|m| m.short_name())
            .collect();
        assert_eq!(names, vec!["draw"]);
    }

    #[test]
    fn test_inherited_attrs_survives_cycle() {
        let mut graph = ClassGraph::new();
        let mut a = ClassEntity::new("A", "pkg.mod");
        a.attrs.insert("x".to_string());
        let a = graph.add_class(a);
        let mut b = ClassEntity::new("B", "pkg.mod");
        b.attrs.insert("y".to_string());
        let b = graph.add_class(b);
        graph.add_base(a, b);
        graph.add_base(b, a);

        let inherited = graph.inherited_attrs(a);
        assert!(inherited.contains("y"));
        assert!(!inherited.contains("x"));
    }

    #[test]
    fn test_is_abstract_via_marker_prefix() {
        let mut graph = ClassGraph::new();
        let abc = graph.add_class(ClassEntity::placeholder("abc.ABC"));
        let concrete = graph.add_class(ClassEntity::new("Plain", "pkg.mod"));
        let abstract_ = graph.add_class(ClassEntity::new("Base", "pkg.mod"));
        graph.add_base(abstract_, abc);

        assert!(graph.is_abstract(abstract_));
        assert!(!graph.is_abstract(concrete));
    }

    #[test]
    fn test_is_abstract_honors_custom_marker() {
        let mut graph = ClassGraph::with_abstract_marker("interfaces");
        let marker = graph.add_class(ClassEntity::placeholder("interfaces.Protocol"));
        let abc = graph.add_class(ClassEntity::placeholder("abc.ABC"));
        let via_custom = graph.add_class(ClassEntity::new("A", "pkg.mod"));
        let via_abc = graph.add_class(ClassEntity::new("B", "pkg.mod"));
        graph.add_base(via_custom, marker);
        graph.add_base(via_abc, abc);

        assert!(graph.is_abstract(via_custom));
        assert!(!graph.is_abstract(via_abc));
    }
}
