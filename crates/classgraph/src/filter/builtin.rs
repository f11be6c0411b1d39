//! Builtin filters over a working set of class ids.
//!
//! Closure-based keepers walk the full graph (edges through hidden classes
//! still connect their neighbors) and intersect the result with the working
//! set at the end.

use std::collections::HashSet;

use serde::Deserialize;

use crate::graph::{ClassGraph, ClassId, NameAttr};

use super::ClassFilter;

fn default_long_name() -> NameAttr {
    NameAttr::LongName
}

fn default_name() -> NameAttr {
    NameAttr::Name
}

fn default_ignore() -> Vec<String> {
    vec!["abc.ABC".to_string(), "abc.ABCMeta".to_string()]
}

/// Members of the working set whose selected attribute matches one of `names`.
fn matching_ids(
    graph: &ClassGraph,
    classes: &HashSet<ClassId>,
    names: &HashSet<String>,
    attr: NameAttr,
) -> HashSet<ClassId> {
    classes
        .iter()
        .copied()
        .filter(|&id| {
            graph
                .get(id)
                .is_some_and(|entity| names.contains(attr.select(entity)))
        })
        .collect()
}

/// Members of the working set whose long name appears in `ignore`.
fn ignored_ids(
    graph: &ClassGraph,
    classes: &HashSet<ClassId>,
    ignore: &[String],
) -> HashSet<ClassId> {
    classes
        .iter()
        .copied()
        .filter(|&id| {
            graph
                .get(id)
                .is_some_and(|entity| ignore.iter().any(|name| *name == entity.long_name))
        })
        .collect()
}

fn sorted_snapshot(classes: &HashSet<ClassId>) -> Vec<ClassId> {
    let mut ids: Vec<ClassId> = classes.iter().copied().collect();
    ids.sort();
    ids
}

/// Removes every class whose long name lives under one of the given root packages.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageRemover {
    /// Root package names to drop.
    pub names: HashSet<String>,
}

impl PackageRemover {
    /// Drop all classes rooted at any of `names`.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClassFilter for PackageRemover {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        classes.retain(|&id| {
            graph
                .get(id)
                .is_some_and(|entity| !self.names.contains(entity.root_package()))
        });
    }
}

/// Removes classes whose selected attribute matches one of the names exactly.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByNameRemover {
    /// Names to drop.
    pub names: HashSet<String>,
    /// Attribute the names are matched against.
    #[serde(default = "default_long_name")]
    pub attr: NameAttr,
}

impl ByNameRemover {
    /// Drop classes whose long name matches any of `names`.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            attr: default_long_name(),
        }
    }

    /// Match against a different entity attribute.
    pub fn with_attr(mut self, attr: NameAttr) -> Self {
        self.attr = attr;
        self
    }
}

impl ClassFilter for ByNameRemover {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        classes.retain(|&id| {
            graph
                .get(id)
                .is_some_and(|entity| !self.names.contains(self.attr.select(entity)))
        });
    }
}

/// Removes classes whose selected attribute contains any of the substrings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByPartialNameRemover {
    /// Substrings that mark a class for removal.
    pub names: Vec<String>,
    /// Attribute the substrings are matched against.
    #[serde(default = "default_long_name")]
    pub attr: NameAttr,
}

impl ByPartialNameRemover {
    /// Drop classes whose long name contains any of `names`.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            attr: default_long_name(),
        }
    }

    /// Match against a different entity attribute.
    pub fn with_attr(mut self, attr: NameAttr) -> Self {
        self.attr = attr;
        self
    }
}

impl ClassFilter for ByPartialNameRemover {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        classes.retain(|&id| {
            graph.get(id).is_some_and(|entity| {
                let selected = self.attr.select(entity);
                !self.names.iter().any(|name| selected.contains(name.as_str()))
            })
        });
    }
}

/// Keeps only classes whose selected attribute contains every substring.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByPartialNameKeeper {
    /// Substrings that must all be present for a class to survive.
    pub names: Vec<String>,
    /// Attribute the substrings are matched against.
    #[serde(default = "default_long_name")]
    pub attr: NameAttr,
}

impl ByPartialNameKeeper {
    /// Keep only classes whose long name contains every one of `names`.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            attr: default_long_name(),
        }
    }

    /// Match against a different entity attribute.
    pub fn with_attr(mut self, attr: NameAttr) -> Self {
        self.attr = attr;
        self
    }
}

impl ClassFilter for ByPartialNameKeeper {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        classes.retain(|&id| {
            graph.get(id).is_some_and(|entity| {
                let selected = self.attr.select(entity);
                self.names.iter().all(|name| selected.contains(name.as_str()))
            })
        });
    }
}

/// Removes classes that declare children when none of them remain in the set.
///
/// Classes with no children at all are never removed. The pass walks ids in
/// ascending order against the live set, so removals can cascade within a
/// single application.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoneParentsRemover {}

impl LoneParentsRemover {
    /// Create the filter.
    pub fn new() -> Self {
        Self {}
    }
}

impl ClassFilter for LoneParentsRemover {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        for id in sorted_snapshot(classes) {
            let Some(entity) = graph.get(id) else {
                continue;
            };
            if !entity.children.is_empty()
                && entity.children.iter().all(|child| !classes.contains(child))
            {
                classes.remove(&id);
            }
        }
    }
}

/// Keeps only classes connected to one of the seed classes.
///
/// Connectivity is the undirected closure over bases and children edges,
/// starting from every seed. Classes matching `ignore` block traversal, so
/// hierarchies joined only through e.g. `abc.ABC` stay separate.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectedKeeper {
    /// Seed class names.
    pub names: HashSet<String>,
    /// Attribute the seed names are matched against.
    #[serde(default = "default_name")]
    pub attr: NameAttr,
    /// Long names excluded from traversal.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl ConnectedKeeper {
    /// Keep only classes connected to the given seed names.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            attr: default_name(),
            ignore: default_ignore(),
        }
    }

    /// Match seeds against a different entity attribute.
    pub fn with_attr(mut self, attr: NameAttr) -> Self {
        self.attr = attr;
        self
    }

    /// Replace the long names excluded from traversal.
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }
}

impl ClassFilter for ConnectedKeeper {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        let seeds = matching_ids(graph, classes, &self.names, self.attr);
        let ignore = ignored_ids(graph, classes, &self.ignore);

        let mut related = seeds.clone();
        let mut stack = sorted_snapshot(&seeds);
        while let Some(id) = stack.pop() {
            let Some(entity) = graph.get(id) else {
                continue;
            };
            for &next in entity.bases.iter().chain(entity.children.iter()) {
                if ignore.contains(&next) {
                    continue;
                }
                if related.insert(next) {
                    stack.push(next);
                }
            }
        }

        classes.retain(|id| related.contains(id));
    }
}

/// Keeps only classes related to one of the seed classes.
///
/// Related means: the seeds, their descendants at any depth, and the
/// ancestors of any of those. Descendants of ancestors (cousins) are not
/// related, which distinguishes this from [`ConnectedKeeper`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelatedKeeper {
    /// Seed class names.
    pub names: HashSet<String>,
    /// Attribute the seed names are matched against.
    #[serde(default = "default_name")]
    pub attr: NameAttr,
    /// Long names excluded from traversal.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl RelatedKeeper {
    /// Keep only classes related to the given seed names.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            attr: default_name(),
            ignore: default_ignore(),
        }
    }

    /// Match seeds against a different entity attribute.
    pub fn with_attr(mut self, attr: NameAttr) -> Self {
        self.attr = attr;
        self
    }

    /// Replace the long names excluded from traversal.
    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }
}

impl ClassFilter for RelatedKeeper {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        let seeds = matching_ids(graph, classes, &self.names, self.attr);
        let ignore = ignored_ids(graph, classes, &self.ignore);

        // Descendants closure, children edges only.
        let mut related = seeds.clone();
        let mut stack = sorted_snapshot(&seeds);
        while let Some(id) = stack.pop() {
            let Some(entity) = graph.get(id) else {
                continue;
            };
            for &child in &entity.children {
                if ignore.contains(&child) {
                    continue;
                }
                if related.insert(child) {
                    stack.push(child);
                }
            }
        }

        // Ancestors closure from seeds and descendants, bases edges only.
        let mut stack = sorted_snapshot(&related);
        while let Some(id) = stack.pop() {
            let Some(entity) = graph.get(id) else {
                continue;
            };
            for &base in &entity.bases {
                if ignore.contains(&base) {
                    continue;
                }
                if related.insert(base) {
                    stack.push(base);
                }
            }
        }

        classes.retain(|id| related.contains(id));
    }
}

/// Keeps only classes the graph reports as abstract.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbstractKeeper {}

impl AbstractKeeper {
    /// Create the filter.
    pub fn new() -> Self {
        Self {}
    }
}

impl ClassFilter for AbstractKeeper {
    fn apply(&self, graph: &ClassGraph, classes: &mut HashSet<ClassId>) {
        classes.retain(|&id| graph.is_abstract(id));
    }
}
