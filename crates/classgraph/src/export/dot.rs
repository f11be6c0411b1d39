//! Graphviz DOT rendering of a filtered class set.

use std::collections::HashSet;

use crate::export::RecordOptions;
use crate::graph::{ClassEntity, ClassGraph, ClassId};

/// Render `classes` from `graph` as a Graphviz digraph.
///
/// Nodes are emitted sorted by display name so output diffs cleanly.
/// Inheritance edges run from base to subclass with the hollow arrow drawn
/// at the base end, following UML convention. Edges are only emitted when
/// both endpoints are part of `classes`.
pub fn export_dot(
    graph: &ClassGraph,
    classes: &HashSet<ClassId>,
    options: &RecordOptions,
) -> String {
    let mut nodes: Vec<(ClassId, &ClassEntity)> = classes
        .iter()
        .filter_map(|&id| graph.get(id).map(|entity| (id, entity)))
        .collect();
    nodes.sort_by(|(_, a), (_, b)| {
        (a.name.as_str(), a.long_name.as_str()).cmp(&(b.name.as_str(), b.long_name.as_str()))
    });

    let mut dot = String::from("digraph classes {\n");

    for (id, entity) in &nodes {
        let label = options.node_label(graph, *id);
        let style = options.style_for(graph, *id);
        dot.push_str(&format!(
            "  \"{}\" [label=\"{}\", shape={}, color={}];\n",
            entity.dot_id(),
            label,
            style.shape,
            style.color
        ));
    }

    dot.push('\n');

    for (_, entity) in &nodes {
        for &base in &entity.bases {
            if !classes.contains(&base) {
                continue;
            }
            let Some(base_entity) = graph.get(base) else {
                continue;
            };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [dir=back, arrowtail=empty];\n",
                base_entity.dot_id(),
                entity.dot_id()
            ));
        }
    }

    dot.push_str("}\n");
    dot
}
