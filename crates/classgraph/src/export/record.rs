//! Record-label construction for class nodes.
//!
//! Labels follow the Graphviz record syntax: `{Name|attrs|methods}` with
//! `\l` left-justified line breaks inside each block. Own members carry a
//! `+` prefix, inherited ones a `-` prefix.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::{ClassGraph, ClassId, NameAttr};

/// Shape and outline color for one node category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// Graphviz shape name.
    pub shape: String,
    /// Outline color.
    pub color: String,
}

impl NodeStyle {
    /// Create a style from a shape and color pair.
    pub fn new(shape: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            color: color.into(),
        }
    }
}

/// Node styles for the three class categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSet {
    /// Concrete discovered classes.
    pub normal: NodeStyle,
    /// Discovered classes with an abstract base.
    #[serde(rename = "abstract")]
    pub abstract_: NodeStyle,
    /// Placeholder classes.
    pub not_found: NodeStyle,
}

impl Default for StyleSet {
    fn default() -> Self {
        Self {
            normal: NodeStyle::new("record", "black"),
            abstract_: NodeStyle::new("record", "blue"),
            not_found: NodeStyle::new("oval", "red"),
        }
    }
}

/// Options controlling node labels and styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    /// Which name is displayed in the node header.
    pub display: NameAttr,
    /// Include the attributes block.
    pub show_attrs: bool,
    /// Lead the attributes block with class-level attributes.
    pub show_cls_attrs: bool,
    /// Include the methods block.
    pub show_methods: bool,
    /// Split properties out of the methods block.
    pub separate_props: bool,
    /// Keep names with a leading underscore.
    pub keep_private: bool,
    /// Node styles by category.
    pub styles: StyleSet,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            display: NameAttr::Name,
            show_attrs: true,
            show_cls_attrs: false,
            show_methods: true,
            separate_props: false,
            keep_private: true,
            styles: StyleSet::default(),
        }
    }
}

impl RecordOptions {
    /// Style for `id` given its resolution state.
    pub fn style_for(&self, graph: &ClassGraph, id: ClassId) -> &NodeStyle {
        match graph.get(id) {
            Some(entity) if !entity.found => &self.styles.not_found,
            Some(_) if graph.is_abstract(id) => &self.styles.abstract_,
            _ => &self.styles.normal,
        }
    }

    /// Node label for `id`.
    ///
    /// Discovered classes get a record label; placeholders get their display
    /// name only.
    pub fn node_label(&self, graph: &ClassGraph, id: ClassId) -> String {
        let Some(entity) = graph.get(id) else {
            return String::new();
        };
        if !entity.found {
            return escape_record_text(self.display.select(entity));
        }

        let mut label = String::from("{");
        label.push_str(&escape_record_text(self.display.select(entity)));
        if self.show_attrs {
            label.push('|');
            label.push_str(&self.attrs_block(graph, id));
        }
        if self.show_methods {
            label.push('|');
            label.push_str(&self.methods_block(graph, id));
        }
        label.push('}');
        label
    }

    fn attrs_block(&self, graph: &ClassGraph, id: ClassId) -> String {
        let Some(entity) = graph.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        if self.show_cls_attrs {
            out.push_str(&block_str(&entity.cls_attrs, "+", self.keep_private));
            out.push('|');
        }
        let inherited: BTreeSet<String> = graph
            .inherited_attrs(id)
            .into_iter()
            .filter(|attr| !entity.attrs.contains(attr))
            .collect();
        out.push_str(&block_str(&entity.attrs, "+", self.keep_private));
        out.push_str(&block_str(&inherited, "-", self.keep_private));
        out
    }

    fn methods_block(&self, graph: &ClassGraph, id: ClassId) -> String {
        let Some(entity) = graph.get(id) else {
            return String::new();
        };
        let inherited = graph.inherited_methods(id);
        let mut out = String::new();

        if self.separate_props {
            let props: BTreeSet<String> = entity
                .methods
                .iter()
                .filter(|m| m.is_property())
                .map(|m| m.short_name().to_string())
                .collect();
            let base_props: BTreeSet<String> = inherited
                .iter()
                .filter(|m| m.is_property())
                .map(|m| m.short_name().to_string())
                .filter(|name| !props.contains(name))
                .collect();
            out.push_str(&block_str(&props, "+", self.keep_private));
            out.push_str(&block_str(&base_props, "-", self.keep_private));
            out.push('|');
        }

        let own: BTreeSet<String> = entity
            .methods
            .iter()
            .filter(|m| !self.separate_props || !m.is_property())
            .map(|m| format!("{}()", m.short_name()))
            .collect();
        let base: BTreeSet<String> = inherited
            .iter()
            .filter(|m| !self.separate_props || !m.is_property())
            .map(|m| format!("{}()", m.short_name()))
            .filter(|name| !own.contains(name))
            .collect();
        out.push_str(&block_str(&own, "+", self.keep_private));
        out.push_str(&block_str(&base, "-", self.keep_private));
        out
    }
}

/// One record block: each item on its own left-justified line behind `symbol`.
fn block_str(items: &BTreeSet<String>, symbol: &str, keep_private: bool) -> String {
    let kept: Vec<String> = items
        .iter()
        .filter(|item| keep_private || !item.starts_with('_'))
        .map(|item| escape_record_text(item))
        .collect();
    if kept.is_empty() {
        return String::new();
    }
    format!("{symbol}{}\\l", kept.join(&format!("\\l{symbol}")))
}

/// Escape characters with structural meaning in record labels.
fn escape_record_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' | '{' | '}' | '|' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClassEntity, MethodEntity};

    fn graph_with_pair() -> (ClassGraph, ClassId, ClassId) {
        let mut graph = ClassGraph::new();
        let mut base = ClassEntity::new("Shape", "geo.base");
        base.attrs.insert("area".to_string());
        base.methods.push(MethodEntity::new("Shape.draw"));
        let base = graph.add_class(base);

        let mut child = ClassEntity::new("Circle", "geo.round");
        child.attrs.insert("radius".to_string());
        child.methods.push(MethodEntity::new("Circle.draw"));
        child.methods.push(MethodEntity::new("Circle.scale"));
        let child = graph.add_class(child);
        graph.add_base(child, base);
        (graph, base, child)
    }

    #[test]
    fn test_label_with_own_members_only() {
        let (graph, base, _) = graph_with_pair();
        let options = RecordOptions::default();
        assert_eq!(
            options.node_label(&graph, base),
            "{Shape|+area\\l|+draw()\\l}"
        );
    }

    #[test]
    fn test_label_marks_inherited_members() {
        let (graph, _, child) = graph_with_pair();
        let options = RecordOptions::default();
        // draw() is shadowed, so it stays in the own block only.
        assert_eq!(
            options.node_label(&graph, child),
            "{Circle|+radius\\l-area\\l|+draw()\\l+scale()\\l}"
        );
    }

    #[test]
    fn test_label_empty_blocks_keep_separators() {
        let mut graph = ClassGraph::new();
        let id = graph.add_class(ClassEntity::new("Empty", "pkg.mod"));
        let options = RecordOptions::default();
        assert_eq!(options.node_label(&graph, id), "{Empty||}");
    }

    #[test]
    fn test_label_without_sections() {
        let (graph, base, _) = graph_with_pair();
        let options = RecordOptions {
            show_attrs: false,
            show_methods: false,
            ..RecordOptions::default()
        };
        assert_eq!(options.node_label(&graph, base), "{Shape}");
    }

    #[test]
    fn test_keep_private_false_hides_underscored() {
        let mut graph = ClassGraph::new();
        let mut entity = ClassEntity::new("A", "pkg.mod");
        entity.attrs.insert("_hidden".to_string());
        entity.attrs.insert("shown".to_string());
        entity.methods.push(MethodEntity::new("A._internal"));
        let id = graph.add_class(entity);

        let options = RecordOptions {
            keep_private: false,
            ..RecordOptions::default()
        };
        assert_eq!(options.node_label(&graph, id), "{A|+shown\\l|}");
    }

    #[test]
    fn test_cls_attrs_block_leads_with_separator() {
        let mut graph = ClassGraph::new();
        let mut entity = ClassEntity::new("A", "pkg.mod");
        entity.cls_attrs.insert("VERSION".to_string());
        entity.attrs.insert("x".to_string());
        let id = graph.add_class(entity);

        let options = RecordOptions {
            show_cls_attrs: true,
            ..RecordOptions::default()
        };
        assert_eq!(
            options.node_label(&graph, id),
            "{A|+VERSION\\l|+x\\l|}"
        );
    }

    #[test]
    fn test_separate_props_splits_blocks() {
        let mut graph = ClassGraph::new();
        let mut entity = ClassEntity::new("Circle", "geo.round");
        entity
            .methods
            .push(MethodEntity::new("Circle.area").with_decorators(vec!["property".to_string()]));
        entity.methods.push(MethodEntity::new("Circle.scale"));
        let id = graph.add_class(entity);

        let options = RecordOptions {
            separate_props: true,
            ..RecordOptions::default()
        };
        // Properties keep no parentheses and get their own block.
        assert_eq!(
            options.node_label(&graph, id),
            "{Circle||+area\\l|+scale()\\l}"
        );
    }

    #[test]
    fn test_placeholder_label_is_plain_name() {
        let mut graph = ClassGraph::new();
        let id = graph.add_class(ClassEntity::placeholder("numpy.ndarray"));
        let options = RecordOptions::default();
        assert_eq!(options.node_label(&graph, id), "numpy.ndarray");
        assert_eq!(options.style_for(&graph, id).shape, "oval");
        assert_eq!(options.style_for(&graph, id).color, "red");
    }

    #[test]
    fn test_display_long_name() {
        let (graph, base, _) = graph_with_pair();
        let options = RecordOptions {
            display: NameAttr::LongName,
            show_attrs: false,
            show_methods: false,
            ..RecordOptions::default()
        };
        assert_eq!(options.node_label(&graph, base), "{geo.base.Shape}");
    }

    #[test]
    fn test_style_for_abstract() {
        let mut graph = ClassGraph::new();
        let abc = graph.add_class(ClassEntity::placeholder("abc.ABC"));
        let id = graph.add_class(ClassEntity::new("Base", "pkg.mod"));
        graph.add_base(id, abc);

        let options = RecordOptions::default();
        assert_eq!(options.style_for(&graph, id).color, "blue");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: RecordOptions =
            serde_json::from_str(r#"{"show_methods": false, "display": "long_name"}"#).unwrap();
        assert!(!options.show_methods);
        assert_eq!(options.display, NameAttr::LongName);
        assert!(options.show_attrs);
        assert_eq!(options.styles.normal.shape, "record");
    }

    #[test]
    fn test_styles_deserialize_per_category() {
        let options: RecordOptions = serde_json::from_str(
            r#"{"styles": {"abstract": {"shape": "record", "color": "darkgreen"}}}"#,
        )
        .unwrap();
        assert_eq!(options.styles.abstract_.color, "darkgreen");
        assert_eq!(options.styles.not_found.shape, "oval");
    }

    #[test]
    fn test_escape_record_text() {
        assert_eq!(escape_record_text("plain"), "plain");
        assert_eq!(escape_record_text("a|b"), "a\\|b");
        assert_eq!(escape_record_text("{x}"), "\\{x\\}");
    }
}
