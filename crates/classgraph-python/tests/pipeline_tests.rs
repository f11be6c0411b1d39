//! Full pipeline runs: scan, resolve, filter, render.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use classgraph::filter::{ConnectedKeeper, RelatedKeeper};
use classgraph::{apply_filters, export_dot, load_filters, ClassFilter, ClassId, Config, FilterRegistry};
use classgraph_python::PackageManager;

fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

fn shapes_tree(dir: &Path) -> PackageManager {
    write_tree(
        dir,
        &[
            ("geo/__init__.py", ""),
            (
                "geo/base.py",
                "from abc import ABC\n\nclass Shape(ABC):\n    pass\n",
            ),
            (
                "geo/round.py",
                concat!(
                    "from geo.base import Shape\n",
                    "\n",
                    "class Circle(Shape):\n",
                    "    def __init__(self, radius):\n",
                    "        self.radius = radius\n",
                    "\n",
                    "    def area(self):\n",
                    "        return 3.14 * self.radius ** 2\n",
                ),
            ),
            (
                "geo/square.py",
                "from geo.base import Shape\n\nclass Square(Shape):\n    pass\n",
            ),
        ],
    );
    let mut manager = PackageManager::new();
    manager.add_package(dir.join("geo")).unwrap();
    manager
}

fn surviving_names(manager: &PackageManager, classes: &HashSet<ClassId>) -> Vec<String> {
    let mut names: Vec<String> = classes
        .iter()
        .map(|&id| manager.graph()[id].name.clone())
        .collect();
    names.sort();
    names
}

#[test]
fn test_scan_filter_render() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = shapes_tree(dir.path());

    let mut classes = manager.find_all().unwrap();
    manager.update_inheritance().unwrap();
    assert_eq!(surviving_names(&manager, &classes), vec!["Circle", "Shape", "Square"]);

    let config: Config = r#"{
        "filters": [
            {"kind": "ByNameRemover", "names": ["geo.square.Square"]}
        ]
    }"#
    .parse()
    .unwrap();
    let filters = load_filters(&config.filters, &FilterRegistry::new()).unwrap();
    apply_filters(&filters, manager.graph(), &mut classes);
    assert_eq!(surviving_names(&manager, &classes), vec!["Circle", "Shape"]);

    let dot = export_dot(manager.graph(), &classes, &config.record);
    assert!(dot.contains(
        "  \"geo_round_Circle\" [label=\"{Circle|+radius\\l|+__init__()\\l+area()\\l}\", shape=record, color=black];"
    ));
    // Shape inherits from abc.ABC, so it renders as abstract.
    assert!(dot.contains("  \"geo_base_Shape\" [label=\"{Shape||}\", shape=record, color=blue];"));
    assert!(dot.contains("  \"geo_base_Shape\" -> \"geo_round_Circle\" [dir=back, arrowtail=empty];"));
    // The filtered class and the unrequested placeholder stay out.
    assert!(!dot.contains("Square"));
    assert!(!dot.contains("abc_ABC"));
}

#[test]
fn test_connected_vs_related_keeper() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("rel/__init__.py", ""),
            (
                "rel/a.py",
                concat!(
                    "class A:\n    pass\n",
                    "\n",
                    "class B(A):\n    pass\n",
                    "\n",
                    "class C(B):\n    pass\n",
                    "\n",
                    "class D(A):\n    pass\n",
                ),
            ),
        ],
    );
    let mut manager = PackageManager::new();
    manager.add_package(dir.path().join("rel")).unwrap();

    let all = manager.find_all().unwrap();
    manager.update_inheritance().unwrap();

    let mut connected = all.clone();
    ConnectedKeeper::new(["B"]).apply(manager.graph(), &mut connected);
    assert_eq!(
        surviving_names(&manager, &connected),
        vec!["A", "B", "C", "D"]
    );

    let mut related = all.clone();
    RelatedKeeper::new(["B"]).apply(manager.graph(), &mut related);
    assert_eq!(surviving_names(&manager, &related), vec!["A", "B", "C"]);
}

#[test]
fn test_lone_parents_after_name_removal() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("lone/__init__.py", ""),
            ("lone/a.py", "class A:\n    pass\n\nclass B(A):\n    pass\n"),
        ],
    );
    let mut manager = PackageManager::new();
    manager.add_package(dir.path().join("lone")).unwrap();

    let all = manager.find_all().unwrap();
    manager.update_inheritance().unwrap();

    let config: Config = r#"{
        "filters": [
            {"kind": "ByNameRemover", "names": ["lone.a.B"]},
            {"kind": "LoneParentsRemover"}
        ]
    }"#
    .parse()
    .unwrap();
    let filters = load_filters(&config.filters, &FilterRegistry::new()).unwrap();

    let mut classes = all.clone();
    apply_filters(&filters, manager.graph(), &mut classes);
    assert!(classes.is_empty());

    // Without the removal the pair is untouched.
    let keep: Config = r#"{"filters": [{"kind": "LoneParentsRemover"}]}"#.parse().unwrap();
    let filters = load_filters(&keep.filters, &FilterRegistry::new()).unwrap();
    let mut classes = all;
    apply_filters(&filters, manager.graph(), &mut classes);
    assert_eq!(surviving_names(&manager, &classes), vec!["A", "B"]);
}

#[test]
fn test_placeholders_render_when_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = shapes_tree(dir.path());

    manager.find_all().unwrap();
    manager.update_inheritance().unwrap();

    let classes: HashSet<ClassId> = manager.classes().into_iter().collect();
    let dot = export_dot(manager.graph(), &classes, &classgraph::RecordOptions::default());

    assert!(dot.contains("  \"abc_ABC\" [label=\"abc.ABC\", shape=oval, color=red];"));
    assert!(dot.contains("  \"abc_ABC\" -> \"geo_base_Shape\" [dir=back, arrowtail=empty];"));
}

#[test]
fn test_render_options_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = shapes_tree(dir.path());

    let mut classes = manager.find_all().unwrap();
    manager.update_inheritance().unwrap();

    let config: Config = r#"{
        "record": {"display": "long_name", "show_methods": false},
        "filters": [
            {"kind": "ByPartialNameKeeper", "names": ["Circle"], "attr": "name"}
        ]
    }"#
    .parse()
    .unwrap();
    let filters = load_filters(&config.filters, &FilterRegistry::new()).unwrap();
    apply_filters(&filters, manager.graph(), &mut classes);

    let dot = export_dot(manager.graph(), &classes, &config.record);
    assert!(dot.contains(
        "  \"geo_round_Circle\" [label=\"{geo.round.Circle|+radius\\l}\", shape=record, color=black];"
    ));
    assert!(!dot.contains("__init__"));
}

#[test]
fn test_pipeline_output_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = {
        let mut manager = shapes_tree(dir.path());
        let classes = manager.find_all().unwrap();
        manager.update_inheritance().unwrap();
        export_dot(manager.graph(), &classes, &classgraph::RecordOptions::default())
    };
    let second = {
        let mut manager = shapes_tree(dir.path());
        let classes = manager.find_all().unwrap();
        manager.update_inheritance().unwrap();
        export_dot(manager.graph(), &classes, &classgraph::RecordOptions::default())
    };
    assert_eq!(first, second);
}
