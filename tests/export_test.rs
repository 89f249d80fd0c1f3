//! Tests for the export surface: nested dict, JSON, glyph-tree text and
//! GraphViz DOT.

use rstest::{fixture, rstest};
use rstree::{DictOpts, LineStyle, RenderOpts, Tree};
use serde_json::{json, Value};

#[fixture]
fn family() -> Tree {
    let mut tree: Tree = Tree::new();
    tree.create_node(Some("Harry"), Some("harry"), None, ()).unwrap();
    tree.create_node(Some("Jane"), Some("jane"), Some("harry"), ()).unwrap();
    tree.create_node(Some("Bill"), Some("bill"), Some("harry"), ()).unwrap();
    tree.create_node(Some("Diane"), Some("diane"), Some("jane"), ()).unwrap();
    tree.create_node(Some("Mark"), Some("mark"), Some("jane"), ()).unwrap();
    tree.create_node(Some("Mary"), Some("mary"), Some("diane"), ()).unwrap();
    tree
}

#[fixture]
fn tagged() -> Tree<String> {
    let mut tree: Tree<String> = Tree::new();
    tree.create_node(Some("Root"), Some("root"), None, "r".to_string()).unwrap();
    tree.create_node(Some("Left"), Some("left"), Some("root"), "l".to_string()).unwrap();
    tree.create_node(Some("Right"), Some("right"), Some("root"), "x".to_string()).unwrap();
    tree
}

/// Rebuilds a tree from the nested dict shape, tags doubling as ids.
fn rebuild(value: &Value) -> Tree {
    let mut tree: Tree = Tree::new();
    rebuild_into(&mut tree, value, None);
    tree
}

fn rebuild_into(tree: &mut Tree, value: &Value, parent: Option<&str>) {
    match value {
        Value::String(tag) => {
            tree.create_node(Some(tag), Some(tag), parent, ()).unwrap();
        }
        Value::Object(map) => {
            for (tag, inner) in map {
                tree.create_node(Some(tag), Some(tag), parent, ()).unwrap();
                if let Some(children) = inner.get("children").and_then(Value::as_array) {
                    for child in children {
                        rebuild_into(tree, child, Some(tag));
                    }
                }
            }
        }
        _ => {}
    }
}

// ============================================================
// Dict / JSON Tests
// ============================================================

#[rstest]
fn given_family_when_exporting_dict_then_shape_matches_treelib_format(family: Tree) {
    let dict = family.to_dict(None).unwrap();
    assert_eq!(
        dict,
        json!({"Harry": {"children": [
            {"Jane": {"children": [
                {"Diane": {"children": ["Mary"]}},
                "Mark"
            ]}},
            "Bill"
        ]}})
    );
}

#[rstest]
fn given_family_when_round_tripping_through_json_then_value_is_identical(family: Tree) {
    let text = family.to_json(None).unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, family.to_dict(None).unwrap());
}

#[rstest]
fn given_dict_export_when_rebuilding_a_tree_then_dict_is_reproduced(family: Tree) {
    let dict = family.to_dict(None).unwrap();
    let rebuilt = rebuild(&dict);
    assert_eq!(rebuilt.to_dict(None).unwrap(), dict);
}

#[rstest]
fn given_start_node_when_exporting_dict_then_only_its_subtree_appears(family: Tree) {
    let dict = family.to_dict(Some("diane")).unwrap();
    assert_eq!(dict, json!({"Diane": {"children": ["Mary"]}}));
}

#[rstest]
fn given_payload_when_exporting_with_data_then_each_node_carries_it(tagged: Tree<String>) {
    let dict = tagged
        .to_dict_with(None, DictOpts::new().with_data(true))
        .unwrap();
    assert_eq!(
        dict,
        json!({"Root": {
            "children": [{"Left": {"data": "l"}}, {"Right": {"data": "x"}}],
            "data": "r"
        }})
    );
}

#[rstest]
fn given_comparator_when_exporting_dict_then_children_are_sorted(family: Tree) {
    let dict = family
        .to_dict_with(
            Some("jane"),
            DictOpts::new()
                .sort_by_key(|node| node.tag().to_string())
                .reverse(true),
        )
        .unwrap();
    assert_eq!(
        dict,
        json!({"Jane": {"children": ["Mark", {"Diane": {"children": ["Mary"]}}]}})
    );
}

#[rstest]
fn given_unexpanded_node_when_exporting_then_its_children_are_elided(family: Tree) {
    family.get("jane").unwrap().borrow_mut().expanded = false;
    let dict = family.to_dict(None).unwrap();
    assert_eq!(dict, json!({"Harry": {"children": ["Jane", "Bill"]}}));
}

#[test]
fn given_empty_tree_when_exporting_dict_then_yields_empty_object() {
    let tree: Tree = Tree::new();
    assert_eq!(tree.to_dict(None).unwrap(), json!({}));
}

// ============================================================
// Text Rendering Tests
// ============================================================

#[rstest]
fn given_family_when_rendering_then_every_tag_appears_in_preorder(family: Tree) {
    let text = family.render(None).unwrap();
    assert!(text.starts_with("Harry\n"));
    let positions: Vec<usize> = ["Harry", "Jane", "Diane", "Mary", "Mark", "Bill"]
        .iter()
        .map(|tag| text.find(tag).unwrap())
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[rstest]
fn given_unicode_style_when_rendering_then_box_glyphs_are_used(family: Tree) {
    let text = family.render(None).unwrap();
    assert!(text.contains("── Jane"));
    assert!(text.contains("── Bill"));
}

#[rstest]
fn given_ascii_style_when_rendering_then_plain_glyphs_are_used(family: Tree) {
    let text = family
        .render_with(None, RenderOpts::new().style(LineStyle::Ascii))
        .unwrap();
    assert!(text.contains("-- Jane"));
    assert!(!text.contains("──"));
}

#[rstest]
fn given_show_identifier_when_rendering_then_labels_carry_ids(family: Tree) {
    let text = family
        .render_with(None, RenderOpts::new().show_identifier(true))
        .unwrap();
    assert!(text.starts_with("Harry[harry]\n"));
    assert!(text.contains("Mary[mary]"));
}

#[rstest]
fn given_render_filter_when_rendering_then_subtree_is_pruned(family: Tree) {
    let text = family
        .render_with(None, RenderOpts::new().filter(|node| node.identifier() != "diane"))
        .unwrap();
    assert!(!text.contains("Diane"));
    assert!(!text.contains("Mary"));
    assert!(text.contains("Mark"));
}

#[rstest]
fn given_unexpanded_node_when_rendering_then_its_children_are_hidden(family: Tree) {
    family.get("jane").unwrap().borrow_mut().expanded = false;
    let text = family.render(None).unwrap();
    assert!(text.contains("Jane"));
    assert!(!text.contains("Diane"));
}

#[test]
fn given_empty_tree_when_rendering_then_yields_empty_string() {
    let tree: Tree = Tree::new();
    assert_eq!(tree.render(None).unwrap(), "");
}

#[rstest]
fn given_family_when_saving_to_file_then_content_matches_render(family: Tree) {
    let file = tempfile::NamedTempFile::new().unwrap();
    family.save_to_file(file.path(), None).unwrap();
    let written = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(written, family.render(None).unwrap());
}

// ============================================================
// DOT Tests
// ============================================================

#[rstest]
fn given_family_when_exporting_dot_then_nodes_and_edges_are_listed(family: Tree) {
    let dot = family.to_dot();
    assert!(dot.starts_with("digraph tree {\n"));
    assert!(dot.ends_with("}\n"));
    assert!(dot.contains("\"harry\" [label=\"Harry\", shape=circle]"));
    assert!(dot.contains("\"harry\" -> \"jane\""));
    assert!(dot.contains("\"diane\" -> \"mary\""));
}

#[rstest]
fn given_undirected_flag_when_exporting_dot_then_graph_syntax_is_used(family: Tree) {
    let dot = family.to_dot_with("box", false);
    assert!(dot.starts_with("graph tree {\n"));
    assert!(dot.contains("shape=box"));
    assert!(dot.contains("\"harry\" -- \"jane\""));
    assert!(!dot.contains("->"));
}

#[rstest]
fn given_family_when_writing_dot_file_then_content_matches_to_dot(family: Tree) {
    let file = tempfile::NamedTempFile::new().unwrap();
    family.write_dot(file.path()).unwrap();
    let written = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(written, family.to_dot());
}

#[test]
fn given_empty_tree_when_exporting_dot_then_graph_body_is_empty() {
    let tree: Tree = Tree::new();
    assert_eq!(tree.to_dot(), "digraph tree {\n}\n");
}
