//! Text and GraphViz rendering.
//!
//! The glyph-tree output is assembled with `termtree`: the tree is walked
//! recursively and every node contributes a `termtree::Tree<String>` whose
//! leaves are its rendered children. DOT output follows the classic
//! GraphViz export: one labelled statement per node from a breadth-first
//! walk, one edge per parent/child pair.

use std::fs;
use std::path::Path;

use termtree::GlyphPalette;

use crate::errors::{TreeError, TreeResult};
use crate::node::Node;
use crate::traversal::{NodeCompare, NodeFilter, TraversalMode};
use crate::tree::Tree;

/// Glyph set used for the text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    /// Unicode box-drawing characters
    #[default]
    UnicodeEx,
    /// Doubled box-drawing characters
    UnicodeEm,
    /// Plain ASCII
    Ascii,
}

impl LineStyle {
    fn palette(self) -> GlyphPalette {
        match self {
            LineStyle::UnicodeEx => GlyphPalette::new(),
            LineStyle::UnicodeEm => GlyphPalette {
                middle_item: "╠",
                last_item: "╚",
                item_indent: "══ ",
                middle_skip: "║",
                last_skip: " ",
                skip_indent: "   ",
            },
            LineStyle::Ascii => GlyphPalette {
                middle_item: "|",
                last_item: "+",
                item_indent: "-- ",
                middle_skip: "|",
                last_skip: " ",
                skip_indent: "   ",
            },
        }
    }
}

/// Options for the text rendering: prune filter, sibling ordering,
/// identifier display and glyph style.
pub struct RenderOpts<'a, D> {
    pub(crate) filter: Option<NodeFilter<'a, D>>,
    pub(crate) compare: Option<NodeCompare<'a, D>>,
    pub(crate) reverse: bool,
    pub(crate) show_identifier: bool,
    pub(crate) style: LineStyle,
}

impl<D> Default for RenderOpts<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, D> RenderOpts<'a, D> {
    pub fn new() -> Self {
        Self {
            filter: None,
            compare: None,
            reverse: false,
            show_identifier: false,
            style: LineStyle::default(),
        }
    }

    /// Prune filter: a node failing the predicate disappears from the
    /// output together with its subtree.
    pub fn filter(mut self, filter: impl Fn(&Node<D>) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn sort_by(mut self, compare: impl Fn(&Node<D>, &Node<D>) -> std::cmp::Ordering + 'a) -> Self {
        self.compare = Some(Box::new(compare));
        self
    }

    pub fn sort_by_key<K: Ord>(self, key: impl Fn(&Node<D>) -> K + 'a) -> Self {
        self.sort_by(move |a, b| key(a).cmp(&key(b)))
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Appends `[identifier]` to every label.
    pub fn show_identifier(mut self, show: bool) -> Self {
        self.show_identifier = show;
        self
    }

    pub fn style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }
}

impl<D> Tree<D> {
    /// Glyph-tree text of the subtree rooted at `start` (default: root).
    /// An empty tree renders as an empty string.
    pub fn render(&self, start: Option<&str>) -> TreeResult<String> {
        self.render_with(start, RenderOpts::new())
    }

    pub fn render_with(&self, start: Option<&str>, opts: RenderOpts<'_, D>) -> TreeResult<String> {
        let start = match start {
            Some(nid) => {
                if !self.contains(nid) {
                    return Err(TreeError::NodeNotFound(nid.to_string()));
                }
                nid.to_string()
            }
            None => match self.root() {
                Some(root) => root.to_string(),
                None => return Ok(String::new()),
            },
        };
        Ok(self.glyph_tree(&start, &opts).to_string())
    }

    /// Prints [`Tree::render`] to stdout.
    pub fn show(&self, start: Option<&str>) -> TreeResult<()> {
        print!("{}", self.render(start)?);
        Ok(())
    }

    /// Writes the rendered text to a file for offline inspection.
    pub fn save_to_file(&self, path: impl AsRef<Path>, start: Option<&str>) -> TreeResult<()> {
        fs::write(path, self.render(start)?)?;
        Ok(())
    }

    fn glyph_tree(&self, nid: &str, opts: &RenderOpts<'_, D>) -> termtree::Tree<String> {
        let (label, expanded) = match self.get_node(nid) {
            Some(node) => {
                let node = node.borrow();
                let label = if opts.show_identifier {
                    format!("{}[{}]", node.tag(), node.identifier())
                } else {
                    node.tag().to_string()
                };
                (label, node.expanded)
            }
            None => (String::new(), false),
        };
        let mut out = termtree::Tree::new(label).with_glyphs(opts.style.palette());
        if expanded {
            for cid in self.select_children(
                nid,
                opts.filter.as_deref(),
                opts.compare.as_deref(),
                opts.reverse,
            ) {
                out.push(self.glyph_tree(&cid, opts));
            }
        }
        out
    }

    /// GraphViz DOT representation, directed with circle-shaped nodes.
    pub fn to_dot(&self) -> String {
        self.to_dot_with("circle", true)
    }

    /// DOT representation with a caller-chosen node shape; `directed`
    /// selects digraph/`->` over graph/`--`.
    pub fn to_dot_with(&self, shape: &str, directed: bool) -> String {
        let (graph, edge) = if directed {
            ("digraph", "->")
        } else {
            ("graph", "--")
        };
        let mut nodes = Vec::new();
        let mut connections = Vec::new();
        if let Ok(walk) = self.expand_tree(None, TraversalMode::Width) {
            for nid in walk {
                if let Some(node) = self.get_node(&nid) {
                    let node = node.borrow();
                    nodes.push(format!(
                        "    \"{}\" [label=\"{}\", shape={}]",
                        nid,
                        node.tag(),
                        shape
                    ));
                    for cid in node.children(self.identifier()) {
                        connections.push(format!("    \"{nid}\" {edge} \"{cid}\""));
                    }
                }
            }
        }

        let mut out = format!("{graph} tree {{\n");
        for line in &nodes {
            out.push_str(line);
            out.push('\n');
        }
        if !connections.is_empty() {
            out.push('\n');
            for line in &connections {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str("}\n");
        out
    }

    /// Writes [`Tree::to_dot`] to a file.
    pub fn write_dot(&self, path: impl AsRef<Path>) -> TreeResult<()> {
        fs::write(path, self.to_dot())?;
        Ok(())
    }
}
