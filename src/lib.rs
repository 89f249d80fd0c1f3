//! rstree - identifier-indexed tree data structure.
//!
//! A tree is a registry of uniquely identified nodes plus a designated
//! root. Lookup is O(1), traversal is lazy (depth-first pre-order,
//! breadth-first, zigzag, filtered, sorted), and the structure can be
//! mutated (move, remove, link-past, subtree extraction, paste, merge) or
//! exported (nested dict, JSON, glyph-tree text, GraphViz DOT).
//!
//! ```
//! use rstree::{Tree, TraversalMode};
//!
//! let mut tree: Tree = Tree::new();
//! tree.create_node(Some("Harry"), Some("harry"), None, ())?;
//! tree.create_node(Some("Jane"), Some("jane"), Some("harry"), ())?;
//! tree.create_node(Some("Bill"), Some("bill"), Some("harry"), ())?;
//!
//! let order: Vec<_> = tree.expand_tree(None, TraversalMode::Depth)?.collect();
//! assert_eq!(order, ["harry", "jane", "bill"]);
//! # Ok::<(), rstree::TreeError>(())
//! ```
//!
//! Nodes are shared between trees via `Rc<RefCell<_>>`, so shallow copies
//! and subtrees alias the same node objects while each tree keeps its own
//! parent/child links. The whole crate is single-threaded by construction.

pub mod errors;
pub mod export;
pub mod node;
pub mod render;
pub mod traversal;
pub mod tree;

pub use errors::{TreeError, TreeResult};
pub use export::DictOpts;
pub use node::{Node, NodeId, NodeLink, NodeRef, TreeId};
pub use render::{LineStyle, RenderOpts};
pub use traversal::{Ancestors, ExpandTree, NodeCompare, NodeFilter, TraversalMode, TraversalOpts};
pub use tree::Tree;
