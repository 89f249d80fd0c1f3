use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

/// Identifier of a node, unique within one tree's registry.
pub type NodeId = String;
/// Identifier of a tree, used to scope the per-tree link records.
pub type TreeId = String;

/// Shared handle to a node.
///
/// The `RefCell` allows borrowing the node contents, the `Rc` allows shared
/// ownership: several trees (shallow copies, subtrees) may hold the same
/// node at the same time.
pub type NodeRef<D> = Rc<RefCell<Node<D>>>;

/// Parent/children links of a node within one tree scope.
///
/// A node missing a record for a tree has no parent and no children in that
/// tree.
#[derive(Debug, Clone, Default)]
pub struct NodeLink {
    /// Identifier of the parent node, None for the root
    pub parent: Option<NodeId>,
    /// Identifiers of the child nodes, in insertion order
    pub children: Vec<NodeId>,
}

/// Atomic hierarchy unit: identity, display tag, opaque payload, and one
/// link record per tree the node is registered in.
#[derive(Debug, Clone)]
pub struct Node<D = ()> {
    identifier: NodeId,
    tag: String,
    /// Display hint honored by export/render; raw traversal ignores it
    pub expanded: bool,
    /// Caller-owned payload, never interpreted by the tree itself
    pub data: D,
    links: HashMap<TreeId, NodeLink>,
}

impl<D> Node<D> {
    /// Creates a detached node.
    ///
    /// A v4 UUID is generated when `identifier` is omitted; the tag falls
    /// back to the identifier's string form.
    pub fn new(tag: Option<&str>, identifier: Option<&str>, data: D) -> Self {
        let identifier = match identifier {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let tag = tag.map(str::to_string).unwrap_or_else(|| identifier.clone());
        Self {
            identifier,
            tag,
            expanded: true,
            data,
            links: HashMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Parent identifier within the given tree scope, None for the root or
    /// for a node not registered in that scope.
    pub fn parent(&self, tree: &str) -> Option<&NodeId> {
        self.links.get(tree).and_then(|link| link.parent.as_ref())
    }

    /// Child identifiers within the given tree scope, in insertion order.
    pub fn children(&self, tree: &str) -> &[NodeId] {
        self.links
            .get(tree)
            .map(|link| link.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_leaf(&self, tree: &str) -> bool {
        self.children(tree).is_empty()
    }

    pub(crate) fn link_mut(&mut self, tree: &str) -> &mut NodeLink {
        self.links.entry(tree.to_string()).or_default()
    }

    pub(crate) fn set_parent(&mut self, tree: &str, parent: Option<NodeId>) {
        self.link_mut(tree).parent = parent;
    }

    pub(crate) fn add_child(&mut self, tree: &str, child: NodeId) {
        self.link_mut(tree).children.push(child);
    }

    pub(crate) fn remove_child(&mut self, tree: &str, child: &str) {
        if let Some(link) = self.links.get_mut(tree) {
            link.children.retain(|c| c != child);
        }
    }

    /// Drops the link record for a tree scope, e.g. when the node is
    /// removed from that tree while still registered in others.
    pub(crate) fn drop_scope(&mut self, tree: &str) {
        self.links.remove(tree);
    }

    /// Copies the link record of `from` into scope `to` (shallow copy,
    /// subtree extraction).
    pub(crate) fn clone_scope(&mut self, from: &str, to: &str) {
        let link = self.links.get(from).cloned().unwrap_or_default();
        self.links.insert(to.to_string(), link);
    }

    /// Moves the link record of `from` into scope `to` (paste, merge).
    pub(crate) fn rescope(&mut self, from: &str, to: &str) {
        let link = self.links.remove(from).unwrap_or_default();
        self.links.insert(to.to_string(), link);
    }
}

impl<D: Clone> Node<D> {
    /// Clones the node for a deep copy: same identity, tag and payload, but
    /// only the `src` scope carried over, re-keyed under `dst`.
    pub(crate) fn duplicate_for(&self, src: &str, dst: &str) -> Self {
        let mut links = HashMap::new();
        links.insert(
            dst.to_string(),
            self.links.get(src).cloned().unwrap_or_default(),
        );
        Self {
            identifier: self.identifier.clone(),
            tag: self.tag.clone(),
            expanded: self.expanded,
            data: self.data.clone(),
            links,
        }
    }
}

impl<D> fmt::Display for Node<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}
