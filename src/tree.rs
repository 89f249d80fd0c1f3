//! The tree engine: an identifier-indexed node registry plus a designated
//! root, enforcing the hierarchy invariants after every public operation.
//!
//! Nodes are held behind [`NodeRef`] (`Rc<RefCell<Node>>`), so several trees
//! may share the same node objects at once (shallow copies, subtrees). Each
//! tree owns only its own per-tree link records inside those nodes; the
//! payload is shared. `Rc<RefCell<_>>` keeps the whole structure
//! single-threaded by construction, which is the intended concurrency
//! policy: callers wanting cross-thread use must serialize externally.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{TreeError, TreeResult};
use crate::node::{Node, NodeId, NodeRef, TreeId};
use crate::traversal::{Ancestors, ExpandTree, NodeFilter, TraversalMode, TraversalOpts};

/// Tree of uniquely identified nodes with O(1) lookup via the registry.
#[derive(Debug)]
pub struct Tree<D = ()> {
    identifier: TreeId,
    root: Option<NodeId>,
    nodes: HashMap<NodeId, NodeRef<D>>,
}

impl<D> Default for Tree<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Tree<D> {
    /// Creates an empty tree with a generated identifier.
    pub fn new() -> Self {
        Self::with_identifier(Uuid::new_v4().to_string())
    }

    /// Creates an empty tree with a caller-supplied identifier. The tree
    /// identifier scopes the per-tree link records of shared nodes.
    pub fn with_identifier(identifier: impl Into<TreeId>) -> Self {
        Self {
            identifier: identifier.into(),
            root: None,
            nodes: HashMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, nid: &str) -> bool {
        self.nodes.contains_key(nid)
    }

    /// Returns the node with the given identifier, None if absent. This is
    /// the exception-free query path; use [`Tree::get`] for the strict one.
    pub fn get_node(&self, nid: &str) -> Option<NodeRef<D>> {
        self.nodes.get(nid).map(Rc::clone)
    }

    /// Strict indexed access: fails with `NodeNotFound` on an unknown id.
    pub fn get(&self, nid: &str) -> TreeResult<NodeRef<D>> {
        self.get_node(nid)
            .ok_or_else(|| TreeError::NodeNotFound(nid.to_string()))
    }

    pub fn all_nodes(&self) -> Vec<NodeRef<D>> {
        self.nodes.values().map(Rc::clone).collect()
    }

    // ------------------------------------------------------------
    // Creation / addition
    // ------------------------------------------------------------

    /// Creates a node and attaches it under `parent`.
    ///
    /// A v4 UUID is generated when `identifier` is omitted. The first node
    /// added without a parent becomes the root. Registry and the parent's
    /// child list are updated together; on any failure nothing changes.
    #[instrument(level = "debug", skip(self, data))]
    pub fn create_node(
        &mut self,
        tag: Option<&str>,
        identifier: Option<&str>,
        parent: Option<&str>,
        data: D,
    ) -> TreeResult<NodeId> {
        let node = Node::new(tag, identifier, data);
        let nid = node.identifier().to_string();
        self.add_node(node, parent)?;
        Ok(nid)
    }

    /// Adds a pre-built node under `parent`, same contract as
    /// [`Tree::create_node`].
    #[instrument(level = "debug", skip(self, node), fields(nid = %node.identifier()))]
    pub fn add_node(&mut self, mut node: Node<D>, parent: Option<&str>) -> TreeResult<()> {
        let nid = node.identifier().to_string();
        if self.contains(&nid) {
            return Err(TreeError::DuplicatedNodeId(nid));
        }
        match parent {
            None => {
                if self.root.is_some() {
                    return Err(TreeError::MultipleRoot);
                }
            }
            Some(pid) => {
                if !self.contains(pid) {
                    return Err(TreeError::NodeNotFound(pid.to_string()));
                }
            }
        }

        node.set_parent(&self.identifier, parent.map(str::to_string));
        self.nodes.insert(nid.clone(), Rc::new(RefCell::new(node)));
        match parent {
            None => self.root = Some(nid),
            Some(pid) => {
                if let Some(parent) = self.nodes.get(pid) {
                    parent.borrow_mut().add_child(&self.identifier, nid);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Relationship queries
    // ------------------------------------------------------------

    /// Parent of the given node; None for the root or an unknown id.
    pub fn parent(&self, nid: &str) -> Option<NodeRef<D>> {
        let node = self.get_node(nid)?;
        let pid = node.borrow().parent(&self.identifier).cloned()?;
        self.get_node(&pid)
    }

    /// Child identifiers of the given node, empty for an unknown id.
    pub fn children_ids(&self, nid: &str) -> Vec<NodeId> {
        self.get_node(nid)
            .map(|node| node.borrow().children(&self.identifier).to_vec())
            .unwrap_or_default()
    }

    /// Children of the given node, empty for an unknown id.
    pub fn children(&self, nid: &str) -> Vec<NodeRef<D>> {
        self.children_ids(nid)
            .iter()
            .filter_map(|cid| self.get_node(cid))
            .collect()
    }

    /// Siblings of the given node; empty for the root or an unknown id.
    pub fn siblings(&self, nid: &str) -> Vec<NodeRef<D>> {
        if self.root() == Some(nid) {
            return Vec::new();
        }
        let Some(pid) = self
            .get_node(nid)
            .and_then(|node| node.borrow().parent(&self.identifier).cloned())
        else {
            return Vec::new();
        };
        self.children_ids(&pid)
            .iter()
            .filter(|cid| cid.as_str() != nid)
            .filter_map(|cid| self.get_node(cid))
            .collect()
    }

    /// Distance from the root to the node, root being at level 0.
    pub fn level(&self, nid: &str) -> TreeResult<usize> {
        Ok(self.rsearch(nid)?.count().saturating_sub(1))
    }

    /// Like [`Tree::level`], but ancestors failing the filter are not
    /// counted. The walk still continues toward the root (skip, not prune).
    pub fn level_by<'a>(
        &'a self,
        nid: &str,
        filter: impl Fn(&Node<D>) -> bool + 'a,
    ) -> TreeResult<usize> {
        Ok(self
            .rsearch_with(nid, Box::new(filter))?
            .count()
            .saturating_sub(1))
    }

    /// Maximum level of the tree, 0 for an empty or single-node tree.
    pub fn depth(&self) -> usize {
        let Ok(leaves) = self.leaves(None) else {
            return 0;
        };
        leaves
            .iter()
            .filter_map(|leaf| self.level(leaf.borrow().identifier()).ok())
            .max()
            .unwrap_or(0)
    }

    /// Leaves of the subtree rooted at `start`, or of the whole tree.
    pub fn leaves(&self, start: Option<&str>) -> TreeResult<Vec<NodeRef<D>>> {
        let mut leaves = Vec::new();
        for nid in self.expand_tree(start, TraversalMode::Depth)? {
            if let Some(node) = self.get_node(&nid) {
                if node.borrow().is_leaf(&self.identifier) {
                    leaves.push(node);
                }
            }
        }
        Ok(leaves)
    }

    /// All root-to-leaf identifier sequences, the root not omitted.
    pub fn paths_to_leaves(&self) -> Vec<Vec<NodeId>> {
        let Ok(leaves) = self.leaves(None) else {
            return Vec::new();
        };
        let mut paths = Vec::new();
        for leaf in leaves {
            let lid = leaf.borrow().identifier().to_string();
            if let Ok(walk) = self.rsearch(&lid) {
                let mut path: Vec<NodeId> = walk.collect();
                path.reverse();
                paths.push(path);
            }
        }
        paths
    }

    // ------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------

    /// Lazy walk of identifiers from `start` (default: root) in the given
    /// mode. An empty tree yields an empty walk; an unknown `start` fails
    /// with `NodeNotFound`.
    pub fn expand_tree(
        &self,
        start: Option<&str>,
        mode: TraversalMode,
    ) -> TreeResult<ExpandTree<'_, D>> {
        self.expand_tree_with(start, mode, TraversalOpts::new())
    }

    /// [`Tree::expand_tree`] with a prune filter, sibling ordering and
    /// reversal. A node failing the filter is excluded together with its
    /// entire subtree.
    pub fn expand_tree_with<'a>(
        &'a self,
        start: Option<&str>,
        mode: TraversalMode,
        opts: TraversalOpts<'a, D>,
    ) -> TreeResult<ExpandTree<'a, D>> {
        let start = match start {
            Some(nid) => {
                if !self.contains(nid) {
                    return Err(TreeError::NodeNotFound(nid.to_string()));
                }
                Some(nid.to_string())
            }
            None => self.root.clone(),
        };
        Ok(ExpandTree::new(self, start, mode, opts))
    }

    /// Lazy walk from `nid` up to the root, both inclusive.
    pub fn rsearch(&self, nid: &str) -> TreeResult<Ancestors<'_, D>> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        Ok(Ancestors::new(self, nid.to_string(), None))
    }

    /// [`Tree::rsearch`] with a skip filter: a node failing the filter is
    /// left out of the walk, which still continues toward the root. This is
    /// deliberately not the prune semantics of [`Tree::expand_tree_with`].
    pub fn rsearch_with<'a>(
        &'a self,
        nid: &str,
        filter: NodeFilter<'a, D>,
    ) -> TreeResult<Ancestors<'a, D>> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        Ok(Ancestors::new(self, nid.to_string(), Some(filter)))
    }

    /// Children of `nid` after filtering (prune), ordering and reversal.
    /// Shared by traversal, export and rendering.
    pub(crate) fn select_children(
        &self,
        nid: &str,
        filter: Option<&(dyn Fn(&Node<D>) -> bool + '_)>,
        compare: Option<&(dyn Fn(&Node<D>, &Node<D>) -> Ordering + '_)>,
        reverse: bool,
    ) -> Vec<NodeId> {
        let Some(node) = self.get_node(nid) else {
            return Vec::new();
        };
        let mut entries: Vec<(NodeId, NodeRef<D>)> = node
            .borrow()
            .children(&self.identifier)
            .iter()
            .filter_map(|cid| self.get_node(cid).map(|child| (cid.clone(), child)))
            .collect();
        if let Some(filter) = filter {
            entries.retain(|(_, child)| filter(&child.borrow()));
        }
        if let Some(compare) = compare {
            entries.sort_by(|(_, a), (_, b)| compare(&a.borrow(), &b.borrow()));
        }
        if reverse {
            entries.reverse();
        }
        entries.into_iter().map(|(cid, _)| cid).collect()
    }

    // ------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------

    /// Detaches `source` from its parent and reattaches it under
    /// `destination`. Fails before any mutation: `NodeNotFound` for unknown
    /// ids, `Structure` when `source` is the root, `Loop` when
    /// `destination` lies inside `source`'s subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, source: &str, destination: &str) -> TreeResult<()> {
        if !self.contains(source) {
            return Err(TreeError::NodeNotFound(source.to_string()));
        }
        if !self.contains(destination) {
            return Err(TreeError::NodeNotFound(destination.to_string()));
        }
        if self.root() == Some(source) {
            return Err(TreeError::Structure(format!(
                "Cannot move the root node '{source}'"
            )));
        }
        // Walk the destination's ancestors; hitting the source means the
        // move would close a cycle.
        let mut cursor = Some(destination.to_string());
        while let Some(current) = cursor {
            if current == source {
                return Err(TreeError::Loop {
                    source: source.to_string(),
                    destination: destination.to_string(),
                });
            }
            cursor = if self.root() == Some(current.as_str()) {
                None
            } else {
                self.get_node(&current)
                    .and_then(|node| node.borrow().parent(&self.identifier).cloned())
            };
        }

        let old_parent = self.get(source)?.borrow().parent(&self.identifier).cloned();
        if let Some(pid) = old_parent {
            if let Some(parent) = self.nodes.get(&pid) {
                parent.borrow_mut().remove_child(&self.identifier, source);
            }
        }
        if let Some(dest) = self.nodes.get(destination) {
            dest.borrow_mut()
                .add_child(&self.identifier, source.to_string());
        }
        if let Some(node) = self.nodes.get(source) {
            node.borrow_mut()
                .set_parent(&self.identifier, Some(destination.to_string()));
        }
        Ok(())
    }

    /// Removes `nid` and every descendant from this tree, returning the
    /// number of removed nodes. Removing the root empties the tree. Nodes
    /// shared with other trees only lose this tree's link scope.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, nid: &str) -> TreeResult<usize> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        let parent = self.get(nid)?.borrow().parent(&self.identifier).cloned();
        let removed: Vec<NodeId> = self.expand_tree(Some(nid), TraversalMode::Depth)?.collect();
        for id in &removed {
            if let Some(node) = self.nodes.remove(id) {
                node.borrow_mut().drop_scope(&self.identifier);
            }
        }
        if let Some(pid) = parent {
            if let Some(parent) = self.nodes.get(&pid) {
                parent.borrow_mut().remove_child(&self.identifier, nid);
            }
        }
        if self.root() == Some(nid) {
            self.root = None;
        }
        Ok(removed.len())
    }

    /// Removes `nid` while reattaching its children to its former parent,
    /// at the removed node's former position so sibling order is stable.
    /// With a -> b -> c, linking past b leaves a -> c.
    #[instrument(level = "debug", skip(self))]
    pub fn link_past_node(&mut self, nid: &str) -> TreeResult<()> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        if self.root() == Some(nid) {
            return Err(TreeError::Structure(
                "Cannot link past the root node, delete it with remove_node()".to_string(),
            ));
        }
        let node = self.get(nid)?;
        let (pid, children) = {
            let node = node.borrow();
            (
                node.parent(&self.identifier).cloned(),
                node.children(&self.identifier).to_vec(),
            )
        };
        let pid = pid.ok_or_else(|| {
            TreeError::Structure(format!("Node '{nid}' has no parent in this tree"))
        })?;

        for cid in &children {
            if let Some(child) = self.nodes.get(cid) {
                child
                    .borrow_mut()
                    .set_parent(&self.identifier, Some(pid.clone()));
            }
        }
        if let Some(parent) = self.nodes.get(&pid) {
            let mut parent = parent.borrow_mut();
            let link = parent.link_mut(&self.identifier);
            match link.children.iter().position(|cid| cid == nid) {
                Some(pos) => {
                    link.children.splice(pos..=pos, children.iter().cloned());
                }
                None => link.children.extend(children.iter().cloned()),
            }
        }
        if let Some(node) = self.nodes.remove(nid) {
            node.borrow_mut().drop_scope(&self.identifier);
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Subtree extraction / grafting
    // ------------------------------------------------------------

    /// Shallow view of the subtree rooted at `nid`: a new tree sharing the
    /// node objects (and payload) with this one. Structural mutation of
    /// either tree does not affect the other's link scope.
    #[instrument(level = "debug", skip(self))]
    pub fn subtree(&self, nid: &str) -> TreeResult<Tree<D>> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        let mut st = Tree::new();
        let ids: Vec<NodeId> = self.expand_tree(Some(nid), TraversalMode::Depth)?.collect();
        for id in &ids {
            if let Some(node) = self.nodes.get(id) {
                node.borrow_mut()
                    .clone_scope(&self.identifier, &st.identifier);
                st.nodes.insert(id.clone(), Rc::clone(node));
            }
        }
        if let Some(root) = st.nodes.get(nid) {
            root.borrow_mut().set_parent(&st.identifier, None);
        }
        st.root = Some(nid.to_string());
        Ok(st)
    }

    /// [`Tree::subtree`] plus detaching and deleting those nodes from this
    /// tree, in one operation.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, nid: &str) -> TreeResult<Tree<D>> {
        let st = self.subtree(nid)?;
        let parent = self.get(nid)?.borrow().parent(&self.identifier).cloned();
        for id in st.nodes.keys() {
            if let Some(node) = self.nodes.remove(id) {
                node.borrow_mut().drop_scope(&self.identifier);
            }
        }
        if let Some(pid) = parent {
            if let Some(parent) = self.nodes.get(&pid) {
                parent.borrow_mut().remove_child(&self.identifier, nid);
            }
        }
        if self.root() == Some(nid) {
            self.root = None;
        }
        Ok(st)
    }

    /// Grafts `other`'s root (and full subtree) as a new child of `nid`.
    /// Fails with `DuplicatedNodeId` before any mutation if identifiers
    /// collide; an empty `other` is a no-op.
    #[instrument(level = "debug", skip(self, other))]
    pub fn paste(&mut self, nid: &str, other: Tree<D>) -> TreeResult<()> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        let Some(other_root) = other.root.clone() else {
            return Ok(());
        };
        if let Some(dup) = other.nodes.keys().sorted().find(|id| self.contains(id.as_str())) {
            return Err(TreeError::DuplicatedNodeId(dup.clone()));
        }
        for (id, node) in &other.nodes {
            node.borrow_mut().rescope(&other.identifier, &self.identifier);
            self.nodes.insert(id.clone(), Rc::clone(node));
        }
        if let Some(root) = self.nodes.get(&other_root) {
            root.borrow_mut()
                .set_parent(&self.identifier, Some(nid.to_string()));
        }
        if let Some(parent) = self.nodes.get(nid) {
            parent.borrow_mut().add_child(&self.identifier, other_root);
        }
        Ok(())
    }

    /// Like [`Tree::paste`], but grafts only the children of `other`'s root
    /// directly under `nid`, discarding `other`'s root node itself.
    #[instrument(level = "debug", skip(self, other))]
    pub fn merge(&mut self, nid: &str, other: Tree<D>) -> TreeResult<()> {
        if !self.contains(nid) {
            return Err(TreeError::NodeNotFound(nid.to_string()));
        }
        let Some(other_root) = other.root.clone() else {
            return Ok(());
        };
        if let Some(dup) = other
            .nodes
            .keys()
            .sorted()
            .find(|id| *id != &other_root && self.contains(id.as_str()))
        {
            return Err(TreeError::DuplicatedNodeId(dup.clone()));
        }
        let grafted: Vec<NodeId> = other
            .get(&other_root)?
            .borrow()
            .children(&other.identifier)
            .to_vec();
        for (id, node) in other.nodes.iter().filter(|(id, _)| *id != &other_root) {
            node.borrow_mut().rescope(&other.identifier, &self.identifier);
            self.nodes.insert(id.clone(), Rc::clone(node));
        }
        for cid in &grafted {
            if let Some(child) = self.nodes.get(cid) {
                child
                    .borrow_mut()
                    .set_parent(&self.identifier, Some(nid.to_string()));
            }
            if let Some(parent) = self.nodes.get(nid) {
                parent.borrow_mut().add_child(&self.identifier, cid.clone());
            }
        }
        // The discarded root keeps no stale scope behind.
        if let Some(root) = other.nodes.get(&other_root) {
            root.borrow_mut().drop_scope(&other.identifier);
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Copy semantics
    // ------------------------------------------------------------

    /// Shallow copy: a new tree scope over the same node objects. Payload
    /// mutations are visible in both trees; structural mutations are not,
    /// since each tree owns its own link records.
    pub fn shallow_clone(&self) -> TreeResult<Tree<D>> {
        self.check_root()?;
        let mut copy = Tree::new();
        copy.root = self.root.clone();
        for (id, node) in &self.nodes {
            node.borrow_mut()
                .clone_scope(&self.identifier, &copy.identifier);
            copy.nodes.insert(id.clone(), Rc::clone(node));
        }
        Ok(copy)
    }

    fn check_root(&self) -> TreeResult<()> {
        if let Some(root) = &self.root {
            if !self.contains(root) {
                return Err(TreeError::Structure(format!(
                    "Root '{root}' is missing from the registry"
                )));
            }
        }
        Ok(())
    }
}

impl<D: Clone> Tree<D> {
    /// Deep copy: brand-new node objects with duplicated payload, fully
    /// independent of the source. `Clone` on the payload is the cloning
    /// capability; callers who want the payload shared instead should use a
    /// reference-counted payload type.
    pub fn deep_clone(&self) -> TreeResult<Tree<D>> {
        self.check_root()?;
        let mut copy = Tree::new();
        copy.root = self.root.clone();
        for (id, node) in &self.nodes {
            let fresh = node.borrow().duplicate_for(&self.identifier, &copy.identifier);
            copy.nodes.insert(id.clone(), Rc::new(RefCell::new(fresh)));
        }
        Ok(copy)
    }
}
