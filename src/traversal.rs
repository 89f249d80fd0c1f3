//! Lazy traversal over a tree's registry.
//!
//! `ExpandTree` walks downward from a start node in depth-first, level-order
//! or zigzag order; `Ancestors` walks upward from a node to the root. The
//! two apply their filters differently on purpose: `ExpandTree` prunes (a
//! rejected node takes its whole subtree with it), `Ancestors` skips (a
//! rejected node is left out, the walk continues toward the root).

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::node::{Node, NodeId};
use crate::tree::Tree;

/// Predicate over a node, passed as a plain closure.
pub type NodeFilter<'a, D> = Box<dyn Fn(&Node<D>) -> bool + 'a>;
/// Comparator ordering sibling nodes before they are visited.
pub type NodeCompare<'a, D> = Box<dyn Fn(&Node<D>, &Node<D>) -> Ordering + 'a>;

/// Order in which `ExpandTree` visits nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Pre-order depth-first
    #[default]
    Depth,
    /// Level order, left-to-right within each level
    Width,
    /// Level order, direction alternating per level (level 0 left-to-right)
    ZigZag,
}

/// Options shared by the downward traversals: a prune filter, a stable
/// sibling comparator, and an order reversal flag.
pub struct TraversalOpts<'a, D> {
    pub(crate) filter: Option<NodeFilter<'a, D>>,
    pub(crate) compare: Option<NodeCompare<'a, D>>,
    pub(crate) reverse: bool,
}

impl<D> Default for TraversalOpts<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, D> TraversalOpts<'a, D> {
    pub fn new() -> Self {
        Self {
            filter: None,
            compare: None,
            reverse: false,
        }
    }

    /// Prune filter: a node failing the predicate is excluded together
    /// with its entire subtree.
    pub fn filter(mut self, filter: impl Fn(&Node<D>) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Orders siblings with the given comparator before visiting them.
    /// The sort is stable, ties keep their insertion order.
    pub fn sort_by(mut self, compare: impl Fn(&Node<D>, &Node<D>) -> Ordering + 'a) -> Self {
        self.compare = Some(Box::new(compare));
        self
    }

    /// Orders siblings by a key extracted from each node.
    pub fn sort_by_key<K: Ord>(self, key: impl Fn(&Node<D>) -> K + 'a) -> Self {
        self.sort_by(move |a, b| key(a).cmp(&key(b)))
    }

    /// Reverses sibling order after any sorting.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Lazy downward traversal yielding node identifiers.
///
/// Each call to [`Tree::expand_tree`] produces an independent walk; the
/// iterator borrows the tree, so the registry cannot be mutated while a
/// walk is alive.
pub struct ExpandTree<'a, D> {
    tree: &'a Tree<D>,
    mode: TraversalMode,
    opts: TraversalOpts<'a, D>,
    /// Work list for Depth/Width
    queue: VecDeque<NodeId>,
    /// ZigZag: current level in left-to-right order
    level: Vec<NodeId>,
    /// ZigZag: emission order for the current level
    emit: VecDeque<NodeId>,
    /// ZigZag: current level runs right-to-left
    rtl: bool,
}

impl<'a, D> ExpandTree<'a, D> {
    pub(crate) fn new(
        tree: &'a Tree<D>,
        start: Option<NodeId>,
        mode: TraversalMode,
        opts: TraversalOpts<'a, D>,
    ) -> Self {
        let mut walk = Self {
            tree,
            mode,
            opts,
            queue: VecDeque::new(),
            level: Vec::new(),
            emit: VecDeque::new(),
            rtl: false,
        };
        // A start node failing the prune filter empties the whole walk.
        if let Some(start) = start {
            if walk.admits(&start) {
                match mode {
                    TraversalMode::Depth | TraversalMode::Width => walk.queue.push_back(start),
                    TraversalMode::ZigZag => {
                        walk.level.push(start.clone());
                        walk.emit.push_back(start);
                    }
                }
            }
        }
        walk
    }

    fn admits(&self, nid: &str) -> bool {
        match &self.opts.filter {
            Some(filter) => self
                .tree
                .get_node(nid)
                .is_some_and(|node| filter(&node.borrow())),
            None => true,
        }
    }

    fn visible_children(&self, nid: &str) -> Vec<NodeId> {
        self.tree.select_children(
            nid,
            self.opts.filter.as_deref(),
            self.opts.compare.as_deref(),
            self.opts.reverse,
        )
    }
}

impl<D> Iterator for ExpandTree<'_, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode {
            TraversalMode::Depth => {
                let current = self.queue.pop_front()?;
                for child in self.visible_children(&current).into_iter().rev() {
                    self.queue.push_front(child);
                }
                Some(current)
            }
            TraversalMode::Width => {
                let current = self.queue.pop_front()?;
                self.queue.extend(self.visible_children(&current));
                Some(current)
            }
            TraversalMode::ZigZag => {
                if self.emit.is_empty() {
                    // Advance one level; children are gathered from the
                    // left-to-right order, only the emission flips.
                    let mut next = Vec::new();
                    for nid in &self.level {
                        next.extend(self.visible_children(nid));
                    }
                    if next.is_empty() {
                        return None;
                    }
                    self.rtl = !self.rtl;
                    self.emit = if self.rtl {
                        next.iter().rev().cloned().collect()
                    } else {
                        next.iter().cloned().collect()
                    };
                    self.level = next;
                }
                self.emit.pop_front()
            }
        }
    }
}

/// Lazy upward traversal from a node to the root, both inclusive.
pub struct Ancestors<'a, D> {
    tree: &'a Tree<D>,
    current: Option<NodeId>,
    filter: Option<NodeFilter<'a, D>>,
}

impl<'a, D> Ancestors<'a, D> {
    pub(crate) fn new(tree: &'a Tree<D>, start: NodeId, filter: Option<NodeFilter<'a, D>>) -> Self {
        Self {
            tree,
            current: Some(start),
            filter,
        }
    }
}

impl<D> Iterator for Ancestors<'_, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.current.take()?;
            self.current = if self.tree.root() == Some(current.as_str()) {
                None
            } else {
                self.tree
                    .get_node(&current)
                    .and_then(|node| node.borrow().parent(self.tree.identifier()).cloned())
            };
            let include = match &self.filter {
                Some(filter) => self
                    .tree
                    .get_node(&current)
                    .is_some_and(|node| filter(&node.borrow())),
                None => true,
            };
            if include {
                return Some(current);
            }
        }
    }
}
