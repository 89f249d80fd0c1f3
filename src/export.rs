//! Dictionary and JSON export.
//!
//! Builds the nested mapping shape of the original treelib format via a
//! depth-first walk: an internal node becomes `{tag: {"children": [...]}}`,
//! a leaf collapses to its bare tag string (or `{tag: {"data": ...}}` when
//! payload export is requested). The payload must be `Serialize`; lossy
//! payload serialization is the caller's concern.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{TreeError, TreeResult};
use crate::node::{Node, NodeId};
use crate::traversal::NodeCompare;
use crate::tree::Tree;

/// Options for [`Tree::to_dict_with`] / [`Tree::to_json_with`]: sibling
/// ordering, reversal, and payload inclusion.
pub struct DictOpts<'a, D> {
    pub(crate) compare: Option<NodeCompare<'a, D>>,
    pub(crate) reverse: bool,
    pub(crate) with_data: bool,
}

impl<D> Default for DictOpts<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, D> DictOpts<'a, D> {
    pub fn new() -> Self {
        Self {
            compare: None,
            reverse: false,
            with_data: false,
        }
    }

    /// Orders siblings with the given comparator (stable).
    pub fn sort_by(mut self, compare: impl Fn(&Node<D>, &Node<D>) -> std::cmp::Ordering + 'a) -> Self {
        self.compare = Some(Box::new(compare));
        self
    }

    /// Orders siblings by a key extracted from each node.
    pub fn sort_by_key<K: Ord>(self, key: impl Fn(&Node<D>) -> K + 'a) -> Self {
        self.sort_by(move |a, b| key(a).cmp(&key(b)))
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Includes each node's payload under a `data` key.
    pub fn with_data(mut self, with_data: bool) -> Self {
        self.with_data = with_data;
        self
    }
}

impl<D: Serialize> Tree<D> {
    /// Nested mapping of the subtree rooted at `start` (default: root),
    /// structure only. An empty tree yields an empty object.
    pub fn to_dict(&self, start: Option<&str>) -> TreeResult<Value> {
        self.to_dict_with(start, DictOpts::new())
    }

    /// [`Tree::to_dict`] with sibling ordering and payload inclusion.
    pub fn to_dict_with(&self, start: Option<&str>, opts: DictOpts<'_, D>) -> TreeResult<Value> {
        let start = match start {
            Some(nid) => {
                if !self.contains(nid) {
                    return Err(TreeError::NodeNotFound(nid.to_string()));
                }
                nid.to_string()
            }
            None => match self.root() {
                Some(root) => root.to_string(),
                None => return Ok(Value::Object(Map::new())),
            },
        };
        self.dict_value(&start, &opts)
    }

    /// JSON string of [`Tree::to_dict`]; round-trips structurally.
    pub fn to_json(&self, start: Option<&str>) -> TreeResult<String> {
        self.to_json_with(start, DictOpts::new())
    }

    pub fn to_json_with(&self, start: Option<&str>, opts: DictOpts<'_, D>) -> TreeResult<String> {
        let dict = self.to_dict_with(start, opts)?;
        Ok(serde_json::to_string(&dict)?)
    }

    fn dict_value(&self, nid: &str, opts: &DictOpts<'_, D>) -> TreeResult<Value> {
        let node = self.get(nid)?;
        let node = node.borrow();
        let tag = node.tag().to_string();

        // An unexpanded node exports as a leaf, children elided.
        let child_ids: Vec<NodeId> = if node.expanded {
            self.select_children(nid, None, opts.compare.as_deref(), opts.reverse)
        } else {
            Vec::new()
        };

        if child_ids.is_empty() {
            if opts.with_data {
                let mut inner = Map::new();
                inner.insert("data".to_string(), serde_json::to_value(&node.data)?);
                let mut outer = Map::new();
                outer.insert(tag, Value::Object(inner));
                return Ok(Value::Object(outer));
            }
            return Ok(Value::String(tag));
        }

        let mut children = Vec::with_capacity(child_ids.len());
        for cid in &child_ids {
            children.push(self.dict_value(cid, opts)?);
        }
        let mut inner = Map::new();
        inner.insert("children".to_string(), Value::Array(children));
        if opts.with_data {
            inner.insert("data".to_string(), serde_json::to_value(&node.data)?);
        }
        let mut outer = Map::new();
        outer.insert(tag, Value::Object(inner));
        Ok(Value::Object(outer))
    }
}
