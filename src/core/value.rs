//! Purpose: Nested string tree produced by decoding dotted key/value replies.
//! Exports: `Node`, `ResultTree`.
//! Role: Owned result structure returned to callers; leaves hold verbatim values.
//! Invariants: A key holds either a leaf or a subtree, never both at once.
//! Invariants: Trees own their children exclusively; no sharing, no cycles.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::btree_map;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Leaf(String),
    Tree(ResultTree),
}

impl Node {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value),
            Node::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ResultTree> {
        match self {
            Node::Leaf(_) => None,
            Node::Tree(tree) => Some(tree),
        }
    }
}

/// Mapping from key to leaf value or subtree. Children are stored in a
/// `BTreeMap`, so iteration order is lexicographic and deterministic.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultTree {
    children: BTreeMap<String, Node>,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    /// Leaf value under `key`, or `None` when absent or a subtree.
    pub fn leaf(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_leaf)
    }

    /// Subtree under `key`, or `None` when absent or a leaf.
    pub fn subtree(&self, key: &str) -> Option<&ResultTree> {
        self.get(key).and_then(Node::as_tree)
    }

    /// Walk a nesting path segment by segment.
    pub fn at_path(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let node = self.get(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_tree()?.at_path(rest)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        self.children.insert(key.into(), node);
    }

    pub(crate) fn entry(&mut self, key: String) -> btree_map::Entry<'_, String, Node> {
        self.children.entry(key)
    }

    /// Lossless view for machine output: leaves become JSON strings.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, node) in self.iter() {
            let value = match node {
                Node::Leaf(text) => Value::String(text.clone()),
                Node::Tree(tree) => tree.to_json(),
            };
            map.insert(key.to_string(), value);
        }
        Value::Object(map)
    }
}

impl IntoIterator for ResultTree {
    type Item = (String, Node);
    type IntoIter = btree_map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}
