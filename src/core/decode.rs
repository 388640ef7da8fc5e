//! Purpose: Decode line-oriented dotted key/value reply bodies into a `ResultTree`.
//! Exports: `decode`, `key_value_pairs`.
//! Role: The decoding engine behind every registrar reply body.
//! Invariants: Decoding is total; lines that match no pair are skipped, never fatal.
//! Invariants: Pairs merge in input line order; the later pair wins any conflict,
//! replacing the earlier subtree outright (documented silent-overwrite policy).
//! Invariants: Only the first `": "` splits a line; values pass through verbatim.

use super::value::{Node, ResultTree};

/// Decode a raw reply body into a nested tree.
///
/// An explicit fold: start from an empty tree, build a single-branch tree
/// per pair, deep-merge it in. The result is a function of line order.
pub fn decode(body: &str) -> ResultTree {
    let mut tree = ResultTree::new();
    for (key, value) in key_value_pairs(body) {
        merge(&mut tree, single_branch(key, value));
    }
    tree
}

/// Recognized `key: value` pairs in line order. Keys contain no whitespace;
/// duplicates are preserved for the merge fold to resolve.
pub fn key_value_pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.lines().filter_map(split_pair)
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(": ")?;
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return None;
    }
    Some((key, value))
}

/// One pair as a single-path tree: the leaf keyed by the last segment,
/// wrapped outward by the remaining segments in reverse.
fn single_branch(key: &str, value: &str) -> ResultTree {
    let mut segments: Vec<&str> = key.split('.').collect();
    let leaf_name = segments.pop().unwrap_or(key);
    let mut tree = ResultTree::new();
    tree.insert(leaf_name, Node::Leaf(value.to_string()));
    for segment in segments.into_iter().rev() {
        let mut wrap = ResultTree::new();
        wrap.insert(segment, Node::Tree(tree));
        tree = wrap;
    }
    tree
}

/// Deep-merge `incoming` into `into`. Two subtrees merge recursively; every
/// other combination at a key is resolved by replacement with the incoming
/// node (last write wins, including leaf-vs-subtree structural conflicts).
fn merge(into: &mut ResultTree, incoming: ResultTree) {
    use std::collections::btree_map::Entry;
    for (key, node) in incoming {
        match into.entry(key) {
            Entry::Occupied(mut occupied) => match (occupied.get_mut(), node) {
                (Node::Tree(existing), Node::Tree(new)) => merge(existing, new),
                (slot, new) => *slot = new,
            },
            Entry::Vacant(vacant) => {
                vacant.insert(node);
            }
        }
    }
}
