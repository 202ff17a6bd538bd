#![forbid(unsafe_code)]

//! Shared tree traversals. Trees store only child→parent edges; children are
//! derived from the reverse adjacency, which is also exactly how cascade
//! deletion walks a tree.

use super::StoreError;
use super::graph::{REL_CHILD_OF, REL_CONTAINS, edge_source, edge_sources, edge_target, has_prop};
use rusqlite::Connection;
use std::collections::BTreeSet;
use td_core::properties::keys;

pub(in crate::store) fn parent_of(
    conn: &Connection,
    node: i64,
) -> Result<Option<i64>, StoreError> {
    edge_target(conn, node, REL_CHILD_OF)
}

pub(in crate::store) fn children_of(conn: &Connection, node: i64) -> Result<Vec<i64>, StoreError> {
    edge_sources(conn, node, REL_CHILD_OF)
}

/// Walk parent edges upward until the node flagged `is_root`. Failing to
/// reach one is store corruption, not a recoverable condition.
pub(in crate::store) fn root_of_tree_containing(
    conn: &Connection,
    node: i64,
) -> Result<i64, StoreError> {
    let mut seen = BTreeSet::new();
    let mut current = node;
    loop {
        if !seen.insert(current) {
            return Err(StoreError::Corrupt("cycle in child_of parent walk"));
        }
        match parent_of(conn, current)? {
            Some(parent) => current = parent,
            None => break,
        }
    }
    if has_prop(conn, current, keys::IS_ROOT)? {
        Ok(current)
    } else {
        Err(StoreError::Corrupt("parent walk did not reach a tree root"))
    }
}

/// Breadth-first collection of a node and all its descendants via the
/// reverse adjacency.
pub(in crate::store) fn descendants_inclusive(
    conn: &Connection,
    node: i64,
) -> Result<Vec<i64>, StoreError> {
    let mut out = Vec::new();
    let mut queue = std::collections::VecDeque::from([node]);
    while let Some(current) = queue.pop_front() {
        out.push(current);
        for child in children_of(conn, current)? {
            queue.push_back(child);
        }
    }
    Ok(out)
}

/// Every node of the tree rooted at `root`, root inclusive.
pub(in crate::store) fn tree_nodes(conn: &Connection, root: i64) -> Result<Vec<i64>, StoreError> {
    descendants_inclusive(conn, root)
}

/// The leaf descendants of `node` (nodes with no inbound child edges),
/// `node` itself included when it is a leaf.
pub(in crate::store) fn descendant_tips(
    conn: &Connection,
    node: i64,
) -> Result<Vec<i64>, StoreError> {
    let mut tips = Vec::new();
    for candidate in descendants_inclusive(conn, node)? {
        if children_of(conn, candidate)?.is_empty() {
            tips.push(candidate);
        }
    }
    Ok(tips)
}

/// The study owning a tree root via its single inbound `contains` edge.
pub(in crate::store) fn study_of_root(conn: &Connection, root: i64) -> Result<i64, StoreError> {
    edge_source(conn, root, REL_CONTAINS)?
        .ok_or(StoreError::Corrupt("tree root has no containing study"))
}
