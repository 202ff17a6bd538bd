#![forbid(unsafe_code)]

//! Cascade deletion. Index removal precedes structural deletion because
//! index removal is defined per node-still-present; relationship deletion
//! precedes node deletion for the same reason.

use super::graph::{
    REL_CONTAINS, delete_edges_touching_tx, delete_node_tx, edge_targets, ensure_node_exists,
    has_prop,
};
use super::indexing::remove_from_indexes_tx;
use super::traverse::tree_nodes;
use super::{NodeId, SqliteStore, StoreError};
use rusqlite::Transaction;
use td_core::catalog::EntityKind;
use td_core::properties::keys;

impl SqliteStore {
    /// Delete one tree: the root, every node under it, their relationships,
    /// and all their index entries.
    pub fn delete_tree(&mut self, root: NodeId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        ensure_node_exists(&tx, root.as_i64())?;
        if !has_prop(&tx, root.as_i64(), keys::IS_ROOT)? {
            return Err(StoreError::InvalidInput("node is not a tree root"));
        }
        delete_tree_tx(&tx, root.as_i64())?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a study and cascade over every tree it contains.
    pub fn delete_study(&mut self, study: NodeId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        ensure_node_exists(&tx, study.as_i64())?;
        if !has_prop(&tx, study.as_i64(), keys::IS_STUDY)? {
            return Err(StoreError::InvalidInput("node is not a study"));
        }
        delete_study_tx(&tx, study.as_i64())?;
        tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn delete_tree_tx(tx: &Transaction<'_>, root: i64) -> Result<(), StoreError> {
    remove_from_indexes_tx(tx, root, EntityKind::Tree)?;

    let members = tree_nodes(tx, root)?;
    for member in &members {
        remove_from_indexes_tx(tx, *member, EntityKind::TreeNode)?;
    }
    for member in &members {
        delete_edges_touching_tx(tx, *member)?;
        delete_node_tx(tx, *member)?;
    }
    Ok(())
}

pub(in crate::store) fn delete_study_tx(
    tx: &Transaction<'_>,
    study: i64,
) -> Result<(), StoreError> {
    remove_from_indexes_tx(tx, study, EntityKind::Study)?;

    // deleting a tree also removes the contains edge pointing at its root
    for root in edge_targets(tx, study, REL_CONTAINS)? {
        delete_tree_tx(tx, root)?;
    }

    delete_edges_touching_tx(tx, study)?;
    delete_node_tx(tx, study)?;
    Ok(())
}
