#![forbid(unsafe_code)]

//! Ingroup designation: the state transition marking the focal clade of a
//! tree. Replaces any prior marking in full, so re-invocation with the same
//! node is a no-op in effect.

use super::graph::{ensure_node_exists, remove_prop_tx, set_prop_tx};
use super::traverse::{descendants_inclusive, root_of_tree_containing, tree_nodes};
use super::{NodeId, SqliteStore, StoreError};
use rusqlite::Transaction;
use td_core::properties::{PropertyValue, keys};

impl SqliteStore {
    /// Designate the clade rooted at `node` as the ingroup of its tree.
    pub fn designate_ingroup(&mut self, node: NodeId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        ensure_node_exists(&tx, node.as_i64())?;
        designate_ingroup_tx(&tx, node.as_i64())?;
        tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn designate_ingroup_tx(
    tx: &Transaction<'_>,
    node: i64,
) -> Result<(), StoreError> {
    let root = root_of_tree_containing(tx, node)?;

    for member in tree_nodes(tx, root)? {
        remove_prop_tx(tx, member, keys::WITHIN_INGROUP)?;
    }
    for member in descendants_inclusive(tx, node)? {
        set_prop_tx(tx, member, keys::WITHIN_INGROUP, &PropertyValue::Bool(true))?;
    }
    set_prop_tx(tx, root, keys::INGROUP_IS_SET, &PropertyValue::Bool(true))?;
    set_prop_tx(tx, root, keys::INGROUP_NODE_ID, &PropertyValue::Int(node))?;
    Ok(())
}
