#![forbid(unsafe_code)]

//! Taxonomy linking. Taxonomy nodes live in the same graph (installed by an
//! external bulk loader through `add_taxon`); tips point at their mapped
//! taxon through a single replaceable `exemplar_of` edge.

use super::graph::{
    MODE_EXACT, REL_EXEMPLAR_OF, REL_PREFERRED_PARENT, TAXONOMY_DOMAIN, create_edge_tx,
    create_node_tx, delete_edges_from_tx, edge_target, ensure_node_exists, get_prop,
    index_add_tx, index_get_exact, set_prop_tx,
};
use super::{NodeId, SqliteStore, StoreError};
use rusqlite::{Connection, Transaction};
use td_core::properties::{PropertyValue, keys};

const MAX_TAXONOMY_DEPTH: usize = 512;

impl SqliteStore {
    /// Install one taxonomy node. The hook the out-of-scope bulk loader (and
    /// the tests) build the reference taxonomy with.
    pub fn add_taxon(
        &mut self,
        taxon_id: i64,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, StoreError> {
        let tx = self.conn.transaction()?;
        if let Some(parent) = parent {
            ensure_node_exists(&tx, parent.as_i64())?;
        }
        let node = create_node_tx(&tx)?;
        set_prop_tx(&tx, node, keys::TAXON_ID, &PropertyValue::Int(taxon_id))?;
        set_prop_tx(&tx, node, keys::TAXON_NAME, &PropertyValue::text(name))?;
        if let Some(parent) = parent {
            create_edge_tx(&tx, node, REL_PREFERRED_PARENT, parent.as_i64())?;
        }
        index_add_tx(
            &tx,
            TAXONOMY_DOMAIN,
            MODE_EXACT,
            node,
            keys::TAXON_ID,
            &taxon_id.to_string(),
        )?;
        tx.commit()?;
        Ok(NodeId(node))
    }

    /// Link a tree node to the taxonomy node its mapped taxon id resolves to.
    /// No-op when the node is unmapped or the taxon is not loaded.
    pub fn connect_to_taxonomy(&mut self, node: NodeId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        ensure_node_exists(&tx, node.as_i64())?;
        connect_to_taxonomy_tx(&tx, node.as_i64())?;
        tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn connect_to_taxonomy_tx(
    tx: &Transaction<'_>,
    node: i64,
) -> Result<(), StoreError> {
    let Some(mapped_id) = get_prop(tx, node, keys::MAPPED_ID)?.and_then(|v| v.as_int()) else {
        return Ok(());
    };
    let Some(taxon) = taxon_by_id(tx, mapped_id)? else {
        return Ok(());
    };
    // at most one exemplar link per node at all times
    delete_edges_from_tx(tx, node, REL_EXEMPLAR_OF)?;
    create_edge_tx(tx, node, REL_EXEMPLAR_OF, taxon)?;
    Ok(())
}

pub(in crate::store) fn taxon_by_id(
    conn: &Connection,
    taxon_id: i64,
) -> Result<Option<i64>, StoreError> {
    Ok(index_get_exact(conn, TAXONOMY_DOMAIN, keys::TAXON_ID, &taxon_id.to_string())?
        .into_iter()
        .next())
}

/// The ancestor chain of a taxonomy node via `preferred_parent`, nearest
/// first, the node itself excluded.
pub(in crate::store) fn taxon_ancestors(
    conn: &Connection,
    taxon: i64,
) -> Result<Vec<i64>, StoreError> {
    let mut ancestors = Vec::new();
    let mut current = taxon;
    while let Some(parent) = edge_target(conn, current, REL_PREFERRED_PARENT)? {
        ancestors.push(parent);
        current = parent;
        if ancestors.len() > MAX_TAXONOMY_DEPTH {
            return Err(StoreError::Corrupt(
                "taxonomy preferred-parent chain exceeds depth bound",
            ));
        }
    }
    Ok(ancestors)
}
