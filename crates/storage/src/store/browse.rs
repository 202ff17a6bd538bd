#![forbid(unsafe_code)]

//! Read-side browse surface for the service layer's listing endpoints (and
//! the tests). Plain reads against the graph and the indexes; no
//! transactions.

use super::graph::{self, REL_EXEMPLAR_OF};
use super::traverse::{descendant_tips, tree_nodes};
use super::{NodeId, SqliteStore, StoreError};
use td_core::catalog::{EntityKind, MatchMode};
use td_core::properties::{PropertyValue, keys};

impl SqliteStore {
    /// Ids of every study in the store, sorted.
    pub fn study_ids(&self) -> Result<Vec<String>, StoreError> {
        graph::index_distinct_values(&self.conn, EntityKind::Study.as_str(), keys::STUDY_ID)
    }

    pub fn study_node_for_id(&self, study_id: &str) -> Result<Option<NodeId>, StoreError> {
        Ok(graph::index_get_exact(
            &self.conn,
            EntityKind::Study.as_str(),
            keys::STUDY_ID,
            study_id,
        )?
        .into_iter()
        .next()
        .map(NodeId))
    }

    /// Ids of the trees a study contains, sorted.
    pub fn tree_ids_for_study(&self, study_id: &str) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for root in graph::index_get_exact(
            &self.conn,
            EntityKind::Tree.as_str(),
            keys::STUDY_ID,
            study_id,
        )? {
            if let Some(PropertyValue::Text(tree_id)) =
                graph::get_prop(&self.conn, root, keys::TREE_ID)?
            {
                out.push(tree_id);
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn tree_root_for_tree_id(&self, tree_id: &str) -> Result<Option<NodeId>, StoreError> {
        Ok(graph::index_get_exact(
            &self.conn,
            EntityKind::Tree.as_str(),
            keys::TREE_ID,
            tree_id,
        )?
        .into_iter()
        .next()
        .map(NodeId))
    }

    /// Every node of the tree rooted at `root`, root inclusive, in
    /// breadth-first order.
    pub fn tree_node_ids(&self, root: NodeId) -> Result<Vec<NodeId>, StoreError> {
        graph::ensure_node_exists(&self.conn, root.as_i64())?;
        Ok(tree_nodes(&self.conn, root.as_i64())?
            .into_iter()
            .map(NodeId)
            .collect())
    }

    pub fn tip_ids(&self, root: NodeId) -> Result<Vec<NodeId>, StoreError> {
        graph::ensure_node_exists(&self.conn, root.as_i64())?;
        Ok(descendant_tips(&self.conn, root.as_i64())?
            .into_iter()
            .map(NodeId)
            .collect())
    }

    /// The nodes of a tree currently flagged as within the ingroup.
    pub fn ingroup_member_ids(&self, root: NodeId) -> Result<Vec<NodeId>, StoreError> {
        graph::ensure_node_exists(&self.conn, root.as_i64())?;
        let mut out = Vec::new();
        for member in tree_nodes(&self.conn, root.as_i64())? {
            if graph::has_prop(&self.conn, member, keys::WITHIN_INGROUP)? {
                out.push(NodeId(member));
            }
        }
        Ok(out)
    }

    /// The taxonomy node a tip's exemplar link points at, when linked.
    pub fn exemplar_target(&self, node: NodeId) -> Result<Option<NodeId>, StoreError> {
        graph::ensure_node_exists(&self.conn, node.as_i64())?;
        Ok(graph::edge_target(&self.conn, node.as_i64(), REL_EXEMPLAR_OF)?.map(NodeId))
    }

    /// All exemplar links leaving a node. The importer keeps this at most
    /// one; the plural read exists so callers can verify that.
    pub fn exemplar_targets(&self, node: NodeId) -> Result<Vec<NodeId>, StoreError> {
        graph::ensure_node_exists(&self.conn, node.as_i64())?;
        Ok(graph::edge_targets(&self.conn, node.as_i64(), REL_EXEMPLAR_OF)?
            .into_iter()
            .map(NodeId)
            .collect())
    }

    pub fn node_property(
        &self,
        node: NodeId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError> {
        graph::ensure_node_exists(&self.conn, node.as_i64())?;
        graph::get_prop(&self.conn, node.as_i64(), key)
    }

    pub fn node_count(&self) -> Result<i64, StoreError> {
        graph::node_count(&self.conn)
    }

    pub fn index_entry_count(&self, kind: EntityKind, mode: MatchMode) -> Result<i64, StoreError> {
        graph::index_entry_count(&self.conn, kind.as_str(), mode.as_str())
    }
}
