#![forbid(unsafe_code)]

//! Tree-to-graph import. One transaction per study: upsert-by-id, recursive
//! preorder node creation, taxonomy linking, post-walk ingroup designation,
//! aggregate computation, then indexing.

use super::graph::{
    REL_CHILD_OF, REL_CONTAINS, create_edge_tx, create_node_tx, get_prop, index_get_exact,
    set_prop_tx,
};
use super::indexing::add_to_indexes_tx;
use super::ingroup::designate_ingroup_tx;
use super::lifecycle::delete_study_tx;
use super::taxonomy::{connect_to_taxonomy_tx, taxon_ancestors, taxon_by_id};
use super::traverse::descendant_tips;
use super::{NodeId, SqliteStore, StoreError, StudyHandle};
use rusqlite::Transaction;
use std::collections::BTreeSet;
use td_core::catalog::{EntityKind, PropertyCatalog};
use td_core::ids::TreeId;
use td_core::properties::{PropertyValue, keys};
use td_core::source::{SourceNode, SourceStudy, SourceTree};
use tracing::{debug, warn};

impl SqliteStore {
    /// Install a study and all its trees. A study with the same id is
    /// cascade-deleted first, so re-indexing never accumulates duplicate or
    /// orphaned trees.
    pub fn add_or_replace_study(
        &mut self,
        source: &SourceStudy,
    ) -> Result<StudyHandle, StoreError> {
        let tx = self.conn.transaction()?;

        for existing in index_get_exact(
            &tx,
            EntityKind::Study.as_str(),
            keys::STUDY_ID,
            source.study_id.as_str(),
        )? {
            delete_study_tx(&tx, existing)?;
        }

        let study = create_node_tx(&tx)?;
        set_prop_tx(&tx, study, keys::IS_STUDY, &PropertyValue::Bool(true))?;
        set_prop_tx(
            &tx,
            study,
            keys::STUDY_ID,
            &PropertyValue::text(source.study_id.as_str()),
        )?;
        set_prop_tx(
            &tx,
            study,
            keys::IS_DEPRECATED,
            &PropertyValue::Bool(source.deprecated),
        )?;
        copy_properties_tx(&tx, study, &source.properties)?;

        let mut tree_roots = Vec::new();
        for (position, entry) in source.trees.iter().enumerate() {
            // the upstream reader sometimes emits null trees; skip and go on
            let Some(tree) = entry else {
                warn!(
                    study = source.study_id.as_str(),
                    position, "skipping null tree entry in study source"
                );
                continue;
            };
            let root = add_tree_tx(&tx, &self.catalog, study, source, tree)?;
            tree_roots.push(NodeId(root));
        }

        add_to_indexes_tx(&tx, &self.catalog, study, EntityKind::Study)?;

        tx.commit()?;
        Ok(StudyHandle {
            node: NodeId(study),
            study_id: source.study_id.clone(),
            tree_roots,
        })
    }
}

fn add_tree_tx(
    tx: &Transaction<'_>,
    catalog: &PropertyCatalog,
    study: i64,
    source: &SourceStudy,
    tree: &SourceTree,
) -> Result<i64, StoreError> {
    let tree_id = TreeId::compose(&source.study_id, &tree.local_id)
        .map_err(|_| StoreError::InvalidInput("tree local id must be a valid id string"))?;

    let mut ingroup_start = None;
    let root = import_node_tx(tx, catalog, &tree.root, None, &mut ingroup_start)?;

    // root flag first so upward traversals terminate during the rest of
    // the import
    set_prop_tx(tx, root, keys::IS_ROOT, &PropertyValue::Bool(true))?;
    set_prop_tx(
        tx,
        root,
        keys::IS_DEPRECATED,
        &PropertyValue::Bool(tree.deprecated),
    )?;
    create_edge_tx(tx, study, REL_CONTAINS, root)?;
    set_prop_tx(
        tx,
        root,
        keys::STUDY_ID,
        &PropertyValue::text(source.study_id.as_str()),
    )?;
    set_prop_tx(tx, root, keys::TREE_ID, &PropertyValue::text(tree_id.as_str()))?;
    copy_properties_tx(tx, root, &tree.properties)?;

    if let Some(node) = ingroup_start {
        designate_ingroup_tx(tx, node)?;
    }

    collect_tip_aggregates_tx(tx, root)?;

    // indexing last: the aggregate arrays determine the fan-out
    add_to_indexes_tx(tx, catalog, root, EntityKind::Tree)?;

    Ok(root)
}

/// Recursive preorder replication of the source node structure in the graph.
/// Remembers the first ingroup-root marker seen; designation itself has to
/// wait until the whole tree exists.
fn import_node_tx(
    tx: &Transaction<'_>,
    catalog: &PropertyCatalog,
    source: &SourceNode,
    parent: Option<i64>,
    ingroup_start: &mut Option<i64>,
) -> Result<i64, StoreError> {
    let node = create_node_tx(tx)?;

    if source.ingroup_marker {
        set_prop_tx(tx, node, keys::INGROUP_START, &PropertyValue::Bool(true))?;
        if ingroup_start.is_none() {
            *ingroup_start = Some(node);
        }
    }

    copy_properties_tx(tx, node, &source.properties)?;

    if let Some(otu) = &source.otu {
        set_prop_tx(tx, node, keys::NODE_LABEL, &PropertyValue::text(&otu.label))?;
        if let Some(original) = &otu.original_label {
            set_prop_tx(tx, node, keys::ORIGINAL_LABEL, &PropertyValue::text(original))?;
        }
        // the OTU label is a taxon name only once the tip has been mapped
        if let Some(mapped_id) = otu.mapped_id {
            set_prop_tx(tx, node, keys::MAPPED_NAME, &PropertyValue::text(&otu.label))?;
            set_prop_tx(tx, node, keys::MAPPED_ID, &PropertyValue::Int(mapped_id))?;
        }
        copy_properties_tx(tx, node, &otu.properties)?;
    }

    if let Some(length) = source.branch_length {
        set_prop_tx(
            tx,
            node,
            keys::PARENT_BRANCH_LENGTH,
            &PropertyValue::Float(length),
        )?;
    }

    if let Some(parent) = parent {
        create_edge_tx(tx, node, REL_CHILD_OF, parent)?;
    }

    for child in &source.children {
        import_node_tx(tx, catalog, child, Some(node), ingroup_start)?;
    }

    if source.otu.is_some() {
        connect_to_taxonomy_tx(tx, node)?;
    }

    add_to_indexes_tx(tx, catalog, node, EntityKind::TreeNode)?;

    Ok(node)
}

/// Copy a source property map onto a node. Null values are a tolerated
/// upstream data-quality issue: dropped, not fatal.
fn copy_properties_tx(
    tx: &Transaction<'_>,
    node: i64,
    properties: &[(String, Option<PropertyValue>)],
) -> Result<(), StoreError> {
    for (key, value) in properties {
        match value {
            Some(value) => set_prop_tx(tx, node, key, value)?,
            None => debug!(key = key.as_str(), "dropping null property value from source"),
        }
    }
    Ok(())
}

/// Compute the five denormalized aggregate arrays on a tree root: original
/// tip labels, mapped taxon names and ids, and the compatible-higher-taxon
/// names and ids (taxonomy ancestors of every mapped taxon). These make
/// tree-level search a plain index lookup instead of a per-query traversal.
fn collect_tip_aggregates_tx(tx: &Transaction<'_>, root: i64) -> Result<(), StoreError> {
    let mut original_labels = BTreeSet::new();
    let mut mapped_names = BTreeSet::new();
    let mut mapped_ids = BTreeSet::new();
    let mut higher_names = BTreeSet::new();
    let mut higher_ids = BTreeSet::new();

    for tip in descendant_tips(tx, root)? {
        if let Some(PropertyValue::Text(label)) = get_prop(tx, tip, keys::ORIGINAL_LABEL)? {
            original_labels.insert(label);
        }
        let Some(mapped_id) = get_prop(tx, tip, keys::MAPPED_ID)?.and_then(|v| v.as_int()) else {
            continue;
        };
        mapped_ids.insert(mapped_id);
        if let Some(PropertyValue::Text(name)) = get_prop(tx, tip, keys::MAPPED_NAME)? {
            mapped_names.insert(name);
        }
        if let Some(taxon) = taxon_by_id(tx, mapped_id)? {
            for ancestor in taxon_ancestors(tx, taxon)? {
                if let Some(id) = get_prop(tx, ancestor, keys::TAXON_ID)?.and_then(|v| v.as_int())
                {
                    higher_ids.insert(id);
                }
                if let Some(PropertyValue::Text(name)) =
                    get_prop(tx, ancestor, keys::TAXON_NAME)?
                {
                    higher_names.insert(name);
                }
            }
        }
    }

    set_prop_tx(
        tx,
        root,
        keys::TIP_ORIGINAL_LABELS,
        &PropertyValue::TextArray(original_labels.into_iter().collect()),
    )?;
    set_prop_tx(
        tx,
        root,
        keys::TIP_MAPPED_NAMES,
        &PropertyValue::TextArray(mapped_names.into_iter().collect()),
    )?;
    set_prop_tx(
        tx,
        root,
        keys::TIP_MAPPED_IDS,
        &PropertyValue::IntArray(mapped_ids.into_iter().collect()),
    )?;
    set_prop_tx(
        tx,
        root,
        keys::HIGHER_TAXON_NAMES,
        &PropertyValue::TextArray(higher_names.into_iter().collect()),
    )?;
    set_prop_tx(
        tx,
        root,
        keys::HIGHER_TAXON_IDS,
        &PropertyValue::IntArray(higher_ids.into_iter().collect()),
    )?;
    Ok(())
}
