#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use td_core::catalog::EntityKind;
use td_core::ids::StudyId;
use td_core::properties::{PropertyValue, keys};
use td_core::source::{SourceNode, SourceOtu, SourceStudy, SourceTree};
use td_storage::{NodeId, SearchOptions, SqliteStore, StoreError};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("td_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn tip(label: &str) -> SourceNode {
    SourceNode {
        properties: Vec::new(),
        otu: Some(SourceOtu {
            label: label.to_string(),
            original_label: Some(label.to_string()),
            mapped_id: None,
            properties: Vec::new(),
        }),
        branch_length: None,
        ingroup_marker: false,
        children: Vec::new(),
    }
}

fn labeled_clade(label: &str, ingroup_marker: bool, children: Vec<SourceNode>) -> SourceNode {
    SourceNode {
        properties: vec![(
            keys::NODE_LABEL.to_string(),
            Some(PropertyValue::text(label)),
        )],
        otu: None,
        branch_length: None,
        ingroup_marker,
        children,
    }
}

fn one_tree_study(id: &str, root: SourceNode) -> SourceStudy {
    SourceStudy {
        study_id: StudyId::try_new(id).expect("study id"),
        deprecated: false,
        properties: Vec::new(),
        trees: vec![Some(SourceTree {
            local_id: "tree1".to_string(),
            deprecated: false,
            properties: Vec::new(),
            root,
        })],
    }
}

fn node_by_label(store: &SqliteStore, label: &str) -> NodeId {
    let results = store
        .search(
            EntityKind::TreeNode,
            &[keys::NODE_LABEL],
            label,
            SearchOptions::default(),
        )
        .expect("search by label");
    results.studies[0].trees[0].nodes[0].node
}

fn member_set(store: &SqliteStore, root: NodeId) -> BTreeSet<NodeId> {
    store
        .ingroup_member_ids(root)
        .expect("ingroup members")
        .into_iter()
        .collect()
}

#[test]
fn source_marker_designates_ingroup_at_import() {
    let storage_dir = temp_dir("source_marker_designates_ingroup_at_import");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let handle = store
        .add_or_replace_study(&one_tree_study(
            "pg_20",
            labeled_clade(
                "whole",
                false,
                vec![
                    tip("outgroup"),
                    labeled_clade("focal", true, vec![tip("b"), tip("c")]),
                ],
            ),
        ))
        .expect("import study");

    let root = handle.tree_roots[0];
    assert_eq!(
        store
            .node_property(root, keys::INGROUP_IS_SET)
            .expect("property"),
        Some(PropertyValue::Bool(true))
    );
    // the focal clade plus its two tips
    assert_eq!(member_set(&store, root).len(), 3);
}

#[test]
fn designation_is_idempotent_and_replaceable() {
    let storage_dir = temp_dir("designation_is_idempotent_and_replaceable");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let handle = store
        .add_or_replace_study(&one_tree_study(
            "pg_21",
            labeled_clade(
                "whole",
                false,
                vec![
                    tip("outgroup"),
                    labeled_clade("focal", false, vec![tip("b"), tip("c")]),
                ],
            ),
        ))
        .expect("import study");
    let root = handle.tree_roots[0];
    assert!(member_set(&store, root).is_empty());

    let focal = node_by_label(&store, "focal");
    store.designate_ingroup(focal).expect("designate");
    let first = member_set(&store, root);
    assert_eq!(first.len(), 3);

    store.designate_ingroup(focal).expect("designate again");
    assert_eq!(member_set(&store, root), first);

    // a different node fully replaces the prior marking
    let outgroup = node_by_label(&store, "outgroup");
    store.designate_ingroup(outgroup).expect("redesignate");
    let replaced = member_set(&store, root);
    assert_eq!(replaced.len(), 1);
    assert!(replaced.contains(&outgroup));
    assert!(!replaced.contains(&focal));
    assert_eq!(
        store
            .node_property(root, keys::INGROUP_NODE_ID)
            .expect("property"),
        Some(PropertyValue::Int(outgroup.as_i64()))
    );
}

#[test]
fn designation_outside_a_tree_is_store_corruption() {
    let storage_dir = temp_dir("designation_outside_a_tree_is_store_corruption");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let handle = store
        .add_or_replace_study(&one_tree_study(
            "pg_22",
            labeled_clade("whole", false, vec![tip("a"), tip("b")]),
        ))
        .expect("import study");

    // a study node has no parent edge and no root flag
    let err = store.designate_ingroup(handle.node).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}
