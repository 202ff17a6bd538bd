#![forbid(unsafe_code)]

use std::path::PathBuf;
use td_core::catalog::{EntityKind, MatchMode};
use td_core::ids::StudyId;
use td_core::properties::{PropertyValue, keys};
use td_core::source::{SourceNode, SourceOtu, SourceStudy, SourceTree};
use td_storage::{SearchOptions, SqliteStore};

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

fn tip(label: &str, original: &str, mapped_id: Option<i64>) -> SourceNode {
    SourceNode {
        properties: Vec::new(),
        otu: Some(SourceOtu {
            label: label.to_string(),
            original_label: Some(original.to_string()),
            mapped_id,
            properties: Vec::new(),
        }),
        branch_length: None,
        ingroup_marker: false,
        children: Vec::new(),
    }
}

fn clade(children: Vec<SourceNode>) -> SourceNode {
    SourceNode {
        properties: Vec::new(),
        otu: None,
        branch_length: None,
        ingroup_marker: false,
        children,
    }
}

fn tree(local_id: &str, root: SourceNode) -> SourceTree {
    SourceTree {
        local_id: local_id.to_string(),
        deprecated: false,
        properties: Vec::new(),
        root,
    }
}

fn study(id: &str, trees: Vec<Option<SourceTree>>) -> SourceStudy {
    SourceStudy {
        study_id: StudyId::try_new(id).expect("study id"),
        deprecated: false,
        properties: Vec::new(),
        trees,
    }
}

fn all_index_counts(store: &SqliteStore) -> Vec<i64> {
    let mut counts = Vec::new();
    for kind in [EntityKind::Study, EntityKind::Tree, EntityKind::TreeNode] {
        for mode in [MatchMode::Exact, MatchMode::Fulltext] {
            counts.push(store.index_entry_count(kind, mode).expect("entry count"));
        }
    }
    counts
}

#[test]
fn round_trip_restores_node_and_index_counts() {
    let storage_dir = temp_dir("round_trip_restores_node_and_index_counts");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let mammalia = store.add_taxon(1, "Mammalia", None).expect("add taxon");
    store
        .add_taxon(9, "Homo sapiens", Some(mammalia))
        .expect("add taxon");
    store
        .add_taxon(12, "Pan troglodytes", Some(mammalia))
        .expect("add taxon");

    let nodes_before = store.node_count().expect("node count");
    let entries_before = all_index_counts(&store);

    let handle = store
        .add_or_replace_study(&study(
            "pg_99",
            vec![Some(tree(
                "tree1",
                clade(vec![
                    tip("Homo sapiens", "homo sp", Some(9)),
                    tip("Pan troglodytes", "pan sp", Some(12)),
                    tip("mystery tip", "mystery tip", None),
                ]),
            ))],
        ))
        .expect("import study");

    assert!(store.node_count().expect("node count") > nodes_before);
    assert_ne!(all_index_counts(&store), entries_before);

    store.delete_study(handle.node).expect("delete study");

    assert_eq!(store.node_count().expect("node count"), nodes_before);
    assert_eq!(all_index_counts(&store), entries_before);
    assert!(store.study_ids().expect("study ids").is_empty());
}

#[test]
fn every_tree_has_exactly_one_root() {
    let storage_dir = temp_dir("every_tree_has_exactly_one_root");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let handle = store
        .add_or_replace_study(&study(
            "pg_5",
            vec![Some(tree(
                "tree1",
                clade(vec![
                    tip("a", "a", None),
                    clade(vec![tip("b", "b", None), tip("c", "c", None)]),
                ]),
            ))],
        ))
        .expect("import study");

    let root = handle.tree_roots[0];
    let members = store.tree_node_ids(root).expect("tree nodes");
    assert_eq!(members.len(), 5);

    let mut roots = 0;
    for member in members {
        if store
            .node_property(member, keys::IS_ROOT)
            .expect("property")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            roots += 1;
            assert_eq!(member, root);
        }
    }
    assert_eq!(roots, 1);
}

#[test]
fn aggregates_and_exact_lookup_for_mapped_tips() {
    let storage_dir = temp_dir("aggregates_and_exact_lookup_for_mapped_tips");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let handle = store
        .add_or_replace_study(&study(
            "pg_7",
            vec![Some(tree(
                "tree1",
                clade(vec![
                    tip("Homo sapiens", "labelA", Some(9)),
                    tip("Pan troglodytes", "labelB", Some(12)),
                    tip("unmapped thing", "labelC", None),
                ]),
            ))],
        ))
        .expect("import study");

    let root = handle.tree_roots[0];
    assert_eq!(
        store
            .node_property(root, keys::TIP_MAPPED_IDS)
            .expect("property"),
        Some(PropertyValue::IntArray(vec![9, 12]))
    );
    assert_eq!(
        store
            .node_property(root, keys::TIP_ORIGINAL_LABELS)
            .expect("property"),
        Some(PropertyValue::TextArray(vec![
            "labelA".to_string(),
            "labelB".to_string(),
            "labelC".to_string(),
        ]))
    );
    assert_eq!(
        store
            .node_property(root, keys::TIP_MAPPED_NAMES)
            .expect("property"),
        Some(PropertyValue::TextArray(vec![
            "Homo sapiens".to_string(),
            "Pan troglodytes".to_string(),
        ]))
    );

    let results = store
        .search(
            EntityKind::Tree,
            &[keys::MAPPED_ID],
            "9",
            SearchOptions::default(),
        )
        .expect("search");
    assert_eq!(results.studies.len(), 1);
    assert_eq!(results.studies[0].study_id, "pg_7");
    assert_eq!(results.studies[0].trees.len(), 1);
    assert_eq!(results.studies[0].trees[0].tree_id, "pg_7_tree1");
}

#[test]
fn null_trees_and_null_properties_are_skipped() {
    let storage_dir = temp_dir("null_trees_and_null_properties_are_skipped");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let mut source = study(
        "pg_8",
        vec![
            None,
            Some(tree("tree2", clade(vec![tip("a", "a", None), tip("b", "b", None)]))),
        ],
    );
    source.properties = vec![
        ("comment".to_string(), None),
        (
            "study_label".to_string(),
            Some(PropertyValue::text("felid phylogeny")),
        ),
    ];

    let handle = store.add_or_replace_study(&source).expect("import study");
    assert_eq!(handle.tree_roots.len(), 1);
    assert_eq!(
        store.tree_ids_for_study("pg_8").expect("tree ids"),
        vec!["pg_8_tree2".to_string()]
    );
    assert_eq!(
        store
            .node_property(handle.node, keys::COMMENT)
            .expect("property"),
        None
    );
    assert_eq!(
        store
            .node_property(handle.node, keys::STUDY_LABEL)
            .expect("property"),
        Some(PropertyValue::text("felid phylogeny"))
    );
}
