#![forbid(unsafe_code)]

//! Multi-index search. Exact lookups hit the exact index verbatim; fulltext
//! lookups scan the tokenized index for the queried keys and keep candidates
//! within the length-scaled edit-distance budget.

use super::graph::{get_prop, index_fulltext_candidates, index_get_exact};
use super::traverse::{root_of_tree_containing, study_of_root};
use super::types::{NodeMatch, SearchOptions, SearchResults, StudyMatch, TreeMatch};
use super::{NodeId, SqliteStore, StoreError};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use td_core::catalog::{EntityKind, IndexRule};
use td_core::fuzzy::{max_edit_distance, normalize_query, within_distance};
use td_core::properties::{PropertyValue, keys};

impl SqliteStore {
    /// Search one entity kind across one or more of its public properties.
    /// Unknown property names are a caller error reported by name; a query
    /// that would touch no index at all (every named property excluded from
    /// exact matching, fulltext not requested or not available) is rejected
    /// rather than silently returning nothing.
    pub fn search(
        &self,
        kind: EntityKind,
        properties: &[&str],
        value: &str,
        opts: SearchOptions,
    ) -> Result<SearchResults, StoreError> {
        let mut rules: Vec<&IndexRule> = Vec::with_capacity(properties.len());
        for name in properties {
            match self.catalog.rule(kind, name) {
                Some(rule) => rules.push(rule),
                None => {
                    return Err(StoreError::UnrecognizedProperty {
                        name: (*name).to_string(),
                    });
                }
            }
        }

        let exact_keys: Vec<&str> = rules
            .iter()
            .filter(|r| r.exact)
            .map(|r| r.public_key)
            .collect();
        let fulltext_keys: Vec<&str> = if opts.fulltext {
            rules
                .iter()
                .filter(|r| r.fulltext)
                .map(|r| r.public_key)
                .collect()
        } else {
            Vec::new()
        };
        if exact_keys.is_empty() && fulltext_keys.is_empty() {
            return Err(StoreError::InvalidInput(
                "search must touch at least one index",
            ));
        }

        let mut hits = BTreeSet::new();
        for key in &exact_keys {
            for node in index_get_exact(&self.conn, kind.as_str(), key, value)? {
                hits.insert(node);
            }
        }
        if !fulltext_keys.is_empty() {
            let query = normalize_query(value);
            let budget = max_edit_distance(&query);
            for (node, entry) in
                index_fulltext_candidates(&self.conn, kind.as_str(), &fulltext_keys)?
            {
                if within_distance(&query, &entry, budget) {
                    hits.insert(node);
                }
            }
        }

        self.assemble(kind, &hits, opts)
    }

    /// Group raw node hits into the study/tree/node hierarchy and read the
    /// identifying (and, verbosely, all indexed scalar) properties back out
    /// of the graph.
    fn assemble(
        &self,
        kind: EntityKind,
        hits: &BTreeSet<i64>,
        opts: SearchOptions,
    ) -> Result<SearchResults, StoreError> {
        // study node -> tree root -> matched tree nodes
        let mut grouped: BTreeMap<i64, BTreeMap<i64, BTreeSet<i64>>> = BTreeMap::new();
        for &hit in hits {
            match kind {
                EntityKind::Study => {
                    grouped.entry(hit).or_default();
                }
                EntityKind::Tree => {
                    let study = study_of_root(&self.conn, hit)?;
                    grouped.entry(study).or_default().entry(hit).or_default();
                }
                EntityKind::TreeNode => {
                    let root = root_of_tree_containing(&self.conn, hit)?;
                    let study = study_of_root(&self.conn, root)?;
                    grouped
                        .entry(study)
                        .or_default()
                        .entry(root)
                        .or_default()
                        .insert(hit);
                }
            }
        }

        let mut studies = Vec::with_capacity(grouped.len());
        for (study, trees) in grouped {
            let study_id = required_text(&self.conn, study, keys::STUDY_ID)?;
            let mut tree_matches = Vec::with_capacity(trees.len());
            for (root, nodes) in trees {
                let tree_id = required_text(&self.conn, root, keys::TREE_ID)?;
                let mut node_matches = Vec::with_capacity(nodes.len());
                for node in nodes {
                    node_matches.push(NodeMatch {
                        node: NodeId(node),
                        properties: self.projected(node, EntityKind::TreeNode, opts)?,
                    });
                }
                tree_matches.push(TreeMatch {
                    tree_id,
                    root: NodeId(root),
                    properties: self.projected(root, EntityKind::Tree, opts)?,
                    nodes: node_matches,
                });
            }
            studies.push(StudyMatch {
                study_id,
                properties: self.projected(study, EntityKind::Study, opts)?,
                trees: tree_matches,
            });
        }
        Ok(SearchResults { studies })
    }

    fn projected(
        &self,
        node: i64,
        kind: EntityKind,
        opts: SearchOptions,
    ) -> Result<Vec<(String, PropertyValue)>, StoreError> {
        if !opts.verbose {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for rule in self.catalog.scalar_rules(kind) {
            if let Some(value) = get_prop(&self.conn, node, rule.stored_key)? {
                out.push((rule.public_key.to_string(), value));
            }
        }
        Ok(out)
    }
}

fn required_text(conn: &Connection, node: i64, key: &str) -> Result<String, StoreError> {
    match get_prop(conn, node, key)? {
        Some(PropertyValue::Text(text)) => Ok(text),
        _ => Err(StoreError::Corrupt("indexed entity is missing its id property")),
    }
}
