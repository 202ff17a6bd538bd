#![forbid(unsafe_code)]

use crate::properties::keys;

/// The three searchable entity kinds. Each kind owns one exact and one
/// fulltext index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Study,
    Tree,
    TreeNode,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Tree => "tree",
            Self::TreeNode => "tree_node",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchMode {
    Exact,
    Fulltext,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fulltext => "fulltext",
        }
    }
}

/// Whether a rule indexes a single stored scalar or fans out over a stored
/// array, one index entry per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    Array,
}

/// One row of the classification table: which stored property backs a public
/// search key for an entity kind, and which match modes apply to it.
#[derive(Clone, Debug)]
pub struct IndexRule {
    pub kind: EntityKind,
    /// Key under which entries land in the indexes and by which callers search.
    pub public_key: &'static str,
    /// Property on the graph node that holds the value (differs from the
    /// public key only for the aggregate arrays on tree roots).
    pub stored_key: &'static str,
    pub shape: ValueShape,
    pub exact: bool,
    pub fulltext: bool,
}

/// The complete classification table consulted by both the indexer and the
/// query engine. Built once when the store opens and passed by reference;
/// holds no mutable state.
#[derive(Debug)]
pub struct PropertyCatalog {
    rules: Vec<IndexRule>,
}

impl PropertyCatalog {
    pub fn standard() -> Self {
        let mut rules = Vec::new();

        // study metadata
        scalar(&mut rules, EntityKind::Study, keys::STUDY_ID, true, false);
        scalar(&mut rules, EntityKind::Study, keys::CURATOR_NAME, true, true);
        scalar(&mut rules, EntityKind::Study, keys::PUBLICATION_REF, true, true);
        scalar(&mut rules, EntityKind::Study, keys::STUDY_PUBLICATION, true, false);
        scalar(&mut rules, EntityKind::Study, keys::DATA_DEPOSIT, true, false);
        scalar(&mut rules, EntityKind::Study, keys::STUDY_LABEL, true, true);
        scalar(&mut rules, EntityKind::Study, keys::STUDY_YEAR, true, false);
        scalar(&mut rules, EntityKind::Study, keys::FOCAL_CLADE, true, false);
        scalar(&mut rules, EntityKind::Study, keys::TAG, true, true);
        // free text, useless as an exact key
        scalar(&mut rules, EntityKind::Study, keys::COMMENT, false, true);
        scalar(&mut rules, EntityKind::Study, keys::IS_DEPRECATED, true, false);

        // tree metadata
        scalar(&mut rules, EntityKind::Tree, keys::TREE_ID, true, false);
        scalar(&mut rules, EntityKind::Tree, keys::STUDY_ID, true, false);
        scalar(&mut rules, EntityKind::Tree, keys::BRANCH_LENGTH_MODE, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::BRANCH_LENGTH_DESCRIPTION, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::BRANCH_LENGTH_TIME_UNITS, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::INFERENCE_METHOD, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::NODE_LABEL_MODE, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::NODE_LABEL_DESCRIPTION, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::TAG, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::COMMENT, true, true);
        scalar(&mut rules, EntityKind::Tree, keys::IS_DEPRECATED, true, false);

        // tree aggregates: indexed under public keys distinct from the
        // stored array properties on the root
        array(
            &mut rules,
            EntityKind::Tree,
            keys::ORIGINAL_LABEL,
            keys::TIP_ORIGINAL_LABELS,
            true,
            true,
        );
        array(
            &mut rules,
            EntityKind::Tree,
            keys::MAPPED_NAME,
            keys::TIP_MAPPED_NAMES,
            true,
            true,
        );
        array(
            &mut rules,
            EntityKind::Tree,
            keys::MAPPED_ID,
            keys::TIP_MAPPED_IDS,
            true,
            false,
        );
        array(
            &mut rules,
            EntityKind::Tree,
            keys::HIGHER_TAXON_NAME,
            keys::HIGHER_TAXON_NAMES,
            true,
            true,
        );
        array(
            &mut rules,
            EntityKind::Tree,
            keys::HIGHER_TAXON_ID,
            keys::HIGHER_TAXON_IDS,
            true,
            false,
        );

        // tree node properties
        scalar(&mut rules, EntityKind::TreeNode, keys::NODE_LABEL, true, true);
        scalar(&mut rules, EntityKind::TreeNode, keys::ORIGINAL_LABEL, true, true);
        scalar(&mut rules, EntityKind::TreeNode, keys::MAPPED_NAME, true, true);
        scalar(&mut rules, EntityKind::TreeNode, keys::MAPPED_ID, true, false);
        scalar(&mut rules, EntityKind::TreeNode, keys::TAG, true, true);
        scalar(&mut rules, EntityKind::TreeNode, keys::COMMENT, true, true);
        scalar(&mut rules, EntityKind::TreeNode, keys::NODE_AGE, true, false);
        scalar(&mut rules, EntityKind::TreeNode, keys::NODE_AGE_MIN, true, false);
        scalar(&mut rules, EntityKind::TreeNode, keys::NODE_AGE_MAX, true, false);

        Self { rules }
    }

    /// All rules applicable to an entity kind.
    pub fn rules_for(&self, kind: EntityKind) -> impl Iterator<Item = &IndexRule> {
        self.rules.iter().filter(move |rule| rule.kind == kind)
    }

    /// Resolve a caller-supplied public key for a kind. `None` means the key
    /// is not a recognized searchable property of that kind.
    pub fn rule(&self, kind: EntityKind, public_key: &str) -> Option<&IndexRule> {
        self.rules
            .iter()
            .find(|rule| rule.kind == kind && rule.public_key == public_key)
    }

    /// The scalar rules for a kind, used for verbose result projection.
    pub fn scalar_rules(&self, kind: EntityKind) -> impl Iterator<Item = &IndexRule> {
        self.rules_for(kind)
            .filter(|rule| rule.shape == ValueShape::Scalar)
    }
}

fn scalar(
    rules: &mut Vec<IndexRule>,
    kind: EntityKind,
    key: &'static str,
    exact: bool,
    fulltext: bool,
) {
    rules.push(IndexRule {
        kind,
        public_key: key,
        stored_key: key,
        shape: ValueShape::Scalar,
        exact,
        fulltext,
    });
}

fn array(
    rules: &mut Vec<IndexRule>,
    kind: EntityKind,
    public_key: &'static str,
    stored_key: &'static str,
    exact: bool,
    fulltext: bool,
) {
    rules.push(IndexRule {
        kind,
        public_key,
        stored_key,
        shape: ValueShape::Array,
        exact,
        fulltext,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_keys_map_to_stored_arrays() {
        let catalog = PropertyCatalog::standard();
        let rule = catalog.rule(EntityKind::Tree, keys::MAPPED_NAME).expect("rule");
        assert_eq!(rule.stored_key, keys::TIP_MAPPED_NAMES);
        assert_eq!(rule.shape, ValueShape::Array);
        assert!(rule.exact);
        assert!(rule.fulltext);
    }

    #[test]
    fn mapped_id_is_exact_only() {
        let catalog = PropertyCatalog::standard();
        let rule = catalog.rule(EntityKind::Tree, keys::MAPPED_ID).expect("rule");
        assert!(rule.exact);
        assert!(!rule.fulltext);
    }

    #[test]
    fn study_comment_is_fulltext_only() {
        let catalog = PropertyCatalog::standard();
        let rule = catalog.rule(EntityKind::Study, keys::COMMENT).expect("rule");
        assert!(!rule.exact);
        assert!(rule.fulltext);
    }

    #[test]
    fn unknown_keys_resolve_to_none() {
        let catalog = PropertyCatalog::standard();
        assert!(catalog.rule(EntityKind::Study, "no_such_property").is_none());
        // a tree key is not a study key
        assert!(catalog.rule(EntityKind::Study, keys::TREE_ID).is_none());
    }

    #[test]
    fn every_kind_has_scalar_rules_for_projection() {
        let catalog = PropertyCatalog::standard();
        for kind in [EntityKind::Study, EntityKind::Tree, EntityKind::TreeNode] {
            assert!(catalog.scalar_rules(kind).count() > 0);
        }
    }
}
