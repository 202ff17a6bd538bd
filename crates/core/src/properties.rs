#![forbid(unsafe_code)]

/// A typed property value stored on a graph node. Scalars cover the upstream
/// source vocabulary; arrays exist only for the denormalized aggregates kept
/// on tree roots.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
}

impl PropertyValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Canonical string form used for exact-index entries of scalar values.
    /// Arrays are fanned out element-wise by the indexer and have no single
    /// canonical form.
    pub fn index_form(&self) -> Option<String> {
        match self {
            Self::Text(v) => Some(v.clone()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            Self::TextArray(_) | Self::IntArray(_) => None,
        }
    }

    /// Element canonical forms for array values; scalars yield nothing.
    pub fn element_forms(&self) -> Vec<String> {
        match self {
            Self::TextArray(values) => values.clone(),
            Self::IntArray(values) => values.iter().map(|v| v.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Property-key vocabulary. Studies and trees keep their searchable scalar
/// metadata under these keys; tree roots additionally carry the aggregate
/// arrays under the `TIP_*` / `HIGHER_TAXON_*` storage keys, which are
/// indexed under public keys from the catalog.
pub mod keys {
    // study and tree identity
    pub const STUDY_ID: &str = "study_id";
    pub const TREE_ID: &str = "tree_id";

    // study metadata
    pub const CURATOR_NAME: &str = "curator_name";
    pub const PUBLICATION_REF: &str = "publication_ref";
    pub const STUDY_PUBLICATION: &str = "study_publication";
    pub const DATA_DEPOSIT: &str = "data_deposit";
    pub const STUDY_LABEL: &str = "study_label";
    pub const STUDY_YEAR: &str = "study_year";
    pub const FOCAL_CLADE: &str = "focal_clade";

    // shared metadata
    pub const TAG: &str = "tag";
    pub const COMMENT: &str = "comment";
    pub const IS_DEPRECATED: &str = "is_deprecated";

    // tree metadata
    pub const BRANCH_LENGTH_MODE: &str = "branch_length_mode";
    pub const BRANCH_LENGTH_DESCRIPTION: &str = "branch_length_description";
    pub const BRANCH_LENGTH_TIME_UNITS: &str = "branch_length_time_units";
    pub const INFERENCE_METHOD: &str = "inference_method";
    pub const NODE_LABEL_MODE: &str = "node_label_mode";
    pub const NODE_LABEL_DESCRIPTION: &str = "node_label_description";

    // tree node properties
    pub const NODE_LABEL: &str = "node_label";
    pub const ORIGINAL_LABEL: &str = "original_label";
    pub const MAPPED_NAME: &str = "mapped_name";
    pub const MAPPED_ID: &str = "mapped_id";
    pub const NODE_AGE: &str = "node_age";
    pub const NODE_AGE_MIN: &str = "node_age_min";
    pub const NODE_AGE_MAX: &str = "node_age_max";
    pub const PARENT_BRANCH_LENGTH: &str = "parent_branch_length";

    // structural flags
    pub const IS_STUDY: &str = "is_study";
    pub const IS_ROOT: &str = "is_root";
    pub const INGROUP_START: &str = "ingroup_start";
    pub const WITHIN_INGROUP: &str = "within_ingroup";
    pub const INGROUP_IS_SET: &str = "ingroup_is_set";
    pub const INGROUP_NODE_ID: &str = "ingroup_node_id";

    // aggregate arrays stored on tree roots
    pub const TIP_ORIGINAL_LABELS: &str = "tip_original_labels";
    pub const TIP_MAPPED_NAMES: &str = "tip_mapped_names";
    pub const TIP_MAPPED_IDS: &str = "tip_mapped_ids";
    pub const HIGHER_TAXON_NAMES: &str = "higher_taxon_names";
    pub const HIGHER_TAXON_IDS: &str = "higher_taxon_ids";

    // aggregate public index keys
    pub const HIGHER_TAXON_NAME: &str = "higher_taxon_name";
    pub const HIGHER_TAXON_ID: &str = "higher_taxon_id";

    // taxonomy nodes
    pub const TAXON_ID: &str = "taxon_id";
    pub const TAXON_NAME: &str = "taxon_name";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_form_covers_scalars_only() {
        assert_eq!(PropertyValue::text("Homo sapiens").index_form().unwrap(), "Homo sapiens");
        assert_eq!(PropertyValue::Int(9).index_form().unwrap(), "9");
        assert_eq!(PropertyValue::Bool(true).index_form().unwrap(), "true");
        assert!(PropertyValue::IntArray(vec![1, 2]).index_form().is_none());
    }

    #[test]
    fn element_forms_fan_out_arrays() {
        let v = PropertyValue::IntArray(vec![9, 12]);
        assert_eq!(v.element_forms(), vec!["9".to_string(), "12".to_string()]);
        assert!(PropertyValue::Int(9).element_forms().is_empty());
    }
}
