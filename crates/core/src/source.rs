#![forbid(unsafe_code)]

//! The parsed tree-source model handed to the importer. Produced by an
//! out-of-scope parser; the shapes here mirror what that parser can actually
//! deliver, including its known data-quality issues (null property values,
//! null tree entries within a study).

use crate::ids::StudyId;
use crate::properties::PropertyValue;

/// A study as parsed from the upstream source: metadata plus its trees.
/// Tree entries can be `None` because the upstream reader sometimes emits
/// null trees; the importer skips those and continues.
#[derive(Clone, Debug)]
pub struct SourceStudy {
    pub study_id: StudyId,
    pub deprecated: bool,
    /// Property map from the source. A `None` value is an upstream null,
    /// dropped silently at import.
    pub properties: Vec<(String, Option<PropertyValue>)>,
    pub trees: Vec<Option<SourceTree>>,
}

#[derive(Clone, Debug)]
pub struct SourceTree {
    /// Tree id local to the study; the store-wide id is composed from it.
    pub local_id: String,
    pub deprecated: bool,
    pub properties: Vec<(String, Option<PropertyValue>)>,
    pub root: SourceNode,
}

#[derive(Clone, Debug)]
pub struct SourceNode {
    pub properties: Vec<(String, Option<PropertyValue>)>,
    /// Taxon/sample identity of a tip, when the source maps one.
    pub otu: Option<SourceOtu>,
    /// Length of the branch leading to this node, when given.
    pub branch_length: Option<f64>,
    /// True on the node the curator marked as the ingroup root.
    pub ingroup_marker: bool,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// All leaf descendants of this node, self included when it is a leaf,
    /// in preorder.
    pub fn descendant_leaves(&self) -> Vec<&SourceNode> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node);
            } else {
                for child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        leaves
    }
}

/// The OTU mapped to a tip: the label as curated, the label as originally
/// published, and the reference-taxonomy id when the tip has been mapped.
#[derive(Clone, Debug)]
pub struct SourceOtu {
    pub label: String,
    pub original_label: Option<String>,
    pub mapped_id: Option<i64>,
    pub properties: Vec<(String, Option<PropertyValue>)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str) -> SourceNode {
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

    fn inner(children: Vec<SourceNode>) -> SourceNode {
        SourceNode {
            properties: Vec::new(),
            otu: None,
            branch_length: None,
            ingroup_marker: false,
            children,
        }
    }

    #[test]
    fn descendant_leaves_in_preorder() {
        let tree = inner(vec![leaf("a"), inner(vec![leaf("b"), leaf("c")])]);
        let labels: Vec<&str> = tree
            .descendant_leaves()
            .iter()
            .map(|n| n.otu.as_ref().expect("otu").label.as_str())
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn a_lone_leaf_is_its_own_descendant() {
        let tip = leaf("x");
        assert_eq!(tip.descendant_leaves().len(), 1);
    }
}
