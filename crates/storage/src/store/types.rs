#![forbid(unsafe_code)]

use td_core::ids::StudyId;
use td_core::properties::PropertyValue;

/// Stable identifier of a graph node. Row id in the backing store; callers
/// treat it as opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) i64);

impl NodeId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an import returns: the study node plus the roots of every tree that
/// made it in (null source entries are skipped).
#[derive(Clone, Debug)]
pub struct StudyHandle {
    pub node: NodeId,
    pub study_id: StudyId,
    pub tree_roots: Vec<NodeId>,
}

/// Knobs for `search`. `fulltext` widens matching to the tokenized index
/// with fuzzy comparison; `verbose` attaches the indexed scalar properties
/// of every matched entity to the results.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchOptions {
    pub fulltext: bool,
    pub verbose: bool,
}

/// Search results, always rooted at the study level: a tree hit appears as
/// its study with the matched tree nested inside, a node hit as study plus
/// tree plus node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResults {
    pub studies: Vec<StudyMatch>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudyMatch {
    pub study_id: String,
    pub properties: Vec<(String, PropertyValue)>,
    pub trees: Vec<TreeMatch>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeMatch {
    pub tree_id: String,
    pub root: NodeId,
    pub properties: Vec<(String, PropertyValue)>,
    pub nodes: Vec<NodeMatch>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeMatch {
    pub node: NodeId,
    pub properties: Vec<(String, PropertyValue)>,
}
