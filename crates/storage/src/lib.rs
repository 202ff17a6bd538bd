#![forbid(unsafe_code)]

mod store;

pub use store::{
    NodeId, NodeMatch, SearchOptions, SearchResults, SqliteStore, StoreError, StudyHandle,
    StudyMatch, TreeMatch,
};
