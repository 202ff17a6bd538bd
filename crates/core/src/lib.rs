#![forbid(unsafe_code)]

pub mod catalog;
pub mod fuzzy;
pub mod properties;
pub mod source;

pub mod ids {
    /// Identifier of a study as assigned by the upstream curation system.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct StudyId(String);

    impl StudyId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, StudyIdError> {
            let value = value.into();
            validate_id_text(&value).map_err(|kind| match kind {
                IdTextError::Empty => StudyIdError::Empty,
                IdTextError::TooLong => StudyIdError::TooLong,
                IdTextError::InvalidFirstChar => StudyIdError::InvalidFirstChar,
                IdTextError::InvalidChar { ch, index } => StudyIdError::InvalidChar { ch, index },
            })?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum StudyIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    /// Unique tree identifier: the study id joined to the study-local tree id
    /// by an underscore. Unique across the whole store because study ids are.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TreeId(String);

    impl TreeId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn compose(study: &StudyId, local_tree_id: &str) -> Result<Self, TreeIdError> {
            validate_id_text(local_tree_id).map_err(|kind| match kind {
                IdTextError::Empty => TreeIdError::EmptyLocalId,
                IdTextError::TooLong => TreeIdError::LocalIdTooLong,
                IdTextError::InvalidFirstChar => TreeIdError::InvalidLocalId,
                IdTextError::InvalidChar { .. } => TreeIdError::InvalidLocalId,
            })?;
            Ok(Self(format!("{}_{}", study.as_str(), local_tree_id)))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TreeIdError {
        EmptyLocalId,
        LocalIdTooLong,
        InvalidLocalId,
    }

    enum IdTextError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    fn validate_id_text(value: &str) -> Result<(), IdTextError> {
        if value.is_empty() {
            return Err(IdTextError::Empty);
        }
        if value.len() > 128 {
            return Err(IdTextError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(IdTextError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(IdTextError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                continue;
            }
            return Err(IdTextError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn study_id_validation() {
            assert_eq!(StudyId::try_new("").unwrap_err(), StudyIdError::Empty);
            assert_eq!(
                StudyId::try_new("_pg10").unwrap_err(),
                StudyIdError::InvalidFirstChar
            );
            assert_eq!(
                StudyId::try_new("pg 10").unwrap_err(),
                StudyIdError::InvalidChar { ch: ' ', index: 2 }
            );
            assert_eq!(
                StudyId::try_new("a".repeat(129)).unwrap_err(),
                StudyIdError::TooLong
            );
            assert!(StudyId::try_new("pg_1003").is_ok());
        }

        #[test]
        fn tree_id_composition() {
            let study = StudyId::try_new("pg_10").expect("study id");
            let tree = TreeId::compose(&study, "tree3").expect("tree id");
            assert_eq!(tree.as_str(), "pg_10_tree3");

            assert_eq!(
                TreeId::compose(&study, "").unwrap_err(),
                TreeIdError::EmptyLocalId
            );
            assert_eq!(
                TreeId::compose(&study, "tree 3").unwrap_err(),
                TreeIdError::InvalidLocalId
            );
        }
    }
}
