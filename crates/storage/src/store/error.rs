#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    /// Caller-input error, rejected before any state change.
    InvalidInput(&'static str),
    /// A search key that is not a searchable property of the requested
    /// entity kind. Common client typo, reported structurally.
    UnrecognizedProperty { name: String },
    /// A node handle that does not resolve to a live graph node.
    UnknownId,
    /// Store-corruption invariant violation; propagated, never patched.
    Corrupt(&'static str),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnrecognizedProperty { name } => {
                write!(f, "unrecognized search property: {name}")
            }
            Self::UnknownId => write!(f, "unknown node id"),
            Self::Corrupt(message) => write!(f, "store corruption: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
