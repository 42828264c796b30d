//! Error types for the status crate.

use std::path::PathBuf;

use grove_index::{CodecError, IndexError};
use grove_tree::TreeError;
use grove_types::ObjectId;

/// Errors that abort a status computation.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The persisted index exists but cannot be parsed.
    #[error("corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: CodecError },

    /// A referenced object is missing from the store.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("index error: {0}")]
    Index(IndexError),

    #[error("tree error: {0}")]
    Tree(TreeError),

    #[error("store error: {0}")]
    Store(#[from] grove_store::StoreError),

    #[error("working directory error: {0}")]
    Workdir(#[from] grove_workdir::WorkdirError),
}

impl From<IndexError> for StatusError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::CorruptIndex { path, reason } => Self::CorruptIndex { path, reason },
            IndexError::Tree(tree) => tree.into(),
            other => Self::Index(other),
        }
    }
}

impl From<TreeError> for StatusError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::ObjectNotFound(id) => Self::ObjectNotFound(id),
            other => Self::Tree(other),
        }
    }
}

/// Errors loading `config.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Convenience alias for status results.
pub type StatusResult<T> = Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_index_keeps_its_own_variant() {
        let err: StatusError = IndexError::CorruptIndex {
            path: "idx".into(),
            reason: CodecError::ChecksumMismatch,
        }
        .into();
        assert!(matches!(err, StatusError::CorruptIndex { .. }));
    }

    #[test]
    fn missing_objects_surface_directly() {
        let id = ObjectId::from_bytes(b"gone");
        let err: StatusError = TreeError::ObjectNotFound(id).into();
        assert!(matches!(err, StatusError::ObjectNotFound(found) if found == id));

        let nested: StatusError = IndexError::Tree(TreeError::ObjectNotFound(id)).into();
        assert!(matches!(nested, StatusError::ObjectNotFound(_)));
    }
}
