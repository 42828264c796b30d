use grove_store::ObjectKind;
use grove_types::ObjectId;

/// Errors that can occur while reading or writing trees.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A referenced object is missing from the store. This means the store is
    /// damaged or raced with garbage collection; it is never retried.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The object had an unexpected kind (e.g. expected tree, got blob).
    #[error("unexpected object kind for {id}: expected {expected}, got {actual}")]
    UnexpectedKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// A tree entry name could not form a valid repository path.
    #[error("invalid path in tree {tree}: {source}")]
    InvalidPath {
        tree: ObjectId,
        #[source]
        source: grove_types::TypeError,
    },

    /// Two listed paths collide (a file and a directory share a name).
    #[error("path conflict at {0}")]
    PathConflict(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] grove_store::StoreError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
