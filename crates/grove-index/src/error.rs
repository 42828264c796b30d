//! Error types for the index crate.

use std::path::PathBuf;

use grove_types::RepoPath;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index file exists but cannot be parsed. Never treated as an
    /// empty index: callers decide whether to reset staging.
    #[error("corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: CodecError },

    /// Entries could not be serialized for saving.
    #[error("cannot encode index entries: {0}")]
    Encode(bincode::Error),

    /// The path has no index entry.
    #[error("path not tracked: {0}")]
    NotTracked(RepoPath),

    /// `save` was called on an index that has no file location.
    #[error("index has no backing file")]
    Unbound,

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] grove_types::TypeError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] grove_store::StoreError),

    /// Tree building or reading failed.
    #[error("tree error: {0}")]
    Tree(#[from] grove_tree::TreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why persisted index bytes were rejected.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("too short ({0} bytes)")]
    TooShort(usize),

    #[error("bad magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    #[error("undecodable entries: {0}")]
    Undecodable(bincode::Error),

    #[error("entry count mismatch: header says {expected}, found {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("duplicate entry for {0}")]
    DuplicateEntry(RepoPath),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
