use std::path::PathBuf;

/// Errors that stop a scan before it starts.
#[derive(Debug, thiserror::Error)]
pub enum WorkdirError {
    /// The repository root does not exist or is not a directory.
    #[error("working directory root not found: {0}")]
    RootNotFound(PathBuf),

    /// Ignore patterns could not be parsed.
    #[error("invalid ignore rules: {0}")]
    InvalidIgnore(#[from] ignore::Error),

    /// I/O error outside the walk itself (e.g. reading an ignore file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for working-directory results.
pub type WorkdirResult<T> = Result<T, WorkdirError>;

/// A path the scan had to skip. Scans keep going after these.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanWarning {
    /// The path could not be stat'ed, listed or read.
    #[error("unreadable path {path}: {reason}")]
    FilesystemUnreadable { path: String, reason: String },
}

impl ScanWarning {
    pub fn unreadable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::FilesystemUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// The path the warning is about.
    pub fn path(&self) -> &str {
        match self {
            Self::FilesystemUnreadable { path, .. } => path,
        }
    }
}
