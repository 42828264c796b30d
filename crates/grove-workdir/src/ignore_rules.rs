//! Path exclusion for working-directory scans.
//!
//! The scanner consumes any [`IgnorePredicate`]. [`IgnoreRules`] is the
//! stock implementation, compiled from gitignore-style patterns; plain
//! closures work too.

use std::path::{Path, PathBuf};

use grove_types::RepoPath;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

use crate::error::WorkdirResult;

/// Decides whether a path is excluded from the scan.
///
/// `is_dir` is true for directories; an ignored directory is pruned
/// together with everything below it.
pub trait IgnorePredicate: Send + Sync {
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool;
}

impl<F> IgnorePredicate for F
where
    F: Fn(&RepoPath, bool) -> bool + Send + Sync,
{
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool {
        self(path, is_dir)
    }
}

/// Compiled gitignore-style patterns.
#[derive(Clone, Debug)]
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    pub fn none() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Compile patterns such as `*.log`, `target/` or `!keep.log`.
    pub fn from_patterns<I, S>(root: &Path, patterns: I) -> WorkdirResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder.add_line(None, pattern.as_ref())?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Load patterns from an ignore file. A missing file means no rules.
    pub fn from_file(root: &Path, file: &Path) -> WorkdirResult<Self> {
        if !file.is_file() {
            return Ok(Self::none());
        }
        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(file) {
            return Err(err.into());
        }
        let matcher = builder.build()?;
        debug!(file = %file.display(), rules = matcher.num_ignores(), "loaded ignore rules");
        Ok(Self { matcher })
    }

    /// Number of ignore (non-whitelist) patterns.
    pub fn len(&self) -> u64 {
        self.matcher.num_ignores()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::none()
    }
}

impl IgnorePredicate for IgnoreRules {
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool {
        let relative: PathBuf = path.components().collect();
        self.matcher
            .matched_path_or_any_parents(&relative, is_dir)
            .is_ignore()
    }
}
