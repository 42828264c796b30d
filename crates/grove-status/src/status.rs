//! The status result.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Differences between HEAD, the index and the working directory.
///
/// Each set holds `/`-joined repository paths. A path can be in more than
/// one set: a staged file edited again is both `staged` and `modified`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    /// In the index and on disk, not in HEAD.
    pub added: BTreeSet<String>,
    /// In HEAD and the index with different content or mode.
    pub staged: BTreeSet<String>,
    /// Working copy differs from the index.
    pub modified: BTreeSet<String>,
    /// In the index but gone from disk.
    pub missing: BTreeSet<String>,
    /// In HEAD, not in the index.
    pub removed: BTreeSet<String>,
    /// On disk only.
    pub untracked: BTreeSet<String>,
}

impl RepositoryStatus {
    /// Whether any of the six sets is non-empty.
    pub fn any_differences(&self) -> bool {
        !(self.added.is_empty()
            && self.staged.is_empty()
            && self.modified.is_empty()
            && self.missing.is_empty()
            && self.removed.is_empty()
            && self.untracked.is_empty())
    }
}

impl fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("added", &self.added),
            ("staged", &self.staged),
            ("modified", &self.modified),
            ("missing", &self.missing),
            ("removed", &self.removed),
            ("untracked", &self.untracked),
        ];
        for (label, paths) in sections {
            for path in paths {
                writeln!(f, "{label:>9}: {path}")?;
            }
        }
        Ok(())
    }
}
