//! Per-path classification.
//!
//! Each path gets one verdict from comparing HEAD with the index and one
//! from comparing the index with the working directory. The pair is then
//! projected onto the sets of a [`RepositoryStatus`].

use grove_index::IndexEntry;
use grove_tree::FlatEntry;

use crate::status::RepositoryStatus;

/// HEAD compared with the index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexSide {
    /// Same content and mode in both, or in neither.
    #[default]
    Unchanged,
    /// In the index only.
    Added,
    /// In both, different content or mode.
    Staged,
    /// In HEAD only.
    Removed,
}

/// The index compared with the working directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorktreeSide {
    #[default]
    Unchanged,
    /// On disk with content or mode other than staged.
    Modified,
    /// Staged but not on disk.
    Missing,
    /// On disk, unknown to both HEAD and the index.
    Untracked,
}

/// Classification of a single path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathState {
    pub index: IndexSide,
    pub worktree: WorktreeSide,
}

impl PathState {
    /// Combine both verdicts. A newly staged file that is gone from disk is
    /// reported as missing only.
    pub fn new(index: IndexSide, worktree: WorktreeSide) -> Self {
        let index = match (index, worktree) {
            (IndexSide::Added, WorktreeSide::Missing) => IndexSide::Unchanged,
            (index, _) => index,
        };
        Self { index, worktree }
    }

    pub fn is_clean(&self) -> bool {
        self.index == IndexSide::Unchanged && self.worktree == WorktreeSide::Unchanged
    }

    /// Record `path` in the sets this state maps to.
    pub fn project(&self, path: &str, status: &mut RepositoryStatus) {
        match self.index {
            IndexSide::Unchanged => {}
            IndexSide::Added => {
                status.added.insert(path.to_string());
            }
            IndexSide::Staged => {
                status.staged.insert(path.to_string());
            }
            IndexSide::Removed => {
                status.removed.insert(path.to_string());
            }
        }
        match self.worktree {
            WorktreeSide::Unchanged => {}
            WorktreeSide::Modified => {
                status.modified.insert(path.to_string());
            }
            WorktreeSide::Missing => {
                status.missing.insert(path.to_string());
            }
            WorktreeSide::Untracked => {
                status.untracked.insert(path.to_string());
            }
        }
    }
}

/// Compare the HEAD entry and the index entry of one path.
pub fn index_side(head: Option<&FlatEntry>, staged: Option<&IndexEntry>) -> IndexSide {
    match (head, staged) {
        (None, None) => IndexSide::Unchanged,
        (None, Some(_)) => IndexSide::Added,
        (Some(_), None) => IndexSide::Removed,
        (Some(h), Some(s)) if h.object_id != s.object_id || h.mode != s.mode => IndexSide::Staged,
        (Some(_), Some(_)) => IndexSide::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_types::{EntryMode, FileStamp, ObjectId, RepoPath};

    fn flat(content: &[u8], mode: EntryMode) -> FlatEntry {
        FlatEntry {
            object_id: ObjectId::from_bytes(content),
            mode,
        }
    }

    fn staged(content: &[u8], mode: EntryMode) -> IndexEntry {
        IndexEntry::new(
            RepoPath::new("f").unwrap(),
            ObjectId::from_bytes(content),
            mode,
            FileStamp::unknown(),
        )
    }

    #[test]
    fn index_side_covers_all_pairs() {
        let h = flat(b"a", EntryMode::Regular);
        assert_eq!(index_side(None, None), IndexSide::Unchanged);
        assert_eq!(index_side(None, Some(&staged(b"a", EntryMode::Regular))), IndexSide::Added);
        assert_eq!(index_side(Some(&h), None), IndexSide::Removed);
        assert_eq!(
            index_side(Some(&h), Some(&staged(b"a", EntryMode::Regular))),
            IndexSide::Unchanged
        );
        assert_eq!(
            index_side(Some(&h), Some(&staged(b"b", EntryMode::Regular))),
            IndexSide::Staged
        );
        assert_eq!(
            index_side(Some(&h), Some(&staged(b"a", EntryMode::Executable))),
            IndexSide::Staged
        );
    }

    #[test]
    fn projection_can_fill_two_sets() {
        let mut status = RepositoryStatus::default();
        PathState {
            index: IndexSide::Staged,
            worktree: WorktreeSide::Modified,
        }
        .project("dir/file3", &mut status);

        assert!(status.staged.contains("dir/file3"));
        assert!(status.modified.contains("dir/file3"));
        assert!(status.added.is_empty() && status.untracked.is_empty());
    }

    #[test]
    fn added_but_deleted_is_only_missing() {
        let state = PathState::new(IndexSide::Added, WorktreeSide::Missing);
        let mut status = RepositoryStatus::default();
        state.project("new", &mut status);
        assert!(status.added.is_empty());
        assert!(status.missing.contains("new"));

        let state = PathState::new(IndexSide::Staged, WorktreeSide::Missing);
        assert_eq!(state.index, IndexSide::Staged);
    }

    #[test]
    fn clean_state_projects_nothing() {
        let mut status = RepositoryStatus::default();
        let state = PathState::default();
        assert!(state.is_clean());
        state.project("file2", &mut status);
        assert!(!status.any_differences());
    }
}
