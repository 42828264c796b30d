//! Index entry type.

use grove_types::{EntryMode, FileStamp, ObjectId, RepoPath, StampTime};
use serde::{Deserialize, Serialize};

/// A staged file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: RepoPath,
    /// Blob holding the staged content.
    pub object_id: ObjectId,
    pub mode: EntryMode,
    /// Filesystem stamp taken when the content was staged.
    pub stamp: FileStamp,
    /// When `stamp` was last confirmed against the staged content.
    pub staged_at: StampTime,
}

impl IndexEntry {
    pub fn new(path: RepoPath, object_id: ObjectId, mode: EntryMode, stamp: FileStamp) -> Self {
        Self {
            path,
            object_id,
            mode,
            stamp,
            staged_at: StampTime::now(),
        }
    }

    /// Whether the stamp alone cannot prove the working file unchanged.
    ///
    /// The file must have settled before it was staged, and the index must
    /// have been written after the file's last modification.
    pub fn is_racy(&self, written_at: Option<StampTime>) -> bool {
        self.stamp.is_racy(written_at) || !self.stamp.settled_before(self.staged_at)
    }

    /// Staged size in bytes, as recorded in the stamp.
    pub fn size(&self) -> u64 {
        self.stamp.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mtime_secs: i64, staged_secs: i64) -> IndexEntry {
        IndexEntry {
            staged_at: StampTime {
                secs: staged_secs,
                nanos: 0,
            },
            ..IndexEntry::new(
                RepoPath::new("f").unwrap(),
                ObjectId::from_bytes(b"f"),
                EntryMode::Regular,
                FileStamp {
                    size: 1,
                    mtime: StampTime {
                        secs: mtime_secs,
                        nanos: 0,
                    },
                    inode: 3,
                    mode: Some(EntryMode::Regular),
                },
            )
        }
    }

    #[test]
    fn trusted_only_when_settled_and_written_later() {
        let written = Some(StampTime { secs: 500, nanos: 0 });
        assert!(!entry(100, 200).is_racy(written));
        assert!(entry(100, 200).is_racy(None));
        assert!(entry(100, 200).is_racy(Some(StampTime { secs: 100, nanos: 0 })));
    }

    #[test]
    fn staged_in_the_same_granule_is_racy() {
        let written = Some(StampTime { secs: 500, nanos: 0 });
        assert!(entry(100, 100).is_racy(written));
        assert!(entry(100, 101).is_racy(written));
    }
}
