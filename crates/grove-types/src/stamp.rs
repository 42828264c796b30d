//! Filesystem fingerprints used for cheap dirty checks.

use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::mode::EntryMode;

/// Coarsest modification-time granularity assumed for any filesystem.
pub const MTIME_GRANULARITY_SECS: i64 = 2;

/// A point in time with nanosecond resolution, as reported by the filesystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StampTime {
    pub secs: i64,
    pub nanos: u32,
}

impl StampTime {
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs() as i64,
                nanos: d.subsec_nanos(),
            },
            Err(e) => {
                // Before the epoch: round towards negative infinity.
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self {
                        secs: -(d.as_secs() as i64),
                        nanos: 0,
                    }
                } else {
                    Self {
                        secs: -(d.as_secs() as i64) - 1,
                        nanos: 1_000_000_000 - d.subsec_nanos(),
                    }
                }
            }
        }
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

/// Cached file metadata that changes whenever the file content is likely to
/// have changed.
///
/// Equal stamps mean "probably unchanged"; they never prove it on their own
/// (see [`FileStamp::is_racy`]). Different stamps mean "maybe changed" and
/// call for a content hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileStamp {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: StampTime,
    /// Inode number, 0 where the platform has none.
    pub inode: u64,
    /// Executable bit and symlink-ness feed into the stamp through the mode.
    pub mode: Option<EntryMode>,
}

impl FileStamp {
    /// Build a stamp from `symlink_metadata` output.
    pub fn from_metadata(meta: &Metadata) -> Self {
        let mtime = meta
            .modified()
            .map(StampTime::from_system_time)
            .unwrap_or_default();
        Self {
            size: meta.len(),
            mtime,
            inode: inode(meta),
            mode: EntryMode::from_metadata(meta),
        }
    }

    /// A stamp that never matches a real file, forcing a content check.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether this stamp was taken too close to `written_at` to be trusted.
    ///
    /// A file modified in the same timestamp granule as the index write
    /// could be modified again without changing its mtime. `None` means the
    /// index was never written, so every stamp is suspect.
    pub fn is_racy(&self, written_at: Option<StampTime>) -> bool {
        match written_at {
            Some(written) => self.mtime >= written,
            None => true,
        }
    }

    /// Whether the file was last modified far enough before `at` that any
    /// write after `at` must move its mtime.
    pub fn settled_before(&self, at: StampTime) -> bool {
        let settled = StampTime {
            secs: self.mtime.secs.saturating_add(MTIME_GRANULARITY_SECS),
            nanos: self.mtime.nanos,
        };
        settled < at
    }
}

#[cfg(unix)]
fn inode(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn inode(_meta: &Metadata) -> u64 {
    0
}
