//! Working-copy equality: stamps first, content second.

use std::io;

use grove_index::{hash_working_file, Index, IndexEntry};
use grove_types::ObjectId;
use grove_workdir::WorkdirEntry;

/// Source of content digests for working files.
pub trait ContentProbe: Send + Sync {
    /// Digest the file as it would be staged now.
    fn digest(&self, entry: &WorkdirEntry) -> io::Result<ObjectId>;
}

/// Hashes files straight from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProbe;

impl ContentProbe for FsProbe {
    fn digest(&self, entry: &WorkdirEntry) -> io::Result<ObjectId> {
        hash_working_file(&entry.host_path)
    }
}

/// Outcome of comparing a working file with its index entry.
#[derive(Debug)]
pub enum WorkingCopy {
    Matches,
    Differs,
    /// Deleted between the scan and the content check.
    Vanished(io::Error),
    /// Could not be read, so equality is unproven.
    Unreadable(io::Error),
}

/// Compares working files with index entries.
///
/// Stage one trusts equal stamps unless the entry is racily clean. Stage two
/// hashes the file through the probe. Counts how often each stage decided.
pub struct WorkingCopyCheck<'a> {
    index: &'a Index,
    probe: &'a dyn ContentProbe,
    metadata_fast_path: bool,
    pub fast_path_hits: usize,
    pub content_hashes: usize,
}

impl<'a> WorkingCopyCheck<'a> {
    pub fn new(index: &'a Index, probe: &'a dyn ContentProbe, metadata_fast_path: bool) -> Self {
        Self {
            index,
            probe,
            metadata_fast_path,
            fast_path_hits: 0,
            content_hashes: 0,
        }
    }

    pub fn compare(&mut self, staged: &IndexEntry, file: &WorkdirEntry) -> WorkingCopy {
        if file.mode() != staged.mode {
            return WorkingCopy::Differs;
        }
        if self.metadata_fast_path && self.index.stamp_matches(staged, &file.stamp) {
            self.fast_path_hits += 1;
            return WorkingCopy::Matches;
        }

        self.content_hashes += 1;
        match self.probe.digest(file) {
            Ok(id) if id == staged.object_id => WorkingCopy::Matches,
            Ok(_) => WorkingCopy::Differs,
            Err(e) if e.kind() == io::ErrorKind::NotFound => WorkingCopy::Vanished(e),
            Err(e) => WorkingCopy::Unreadable(e),
        }
    }
}
