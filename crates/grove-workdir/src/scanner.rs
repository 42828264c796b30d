//! Lazy working-directory walks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_types::{EntryMode, FileStamp, RepoPath};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ScanWarning, WorkdirError, WorkdirResult};
use crate::ignore_rules::{IgnorePredicate, IgnoreRules};

/// Default name of the repository control directory.
pub const DEFAULT_CONTROL_DIR: &str = ".grove";

/// A file observed on disk at scan time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkdirEntry {
    pub path: RepoPath,
    /// Absolute location on the host filesystem.
    pub host_path: PathBuf,
    pub stamp: FileStamp,
}

impl WorkdirEntry {
    pub fn mode(&self) -> EntryMode {
        self.stamp.mode.unwrap_or(EntryMode::Regular)
    }

    pub fn size(&self) -> u64 {
        self.stamp.size
    }
}

/// A completed scan.
#[derive(Clone, Debug, Default)]
pub struct WorkdirSnapshot {
    pub entries: BTreeMap<RepoPath, WorkdirEntry>,
    pub warnings: Vec<ScanWarning>,
}

impl WorkdirSnapshot {
    /// Build a snapshot from already-known entries (no filesystem access).
    pub fn from_entries(entries: impl IntoIterator<Item = WorkdirEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.path.clone(), e)).collect(),
            warnings: Vec::new(),
        }
    }

    pub fn get(&self, path: &RepoPath) -> Option<&WorkdirEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scanner configuration. Cheap to clone; holds no walk state.
#[derive(Clone)]
pub struct WorkdirScanner {
    root: PathBuf,
    control_dir: String,
    ignore: Arc<dyn IgnorePredicate>,
}

impl std::fmt::Debug for WorkdirScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkdirScanner")
            .field("root", &self.root)
            .field("control_dir", &self.control_dir)
            .finish()
    }
}

impl WorkdirScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            control_dir: DEFAULT_CONTROL_DIR.to_string(),
            ignore: Arc::new(IgnoreRules::none()),
        }
    }

    /// Name of the top-level control directory to skip.
    pub fn control_dir(mut self, name: impl Into<String>) -> Self {
        self.control_dir = name.into();
        self
    }

    /// Replace the ignore predicate.
    pub fn ignore(mut self, predicate: impl IgnorePredicate + 'static) -> Self {
        self.ignore = Arc::new(predicate);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a fresh walk. Entries come out sorted by path within each
    /// directory; nothing is cached between calls.
    pub fn iter(&self) -> ScanIter {
        let root = self.root.clone();
        let control_dir = self.control_dir.clone();
        let ignore = Arc::clone(&self.ignore);

        let keep = move |entry: &DirEntry| -> bool {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_dir();
            if entry.depth() == 1 && is_dir && entry.file_name() == control_dir.as_str() {
                return false;
            }
            match RepoPath::from_host(&root, entry.path()) {
                Ok(path) => !ignore.is_ignored(&path, is_dir),
                // Surfaced as a warning by the iterator.
                Err(_) => true,
            }
        };

        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(Box::new(keep) as EntryFilter);

        ScanIter {
            root: self.root.clone(),
            inner,
        }
    }

    /// Walk the whole tree and collect the result.
    pub fn snapshot(&self) -> WorkdirResult<WorkdirSnapshot> {
        if !self.root.is_dir() {
            return Err(WorkdirError::RootNotFound(self.root.clone()));
        }

        let mut snapshot = WorkdirSnapshot::default();
        for item in self.iter() {
            match item {
                Ok(entry) => {
                    snapshot.entries.insert(entry.path.clone(), entry);
                }
                Err(warning) => {
                    warn!(%warning, "skipping path during scan");
                    snapshot.warnings.push(warning);
                }
            }
        }
        debug!(
            root = %self.root.display(),
            files = snapshot.entries.len(),
            warnings = snapshot.warnings.len(),
            "working directory scanned"
        );
        Ok(snapshot)
    }
}

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// One in-progress walk. Dropping it abandons the walk.
pub struct ScanIter {
    root: PathBuf,
    inner: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
}

impl ScanIter {
    fn entry_for(&self, dir_entry: &DirEntry) -> Option<Result<WorkdirEntry, ScanWarning>> {
        let host_path = dir_entry.path();
        let path = match RepoPath::from_host(&self.root, host_path) {
            Ok(path) => path,
            Err(e) => return Some(Err(ScanWarning::unreadable(host_path.display().to_string(), e))),
        };

        // Without following links this is `symlink_metadata`.
        let meta = match dir_entry.metadata() {
            Ok(meta) => meta,
            Err(e) => return Some(Err(ScanWarning::unreadable(path.as_str(), e))),
        };

        let stamp = FileStamp::from_metadata(&meta);
        match stamp.mode {
            Some(EntryMode::Regular | EntryMode::Executable | EntryMode::Symlink) => {
                Some(Ok(WorkdirEntry {
                    path,
                    host_path: host_path.to_path_buf(),
                    stamp,
                }))
            }
            _ => {
                debug!(path = %path, "skipping special file");
                None
            }
        }
    }
}

impl Iterator for ScanIter {
    type Item = Result<WorkdirEntry, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let dir_entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| {
                            RepoPath::from_host(&self.root, p)
                                .map(String::from)
                                .unwrap_or_else(|_| p.display().to_string())
                        })
                        .unwrap_or_default();
                    return Some(Err(ScanWarning::unreadable(path, e)));
                }
            };

            if dir_entry.depth() == 0 || dir_entry.file_type().is_dir() {
                continue;
            }
            if let Some(item) = self.entry_for(&dir_entry) {
                return Some(item);
            }
        }
    }
}
