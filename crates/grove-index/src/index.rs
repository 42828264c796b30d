//! The staging index: an ordered table of staged entries.
//!
//! The [`Index`] manages a `BTreeMap<RepoPath, IndexEntry>` and knows where
//! it is persisted. Besides the entries it remembers when its file was last
//! written, which decides whether an entry's stamp can be trusted (see
//! [`Index::stamp_matches`]).

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_store::{Blob, ObjectStore};
use grove_tree::{write_flat_tree, FlatEntry, FlatTree};
use grove_types::{EntryMode, FileStamp, ObjectId, RepoPath, StampTime};
use tracing::{debug, info, warn};

use crate::codec;
use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::hash::{hash_working_file, read_working_file};

/// The staging area for the next commit.
#[derive(Clone)]
pub struct Index {
    entries: BTreeMap<RepoPath, IndexEntry>,
    /// Backing file, if any.
    path: Option<PathBuf>,
    /// Modification time of the backing file when it was last loaded or saved.
    written_at: Option<StampTime>,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("path", &self.path)
            .field("written_at", &self.written_at)
            .finish()
    }
}

impl Index {
    /// Create an empty, unbound index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            path: None,
            written_at: None,
            store,
        }
    }

    /// Load the index persisted at `path`.
    ///
    /// A missing file yields an empty index bound to `path`. Bytes that do
    /// not decode are [`IndexError::CorruptIndex`].
    pub fn load(path: impl Into<PathBuf>, store: Arc<dyn ObjectStore>) -> IndexResult<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no index file, starting empty");
                let mut index = Self::new(store);
                index.path = Some(path);
                return Ok(index);
            }
            Err(e) => return Err(e.into()),
        };

        let decoded = codec::decode(&data).map_err(|reason| {
            warn!(path = %path.display(), %reason, "index file is corrupt");
            IndexError::CorruptIndex {
                path: path.clone(),
                reason,
            }
        })?;
        let written_at = modified_time(&path)?;
        let entries: BTreeMap<_, _> = decoded
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();

        debug!(path = %path.display(), entries = entries.len(), "loaded index");
        Ok(Self {
            entries,
            path: Some(path),
            written_at: Some(written_at),
            store,
        })
    }

    /// Bind the index to a file location for [`Index::save`].
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Persist the index atomically: the new content is written to a
    /// temporary file in the same directory and renamed over the old one.
    pub fn save(&mut self) -> IndexResult<()> {
        let path = self.path.clone().ok_or(IndexError::Unbound)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let entries: Vec<&IndexEntry> = self.entries.values().collect();
        let data = codec::encode(&entries).map_err(IndexError::Encode)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| IndexError::Io(e.error))?;

        self.written_at = Some(modified_time(&path)?);
        info!(path = %path.display(), entries = self.entries.len(), "saved index");
        Ok(())
    }

    /// Where this index is persisted, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// When the backing file was last written, `None` if never.
    pub fn written_at(&self) -> Option<StampTime> {
        self.written_at
    }

    /// The store that holds staged blobs.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Whether any entry lies below the directory `dir`.
    pub fn contains_dir(&self, dir: &RepoPath) -> bool {
        let lower = format!("{dir}/");
        self.entries
            .range::<str, _>((Bound::Included(lower.as_str()), Bound::Unbounded))
            .next()
            .is_some_and(|(path, _)| path.starts_with_dir(dir))
    }

    /// All entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage `content` at `path`, replacing any previous entry.
    ///
    /// The blob is written to the store unless it is already there. `stamp`
    /// should describe the working file the content was read from.
    pub fn add(
        &mut self,
        path: RepoPath,
        content: &[u8],
        mode: EntryMode,
        stamp: FileStamp,
    ) -> IndexResult<ObjectId> {
        let object_id = Blob::id_for(content);
        if !self.store.exists(&object_id)? {
            self.store.write(&Blob::new(content.to_vec()).to_stored_object())?;
        }
        debug!(path = %path, object = %object_id.short_hex(), "staged");
        self.entries
            .insert(path.clone(), IndexEntry::new(path, object_id, mode, stamp));
        Ok(object_id)
    }

    /// Stage the working file at `path` below `root`, reading and stamping
    /// it from disk.
    pub fn add_from_workdir(&mut self, root: &Path, path: &RepoPath) -> IndexResult<ObjectId> {
        let host = path.to_host(root);
        let meta = fs::symlink_metadata(&host)?;
        let stamp = FileStamp::from_metadata(&meta);
        let mode = stamp.mode.unwrap_or(EntryMode::Regular);
        let content = read_working_file(&host)?;
        self.add(path.clone(), &content, mode, stamp)
    }

    /// Unstage `path`. Returns the removed entry; absent paths are not an
    /// error.
    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        let removed = self.entries.remove(path);
        if removed.is_some() {
            debug!(path, "removed from index");
        }
        removed
    }

    // ---------------------------------------------------------------
    // Dirty checks
    // ---------------------------------------------------------------

    /// Whether `stamp` proves the working file still holds the content
    /// staged for `entry`, without reading it.
    ///
    /// Stamps must be equal and the entry must not be racily clean.
    pub fn stamp_matches(&self, entry: &IndexEntry, stamp: &FileStamp) -> bool {
        entry.stamp == *stamp && !entry.is_racy(self.written_at)
    }

    /// Whether the working file at `path` differs from what is staged.
    ///
    /// Content is hashed only when the stamp cannot decide. A file that no
    /// longer exists counts as modified.
    pub fn is_modified_since_staged(&self, root: &Path, path: &RepoPath) -> IndexResult<bool> {
        let entry = self
            .get(path.as_str())
            .ok_or_else(|| IndexError::NotTracked(path.clone()))?;

        let host = path.to_host(root);
        let meta = match fs::symlink_metadata(&host) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };
        let stamp = FileStamp::from_metadata(&meta);
        if stamp.mode.is_some_and(|mode| mode != entry.mode) {
            return Ok(true);
        }
        if self.stamp_matches(entry, &stamp) {
            return Ok(false);
        }
        Ok(hash_working_file(&host)? != entry.object_id)
    }

    /// Re-stamp entries whose working file still holds the staged content
    /// but whose stamp no longer matches or cannot be trusted. Returns the
    /// number of entries that changed.
    ///
    /// Missing and unreadable files are left alone.
    pub fn refresh(&mut self, root: &Path) -> IndexResult<usize> {
        let written_at = self.written_at;
        let mut updated = 0;
        for entry in self.entries.values_mut() {
            let host = entry.path.to_host(root);
            let Ok(meta) = fs::symlink_metadata(&host) else {
                continue;
            };
            let stamp = FileStamp::from_metadata(&meta);
            let was_racy = entry.is_racy(written_at);
            if entry.stamp == stamp && !was_racy {
                continue;
            }
            if stamp.mode.is_some_and(|mode| mode != entry.mode) {
                continue;
            }
            let confirmed_at = StampTime::now();
            match hash_working_file(&host) {
                Ok(id) if id == entry.object_id => {
                    let restamped = entry.stamp != stamp;
                    entry.stamp = stamp;
                    entry.staged_at = confirmed_at;
                    if restamped || (was_racy && !entry.is_racy(written_at)) {
                        updated += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(path = %entry.path, error = %e, "cannot refresh entry"),
            }
        }
        debug!(updated, "refreshed index stamps");
        Ok(updated)
    }

    // ---------------------------------------------------------------
    // Tree conversion
    // ---------------------------------------------------------------

    /// The staged snapshot as a flat path listing.
    pub fn to_flat_tree(&self) -> FlatTree {
        self.entries
            .iter()
            .map(|(path, entry)| {
                (
                    path.clone(),
                    FlatEntry {
                        object_id: entry.object_id,
                        mode: entry.mode,
                    },
                )
            })
            .collect()
    }

    /// Store nested tree objects for the staged snapshot and return the root
    /// tree ID.
    pub fn write_tree(&self) -> IndexResult<ObjectId> {
        let root = write_flat_tree(self.store.as_ref(), &self.to_flat_tree())?;
        debug!(root = %root.short_hex(), entries = self.entries.len(), "wrote tree from index");
        Ok(root)
    }

    /// Replace all entries with the files of `listing`.
    ///
    /// Stamps are unknown, so every entry is content-checked once.
    pub fn read_tree(&mut self, listing: &FlatTree) {
        self.entries = listing
            .iter()
            .map(|(path, file)| {
                (
                    path.clone(),
                    IndexEntry::new(path.clone(), file.object_id, file.mode, FileStamp::unknown()),
                )
            })
            .collect();
    }
}

fn modified_time(path: &Path) -> io::Result<StampTime> {
    Ok(StampTime::from_system_time(fs::metadata(path)?.modified()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use grove_store::InMemoryObjectStore;
    use grove_tree::TreeReader;
    use proptest::prelude::*;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(InMemoryObjectStore::new())
    }

    fn path(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    fn stamp(size: u64, secs: i64) -> FileStamp {
        FileStamp {
            size,
            mtime: StampTime { secs, nanos: 0 },
            inode: 7,
            mode: Some(EntryMode::Regular),
        }
    }

    #[test]
    fn add_stores_blob_and_last_write_wins() {
        let mut index = Index::new(store());
        let first = index
            .add(path("b.txt"), b"one", EntryMode::Regular, stamp(3, 1))
            .unwrap();
        let second = index
            .add(path("b.txt"), b"two", EntryMode::Regular, stamp(3, 2))
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("b.txt").unwrap().object_id, second);
        assert!(index.store().exists(&first).unwrap());
        assert!(index.store().exists(&second).unwrap());
    }

    #[test]
    fn remove_absent_path_is_not_an_error() {
        let mut index = Index::new(store());
        assert!(index.remove("nope").is_none());

        index
            .add(path("a"), b"a", EntryMode::Regular, stamp(1, 1))
            .unwrap();
        let removed = index.remove("a").unwrap();
        assert_eq!(removed.path.as_str(), "a");
        assert!(index.is_empty());
    }

    #[test]
    fn contains_dir_respects_component_boundaries() {
        let mut index = Index::new(store());
        for p in ["dir-x", "dir/file3", "dirt"] {
            index.add(path(p), p.as_bytes(), EntryMode::Regular, stamp(1, 1)).unwrap();
        }
        assert!(index.contains_dir(&path("dir")));
        assert!(!index.contains_dir(&path("di")));
        assert!(!index.contains_dir(&path("dir/file3")));
        assert!(!index.contains_dir(&path("dirt")));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::load(dir.path().join("index"), store()).unwrap();
        assert!(index.is_empty());
        assert!(index.written_at().is_none());
    }

    #[test]
    fn save_and_load_preserve_entries() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join(".grove").join("index");
        let shared = store();

        let mut index = Index::new(shared.clone()).with_path(&index_path);
        index.add(path("file2"), b"file2", EntryMode::Regular, stamp(5, 10)).unwrap();
        index.add(path("dir/file3"), b"file3", EntryMode::Executable, stamp(5, 11)).unwrap();
        index.save().unwrap();
        assert!(index.written_at().is_some());

        let loaded = Index::load(&index_path, shared).unwrap();
        assert_eq!(
            loaded.entries().collect::<Vec<_>>(),
            index.entries().collect::<Vec<_>>()
        );
        assert_eq!(loaded.written_at(), index.written_at());
    }

    #[test]
    fn garbage_file_is_corrupt_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index");
        fs::write(&index_path, b"definitely not an index").unwrap();

        match Index::load(&index_path, store()) {
            Err(IndexError::CorruptIndex { path, .. }) => assert_eq!(path, index_path),
            other => panic!("expected CorruptIndex, got {other:?}"),
        }
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index");
        let mut index = Index::new(store()).with_path(&index_path);
        index.add(path("a"), b"a", EntryMode::Regular, stamp(1, 1)).unwrap();
        index.save().unwrap();

        let bytes = fs::read(&index_path).unwrap();
        fs::write(&index_path, &bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(
            Index::load(&index_path, store()),
            Err(IndexError::CorruptIndex { .. })
        ));
    }

    #[test]
    fn failed_save_is_not_reported_as_corruption() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blocker"), b"a file, not a directory").unwrap();
        let mut index = Index::new(store()).with_path(dir.path().join("blocker").join("index"));
        index.add(path("a"), b"a", EntryMode::Regular, stamp(1, 1)).unwrap();

        assert!(matches!(index.save(), Err(IndexError::Io(_))));
        assert!(index.written_at().is_none());
    }

    #[test]
    fn load_reports_typed_corruption_reason() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("index");
        let mut index = Index::new(store()).with_path(&index_path);
        index.add(path("a"), b"a", EntryMode::Regular, stamp(1, 1)).unwrap();
        index.save().unwrap();

        let mut bytes = fs::read(&index_path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&index_path, &bytes).unwrap();
        assert!(matches!(
            Index::load(&index_path, store()),
            Err(IndexError::CorruptIndex {
                reason: CodecError::ChecksumMismatch,
                ..
            })
        ));
    }

    #[test]
    fn unbound_save_fails() {
        let mut index = Index::new(store());
        assert!(matches!(index.save(), Err(IndexError::Unbound)));
    }

    #[test]
    fn stamps_are_untrusted_until_written() {
        let mut index = Index::new(store());
        let s = stamp(1, 100);
        index.add(path("a"), b"a", EntryMode::Regular, s).unwrap();
        let entry = index.get("a").unwrap().clone();

        assert!(!index.stamp_matches(&entry, &s));
        index.written_at = Some(StampTime { secs: 200, nanos: 0 });
        assert!(index.stamp_matches(&entry, &s));
        index.written_at = Some(StampTime { secs: 100, nanos: 0 });
        assert!(!index.stamp_matches(&entry, &s));
        index.written_at = Some(StampTime { secs: 200, nanos: 0 });
        assert!(!index.stamp_matches(&entry, &stamp(2, 100)));
    }

    #[test]
    fn modified_since_staged_detects_edits() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("c.txt"), b"c").unwrap();

        let mut index = Index::new(store());
        index.add_from_workdir(root, &path("c.txt")).unwrap();
        assert!(!index.is_modified_since_staged(root, &path("c.txt")).unwrap());

        fs::write(root.join("c.txt"), b"changed").unwrap();
        assert!(index.is_modified_since_staged(root, &path("c.txt")).unwrap());

        fs::remove_file(root.join("c.txt")).unwrap();
        assert!(index.is_modified_since_staged(root, &path("c.txt")).unwrap());
    }

    #[test]
    fn same_size_edit_before_save_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("f"), b"abcd").unwrap();

        let mut index = Index::new(store()).with_path(root.join(".grove").join("index"));
        index.add_from_workdir(root, &path("f")).unwrap();
        fs::write(root.join("f"), b"abce").unwrap();
        index.save().unwrap();

        assert!(index.is_modified_since_staged(root, &path("f")).unwrap());
    }

    #[test]
    fn modified_since_staged_rejects_untracked() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::new(store());
        assert!(matches!(
            index.is_modified_since_staged(dir.path(), &path("x")),
            Err(IndexError::NotTracked(_))
        ));
    }

    #[test]
    fn refresh_restamps_unchanged_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a"), b"same").unwrap();
        fs::write(root.join("b"), b"new").unwrap();

        let mut index = Index::new(store());
        index.add(path("a"), b"same", EntryMode::Regular, FileStamp::unknown()).unwrap();
        index.add(path("b"), b"old", EntryMode::Regular, FileStamp::unknown()).unwrap();
        index.add(path("gone"), b"x", EntryMode::Regular, FileStamp::unknown()).unwrap();

        assert_eq!(index.refresh(root).unwrap(), 1);
        assert_ne!(index.get("a").unwrap().stamp, FileStamp::unknown());
        assert_eq!(index.get("b").unwrap().stamp, FileStamp::unknown());
    }

    #[test]
    fn write_tree_then_read_tree_restores_listing() {
        let shared = store();
        let mut index = Index::new(shared.clone());
        index.add(path("file2"), b"file2", EntryMode::Regular, stamp(5, 1)).unwrap();
        index.add(path("dir/file3"), b"file3", EntryMode::Regular, stamp(5, 1)).unwrap();

        let root = index.write_tree().unwrap();
        let listing = TreeReader::new(shared.as_ref()).flatten(Some(&root)).unwrap();
        assert_eq!(listing, index.to_flat_tree());

        let mut other = Index::new(shared);
        other.read_tree(&listing);
        assert_eq!(other.to_flat_tree(), listing);
        assert!(other.entries().all(|e| e.stamp == FileStamp::unknown()));
    }

    proptest! {
        #[test]
        fn saved_entries_survive_reload(
            names in proptest::collection::btree_set("[a-z]{1,6}(/[a-z]{1,6}){0,2}", 0..12),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let index_path = dir.path().join("index");
            let shared = store();
            let mut index = Index::new(shared.clone()).with_path(&index_path);
            for name in &names {
                index.add(path(name), name.as_bytes(), EntryMode::Regular, stamp(1, 1)).unwrap();
            }
            index.save().unwrap();

            let loaded = Index::load(&index_path, shared).unwrap();
            prop_assert_eq!(loaded.len(), names.len());
            for name in &names {
                prop_assert_eq!(
                    loaded.get(name).map(|e| e.object_id),
                    Some(Blob::id_for(name.as_bytes()))
                );
            }
        }
    }
}
