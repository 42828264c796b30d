//! Wiring a repository on disk into [`compute_status`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use grove_index::Index;
use grove_store::{FsObjectStore, ObjectStore};
use grove_tree::{FlatTree, Head, TreeReader};
use grove_types::RepoPath;
use grove_workdir::{IgnorePredicate, IgnoreRules, WorkdirError, WorkdirScanner};
use tracing::info;

use crate::check::FsProbe;
use crate::config::GroveConfig;
use crate::engine::{compute_status, StatusReport};
use crate::error::StatusResult;

/// Paths and configuration of a repository checkout.
///
/// Holds no index or scan state: every call reads its inputs afresh.
pub struct Worktree {
    root: PathBuf,
    config: GroveConfig,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Worktree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worktree")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish()
    }
}

impl Worktree {
    /// Open the checkout at `root` with loose objects under the control
    /// directory. Nothing is created on disk.
    pub fn open(root: impl Into<PathBuf>, config: GroveConfig) -> StatusResult<Self> {
        let root = existing_root(root.into())?;
        let store = FsObjectStore::open(config.objects_path(&root));
        Ok(Self::with_store(root, config, Arc::new(store)))
    }

    /// Open the checkout at `root`, reading its `config.toml` if present.
    pub fn discover(root: impl Into<PathBuf>) -> StatusResult<Self> {
        let root = existing_root(root.into())?;
        let config = GroveConfig::load(&root)?;
        Self::open(root, config)
    }

    /// Use an already-open object store.
    pub fn with_store(
        root: impl Into<PathBuf>,
        config: GroveConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Load the persisted index. A repository without one gets an empty
    /// index that saves to the configured location.
    pub fn load_index(&self) -> StatusResult<Index> {
        Ok(Index::load(self.config.index_path(&self.root), self.store.clone())?)
    }

    pub fn ignore_rules(&self) -> StatusResult<IgnoreRules> {
        Ok(IgnoreRules::from_file(&self.root, &self.config.ignore_path(&self.root))?)
    }

    /// A scanner that skips the control directory and ignored paths, except
    /// those tracked by `index`.
    pub fn scanner(&self, index: &Index) -> StatusResult<WorkdirScanner> {
        let exemption = TrackedExemption {
            tracked: index.clone(),
            rules: self.ignore_rules()?,
        };
        Ok(WorkdirScanner::new(&self.root)
            .control_dir(self.config.control_dir.as_str())
            .ignore(exemption))
    }

    pub fn head_tree(&self, head: &Head) -> StatusResult<FlatTree> {
        Ok(TreeReader::new(self.store.as_ref()).flatten_head(head)?)
    }

    /// Load HEAD, the index and a fresh scan, then compare them.
    pub fn status(&self, head: &Head) -> StatusResult<StatusReport> {
        let index = self.load_index()?;
        let head_tree = self.head_tree(head)?;
        let snapshot = self.scanner(&index)?.snapshot()?;
        let report = compute_status(&head_tree, &index, &snapshot, &FsProbe, &self.config.status)?;
        info!(
            root = %self.root.display(),
            differences = report.status.any_differences(),
            warnings = report.warnings.len(),
            "status"
        );
        Ok(report)
    }
}

fn existing_root(root: PathBuf) -> StatusResult<PathBuf> {
    if root.is_dir() {
        Ok(root)
    } else {
        Err(WorkdirError::RootNotFound(root).into())
    }
}

/// Ignore rules that never hide a tracked file or a directory holding one.
struct TrackedExemption {
    tracked: Index,
    rules: IgnoreRules,
}

impl IgnorePredicate for TrackedExemption {
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool {
        let tracked = if is_dir {
            self.tracked.contains_dir(path)
        } else {
            self.tracked.contains(path.as_str())
        };
        !tracked && self.rules.is_ignored(path, is_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusError;
    use crate::status::RepositoryStatus;
    use chrono::Utc;
    use grove_store::{Blob, Commit, InMemoryObjectStore, Tree, TreeEntry};
    use grove_types::{EntryMode, ObjectId};
    use std::collections::BTreeSet;
    use std::fs;

    fn p(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    fn write(root: &Path, path: &str, content: &[u8]) {
        let host = p(path).to_host(root);
        fs::create_dir_all(host.parent().unwrap()).unwrap();
        fs::write(host, content).unwrap();
    }

    fn names(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    fn commit(worktree: &Worktree, index: &Index) -> Head {
        let tree = index.write_tree().unwrap();
        let commit = Commit::new(tree, vec![], "tester", "snapshot", Utc::now());
        let id = worktree
            .store()
            .write(&commit.to_stored_object().unwrap())
            .unwrap();
        Head::Commit(id)
    }

    #[test]
    fn fresh_repository_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let worktree = Worktree::discover(dir.path()).unwrap();
        let report = worktree.status(&Head::Unborn).unwrap();
        assert_eq!(report.status, RepositoryStatus::default());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn status_leaves_a_fresh_checkout_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"a");
        let worktree = Worktree::discover(dir.path()).unwrap();
        worktree.status(&Head::Unborn).unwrap();
        assert!(!dir.path().join(".grove").exists());
    }

    #[test]
    fn missing_root_is_an_error_and_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let typo = dir.path().join("typo").join("repo");

        let err = Worktree::discover(&typo).unwrap_err();
        assert!(matches!(
            err,
            StatusError::Workdir(WorkdirError::RootNotFound(ref p)) if *p == typo
        ));
        assert!(matches!(
            Worktree::open(&typo, GroveConfig::default()),
            Err(StatusError::Workdir(WorkdirError::RootNotFound(_)))
        ));
        assert!(!dir.path().join("typo").exists());
    }

    #[test]
    fn config_cannot_expose_the_control_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".grove")).unwrap();
        fs::write(root.join(".grove").join("config.toml"), "control_dir = \".meta\"\n").unwrap();
        write(root, "tracked.txt", b"t");

        let worktree = Worktree::discover(root).unwrap();
        let status = worktree.status(&Head::Unborn).unwrap().status;
        assert_eq!(status.untracked, names(&["tracked.txt"]));
    }

    #[test]
    fn saved_index_and_commit_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let worktree = Worktree::discover(root).unwrap();
        write(root, "file2", b"file2");
        write(root, "dir/file3", b"file3");

        let mut index = worktree.load_index().unwrap();
        index.add_from_workdir(root, &p("file2")).unwrap();
        index.add_from_workdir(root, &p("dir/file3")).unwrap();
        index.save().unwrap();
        let head = commit(&worktree, &index);

        let report = worktree.status(&head).unwrap();
        assert!(!report.status.any_differences(), "{}", report.status);

        write(root, "file2", b"file2 edited");
        write(root, "new.txt", b"new");
        let status = worktree.status(&head).unwrap().status;
        assert_eq!(status.modified, names(&["file2"]));
        assert_eq!(status.untracked, names(&["new.txt"]));
    }

    #[test]
    fn control_dir_and_ignored_files_are_not_untracked() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let worktree = Worktree::discover(root).unwrap();
        fs::write(root.join(".groveignore"), "*.log\nbuild/\n").unwrap();
        write(root, "debug.log", b"log");
        write(root, "build/out.bin", b"bin");
        write(root, "src/main.rs", b"fn main() {}");

        let status = worktree.status(&Head::Unborn).unwrap().status;
        assert_eq!(status.untracked, names(&[".groveignore", "src/main.rs"]));
        assert!(status.untracked.iter().all(|p| !p.starts_with(".grove/")));
    }

    #[test]
    fn tracked_files_stay_visible_under_ignore_rules() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let worktree = Worktree::discover(root).unwrap();
        fs::write(root.join(".groveignore"), "build/\n*.log\n").unwrap();
        write(root, "build/keep.bin", b"keep");
        write(root, "build/other.bin", b"other");
        write(root, "app.log", b"log");

        let mut index = worktree.load_index().unwrap();
        index.add_from_workdir(root, &p("build/keep.bin")).unwrap();
        index.add_from_workdir(root, &p("app.log")).unwrap();
        index.save().unwrap();

        fs::remove_file(root.join("app.log")).unwrap();
        write(root, "build/keep.bin", b"keep, edited");

        let status = worktree.status(&Head::Unborn).unwrap().status;
        assert_eq!(status.added, names(&["build/keep.bin"]));
        assert_eq!(status.modified, names(&["build/keep.bin"]));
        assert_eq!(status.missing, names(&["app.log"]));
        assert_eq!(status.untracked, names(&[".groveignore"]));
    }

    #[test]
    fn corrupt_index_is_reported_not_reset() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let worktree = Worktree::discover(root).unwrap();
        let index_path = worktree.config().index_path(root);
        fs::create_dir_all(index_path.parent().unwrap()).unwrap();
        fs::write(&index_path, vec![0u8; 64]).unwrap();

        let err = worktree.status(&Head::Unborn).unwrap_err();
        assert!(matches!(err, StatusError::CorruptIndex { path, .. } if path == index_path));
        assert_eq!(fs::read(&index_path).unwrap(), vec![0u8; 64]);
    }

    #[test]
    fn head_with_missing_subtree_is_object_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let worktree = Worktree::with_store(dir.path(), GroveConfig::default(), store.clone());

        let missing = ObjectId::from_bytes(b"subtree that was never written");
        let blob = store.write(&Blob::new(b"x".to_vec()).to_stored_object()).unwrap();
        let root = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "x", blob),
            TreeEntry::new(EntryMode::Directory, "lib", missing),
        ]);
        let root_id = store.write(&root.to_stored_object().unwrap()).unwrap();

        let err = worktree.status(&Head::Tree(root_id)).unwrap_err();
        assert!(matches!(err, StatusError::ObjectNotFound(id) if id == missing));
    }

    #[test]
    fn config_file_switches_off_fast_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".grove")).unwrap();
        fs::write(
            root.join(".grove").join("config.toml"),
            "[status]\nmetadata_fast_path = false\n",
        )
        .unwrap();
        write(root, "a", b"a");

        let worktree = Worktree::discover(root).unwrap();
        let mut index = worktree.load_index().unwrap();
        index.add_from_workdir(root, &p("a")).unwrap();
        index.save().unwrap();

        let report = worktree.status(&Head::Unborn).unwrap();
        assert_eq!(report.status.added, names(&["a"]));
        assert_eq!(report.stats.fast_path_hits, 0);
        assert_eq!(report.stats.content_hashes, 1);
    }

    #[test]
    fn malformed_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".grove")).unwrap();
        fs::write(root.join(".grove").join("config.toml"), "index_file = 7\n").unwrap();
        assert!(matches!(
            Worktree::discover(root).unwrap_err(),
            StatusError::Config(_)
        ));
    }
}
