//! Three-way reconciliation of HEAD, index and working directory.

use std::collections::BTreeSet;

use grove_index::Index;
use grove_tree::FlatTree;
use grove_types::RepoPath;
use grove_workdir::{ScanWarning, WorkdirSnapshot};
use tracing::{debug, warn};

use crate::check::{ContentProbe, WorkingCopy, WorkingCopyCheck};
use crate::classify::{index_side, PathState, WorktreeSide};
use crate::config::StatusOptions;
use crate::error::{StatusError, StatusResult};
use crate::status::RepositoryStatus;

/// Counters describing how a status was computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusStats {
    /// Distinct paths examined.
    pub paths: usize,
    /// Working files accepted on their stamp alone.
    pub fast_path_hits: usize,
    /// Working files whose content was hashed.
    pub content_hashes: usize,
}

/// A status together with everything that was skipped to produce it.
#[derive(Clone, Debug, Default)]
pub struct StatusReport {
    pub status: RepositoryStatus,
    pub warnings: Vec<ScanWarning>,
    pub stats: StatusStats,
}

/// Classify every path known to HEAD, the index or the working directory.
///
/// `head` is the flattened HEAD tree, empty for a repository without
/// commits. Working files are hashed through `probe` only when their stamp
/// cannot settle equality.
pub fn compute_status(
    head: &FlatTree,
    index: &Index,
    workdir: &WorkdirSnapshot,
    probe: &dyn ContentProbe,
    options: &StatusOptions,
) -> StatusResult<StatusReport> {
    if options.verify_index_objects {
        for entry in index.entries() {
            if !index.store().exists(&entry.object_id)? {
                return Err(StatusError::ObjectNotFound(entry.object_id));
            }
        }
    }

    let paths: BTreeSet<&RepoPath> = head
        .keys()
        .chain(index.entries().map(|e| &e.path))
        .chain(workdir.entries.keys())
        .collect();

    let mut report = StatusReport {
        warnings: workdir.warnings.clone(),
        ..StatusReport::default()
    };
    let mut check = WorkingCopyCheck::new(index, probe, options.metadata_fast_path);

    for path in paths {
        let head_entry = head.get(path);
        let staged = index.get(path.as_str());
        let file = workdir.get(path);

        let worktree = match (staged, file) {
            (Some(staged), Some(file)) => match check.compare(staged, file) {
                WorkingCopy::Matches => WorktreeSide::Unchanged,
                WorkingCopy::Differs => WorktreeSide::Modified,
                WorkingCopy::Vanished(e) => {
                    warn!(path = %path, error = %e, "file vanished during status");
                    report.warnings.push(ScanWarning::unreadable(path.as_str(), e));
                    WorktreeSide::Missing
                }
                WorkingCopy::Unreadable(e) => {
                    warn!(path = %path, error = %e, "cannot read working file");
                    report.warnings.push(ScanWarning::unreadable(path.as_str(), e));
                    WorktreeSide::Modified
                }
            },
            (Some(_), None) => WorktreeSide::Missing,
            (None, Some(_)) if head_entry.is_none() => WorktreeSide::Untracked,
            (None, _) => WorktreeSide::Unchanged,
        };

        let state = PathState::new(index_side(head_entry, staged), worktree);
        state.project(path.as_str(), &mut report.status);
        report.stats.paths += 1;
    }

    report.stats.fast_path_hits = check.fast_path_hits;
    report.stats.content_hashes = check.content_hashes;

    let s = &report.status;
    debug!(
        paths = report.stats.paths,
        added = s.added.len(),
        staged = s.staged.len(),
        modified = s.modified.len(),
        missing = s.missing.len(),
        removed = s.removed.len(),
        untracked = s.untracked.len(),
        fast_path_hits = report.stats.fast_path_hits,
        content_hashes = report.stats.content_hashes,
        warnings = report.warnings.len(),
        "status computed"
    );
    Ok(report)
}
