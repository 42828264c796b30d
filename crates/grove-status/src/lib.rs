//! Repository status for Grove.
//!
//! Compares three snapshots of a repository: the tree HEAD points at, the
//! staging index and the live working directory. Every path ends up in zero
//! or more of six categories (added, staged, modified, missing, removed,
//! untracked) collected in a [`RepositoryStatus`].
//!
//! [`compute_status`] is the core and takes all of its inputs as arguments.
//! [`Worktree`] wires those inputs up from a repository on disk.
//!
//! # Key Types
//!
//! - [`RepositoryStatus`] -- The six path sets and [`RepositoryStatus::any_differences`]
//! - [`PathState`] -- Per-path classification, one side per comparison
//! - [`WorkingCopyCheck`] -- Two-stage (stamp, then content) equality check
//! - [`ContentProbe`] / [`FsProbe`] -- Where working-file digests come from
//! - [`StatusReport`] -- Status plus scan warnings and counters
//! - [`GroveConfig`] / [`StatusOptions`] -- Repository configuration
//! - [`StatusError`] -- Including [`StatusError::CorruptIndex`] and [`StatusError::ObjectNotFound`]

pub mod check;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod status;
pub mod worktree;

pub use check::{ContentProbe, FsProbe, WorkingCopy, WorkingCopyCheck};
pub use classify::{IndexSide, PathState, WorktreeSide};
pub use config::{GroveConfig, StatusOptions};
pub use engine::{compute_status, StatusReport, StatusStats};
pub use error::{ConfigError, StatusError, StatusResult};
pub use status::RepositoryStatus;
pub use worktree::Worktree;
