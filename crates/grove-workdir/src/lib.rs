//! Working-directory scanning for Grove.
//!
//! Walks the live filesystem under a repository root and yields every file
//! with its repository path and [`grove_types::FileStamp`]. The control
//! directory and ignored paths are pruned. Unreadable paths become warnings
//! instead of aborting the walk.
//!
//! # Key Types
//!
//! - [`WorkdirScanner`] -- Configured scanner; every [`WorkdirScanner::iter`] call starts a fresh walk
//! - [`WorkdirEntry`] -- A file observed on disk
//! - [`WorkdirSnapshot`] -- A fully collected scan plus its warnings
//! - [`IgnorePredicate`] / [`IgnoreRules`] -- Path exclusion

pub mod error;
pub mod ignore_rules;
pub mod scanner;

pub use error::{ScanWarning, WorkdirError, WorkdirResult};
pub use ignore_rules::{IgnorePredicate, IgnoreRules};
pub use scanner::{ScanIter, WorkdirEntry, WorkdirScanner, WorkdirSnapshot};
