//! Foundation types for Grove.
//!
//! This crate provides the identity and path types shared by every other
//! Grove crate: the object store, the staging index, the tree reader, the
//! working-directory scanner and the status engine.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`RepoPath`] -- Repository-relative, `/`-separated file path
//! - [`EntryMode`] -- File mode of a tracked entry (regular, executable, ...)
//! - [`FileStamp`] -- Cheap filesystem fingerprint used for dirty checks

pub mod error;
pub mod mode;
pub mod object;
pub mod path;
pub mod stamp;

pub use error::TypeError;
pub use mode::EntryMode;
pub use object::ObjectId;
pub use path::RepoPath;
pub use stamp::{FileStamp, StampTime};
