//! Content-addressed object storage for Grove.
//!
//! Every blob, tree and commit is stored as an immutable object identified
//! by its BLAKE3 hash, domain-separated by object kind.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- one directory level: names mapped to modes and object references
//! - [`Commit`] -- root tree plus parents and metadata
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- loose, zstd-compressed object files on disk
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writing an object that already exists is a no-op.
//! 3. Concurrent reads are always safe.
//! 4. The store never interprets object contents on the write path.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod disk;
pub mod error;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod traits;

pub use disk::FsObjectStore;
pub use error::{StoreError, StoreResult};
pub use grove_types::EntryMode;
pub use hasher::ContentHasher;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
