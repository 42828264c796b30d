//! Staging index for Grove.
//!
//! The index records what the next commit will contain: for every staged
//! path, the blob ID of its content and a [`grove_types::FileStamp`] taken
//! when it was staged. Stamps let status skip rehashing files that have not
//! been touched.
//!
//! # Key Types
//!
//! - [`Index`] -- The staging area (BTreeMap-backed), loadable and savable
//! - [`IndexEntry`] -- A staged file
//! - [`IndexError`] -- Including [`IndexError::CorruptIndex`], kept distinct
//!   from "no index yet"

pub mod codec;
pub mod entry;
pub mod error;
pub mod hash;
pub mod index;

pub use entry::IndexEntry;
pub use error::{CodecError, IndexError, IndexResult};
pub use hash::{hash_working_file, read_working_file};
pub use index::Index;
