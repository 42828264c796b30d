//! Tree reading for Grove.
//!
//! Resolves a commit (or a bare root tree) into a flat, ordered mapping of
//! repository paths to blob IDs, pulling tree objects from the object store
//! on demand. Also provides the inverse: writing nested tree objects from a
//! flat path listing.
//!
//! # Key Types
//!
//! - [`Head`] -- What HEAD points at: nothing yet, a commit, or a tree
//! - [`TreeReader`] -- Flattens trees from an [`grove_store::ObjectStore`]
//! - [`FlatTree`] / [`FlatEntry`] -- The flattened listing
//! - [`write_flat_tree`] -- Build and store nested trees from a listing

pub mod builder;
pub mod error;
pub mod head;
pub mod reader;

pub use builder::write_flat_tree;
pub use error::{TreeError, TreeResult};
pub use head::Head;
pub use reader::{FlatEntry, FlatTree, TreeReader};
