//! Flattening committed trees into path listings.

use std::collections::BTreeMap;

use grove_store::{Commit, ObjectKind, ObjectStore, StoredObject, Tree};
use grove_types::{EntryMode, ObjectId, RepoPath};
use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::head::Head;

/// A file in a flattened tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatEntry {
    pub object_id: ObjectId,
    pub mode: EntryMode,
}

/// Every file of a snapshot, keyed by `/`-joined path.
pub type FlatTree = BTreeMap<RepoPath, FlatEntry>;

/// Reads trees out of an object store.
pub struct TreeReader<'s> {
    store: &'s dyn ObjectStore,
}

impl<'s> TreeReader<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Flatten whatever HEAD points at. An unborn HEAD yields an empty tree.
    pub fn flatten_head(&self, head: &Head) -> TreeResult<FlatTree> {
        match head {
            Head::Unborn => Ok(FlatTree::new()),
            Head::Tree(id) => self.flatten(Some(id)),
            Head::Commit(id) => {
                let commit = self.read_commit(id)?;
                self.flatten(Some(&commit.tree))
            }
        }
    }

    /// Flatten a root tree into path → blob listing. `None` yields an empty
    /// listing.
    pub fn flatten(&self, root: Option<&ObjectId>) -> TreeResult<FlatTree> {
        let mut out = FlatTree::new();
        if let Some(root) = root {
            self.descend(root, None, &mut out)?;
            debug!(root = %root.short_hex(), files = out.len(), "flattened tree");
        }
        Ok(out)
    }

    /// Read and decode a commit object.
    pub fn read_commit(&self, id: &ObjectId) -> TreeResult<Commit> {
        let stored = self.load(id, ObjectKind::Commit)?;
        Ok(Commit::from_stored_object(&stored)?)
    }

    /// Read and decode a single tree level.
    pub fn read_tree(&self, id: &ObjectId) -> TreeResult<Tree> {
        let stored = self.load(id, ObjectKind::Tree)?;
        Ok(Tree::from_stored_object(&stored)?)
    }

    fn descend(
        &self,
        tree_id: &ObjectId,
        prefix: Option<&RepoPath>,
        out: &mut FlatTree,
    ) -> TreeResult<()> {
        let tree = self.read_tree(tree_id)?;
        for entry in &tree.entries {
            let path = match prefix {
                Some(prefix) => prefix.join(&entry.name),
                None => RepoPath::new(entry.name.as_str()),
            }
            .map_err(|source| TreeError::InvalidPath {
                tree: *tree_id,
                source,
            })?;

            if entry.is_tree() {
                self.descend(&entry.object_id, Some(&path), out)?;
            } else {
                out.insert(
                    path,
                    FlatEntry {
                        object_id: entry.object_id,
                        mode: entry.mode,
                    },
                );
            }
        }
        Ok(())
    }

    fn load(&self, id: &ObjectId, expected: ObjectKind) -> TreeResult<StoredObject> {
        let stored = self
            .store
            .read(id)?
            .ok_or(TreeError::ObjectNotFound(*id))?;
        if stored.kind != expected {
            return Err(TreeError::UnexpectedKind {
                id: *id,
                expected,
                actual: stored.kind,
            });
        }
        Ok(stored)
    }
}
