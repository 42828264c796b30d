//! Writing nested tree objects from a flat path listing.

use std::collections::BTreeMap;

use grove_store::{ObjectStore, Tree, TreeEntry};
use grove_types::{EntryMode, ObjectId};

use crate::error::{TreeError, TreeResult};
use crate::reader::{FlatEntry, FlatTree};

enum Node {
    File(FlatEntry),
    Dir(BTreeMap<String, Node>),
}

/// Store one tree object per directory of `listing` and return the root
/// tree's ID. An empty listing produces the empty tree.
pub fn write_flat_tree(store: &dyn ObjectStore, listing: &FlatTree) -> TreeResult<ObjectId> {
    let mut root = BTreeMap::new();
    for (path, entry) in listing {
        let mut dir = &mut root;
        let mut components = path.components().peekable();
        while let Some(name) = components.next() {
            if components.peek().is_none() {
                if dir.insert(name.to_string(), Node::File(*entry)).is_some() {
                    return Err(TreeError::PathConflict(path.to_string()));
                }
                break;
            }
            let node = dir
                .entry(name.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            dir = match node {
                Node::Dir(children) => children,
                Node::File(_) => return Err(TreeError::PathConflict(path.to_string())),
            };
        }
    }
    write_dir(store, &root)
}

fn write_dir(store: &dyn ObjectStore, children: &BTreeMap<String, Node>) -> TreeResult<ObjectId> {
    let mut entries = Vec::with_capacity(children.len());
    for (name, node) in children {
        let entry = match node {
            Node::File(file) => TreeEntry::new(file.mode, name.as_str(), file.object_id),
            Node::Dir(grandchildren) => {
                TreeEntry::new(EntryMode::Directory, name.as_str(), write_dir(store, grandchildren)?)
            }
        };
        entries.push(entry);
    }
    let stored = Tree::new(entries).to_stored_object()?;
    Ok(store.write(&stored)?)
}
