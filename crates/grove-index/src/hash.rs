//! Hashing working files the same way staged content is hashed.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use grove_store::ContentHasher;
use grove_types::ObjectId;

/// Read the content a working file would be staged with.
///
/// Symbolic links are not followed; their content is the link target.
pub fn read_working_file(host_path: &Path) -> io::Result<Vec<u8>> {
    let meta = fs::symlink_metadata(host_path)?;
    if meta.file_type().is_symlink() {
        return link_target_bytes(host_path);
    }
    fs::read(host_path)
}

/// Compute the blob ID a working file would get if staged now.
///
/// Regular files are streamed, never loaded whole.
pub fn hash_working_file(host_path: &Path) -> io::Result<ObjectId> {
    let meta = fs::symlink_metadata(host_path)?;
    if meta.file_type().is_symlink() {
        return Ok(ContentHasher::BLOB.hash(&link_target_bytes(host_path)?));
    }
    ContentHasher::BLOB.hash_reader(File::open(host_path)?)
}

#[cfg(unix)]
fn link_target_bytes(host_path: &Path) -> io::Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Ok(fs::read_link(host_path)?.as_os_str().as_bytes().to_vec())
}

#[cfg(not(unix))]
fn link_target_bytes(host_path: &Path) -> io::Result<Vec<u8>> {
    Ok(fs::read_link(host_path)?
        .to_string_lossy()
        .replace('\\', "/")
        .into_bytes())
}
