//! Loose-object storage on the local filesystem.
//!
//! On-disk layout mirrors git's loose objects:
//! ```text
//! <root>/ab/cdef...        (remaining 62 hex chars of the ID)
//! ```
//! Each file holds a zstd-compressed frame of:
//! ```text
//! "<kind> <len>\0" <payload>
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use grove_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

const COMPRESSION_LEVEL: i32 = 3;

/// Object store backed by one compressed file per object.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store rooted at `root`. Nothing is created on disk until the
    /// first write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.fan_out();
        self.root.join(dir).join(file)
    }

    fn encode(object: &StoredObject) -> StoreResult<Vec<u8>> {
        let mut raw = format!("{} {}\0", object.kind, object.data.len()).into_bytes();
        raw.extend_from_slice(&object.data);
        zstd::encode_all(raw.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| StoreError::Serialization(format!("compression failed: {e}")))
    }

    fn decode(id: &ObjectId, compressed: &[u8]) -> StoreResult<StoredObject> {
        let corrupt = |reason: String| StoreError::CorruptObject { id: *id, reason };

        let raw = zstd::decode_all(compressed)
            .map_err(|e| corrupt(format!("decompression failed: {e}")))?;
        let nul = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator".into()))?;
        let header = std::str::from_utf8(&raw[..nul])
            .map_err(|_| corrupt("header is not UTF-8".into()))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt(format!("malformed header {header:?}")))?;
        let kind = ObjectKind::from_name(kind)
            .ok_or_else(|| corrupt(format!("unknown object kind {kind:?}")))?;
        let len: usize = len
            .parse()
            .map_err(|_| corrupt(format!("bad length {len:?}")))?;

        let data = raw[nul + 1..].to_vec();
        if data.len() != len {
            return Err(corrupt(format!(
                "length mismatch: header says {len}, found {}",
                data.len()
            )));
        }

        let object = StoredObject::new(kind, data);
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(object)
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let path = self.object_path(id);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::decode(id, &compressed).map(Some)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }

        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Serialization("object path has no parent".into()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&Self::encode(object)?)?;
        tmp.as_file().sync_all()?;
        if let Err(e) = tmp.persist(&path) {
            // Another writer stored the same object first.
            if !path.exists() {
                return Err(e.error.into());
            }
        }

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size(), "stored object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}
