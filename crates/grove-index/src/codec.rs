//! Binary encoding of the persisted index.
//!
//! On-disk format:
//! ```text
//! [4 bytes: magic "GRIX"]
//! [4 bytes: version (big-endian u32)]
//! [4 bytes: entry count (big-endian u32)]
//! [N bytes: payload (bincode-serialized Vec<IndexEntry>)]
//! [32 bytes: BLAKE3 of everything above]
//! ```
//! The trailer tells a torn or damaged file apart from a valid one.

use std::collections::BTreeSet;

use crate::entry::IndexEntry;
use crate::error::CodecError;

const MAGIC: &[u8; 4] = b"GRIX";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 12;
const TRAILER_SIZE: usize = 32;

/// Serialize entries (already in path order) into the on-disk format.
pub fn encode(entries: &[&IndexEntry]) -> Result<Vec<u8>, bincode::Error> {
    let payload = bincode::serialize(entries)?;
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_be_bytes());
    buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    let checksum = blake3::hash(&buf);
    buf.extend_from_slice(checksum.as_bytes());
    Ok(buf)
}

/// Parse the on-disk format, verifying checksum, count and path uniqueness.
pub fn decode(data: &[u8]) -> Result<Vec<IndexEntry>, CodecError> {
    if data.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(CodecError::TooShort(data.len()));
    }
    let magic = read_array(&data[0..4]);
    if &magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }

    let (body, trailer) = data.split_at(data.len() - TRAILER_SIZE);
    if blake3::hash(body).as_bytes() != trailer {
        return Err(CodecError::ChecksumMismatch);
    }

    let version = u32::from_be_bytes(read_array(&body[4..8]));
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let count = u32::from_be_bytes(read_array(&body[8..12])) as usize;

    let entries: Vec<IndexEntry> =
        bincode::deserialize(&body[HEADER_SIZE..]).map_err(CodecError::Undecodable)?;
    if entries.len() != count {
        return Err(CodecError::CountMismatch {
            expected: count,
            actual: entries.len(),
        });
    }

    let mut seen = BTreeSet::new();
    for entry in &entries {
        if !seen.insert(&entry.path) {
            return Err(CodecError::DuplicateEntry(entry.path.clone()));
        }
    }
    Ok(entries)
}

fn read_array(bytes: &[u8]) -> [u8; 4] {
    let mut arr = [0u8; 4];
    arr.copy_from_slice(bytes);
    arr
}
