//! Binary vault container format.
//!
//! A `.vault` file has this layout (all integers little-endian):
//!
//! ```text
//! [PVLT: 4 bytes][version: 2 bytes]
//! [kdf_memory_kib: 4][kdf_iterations: 4][kdf_parallelism: 4]
//! [salt: 32 bytes]
//! [header_len: 4][header blob]
//! [record_count: 4]
//! repeated: [id: 4][len: 4][record blob]
//! ```
//!
//! - **Magic** (`PVLT`): identifies the file as a passvault container.
//! - **KDF fields + salt**: stored in the clear so the key can be
//!   re-derived, but covered by the header's associated data so any
//!   tampering fails authentication before the vault is exposed.
//! - **Header blob**: `seal` output (nonce || ciphertext+tag) of the
//!   JSON-serialized `HeaderMeta`.
//! - **Record blobs**: one `seal` output per entry, bound to the entry
//!   id and format version through associated data.
//!
//! Everything here is validated structurally before any cryptographic
//! operation is attempted.  Writes are atomic: temp file in the same
//! directory, then rename over the target, so a crash mid-write leaves
//! the previous container fully intact.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::cipher::{NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::{KdfParams, SALT_LEN};
use crate::errors::{Result, VaultError};

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u16 = 1;

/// Fixed-size prefix: 4 (magic) + 2 (version) + 12 (KDF params) + 32 (salt).
pub const PREFIX_LEN: usize = 50;

/// Smallest possible blob produced by `seal`: nonce + tag, no payload.
const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

/// Plaintext metadata sealed inside the header blob.
///
/// `next_id` is the monotonic entry id counter.  Persisting it in the
/// header is what guarantees ids are never reused across sessions,
/// even after deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderMeta {
    /// When this vault was first created.
    pub created_at: DateTime<Utc>,

    /// The next entry id to assign.
    pub next_id: u32,
}

/// One sealed entry record as stored on disk.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub id: u32,
    /// `seal` output: nonce || ciphertext+tag.
    pub blob: Vec<u8>,
}

/// Everything read from a container file, still sealed.
///
/// The exact prefix bytes are kept so the header can be authenticated
/// over what was actually on disk.
pub struct RawContainer {
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub header_blob: Vec<u8>,
    pub records: Vec<RawRecord>,
    pub prefix: [u8; PREFIX_LEN],
}

/// Build the fixed prefix for the given KDF params and salt.
///
/// These bytes are both the start of the file and the associated data
/// for the header blob, which binds the stored KDF parameters and salt
/// to the master password.
pub fn encode_prefix(kdf: &KdfParams, salt: &[u8; SALT_LEN]) -> [u8; PREFIX_LEN] {
    let mut prefix = [0u8; PREFIX_LEN];
    prefix[0..4].copy_from_slice(MAGIC);
    prefix[4..6].copy_from_slice(&CURRENT_VERSION.to_le_bytes());
    prefix[6..10].copy_from_slice(&kdf.memory_kib.to_le_bytes());
    prefix[10..14].copy_from_slice(&kdf.iterations.to_le_bytes());
    prefix[14..18].copy_from_slice(&kdf.parallelism.to_le_bytes());
    prefix[18..50].copy_from_slice(salt);
    prefix
}

/// Associated data for one entry record: format version || entry id.
///
/// Binding the id prevents one record being substituted for another;
/// binding the version prevents cross-version replay.
pub fn record_aad(id: u32) -> [u8; 6] {
    let mut aad = [0u8; 6];
    aad[0..2].copy_from_slice(&CURRENT_VERSION.to_le_bytes());
    aad[2..6].copy_from_slice(&id.to_le_bytes());
    aad
}

/// Read and structurally validate a container file.
///
/// Rejects malformed input with `InvalidFormat` before any crypto is
/// attempted: bad magic, unsupported version, truncated sections,
/// lengths that overrun the file, duplicate record ids.
pub fn read_container(path: &Path) -> Result<RawContainer> {
    if !path.exists() {
        return Err(VaultError::VaultNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    // Minimum size: prefix + header_len + record_count.
    if data.len() < PREFIX_LEN + 8 {
        return Err(VaultError::InvalidFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    // --- Fixed prefix ---

    if &data[0..4] != MAGIC {
        return Err(VaultError::InvalidFormat("missing PVLT magic bytes".into()));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != CURRENT_VERSION {
        return Err(VaultError::InvalidFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let kdf = KdfParams {
        memory_kib: read_u32(&data, 6)?,
        iterations: read_u32(&data, 10)?,
        parallelism: read_u32(&data, 14)?,
    };

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data[18..50]);

    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&data[0..PREFIX_LEN]);

    // --- Header blob ---

    let mut pos = PREFIX_LEN;
    let header_len = read_len(&data, &mut pos, "header")?;
    let header_blob = read_bytes(&data, &mut pos, header_len, "header")?;

    // --- Records ---

    let record_count = read_u32(&data, pos)? as usize;
    pos += 4;

    let mut records = Vec::with_capacity(record_count.min(1024));
    for _ in 0..record_count {
        let id = read_u32(&data, pos).map_err(|_| truncated("record id"))?;
        pos += 4;
        let len = read_len(&data, &mut pos, "record")?;
        let blob = read_bytes(&data, &mut pos, len, "record")?;

        if records.iter().any(|r: &RawRecord| r.id == id) {
            return Err(VaultError::InvalidFormat(format!("duplicate record id {id}")));
        }
        records.push(RawRecord { id, blob });
    }

    if pos != data.len() {
        return Err(VaultError::InvalidFormat(format!(
            "{} trailing bytes after last record",
            data.len() - pos
        )));
    }

    debug!(records = records.len(), "read vault container");

    Ok(RawContainer {
        kdf,
        salt,
        header_blob,
        records,
        prefix,
    })
}

/// Write a container file to disk **atomically**.
///
/// The records are written in ascending id order so the on-disk layout
/// is deterministic.  The temp file is created in the same directory
/// as the target so the rename is atomic on the same filesystem.
pub fn write_container(
    path: &Path,
    kdf: &KdfParams,
    salt: &[u8; SALT_LEN],
    header_blob: &[u8],
    records: &[RawRecord],
) -> Result<()> {
    let header_len = blob_len(header_blob, "header")?;
    let record_count = u32::try_from(records.len())
        .map_err(|_| VaultError::InvalidFormat("too many records".into()))?;

    let total: usize = PREFIX_LEN
        + 4
        + header_blob.len()
        + 4
        + records.iter().map(|r| 8 + r.blob.len()).sum::<usize>();
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(&encode_prefix(kdf, salt));
    buf.extend_from_slice(&header_len.to_le_bytes());
    buf.extend_from_slice(header_blob);
    buf.extend_from_slice(&record_count.to_le_bytes());

    for record in records {
        let len = blob_len(&record.blob, "record")?;
        buf.extend_from_slice(&record.id.to_le_bytes());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&record.blob);
    }

    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    // Flush the temp file to stable storage before the rename, so the
    // atomic-replace guarantee holds across power loss and not just a
    // process crash.
    let mut tmp = fs::File::create(&tmp_path)?;
    tmp.write_all(&buf)?;
    tmp.sync_all()?;
    drop(tmp);

    fs::rename(&tmp_path, path)?;

    debug!(records = records.len(), "wrote vault container");

    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn truncated(what: &str) -> VaultError {
    VaultError::InvalidFormat(format!("file truncated in {what}"))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32> {
    let end = pos.checked_add(4).ok_or_else(|| truncated("length field"))?;
    let bytes = data
        .get(pos..end)
        .ok_or_else(|| truncated("length field"))?;
    let bytes: [u8; 4] = bytes.try_into().map_err(|_| truncated("length field"))?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_len(data: &[u8], pos: &mut usize, what: &str) -> Result<usize> {
    let len = read_u32(data, *pos).map_err(|_| truncated(what))? as usize;
    *pos += 4;
    if len < MIN_BLOB_LEN {
        return Err(VaultError::InvalidFormat(format!(
            "{what} blob of {len} bytes is too short"
        )));
    }
    Ok(len)
}

fn read_bytes(data: &[u8], pos: &mut usize, len: usize, what: &str) -> Result<Vec<u8>> {
    let end = pos.checked_add(len).ok_or_else(|| truncated(what))?;
    let bytes = data.get(*pos..end).ok_or_else(|| truncated(what))?;
    *pos = end;
    Ok(bytes.to_vec())
}

fn blob_len(blob: &[u8], what: &str) -> Result<u32> {
    u32::try_from(blob.len())
        .map_err(|_| VaultError::InvalidFormat(format!("{what} blob exceeds u32::MAX")))
}
