//! The vault session: open/close lifecycle and entry CRUD.
//!
//! `Vault` is an explicit session object owned by the caller — there is
//! no process-global handle, so several vaults can be open in one
//! process.  While unlocked it holds the decrypted entry index and the
//! master key; `close` (or drop) wipes both.
//!
//! Mutations are serialized by the `&mut self` receivers; the advisory
//! file lock extends the single-writer guarantee across processes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::crypto::cipher;
use crate::crypto::kdf::{derive_key, generate_salt, KdfParams, SALT_LEN};
use crate::crypto::keys::MasterKey;
use crate::errors::{Result, VaultError};
use crate::mem::SecretBuffer;

use super::entry::{EntryDraft, PasswordEntry};
use super::format::{self, record_aad, HeaderMeta, RawRecord};
use super::lock::VaultLock;

/// An unlocked vault session.
///
/// Create one with `Vault::create` or `Vault::open`, then use its
/// methods to manage entries.  Every mutation is persisted to disk
/// atomically before it returns.
pub struct Vault {
    /// Path to the `.vault` file on disk.
    path: PathBuf,

    /// KDF parameters, fixed at vault creation.
    kdf: KdfParams,

    /// Salt for key derivation, fixed at vault creation (a password
    /// change rotates it).
    salt: [u8; SALT_LEN],

    /// Sealed header metadata (creation time, id counter).
    meta: HeaderMeta,

    /// Decrypted entries, keyed and iterated by id.
    entries: BTreeMap<u32, PasswordEntry>,

    /// Sealed blobs mirroring `entries`.  Kept so an unchanged entry
    /// is written back as-is instead of being re-encrypted.
    sealed: BTreeMap<u32, Vec<u8>>,

    /// The derived master key; `None` once the session is closed.
    master_key: Option<MasterKey>,

    /// Exclusive lock held for the lifetime of the session.
    lock: Option<VaultLock>,
}

impl Vault {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a brand-new vault file at `path`.
    ///
    /// Generates a random salt, derives the master key from the
    /// password, and writes an empty container to disk.  Pass `None`
    /// for `kdf_params` to use the defaults (64 MB, 3 iterations,
    /// 4 lanes).
    pub fn create(path: &Path, password: &[u8], kdf_params: Option<&KdfParams>) -> Result<Self> {
        if path.exists() {
            return Err(VaultError::AlreadyExists(path.to_path_buf()));
        }

        let lock = VaultLock::acquire(path)?;

        let kdf = kdf_params.copied().unwrap_or_default();
        let salt = generate_salt();

        let mut key_bytes = derive_key(password, &salt, &kdf)?;
        let master_key = MasterKey::new(key_bytes);
        key_bytes.zeroize();

        let mut vault = Self {
            path: path.to_path_buf(),
            kdf,
            salt,
            meta: HeaderMeta {
                created_at: Utc::now(),
                next_id: 1,
            },
            entries: BTreeMap::new(),
            sealed: BTreeMap::new(),
            master_key: Some(master_key),
            lock: Some(lock),
        };

        vault.save()?;

        info!(path = %path.display(), "created new vault");
        Ok(vault)
    }

    /// Open an existing vault file and decrypt every entry.
    ///
    /// Fail-closed: the first record that fails authentication aborts
    /// the whole open with `Integrity` — no partial vault is ever
    /// exposed.  A header that fails authentication yields
    /// `BadPassword`, which deliberately does not distinguish a wrong
    /// password from corrupted or tampered KDF parameters.
    pub fn open(path: &Path, password: &[u8]) -> Result<Self> {
        let lock = VaultLock::acquire(path)?;

        let raw = format::read_container(path)?;

        // Any derivation failure here means the stored parameters are
        // garbage; reported as BadPassword so the error does not act
        // as an oracle on what exactly went wrong.
        let mut key_bytes =
            derive_key(password, &raw.salt, &raw.kdf).map_err(|_| VaultError::BadPassword)?;
        let master_key = MasterKey::new(key_bytes);
        key_bytes.zeroize();

        // The prefix bytes are the header's associated data, so a
        // tampered version field, KDF parameter, or salt fails here.
        let mut header_key = master_key.derive_header_key()?;
        let meta_plain = cipher::open(&header_key, &raw.header_blob, &raw.prefix)
            .map_err(|_| VaultError::BadPassword);
        header_key.zeroize();
        let meta_buf = SecretBuffer::from_vec(meta_plain?);

        let meta: HeaderMeta = serde_json::from_slice(&meta_buf)
            .map_err(|e| VaultError::Serialization(format!("header: {e}")))?;

        let mut entries = BTreeMap::new();
        let mut sealed = BTreeMap::new();

        for record in raw.records {
            let mut record_key = master_key.derive_record_key(record.id)?;
            let plain = cipher::open(&record_key, &record.blob, &record_aad(record.id))
                .map_err(|_| VaultError::Integrity);
            record_key.zeroize();
            let plain_buf = SecretBuffer::from_vec(plain?);

            let entry: PasswordEntry = serde_json::from_slice(&plain_buf)
                .map_err(|e| VaultError::Serialization(format!("entry {}: {e}", record.id)))?;

            // The sealed payload must agree with its framing and with
            // the id counter, or the container has been rearranged.
            if entry.id != record.id || entry.id >= meta.next_id {
                return Err(VaultError::Integrity);
            }

            sealed.insert(record.id, record.blob);
            entries.insert(record.id, entry);
        }

        debug!(path = %path.display(), entries = entries.len(), "vault unlocked");

        Ok(Self {
            path: path.to_path_buf(),
            kdf: raw.kdf,
            salt: raw.salt,
            meta,
            entries,
            sealed,
            master_key: Some(master_key),
            lock: Some(lock),
        })
    }

    /// Lock the session: wipe the master key and every decrypted
    /// entry, and release the file lock.
    ///
    /// Idempotent — closing an already-closed session is a no-op.
    pub fn close(&mut self) {
        if self.master_key.is_none() {
            return;
        }

        // MasterKey and PasswordEntry both zeroize on drop.
        self.master_key = None;
        self.entries.clear();
        self.sealed.clear();

        // Dropping the guard releases the advisory lock.
        drop(self.lock.take());

        debug!(path = %self.path.display(), "vault closed");
    }

    /// Whether this session is still unlocked.
    pub fn is_open(&self) -> bool {
        self.master_key.is_some()
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Add a new entry and persist it.
    ///
    /// Assigns the next unused id from the monotonic counter — ids are
    /// never reused, even after deletions — and returns it.
    pub fn add_entry(&mut self, draft: EntryDraft) -> Result<u32> {
        self.require_open()?;

        let id = self.meta.next_id;
        let entry = draft.into_entry(id);

        let blob = self.seal_entry(&entry)?;
        self.meta.next_id += 1;
        self.sealed.insert(id, blob);
        self.entries.insert(id, entry);

        self.save()?;
        Ok(id)
    }

    /// Replace an existing entry, re-sealing it with a fresh nonce.
    ///
    /// `entry.id` must reference an existing entry; fails with
    /// `NotFound` otherwise.  `last_modified` is refreshed.
    pub fn update_entry(&mut self, mut entry: PasswordEntry) -> Result<()> {
        self.require_open()?;

        if !self.entries.contains_key(&entry.id) {
            return Err(VaultError::NotFound(entry.id));
        }

        entry.last_modified = Utc::now();

        let blob = self.seal_entry(&entry)?;
        self.sealed.insert(entry.id, blob);
        self.entries.insert(entry.id, entry);

        self.save()
    }

    /// Remove an entry by id and persist the change.
    pub fn delete_entry(&mut self, id: u32) -> Result<()> {
        self.require_open()?;

        if self.entries.remove(&id).is_none() {
            return Err(VaultError::NotFound(id));
        }
        self.sealed.remove(&id);

        self.save()
    }

    /// Return a snapshot of all entries, ordered by id.
    ///
    /// No decryption happens here — entries were authenticated and
    /// decrypted once, at open time.
    pub fn get_all_entries(&self) -> Result<Vec<PasswordEntry>> {
        self.require_open()?;
        Ok(self.entries.values().cloned().collect())
    }

    /// Re-encrypt the whole vault under a new master password.
    ///
    /// Rotates the salt, re-derives the key, re-seals the header and
    /// every record, and writes the result atomically.  The stored KDF
    /// parameters are kept.
    pub fn change_password(&mut self, new_password: &[u8]) -> Result<()> {
        self.require_open()?;

        let new_salt = generate_salt();
        let mut key_bytes = derive_key(new_password, &new_salt, &self.kdf)?;
        let new_key = MasterKey::new(key_bytes);
        key_bytes.zeroize();

        self.salt = new_salt;
        self.master_key = Some(new_key);

        // Every record key depends on the master key, so every blob
        // must be rebuilt.
        let mut resealed = BTreeMap::new();
        for entry in self.entries.values() {
            resealed.insert(entry.id, self.seal_entry(entry)?);
        }
        self.sealed = resealed;

        self.save()?;
        info!(path = %self.path.display(), "vault password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of entries in the vault.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the vault creation timestamp.
    pub fn created_at(&self) -> chrono::DateTime<Utc> {
        self.meta.created_at
    }

    /// Returns the KDF parameters this vault was created with.
    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_open(&self) -> Result<()> {
        if self.master_key.is_some() {
            Ok(())
        } else {
            Err(VaultError::SessionClosed)
        }
    }

    fn key(&self) -> Result<&MasterKey> {
        self.master_key.as_ref().ok_or(VaultError::SessionClosed)
    }

    /// Serialize and seal one entry under its per-record key.
    ///
    /// The plaintext buffer and the record key are wiped before this
    /// returns, on success and on failure alike.
    fn seal_entry(&self, entry: &PasswordEntry) -> Result<Vec<u8>> {
        let plain = serde_json::to_vec(entry)
            .map_err(|e| VaultError::Serialization(format!("entry {}: {e}", entry.id)))?;
        let plain = SecretBuffer::from_vec(plain);

        let mut record_key = self.key()?.derive_record_key(entry.id)?;
        let blob = cipher::seal(&record_key, &plain, &record_aad(entry.id));
        record_key.zeroize();

        blob
    }

    /// Seal the header and write the whole container atomically.
    fn save(&mut self) -> Result<()> {
        let meta_bytes = serde_json::to_vec(&self.meta)
            .map_err(|e| VaultError::Serialization(format!("header: {e}")))?;

        let prefix = format::encode_prefix(&self.kdf, &self.salt);

        let mut header_key = self.key()?.derive_header_key()?;
        let header_blob = cipher::seal(&header_key, &meta_bytes, &prefix);
        header_key.zeroize();
        let header_blob = header_blob?;

        let records: Vec<RawRecord> = self
            .sealed
            .iter()
            .map(|(&id, blob)| RawRecord {
                id,
                blob: blob.clone(),
            })
            .collect();

        format::write_container(&self.path, &self.kdf, &self.salt, &header_blob, &records)
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        self.close();
    }
}
