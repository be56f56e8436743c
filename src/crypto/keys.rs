//! Sub-key derivation using HKDF-SHA256.
//!
//! From the single Argon2id-derived master key we derive:
//! - A dedicated **header key** for the container's encrypted header.
//! - A unique **per-record** encryption key for each entry id, so that
//!   compromising one record key does not reveal the others.
//!
//! HKDF (RFC 5869) uses the master key as input keying material and a
//! context string (`info`) to produce independent sub-keys.  The
//! `extract` step is skipped because the master key already has high
//! entropy (it came from Argon2id).

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of derived sub-keys (256 bits).
const KEY_LEN: usize = 32;

fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| VaultError::KeyDerivation(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A wrapper around the 32-byte master key that automatically zeroes
/// its memory when dropped.
///
/// The key lives exactly as long as the vault session that owns it.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Derive the header encryption key.
    pub fn derive_header_key(&self) -> Result<[u8; KEY_LEN]> {
        hkdf_derive(&self.bytes, b"passvault-header")
    }

    /// Derive the per-record encryption key for a given entry id.
    pub fn derive_record_key(&self, id: u32) -> Result<[u8; KEY_LEN]> {
        let info = format!("passvault-record:{id}");
        hkdf_derive(&self.bytes, info.as_bytes())
    }
}
