//! Credential entry types stored inside a vault.
//!
//! `PasswordEntry` is the decrypted in-memory form; on disk each entry
//! is one sealed record (see `format`).  The string fields are wiped
//! when an entry is dropped, so plaintext does not linger after a
//! session closes or a snapshot goes out of scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A single credential entry.
///
/// `id` is unique within the vault for its whole lifetime: ids are
/// assigned from a monotonic counter and never reused, even after the
/// entry is deleted.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct PasswordEntry {
    #[zeroize(skip)]
    pub id: u32,

    /// Display name of the entry (e.g. the service name).
    pub title: String,

    pub username: String,

    /// The stored password.
    pub secret: String,

    pub url: String,

    pub notes: String,

    /// Base32-encoded TOTP secret, empty when the entry has none.
    /// Feed it to `totp::generate_code` for the current code.
    #[serde(default)]
    pub totp_secret: String,

    /// Set when the entry is created and refreshed on every update.
    #[zeroize(skip)]
    pub last_modified: DateTime<Utc>,
}

// Secret material never appears in debug output.
impl std::fmt::Debug for PasswordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordEntry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("totp_secret", &"<redacted>")
            .field("url", &self.url)
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// Caller-supplied fields for a new entry, before an id is assigned.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct EntryDraft {
    pub title: String,
    pub username: String,
    pub secret: String,
    pub url: String,
    pub notes: String,
    pub totp_secret: String,
}

impl EntryDraft {
    /// Promote the draft into a full entry with the given id.
    pub(crate) fn into_entry(mut self, id: u32) -> PasswordEntry {
        PasswordEntry {
            id,
            title: std::mem::take(&mut self.title),
            username: std::mem::take(&mut self.username),
            secret: std::mem::take(&mut self.secret),
            url: std::mem::take(&mut self.url),
            notes: std::mem::take(&mut self.notes),
            totp_secret: std::mem::take(&mut self.totp_secret),
            last_modified: Utc::now(),
        }
    }
}
