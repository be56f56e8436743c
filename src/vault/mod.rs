//! Vault module — the encrypted credential container.
//!
//! This module provides:
//! - `PasswordEntry` and `EntryDraft` types (`entry`)
//! - The binary container codec with atomic replace (`format`)
//! - Advisory per-vault file locking (`lock`)
//! - The `Vault` session object with the CRUD contract (`session`)

pub mod entry;
pub mod format;
pub mod lock;
pub mod session;

// Re-export the most commonly used items.
pub use entry::{EntryDraft, PasswordEntry};
pub use format::{HeaderMeta, CURRENT_VERSION};
pub use lock::VaultLock;
pub use session::Vault;
