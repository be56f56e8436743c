use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in passvault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Header authentication failed on open.  Deliberately generic:
    /// a wrong password, a corrupted header, and tampered KDF
    /// parameters are indistinguishable from the caller's side.
    #[error("Wrong password or corrupted vault header")]
    BadPassword,

    /// A record failed authentication after the header verified.
    /// The open is aborted; no partial vault is ever exposed.
    #[error("Integrity check failed — vault record is corrupted or tampered")]
    Integrity,

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidFormat(String),

    #[error("Entry {0} not found")]
    NotFound(u32),

    #[error("Vault at {0} is locked by another session")]
    Locked(PathBuf),

    #[error("Vault session is closed")]
    SessionClosed,

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Generator errors ---
    #[error("Password generation failed: {0}")]
    Generator(String),

    // --- TOTP errors ---
    #[error("TOTP error: {0}")]
    Totp(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),
}

/// Convenience type alias for passvault results.
pub type Result<T> = std::result::Result<T, VaultError>;
