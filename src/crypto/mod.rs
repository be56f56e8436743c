//! Cryptographic primitives for passvault.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with associated data (`cipher`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HKDF-based sub-key derivation and the `MasterKey` wrapper (`keys`)

pub mod cipher;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, ...};
pub use cipher::{open, seal};
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::MasterKey;
