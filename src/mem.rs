//! Secure memory handling for transient secret bytes.
//!
//! Every buffer that holds plaintext secret material (the master
//! password, a derived key, a decrypted record payload) goes through
//! this module so it is guaranteed to be overwritten with zeros on
//! every exit path — normal return, early return, or propagated error.

use std::ops::{Deref, DerefMut};

use zeroize::Zeroize;

use crate::errors::Result;

/// An owned byte buffer that zeroizes its contents on drop.
///
/// Used for intermediate plaintext that outlives a single expression,
/// e.g. a decrypted record payload awaiting deserialization.
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Allocate a zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len],
        }
    }

    /// Take ownership of an existing byte vector.
    ///
    /// The vector is wiped when the buffer is dropped; callers must not
    /// keep a copy of the source bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Deref for SecretBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for SecretBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Run `f` with a scoped zero-filled buffer of `len` bytes.
///
/// The buffer is wiped when the closure returns, whether it succeeds
/// or propagates an error.
pub fn with_secret_buffer<T>(len: usize, f: impl FnOnce(&mut [u8]) -> Result<T>) -> Result<T> {
    let mut buf = SecretBuffer::new(len);
    f(&mut buf)
}
