//! Advisory per-vault file locking.
//!
//! Enforces the single-writer model: only one session may hold a vault
//! open at a time.  The lock is taken on a `.lock` sidecar file rather
//! than the vault itself, because atomic saves replace the vault inode
//! on every write and a lock on a replaced inode protects nothing.
//!
//! Uses non-blocking `flock(2)` on Unix.  The lock is released when
//! the guard is dropped, i.e. when the session closes; the sidecar is
//! removed at the same time so it does not accumulate next to every
//! vault ever opened.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, VaultError};

/// Guard holding the exclusive lock for one vault file.
///
/// Dropping the guard removes the sidecar and closes the descriptor,
/// which releases the lock.
pub struct VaultLock {
    _file: File,
    lock_path: PathBuf,
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        // Best-effort cleanup; the flock itself is released when the
        // descriptor closes, whether or not the unlink succeeds.
        let _ = fs::remove_file(&self.lock_path);
    }
}

impl VaultLock {
    /// Try to acquire the exclusive lock for `vault_path`.
    ///
    /// Fails immediately with `Locked` if another session (in this
    /// process or any other) already holds it — never blocks.
    pub fn acquire(vault_path: &Path) -> Result<Self> {
        let lock_path = sidecar_path(vault_path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;

        match try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(path = %lock_path.display(), "acquired vault lock");
                Ok(Self {
                    _file: file,
                    lock_path,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Err(VaultError::Locked(vault_path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the sidecar lock file this guard holds.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

/// `.lock` sidecar next to the vault file.
fn sidecar_path(vault_path: &Path) -> PathBuf {
    let mut name = vault_path
        .file_name()
        .unwrap_or_default()
        .to_os_string();
    name.push(".lock");
    vault_path.with_file_name(name)
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> io::Result<()> {
    // No advisory locking on this platform; exclusivity is best-effort.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_first_held() {
        let dir = TempDir::new().unwrap();
        let vault_path = dir.path().join("test.vault");

        let first = VaultLock::acquire(&vault_path).unwrap();
        let second = VaultLock::acquire(&vault_path);
        assert!(matches!(second, Err(VaultError::Locked(_))));

        drop(first);
        VaultLock::acquire(&vault_path).expect("lock must be free after release");
    }

    #[test]
    fn sidecar_is_removed_on_release() {
        let dir = TempDir::new().unwrap();
        let vault_path = dir.path().join("test.vault");

        let lock = VaultLock::acquire(&vault_path).unwrap();
        let sidecar = lock.path().to_path_buf();
        assert!(sidecar.exists());

        drop(lock);
        assert!(!sidecar.exists(), "sidecar must be cleaned up on drop");
    }

    #[test]
    fn sidecar_lives_next_to_vault() {
        let dir = TempDir::new().unwrap();
        let vault_path = dir.path().join("work.vault");

        let lock = VaultLock::acquire(&vault_path).unwrap();
        assert_eq!(lock.path(), dir.path().join("work.vault.lock"));
    }
}
