//! Manifest backup storage
//!
//! The backup file doubles as the lock of an open strip transaction, so it is
//! always created with an exclusive open.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

pub trait BackupStore {
    /// Copy `source` to `backup`. Fails with [`io::ErrorKind::AlreadyExists`]
    /// if `backup` is already present.
    fn create(&self, source: &Path, backup: &Path) -> io::Result<()>;

    /// Overwrite `target` with the contents of `backup`
    fn restore(&self, backup: &Path, target: &Path) -> io::Result<()>;

    fn remove(&self, backup: &Path) -> io::Result<()>;
}

/// [`BackupStore`] on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBackupStore;

impl BackupStore for FsBackupStore {
    fn create(&self, source: &Path, backup: &Path) -> io::Result<()> {
        let mut src = File::open(source)?;
        let permissions = src.metadata()?.permissions();

        let mut dst = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(backup)?;

        let copied = io::copy(&mut src, &mut dst)
            .and_then(|_| dst.set_permissions(permissions))
            .and_then(|_| dst.sync_all());

        if let Err(e) = copied {
            drop(dst);
            // We created the file above, so a partial copy must not keep the lock
            if let Err(remove_err) = fs::remove_file(backup) {
                tracing::warn!(
                    backup = %backup.display(),
                    error = %remove_err,
                    "Failed to remove partial backup"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    fn restore(&self, backup: &Path, target: &Path) -> io::Result<()> {
        fs::copy(backup, target).map(|_| ())
    }

    fn remove(&self, backup: &Path) -> io::Result<()> {
        fs::remove_file(backup)
    }
}
