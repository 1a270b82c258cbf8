//! Strip/restore transaction over a manifest's local replace directives
//!
//! `strip` backs the manifest up and rewrites it without local replace
//! directives; `restore` copies the backup back and deletes it. The backup
//! file is both the data to restore and the marker that a transaction is
//! open, so at most one strip can be pending per directory.
//!
//! Once the backup exists, later failures (parse errors, git errors) leave it
//! in place. The transaction then stays open until `restore` is called or the
//! backup is deleted by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::backup::{BackupStore, FsBackupStore};
use crate::config::{Config, DEFAULT_BACKUP_FILENAME, DEFAULT_MANIFEST_FILENAME};
use crate::error::ErrorClass;
use crate::git::{GitStatusError, GitStatusProbe, StagingProbe};
use crate::manifest::{
    local_directives, GoModFormat, Manifest, ManifestError, ManifestFormat, ReplaceDirective,
};

#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("no manifest file at {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("backup file {} exists already", .0.display())]
    BackupAlreadyExists(PathBuf),
    #[error("backup file {} does not exist", .0.display())]
    BackupMissing(PathBuf),
    #[error("failed to create backup at {}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse manifest at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
    #[error("failed to rewrite manifest at {}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
    #[error("failed to write modified manifest to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to query staging status of {}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: GitStatusError,
    },
    #[error("failed to restore {} from backup", path.display())]
    Restore {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The manifest was restored but the backup is still on disk
    #[error("manifest restored, but failed to remove backup {}", path.display())]
    BackupNotRemoved {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReplaceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ReplaceError::PathNotFound(_)
            | ReplaceError::ManifestNotFound(_)
            | ReplaceError::BackupAlreadyExists(_)
            | ReplaceError::BackupMissing(_) => ErrorClass::Precondition,
            _ => ErrorClass::Transport,
        }
    }
}

/// What a successful strip did to the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    /// The manifest was rewritten without these directives
    Stripped { removed: Vec<ReplaceDirective> },
    /// Nothing to strip; the manifest was left byte-identical
    NoLocalDirectives,
    /// Only staged manifests are stripped and this one is not staged
    NotStaged,
}

impl StripOutcome {
    pub fn changed_manifest(&self) -> bool {
        matches!(self, StripOutcome::Stripped { .. })
    }
}

#[derive(Debug)]
struct ManifestPaths {
    dir: PathBuf,
    manifest: PathBuf,
    backup: PathBuf,
}

/// Strips and restores local replace directives in a directory's manifest
#[derive(Debug, Clone)]
pub struct ReplaceTransaction<F = GoModFormat, S = GitStatusProbe, B = FsBackupStore> {
    format: F,
    staging: S,
    backup: B,
    manifest_filename: String,
    backup_filename: String,
}

impl ReplaceTransaction {
    /// Production transaction for `go.mod`, using the configured file names and git binary
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            GoModFormat,
            GitStatusProbe::new(config.git_binary()),
            FsBackupStore,
        )
        .with_filenames(&config.manifest_filename, &config.backup_filename)
    }
}

impl<F, S, B> ReplaceTransaction<F, S, B>
where
    F: ManifestFormat,
    S: StagingProbe,
    B: BackupStore,
{
    pub fn new(format: F, staging: S, backup: B) -> Self {
        Self {
            format,
            staging,
            backup,
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
            backup_filename: DEFAULT_BACKUP_FILENAME.to_string(),
        }
    }

    pub fn with_filenames(mut self, manifest: &str, backup: &str) -> Self {
        self.manifest_filename = manifest.to_string();
        self.backup_filename = backup.to_string();
        self
    }

    pub fn manifest_filename(&self) -> &str {
        &self.manifest_filename
    }

    pub fn backup_filename(&self) -> &str {
        &self.backup_filename
    }

    /// Resolve `dir` and check that it and its manifest exist
    fn locate(&self, dir: &Path) -> Result<ManifestPaths, ReplaceError> {
        let dir = fs::canonicalize(dir).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ReplaceError::PathNotFound(dir.to_path_buf()),
            _ => ReplaceError::Io {
                path: dir.to_path_buf(),
                source,
            },
        })?;

        let manifest = dir.join(&self.manifest_filename);
        let exists = manifest.try_exists().map_err(|source| ReplaceError::Io {
            path: manifest.clone(),
            source,
        })?;
        if !exists {
            return Err(ReplaceError::ManifestNotFound(manifest));
        }

        let backup = dir.join(&self.backup_filename);
        Ok(ManifestPaths {
            dir,
            manifest,
            backup,
        })
    }

    /// Back up the manifest in `dir` and remove its local replace directives.
    ///
    /// With `staged_only`, the manifest is only rewritten when it is staged
    /// for commit. The backup is created in every successful case, so each
    /// strip must be paired with a [`restore`](Self::restore).
    pub fn strip(&self, dir: &Path, staged_only: bool) -> Result<StripOutcome, ReplaceError> {
        let paths = self.locate(dir)?;

        self.backup
            .create(&paths.manifest, &paths.backup)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => {
                    ReplaceError::BackupAlreadyExists(paths.backup.clone())
                }
                _ => ReplaceError::Backup {
                    path: paths.backup.clone(),
                    source,
                },
            })?;
        tracing::info!(
            from = %paths.manifest.display(),
            backup = %paths.backup.display(),
            "Created backup"
        );

        let data = fs::read(&paths.manifest).map_err(|source| ReplaceError::Io {
            path: paths.manifest.clone(),
            source,
        })?;
        let mut manifest =
            self.format
                .parse(&paths.manifest, &data)
                .map_err(|source| ReplaceError::Parse {
                    path: paths.manifest.clone(),
                    source,
                })?;

        let local = local_directives(&manifest.directives());
        if local.is_empty() {
            tracing::debug!(
                manifest = %paths.manifest.display(),
                "No local replace directives, leaving manifest untouched"
            );
            return Ok(StripOutcome::NoLocalDirectives);
        }

        if staged_only {
            let staged = self
                .staging
                .is_staged(&paths.dir, &self.manifest_filename)
                .map_err(|source| ReplaceError::Staging {
                    path: paths.manifest.clone(),
                    source,
                })?;
            if !staged {
                tracing::info!(
                    manifest = %paths.manifest.display(),
                    "Manifest is not staged, leaving it untouched"
                );
                return Ok(StripOutcome::NotStaged);
            }
        }

        let rewrite_err = |source| ReplaceError::Rewrite {
            path: paths.manifest.clone(),
            source,
        };
        for directive in &local {
            manifest
                .drop_replace(&directive.old_path, directive.old_version.as_deref())
                .map_err(rewrite_err)?;
        }
        let formatted = manifest.format().map_err(rewrite_err)?;

        fs::write(&paths.manifest, formatted).map_err(|source| ReplaceError::Write {
            path: paths.manifest.clone(),
            source,
        })?;

        tracing::info!(
            manifest = %paths.manifest.display(),
            backup = %paths.backup.display(),
            removed = local.len(),
            "Removed local replace directives"
        );

        Ok(StripOutcome::Stripped { removed: local })
    }

    /// Put the backed-up manifest back in place and delete the backup.
    ///
    /// `staged_only` mirrors [`strip`](Self::strip) so both halves of a hook
    /// take the same flags; a pending backup is always restored.
    pub fn restore(&self, dir: &Path, staged_only: bool) -> Result<(), ReplaceError> {
        let paths = self.locate(dir)?;

        let exists = paths.backup.try_exists().map_err(|source| ReplaceError::Io {
            path: paths.backup.clone(),
            source,
        })?;
        if !exists {
            return Err(ReplaceError::BackupMissing(paths.backup));
        }

        self.backup
            .restore(&paths.backup, &paths.manifest)
            .map_err(|source| ReplaceError::Restore {
                path: paths.manifest.clone(),
                source,
            })?;

        self.backup
            .remove(&paths.backup)
            .map_err(|source| ReplaceError::BackupNotRemoved {
                path: paths.backup.clone(),
                source,
            })?;

        tracing::info!(
            manifest = %paths.manifest.display(),
            removed_backup = %paths.backup.display(),
            staged_only,
            "Restored manifest from backup"
        );

        Ok(())
    }

    /// Whether a strip is pending in `dir`
    pub fn is_open(&self, dir: &Path) -> Result<bool, ReplaceError> {
        let paths = self.locate(dir)?;
        paths.backup.try_exists().map_err(|source| ReplaceError::Io {
            path: paths.backup,
            source,
        })
    }
}
