//! Git hook installation
//!
//! The pre-commit hook strips local replace directives right before a commit
//! and the post-commit hook restores them. Each hook owns exactly one line,
//! identified by the configured tag.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::editor::{self, EditError};
use crate::config::Config;
use crate::error::ErrorClass;
use crate::util::paths::{hooks_dir, post_commit_path, pre_commit_path};

#[derive(Error, Debug)]
pub enum HookError {
    #[error("hooks directory does not exist: {}", .0.display())]
    HooksDirMissing(PathBuf),
    #[error("pre-commit hook already exists: {}", .0.display())]
    PreCommitExists(PathBuf),
    #[error("post-commit hook already exists: {}", .0.display())]
    PostCommitExists(PathBuf),
    #[error("hook file does not exist: {}", .0.display())]
    HookFileMissing(PathBuf),
    #[error("failed to edit hook {}", path.display())]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },
    #[error("failed to write hook {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HookError {
    pub fn class(&self) -> ErrorClass {
        match self {
            HookError::HooksDirMissing(_)
            | HookError::PreCommitExists(_)
            | HookError::PostCommitExists(_)
            | HookError::HookFileMissing(_) => ErrorClass::Precondition,
            HookError::Edit { source, .. } => source.class(),
            HookError::Io { .. } => ErrorClass::Transport,
        }
    }
}

/// How to treat hook files that already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookInstallMode {
    /// Refuse to touch existing hooks
    #[default]
    Create,
    /// Add or update the tagged line inside existing hooks
    Merge,
}

/// Hook files written by [`HookInstaller::install`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledHooks {
    pub pre_commit: PathBuf,
    pub post_commit: PathBuf,
}

#[derive(Debug, Clone)]
pub struct HookInstaller {
    tag: String,
    manifest_filename: String,
    shebang: String,
}

impl HookInstaller {
    pub fn new(
        tag: impl Into<String>,
        manifest_filename: impl Into<String>,
        shebang: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            manifest_filename: manifest_filename.into(),
            shebang: shebang.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.hook_tag,
            &config.manifest_filename,
            &config.hook_shebang,
        )
    }

    /// Strip, then put the manifest back into the index if it was staged
    pub fn pre_commit_command(&self, base_command: &str) -> String {
        format!(
            "{base} replace --replace-only-if-staged . && {{ git diff --cached --quiet -- {manifest} || git add {manifest}; }}",
            base = base_command,
            manifest = self.manifest_filename,
        )
    }

    pub fn post_commit_command(&self, base_command: &str) -> String {
        format!("{} replace --replace-only-if-staged --undo .", base_command)
    }

    /// Write the pre-commit and post-commit hooks of `repo`
    pub fn install(
        &self,
        repo: &Path,
        base_command: &str,
        mode: HookInstallMode,
    ) -> Result<InstalledHooks, HookError> {
        self.check_hooks_dir(repo)?;

        let hooks = InstalledHooks {
            pre_commit: pre_commit_path(repo),
            post_commit: post_commit_path(repo),
        };
        let pre_commit = self.pre_commit_command(base_command);
        let post_commit = self.post_commit_command(base_command);

        match mode {
            HookInstallMode::Create => {
                if hooks.pre_commit.exists() {
                    return Err(HookError::PreCommitExists(hooks.pre_commit));
                }
                if hooks.post_commit.exists() {
                    return Err(HookError::PostCommitExists(hooks.post_commit));
                }
                if !self.create_new(&hooks.pre_commit, &pre_commit)? {
                    return Err(HookError::PreCommitExists(hooks.pre_commit));
                }
                if !self.create_new(&hooks.post_commit, &post_commit)? {
                    return Err(HookError::PostCommitExists(hooks.post_commit));
                }
            }
            HookInstallMode::Merge => {
                self.merge(&hooks.pre_commit, &pre_commit)?;
                self.merge(&hooks.post_commit, &post_commit)?;
            }
        }

        tracing::info!(
            pre_commit = %hooks.pre_commit.display(),
            post_commit = %hooks.post_commit.display(),
            mode = ?mode,
            "Installed commit hooks"
        );
        Ok(hooks)
    }

    /// Remove the tagged line from both hooks. Hooks without it are left alone.
    pub fn remove(&self, repo: &Path) -> Result<(), HookError> {
        self.check_hooks_dir(repo)?;

        let pre_commit = pre_commit_path(repo);
        let post_commit = post_commit_path(repo);
        for path in [&pre_commit, &post_commit] {
            if !path.exists() {
                return Err(HookError::HookFileMissing(path.clone()));
            }
        }

        for path in [&pre_commit, &post_commit] {
            let changed = editor::ensure_removed(path, &self.tag).map_err(|source| {
                HookError::Edit {
                    path: path.clone(),
                    source,
                }
            })?;
            if !changed {
                tracing::debug!(path = %path.display(), "No tagged line in hook");
            }
        }

        tracing::info!(
            pre_commit = %pre_commit.display(),
            post_commit = %post_commit.display(),
            "Removed hook lines"
        );
        Ok(())
    }

    fn check_hooks_dir(&self, repo: &Path) -> Result<(), HookError> {
        let dir = hooks_dir(repo);
        if !dir.is_dir() {
            return Err(HookError::HooksDirMissing(dir));
        }
        Ok(())
    }

    fn script(&self, command: &str) -> Result<String, EditError> {
        editor::add_or_replace(&self.shebang, command, &self.tag)
    }

    /// Write a fresh hook script. Returns `false` without touching anything
    /// if the file already exists.
    fn create_new(&self, path: &Path, command: &str) -> Result<bool, HookError> {
        let io_err = |source: io::Error| HookError::Io {
            path: path.to_path_buf(),
            source,
        };
        let script = self.script(command).map_err(|source| HookError::Edit {
            path: path.to_path_buf(),
            source,
        })?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(io_err(e)),
        };
        file.write_all(script.as_bytes()).map_err(io_err)?;
        drop(file);

        make_executable(path)?;
        Ok(true)
    }

    fn merge(&self, path: &Path, command: &str) -> Result<(), HookError> {
        if self.create_new(path, command)? {
            return Ok(());
        }

        let changed =
            editor::ensure_line(path, command, &self.tag).map_err(|source| HookError::Edit {
                path: path.to_path_buf(),
                source,
            })?;
        if !changed {
            tracing::debug!(path = %path.display(), "Hook already up to date");
        }
        make_executable(path)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), HookError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        HookError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), HookError> {
    Ok(())
}
