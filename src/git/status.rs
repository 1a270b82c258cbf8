//! Git index status for a single file

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::error::ErrorClass;

#[derive(Error, Debug)]
pub enum GitStatusError {
    #[error("Failed to run git")]
    Io(#[from] std::io::Error),
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("Failed to parse git output: {0}")]
    ParseError(String),
}

impl GitStatusError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Transport
    }
}

/// Index (staging area) state of a file, as reported in the first column of
/// `git status --porcelain`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingStatus {
    Unmodified,
    Untracked,
    Ignored,
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    UpdatedButUnmerged,
}

impl StagingStatus {
    /// Map a porcelain index code onto a status
    pub fn from_index_code(code: u8) -> Option<Self> {
        match code {
            b' ' => Some(StagingStatus::Unmodified),
            b'?' => Some(StagingStatus::Untracked),
            b'!' => Some(StagingStatus::Ignored),
            // A type change is a staged modification of the path
            b'M' | b'T' => Some(StagingStatus::Modified),
            b'A' => Some(StagingStatus::Added),
            b'D' => Some(StagingStatus::Deleted),
            b'R' => Some(StagingStatus::Renamed),
            b'C' => Some(StagingStatus::Copied),
            b'U' => Some(StagingStatus::UpdatedButUnmerged),
            _ => None,
        }
    }

    /// Whether the change would be part of the next commit
    pub fn is_staged(&self) -> bool {
        matches!(
            self,
            StagingStatus::Added
                | StagingStatus::Copied
                | StagingStatus::Modified
                | StagingStatus::Renamed
                | StagingStatus::UpdatedButUnmerged
        )
    }

    /// Parse `git status --porcelain=v1 -z` output for a single pathspec.
    /// No output means git has nothing to report, i.e. the file is unmodified.
    fn parse_porcelain(output: &[u8]) -> Result<Self, GitStatusError> {
        let entry = output.split(|b| *b == 0).next().unwrap_or_default();
        if entry.is_empty() {
            return Ok(StagingStatus::Unmodified);
        }

        if entry.len() < 4 || entry[2] != b' ' {
            return Err(GitStatusError::ParseError(
                String::from_utf8_lossy(entry).to_string(),
            ));
        }

        Self::from_index_code(entry[0]).ok_or_else(|| {
            GitStatusError::ParseError(format!(
                "unknown index status '{}'",
                entry[0] as char
            ))
        })
    }
}

/// Answers whether a file is staged for the next commit
pub trait StagingProbe {
    /// `file` is relative to `dir`
    fn is_staged(&self, dir: &Path, file: &str) -> Result<bool, GitStatusError>;
}

/// [`StagingProbe`] backed by the `git` binary
#[derive(Debug, Clone)]
pub struct GitStatusProbe {
    git: PathBuf,
}

impl Default for GitStatusProbe {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitStatusProbe {
    pub fn new(git: impl Into<PathBuf>) -> Self {
        Self { git: git.into() }
    }

    /// Index status of `file`, run from `dir`
    pub fn staging_status(&self, dir: &Path, file: &str) -> Result<StagingStatus, GitStatusError> {
        let output = Command::new(&self.git)
            .args(["status", "--porcelain=v1", "-z", "--", file])
            .current_dir(dir)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitStatusError::CommandFailed(stderr.trim().to_string()));
        }

        StagingStatus::parse_porcelain(&output.stdout)
    }
}

impl StagingProbe for GitStatusProbe {
    fn is_staged(&self, dir: &Path, file: &str) -> Result<bool, GitStatusError> {
        let status = self.staging_status(dir, file)?;
        tracing::debug!(
            dir = %dir.display(),
            file,
            status = ?status,
            "Queried staging status"
        );
        Ok(status.is_staged())
    }
}
