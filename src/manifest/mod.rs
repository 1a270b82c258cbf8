//! Dependency manifest abstraction
//!
//! A manifest is parsed from bytes, exposes its replace directives, can drop
//! directives by their original module key and can be serialized back.

mod gomod;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::ErrorClass;

pub use gomod::{GoMod, GoModFormat};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}: manifest is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

impl ManifestError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Transport
    }
}

/// A single `replace old [version] => new [version]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceDirective {
    pub old_path: String,
    pub old_version: Option<String>,
    pub new_path: String,
    pub new_version: Option<String>,
}

impl ReplaceDirective {
    pub fn new(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            old_path: old_path.into(),
            old_version: None,
            new_path: new_path.into(),
            new_version: None,
        }
    }

    pub fn with_old_version(mut self, version: impl Into<String>) -> Self {
        self.old_version = Some(version.into());
        self
    }

    pub fn with_new_version(mut self, version: impl Into<String>) -> Self {
        self.new_version = Some(version.into());
        self
    }

    /// Whether the replacement points at a relative filesystem path
    pub fn is_local(&self) -> bool {
        self.new_path.starts_with("..") || self.new_path.starts_with("./")
    }
}

impl std::fmt::Display for ReplaceDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.old_path)?;
        if let Some(version) = &self.old_version {
            write!(f, " {}", version)?;
        }
        write!(f, " => {}", self.new_path)?;
        if let Some(version) = &self.new_version {
            write!(f, " {}", version)?;
        }
        Ok(())
    }
}

/// A parsed manifest owned by a single strip call
pub trait Manifest {
    /// Replace directives in file order
    fn directives(&self) -> Vec<ReplaceDirective>;

    /// Drop every directive whose original module matches `(old_path, old_version)`.
    /// Dropping a key that is not present is not an error.
    fn drop_replace(
        &mut self,
        old_path: &str,
        old_version: Option<&str>,
    ) -> Result<(), ManifestError>;

    fn format(&self) -> Result<Vec<u8>, ManifestError>;
}

/// Parser for one manifest format
pub trait ManifestFormat {
    type Manifest: Manifest;

    /// `path` is only used to give errors some context
    fn parse(&self, path: &Path, data: &[u8]) -> Result<Self::Manifest, ManifestError>;
}

/// The subset of `directives` that point at local directories
pub fn local_directives(directives: &[ReplaceDirective]) -> Vec<ReplaceDirective> {
    directives
        .iter()
        .filter(|d| d.is_local())
        .cloned()
        .collect()
}
