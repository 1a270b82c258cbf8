//! Path utilities for modstrip

use std::path::{Path, PathBuf};

/// Per-user configuration directory (`<config_dir>/modstrip`)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("modstrip"))
}

/// Default config file path (`<config_dir>/modstrip/config.toml`)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Hooks directory of a repository checkout (`<repo>/.git/hooks`)
pub fn hooks_dir(repo: &Path) -> PathBuf {
    repo.join(".git").join("hooks")
}

pub fn pre_commit_path(repo: &Path) -> PathBuf {
    hooks_dir(repo).join("pre-commit")
}

pub fn post_commit_path(repo: &Path) -> PathBuf {
    hooks_dir(repo).join("post-commit")
}
