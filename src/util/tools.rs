//! Lookup of the external `git` binary

use std::path::{Path, PathBuf};

/// Availability of the git binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// Git is available at the given path
    Available(PathBuf),
    /// Git was not found in PATH
    NotFound,
    /// A path was configured in config.toml but it's not an executable
    ConfiguredPathInvalid(PathBuf),
}

/// Detect git, preferring a configured path over a PATH lookup
pub fn detect_git(configured_path: Option<&Path>) -> ToolStatus {
    if let Some(path) = configured_path {
        if is_valid_executable(path) {
            return ToolStatus::Available(path.to_path_buf());
        } else {
            return ToolStatus::ConfiguredPathInvalid(path.to_path_buf());
        }
    }

    match which::which("git") {
        Ok(path) => ToolStatus::Available(path),
        Err(_) => ToolStatus::NotFound,
    }
}

/// Path to run git with.
///
/// An invalid configured path is still returned so the eventual spawn error
/// names the path the user asked for.
pub fn resolve_git(configured_path: Option<&Path>) -> PathBuf {
    match detect_git(configured_path) {
        ToolStatus::Available(path) => path,
        ToolStatus::ConfiguredPathInvalid(path) => {
            tracing::warn!(path = %path.display(), "Configured git path is not executable");
            path
        }
        ToolStatus::NotFound => PathBuf::from("git"),
    }
}

/// Check if a path points to a valid executable
fn is_valid_executable(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            return metadata.is_file() && metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
