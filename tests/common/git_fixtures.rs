//! Git repository test fixtures
//!
//! Provides temporary git repositories holding a Go module, in the states
//! the replace transaction and the hooks care about.

#![allow(dead_code)] // Each integration module uses a different subset

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A go.mod with one local and one remote replace directive
pub const GO_MOD: &str = "module example.com/app

go 1.21

require (
\texample.com/lib v1.2.0
\tgithub.com/c/d v1.0.0
)

replace example.com/lib => ../lib

replace github.com/c/d => github.com/fork/d v1.0.1
";

/// A go.mod without local replace directives
pub const GO_MOD_REMOTE_ONLY: &str = "module example.com/app

go 1.21

require github.com/c/d v1.0.0

replace github.com/c/d => github.com/fork/d v1.0.1
";

/// A temporary git repository for testing
///
/// The repository is cleaned up when the `TestRepo` is dropped.
///
/// # Example
/// ```
/// let repo = TestRepo::with_go_mod(GO_MOD);
/// assert!(repo.path.join("go.mod").exists());
/// ```
pub struct TestRepo {
    /// TempDir handle (keeps directory alive until dropped)
    _dir: TempDir,
    /// Path to the repository root
    pub path: PathBuf,
}

impl TestRepo {
    /// Create a new test repository with an initial commit
    ///
    /// The repository will have:
    /// - Git initialized
    /// - User configured (test@example.com)
    /// - GPG signing disabled (for CI compatibility)
    /// - A README.md file
    /// - One initial commit
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();

        Self::git(&path, &["init"]);
        Self::git(&path, &["config", "user.email", "test@example.com"]);
        Self::git(&path, &["config", "user.name", "Test User"]);
        // Disable GPG signing to ensure tests work on machines with global signing enabled
        Self::git(&path, &["config", "commit.gpgsign", "false"]);
        // Empty init templates skip the hooks directory
        std::fs::create_dir_all(path.join(".git").join("hooks")).unwrap();

        std::fs::write(path.join("README.md"), "# Test Repository\n").unwrap();
        Self::git(&path, &["add", "."]);
        Self::git(&path, &["commit", "-m", "Initial commit"]);

        Self { _dir: dir, path }
    }

    /// Create a repository with `content` committed as go.mod
    pub fn with_go_mod(content: &str) -> Self {
        let repo = Self::new();
        repo.commit_file("go.mod", content, "Add go.mod");
        repo
    }

    /// Create a repository whose go.mod is modified and staged
    pub fn with_staged_go_mod(committed: &str, staged: &str) -> Self {
        let repo = Self::with_go_mod(committed);
        repo.create_file("go.mod", staged);
        repo.stage_file("go.mod");
        repo
    }

    /// Add a file and commit it
    pub fn commit_file(&self, filename: &str, content: &str, message: &str) {
        std::fs::write(self.path.join(filename), content).unwrap();
        Self::git(&self.path, &["add", filename]);
        Self::git(&self.path, &["commit", "-m", message]);
    }

    /// Create a file without staging or committing
    /// Creates parent directories if they don't exist.
    pub fn create_file(&self, filename: &str, content: &str) {
        let file_path = self.path.join(filename);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file_path, content).unwrap();
    }

    pub fn read_file(&self, filename: &str) -> String {
        std::fs::read_to_string(self.path.join(filename)).unwrap()
    }

    /// Stage a file without committing
    pub fn stage_file(&self, filename: &str) {
        Self::git(&self.path, &["add", filename]);
    }

    /// Commit whatever is staged, running the hooks
    pub fn commit(&self, message: &str) {
        Self::git(&self.path, &["commit", "-m", message]);
    }

    /// Contents of `filename` as recorded in HEAD
    pub fn committed_file(&self, filename: &str) -> String {
        self.git_output(&["show", &format!("HEAD:{}", filename)])
    }

    /// Contents of `filename` as recorded in the index
    pub fn staged_file(&self, filename: &str) -> String {
        self.git_output(&["show", &format!(":{}", filename)])
    }

    /// Files with staged changes
    pub fn staged_files(&self) -> Vec<String> {
        self.git_output(&["diff", "--cached", "--name-only"])
            .lines()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.path.join(".git").join("hooks")
    }

    /// Execute a git command in the repository
    fn git(path: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .unwrap_or_else(|e| panic!("Git command failed to execute: {}", e));

        if !output.status.success() {
            panic!(
                "Git command failed: git {}\nstderr: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }

    /// Execute a git command and return output (for queries)
    pub fn git_output(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .expect("Git command failed");

        if !output.status.success() {
            panic!(
                "Git command failed: git {}\nstderr: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_creation() {
        let repo = TestRepo::new();
        assert!(repo.path.join(".git").exists());
        assert!(repo.path.join("README.md").exists());
    }

    #[test]
    fn test_with_go_mod() {
        let repo = TestRepo::with_go_mod(GO_MOD);

        assert_eq!(repo.committed_file("go.mod"), GO_MOD);
        assert!(repo.staged_files().is_empty());
    }

    #[test]
    fn test_with_staged_go_mod() {
        let repo = TestRepo::with_staged_go_mod(GO_MOD_REMOTE_ONLY, GO_MOD);

        assert_eq!(repo.staged_files(), vec!["go.mod".to_string()]);
        assert_eq!(repo.staged_file("go.mod"), GO_MOD);
        assert_eq!(repo.committed_file("go.mod"), GO_MOD_REMOTE_ONLY);
    }
}
