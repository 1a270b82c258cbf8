//! Utility modules

pub mod paths;
pub mod tools;

pub use paths::{config_dir, config_path, hooks_dir, post_commit_path, pre_commit_path};
pub use tools::{detect_git, resolve_git, ToolStatus};
