//! Shared test utilities for modstrip
//!
//! - Git repository fixtures with a Go module at the root

pub mod git_fixtures;
