//! Commit hooks that strip local replace directives around each commit

pub mod editor;
mod installer;

pub use editor::EditError;
pub use installer::{HookError, HookInstallMode, HookInstaller, InstalledHooks};
