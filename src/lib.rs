pub mod config;
pub mod error;
pub mod git;
pub mod hooks;
pub mod manifest;
pub mod replace;
pub mod util;

pub use config::Config;
pub use error::ErrorClass;
pub use git::{GitStatusProbe, StagingProbe};
pub use hooks::{EditError, HookError, HookInstallMode, HookInstaller, InstalledHooks};
pub use manifest::{GoModFormat, Manifest, ManifestFormat, ReplaceDirective};
pub use replace::{BackupStore, FsBackupStore, ReplaceError, ReplaceTransaction, StripOutcome};
