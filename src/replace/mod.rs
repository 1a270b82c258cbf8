//! Temporary removal of local replace directives

mod backup;
mod transaction;

pub use backup::{BackupStore, FsBackupStore};
pub use transaction::{ReplaceError, ReplaceTransaction, StripOutcome};
