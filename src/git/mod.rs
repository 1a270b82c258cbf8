//! Git operations module

mod status;

pub use status::{GitStatusError, GitStatusProbe, StagingProbe, StagingStatus};
