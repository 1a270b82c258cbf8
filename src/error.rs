//! Error classification shared by the module-level error types

/// Broad category of a failure, independent of which component raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Something that must exist (or must not exist) on disk was in the wrong state
    Precondition,
    /// Caller input was malformed or ambiguous
    Validation,
    /// A collaborator (parser, filesystem, git) failed while doing its job
    Transport,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Precondition => "precondition",
            ErrorClass::Validation => "validation",
            ErrorClass::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
