//! Function-scoped error taxonomy.
//!
//! Every failure in the pipeline is attributed to a single function and
//! recorded into that function's report; nothing here aborts a batch.
//! Faults carry a structured kind plus a human-readable message so callers
//! can gate on categories without string matching.

use serde::Serialize;

/// Failure category for per-function outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Missing or malformed function signature
    Parse,
    /// Collaborator reported failure or returned an unusable payload
    Oracle,
    /// Re-detection failed against oracle output or live file content
    PatchNotFound,
    /// File read/write error
    Io,
    /// Generated test content is empty after cleaning
    EmptyArtifact,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Parse => "parse_error",
            FaultKind::Oracle => "oracle_failure",
            FaultKind::PatchNotFound => "patch_not_found",
            FaultKind::Io => "io_failure",
            FaultKind::EmptyArtifact => "empty_artifact",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded per-function failure: kind plus message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Parse, message)
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Oracle, message)
    }

    pub fn patch_not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::PatchNotFound, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Io, message)
    }

    pub fn empty_artifact(message: impl Into<String>) -> Self {
        Self::new(FaultKind::EmptyArtifact, message)
    }
}
