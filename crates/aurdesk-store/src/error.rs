use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// One installed package whose dependency would go unmet if a removal
/// target left the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalBreakage {
    /// The dependency string as declared, e.g. `"libfoo>=1.2"`.
    pub dependency: String,
    /// The installed package declaring it.
    pub required_by: String,
    /// The removal target that currently satisfies it.
    pub target: String,
}

impl fmt::Display for RemovalBreakage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' required by {} (satisfied by removal target {})",
            self.dependency, self.required_by, self.target
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("package store initialization failed: {reason}")]
    InitFailure { reason: String },

    #[error("failed to access package database path {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("package database entry {path} is malformed: {reason}")]
    MalformedEntry { path: PathBuf, reason: String },

    #[error("package database is locked: {path}")]
    DatabaseLocked { path: PathBuf },

    #[error("target '{name}' was not found in the local database")]
    TargetNotFound { name: String },

    #[error("removing the requested targets would break dependencies: {}", breakage_list(.breakages))]
    WouldBreakDependents { breakages: Vec<RemovalBreakage> },
}

fn breakage_list(breakages: &[RemovalBreakage]) -> String {
    breakages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
