//! Shared error types for servicemap
//!
//! Only violations of the detector's own invariants are errors. Anything the
//! detector can recover from (an iteration ceiling being hit, dangling
//! observations) is reported as data or logged instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for servicemap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Assignment key set does not match the graph's vertex set
    #[error(
        "Assignment mismatch: {missing} vertices unassigned, {stale} unknown keys (e.g. {sample:?})"
    )]
    IncompleteAssignment {
        missing: usize,
        stale: usize,
        sample: Vec<String>,
    },

    /// Accumulated call counts too large for exact gain arithmetic
    #[error("Total call weight exceeds {limit}; scale the observed counts down")]
    WeightOverflow { limit: u64 },

    /// A community identifier that is not a vertex of the graph
    #[error("Community identifier '{0}' is not a vertex of the graph")]
    UnknownCommunity(String),

    /// Configuration values outside their valid range
    #[error("Configuration error in '{field}': {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    /// Configuration file could not be read
    #[error("Failed to read configuration {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error for a named field
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Whether the error points at a bug in the caller rather than bad input files
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::IncompleteAssignment { .. } | Self::UnknownCommunity(_)
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
