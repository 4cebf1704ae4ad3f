//! Error types for classifier tables and retarget configuration.

use rigsmith_spec::CanonicalRole;
use thiserror::Error;

/// Errors raised while building a role table or loading options.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A role pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}' for role {role}: {source}")]
    InvalidPattern {
        role: CanonicalRole,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A role appears in more than one entry of a custom table.
    #[error("role {0} is listed more than once")]
    DuplicateRole(CanonicalRole),

    /// Configuration JSON could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    /// Returns a short stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ClassifierError::InvalidPattern { .. } => "ROLE_001",
            ClassifierError::DuplicateRole(_) => "ROLE_002",
            ClassifierError::Json(_) => "ROLE_003",
        }
    }
}
