//! Session error types.

use std::path::PathBuf;

use rigsmith_glb::GlbError;
use rigsmith_synth::SynthError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading assets into a character session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading asset bytes failed.
    #[error("failed to read asset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An asset URI could not be resolved by the source.
    #[error("asset '{0}' not found")]
    NotFound(String),

    /// Container decoding or encoding failed.
    #[error(transparent)]
    Glb(#[from] GlbError),

    /// Character synthesis failed.
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// The operation needs a loaded character.
    #[error("no character is loaded")]
    NoCharacter,

    /// The loaded character has no skinned mesh or material to export.
    #[error("character has no skinned mesh")]
    NoMesh,

    /// No clip with the requested name exists.
    #[error("no clip named '{0}'")]
    UnknownClip(String),
}

impl SessionError {
    /// Returns a short stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Io { .. } => "SES_001",
            SessionError::NotFound(_) => "SES_002",
            SessionError::Glb(err) => err.code(),
            SessionError::Synth(err) => err.code(),
            SessionError::NoCharacter => "SES_003",
            SessionError::NoMesh => "SES_004",
            SessionError::UnknownClip(_) => "SES_005",
        }
    }
}
