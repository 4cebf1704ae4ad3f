//! Rigsmith Character Session
//!
//! Ties the pipeline together for an interactive host: binds one character at
//! a time (decoded or synthesized), loads animation assets asynchronously and
//! retargets them against the bound skeleton, keeps the resulting clip library
//! and exports everything as a single GLB container.
//!
//! Loads that finish after the character changed are discarded; see
//! [`CharacterSession::complete_animation_load`].

pub mod error;
pub mod observer;
pub mod session;
pub mod source;

pub use error::{SessionError, SessionResult};
pub use observer::TextureObserver;
pub use session::{CharacterSession, LoadOutcome, LoadTicket, LoadedCharacter, PendingLoad};
pub use source::{AssetSource, ClipDecoder, FsAssetSource, GlbClipDecoder, MemoryAssetSource};
