//! Rigsmith End-to-End Test Infrastructure
//!
//! Integration tests for the flows that cross crate boundaries:
//!
//! - Synthesis: portrait -> rig -> GLB -> decoded rig
//! - Retargeting: foreign naming conventions onto the canonical skeleton
//! - Session: asynchronous loads, stale-result discard, export
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rigsmith-tests
//! ```

pub mod fixtures;

pub use fixtures::{
    biped_skeleton, canonical_skeleton, portrait_png, prefixed_skeleton, rotation_track,
    translation_track,
};
