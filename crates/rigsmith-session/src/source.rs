//! Asset byte sources and clip decoders.
//!
//! Fetching is the only suspension point of a session: bytes are fully
//! materialized before any decoding or retargeting starts.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rigsmith_spec::AnimationClip;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

/// Asynchronous provider of asset bytes.
pub trait AssetSource {
    /// Fetches the complete contents of `uri`.
    fn fetch(&self, uri: &str) -> impl Future<Output = SessionResult<Vec<u8>>> + Send;
}

/// Reads assets from the filesystem, relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths are used as-is; anything else is joined to the root.
    pub fn resolve(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl AssetSource for FsAssetSource {
    async fn fetch(&self, uri: &str) -> SessionResult<Vec<u8>> {
        let path = self.resolve(uri);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "fetched asset");
                Ok(bytes)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(SessionError::NotFound(uri.to_string()))
            }
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }
}

/// In-memory assets keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(uri.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, uri: &str) -> SessionResult<Vec<u8>> {
        self.assets
            .get(uri)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(uri.to_string()))
    }
}

/// Turns animation asset bytes into clips.
///
/// Containers other than GLB (proprietary keyframe formats, for example) are
/// supported by supplying another implementation.
pub trait ClipDecoder {
    fn decode(&self, bytes: &[u8]) -> SessionResult<Vec<AnimationClip>>;
}

/// Decodes the animations of a GLB container.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlbClipDecoder;

impl ClipDecoder for GlbClipDecoder {
    fn decode(&self, bytes: &[u8]) -> SessionResult<Vec<AnimationClip>> {
        let set = rigsmith_glb::decode_clips(bytes)?;
        debug!(
            clips = set.clips.len(),
            joints = set.joint_names.len(),
            "decoded animation container"
        );
        Ok(set.clips)
    }
}
