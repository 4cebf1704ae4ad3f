//! Hooks for collaborators that consume character textures.

/// Notified with a preview of the base-color texture whenever a character is
/// set on a session.
pub trait TextureObserver: Send + Sync {
    /// `data_uri` is a `data:image/png;base64,` URI, downscaled to at most
    /// 1024 pixels on its longest side.
    fn on_texture_loaded(&self, data_uri: &str);
}

impl<F> TextureObserver for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_texture_loaded(&self, data_uri: &str) {
        self(data_uri)
    }
}
