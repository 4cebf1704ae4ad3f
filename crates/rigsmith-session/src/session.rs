//! Per-character session state: the loaded rig, its retargeted clip library
//! and the active clip.
//!
//! Every character change bumps a generation counter. Animation loads capture
//! the generation in a [`LoadTicket`] and are discarded on completion when the
//! character has changed in the meantime.

use std::collections::HashSet;
use std::sync::Arc;

use glam::Quat;
use rigsmith_glb::{largest_texture, preview_data_uri, texture_from_data_uri, CharacterAsset};
use rigsmith_retarget::{clip_name_from_asset, procedural_transform, AnimationConfig, Retargeter};
use rigsmith_spec::{
    AnimationClip, BoneTransform, CanonicalRole, Material, Skeleton, SkinnedMesh, Texture,
};
use rigsmith_synth::{synthesize, Character, SynthesisConfig};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::observer::TextureObserver;
use crate::source::{AssetSource, ClipDecoder, GlbClipDecoder};

/// Height assumed for rigs whose extent cannot be measured.
const FALLBACK_HEIGHT: f32 = 1.0;

/// The character currently bound to a session.
#[derive(Debug, Clone)]
pub struct LoadedCharacter {
    pub skeleton: Arc<Skeleton>,
    pub mesh: Option<SkinnedMesh>,
    pub material: Option<Material>,
    /// Vertical extent used to detect centimeter-scaled root motion.
    pub height: f32,
}

/// Snapshot of the character an animation load was started against.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    asset: String,
    generation: u64,
    skeleton: Arc<Skeleton>,
    target_height: f32,
    hips_bind_rotation: Option<Quat>,
}

impl LoadTicket {
    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }
}

/// Result of completing an animation load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Clips were added to the library.
    Applied { clips: usize },
    /// The asset was already loaded for this character; nothing changed.
    AlreadyLoaded,
    /// The character changed while the load was in flight.
    Discarded,
}

/// An animation load detached from its session.
///
/// Holds everything needed to fetch and retarget an asset, so several loads
/// can be in flight while the session keeps changing. Hand the result to
/// [`CharacterSession::complete_animation_load`].
pub struct PendingLoad<D = GlbClipDecoder> {
    ticket: LoadTicket,
    retargeter: Arc<Retargeter>,
    decoder: Arc<D>,
    first_clip_id: u64,
}

impl<D: ClipDecoder> PendingLoad<D> {
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    /// Fetches the asset and retargets its clips against the captured character.
    pub async fn run<S: AssetSource>(self, source: &S) -> SessionResult<(LoadTicket, Vec<AnimationClip>)> {
        let bytes = source.fetch(&self.ticket.asset).await?;
        let clips = retarget_clips(
            &self.retargeter,
            &*self.decoder,
            &self.ticket,
            &bytes,
            self.first_clip_id,
        )?;
        Ok((self.ticket, clips))
    }
}

/// Loads characters and animations and keeps the clip library of the
/// current character.
pub struct CharacterSession<D = GlbClipDecoder> {
    retargeter: Arc<Retargeter>,
    decoder: Arc<D>,
    character: Option<LoadedCharacter>,
    generation: u64,
    clips: Vec<AnimationClip>,
    loaded_assets: HashSet<String>,
    active: Option<usize>,
    observers: Vec<Box<dyn TextureObserver>>,
    next_clip_id: u64,
    motion: AnimationConfig,
}

impl Default for CharacterSession {
    fn default() -> Self {
        Self::new(Retargeter::default())
    }
}

impl CharacterSession {
    pub fn new(retargeter: Retargeter) -> Self {
        Self::with_decoder(retargeter, GlbClipDecoder)
    }
}

impl<D: ClipDecoder> CharacterSession<D> {
    pub fn with_decoder(retargeter: Retargeter, decoder: D) -> Self {
        Self {
            retargeter: Arc::new(retargeter),
            decoder: Arc::new(decoder),
            character: None,
            generation: 0,
            clips: Vec::new(),
            loaded_assets: HashSet::new(),
            active: None,
            observers: Vec::new(),
            next_clip_id: 0,
            motion: AnimationConfig::default(),
        }
    }

    pub fn add_observer(&mut self, observer: impl TextureObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn character(&self) -> Option<&LoadedCharacter> {
        self.character.as_ref()
    }

    /// Binds a new character, dropping every clip retargeted for the previous
    /// one. Observers receive a preview of the material's base-color texture.
    pub fn set_character(
        &mut self,
        skeleton: Skeleton,
        mesh: Option<SkinnedMesh>,
        material: Option<Material>,
    ) -> u64 {
        let preview = material.as_ref().and_then(Material::base_color).cloned();
        self.bind(skeleton, mesh, material, preview.as_ref())
    }

    /// Binds a decoded container. Its embedded clips already target its own
    /// skeleton and go into the library unchanged.
    pub fn set_character_asset(&mut self, asset: CharacterAsset) -> u64 {
        let preview = largest_texture(&asset.textures).cloned();
        let generation = self.bind(asset.skeleton, asset.mesh, asset.material, preview.as_ref());
        if !asset.clips.is_empty() {
            self.add_clips(asset.clips);
        }
        generation
    }

    /// Binds a synthesized character.
    pub fn set_synthesized(&mut self, character: Character) -> u64 {
        self.set_character(
            character.skeleton,
            Some(character.mesh),
            Some(character.material),
        )
    }

    fn bind(
        &mut self,
        skeleton: Skeleton,
        mesh: Option<SkinnedMesh>,
        material: Option<Material>,
        preview: Option<&Texture>,
    ) -> u64 {
        let height = measure_height(&skeleton, mesh.as_ref());
        self.generation += 1;
        self.clips.clear();
        self.loaded_assets.clear();
        self.active = None;
        info!(
            generation = self.generation,
            bones = skeleton.bone_count(),
            height,
            "character changed"
        );
        self.character = Some(LoadedCharacter {
            skeleton: Arc::new(skeleton),
            mesh,
            material,
            height,
        });

        if let Some(texture) = preview {
            self.notify_texture(texture);
        }
        self.generation
    }

    fn notify_texture(&self, texture: &Texture) {
        if self.observers.is_empty() {
            return;
        }
        match preview_data_uri(texture) {
            Ok(uri) => {
                for observer in &self.observers {
                    observer.on_texture_loaded(&uri);
                }
            }
            Err(err) => warn!(error = %err, "texture preview failed"),
        }
    }

    /// Fetches and decodes a character container, then binds it.
    pub async fn load_character<S: AssetSource>(&mut self, source: &S, uri: &str) -> SessionResult<u64> {
        let bytes = source.fetch(uri).await?;
        let asset = rigsmith_glb::decode(&bytes)?;
        Ok(self.set_character_asset(asset))
    }

    /// Synthesizes a character from an encoded portrait and binds it.
    pub fn synthesize_character(&mut self, portrait: &[u8], config: &SynthesisConfig) -> SessionResult<u64> {
        let character = synthesize(portrait, config)?;
        Ok(self.set_synthesized(character))
    }

    /// Captures the current character for an animation load of `asset`.
    pub fn begin_animation_load(&self, asset: &str) -> SessionResult<LoadTicket> {
        let character = self.character.as_ref().ok_or(SessionError::NoCharacter)?;
        let skeleton = Arc::clone(&character.skeleton);
        let hips_bind_rotation = self
            .retargeter
            .table()
            .assign(&skeleton)
            .get(CanonicalRole::Hips)
            .and_then(|index| skeleton.bone(index))
            .map(|bone| bone.bind_rotation());

        Ok(LoadTicket {
            asset: asset.to_string(),
            generation: self.generation,
            skeleton,
            target_height: character.height,
            hips_bind_rotation,
        })
    }

    /// Decodes `bytes` and retargets every clip against the ticket's skeleton.
    ///
    /// An asset holding a single clip names it after the asset file; clips of
    /// multi-clip assets keep their own names.
    pub fn retarget_asset(&self, ticket: &LoadTicket, bytes: &[u8]) -> SessionResult<Vec<AnimationClip>> {
        retarget_clips(&self.retargeter, &*self.decoder, ticket, bytes, self.next_clip_id)
    }

    /// Captures the current character and the session's retargeting setup
    /// for a load that does not borrow the session.
    pub fn prepare_animation_load(&self, asset: &str) -> SessionResult<PendingLoad<D>> {
        Ok(PendingLoad {
            ticket: self.begin_animation_load(asset)?,
            retargeter: Arc::clone(&self.retargeter),
            decoder: Arc::clone(&self.decoder),
            first_clip_id: self.next_clip_id,
        })
    }

    /// Applies a finished load unless the character changed since `ticket`
    /// was issued.
    pub fn complete_animation_load(&mut self, ticket: LoadTicket, clips: Vec<AnimationClip>) -> LoadOutcome {
        if ticket.generation != self.generation {
            warn!(
                asset = %ticket.asset,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "discarding animation retargeted for a previous character"
            );
            return LoadOutcome::Discarded;
        }
        if !self.loaded_assets.insert(ticket.asset) {
            return LoadOutcome::AlreadyLoaded;
        }
        let count = clips.len();
        self.add_clips(clips);
        LoadOutcome::Applied { clips: count }
    }

    /// Fetches, decodes and retargets an animation asset for the current
    /// character. Assets already in the library are not fetched again.
    ///
    /// The session stays borrowed until the load finishes; use
    /// [`Self::prepare_animation_load`] to keep loads in flight across
    /// character changes.
    pub async fn load_animation<S: AssetSource>(&mut self, source: &S, uri: &str) -> SessionResult<LoadOutcome> {
        if self.is_loaded(uri) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        let (ticket, clips) = self.prepare_animation_load(uri)?.run(source).await?;
        Ok(self.complete_animation_load(ticket, clips))
    }

    pub fn is_loaded(&self, asset: &str) -> bool {
        self.loaded_assets.contains(asset)
    }

    fn add_clips(&mut self, clips: Vec<AnimationClip>) {
        self.next_clip_id += clips.len() as u64;
        self.clips.extend(clips);
        if self.active.is_none() && !self.clips.is_empty() {
            self.active = Some(0);
        }
        debug!(clips = self.clips.len(), "clip library updated");
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn clip_names(&self) -> Vec<&str> {
        self.clips.iter().map(|clip| clip.name.as_str()).collect()
    }

    /// Makes the first clip called `name` the active one.
    pub fn select_clip(&mut self, name: &str) -> SessionResult<&AnimationClip> {
        let index = self
            .clips
            .iter()
            .position(|clip| clip.name == name)
            .ok_or_else(|| SessionError::UnknownClip(name.to_string()))?;
        self.active = Some(index);
        Ok(&self.clips[index])
    }

    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.active.and_then(|index| self.clips.get(index))
    }

    pub fn set_motion(&mut self, motion: AnimationConfig) {
        self.motion = motion;
    }

    pub fn motion(&self) -> &AnimationConfig {
        &self.motion
    }

    /// Root transform for the character `elapsed` seconds in. An active clip
    /// suppresses procedural motion.
    pub fn root_transform(&self, elapsed: f32) -> BoneTransform {
        if self.active_clip().is_some() {
            BoneTransform::IDENTITY
        } else {
            procedural_transform(&self.motion, elapsed)
        }
    }

    /// Replaces the bound material's base-color texture with an image data URI.
    pub fn update_texture(&mut self, data_uri: &str) -> SessionResult<()> {
        let texture = texture_from_data_uri(data_uri)?;
        let material = self
            .character
            .as_mut()
            .ok_or(SessionError::NoCharacter)?
            .material
            .as_mut()
            .ok_or(SessionError::NoMesh)?;
        debug!(
            width = texture.width(),
            height = texture.height(),
            "updated base color texture"
        );
        material.swap_texture(texture);
        Ok(())
    }

    /// Serializes the character and its clip library as a GLB container.
    pub fn export(&self) -> SessionResult<Vec<u8>> {
        let character = self.character.as_ref().ok_or(SessionError::NoCharacter)?;
        let (Some(mesh), Some(material)) = (&character.mesh, &character.material) else {
            return Err(SessionError::NoMesh);
        };
        Ok(rigsmith_glb::serialize(
            &character.skeleton,
            mesh,
            material,
            &self.clips,
        )?)
    }
}

/// Decodes `bytes` and retargets every clip against the ticket's skeleton.
///
/// An asset holding a single clip names it after the asset file; clips of
/// multi-clip assets keep their own names.
fn retarget_clips<D: ClipDecoder>(
    retargeter: &Retargeter,
    decoder: &D,
    ticket: &LoadTicket,
    bytes: &[u8],
    first_clip_id: u64,
) -> SessionResult<Vec<AnimationClip>> {
    let sources = decoder.decode(bytes)?;
    let file_name = ticket.asset.rsplit(['/', '\\']).next().unwrap_or(&ticket.asset);
    let single = sources.len() == 1;

    let clips = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let name = if single || source.name.is_empty() {
                clip_name_from_asset(file_name, first_clip_id + index as u64)
            } else {
                source.name.clone()
            };
            let retargeted = retargeter.retarget(
                source,
                &ticket.skeleton,
                ticket.target_height,
                ticket.hips_bind_rotation,
                &name,
            );
            if retargeted.report.fallback {
                debug!(clip = %name, "clip kept its source tracks");
            }
            retargeted.clip
        })
        .collect();
    Ok(clips)
}

fn measure_height(skeleton: &Skeleton, mesh: Option<&SkinnedMesh>) -> f32 {
    let extent = match mesh.and_then(SkinnedMesh::bounds) {
        Some(bounds) => bounds.size().y,
        None => {
            let positions = skeleton.world_positions();
            let (low, high) = positions
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), p| {
                    (low.min(p.y), high.max(p.y))
                });
            high - low
        }
    };
    if extent.is_finite() && extent > 0.0 {
        extent
    } else {
        FALLBACK_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryAssetSource;
    use glam::Vec3;
    use pretty_assertions::assert_eq;
    use rigsmith_spec::{Keyframes, Track};
    use rigsmith_synth::synthesize_texture;
    use std::sync::Mutex;

    fn synthesized() -> Character {
        let portrait = Texture::solid(8, 8, [180, 120, 100, 255]);
        synthesize_texture(portrait, &SynthesisConfig::default()).unwrap()
    }

    fn mixamo_wave() -> AnimationClip {
        let arm = Track::new(
            "mixamorig:LeftArm",
            vec![0.0, 1.0],
            Keyframes::Rotation(vec![Quat::IDENTITY, Quat::from_rotation_z(0.4)]),
        )
        .unwrap();
        let hips = Track::new(
            "mixamorig:Hips",
            vec![0.0, 1.0],
            Keyframes::Position(vec![Vec3::new(0.0, 95.0, 0.0), Vec3::new(3.0, 96.0, 1.0)]),
        )
        .unwrap();
        AnimationClip::from_tracks("mixamo.com", vec![arm, hips])
    }

    fn animation_container(clip: AnimationClip) -> Vec<u8> {
        let source = synthesized();
        let bones: Vec<_> = source
            .skeleton
            .bones()
            .iter()
            .map(|bone| {
                let mut bone = bone.clone();
                bone.name = format!("mixamorig:{}", bone.name);
                bone
            })
            .collect();
        let skeleton = Skeleton::new(bones).unwrap();
        rigsmith_glb::serialize(&skeleton, &source.mesh, &source.material, &[clip]).unwrap()
    }

    #[test]
    fn test_character_change_resets_library() {
        let mut session = CharacterSession::default();
        let first = session.set_synthesized(synthesized());
        session.add_clips(vec![mixamo_wave()]);
        assert_eq!(session.active_clip().unwrap().name, "mixamo.com");

        let second = session.set_synthesized(synthesized());
        assert_eq!(second, first + 1);
        assert!(session.clips().is_empty());
        assert!(session.active_clip().is_none());
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());

        let bytes = animation_container(mixamo_wave());
        let ticket = session.begin_animation_load("anims/wave.glb").unwrap();
        let clips = session.retarget_asset(&ticket, &bytes).unwrap();

        session.set_synthesized(synthesized());
        assert_eq!(session.complete_animation_load(ticket, clips), LoadOutcome::Discarded);
        assert!(session.clips().is_empty());
    }

    #[test]
    fn test_load_applies_once() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());
        let bytes = animation_container(mixamo_wave());

        let ticket = session.begin_animation_load("anims/wave.glb").unwrap();
        let clips = session.retarget_asset(&ticket, &bytes).unwrap();
        assert_eq!(
            session.complete_animation_load(ticket.clone(), clips.clone()),
            LoadOutcome::Applied { clips: 1 }
        );
        assert_eq!(
            session.complete_animation_load(ticket, clips),
            LoadOutcome::AlreadyLoaded
        );
        assert_eq!(session.clip_names(), vec!["wave"]);

        let clip = session.active_clip().unwrap();
        let names = clip.track_names();
        assert!(names.contains(&"LeftArm.quaternion".to_string()));
        assert!(names.contains(&"Hips.position".to_string()));
    }

    #[test]
    fn test_begin_requires_character() {
        let session = CharacterSession::default();
        let err = session.begin_animation_load("a.glb").unwrap_err();
        assert_eq!(err.code(), "SES_003");
    }

    #[tokio::test]
    async fn test_load_animation_from_source() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());

        let mut source = MemoryAssetSource::new();
        source.insert("walk.glb", animation_container(mixamo_wave()));

        let outcome = session.load_animation(&source, "walk.glb").await.unwrap();
        assert_eq!(outcome, LoadOutcome::Applied { clips: 1 });
        let outcome = session.load_animation(&source, "walk.glb").await.unwrap();
        assert_eq!(outcome, LoadOutcome::AlreadyLoaded);

        let err = session.load_animation(&source, "run.glb").await.unwrap_err();
        assert_eq!(err.code(), "SES_002");
    }

    #[tokio::test]
    async fn test_pending_load_discarded_after_swap() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());

        let mut source = MemoryAssetSource::new();
        source.insert("walk.glb", animation_container(mixamo_wave()));
        source.insert("idle.glb", animation_container(mixamo_wave()));

        let walk = session.prepare_animation_load("walk.glb").unwrap();
        session.set_synthesized(synthesized());
        let idle = session.prepare_animation_load("idle.glb").unwrap();

        let (walk, idle) = tokio::join!(walk.run(&source), idle.run(&source));
        let (ticket, clips) = walk.unwrap();
        assert_eq!(session.complete_animation_load(ticket, clips), LoadOutcome::Discarded);
        let (ticket, clips) = idle.unwrap();
        assert_eq!(
            session.complete_animation_load(ticket, clips),
            LoadOutcome::Applied { clips: 1 }
        );
        assert_eq!(session.clip_names(), vec!["idle"]);
        assert!(!session.is_loaded("walk.glb"));
    }

    #[test]
    fn test_active_clip_suppresses_motion() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());
        session.set_motion(AnimationConfig::preset("Slow Spin").unwrap());
        assert!(session
            .root_transform(2.0)
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(1.0), 1e-6));

        session.add_clips(vec![mixamo_wave()]);
        assert_eq!(session.root_transform(2.0), BoneTransform::IDENTITY);
    }

    #[test]
    fn test_select_clip() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());
        let mut idle = mixamo_wave();
        idle.name = "Idle".to_string();
        session.add_clips(vec![mixamo_wave(), idle]);

        assert_eq!(session.select_clip("Idle").unwrap().name, "Idle");
        assert_eq!(session.active_clip().unwrap().name, "Idle");
        assert_eq!(session.select_clip("Run").unwrap_err().code(), "SES_005");
    }

    #[test]
    fn test_observer_receives_preview() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut session = CharacterSession::default();
        session.add_observer(move |uri: &str| sink.lock().unwrap().push(uri.to_string()));
        session.set_synthesized(synthesized());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_update_texture_swaps_material() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());

        let repaint = Texture::solid(2, 2, [0, 255, 0, 255]);
        let uri = rigsmith_glb::texture_to_data_uri(&repaint).unwrap();
        session.update_texture(&uri).unwrap();

        let material = session.character().unwrap().material.as_ref().unwrap();
        assert_eq!(material.base_color(), Some(&repaint));
    }

    #[test]
    fn test_export_round_trips() {
        let mut session = CharacterSession::default();
        session.set_synthesized(synthesized());
        session.add_clips(vec![mixamo_wave()]);

        let glb = session.export().unwrap();
        let asset = rigsmith_glb::decode(&glb).unwrap();
        assert_eq!(asset.skeleton.bone_count(), 20);
        // Track nodes outside the rig are skipped on export.
        assert!(asset.clips.is_empty());

        assert_eq!(
            CharacterSession::default().export().unwrap_err().code(),
            "SES_003"
        );
    }

    #[test]
    fn test_measured_height() {
        let character = synthesized();
        let height = measure_height(&character.skeleton, Some(&character.mesh));
        assert!(height > 1.5 && height < 2.0, "height {height}");
    }
}
