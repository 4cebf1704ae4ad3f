//! Keyframe tracks and animation clips.

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};

use crate::error::{SpecError, SpecResult};

/// Animated property of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackProperty {
    Position,
    Rotation,
    Scale,
}

impl TrackProperty {
    /// Property name as written in track identities.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackProperty::Position => "position",
            TrackProperty::Rotation => "quaternion",
            TrackProperty::Scale => "scale",
        }
    }

    /// Parses a property name. Accepts both the scene-graph spelling
    /// (`position`, `quaternion`) and the glTF spelling (`translation`,
    /// `rotation`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "position" | "translation" => Some(TrackProperty::Position),
            "quaternion" | "rotation" => Some(TrackProperty::Rotation),
            "scale" => Some(TrackProperty::Scale),
            _ => None,
        }
    }
}

impl fmt::Display for TrackProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the value a track drives: `(node, property)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackTarget {
    pub node: String,
    pub property: TrackProperty,
}

impl TrackTarget {
    pub fn new(node: impl Into<String>, property: TrackProperty) -> Self {
        Self {
            node: node.into(),
            property,
        }
    }
}

impl FromStr for TrackTarget {
    type Err = SpecError;

    /// Splits on the last `.` so node names containing dots survive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node, property) = s
            .rsplit_once('.')
            .ok_or_else(|| SpecError::InvalidTrackTarget(s.to_string()))?;
        if node.is_empty() {
            return Err(SpecError::InvalidTrackTarget(s.to_string()));
        }
        let property =
            TrackProperty::parse(property).ok_or_else(|| SpecError::InvalidTrackTarget(s.to_string()))?;
        Ok(Self::new(node, property))
    }
}

impl fmt::Display for TrackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.property)
    }
}

/// Keyframe interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Typed key values. The variant determines the track's property.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyframes {
    Position(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl Keyframes {
    pub fn property(&self) -> TrackProperty {
        match self {
            Keyframes::Position(_) => TrackProperty::Position,
            Keyframes::Rotation(_) => TrackProperty::Rotation,
            Keyframes::Scale(_) => TrackProperty::Scale,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Keyframes::Position(values) | Keyframes::Scale(values) => values.len(),
            Keyframes::Rotation(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single sampled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    Position(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Time-ordered samples driving one property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    node: String,
    times: Vec<f32>,
    keyframes: Keyframes,
    interpolation: Interpolation,
}

impl Track {
    /// Creates a track. Times must be strictly increasing and match the
    /// number of values.
    pub fn new(node: impl Into<String>, times: Vec<f32>, keyframes: Keyframes) -> SpecResult<Self> {
        let node = node.into();
        let target = || format!("{}.{}", node, keyframes.property());

        if times.len() != keyframes.len() {
            return Err(SpecError::KeyCountMismatch {
                target: target(),
                times: times.len(),
                values: keyframes.len(),
            });
        }
        if let Some(index) = times.windows(2).position(|pair| !(pair[1] > pair[0])) {
            return Err(SpecError::NonIncreasingTimes {
                target: target(),
                index: index + 1,
            });
        }

        Ok(Self {
            node,
            times,
            keyframes,
            interpolation: Interpolation::Linear,
        })
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn property(&self) -> TrackProperty {
        self.keyframes.property()
    }

    pub fn target(&self) -> TrackTarget {
        TrackTarget::new(self.node.clone(), self.property())
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last key, or 0 for an empty track.
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Returns the same samples retargeted to another node.
    pub fn renamed(&self, node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..self.clone()
        }
    }

    /// Returns the same key times with new values. The values must have the
    /// same length as the times.
    pub fn with_keyframes(&self, keyframes: Keyframes) -> SpecResult<Self> {
        Track::new(self.node.clone(), self.times.clone(), keyframes)
            .map(|track| track.with_interpolation(self.interpolation))
    }

    /// Samples the track at `time`, clamping outside the key range.
    pub fn sample(&self, time: f32) -> Option<TrackValue> {
        let last = self.times.len().checked_sub(1)?;
        let (from, to, t) = if time <= self.times[0] {
            (0, 0, 0.0)
        } else if time >= self.times[last] {
            (last, last, 0.0)
        } else {
            // times are strictly increasing, so the partition point is in 1..=last
            let next = self.times.partition_point(|&key| key <= time);
            let prev = next - 1;
            let span = self.times[next] - self.times[prev];
            let t = match self.interpolation {
                Interpolation::Linear => (time - self.times[prev]) / span,
                Interpolation::Step => 0.0,
            };
            (prev, next, t)
        };

        Some(match &self.keyframes {
            Keyframes::Position(values) => TrackValue::Position(values[from].lerp(values[to], t)),
            Keyframes::Scale(values) => TrackValue::Scale(values[from].lerp(values[to], t)),
            Keyframes::Rotation(values) => {
                TrackValue::Rotation(values[from].slerp(values[to], t).normalize())
            }
        })
    }
}

/// A named set of tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Duration in seconds.
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Creates a clip whose duration is the latest key time of its tracks.
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        Self::new(name, duration, tracks)
    }

    /// Track identities in order, formatted as `node.property`.
    pub fn track_names(&self) -> Vec<String> {
        self.tracks.iter().map(|track| track.target().to_string()).collect()
    }

    pub fn tracks_for<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Track> + 'a {
        self.tracks.iter().filter(move |track| track.node() == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_track_target_parse() {
        let target: TrackTarget = "mixamorig:Hips.quaternion".parse().unwrap();
        assert_eq!(target, TrackTarget::new("mixamorig:Hips", TrackProperty::Rotation));

        let target: TrackTarget = "Armature.Hips.translation".parse().unwrap();
        assert_eq!(target.node, "Armature.Hips");
        assert_eq!(target.property, TrackProperty::Position);

        assert!("Hips".parse::<TrackTarget>().is_err());
        assert!("Hips.morphTargetInfluences".parse::<TrackTarget>().is_err());
        assert!(".scale".parse::<TrackTarget>().is_err());
    }

    #[test]
    fn test_track_target_display() {
        let target = TrackTarget::new("LeftArm", TrackProperty::Rotation);
        assert_eq!(target.to_string(), "LeftArm.quaternion");
    }

    #[test]
    fn test_track_rejects_unordered_times() {
        let result = Track::new(
            "Hips",
            vec![0.0, 0.5, 0.5],
            Keyframes::Position(vec![Vec3::ZERO; 3]),
        );
        assert_eq!(
            result,
            Err(SpecError::NonIncreasingTimes {
                target: "Hips.position".to_string(),
                index: 2
            })
        );
    }

    #[test]
    fn test_track_rejects_count_mismatch() {
        let result = Track::new("Hips", vec![0.0, 1.0], Keyframes::Rotation(vec![Quat::IDENTITY]));
        assert!(matches!(result, Err(SpecError::KeyCountMismatch { times: 2, values: 1, .. })));
    }

    #[test]
    fn test_linear_sampling() {
        let track = Track::new(
            "Hips",
            vec![0.0, 2.0],
            Keyframes::Position(vec![Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0)]),
        )
        .unwrap();

        match track.sample(1.0) {
            Some(TrackValue::Position(p)) => assert!((p - Vec3::ONE).length() < 1e-6),
            other => panic!("unexpected sample {:?}", other),
        }
        assert_eq!(track.sample(-1.0), Some(TrackValue::Position(Vec3::ZERO)));
        assert_eq!(
            track.sample(5.0),
            Some(TrackValue::Position(Vec3::new(2.0, 2.0, 2.0)))
        );
    }

    #[test]
    fn test_step_sampling_holds_previous_key() {
        let track = Track::new(
            "Hips",
            vec![0.0, 1.0],
            Keyframes::Scale(vec![Vec3::ONE, Vec3::splat(3.0)]),
        )
        .unwrap()
        .with_interpolation(Interpolation::Step);
        assert_eq!(track.sample(0.9), Some(TrackValue::Scale(Vec3::ONE)));
    }

    #[test]
    fn test_clip_duration_from_tracks() {
        let a = Track::new("A", vec![0.0, 1.5], Keyframes::Scale(vec![Vec3::ONE; 2])).unwrap();
        let b = Track::new("B", vec![0.0, 0.5], Keyframes::Scale(vec![Vec3::ONE; 2])).unwrap();
        let clip = AnimationClip::from_tracks("walk", vec![a, b]);
        assert_eq!(clip.duration, 1.5);
        assert_eq!(clip.track_names(), vec!["A.scale", "B.scale"]);
    }
}
