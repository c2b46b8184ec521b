// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe tracks for animated properties.

use crate::keyframe::{DataType, Key, KeyValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum number of keys a track keeps so it stays an interpolatable curve
pub const MIN_KEYS: usize = 2;

/// Track errors
#[derive(Debug, Error)]
pub enum TrackError {
    /// A key value does not match the track data type
    #[error("Key {index} holds a {found:?} value but the track is {expected:?}")]
    DataTypeMismatch {
        /// Index of the offending key
        index: usize,
        /// Data type of the track
        expected: DataType,
        /// Data type of the key value
        found: DataType,
    },

    /// RON serialization error
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Result type for track operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame range covered by a track's keys.
///
/// An empty track yields [`FrameRange::UNDEFINED`], where `min_frame > max_frame`.
/// Use [`FrameRange::defined`] rather than reading the bounds directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRange {
    /// Smallest key frame
    pub min_frame: f32,
    /// Largest key frame
    pub max_frame: f32,
}

impl FrameRange {
    /// Inverted range returned for tracks without keys
    pub const UNDEFINED: FrameRange = FrameRange {
        min_frame: f32::MAX,
        max_frame: f32::MIN,
    };

    /// Whether the range describes at least one key
    pub fn is_defined(&self) -> bool {
        self.min_frame <= self.max_frame
    }

    /// The `(min, max)` bounds if the range is defined
    pub fn defined(&self) -> Option<(f32, f32)> {
        self.is_defined().then_some((self.min_frame, self.max_frame))
    }

    /// Check whether a frame lies inside the range
    pub fn contains(&self, frame: f32) -> bool {
        self.is_defined() && frame >= self.min_frame && frame <= self.max_frame
    }
}

/// Keyframes of one animated property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyframeTrack {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Property path on the animated object (e.g. `position`)
    pub target_property: String,
    /// Value type of every key
    data_type: DataType,
    /// Keys sorted by frame
    keys: Vec<Key>,
    /// Frames per second
    pub frame_rate: f32,
    /// Whether blending with the previous animation is enabled
    pub enable_blending: bool,
    /// Blending speed
    pub blending_speed: f32,
}

impl KeyframeTrack {
    /// Create a new empty track
    pub fn new(
        name: impl Into<String>,
        target_property: impl Into<String>,
        data_type: DataType,
        frame_rate: f32,
    ) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            target_property: target_property.into(),
            data_type,
            keys: Vec::new(),
            frame_rate,
            enable_blending: false,
            blending_speed: 0.01,
        }
    }

    /// Replace the keys, validating each value against the data type
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Result<Self> {
        self.keys = keys
            .into_iter()
            .map(|k| Key::new(k.frame, k.value))
            .collect();
        self.validate()?;
        self.sort_keys();
        Ok(self)
    }

    /// Check every key value against the track data type
    pub fn validate(&self) -> Result<()> {
        for (index, key) in self.keys.iter().enumerate() {
            let found = key.value.data_type();
            if found != self.data_type {
                return Err(TrackError::DataTypeMismatch {
                    index,
                    expected: self.data_type,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Data type of the track
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Get all keys
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Get a key by index
    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    /// Get key count
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the track has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Frame range of the keys
    pub fn range(&self) -> FrameRange {
        self.keys.iter().fold(FrameRange::UNDEFINED, |mut range, k| {
            if k.frame > range.max_frame {
                range.max_frame = k.frame;
            }
            if k.frame < range.min_frame {
                range.min_frame = k.frame;
            }
            range
        })
    }

    /// Sort keys by frame
    fn sort_keys(&mut self) {
        self.keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    }

    /// Insert a key at an index chosen by the caller to preserve ordering
    pub(crate) fn insert_key(&mut self, index: usize, key: Key) {
        self.keys.insert(index.min(self.keys.len()), key);
    }

    /// Remove a key by index without enforcing the minimum key count
    pub(crate) fn take_key(&mut self, index: usize) -> Option<Key> {
        (index < self.keys.len()).then(|| self.keys.remove(index))
    }

    /// Get mutable key by index
    pub(crate) fn key_mut(&mut self, index: usize) -> Option<&mut Key> {
        self.keys.get_mut(index)
    }

    /// Frame bounds a key may move within without reordering the track
    pub fn movable_bounds(&self, index: usize) -> (f32, f32) {
        let lower = index
            .checked_sub(1)
            .and_then(|i| self.keys.get(i))
            .map_or(0.0, |k| k.frame);
        let upper = self
            .keys
            .get(index + 1)
            .map_or(f32::INFINITY, |k| k.frame);
        (lower, upper)
    }

    /// Insert or update the key at exactly `frame`.
    ///
    /// Returns false if the value does not match the track data type.
    pub fn set_key_at(&mut self, frame: f32, value: KeyValue) -> bool {
        if value.data_type() != self.data_type {
            return false;
        }

        let frame = frame.max(0.0);
        if let Some(key) = self.keys.iter_mut().find(|k| k.frame == frame) {
            key.value = value;
        } else {
            self.keys.push(Key::new(frame, value));
            self.sort_keys();
        }
        true
    }

    /// Evaluate the track at a frame with linear interpolation, holding the end values
    pub fn evaluate(&self, frame: f32) -> Option<KeyValue> {
        let next_idx = self.keys.iter().position(|k| k.frame >= frame);

        match next_idx {
            None => self.keys.last().map(|k| k.value),
            Some(0) => self.keys.first().map(|k| k.value),
            Some(idx) => {
                let a = &self.keys[idx - 1];
                let b = &self.keys[idx];
                if (b.frame - a.frame).abs() < f32::EPSILON {
                    return Some(b.value);
                }
                let t = (frame - a.frame) / (b.frame - a.frame);
                a.value.lerp(&b.value, t)
            }
        }
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON, validating and sorting the keys
    pub fn from_ron(s: &str) -> Result<Self> {
        let mut track: KeyframeTrack = ron::from_str(s)?;
        track.validate()?;
        for key in &mut track.keys {
            key.frame = key.frame.max(0.0);
        }
        track.sort_keys();
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_track(keys: &[(f32, f32)]) -> KeyframeTrack {
        KeyframeTrack::new("Intensity", "intensity", DataType::Float, 60.0)
            .with_keys(keys.iter().map(|&(f, v)| Key::new(f, KeyValue::Float(v))))
            .unwrap()
    }

    #[test]
    fn test_keys_sorted_on_construction() {
        let track = float_track(&[(20.0, 1.0), (0.0, 0.0), (10.0, 5.0)]);
        let frames: Vec<f32> = track.keys().iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_data_type_mismatch_rejected() {
        let result = KeyframeTrack::new("Position", "position", DataType::Vector3, 60.0)
            .with_keys([Key::new(0.0, KeyValue::Float(1.0))]);
        assert!(matches!(
            result,
            Err(TrackError::DataTypeMismatch { index: 0, expected: DataType::Vector3, found: DataType::Float })
        ));
    }

    #[test]
    fn test_range() {
        let track = float_track(&[(5.0, 0.0), (40.0, 1.0), (12.0, 2.0)]);
        let range = track.range();
        assert_eq!(range.defined(), Some((5.0, 40.0)));
        assert!(range.contains(12.0));
        assert!(!range.contains(41.0));
    }

    #[test]
    fn test_empty_range_is_inverted() {
        let track = KeyframeTrack::new("Empty", "alpha", DataType::Float, 60.0);
        let range = track.range();
        assert!(range.min_frame > range.max_frame);
        assert!(!range.is_defined());
        assert_eq!(range.defined(), None);
    }

    #[test]
    fn test_set_key_at_replaces_or_inserts() {
        let mut track = float_track(&[(0.0, 0.0), (20.0, 1.0)]);
        assert!(track.set_key_at(20.0, KeyValue::Float(3.0)));
        assert_eq!(track.len(), 2);
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(3.0)));

        assert!(track.set_key_at(10.0, KeyValue::Float(7.0)));
        assert_eq!(track.len(), 3);
        assert_eq!(track.key(1).map(|k| k.frame), Some(10.0));

        assert!(!track.set_key_at(5.0, KeyValue::Vector2([0.0, 0.0])));
    }

    #[test]
    fn test_evaluate() {
        let track = float_track(&[(0.0, 0.0), (10.0, 10.0)]);
        assert_eq!(track.evaluate(5.0), Some(KeyValue::Float(5.0)));
        assert_eq!(track.evaluate(-1.0), Some(KeyValue::Float(0.0)));
        assert_eq!(track.evaluate(30.0), Some(KeyValue::Float(10.0)));
    }

    #[test]
    fn test_movable_bounds() {
        let track = float_track(&[(2.0, 0.0), (10.0, 0.0), (30.0, 0.0)]);
        assert_eq!(track.movable_bounds(0), (0.0, 10.0));
        assert_eq!(track.movable_bounds(1), (2.0, 30.0));
        assert_eq!(track.movable_bounds(2), (10.0, f32::INFINITY));
    }

    #[test]
    fn test_ron_roundtrip_preserves_keys() {
        let track = float_track(&[(0.0, 1.0), (15.0, 2.0)]);
        let ron = track.to_ron().unwrap();
        let loaded = KeyframeTrack::from_ron(&ron).unwrap();
        assert_eq!(loaded.id, track.id);
        assert_eq!(loaded.keys(), track.keys());
    }
}
