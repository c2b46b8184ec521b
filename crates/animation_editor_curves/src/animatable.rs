// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animated objects edited by the curve editor.
//!
//! The editor never owns the scene. It talks to the object through the
//! [`Animatable`] trait: read and write tracks, resolve a value at a frame,
//! and push values onto the live object.

use crate::keyframe::KeyValue;
use crate::track::{KeyframeTrack, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an animated object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimatableId(pub Uuid);

impl AnimatableId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnimatableId {
    fn default() -> Self {
        Self::new()
    }
}

/// An object owning animation tracks and the properties they drive
pub trait Animatable {
    /// Object ID
    fn id(&self) -> AnimatableId;

    /// Display name
    fn name(&self) -> &str;

    /// Track IDs in display order
    fn track_ids(&self) -> Vec<TrackId>;

    /// Get a track
    fn track(&self, id: TrackId) -> Option<&KeyframeTrack>;

    /// Get a mutable track
    fn track_mut(&mut self, id: TrackId) -> Option<&mut KeyframeTrack>;

    /// Current value of a property
    fn property(&self, path: &str) -> Option<KeyValue>;

    /// Write a property on the live object
    fn set_property(&mut self, path: &str, value: KeyValue);

    /// Resolve the track value at a frame.
    ///
    /// The default holds the end keys and interpolates linearly in between.
    fn evaluate(&self, track: &KeyframeTrack, frame: f32) -> Option<KeyValue> {
        track.evaluate(frame)
    }

    /// Apply the track value at `frame` to its target property
    fn apply_track(&mut self, id: TrackId, frame: f32) -> bool {
        let Some((path, value)) = self
            .track(id)
            .and_then(|t| self.evaluate(t, frame).map(|v| (t.target_property.clone(), v)))
        else {
            return false;
        };
        self.set_property(&path, value);
        true
    }

    /// Apply every track of the object at `frame`
    fn apply_all(&mut self, frame: f32) -> usize {
        self.track_ids()
            .into_iter()
            .filter(|id| self.apply_track(*id, frame))
            .count()
    }

    /// Synchronize the whole scene at `frame`.
    ///
    /// Objects without a scene reference only update themselves.
    fn apply_scene(&mut self, frame: f32) -> usize {
        self.apply_all(frame)
    }
}

/// In-memory animated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneAnimatable {
    /// Object ID
    pub id: AnimatableId,
    /// Object name
    pub name: String,
    /// Tracks keyed by ID, in insertion order
    tracks: IndexMap<TrackId, KeyframeTrack>,
    /// Live property values keyed by path
    properties: IndexMap<String, KeyValue>,
}

impl SceneAnimatable {
    /// Create a new object without tracks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AnimatableId::new(),
            name: name.into(),
            tracks: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Add a track
    pub fn add_track(&mut self, track: KeyframeTrack) -> TrackId {
        let id = track.id;
        self.tracks.insert(id, track);
        id
    }

    /// Remove a track
    pub fn remove_track(&mut self, id: TrackId) -> Option<KeyframeTrack> {
        self.tracks.shift_remove(&id)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &KeyframeTrack> {
        self.tracks.values()
    }

    /// Set a property value with builder syntax
    pub fn with_property(mut self, path: impl Into<String>, value: KeyValue) -> Self {
        self.properties.insert(path.into(), value);
        self
    }
}

impl Animatable for SceneAnimatable {
    fn id(&self) -> AnimatableId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.keys().copied().collect()
    }

    fn track(&self, id: TrackId) -> Option<&KeyframeTrack> {
        self.tracks.get(&id)
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut KeyframeTrack> {
        self.tracks.get_mut(&id)
    }

    fn property(&self, path: &str) -> Option<KeyValue> {
        self.properties.get(path).copied()
    }

    fn set_property(&mut self, path: &str, value: KeyValue) {
        self.properties.insert(path.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{DataType, Key};

    #[test]
    fn test_apply_track_writes_property() {
        let track = KeyframeTrack::new("Move", "position", DataType::Vector2, 60.0)
            .with_keys([
                Key::new(0.0, KeyValue::Vector2([0.0, 0.0])),
                Key::new(10.0, KeyValue::Vector2([10.0, 20.0])),
            ])
            .unwrap();
        let mut object = SceneAnimatable::new("Box");
        let id = object.add_track(track);

        assert!(object.apply_track(id, 5.0));
        assert_eq!(object.property("position"), Some(KeyValue::Vector2([5.0, 10.0])));
    }

    #[test]
    fn test_apply_all_skips_empty_tracks() {
        let mut object = SceneAnimatable::new("Light");
        object.add_track(
            KeyframeTrack::new("Intensity", "intensity", DataType::Float, 60.0)
                .with_keys([Key::new(0.0, KeyValue::Float(2.0))])
                .unwrap(),
        );
        object.add_track(KeyframeTrack::new("Range", "range", DataType::Float, 60.0));

        assert_eq!(object.apply_all(0.0), 1);
        assert_eq!(object.property("intensity"), Some(KeyValue::Float(2.0)));
        assert_eq!(object.property("range"), None);
    }
}
