// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time cursor playback and synchronization of the edited object.

use crate::animatable::Animatable;
use crate::track::{FrameRange, KeyframeTrack, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between playback ticks (~60Hz)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Which objects receive the current frame's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SyncType {
    /// Only the selected track is applied
    #[default]
    Animation,
    /// Every track of the selected object is applied
    Object,
    /// The whole scene is evaluated
    Scene,
}

impl SyncType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "Animation",
            Self::Object => "Object",
            Self::Scene => "Scene",
        }
    }

    /// Get all sync types
    pub fn all() -> &'static [SyncType] {
        &[SyncType::Animation, SyncType::Object, SyncType::Scene]
    }
}

/// Current frame shown by the chart's time cursor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeCursor {
    frame: f32,
}

impl TimeCursor {
    /// Current frame
    pub fn frame(&self) -> f32 {
        self.frame
    }

    /// Move the cursor, clamping to zero
    pub fn set(&mut self, frame: f32) {
        self.frame = frame.max(0.0);
    }
}

/// An active playback over a frame window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackHandle {
    /// Track being played
    pub track: TrackId,
    /// First frame
    pub from: f32,
    /// Last frame
    pub to: f32,
    /// Frames per second
    pub frame_rate: f32,
    /// Current frame
    pub frame: f32,
}

/// Result of a playback tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing is playing
    Idle,
    /// The cursor advanced
    Playing,
    /// The last frame was reached and playback stopped
    Finished,
}

/// Drives the time cursor and pushes frame values onto the animated object
#[derive(Debug)]
pub struct PlaybackBridge {
    handle: Option<PlaybackHandle>,
    /// Sync mode used while scrubbing and playing
    pub sync_type: SyncType,
    /// Interval hosts should tick at
    pub tick_interval: Duration,
}

impl PlaybackBridge {
    /// Create a new bridge
    pub fn new(sync_type: SyncType) -> Self {
        Self {
            handle: None,
            sync_type,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Frame playback should start from.
    ///
    /// Restarts at 0 when the cursor is unset, on the last frame or past it,
    /// and never starts before the first key.
    pub fn start_frame(cursor: Option<f32>, range: FrameRange) -> Option<f32> {
        let (min_frame, max_frame) = range.defined()?;
        let start = match cursor {
            Some(frame) if frame < max_frame => frame,
            _ => 0.0,
        };
        Some(start.max(min_frame))
    }

    /// Start playing `track` from `from` to `to` (defaults to the last key).
    ///
    /// Returns false without touching any state when the track has no keys.
    pub fn play(&mut self, track: &KeyframeTrack, from: f32, to: Option<f32>) -> bool {
        let Some((_, max_frame)) = track.range().defined() else {
            tracing::debug!("Nothing to play: track '{}' has no keys", track.name);
            return false;
        };

        if track.frame_rate <= 0.0 {
            tracing::warn!("Cannot play track '{}' with frame rate {}", track.name, track.frame_rate);
            return false;
        }

        let from = from.max(0.0);
        self.handle = Some(PlaybackHandle {
            track: track.id,
            from,
            to: to.unwrap_or(max_frame),
            frame_rate: track.frame_rate,
            frame: from,
        });
        tracing::info!("Playing '{}' from frame {} at {} fps", track.name, from, track.frame_rate);
        true
    }

    /// Stop playback and release the handle
    pub fn stop(&mut self) {
        if self.handle.take().is_some() {
            tracing::info!("Playback stopped");
        }
    }

    /// Is a playback running
    pub fn is_playing(&self) -> bool {
        self.handle.is_some()
    }

    /// Active playback, if any
    pub fn handle(&self) -> Option<&PlaybackHandle> {
        self.handle.as_ref()
    }

    /// Advance playback by `delta` and synchronize the object
    pub fn tick<A: Animatable + ?Sized>(
        &mut self,
        delta: Duration,
        cursor: &mut TimeCursor,
        animatable: &mut A,
    ) -> TickStatus {
        let Some(handle) = self.handle.as_mut() else {
            return TickStatus::Idle;
        };

        handle.frame += delta.as_secs_f32() * handle.frame_rate;
        let finished = handle.frame >= handle.to;
        if finished {
            handle.frame = handle.to;
        }

        let track = handle.track;
        cursor.set(handle.frame);
        self.sync(animatable, track, cursor.frame(), self.sync_type);

        if finished {
            self.handle = None;
            tracing::debug!("Playback reached frame {}", cursor.frame());
            TickStatus::Finished
        } else {
            TickStatus::Playing
        }
    }

    /// Move the cursor to the first key and synchronize the whole object
    pub fn reset_to_first_frame<A: Animatable + ?Sized>(
        &self,
        cursor: &mut TimeCursor,
        animatable: &mut A,
        track: TrackId,
    ) -> bool {
        let Some((min_frame, _)) = animatable.track(track).and_then(|t| t.range().defined()) else {
            return false;
        };

        cursor.set(min_frame);
        self.sync(animatable, track, cursor.frame(), SyncType::Object)
    }

    /// Push the value at the cursor onto the object using the bridge's sync type
    pub fn sync_to_current_frame<A: Animatable + ?Sized>(
        &self,
        cursor: &TimeCursor,
        animatable: &mut A,
        track: TrackId,
    ) -> bool {
        self.sync(animatable, track, cursor.frame(), self.sync_type)
    }

    /// Apply `frame` with blending disabled on the track, restoring it afterwards
    pub fn sync<A: Animatable + ?Sized>(
        &self,
        animatable: &mut A,
        track: TrackId,
        frame: f32,
        sync_type: SyncType,
    ) -> bool {
        let Some(enable_blending) = animatable.track_mut(track).map(|t| {
            let previous = t.enable_blending;
            t.enable_blending = false;
            previous
        }) else {
            return false;
        };

        let applied = match sync_type {
            SyncType::Animation => animatable.apply_track(track, frame),
            SyncType::Object => animatable.apply_all(frame) > 0,
            SyncType::Scene => animatable.apply_scene(frame) > 0,
        };

        if let Some(t) = animatable.track_mut(track) {
            t.enable_blending = enable_blending;
        }
        applied
    }
}

impl Default for PlaybackBridge {
    fn default() -> Self {
        Self::new(SyncType::default())
    }
}
