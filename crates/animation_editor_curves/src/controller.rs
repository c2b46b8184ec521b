// SPDX-License-Identifier: MIT OR Apache-2.0
//! Key editing state machine.
//!
//! The controller consumes [`ChartEvent`]s and edits the selected track.
//! Everything that belongs to one editing session (projected series, drag
//! state, time cursor) lives in [`EditSession`]; the host decides what to
//! do with the returned [`EditOutcome`].

use crate::dataset::{ChartPoint, ChartSeries, DatasetProjector};
use crate::keyframe::{Key, KeyValue};
use crate::playback::TimeCursor;
use crate::track::{KeyframeTrack, TrackId, MIN_KEYS};

/// Keyboard keys the chart reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKey {
    /// Held to lock keys horizontally while dragging
    Space,
}

/// Chart interaction event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartEvent {
    /// A point started being dragged
    DragStart {
        /// Series of the point
        series_index: usize,
        /// Key index
        point_index: usize,
    },
    /// A dragged point moved
    Drag {
        /// Series of the point
        series_index: usize,
        /// Key index
        point_index: usize,
        /// New chart coordinates
        point: ChartPoint,
    },
    /// A dragged point was released
    DragEnd {
        /// Series of the point
        series_index: usize,
        /// Key index
        point_index: usize,
        /// Final chart coordinates
        point: ChartPoint,
    },
    /// A point was clicked without dragging
    Click {
        /// Key index
        point_index: usize,
    },
    /// Double click on the chart
    DoubleClick {
        /// Key under the pointer
        point_index: Option<usize>,
        /// Chart coordinates of the pointer
        position: ChartPoint,
    },
    /// Primary button pressed
    PointerDown,
    /// Pointer moved
    PointerMove {
        /// Chart coordinates of the pointer
        position: ChartPoint,
    },
    /// Primary button released
    PointerUp,
    /// Key state change
    KeyPress {
        /// Key
        key: EditorKey,
        /// Pressed or released
        pressed: bool,
    },
    /// Context menu requested
    ContextMenu {
        /// Chart coordinates of the pointer
        position: ChartPoint,
        /// Key under the pointer
        point_index: Option<usize>,
    },
    /// "Add key" picked from the context menu
    ContextAddKey {
        /// Chart coordinates of the menu
        position: ChartPoint,
        /// Interpolate the value from the neighbouring keys
        interpolate: bool,
    },
    /// "Remove key" picked from the context menu
    ContextRemoveKey {
        /// Key index
        point_index: usize,
    },
    /// The pointer entered or left the time cursor
    TimeCursorHover(bool),
}

/// Drag state of the session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EditState {
    /// No gesture in progress
    #[default]
    Idle,
    /// A key point is being dragged
    DraggingKey {
        /// Series of the point
        series_index: usize,
        /// Key index
        point_index: usize,
        /// Point before the gesture started
        origin: Option<ChartPoint>,
    },
    /// The time cursor is being dragged
    DraggingTimeCursor,
}

/// A completed key move, ready to be recorded in the history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEdit {
    /// Series of the point
    pub series_index: usize,
    /// Key index
    pub point_index: usize,
    /// Point before the gesture
    pub before: ChartPoint,
    /// Point after the gesture
    pub after: ChartPoint,
}

/// What the host has to do after an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditOutcome {
    /// Nothing changed
    Unchanged,
    /// Only the chart needs repainting
    Redraw,
    /// The object must be synchronized to the time cursor
    Sync,
    /// A key move finished and should be pushed to the history
    Commit(KeyEdit),
    /// Keys were inserted or removed, so stored key indices are stale
    KeysChanged,
    /// Show the key in the inspector
    InspectKey(usize),
    /// Open the context menu
    ContextMenu {
        /// Chart coordinates of the pointer
        position: ChartPoint,
        /// Key under the pointer
        point_index: Option<usize>,
    },
}

/// Per-session editing state
#[derive(Debug, Clone)]
pub struct EditSession {
    /// Selected track
    pub track: Option<TrackId>,
    /// Series projected from the selected track
    pub series: Vec<ChartSeries>,
    /// Drag state
    pub state: EditState,
    /// Time cursor
    pub time_cursor: TimeCursor,
    /// Pan is disabled while a key or the time cursor is handled
    pub pan_suspended: bool,
    /// Pointer hovers the time cursor
    pub over_time_cursor: bool,
    /// Horizontal key dragging allowed
    pub drag_x: bool,
    /// Key shown in the inspector
    pub inspected_key: Option<usize>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self {
            track: None,
            series: DatasetProjector::project(None),
            state: EditState::Idle,
            time_cursor: TimeCursor::default(),
            pan_suspended: false,
            over_time_cursor: false,
            drag_x: true,
            inspected_key: None,
        }
    }
}

/// Edits keys of the selected track in response to chart events
#[derive(Debug, Default)]
pub struct KeyEditController {
    session: EditSession,
}

impl KeyEditController {
    /// Create a controller with no track selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Time cursor of the session
    pub fn time_cursor(&self) -> &TimeCursor {
        &self.session.time_cursor
    }

    /// Mutable time cursor of the session
    pub fn time_cursor_mut(&mut self) -> &mut TimeCursor {
        &mut self.session.time_cursor
    }

    /// Projected series
    pub fn series(&self) -> &[ChartSeries] {
        &self.session.series
    }

    /// Select a track (or none) and project it
    pub fn set_track(&mut self, track: Option<&KeyframeTrack>) {
        self.session.track = track.map(|t| t.id);
        self.session.state = EditState::Idle;
        self.session.pan_suspended = false;
        self.session.inspected_key = None;
        self.reproject(track);
    }

    /// Rebuild the series from the track
    pub fn reproject(&mut self, track: Option<&KeyframeTrack>) {
        self.session.series = DatasetProjector::project(track);
    }

    /// Select the key shown in the inspector
    pub fn set_inspected_key(&mut self, index: Option<usize>) {
        self.session.inspected_key = index;
    }

    /// Start dragging a point, remembering where it was
    pub fn begin_drag(&mut self, series_index: usize, point_index: usize) {
        let origin = self
            .session
            .series
            .get(series_index)
            .and_then(|s| s.points.get(point_index))
            .copied();

        self.session.state = EditState::DraggingKey {
            series_index,
            point_index,
            origin,
        };
        self.session.pan_suspended = true;
    }

    /// Move a dragged point and write it through to the track
    pub fn on_drag(
        &mut self,
        series_index: usize,
        point_index: usize,
        mut point: ChartPoint,
        track: &mut KeyframeTrack,
    ) -> EditOutcome {
        if !matches!(self.session.state, EditState::DraggingKey { .. }) {
            self.begin_drag(series_index, point_index);
        }

        if !self.session.drag_x {
            if let Some(key) = track.key(point_index) {
                point.x = key.frame;
            }
        }

        match self.update_key(series_index, point_index, point, track) {
            Some(_) => EditOutcome::Sync,
            None => EditOutcome::Unchanged,
        }
    }

    /// Finish a drag gesture.
    ///
    /// Yields a [`KeyEdit`] when the pre-drag point was captured.
    pub fn end_drag(
        &mut self,
        series_index: usize,
        point_index: usize,
        point: ChartPoint,
        track: &mut KeyframeTrack,
    ) -> EditOutcome {
        let origin = match self.session.state {
            EditState::DraggingKey { origin, .. } => origin,
            _ => None,
        };

        let applied = self.on_drag(series_index, point_index, point, track);
        self.session.state = EditState::Idle;
        self.session.pan_suspended = self.session.over_time_cursor;

        let after = self
            .session
            .series
            .get(series_index)
            .and_then(|s| s.points.get(point_index))
            .copied();

        match (origin, after, applied) {
            (Some(before), Some(after), EditOutcome::Sync) => EditOutcome::Commit(KeyEdit {
                series_index,
                point_index,
                before,
                after,
            }),
            (_, _, outcome) => outcome,
        }
    }

    /// Write a point into the key at `point_index`.
    ///
    /// The frame is clamped to zero and between the neighbouring keys so
    /// the key order never changes. Returns the point actually stored.
    pub fn update_key(
        &mut self,
        series_index: usize,
        point_index: usize,
        point: ChartPoint,
        track: &mut KeyframeTrack,
    ) -> Option<ChartPoint> {
        let data_type = track.data_type();
        if series_index >= data_type.component_count() {
            tracing::debug!("Series {series_index} does not exist for {data_type:?}");
            return None;
        }

        let (lower, upper) = track.movable_bounds(point_index);
        let frame = point.x.max(0.0).max(lower).min(upper);

        let key = track.key_mut(point_index)?;
        key.frame = frame;
        key.value.set(series_index, point.y);

        let stored = ChartPoint::new(frame, point.y);
        DatasetProjector::patch_point(&mut self.session.series, data_type, series_index, point_index, stored);
        Some(stored)
    }

    /// Insert a key at `frame`.
    ///
    /// The key goes before the first key at or after `frame`; when no such
    /// key exists nothing is inserted. With `interpolate`, the value is
    /// blended from the surrounding keys and there must be a key before.
    pub fn add_key(
        &mut self,
        track: &mut KeyframeTrack,
        frame: f32,
        value: f32,
        interpolate: bool,
    ) -> bool {
        let Some(index) = track.keys().iter().position(|k| k.frame >= frame) else {
            tracing::debug!("No key after frame {frame}, nothing added");
            return false;
        };

        let key_value = if interpolate {
            let Some(previous) = index.checked_sub(1).and_then(|i| track.key(i)) else {
                tracing::debug!("No key before frame {frame} to interpolate from");
                return false;
            };
            let Some(next) = track.key(index) else {
                return false;
            };

            let amount = frame / (next.frame - previous.frame);
            match previous.value.lerp(&next.value, amount) {
                Some(v) => v,
                None => return false,
            }
        } else {
            KeyValue::uniform(track.data_type(), value)
        };

        track.insert_key(index, Key::new(frame, key_value));
        self.reproject(Some(track));
        tracing::debug!("Added key at frame {frame} (index {index})");
        true
    }

    /// Remove a key, keeping at least two keys on the track
    pub fn remove_key(&mut self, track: &mut KeyframeTrack, index: usize) -> bool {
        if track.len() <= MIN_KEYS {
            tracing::debug!("Track '{}' needs at least {MIN_KEYS} keys", track.name);
            return false;
        }

        if track.take_key(index).is_none() {
            return false;
        }

        self.session.inspected_key = match self.session.inspected_key {
            Some(inspected) if inspected == index => None,
            Some(inspected) if inspected > index => Some(inspected - 1),
            other => other,
        };
        self.reproject(Some(track));
        true
    }

    /// Dispatch a chart event
    pub fn handle_event(&mut self, event: ChartEvent, track: Option<&mut KeyframeTrack>) -> EditOutcome {
        match event {
            ChartEvent::DragStart { series_index, point_index } => {
                self.begin_drag(series_index, point_index);
                EditOutcome::Redraw
            }
            ChartEvent::Drag { series_index, point_index, point } => match track {
                Some(track) => self.on_drag(series_index, point_index, point, track),
                None => EditOutcome::Unchanged,
            },
            ChartEvent::DragEnd { series_index, point_index, point } => match track {
                Some(track) => self.end_drag(series_index, point_index, point, track),
                None => {
                    self.session.state = EditState::Idle;
                    self.session.pan_suspended = false;
                    EditOutcome::Unchanged
                }
            },
            ChartEvent::Click { point_index } => {
                self.session.inspected_key = Some(point_index);
                EditOutcome::InspectKey(point_index)
            }
            ChartEvent::DoubleClick { point_index, position } => {
                let frame = point_index
                    .and_then(|i| track.as_deref().and_then(|t| t.key(i)))
                    .map_or(position.x, |k| k.frame);
                self.session.time_cursor.set(frame);
                EditOutcome::Sync
            }
            ChartEvent::PointerDown => {
                if self.session.over_time_cursor && self.session.state == EditState::Idle {
                    self.session.state = EditState::DraggingTimeCursor;
                    self.session.pan_suspended = true;
                    EditOutcome::Redraw
                } else {
                    EditOutcome::Unchanged
                }
            }
            ChartEvent::PointerMove { position } => {
                if self.session.state == EditState::DraggingTimeCursor {
                    self.session.time_cursor.set(position.x);
                    EditOutcome::Sync
                } else {
                    EditOutcome::Unchanged
                }
            }
            ChartEvent::PointerUp => {
                if self.session.state == EditState::DraggingTimeCursor {
                    self.session.state = EditState::Idle;
                    self.session.pan_suspended = self.session.over_time_cursor;
                    EditOutcome::Redraw
                } else {
                    EditOutcome::Unchanged
                }
            }
            ChartEvent::KeyPress { key: EditorKey::Space, pressed } => {
                self.session.drag_x = !pressed;
                EditOutcome::Unchanged
            }
            ChartEvent::ContextMenu { position, point_index } => {
                EditOutcome::ContextMenu { position, point_index }
            }
            ChartEvent::ContextAddKey { position, interpolate } => match track {
                Some(track) => {
                    if self.add_key(track, position.x, position.y, interpolate) {
                        EditOutcome::KeysChanged
                    } else {
                        EditOutcome::Unchanged
                    }
                }
                None => EditOutcome::Unchanged,
            },
            ChartEvent::ContextRemoveKey { point_index } => match track {
                Some(track) => {
                    if self.remove_key(track, point_index) {
                        EditOutcome::KeysChanged
                    } else {
                        EditOutcome::Unchanged
                    }
                }
                None => EditOutcome::Unchanged,
            },
            ChartEvent::TimeCursorHover(hovered) => {
                self.session.over_time_cursor = hovered;
                if self.session.state == EditState::Idle {
                    self.session.pan_suspended = hovered;
                }
                EditOutcome::Redraw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::DataType;

    fn float_track(keys: &[(f32, f32)]) -> KeyframeTrack {
        KeyframeTrack::new("Intensity", "intensity", DataType::Float, 60.0)
            .with_keys(keys.iter().map(|&(f, v)| Key::new(f, KeyValue::Float(v))))
            .unwrap()
    }

    fn frames(track: &KeyframeTrack) -> Vec<f32> {
        track.keys().iter().map(|k| k.frame).collect()
    }

    fn controller_for(track: &KeyframeTrack) -> KeyEditController {
        let mut controller = KeyEditController::new();
        controller.set_track(Some(track));
        controller
    }

    #[test]
    fn test_drag_clamps_negative_frame() {
        let mut track = float_track(&[(3.0, 1.0), (20.0, 2.0)]);
        let mut controller = controller_for(&track);

        let outcome = controller.on_drag(0, 0, ChartPoint::new(-5.0, 4.0), &mut track);
        assert_eq!(outcome, EditOutcome::Sync);
        assert_eq!(track.key(0).map(|k| k.frame), Some(0.0));
        assert_eq!(track.key(0).map(|k| k.value), Some(KeyValue::Float(4.0)));
        assert_eq!(controller.series()[0].points[0], ChartPoint::new(0.0, 4.0));
    }

    #[test]
    fn test_drag_cannot_pass_neighbour() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let mut controller = controller_for(&track);

        controller.on_drag(0, 1, ChartPoint::new(35.0, 1.0), &mut track);
        assert_eq!(frames(&track), vec![0.0, 20.0, 20.0]);

        controller.on_drag(0, 1, ChartPoint::new(-4.0, 1.0), &mut track);
        assert_eq!(frames(&track), vec![0.0, 0.0, 20.0]);
    }

    #[test]
    fn test_drag_vector_component() {
        let mut track = KeyframeTrack::new("Move", "position", DataType::Vector3, 60.0)
            .with_keys([
                Key::new(0.0, KeyValue::Vector3([0.0, 0.0, 0.0])),
                Key::new(10.0, KeyValue::Vector3([1.0, 1.0, 1.0])),
            ])
            .unwrap();
        let mut controller = controller_for(&track);

        controller.on_drag(2, 1, ChartPoint::new(12.0, 9.0), &mut track);
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Vector3([1.0, 1.0, 9.0])));
        for series in controller.series() {
            assert_eq!(series.points[1].x, 12.0);
        }
        assert_eq!(controller.series()[0].points[1].y, 1.0);
    }

    #[test]
    fn test_space_locks_horizontal_drag() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 0.0)]);
        let mut controller = controller_for(&track);

        controller.handle_event(ChartEvent::KeyPress { key: EditorKey::Space, pressed: true }, None);
        controller.on_drag(0, 1, ChartPoint::new(15.0, 3.0), &mut track);
        assert_eq!(track.key(1).map(|k| k.frame), Some(10.0));
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(3.0)));

        controller.handle_event(ChartEvent::KeyPress { key: EditorKey::Space, pressed: false }, None);
        assert!(controller.session().drag_x);
    }

    #[test]
    fn test_end_drag_commits_pre_drag_point() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 5.0), (30.0, 0.0)]);
        let mut controller = controller_for(&track);

        controller.handle_event(ChartEvent::DragStart { series_index: 0, point_index: 1 }, Some(&mut track));
        assert!(controller.session().pan_suspended);
        controller.handle_event(
            ChartEvent::Drag { series_index: 0, point_index: 1, point: ChartPoint::new(11.0, 6.0) },
            Some(&mut track),
        );
        let outcome = controller.handle_event(
            ChartEvent::DragEnd { series_index: 0, point_index: 1, point: ChartPoint::new(12.0, 7.0) },
            Some(&mut track),
        );

        assert_eq!(
            outcome,
            EditOutcome::Commit(KeyEdit {
                series_index: 0,
                point_index: 1,
                before: ChartPoint::new(10.0, 5.0),
                after: ChartPoint::new(12.0, 7.0),
            })
        );
        assert_eq!(controller.session().state, EditState::Idle);
        assert!(!controller.session().pan_suspended);
    }

    #[test]
    fn test_remove_key_keeps_two_keys() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 1.0)]);
        let mut controller = controller_for(&track);
        assert!(!controller.remove_key(&mut track, 0));
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_remove_key_removes_target() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 1.0), (20.0, 2.0)]);
        let mut controller = controller_for(&track);
        assert!(controller.remove_key(&mut track, 1));
        assert_eq!(frames(&track), vec![0.0, 20.0]);
        assert_eq!(controller.series()[0].points.len(), 2);
    }

    #[test]
    fn test_remove_key_shifts_inspected_key() {
        let mut track = float_track(&[(0.0, 0.0), (10.0, 1.0), (20.0, 2.0), (30.0, 3.0)]);
        let mut controller = controller_for(&track);

        controller.set_inspected_key(Some(2));
        assert!(controller.remove_key(&mut track, 0));
        assert_eq!(controller.session().inspected_key, Some(1));
        assert_eq!(track.key(1).map(|k| k.frame), Some(20.0));

        assert!(controller.remove_key(&mut track, 1));
        assert_eq!(controller.session().inspected_key, None);
    }

    #[test]
    fn test_context_menu_edits_keys() {
        let mut track = float_track(&[(0.0, 0.0), (20.0, 20.0)]);
        let mut controller = controller_for(&track);

        let outcome = controller.handle_event(
            ChartEvent::ContextAddKey { position: ChartPoint::new(10.0, 3.0), interpolate: false },
            Some(&mut track),
        );
        assert_eq!(outcome, EditOutcome::KeysChanged);
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(3.0)));

        let outcome = controller.handle_event(ChartEvent::ContextRemoveKey { point_index: 1 }, Some(&mut track));
        assert_eq!(outcome, EditOutcome::KeysChanged);
        assert_eq!(frames(&track), vec![0.0, 20.0]);

        let outcome = controller.handle_event(ChartEvent::ContextRemoveKey { point_index: 0 }, Some(&mut track));
        assert_eq!(outcome, EditOutcome::Unchanged);
        let outcome = controller.handle_event(
            ChartEvent::ContextAddKey { position: ChartPoint::new(5.0, 0.0), interpolate: false },
            None,
        );
        assert_eq!(outcome, EditOutcome::Unchanged);
    }

    #[test]
    fn test_add_key_with_value() {
        let mut track = float_track(&[(0.0, 0.0), (20.0, 20.0)]);
        let mut controller = controller_for(&track);
        assert!(controller.add_key(&mut track, 10.0, 5.0, false));
        assert_eq!(frames(&track), vec![0.0, 10.0, 20.0]);
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(5.0)));
        assert_eq!(controller.series()[0].points.len(), 3);
    }

    #[test]
    fn test_add_key_interpolated() {
        let mut track = float_track(&[(0.0, 0.0), (20.0, 20.0)]);
        let mut controller = controller_for(&track);
        assert!(controller.add_key(&mut track, 10.0, 0.0, true));
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(10.0)));
    }

    #[test]
    fn test_add_key_interpolation_amount_uses_absolute_frame() {
        let mut track = float_track(&[(10.0, 0.0), (30.0, 20.0)]);
        let mut controller = controller_for(&track);
        assert!(controller.add_key(&mut track, 20.0, 0.0, true));
        // amount = 20 / (30 - 10) = 1.0
        assert_eq!(track.key(1).map(|k| k.value), Some(KeyValue::Float(20.0)));
    }

    #[test]
    fn test_add_key_noops() {
        let mut track = float_track(&[(5.0, 0.0), (20.0, 20.0)]);
        let mut controller = controller_for(&track);
        assert!(!controller.add_key(&mut track, 25.0, 1.0, false));
        assert!(!controller.add_key(&mut track, 2.0, 1.0, true));
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn test_time_cursor_drag() {
        let mut controller = KeyEditController::new();
        controller.handle_event(ChartEvent::TimeCursorHover(true), None);
        assert!(controller.session().pan_suspended);

        assert_eq!(controller.handle_event(ChartEvent::PointerDown, None), EditOutcome::Redraw);
        let outcome = controller.handle_event(ChartEvent::PointerMove { position: ChartPoint::new(-3.0, 0.0) }, None);
        assert_eq!(outcome, EditOutcome::Sync);
        assert_eq!(controller.time_cursor().frame(), 0.0);

        controller.handle_event(ChartEvent::PointerMove { position: ChartPoint::new(14.0, 0.0) }, None);
        controller.handle_event(ChartEvent::PointerUp, None);
        assert_eq!(controller.time_cursor().frame(), 14.0);
        assert_eq!(controller.session().state, EditState::Idle);
    }

    #[test]
    fn test_double_click_moves_cursor() {
        let mut track = float_track(&[(0.0, 0.0), (12.0, 1.0)]);
        let mut controller = controller_for(&track);

        controller.handle_event(
            ChartEvent::DoubleClick { point_index: Some(1), position: ChartPoint::new(11.0, 0.0) },
            Some(&mut track),
        );
        assert_eq!(controller.time_cursor().frame(), 12.0);

        controller.handle_event(
            ChartEvent::DoubleClick { point_index: None, position: ChartPoint::new(7.5, 0.0) },
            Some(&mut track),
        );
        assert_eq!(controller.time_cursor().frame(), 7.5);
    }

    #[test]
    fn test_click_inspects_key() {
        let mut controller = KeyEditController::new();
        assert_eq!(controller.handle_event(ChartEvent::Click { point_index: 2 }, None), EditOutcome::InspectKey(2));
        assert_eq!(controller.session().inspected_key, Some(2));
    }
}
