// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe curve editor.
//!
//! This crate provides the animation curve editing core:
//! - Keyframe tracks of float, vector and color values
//! - Projection of tracks into one chart series per component
//! - Key dragging, insertion and removal with undo/redo
//! - Time cursor playback synchronized onto animated objects
//!
//! ## Architecture
//!
//! The editor is built on:
//! - [`DatasetProjector`] turning a [`KeyframeTrack`] into [`ChartSeries`]
//! - [`ChartSurface`] turning pointer input into [`ChartEvent`]s
//! - [`KeyEditController`] applying events to the selected track
//! - [`PlaybackBridge`] pushing frame values onto an [`Animatable`]
//! - [`AnimationEditor`] tying them together with an [`UndoRedoLog`]

pub mod animatable;
pub mod controller;
pub mod dataset;
pub mod editor;
pub mod history;
pub mod keyframe;
pub mod playback;
pub mod surface;
pub mod track;
pub mod ui;

pub use animatable::{Animatable, AnimatableId, SceneAnimatable};
pub use controller::{ChartEvent, EditOutcome, EditSession, EditState, EditorKey, KeyEdit, KeyEditController};
pub use dataset::{ChartPoint, ChartSeries, DatasetProjector, SeriesStyle};
pub use editor::{AnimationEditor, EditorContext};
pub use history::{HistoryError, UndoRedoEntry, UndoRedoLog, MAX_HISTORY};
pub use keyframe::{Component, DataType, Interpolation, Key, KeyValue};
pub use playback::{PlaybackBridge, PlaybackHandle, SyncType, TickStatus, TimeCursor, DEFAULT_TICK_INTERVAL};
pub use surface::{AxisRange, ChartConfig, ChartSurface, PointerButton, PointerInput, SurfaceError, ZoomMode};
pub use track::{FrameRange, KeyframeTrack, TrackError, TrackId, MIN_KEYS};
pub use ui::{AnimationEditorPanel, CurveChartView};
