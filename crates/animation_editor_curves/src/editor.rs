// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation editor panel state.
//!
//! Ties the chart surface, key controller, playback bridge and history
//! together for a set of animated objects.

use crate::animatable::{Animatable, AnimatableId};
use crate::controller::{ChartEvent, EditOutcome, KeyEdit, KeyEditController};
use crate::dataset::{ChartPoint, ChartSeries};
use crate::history::{self, UndoRedoEntry, UndoRedoLog};
use crate::playback::{PlaybackBridge, SyncType, TickStatus};
use crate::surface::{ChartConfig, ChartSurface, PointerInput};
use crate::track::{KeyframeTrack, TrackId};
use indexmap::IndexMap;
use std::time::Duration;

fn resolve_track<A: Animatable>(
    objects: &IndexMap<AnimatableId, A>,
    object: Option<AnimatableId>,
    track: Option<TrackId>,
) -> Option<&KeyframeTrack> {
    objects.get(&object?)?.track(track?)
}

fn resolve_track_mut<A: Animatable>(
    objects: &mut IndexMap<AnimatableId, A>,
    object: Option<AnimatableId>,
    track: Option<TrackId>,
) -> Option<&mut KeyframeTrack> {
    objects.get_mut(&object?)?.track_mut(track?)
}

/// Everything history entries operate on
#[derive(Debug)]
pub struct EditorContext<A> {
    objects: IndexMap<AnimatableId, A>,
    selected: Option<AnimatableId>,
    /// Key editing state
    pub controller: KeyEditController,
    /// Playback and synchronization
    pub bridge: PlaybackBridge,
    /// Chart surface
    pub surface: ChartSurface,
}

impl<A: Animatable> EditorContext<A> {
    /// Selected track of the selected object
    pub fn selected_track(&self) -> Option<&KeyframeTrack> {
        resolve_track(&self.objects, self.selected, self.controller.session().track)
    }

    /// Write a point into a key of a specific track
    fn write_point(&mut self, object: AnimatableId, track: TrackId, series_index: usize, point_index: usize, point: ChartPoint) {
        let Some(track) = resolve_track_mut(&mut self.objects, Some(object), Some(track)) else {
            tracing::debug!("History target track no longer exists");
            return;
        };
        self.controller.update_key(series_index, point_index, point, track);
    }

    /// Re-project the selected track and synchronize the object
    pub fn refresh(&mut self) {
        let track = resolve_track(&self.objects, self.selected, self.controller.session().track);
        self.controller.reproject(track);
        self.sync_to_cursor();
    }

    /// Push the value at the time cursor onto the selected object
    pub fn sync_to_cursor(&mut self) -> bool {
        let (Some(object), Some(track)) = (self.selected, self.controller.session().track) else {
            return false;
        };
        let Some(object) = self.objects.get_mut(&object) else {
            return false;
        };
        self.bridge.sync_to_current_frame(self.controller.time_cursor(), object, track)
    }

    /// Reset the selected object to the first frame of the selected track
    fn reset_selected_to_first_frame(&mut self) -> bool {
        let (Some(object), Some(track)) = (self.selected, self.controller.session().track) else {
            return false;
        };
        let Some(object) = self.objects.get_mut(&object) else {
            return false;
        };
        self.bridge.reset_to_first_frame(self.controller.time_cursor_mut(), object, track)
    }
}

/// Curve editor for a set of animated objects
#[derive(Debug)]
pub struct AnimationEditor<A: Animatable + 'static> {
    context: EditorContext<A>,
    history: UndoRedoLog<EditorContext<A>>,
}

impl<A: Animatable + 'static> AnimationEditor<A> {
    /// Create an editor without objects
    pub fn new(config: &ChartConfig, history_depth: usize, sync_type: SyncType) -> Self {
        let bridge = PlaybackBridge::new(sync_type)
            .with_tick_interval(Duration::from_millis(config.tick_interval_ms.max(1)));

        Self {
            context: EditorContext {
                objects: IndexMap::new(),
                selected: None,
                controller: KeyEditController::new(),
                bridge,
                surface: ChartSurface::new(config.clone()),
            },
            history: UndoRedoLog::with_max_depth(history_depth),
        }
    }

    /// Shared editing context
    pub fn context(&self) -> &EditorContext<A> {
        &self.context
    }

    /// Chart surface
    pub fn surface(&self) -> &ChartSurface {
        &self.context.surface
    }

    /// Mutable chart surface
    pub fn surface_mut(&mut self) -> &mut ChartSurface {
        &mut self.context.surface
    }

    /// Key controller
    pub fn controller(&self) -> &KeyEditController {
        &self.context.controller
    }

    /// Playback bridge
    pub fn bridge(&self) -> &PlaybackBridge {
        &self.context.bridge
    }

    /// Undo history
    pub fn history(&self) -> &UndoRedoLog<EditorContext<A>> {
        &self.history
    }

    /// Projected series of the selected track
    pub fn series(&self) -> &[ChartSeries] {
        self.context.controller.series()
    }

    /// Current time cursor frame
    pub fn current_frame(&self) -> f32 {
        self.context.controller.time_cursor().frame()
    }

    /// Register an object
    pub fn add_animatable(&mut self, animatable: A) -> AnimatableId {
        let id = animatable.id();
        self.context.objects.insert(id, animatable);
        id
    }

    /// Get a registered object
    pub fn animatable(&self, id: AnimatableId) -> Option<&A> {
        self.context.objects.get(&id)
    }

    /// All registered objects
    pub fn animatables(&self) -> impl Iterator<Item = &A> {
        self.context.objects.values()
    }

    /// Selected object
    pub fn selected_animatable(&self) -> Option<&A> {
        self.context.objects.get(&self.context.selected?)
    }

    /// Selected object ID
    pub fn selected_animatable_id(&self) -> Option<AnimatableId> {
        self.context.selected
    }

    /// Selected track
    pub fn selected_track(&self) -> Option<&KeyframeTrack> {
        self.context.selected_track()
    }

    /// Select an object and its first track.
    ///
    /// The previously selected object is reset to its first frame.
    pub fn select_animatable(&mut self, id: Option<AnimatableId>) -> bool {
        if id == self.context.selected {
            return false;
        }
        if id.is_some_and(|id| !self.context.objects.contains_key(&id)) {
            tracing::warn!("Cannot select unknown object {id:?}");
            return false;
        }

        self.context.bridge.stop();
        self.context.reset_selected_to_first_frame();

        self.context.selected = id;
        let first_track = id
            .and_then(|id| self.context.objects.get(&id))
            .and_then(|o| o.track_ids().first().copied());
        self.select_track(first_track);
        tracing::debug!("Selected object {id:?}");
        true
    }

    /// Select a track of the selected object
    pub fn select_track(&mut self, id: Option<TrackId>) -> bool {
        self.context.bridge.stop();

        let track = id.and_then(|id| {
            let track = resolve_track(&self.context.objects, self.context.selected, Some(id));
            if track.is_none() {
                tracing::warn!("Track {id:?} does not belong to the selected object");
            }
            track
        });
        self.context.controller.set_track(track);
        id.is_none() || track.is_some()
    }

    /// Change how frames are applied to the scene
    pub fn set_sync_type(&mut self, sync_type: SyncType) {
        self.context.bridge.sync_type = sync_type;
    }

    /// Current sync type
    pub fn sync_type(&self) -> SyncType {
        self.context.bridge.sync_type
    }

    /// Feed raw pointer input through the surface and the controller
    pub fn handle_input(&mut self, input: PointerInput) -> Vec<EditOutcome> {
        let session = self.context.controller.session();
        let events = self.context.surface.interpret(
            input,
            &session.series,
            session.time_cursor.frame(),
            session.pan_suspended,
        );

        events
            .into_iter()
            .map(|event| self.handle_event(event))
            .filter(|outcome| *outcome != EditOutcome::Unchanged)
            .collect()
    }

    /// Apply one chart event
    pub fn handle_event(&mut self, event: ChartEvent) -> EditOutcome {
        let ctx = &mut self.context;
        let track = resolve_track_mut(&mut ctx.objects, ctx.selected, ctx.controller.session().track);
        let outcome = ctx.controller.handle_event(event, track);

        match outcome {
            EditOutcome::Sync => {
                ctx.sync_to_cursor();
            }
            EditOutcome::Commit(edit) => self.record(edit),
            EditOutcome::KeysChanged => self.forget_key_edits(),
            _ => {}
        }
        outcome
    }

    /// Key moves are recorded by index; inserting or removing a key
    /// invalidates every recorded move.
    fn forget_key_edits(&mut self) {
        if self.history.can_undo() || self.history.can_redo() {
            tracing::debug!("Key indices changed, clearing undo history");
        }
        self.history.clear();
    }

    fn record(&mut self, edit: KeyEdit) {
        let (Some(object), Some(track)) = (self.context.selected, self.context.controller.session().track) else {
            return;
        };

        let KeyEdit { series_index, point_index, before, after } = edit;
        let entry = UndoRedoEntry::new(
            format!("Move key {point_index}"),
            |ctx: &mut EditorContext<A>| ctx.refresh(),
            move |ctx: &mut EditorContext<A>| ctx.write_point(object, track, series_index, point_index, before),
            move |ctx: &mut EditorContext<A>| ctx.write_point(object, track, series_index, point_index, after),
        );
        self.history.push(entry, &mut self.context);
    }

    /// Start playing the selected track from the time cursor
    pub fn play(&mut self) -> bool {
        let ctx = &mut self.context;
        let Some(track) = resolve_track(&ctx.objects, ctx.selected, ctx.controller.session().track) else {
            tracing::debug!("Nothing selected to play");
            return false;
        };

        let cursor = Some(ctx.controller.time_cursor().frame());
        let Some(start) = PlaybackBridge::start_frame(cursor, track.range()) else {
            tracing::debug!("Track '{}' has no keys", track.name);
            return false;
        };

        if !ctx.bridge.play(track, start, None) {
            return false;
        }
        ctx.controller.time_cursor_mut().set(start);
        true
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.context.bridge.stop();
    }

    /// Is playback running
    pub fn is_playing(&self) -> bool {
        self.context.bridge.is_playing()
    }

    /// Advance playback
    pub fn tick(&mut self, delta: Duration) -> TickStatus {
        let ctx = &mut self.context;
        let Some(object) = ctx.selected.and_then(|id| ctx.objects.get_mut(&id)) else {
            return TickStatus::Idle;
        };
        ctx.bridge.tick(delta, ctx.controller.time_cursor_mut(), object)
    }

    /// Key the current property values at the time cursor.
    ///
    /// Keys only the selected track with [`SyncType::Animation`] and every
    /// track of the object otherwise. Returns the number of keyed tracks.
    pub fn add_key_at_cursor(&mut self) -> usize {
        let ctx = &mut self.context;
        let frame = ctx.controller.time_cursor().frame();
        let (Some(object_id), Some(selected_track)) = (ctx.selected, ctx.controller.session().track) else {
            return 0;
        };
        let Some(object) = ctx.objects.get_mut(&object_id) else {
            return 0;
        };

        let tracks = match ctx.bridge.sync_type {
            SyncType::Animation => vec![selected_track],
            SyncType::Object | SyncType::Scene => object.track_ids(),
        };

        let mut keyed = 0;
        for id in tracks {
            let Some(value) = object.track(id).and_then(|t| object.property(&t.target_property)) else {
                tracing::debug!("No property value for track {id:?}");
                continue;
            };
            if object.track_mut(id).is_some_and(|t| t.set_key_at(frame, value)) {
                keyed += 1;
            }
        }

        let track = resolve_track(&ctx.objects, ctx.selected, Some(selected_track));
        ctx.controller.reproject(track);
        if keyed > 0 {
            self.forget_key_edits();
        }
        tracing::debug!("Keyed {keyed} track(s) at frame {frame}");
        keyed
    }

    /// Insert a key on the selected track
    pub fn add_key(&mut self, frame: f32, value: f32, interpolate: bool) -> bool {
        let ctx = &mut self.context;
        let added = match resolve_track_mut(&mut ctx.objects, ctx.selected, ctx.controller.session().track) {
            Some(track) => ctx.controller.add_key(track, frame, value, interpolate),
            None => false,
        };
        if added {
            self.forget_key_edits();
        }
        added
    }

    /// Remove a key from the selected track
    pub fn remove_key(&mut self, index: usize) -> bool {
        let ctx = &mut self.context;
        let removed = match resolve_track_mut(&mut ctx.objects, ctx.selected, ctx.controller.session().track) {
            Some(track) => ctx.controller.remove_key(track, index),
            None => false,
        };
        if removed {
            self.forget_key_edits();
        }
        removed
    }

    /// Select the key shown in the inspector
    pub fn set_inspected_key(&mut self, index: Option<usize>) {
        self.context.controller.set_inspected_key(index);
    }

    /// Undo the last key move
    pub fn undo(&mut self) -> history::Result<()> {
        self.history.undo(&mut self.context)
    }

    /// Redo the last undone key move
    pub fn redo(&mut self) -> history::Result<()> {
        self.history.redo(&mut self.context)
    }

    /// Close the panel, leaving the object on its first frame
    pub fn close(&mut self) {
        self.context.bridge.stop();
        self.context.reset_selected_to_first_frame();
        self.context.surface.destroy();
        tracing::info!("Animation editor closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::SceneAnimatable;
    use crate::controller::EditState;
    use crate::keyframe::{DataType, Key, KeyValue};
    use crate::surface::PointerButton;
    use egui::{Pos2, Rect, Vec2};

    fn float_track(name: &str, property: &str, keys: &[(f32, f32)]) -> KeyframeTrack {
        KeyframeTrack::new(name, property, DataType::Float, 60.0)
            .with_keys(keys.iter().map(|&(f, v)| Key::new(f, KeyValue::Float(v))))
            .unwrap()
    }

    fn editor_with_light() -> (AnimationEditor<SceneAnimatable>, AnimatableId, TrackId) {
        let mut object = SceneAnimatable::new("Light").with_property("intensity", KeyValue::Float(0.5));
        let track = object.add_track(float_track("Intensity", "intensity", &[(0.0, 0.0), (10.0, 5.0), (30.0, 0.0)]));
        object.add_track(float_track("Range", "range", &[(0.0, 1.0), (30.0, 2.0)]));

        let mut editor = AnimationEditor::new(&ChartConfig::default(), 100, SyncType::Animation);
        let id = editor.add_animatable(object);
        editor.select_animatable(Some(id));
        (editor, id, track)
    }

    #[test]
    fn test_select_animatable_picks_first_track() {
        let (editor, _, track) = editor_with_light();
        assert_eq!(editor.selected_track().map(|t| t.id), Some(track));
        assert_eq!(editor.series()[0].points.len(), 3);
    }

    #[test]
    fn test_switching_object_resets_previous_to_first_frame() {
        let (mut editor, light, _) = editor_with_light();
        editor.handle_event(ChartEvent::DoubleClick { point_index: Some(1), position: ChartPoint::new(10.0, 0.0) });
        assert_eq!(
            editor.animatable(light).and_then(|o| o.property("intensity")),
            Some(KeyValue::Float(5.0))
        );

        let other = editor.add_animatable(SceneAnimatable::new("Empty"));
        assert!(editor.select_animatable(Some(other)));
        assert_eq!(
            editor.animatable(light).and_then(|o| o.property("intensity")),
            Some(KeyValue::Float(0.0))
        );
        assert!(editor.selected_track().is_none());
    }

    #[test]
    fn test_drag_undo_redo_roundtrip() {
        let (mut editor, _, _) = editor_with_light();

        editor.handle_event(ChartEvent::DragStart { series_index: 0, point_index: 1 });
        editor.handle_event(ChartEvent::Drag { series_index: 0, point_index: 1, point: ChartPoint::new(14.0, 8.0) });
        let outcome = editor.handle_event(ChartEvent::DragEnd {
            series_index: 0,
            point_index: 1,
            point: ChartPoint::new(15.0, 9.0),
        });
        assert!(matches!(outcome, EditOutcome::Commit(_)));
        assert!(editor.history().can_undo());

        editor.undo().unwrap();
        let key = editor.selected_track().and_then(|t| t.key(1)).copied().unwrap();
        assert_eq!((key.frame, key.value), (10.0, KeyValue::Float(5.0)));
        assert_eq!(editor.series()[0].points[1], ChartPoint::new(10.0, 5.0));

        editor.redo().unwrap();
        let key = editor.selected_track().and_then(|t| t.key(1)).copied().unwrap();
        assert_eq!((key.frame, key.value), (15.0, KeyValue::Float(9.0)));
    }

    fn keys_of(editor: &AnimationEditor<SceneAnimatable>) -> Vec<(f32, KeyValue)> {
        editor
            .selected_track()
            .map(|t| t.keys().iter().map(|k| (k.frame, k.value)).collect())
            .unwrap_or_default()
    }

    fn drag_key_one(editor: &mut AnimationEditor<SceneAnimatable>) {
        editor.handle_event(ChartEvent::DragStart { series_index: 0, point_index: 1 });
        editor.handle_event(ChartEvent::DragEnd {
            series_index: 0,
            point_index: 1,
            point: ChartPoint::new(15.0, 9.0),
        });
    }

    #[test]
    fn test_inserting_key_drops_stale_moves() {
        let (mut editor, _, _) = editor_with_light();
        drag_key_one(&mut editor);
        assert!(editor.history().can_undo());

        assert!(editor.add_key(5.0, 1.0, false));
        assert!(!editor.history().can_undo());
        assert!(editor.undo().is_err());
        assert_eq!(
            keys_of(&editor),
            vec![
                (0.0, KeyValue::Float(0.0)),
                (5.0, KeyValue::Float(1.0)),
                (15.0, KeyValue::Float(9.0)),
                (30.0, KeyValue::Float(0.0)),
            ]
        );
    }

    #[test]
    fn test_removing_key_drops_stale_moves() {
        let (mut editor, _, _) = editor_with_light();
        drag_key_one(&mut editor);
        editor.undo().unwrap();
        assert!(editor.history().can_redo());

        let outcome = editor.handle_event(ChartEvent::ContextRemoveKey { point_index: 0 });
        assert_eq!(outcome, EditOutcome::KeysChanged);
        assert!(!editor.history().can_redo());
        assert!(editor.redo().is_err());
        assert_eq!(keys_of(&editor), vec![(10.0, KeyValue::Float(5.0)), (30.0, KeyValue::Float(0.0))]);
    }

    #[test]
    fn test_failed_insert_keeps_history() {
        let (mut editor, _, _) = editor_with_light();
        drag_key_one(&mut editor);

        assert!(!editor.add_key(40.0, 1.0, false));
        assert!(editor.history().can_undo());
    }

    #[test]
    fn test_play_and_tick() {
        let (mut editor, light, _) = editor_with_light();
        assert!(editor.play());
        assert_eq!(editor.current_frame(), 0.0);

        assert_eq!(editor.tick(Duration::from_millis(100)), TickStatus::Playing);
        assert!((editor.current_frame() - 6.0).abs() < 1e-3);
        assert!(editor.animatable(light).and_then(|o| o.property("intensity")).is_some());

        editor.stop();
        assert!(!editor.is_playing());
        assert_eq!(editor.tick(Duration::from_millis(100)), TickStatus::Idle);
    }

    #[test]
    fn test_play_without_keys() {
        let mut object = SceneAnimatable::new("Empty");
        object.add_track(KeyframeTrack::new("Alpha", "alpha", DataType::Float, 60.0));
        let mut editor = AnimationEditor::new(&ChartConfig::default(), 10, SyncType::Animation);
        let id = editor.add_animatable(object);
        editor.select_animatable(Some(id));

        assert!(!editor.play());
        assert!(!editor.is_playing());
    }

    #[test]
    fn test_add_key_at_cursor_per_sync_type() {
        let (mut editor, light, _) = editor_with_light();
        editor.handle_event(ChartEvent::DoubleClick { point_index: None, position: ChartPoint::new(20.0, 0.0) });

        // Syncing wrote the evaluated value at frame 20 onto the object
        assert_eq!(editor.add_key_at_cursor(), 1);
        assert_eq!(editor.selected_track().map(|t| t.len()), Some(4));

        editor.set_sync_type(SyncType::Object);
        editor.handle_event(ChartEvent::DoubleClick { point_index: None, position: ChartPoint::new(25.0, 0.0) });
        // Object sync wrote every track's value, so every track gets keyed
        assert_eq!(editor.add_key_at_cursor(), 2);

        let object = editor.animatable(light).unwrap();
        assert!(object.tracks().all(|t| t.keys().iter().any(|k| k.frame == 25.0)));
    }

    #[test]
    fn test_handle_input_drag_via_surface() {
        let (mut editor, _, _) = editor_with_light();
        editor
            .surface_mut()
            .set_plot_rect(Rect::from_min_size(Pos2::ZERO, Vec2::new(600.0, 400.0)));

        // Key 1 sits at (10, 5): 100px right, 100px down from the top
        editor.handle_input(PointerInput::Down { pos: Pos2::new(100.0, 100.0), button: PointerButton::Primary });
        editor.handle_input(PointerInput::Move { pos: Pos2::new(120.0, 100.0) });
        assert!(matches!(editor.controller().session().state, EditState::DraggingKey { .. }));

        let outcomes = editor.handle_input(PointerInput::Up { pos: Pos2::new(120.0, 100.0), button: PointerButton::Primary });
        assert!(outcomes.iter().any(|o| matches!(o, EditOutcome::Commit(_))));
        let frame = editor.selected_track().and_then(|t| t.key(1)).map(|k| k.frame).unwrap();
        assert!((frame - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_close_resets_object() {
        let (mut editor, light, _) = editor_with_light();
        editor.handle_event(ChartEvent::DoubleClick { point_index: Some(1), position: ChartPoint::new(10.0, 0.0) });
        editor.close();
        assert_eq!(editor.current_frame(), 0.0);
        assert_eq!(
            editor.animatable(light).and_then(|o| o.property("intensity")),
            Some(KeyValue::Float(0.0))
        );
        assert!(editor.surface().is_destroyed());
    }
}
