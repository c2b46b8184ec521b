// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve editor UI rendering.
//!
//! Features:
//! - Chart with one line per key component
//! - Time cursor with value tag
//! - Context menu to add and remove keys
//! - Toolbar with playback, sync type and history controls

use crate::animatable::{Animatable, AnimatableId};
use crate::controller::{ChartEvent, EditOutcome, EditorKey};
use crate::dataset::ChartPoint;
use crate::editor::AnimationEditor;
use crate::playback::SyncType;
use crate::surface::{PointerButton, PointerInput};
use crate::track::TrackId;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::time::Duration;

const AXIS_MARGIN_LEFT: f32 = 40.0;
const AXIS_MARGIN_BOTTOM: f32 = 20.0;
const GRID_LINES: usize = 10;
const TIME_CURSOR_COLOR: Color32 = Color32::from_rgb(255, 100, 100);

fn color(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Chart widget drawing the selected track
#[derive(Debug, Default)]
pub struct CurveChartView {
    pressed_inside: bool,
    context_target: Option<(ChartPoint, Option<usize>)>,
}

impl CurveChartView {
    /// Create a new chart view
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the chart and feed its input to the editor
    pub fn show<A: Animatable + 'static>(
        &mut self,
        ui: &mut egui::Ui,
        editor: &mut AnimationEditor<A>,
    ) -> Vec<EditOutcome> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let plot = Rect::from_min_max(
            Pos2::new(rect.min.x + AXIS_MARGIN_LEFT, rect.min.y),
            Pos2::new(rect.max.x, rect.max.y - AXIS_MARGIN_BOTTOM),
        );
        editor.surface_mut().set_plot_rect(plot);

        let mut outcomes = Vec::new();
        for input in self.collect_input(ui, &response) {
            outcomes.extend(editor.handle_input(input));
        }

        for outcome in &outcomes {
            if let EditOutcome::ContextMenu { position, point_index } = outcome {
                self.context_target = Some((*position, *point_index));
            }
        }

        self.paint(&painter, rect, editor);

        let target = self.context_target;
        response.context_menu(|ui| {
            let Some((position, point_index)) = target else {
                ui.close_menu();
                return;
            };

            if ui.button("Add Key (frame)").clicked() {
                outcomes.push(editor.handle_event(ChartEvent::ContextAddKey { position, interpolate: true }));
                ui.close_menu();
            }
            if ui.button("Add Key (frame & value)").clicked() {
                outcomes.push(editor.handle_event(ChartEvent::ContextAddKey { position, interpolate: false }));
                ui.close_menu();
            }
            if let Some(point_index) = point_index {
                ui.separator();
                if ui.button("Remove Key").clicked() {
                    outcomes.push(editor.handle_event(ChartEvent::ContextRemoveKey { point_index }));
                    ui.close_menu();
                }
            }
        });

        if outcomes.iter().any(|o| *o != EditOutcome::Unchanged) {
            ui.ctx().request_repaint();
        }
        outcomes
    }

    /// Translate egui input into pointer input
    fn collect_input(&mut self, ui: &egui::Ui, response: &egui::Response) -> Vec<PointerInput> {
        let hovered = response.hovered();
        let pressed_inside = &mut self.pressed_inside;

        ui.input(|i| {
            let mut inputs = Vec::new();
            let Some(pos) = i.pointer.interact_pos() else {
                return inputs;
            };

            if hovered && i.pointer.primary_pressed() {
                *pressed_inside = true;
                inputs.push(PointerInput::Down { pos, button: PointerButton::Primary });
            }

            if (hovered || *pressed_inside) && i.pointer.delta() != Vec2::ZERO {
                inputs.push(PointerInput::Move { pos });
            }

            if *pressed_inside && i.pointer.primary_released() {
                *pressed_inside = false;
                inputs.push(PointerInput::Up { pos, button: PointerButton::Primary });
            }

            if hovered && i.pointer.secondary_released() {
                inputs.push(PointerInput::Up { pos, button: PointerButton::Secondary });
            }

            if response.double_clicked() {
                inputs.push(PointerInput::DoubleClick { pos });
            }

            if hovered && i.smooth_scroll_delta.y != 0.0 {
                inputs.push(PointerInput::Scroll { pos, delta: i.smooth_scroll_delta.y });
            }

            if i.key_pressed(egui::Key::Space) {
                inputs.push(PointerInput::Key { key: EditorKey::Space, pressed: true });
            }
            if i.key_released(egui::Key::Space) {
                inputs.push(PointerInput::Key { key: EditorKey::Space, pressed: false });
            }

            inputs
        })
    }

    fn paint<A: Animatable + 'static>(&self, painter: &egui::Painter, rect: Rect, editor: &AnimationEditor<A>) {
        let surface = editor.surface();
        let plot = surface.plot_rect();

        painter.rect_filled(rect, 0.0, Color32::from_gray(30));
        painter.rect_filled(plot, 0.0, Color32::from_gray(235));

        // Grid and axis labels
        let x_axis = surface.x_axis();
        let y_axis = surface.y_axis();
        for step in 0..=GRID_LINES {
            let t = step as f32 / GRID_LINES as f32;

            let frame = x_axis.min + x_axis.span() * t;
            let x = surface.value_to_pixel(ChartPoint::new(frame, y_axis.min)).x;
            painter.line_segment(
                [Pos2::new(x, plot.min.y), Pos2::new(x, plot.max.y)],
                Stroke::new(1.0, Color32::from_gray(210)),
            );
            painter.text(
                Pos2::new(x, plot.max.y + 2.0),
                egui::Align2::CENTER_TOP,
                format!("{frame:.0}"),
                egui::FontId::monospace(10.0),
                Color32::from_gray(180),
            );

            let value = y_axis.min + y_axis.span() * t;
            let y = surface.value_to_pixel(ChartPoint::new(x_axis.min, value)).y;
            painter.line_segment(
                [Pos2::new(plot.min.x, y), Pos2::new(plot.max.x, y)],
                Stroke::new(1.0, Color32::from_gray(210)),
            );
            painter.text(
                Pos2::new(plot.min.x - 4.0, y),
                egui::Align2::RIGHT_CENTER,
                format!("{value:.1}"),
                egui::FontId::monospace(10.0),
                Color32::from_gray(180),
            );
        }

        // Series
        let inspected = editor.controller().session().inspected_key;
        for series in editor.series() {
            let line_color = color(series.color);
            let points: Vec<Pos2> = series.points.iter().map(|p| surface.value_to_pixel(*p)).collect();

            if series.style.show_line && points.len() > 1 {
                painter.add(egui::Shape::line(points.clone(), Stroke::new(series.style.border_width, line_color)));
            }

            for (index, pos) in points.iter().enumerate() {
                if !plot.expand(series.style.point_radius).contains(*pos) {
                    continue;
                }
                let fill = if inspected == Some(index) { Color32::YELLOW } else { line_color };
                painter.circle(
                    *pos,
                    series.style.point_radius * 0.5,
                    fill,
                    Stroke::new(1.0, color(series.style.point_border_color)),
                );
            }
        }

        // Time cursor
        let frame = editor.current_frame();
        let x = surface.value_to_pixel(ChartPoint::new(frame, y_axis.min)).x;
        if x >= plot.min.x && x <= plot.max.x {
            let width = if surface.is_time_cursor_hovered() { 3.0 } else { 2.0 };
            painter.line_segment(
                [Pos2::new(x, plot.min.y), Pos2::new(x, plot.max.y)],
                Stroke::new(width, TIME_CURSOR_COLOR),
            );
            painter.text(
                Pos2::new(x + 4.0, plot.min.y + 4.0),
                egui::Align2::LEFT_TOP,
                format!("{frame:.1}"),
                egui::FontId::monospace(11.0),
                TIME_CURSOR_COLOR,
            );
        }

        // Hover tag
        if let Some(pos) = surface.hover_pos().filter(|p| plot.contains(*p)) {
            let point = surface.pixel_to_value(pos);
            painter.text(
                pos + Vec2::new(8.0, -8.0),
                egui::Align2::LEFT_BOTTOM,
                format!("{:.1}, {:.2}", point.x, point.y),
                egui::FontId::monospace(10.0),
                Color32::from_gray(60),
            );
        }
    }
}

/// Animation editor panel: toolbar, selectors, chart and key inspector
#[derive(Debug, Default)]
pub struct AnimationEditorPanel {
    chart: CurveChartView,
}

impl AnimationEditorPanel {
    /// Create a new panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the full panel
    pub fn ui<A: Animatable + 'static>(&mut self, ui: &mut egui::Ui, editor: &mut AnimationEditor<A>) {
        if editor.is_playing() {
            let dt = ui.input(|i| i.stable_dt);
            editor.tick(Duration::from_secs_f32(dt.max(0.0)));
            ui.ctx().request_repaint_after(editor.bridge().tick_interval);
        }

        self.render_toolbar(ui, editor);
        ui.separator();
        self.render_selectors(ui, editor);
        self.render_inspector(ui, editor);
        ui.separator();

        for outcome in self.chart.show(ui, editor) {
            tracing::trace!("Chart outcome: {outcome:?}");
        }
    }

    fn render_toolbar<A: Animatable + 'static>(&mut self, ui: &mut egui::Ui, editor: &mut AnimationEditor<A>) {
        ui.horizontal(|ui| {
            if editor.is_playing() {
                if ui.button("Stop").clicked() {
                    editor.stop();
                }
            } else if ui.button("Play").clicked() {
                editor.play();
            }

            if ui.button("Add Key").on_hover_text("Key the current values at the time cursor").clicked() {
                editor.add_key_at_cursor();
            }

            ui.separator();

            let mut sync_type = editor.sync_type();
            egui::ComboBox::from_label("Sync")
                .selected_text(sync_type.name())
                .show_ui(ui, |ui| {
                    for candidate in SyncType::all() {
                        ui.selectable_value(&mut sync_type, *candidate, candidate.name());
                    }
                });
            if sync_type != editor.sync_type() {
                editor.set_sync_type(sync_type);
            }

            ui.separator();

            let undo_hint = editor.history().undo_description().unwrap_or("Nothing to undo").to_string();
            if ui
                .add_enabled(editor.history().can_undo(), egui::Button::new("Undo"))
                .on_hover_text(undo_hint)
                .clicked()
            {
                if let Err(e) = editor.undo() {
                    tracing::warn!("Undo failed: {e}");
                }
            }
            if ui.add_enabled(editor.history().can_redo(), egui::Button::new("Redo")).clicked() {
                if let Err(e) = editor.redo() {
                    tracing::warn!("Redo failed: {e}");
                }
            }

            if ui.button("Reset Zoom").clicked() {
                editor.surface_mut().reset_zoom();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.monospace(format!("Frame {:.1}", editor.current_frame()));
            });
        });
    }

    fn render_selectors<A: Animatable + 'static>(&mut self, ui: &mut egui::Ui, editor: &mut AnimationEditor<A>) {
        let objects: Vec<(AnimatableId, String)> = editor
            .animatables()
            .map(|o| (o.id(), o.name().to_string()))
            .collect();
        let tracks: Vec<(TrackId, String)> = editor
            .selected_animatable()
            .map(|o| {
                o.track_ids()
                    .into_iter()
                    .filter_map(|id| o.track(id).map(|t| (id, t.name.clone())))
                    .collect()
            })
            .unwrap_or_default();

        ui.horizontal(|ui| {
            let mut selected = editor.selected_animatable_id();
            let selected_name = objects
                .iter()
                .find(|(id, _)| Some(*id) == selected)
                .map_or("None", |(_, name)| name.as_str());
            egui::ComboBox::from_label("Object")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    for (id, name) in &objects {
                        ui.selectable_value(&mut selected, Some(*id), name.as_str());
                    }
                });
            if selected != editor.selected_animatable_id() {
                editor.select_animatable(selected);
            }

            let mut track = editor.selected_track().map(|t| t.id);
            let track_name = editor.selected_track().map_or("None", |t| t.name.as_str()).to_string();
            egui::ComboBox::from_label("Animation")
                .selected_text(track_name)
                .show_ui(ui, |ui| {
                    for (id, name) in &tracks {
                        ui.selectable_value(&mut track, Some(*id), name.as_str());
                    }
                });
            if track != editor.selected_track().map(|t| t.id) {
                editor.select_track(track);
            }
        });
    }

    fn render_inspector<A: Animatable + 'static>(&mut self, ui: &mut egui::Ui, editor: &AnimationEditor<A>) {
        let Some(index) = editor.controller().session().inspected_key else {
            return;
        };
        if let Some(key) = editor.selected_track().and_then(|t| t.key(index)) {
            ui.label(format!("Key {index}: frame {:.2}, value {:?}", key.frame, key.value));
        }
    }
}
