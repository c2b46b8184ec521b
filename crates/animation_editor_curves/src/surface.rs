// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chart surface: axes, pan/zoom, hit testing and pointer interpretation.
//!
//! The surface turns raw pointer input into [`ChartEvent`]s. It knows
//! nothing about tracks; the controller applies the events.

use crate::controller::{ChartEvent, EditorKey};
use crate::dataset::{ChartPoint, ChartSeries};
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance in pixels within which the pointer grabs the time cursor
const TIME_CURSOR_GRAB: f32 = 4.0;
/// Pointer travel in pixels before a press on a point becomes a drag
const DRAG_THRESHOLD: f32 = 3.0;
/// Smallest axis span reachable by zooming
const MIN_SPAN: f32 = 1e-3;

/// Chart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Initial frame axis range
    pub x_range: [f32; 2],
    /// Initial value axis range
    pub y_range: [f32; 2],
    /// Point radius in pixels
    pub point_radius: f32,
    /// Point hit radius in pixels
    pub point_hit_radius: f32,
    /// Zoom factor per scroll unit
    pub zoom_speed: f32,
    /// Playback tick interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            x_range: [0.0, 60.0],
            y_range: [-10.0, 10.0],
            point_radius: 10.0,
            point_hit_radius: 10.0,
            zoom_speed: 0.001,
            tick_interval_ms: 16,
        }
    }
}

/// Surface errors
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface was already torn down
    #[error("chart surface already destroyed")]
    Detached,
}

/// Value range of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl AxisRange {
    /// Create a new range
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the range
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    fn zoom_around(&mut self, anchor: f32, factor: f32) {
        let span = (self.span() * factor).max(MIN_SPAN);
        let t = if self.span().abs() > f32::EPSILON {
            (anchor - self.min) / self.span()
        } else {
            0.5
        };
        self.min = anchor - span * t;
        self.max = self.min + span;
    }
}

/// Axes affected by a zoom gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomMode {
    /// Frame axis only
    X,
    /// Value axis only
    Y,
    /// Both axes
    XY,
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button
    Primary,
    /// Right button
    Secondary,
    /// Wheel button
    Middle,
}

/// Raw input delivered by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Button pressed
    Down {
        /// Pointer position in pixels
        pos: Pos2,
        /// Button
        button: PointerButton,
    },
    /// Pointer moved
    Move {
        /// Pointer position in pixels
        pos: Pos2,
    },
    /// Button released
    Up {
        /// Pointer position in pixels
        pos: Pos2,
        /// Button
        button: PointerButton,
    },
    /// Double click
    DoubleClick {
        /// Pointer position in pixels
        pos: Pos2,
    },
    /// Scroll wheel
    Scroll {
        /// Pointer position in pixels
        pos: Pos2,
        /// Scroll amount, positive zooms in
        delta: f32,
    },
    /// Keyboard key state change
    Key {
        /// Key
        key: EditorKey,
        /// Pressed or released
        pressed: bool,
    },
}

/// A point grabbed by the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    series_index: usize,
    point_index: usize,
    press: Pos2,
    dragging: bool,
}

/// Pan gesture origin
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanOrigin {
    press: Pos2,
    x: AxisRange,
    y: AxisRange,
}

/// Interactive chart surface
#[derive(Debug)]
pub struct ChartSurface {
    config: ChartConfig,
    plot: Rect,
    x_axis: AxisRange,
    y_axis: AxisRange,
    grab: Option<Grab>,
    pan: Option<PanOrigin>,
    cursor_hovered: bool,
    hover: Option<Pos2>,
    destroyed: bool,
}

impl ChartSurface {
    /// Create a surface with the configured axis ranges
    pub fn new(config: ChartConfig) -> Self {
        Self {
            x_axis: AxisRange::new(config.x_range[0], config.x_range[1]),
            y_axis: AxisRange::new(config.y_range[0], config.y_range[1]),
            config,
            plot: Rect::from_min_size(Pos2::ZERO, Vec2::new(600.0, 400.0)),
            grab: None,
            pan: None,
            cursor_hovered: false,
            hover: None,
            destroyed: false,
        }
    }

    /// Chart configuration
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Plot area in pixels
    pub fn plot_rect(&self) -> Rect {
        self.plot
    }

    /// Set the plot area (called by the renderer on layout)
    pub fn set_plot_rect(&mut self, rect: Rect) {
        self.plot = rect;
    }

    /// Frame axis range
    pub fn x_axis(&self) -> AxisRange {
        self.x_axis
    }

    /// Value axis range
    pub fn y_axis(&self) -> AxisRange {
        self.y_axis
    }

    /// Last hovered position
    pub fn hover_pos(&self) -> Option<Pos2> {
        self.hover
    }

    /// Whether the pointer is over the time cursor
    pub fn is_time_cursor_hovered(&self) -> bool {
        self.cursor_hovered
    }

    /// Convert a chart point to pixels
    pub fn value_to_pixel(&self, point: ChartPoint) -> Pos2 {
        let tx = (point.x - self.x_axis.min) / self.x_axis.span();
        let ty = (point.y - self.y_axis.min) / self.y_axis.span();
        Pos2::new(
            self.plot.left() + tx * self.plot.width(),
            self.plot.bottom() - ty * self.plot.height(),
        )
    }

    /// Convert pixels to a chart point
    pub fn pixel_to_value(&self, pos: Pos2) -> ChartPoint {
        let tx = (pos.x - self.plot.left()) / self.plot.width();
        let ty = (self.plot.bottom() - pos.y) / self.plot.height();
        ChartPoint::new(
            self.x_axis.min + tx * self.x_axis.span(),
            self.y_axis.min + ty * self.y_axis.span(),
        )
    }

    /// Nearest point within the hit radius, as `(series_index, point_index)`
    pub fn hit_test(&self, series: &[ChartSeries], pos: Pos2) -> Option<(usize, usize)> {
        let radius = self.config.point_hit_radius;
        series
            .iter()
            .enumerate()
            .flat_map(|(si, s)| {
                s.points
                    .iter()
                    .enumerate()
                    .map(move |(pi, p)| (si, pi, *p))
            })
            .map(|(si, pi, p)| (si, pi, self.value_to_pixel(p).distance(pos)))
            .filter(|(_, _, d)| *d <= radius)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(si, pi, _)| (si, pi))
    }

    /// Axes a zoom at `pos` applies to
    pub fn zoom_mode(&self, pos: Pos2) -> ZoomMode {
        if pos.x <= self.plot.left() {
            ZoomMode::Y
        } else if pos.y >= self.plot.bottom() {
            ZoomMode::X
        } else {
            ZoomMode::XY
        }
    }

    /// Zoom around `pos` by `factor` (< 1 zooms in)
    pub fn zoom_at(&mut self, pos: Pos2, factor: f32) {
        let anchor = self.pixel_to_value(pos);
        match self.zoom_mode(pos) {
            ZoomMode::X => self.x_axis.zoom_around(anchor.x, factor),
            ZoomMode::Y => self.y_axis.zoom_around(anchor.y, factor),
            ZoomMode::XY => {
                self.x_axis.zoom_around(anchor.x, factor);
                self.y_axis.zoom_around(anchor.y, factor);
            }
        }
    }

    /// Restore the configured axis ranges
    pub fn reset_zoom(&mut self) {
        self.x_axis = AxisRange::new(self.config.x_range[0], self.config.x_range[1]);
        self.y_axis = AxisRange::new(self.config.y_range[0], self.config.y_range[1]);
    }

    fn is_over_time_cursor(&self, pos: Pos2, cursor_frame: f32) -> bool {
        let x = self.value_to_pixel(ChartPoint::new(cursor_frame, 0.0)).x;
        (x - pos.x).abs() <= TIME_CURSOR_GRAB
            && pos.y >= self.plot.top()
            && pos.y <= self.plot.bottom()
    }

    /// Translate pointer input into chart events.
    ///
    /// Panning is applied here directly unless `pan_suspended` is set.
    pub fn interpret(
        &mut self,
        input: PointerInput,
        series: &[ChartSeries],
        cursor_frame: f32,
        pan_suspended: bool,
    ) -> Vec<ChartEvent> {
        let mut events = Vec::new();

        match input {
            PointerInput::Down { pos, button: PointerButton::Primary } => {
                if let Some((series_index, point_index)) = self.hit_test(series, pos) {
                    self.grab = Some(Grab { series_index, point_index, press: pos, dragging: false });
                } else if !pan_suspended && !self.cursor_hovered {
                    self.pan = Some(PanOrigin { press: pos, x: self.x_axis, y: self.y_axis });
                }
                events.push(ChartEvent::PointerDown);
            }
            PointerInput::Down { .. } => {}
            PointerInput::Move { pos } => {
                self.hover = Some(pos);

                let over = self.is_over_time_cursor(pos, cursor_frame);
                if over != self.cursor_hovered {
                    self.cursor_hovered = over;
                    events.push(ChartEvent::TimeCursorHover(over));
                }

                let point = self.pixel_to_value(pos);
                if let Some(grab) = self.grab.as_mut() {
                    if !grab.dragging && grab.press.distance(pos) >= DRAG_THRESHOLD {
                        grab.dragging = true;
                        events.push(ChartEvent::DragStart {
                            series_index: grab.series_index,
                            point_index: grab.point_index,
                        });
                    }
                    if grab.dragging {
                        events.push(ChartEvent::Drag {
                            series_index: grab.series_index,
                            point_index: grab.point_index,
                            point,
                        });
                    }
                } else if let Some(origin) = self.pan {
                    if pan_suspended {
                        self.pan = None;
                    } else {
                        let dx = (pos.x - origin.press.x) / self.plot.width() * origin.x.span();
                        let dy = (pos.y - origin.press.y) / self.plot.height() * origin.y.span();
                        self.x_axis = AxisRange::new(origin.x.min - dx, origin.x.max - dx);
                        self.y_axis = AxisRange::new(origin.y.min + dy, origin.y.max + dy);
                    }
                }

                events.push(ChartEvent::PointerMove { position: point });
            }
            PointerInput::Up { pos, button } => {
                self.pan = None;
                let point = self.pixel_to_value(pos);

                if button == PointerButton::Primary {
                    if let Some(grab) = self.grab.take() {
                        if grab.dragging {
                            events.push(ChartEvent::DragEnd {
                                series_index: grab.series_index,
                                point_index: grab.point_index,
                                point,
                            });
                        } else {
                            events.push(ChartEvent::Click { point_index: grab.point_index });
                        }
                    }
                }

                events.push(ChartEvent::PointerUp);

                if button == PointerButton::Secondary {
                    events.push(ChartEvent::ContextMenu {
                        position: point,
                        point_index: self.hit_test(series, pos).map(|(_, pi)| pi),
                    });
                }
            }
            PointerInput::DoubleClick { pos } => {
                events.push(ChartEvent::DoubleClick {
                    point_index: self.hit_test(series, pos).map(|(_, pi)| pi),
                    position: self.pixel_to_value(pos),
                });
            }
            PointerInput::Scroll { pos, delta } => {
                let factor = (1.0 - delta * self.config.zoom_speed).clamp(0.1, 10.0);
                self.zoom_at(pos, factor);
            }
            PointerInput::Key { key, pressed } => {
                events.push(ChartEvent::KeyPress { key, pressed });
            }
        }

        events
    }

    /// Tear down the surface
    pub fn try_destroy(&mut self) -> Result<(), SurfaceError> {
        if self.destroyed {
            return Err(SurfaceError::Detached);
        }
        self.destroyed = true;
        self.grab = None;
        self.pan = None;
        Ok(())
    }

    /// Tear down the surface, logging instead of failing
    pub fn destroy(&mut self) {
        if let Err(e) = self.try_destroy() {
            tracing::error!("[Animation Editor]: failed to destroy chart: {e}");
        }
    }

    /// Whether the surface was torn down
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Default for ChartSurface {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn surface() -> ChartSurface {
        let mut surface = ChartSurface::default();
        // 600x400 plot at the origin: 10px per frame, 20px per value unit
        surface.set_plot_rect(Rect::from_min_size(Pos2::ZERO, Vec2::new(600.0, 400.0)));
        surface
    }

    fn series(points: &[(f32, f32)]) -> Vec<ChartSeries> {
        let mut s = ChartSeries::placeholder();
        s.points = points.iter().map(|&(x, y)| ChartPoint::new(x, y)).collect();
        vec![s]
    }

    #[test]
    fn test_pixel_mapping_roundtrip() {
        let surface = surface();
        let pos = surface.value_to_pixel(ChartPoint::new(30.0, 0.0));
        assert_relative_eq!(pos.x, 300.0);
        assert_relative_eq!(pos.y, 200.0);

        let point = surface.pixel_to_value(Pos2::new(100.0, 100.0));
        assert_relative_eq!(point.x, 10.0);
        assert_relative_eq!(point.y, 5.0);
    }

    #[test]
    fn test_hit_test_picks_nearest() {
        let surface = surface();
        let s = series(&[(10.0, 0.0), (11.0, 0.0)]);
        assert_eq!(surface.hit_test(&s, Pos2::new(108.0, 200.0)), Some((0, 1)));
        assert_eq!(surface.hit_test(&s, Pos2::new(300.0, 200.0)), None);
    }

    #[test]
    fn test_press_and_move_emits_drag() {
        let mut surface = surface();
        let s = series(&[(10.0, 0.0)]);

        surface.interpret(PointerInput::Down { pos: Pos2::new(100.0, 200.0), button: PointerButton::Primary }, &s, 50.0, false);
        let events = surface.interpret(PointerInput::Move { pos: Pos2::new(100.0, 100.0) }, &s, 50.0, false);
        assert!(events.contains(&ChartEvent::DragStart { series_index: 0, point_index: 0 }));
        assert!(events.iter().any(|e| matches!(e, ChartEvent::Drag { point_index: 0, .. })));

        let events = surface.interpret(PointerInput::Up { pos: Pos2::new(100.0, 100.0), button: PointerButton::Primary }, &s, 50.0, false);
        assert!(matches!(events[0], ChartEvent::DragEnd { series_index: 0, point_index: 0, .. }));
    }

    #[test]
    fn test_press_release_without_move_is_click() {
        let mut surface = surface();
        let s = series(&[(10.0, 0.0)]);
        surface.interpret(PointerInput::Down { pos: Pos2::new(100.0, 200.0), button: PointerButton::Primary }, &s, 50.0, false);
        let events = surface.interpret(PointerInput::Up { pos: Pos2::new(100.0, 200.0), button: PointerButton::Primary }, &s, 50.0, false);
        assert_eq!(events[0], ChartEvent::Click { point_index: 0 });
    }

    #[test]
    fn test_pan_moves_axes() {
        let mut surface = surface();
        let s = series(&[]);
        surface.interpret(PointerInput::Down { pos: Pos2::new(300.0, 200.0), button: PointerButton::Primary }, &s, 50.0, false);
        surface.interpret(PointerInput::Move { pos: Pos2::new(200.0, 200.0) }, &s, 50.0, false);
        assert_relative_eq!(surface.x_axis().min, 10.0);
        assert_relative_eq!(surface.x_axis().max, 70.0);
    }

    #[test]
    fn test_pan_suspended() {
        let mut surface = surface();
        let s = series(&[]);
        surface.interpret(PointerInput::Down { pos: Pos2::new(300.0, 200.0), button: PointerButton::Primary }, &s, 50.0, true);
        surface.interpret(PointerInput::Move { pos: Pos2::new(200.0, 200.0) }, &s, 50.0, true);
        assert_eq!(surface.x_axis(), AxisRange::new(0.0, 60.0));
    }

    #[test]
    fn test_time_cursor_hover() {
        let mut surface = surface();
        let s = series(&[]);
        let events = surface.interpret(PointerInput::Move { pos: Pos2::new(201.0, 50.0) }, &s, 20.0, false);
        assert!(events.contains(&ChartEvent::TimeCursorHover(true)));
        assert!(surface.is_time_cursor_hovered());
    }

    #[test]
    fn test_zoom_mode_by_region() {
        let mut surface = surface();
        surface.set_plot_rect(Rect::from_min_max(Pos2::new(40.0, 0.0), Pos2::new(640.0, 380.0)));
        assert_eq!(surface.zoom_mode(Pos2::new(20.0, 100.0)), ZoomMode::Y);
        assert_eq!(surface.zoom_mode(Pos2::new(300.0, 390.0)), ZoomMode::X);
        assert_eq!(surface.zoom_mode(Pos2::new(300.0, 100.0)), ZoomMode::XY);
    }

    #[test]
    fn test_zoom_and_reset() {
        let mut surface = surface();
        surface.zoom_at(Pos2::new(300.0, 200.0), 0.5);
        assert_relative_eq!(surface.x_axis().span(), 30.0);
        assert_relative_eq!(surface.x_axis().min, 15.0);
        surface.reset_zoom();
        assert_eq!(surface.x_axis(), AxisRange::new(0.0, 60.0));
    }

    #[test]
    fn test_destroy_twice_is_logged_not_propagated() {
        let mut surface = surface();
        surface.destroy();
        assert!(surface.is_destroyed());
        surface.destroy();
        assert!(matches!(surface.try_destroy(), Err(SurfaceError::Detached)));
    }
}
