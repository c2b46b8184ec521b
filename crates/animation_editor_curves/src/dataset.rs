// SPDX-License-Identifier: MIT OR Apache-2.0
//! Projection of keyframe tracks into chart series.
//!
//! A track is charted as one series per scalar component. Point `i` of
//! every series belongs to key `i` of the track, so the series of one
//! track always have the same length and share their x coordinates.

use crate::keyframe::DataType;
use crate::track::{FrameRange, KeyframeTrack};
use serde::{Deserialize, Serialize};

/// A point on the chart (frame, value)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Frame
    pub x: f32,
    /// Component value
    pub y: f32,
}

impl ChartPoint {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Drawing options shared by every series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    /// Fill the area below the line
    pub fill: bool,
    /// Draw lines between points
    pub show_line: bool,
    /// Point radius in pixels
    pub point_radius: f32,
    /// Hit radius in pixels
    pub point_hit_radius: f32,
    /// Line width in pixels
    pub border_width: f32,
    /// Bezier tension (0 = straight segments)
    pub line_tension: f32,
    /// Point outline color
    pub point_border_color: [u8; 3],
}

impl Default for SeriesStyle {
    fn default() -> Self {
        Self {
            fill: false,
            show_line: true,
            point_radius: 10.0,
            point_hit_radius: 10.0,
            border_width: 1.0,
            line_tension: 0.0,
            point_border_color: [0, 0, 0],
        }
    }
}

/// One chart line, holding a single scalar component of a track
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    /// Component label (e.g. `x`, `r`) or target property for float tracks
    pub label: String,
    /// Line color
    pub color: [u8; 3],
    /// Points ordered like the track keys
    pub points: Vec<ChartPoint>,
    /// Drawing options
    pub style: SeriesStyle,
}

impl ChartSeries {
    /// Empty series shown when no track is selected
    pub fn placeholder() -> Self {
        Self {
            label: String::new(),
            color: [0, 0, 0],
            points: Vec::new(),
            style: SeriesStyle::default(),
        }
    }
}

/// Converts tracks to chart series
pub struct DatasetProjector;

impl DatasetProjector {
    /// Project a track into one series per component.
    ///
    /// `None` yields a single empty placeholder series.
    pub fn project(track: Option<&KeyframeTrack>) -> Vec<ChartSeries> {
        let Some(track) = track else {
            return vec![ChartSeries::placeholder()];
        };

        let data_type = track.data_type();
        data_type
            .components()
            .iter()
            .enumerate()
            .map(|(index, component)| {
                let label = if data_type == DataType::Float {
                    track.target_property.clone()
                } else {
                    component.label().to_string()
                };

                ChartSeries {
                    label,
                    color: component.color(),
                    points: track
                        .keys()
                        .iter()
                        .map(|k| ChartPoint::new(k.frame, k.value.get(index).unwrap_or_default()))
                        .collect(),
                    style: SeriesStyle::default(),
                }
            })
            .collect()
    }

    /// Frame range of a track
    pub fn range(track: &KeyframeTrack) -> FrameRange {
        track.range()
    }

    /// Patch one key's coordinates in place.
    ///
    /// The frame is written into every component series so the key stays
    /// aligned; the value only into the series at `series_index`.
    pub fn patch_point(
        series: &mut [ChartSeries],
        data_type: DataType,
        series_index: usize,
        point_index: usize,
        point: ChartPoint,
    ) {
        for s in series.iter_mut().take(data_type.component_count()) {
            if let Some(p) = s.points.get_mut(point_index) {
                p.x = point.x;
            }
        }

        if let Some(p) = series
            .get_mut(series_index)
            .and_then(|s| s.points.get_mut(point_index))
        {
            p.y = point.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::{Key, KeyValue};
    use proptest::prelude::*;

    fn sample_value(data_type: DataType, v: f32) -> KeyValue {
        KeyValue::uniform(data_type, v)
    }

    #[test]
    fn test_float_series_uses_target_property() {
        let track = KeyframeTrack::new("Fade", "alpha", DataType::Float, 60.0)
            .with_keys([Key::new(0.0, KeyValue::Float(0.0)), Key::new(30.0, KeyValue::Float(1.0))])
            .unwrap();
        let series = DatasetProjector::project(Some(&track));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "alpha");
        assert_eq!(series[0].points, vec![ChartPoint::new(0.0, 0.0), ChartPoint::new(30.0, 1.0)]);
    }

    #[test]
    fn test_vector_series_order() {
        let track = KeyframeTrack::new("Move", "position", DataType::Vector3, 60.0)
            .with_keys([Key::new(5.0, KeyValue::Vector3([1.0, 2.0, 3.0]))])
            .unwrap();
        let series = DatasetProjector::project(Some(&track));
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["x", "y", "z"]);
        assert_eq!(series[2].points[0], ChartPoint::new(5.0, 3.0));
        assert_eq!(series[0].color, [255, 0, 0]);
    }

    #[test]
    fn test_color4_alpha_series() {
        let track = KeyframeTrack::new("Tint", "diffuse", DataType::Color4, 60.0)
            .with_keys([Key::new(0.0, KeyValue::Color4([0.1, 0.2, 0.3, 0.4]))])
            .unwrap();
        let series = DatasetProjector::project(Some(&track));
        assert_eq!(series[3].label, "a");
        assert_eq!(series[3].color, [0, 0, 0]);
        assert_eq!(series[3].points[0].y, 0.4);
    }

    #[test]
    fn test_placeholder_without_track() {
        let series = DatasetProjector::project(None);
        assert_eq!(series.len(), 1);
        assert!(series[0].points.is_empty());
    }

    #[test]
    fn test_patch_point_aligns_frames() {
        let track = KeyframeTrack::new("Move", "position", DataType::Vector2, 60.0)
            .with_keys([
                Key::new(0.0, KeyValue::Vector2([0.0, 0.0])),
                Key::new(10.0, KeyValue::Vector2([1.0, 1.0])),
            ])
            .unwrap();
        let mut series = DatasetProjector::project(Some(&track));
        DatasetProjector::patch_point(&mut series, DataType::Vector2, 1, 1, ChartPoint::new(12.0, 4.0));

        assert_eq!(series[0].points[1], ChartPoint::new(12.0, 1.0));
        assert_eq!(series[1].points[1], ChartPoint::new(12.0, 4.0));
    }

    proptest! {
        #[test]
        fn prop_series_count_matches_components(
            type_index in 0usize..5,
            frames in prop::collection::vec(0.0f32..500.0, 0..16),
        ) {
            let data_type = DataType::all()[type_index];
            let track = KeyframeTrack::new("Track", "prop", data_type, 60.0)
                .with_keys(frames.iter().map(|&f| Key::new(f, sample_value(data_type, f))))
                .unwrap();
            let series = DatasetProjector::project(Some(&track));

            let expected = match data_type {
                DataType::Float => 1,
                DataType::Vector2 => 2,
                DataType::Vector3 | DataType::Color3 => 3,
                DataType::Color4 => 4,
            };
            prop_assert_eq!(series.len(), expected);
            for s in &series {
                prop_assert_eq!(s.points.len(), track.len());
            }
        }

        #[test]
        fn prop_range_bounds_every_key(frames in prop::collection::vec(0.0f32..1000.0, 0..32)) {
            let track = KeyframeTrack::new("Track", "prop", DataType::Float, 60.0)
                .with_keys(frames.iter().map(|&f| Key::new(f, KeyValue::Float(f))))
                .unwrap();
            let range = DatasetProjector::range(&track);

            if frames.is_empty() {
                prop_assert!(range.min_frame > range.max_frame);
            } else {
                for key in track.keys() {
                    prop_assert!(range.min_frame <= key.frame && key.frame <= range.max_frame);
                }
            }
        }
    }
}
