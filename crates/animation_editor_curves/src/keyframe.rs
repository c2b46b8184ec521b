// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe values and the per-datatype component table.
//!
//! Every animated property has a [`DataType`] that fixes how many scalar
//! components its values carry and in which order they are charted:
//!
//! | data type | components   |
//! |-----------|--------------|
//! | Float     | value        |
//! | Vector2   | x, y         |
//! | Vector3   | x, y, z      |
//! | Color3    | r, g, b      |
//! | Color4    | r, g, b, a   |

use serde::{Deserialize, Serialize};

/// Data type of an animated property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Single scalar
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// RGB color
    Color3,
    /// RGBA color
    Color4,
}

/// A single scalar component of a keyframe value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The value of a float track
    Value,
    /// Vector x
    X,
    /// Vector y
    Y,
    /// Vector z
    Z,
    /// Color red
    R,
    /// Color green
    G,
    /// Color blue
    B,
    /// Color alpha
    A,
}

const FLOAT_COMPONENTS: [Component; 1] = [Component::Value];
const VECTOR2_COMPONENTS: [Component; 2] = [Component::X, Component::Y];
const VECTOR3_COMPONENTS: [Component; 3] = [Component::X, Component::Y, Component::Z];
const COLOR3_COMPONENTS: [Component; 3] = [Component::R, Component::G, Component::B];
const COLOR4_COMPONENTS: [Component; 4] = [Component::R, Component::G, Component::B, Component::A];

impl Component {
    /// Get the series label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::R => "r",
            Self::G => "g",
            Self::B => "b",
            Self::A => "a",
        }
    }

    /// Get the series color
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::X | Self::R => [255, 0, 0],
            Self::Y | Self::G => [0, 255, 0],
            Self::Z | Self::B => [0, 0, 255],
            Self::Value | Self::A => [0, 0, 0],
        }
    }
}

impl DataType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Color3 => "Color3",
            Self::Color4 => "Color4",
        }
    }

    /// Get all data types
    pub fn all() -> &'static [DataType] {
        &[
            DataType::Float,
            DataType::Vector2,
            DataType::Vector3,
            DataType::Color3,
            DataType::Color4,
        ]
    }

    /// Components in chart order
    pub fn components(&self) -> &'static [Component] {
        match self {
            Self::Float => &FLOAT_COMPONENTS,
            Self::Vector2 => &VECTOR2_COMPONENTS,
            Self::Vector3 => &VECTOR3_COMPONENTS,
            Self::Color3 => &COLOR3_COMPONENTS,
            Self::Color4 => &COLOR4_COMPONENTS,
        }
    }

    /// Number of scalar components
    pub fn component_count(&self) -> usize {
        self.components().len()
    }

    /// Component at the given series index, if the index is valid
    pub fn component(&self, index: usize) -> Option<Component> {
        self.components().get(index).copied()
    }
}

/// Value stored in a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KeyValue {
    /// Float value
    Float(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// RGB color
    Color3([f32; 3]),
    /// RGBA color
    Color4([f32; 4]),
}

impl KeyValue {
    /// Data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float(_) => DataType::Float,
            Self::Vector2(_) => DataType::Vector2,
            Self::Vector3(_) => DataType::Vector3,
            Self::Color3(_) => DataType::Color3,
            Self::Color4(_) => DataType::Color4,
        }
    }

    /// Value of the given type with every component set to `value`
    pub fn uniform(data_type: DataType, value: f32) -> Self {
        match data_type {
            DataType::Float => Self::Float(value),
            DataType::Vector2 => Self::Vector2([value; 2]),
            DataType::Vector3 => Self::Vector3([value; 3]),
            DataType::Color3 => Self::Color3([value; 3]),
            DataType::Color4 => Self::Color4([value; 4]),
        }
    }

    fn components(&self) -> &[f32] {
        match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vector2(v) => v,
            Self::Vector3(v) | Self::Color3(v) => v,
            Self::Color4(v) => v,
        }
    }

    fn components_mut(&mut self) -> &mut [f32] {
        match self {
            Self::Float(v) => std::slice::from_mut(v),
            Self::Vector2(v) => v,
            Self::Vector3(v) | Self::Color3(v) => v,
            Self::Color4(v) => v,
        }
    }

    /// Get a component by series index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.components().get(index).copied()
    }

    /// Set a component by series index. Returns false if the index is out of range.
    pub fn set(&mut self, index: usize, value: f32) -> bool {
        match self.components_mut().get_mut(index) {
            Some(component) => {
                *component = value;
                true
            }
            None => false,
        }
    }

    /// Component-wise linear interpolation. Returns `None` for mismatched types.
    pub fn lerp(&self, other: &KeyValue, amount: f32) -> Option<KeyValue> {
        if self.data_type() != other.data_type() {
            return None;
        }

        let mut result = *self;
        for (out, (a, b)) in result
            .components_mut()
            .iter_mut()
            .zip(self.components().iter().zip(other.components()))
        {
            *out = Interpolation::lerp(*a, *b, amount);
        }
        Some(result)
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A keyframe on a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Frame of the key, never negative
    pub frame: f32,
    /// Value at this key
    pub value: KeyValue,
}

impl Key {
    /// Create a new key, clamping the frame to zero
    pub fn new(frame: f32, value: KeyValue) -> Self {
        Self {
            frame: frame.max(0.0),
            value,
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}
