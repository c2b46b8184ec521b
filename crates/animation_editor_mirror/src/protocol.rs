// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket protocol between the editor and the mirror.
//!
//! Messages are JSON objects, one per line, tagged by `event`.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Typings and compiler configuration of the open project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectTypings {
    /// `tsconfig.json` content
    pub tsconfig: String,
    /// Engine typings
    pub babylonjs: String,
    /// Materials library typings
    pub babylonjs_materials: String,
    /// Editor tools typings
    pub tools: String,
    /// Mobile helpers typings
    pub mobile: String,
    /// Path finder typings
    #[serde(rename = "pathFinder")]
    pub path_finder: String,
}

/// A behavior script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCode {
    /// Script ID in the editor
    pub id: String,
    /// Script name, used as file name
    pub name: String,
    /// TypeScript source
    pub code: String,
}

/// A custom material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCode {
    /// Material ID in the editor
    pub id: String,
    /// Material name, used as folder and file name
    pub name: String,
    /// TypeScript source
    pub code: String,
    /// Fragment shader
    pub pixel: String,
    /// Vertex shader
    pub vertex: String,
    /// JSON configuration
    pub config: String,
}

/// A custom post-process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessCode {
    /// Post-process ID in the editor
    pub id: String,
    /// Post-process name, used as folder and file name
    pub name: String,
    /// TypeScript source
    pub code: String,
    /// Fragment shader
    pub pixel: String,
    /// JSON configuration
    pub config: String,
}

/// A single item or a full list.
///
/// A full list replaces everything previously mirrored for its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Complete set
    Many(Vec<T>),
    /// One updated item
    One(T),
}

impl<T> OneOrMany<T> {
    /// Whether this is a complete set
    pub fn is_full_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Items as a vector
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Events sent by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Project typings
    Project(ProjectTypings),
    /// Behavior scripts
    BehaviorCodes(OneOrMany<BehaviorCode>),
    /// Material sources
    MaterialCodes(OneOrMany<MaterialCode>),
    /// Post-process sources
    PostProcessCodes(OneOrMany<PostProcessCode>),
    /// The editor is going away
    Disconnect,
}

/// Changed source sent back to the editor.
///
/// Only the field that changed on disk is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeUpdate {
    /// Item ID in the editor
    pub id: String,
    /// Item name
    pub name: String,
    /// TypeScript source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Fragment shader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel: Option<String>,
    /// Vertex shader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<String>,
    /// JSON configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

/// Messages sent to the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// A behavior script changed
    UpdateBehaviorCode(CodeUpdate),
    /// A material source changed
    UpdateMaterialCode(CodeUpdate),
    /// A post-process source changed
    UpdatePostProcessCode(CodeUpdate),
}

/// Encode a message as one JSON line
pub fn encode(message: &ClientMessage) -> Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one JSON line
pub fn decode(line: &str) -> Result<ServerEvent> {
    Ok(serde_json::from_str(line.trim())?)
}
