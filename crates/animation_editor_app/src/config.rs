// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON. A missing file is not an error: defaults are used.

use animation_editor_curves::{ChartConfig, SyncType, MAX_HISTORY};
use animation_editor_mirror::MirrorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "animation_editor.ron";
/// Environment variable overriding the configuration path
pub const CONFIG_ENV: &str = "ANIMATION_EDITOR_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Configuration could not be serialized
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Chart axes and interaction
    pub chart: ChartConfig,
    /// Maximum undo depth
    pub history_depth: usize,
    /// Sync type selected on startup
    pub default_sync_type: SyncType,
    /// Temp-folder mirror
    pub mirror: MirrorConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            chart: ChartConfig::default(),
            history_depth: MAX_HISTORY,
            default_sync_type: SyncType::Animation,
            mirror: MirrorConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Configuration path: explicit path, then the environment, then the default file
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = ron::from_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
