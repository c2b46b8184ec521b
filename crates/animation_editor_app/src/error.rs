// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application errors.

use crate::config::ConfigError;
use animation_editor_curves::TrackError;
use animation_editor_mirror::MirrorError;
use thiserror::Error;

/// Errors surfaced by the command line
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Track file error
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    /// Mirror error
    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
