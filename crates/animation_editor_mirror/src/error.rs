// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mirror errors.

use thiserror::Error;

/// Errors raised by the temp-folder mirror
#[derive(Debug, Error)]
pub enum MirrorError {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed protocol message
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// The editor closed the connection
    #[error("Connection closed by the editor")]
    ConnectionClosed,
}

/// Result type for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;
