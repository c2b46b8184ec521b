// SPDX-License-Identifier: MIT OR Apache-2.0
//! Temp-folder mirror for externally edited sources.
//!
//! The editor streams project typings, behavior scripts, materials and
//! post-processes over a socket. They are written to a temp folder that an
//! external IDE opens; saved files are sent back to the editor.

pub mod client;
pub mod error;
pub mod protocol;
pub mod temp_fs;
pub mod watcher;

pub use client::{MirrorClient, MirrorConfig};
pub use error::{MirrorError, Result};
pub use protocol::{
    BehaviorCode, ClientMessage, CodeUpdate, MaterialCode, OneOrMany, PostProcessCode,
    ProjectTypings, ServerEvent,
};
pub use temp_fs::{FileBinding, SourceField, SourceKind, TempFileSystem};
pub use watcher::{FileEvent, MirrorWatcher};
