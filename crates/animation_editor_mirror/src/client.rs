// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection to the editor.
//!
//! One task reads editor events line by line and applies them to the temp
//! folder; an interval polls the watcher and sends changed sources back.

use crate::error::{MirrorError, Result};
use crate::protocol::{self, ServerEvent};
use crate::temp_fs::TempFileSystem;
use crate::watcher::MirrorWatcher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Mirror settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Folder the sources are mirrored into
    pub temp_folder: PathBuf,
    /// Editor socket address
    pub address: String,
    /// Watcher debounce in milliseconds
    pub debounce_ms: u64,
    /// Interval between watcher polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            temp_folder: std::env::temp_dir().join("animation-editor-mirror"),
            address: "127.0.0.1:1337".to_string(),
            debounce_ms: 250,
            poll_interval_ms: 100,
        }
    }
}

/// Mirror session bound to one editor connection
#[derive(Debug)]
pub struct MirrorClient {
    config: MirrorConfig,
    temp_fs: TempFileSystem,
    watcher: MirrorWatcher,
}

impl MirrorClient {
    /// Prepare the temp folder and start watching it
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let temp_fs = TempFileSystem::new(&config.temp_folder);
        temp_fs.init()?;

        let mut watcher = MirrorWatcher::new(Duration::from_millis(config.debounce_ms))?;
        watcher.watch(temp_fs.root())?;

        Ok(Self { config, temp_fs, watcher })
    }

    /// Temp folder
    pub fn temp_fs(&self) -> &TempFileSystem {
        &self.temp_fs
    }

    /// Connect to the configured address and run until the editor leaves
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Connecting to editor at {}", self.config.address);
        let stream = TcpStream::connect(&self.config.address).await?;
        self.serve(stream).await
    }

    /// Run over an established connection.
    ///
    /// Returns `Ok` after an explicit disconnect event and an error when the
    /// socket closes or fails first. In every case the mirrored sources are
    /// removed.
    pub async fn serve(&mut self, stream: TcpStream) -> Result<()> {
        let result = self.session(stream).await;
        if result.is_err() {
            if let Err(e) = self.temp_fs.handle_event(ServerEvent::Disconnect) {
                tracing::error!("Failed to remove mirrored sources: {e}");
            }
        }
        result
    }

    /// Exchange messages until the editor disconnects. Socket failures are
    /// returned without cleanup; `serve` does it.
    async fn session(&mut self, stream: TcpStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let mut poll = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Err(MirrorError::ConnectionClosed);
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let event = match protocol::decode(&line) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Ignoring malformed message: {e}");
                            continue;
                        }
                    };

                    let disconnect = event == ServerEvent::Disconnect;
                    if let Err(e) = self.temp_fs.handle_event(event) {
                        tracing::error!("Failed to apply editor event: {e}");
                    }
                    if disconnect {
                        return Ok(());
                    }
                }
                _ = poll.tick() => {
                    let changed = self.watcher.poll_changes();
                    if changed.is_empty() {
                        continue;
                    }
                    for message in self.temp_fs.updates_for(changed) {
                        writer.write_all(protocol::encode(&message)?.as_bytes()).await?;
                    }
                    writer.flush().await?;
                }
            }
        }
    }
}
