// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debounced watcher over the mirror folder.
//!
//! Editors save files in bursts (truncate, write, rename); the debouncer
//! folds those into one change per path.

use crate::error::Result;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Events emitted by the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// A file was created or its content changed
    Changed(PathBuf),
    /// A file disappeared
    Removed(PathBuf),
    /// The backend reported an error
    Error(String),
}

/// Debounced recursive watcher
pub struct MirrorWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    event_rx: Receiver<FileEvent>,
    watched_dirs: Arc<RwLock<HashSet<PathBuf>>>,
}

impl MirrorWatcher {
    /// Create a watcher folding events within `debounce`
    pub fn new(debounce: Duration) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| match result {
            Ok(events) => {
                for event in events {
                    let wrap: fn(PathBuf) -> FileEvent = match event.kind {
                        EventKind::Create(_) | EventKind::Modify(_) => FileEvent::Changed,
                        EventKind::Remove(_) => FileEvent::Removed,
                        EventKind::Any | EventKind::Access(_) | EventKind::Other => continue,
                    };
                    for path in &event.paths {
                        let _ = event_tx.send(wrap(path.clone()));
                    }
                }
            }
            Err(errors) => {
                for error in errors {
                    let _ = event_tx.send(FileEvent::Error(error.to_string()));
                }
            }
        })?;

        Ok(Self {
            debouncer,
            event_rx,
            watched_dirs: Arc::new(RwLock::new(HashSet::new())),
        })
    }

    /// Watch a directory recursively
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.debouncer.watch(&path, RecursiveMode::Recursive)?;
        self.watched_dirs.write().insert(path.clone());
        tracing::info!("Mirroring changes under {:?}", path);
        Ok(())
    }

    /// Remove a directory from the watch set
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.debouncer.unwatch(path)?;
        self.watched_dirs.write().remove(path);
        tracing::info!("Mirror watch removed: {:?}", path);
        Ok(())
    }

    /// Whether `path` is registered with the watcher
    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_dirs.read().contains(path)
    }

    /// Poll for pending events (non-blocking)
    pub fn poll_events(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Watcher channel closed");
                    break;
                }
            }
        }
        events
    }

    /// Paths created or modified since the last poll, deduplicated
    pub fn poll_changes(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.poll_events()
            .into_iter()
            .filter_map(|event| match event {
                FileEvent::Changed(path) => Some(path),
                FileEvent::Removed(_) => None,
                FileEvent::Error(e) => {
                    tracing::warn!("File watcher error: {e}");
                    None
                }
            })
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }
}

impl std::fmt::Debug for MirrorWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorWatcher")
            .field("watched_dirs", &*self.watched_dirs.read())
            .finish_non_exhaustive()
    }
}
