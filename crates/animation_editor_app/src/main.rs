// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation editor host.
//!
//! Commands:
//! - `mirror` (default): mirror the editor's sources into the temp folder
//! - `inspect <track.ron>`: print a track's range and chart series
//! - `play <track.ron>`: play a track headlessly and log the values
//!
//! `--config <path>` selects the configuration file.

mod config;
mod error;

use animation_editor_curves::{
    Animatable, AnimationEditor, DatasetProjector, KeyframeTrack, SceneAnimatable, TickStatus,
};
use animation_editor_mirror::{MirrorClient, MirrorError};
use config::EditorConfig;
use error::AppError;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "animation_editor=info,animation_editor_curves=info,animation_editor_mirror=info";

/// Subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Mirror,
    Inspect(PathBuf),
    Play(PathBuf),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli, AppError> {
    let mut config = None;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args
                .next()
                .ok_or_else(|| AppError::Usage("--config needs a path".into()))?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(arg);
        }
    }

    let command = match positional.as_slice() {
        [] => Command::Mirror,
        [cmd] if cmd == "mirror" => Command::Mirror,
        [cmd, path] if cmd == "inspect" => Command::Inspect(PathBuf::from(path)),
        [cmd, path] if cmd == "play" => Command::Play(PathBuf::from(path)),
        other => return Err(AppError::Usage(format!("Unknown command: {}", other.join(" ")))),
    };

    Ok(Cli { config, command })
}

fn load_track(path: &Path) -> Result<KeyframeTrack, AppError> {
    let content = std::fs::read_to_string(path)?;
    Ok(KeyframeTrack::from_ron(&content)?)
}

fn inspect(path: &Path) -> Result<(), AppError> {
    let track = load_track(path)?;
    tracing::info!(
        "Track '{}' -> {} ({}, {} keys, {} fps)",
        track.name,
        track.target_property,
        track.data_type().name(),
        track.len(),
        track.frame_rate
    );

    match DatasetProjector::range(&track).defined() {
        Some((min, max)) => tracing::info!("Frames {min} to {max}"),
        None => tracing::info!("Track has no keys"),
    }

    for series in DatasetProjector::project(Some(&track)) {
        let points: Vec<String> = series
            .points
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        tracing::info!("Series '{}': {}", series.label, points.join(" "));
    }
    Ok(())
}

async fn play(path: &Path, config: &EditorConfig) -> Result<(), AppError> {
    let track = load_track(path)?;
    let property = track.target_property.clone();

    let mut object = SceneAnimatable::new(track.name.clone());
    object.add_track(track);

    let mut editor = AnimationEditor::new(&config.chart, config.history_depth, config.default_sync_type);
    let id = editor.add_animatable(object);
    editor.select_animatable(Some(id));

    if !editor.play() {
        tracing::warn!("Nothing to play in {:?}", path);
        return Ok(());
    }

    let mut interval = tokio::time::interval(editor.bridge().tick_interval);
    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let now = Instant::now();
        let status = editor.tick(now - last);
        last = now;

        let value = editor.selected_animatable().and_then(|o| o.property(&property));
        tracing::debug!("Frame {:.2}: {:?}", editor.current_frame(), value);

        if status != TickStatus::Playing {
            tracing::info!("Playback finished at frame {:.2}, {property} = {:?}", editor.current_frame(), value);
            break;
        }
    }

    editor.close();
    Ok(())
}

async fn mirror(config: &EditorConfig) -> Result<(), AppError> {
    let mut client = MirrorClient::new(config.mirror.clone())?;
    match client.run().await {
        Ok(()) => {
            tracing::info!("Editor disconnected");
            Ok(())
        }
        Err(MirrorError::ConnectionClosed) => {
            tracing::warn!("Connection to the editor was closed");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run() -> Result<(), AppError> {
    let cli = parse_args(std::env::args().skip(1))?;
    let config_path = EditorConfig::resolve_path(cli.config.as_deref());
    let config = EditorConfig::load(&config_path)?;

    match &cli.command {
        Command::Mirror => mirror(&config).await,
        Command::Inspect(path) => inspect(path),
        Command::Play(path) => play(path, &config).await,
    }
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting animation editor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
