// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! celltag - video frame cell annotation engine
//!
//! Command-line front end: replays recorded annotation sessions, previews
//! oracle search areas and checks tagging configurations.

use anyhow::{Context, Result};
use celltag::app::Annotator;
use celltag::config::TaggingConfig;
use celltag::engine::canvas::CanvasController;
use celltag::engine::frames::FrameCursor;
use celltag::engine::oracle::BoxOracle;
use celltag::io::luma::{LumaFrame, LumaOracle};
use celltag::io::script::Replay;
use celltag::io::scripted::ScriptedOracle;
use celltag::io::serialization;
use celltag::models::session::AnnotationSession;
use celltag::models::store::LabelStore;
use celltag::util::geometry::CanvasSize;
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "celltag")]
#[command(about = "Video frame cell annotation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session and write the resulting labels
    Replay {
        /// Tagging config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Replay script (YAML or JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Output file for the label store; printed as JSON when absent
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Grayscale frame table for the luma oracle instead of the script's answers
        #[arg(long)]
        frames: Option<PathBuf>,
    },

    /// Print the oracle search areas for one frame
    Buffer {
        /// Tagging config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Label store (YAML or JSON)
        #[arg(long)]
        store: PathBuf,

        /// Frame id, e.g. clip_0000000004.jpg
        #[arg(long)]
        frame: String,

        /// Canvas width
        #[arg(long)]
        width: i32,

        /// Canvas height
        #[arg(long)]
        height: i32,

        /// Buffer size; defaults to boxAreaBuffer from the config
        #[arg(long)]
        buffer: Option<u32>,
    },

    /// Validate a tagging config
    Check {
        /// Tagging config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            config,
            script,
            out,
            frames,
        } => replay(&config, &script, out, frames),
        Commands::Buffer {
            config,
            store,
            frame,
            width,
            height,
            buffer,
        } => print_buffer(&config, &store, &frame, CanvasSize::new(width, height), buffer),
        Commands::Check { config } => check(&config),
    }
}

fn replay(config: &Path, script: &Path, out: Option<PathBuf>, frames: Option<PathBuf>) -> Result<()> {
    let config = TaggingConfig::load(config)?;
    let replay = Replay::load(script)?;

    let oracle: Box<dyn BoxOracle> = match frames {
        Some(path) => {
            let frames: HashMap<String, LumaFrame> =
                serialization::import(&path).with_context(|| format!("failed to load frames {}", path.display()))?;
            log::info!("Loaded {} frames for the luma oracle", frames.len());
            let settings = AnnotationSession::from_config(&config)?.settings;
            Box::new(LumaOracle::new(frames, &settings))
        }
        None => Box::new(ScriptedOracle::new(replay.oracle.clone())),
    };

    let mut app = Annotator::from_config(&config, &replay.video, replay.canvas, oracle)?;
    app.set_review_mode(replay.review);
    app.start();
    let outcome = block_on(replay.run(&mut app));

    for notice in &outcome.notices {
        println!("notice: {}", notice);
    }
    let carried: usize = outcome.carry_overs.iter().map(|r| r.carried.len()).sum();
    println!(
        "{} events, {} carry-overs ({} boxes carried), {} labeled cells",
        replay.events.len(),
        outcome.carry_overs.len(),
        carried,
        app.store().cell_count()
    );

    match out {
        Some(path) => serialization::export(app.store(), &path)?,
        None => println!("{}", serde_json::to_string_pretty(app.store())?),
    }
    Ok(())
}

fn print_buffer(
    config: &Path,
    store: &Path,
    frame: &str,
    canvas: CanvasSize,
    buffer: Option<u32>,
) -> Result<()> {
    let config = TaggingConfig::load(config)?;
    let session = Rc::new(AnnotationSession::from_config(&config)?);
    let data: LabelStore = serialization::import(store)?;
    if !data.contains_frame(frame) {
        log::warn!("No labels stored for {}", frame);
    }

    let mut controller = CanvasController::new(session, canvas, FrameCursor::detached(frame));
    controller.load_data(data);
    controller.reload_state(FrameCursor::detached(frame));
    for notice in controller.take_notices() {
        println!("notice: {}", notice);
    }

    let buffer = buffer.unwrap_or(config.box_area_buffer);
    for cell in controller.cells() {
        let area = cell.rect().buffered(buffer as i32, canvas);
        println!("{} -> {}", cell.key(), area.key());
    }
    Ok(())
}

fn check(config: &Path) -> Result<()> {
    let config = TaggingConfig::load(config)?;
    println!("{} labels:", config.labels.len());
    for label in &config.labels {
        println!("  {} ({})", label.name, label.color);
    }
    for video in &config.videos {
        println!("video {}: {} frames", video.directory, video.num_frames);
    }
    println!("config OK");
    Ok(())
}
