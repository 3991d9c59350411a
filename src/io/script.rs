// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Replay scripts.
//!
//! A script is a recorded annotation session: pointer gestures, key
//! modifiers and navigation, replayed against an [`Annotator`] on a
//! simulated clock.
//!
//! ```yaml
//! video: clip
//! canvas: { width: 640, height: 480 }
//! oracle:
//!   "10,10,20,20": !moved [12, 11, 20, 20]
//! events:
//!   - !draw [10, 10, 30, 30]
//!   - forward
//!   - !wait 150
//! ```

use super::scripted::ScriptedAnswer;
use super::serialization;
use crate::app::Annotator;
use crate::engine::carry_over::CarryOverReport;
use crate::engine::cell::Modifiers;
use crate::engine::notice::Notice;
use crate::engine::oracle::BoxOracle;
use crate::util::geometry::{CanvasSize, CellKey, Point};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// One recorded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Down([i32; 2]),
    Move([i32; 2]),
    Up([i32; 2]),
    Click([i32; 2]),
    /// Press, move, release and click: `[x1, y1, x2, y2]`.
    Draw([i32; 4]),
    Modifiers(Modifiers),
    Forward,
    Backward,
    Undo,
    /// Advance the clock by this many milliseconds.
    Wait(u64),
    Buffer(u32),
    ToggleCopy,
    ToggleLabels,
    Play,
    Pause,
    Stop,
    /// One playback tick.
    Tick,
}

/// A replay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Video directory, as listed in the config.
    pub video: String,
    pub canvas: CanvasSize,
    #[serde(default)]
    pub review: bool,
    /// Answers for the scripted oracle.
    #[serde(default)]
    pub oracle: BTreeMap<CellKey, ScriptedAnswer>,
    pub events: Vec<Event>,
}

/// What happened during a replay.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub notices: Vec<Notice>,
    pub carry_overs: Vec<CarryOverReport>,
}

impl Replay {
    pub fn load(path: &Path) -> Result<Self> {
        let replay: Self = serialization::import(path)?;
        log::info!("Loaded replay of {} events for {}", replay.events.len(), replay.video);
        Ok(replay)
    }

    /// Feed every event to `app`. The annotator must already be started.
    pub async fn run<O: BoxOracle>(&self, app: &mut Annotator<O>) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();
        let start = Instant::now();
        let mut elapsed = Duration::ZERO;

        for event in &self.events {
            let now = start + elapsed;
            log::debug!("Replay {:?} at {:?}", event, elapsed);
            match event {
                Event::Down([x, y]) => app.pointer_down(Point::new(*x, *y), now),
                Event::Move([x, y]) => app.pointer_move(Point::new(*x, *y), now),
                Event::Up([x, y]) => app.pointer_up(Point::new(*x, *y), now),
                Event::Click([x, y]) => app.click(Point::new(*x, *y), now),
                Event::Draw([x1, y1, x2, y2]) => {
                    let (from, to) = (Point::new(*x1, *y1), Point::new(*x2, *y2));
                    app.pointer_down(from, now);
                    app.pointer_move(to, now);
                    app.pointer_up(to, now);
                    app.click(to, now);
                }
                Event::Modifiers(modifiers) => app.set_modifiers(*modifiers),
                Event::Forward => outcome.carry_overs.extend(app.seek_forward().await),
                Event::Backward => {
                    app.seek_backward();
                }
                Event::Undo => {
                    app.undo(|| true);
                }
                Event::Wait(ms) => elapsed += Duration::from_millis(*ms),
                Event::Buffer(size) => app.set_buffer_size(*size),
                Event::ToggleCopy => {
                    app.toggle_copy();
                }
                Event::ToggleLabels => {
                    app.toggle_labels();
                }
                Event::Play => app.play(),
                Event::Pause => app.pause(),
                Event::Stop => app.stop(),
                Event::Tick => outcome.carry_overs.extend(app.advance_playback().await),
            }
            outcome.notices.extend(app.take_notices());
        }
        outcome
    }
}
