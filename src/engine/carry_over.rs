// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame carry-over.
//!
//! When the annotator moves forward onto an unvisited frame, every box
//! placed on the frame being left is copied into the next one, after the
//! box position oracle has had a chance to move it.

use super::canvas::CanvasController;
use super::frames::FrameCursor;
use super::notice::Notice;
use super::oracle::{BoxOracle, OracleRequest, Refinement};
use crate::models::session::EngineSettings;
use crate::util::geometry::CellKey;
use std::collections::BTreeSet;

/// How boxes are carried into the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarryMode {
    /// Ask the oracle for each box's new position.
    #[default]
    Predict,
    /// Copy boxes unchanged.
    Copy,
}

/// What a carry-over did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryOverReport {
    /// Keys written into the entered frame.
    pub carried: Vec<CellKey>,
    /// Keys the oracle failed on.
    pub failed: Vec<CellKey>,
    /// Keys with no label on the frame being left.
    pub skipped: Vec<CellKey>,
}

pub struct CarryOverEngine<O: BoxOracle> {
    oracle: O,
    buffer_size: u32,
    mode: CarryMode,
}

impl<O: BoxOracle> CarryOverEngine<O> {
    pub fn new(settings: &EngineSettings, oracle: O) -> Self {
        Self {
            oracle,
            buffer_size: settings.box_area_buffer,
            mode: CarryMode::default(),
        }
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    pub fn set_buffer_size(&mut self, buffer_size: u32) {
        log::info!("Search buffer set to {} px", buffer_size);
        self.buffer_size = buffer_size;
    }

    pub fn mode(&self) -> CarryMode {
        self.mode
    }

    /// Switch between predicting and copying.
    pub fn toggle_copy(&mut self) -> CarryMode {
        self.mode = match self.mode {
            CarryMode::Predict => CarryMode::Copy,
            CarryMode::Copy => CarryMode::Predict,
        };
        log::info!("Carry mode: {:?}", self.mode);
        self.mode
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Carry the modified boxes of `leaving` into `entering` and render it.
    ///
    /// Each box is located by the oracle one at a time. Unrefined boxes keep
    /// their bounds; boxes the oracle fails on are reported and left out.
    /// Carried boxes are clamped to the canvas and become the entered
    /// frame's modified set.
    pub async fn carry_over(
        &self,
        controller: &mut CanvasController,
        leaving: &FrameCursor,
        entering: FrameCursor,
    ) -> CarryOverReport {
        let mut report = CarryOverReport::default();
        let keys = controller.take_modified();
        if keys.is_empty() {
            controller.reload_state(entering);
            return report;
        }

        let source = leaving.current.id.clone();
        let predict = self.mode == CarryMode::Predict;
        let canvas = controller.canvas();
        let mut seeded = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(label) = controller.store().label_at(&source, &key).map(str::to_string) else {
                log::warn!("No label at {} on {}, not carried", key, source);
                report.skipped.push(key);
                continue;
            };

            let refinement = if predict {
                let request = OracleRequest {
                    prev_filename: leaving.current.file.clone(),
                    curr_filename: entering.current.file.clone(),
                    bounds: key.clone(),
                    buffer_size: self.buffer_size,
                };
                self.oracle.locate(&request).await
            } else {
                Refinement::Unrefined
            };

            let rect = match refinement {
                Refinement::Refined(rect) => rect,
                Refinement::Unrefined => match key.parse() {
                    Ok(rect) => rect,
                    Err(err) => {
                        log::debug!("{:#}", err);
                        controller.notify(Notice::MalformedKey {
                            frame: source.clone(),
                            key: key.clone(),
                        });
                        report.skipped.push(key);
                        continue;
                    }
                },
                Refinement::Failed(reason) => {
                    controller.notify(Notice::OracleFailed {
                        bounds: key.clone(),
                        reason,
                    });
                    report.failed.push(key);
                    continue;
                }
            };

            let carried = rect.clamp_to(canvas).key();
            log::debug!("Carry {} -> {} ({})", key, carried, label);
            seeded.push((carried, label));
        }

        report.carried = seeded.iter().map(|(key, _)| key.clone()).collect();
        controller.seed_frame(&entering.current.id, seeded);
        controller.reload_state(entering);
        controller.replace_modified(report.carried.iter().cloned().collect::<BTreeSet<_>>());
        log::info!(
            "Carried {} boxes from {} ({} failed)",
            report.carried.len(),
            source,
            report.failed.len()
        );
        report
    }
}
