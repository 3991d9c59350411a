// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session context and session snapshots.
//!
//! [`AnnotationSession`] is the read-only context shared by the canvas
//! controller and the carry-over engine: the active label ring and the
//! engine thresholds. [`SessionSnapshot`] is the serializable state handed
//! to the external save hook.

use super::label::LabelRing;
use super::store::LabelStore;
use crate::config::TaggingConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Engine thresholds taken from the tagging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub box_area_threshold: i64,
    pub box_area_buffer: u32,
    pub box_area_max_size: i32,
    pub box_pixel_threshold: u8,
    pub settle_delay: Duration,
    pub max_undo: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            box_area_threshold: 25,
            box_area_buffer: 15,
            box_area_max_size: 100,
            box_pixel_threshold: 128,
            settle_delay: Duration::from_millis(100),
            max_undo: 10,
        }
    }
}

/// Shared, immutable context of one annotation session.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    pub labels: LabelRing,
    pub settings: EngineSettings,
}

impl AnnotationSession {
    pub fn new(labels: LabelRing, settings: EngineSettings) -> Self {
        Self { labels, settings }
    }

    pub fn from_config(config: &TaggingConfig) -> Result<Self> {
        let labels = LabelRing::new(config.labels.clone())?;
        let settings = EngineSettings {
            box_area_threshold: config.box_area_threshold,
            box_area_buffer: config.box_area_buffer,
            box_area_max_size: config.box_area_max_size,
            box_pixel_threshold: config.box_pixel_threshold,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            max_undo: config.max_undo,
        };
        Ok(Self { labels, settings })
    }
}

/// Everything needed to resume a session later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub directory: String,
    pub frame_index: usize,
    pub visited: BTreeSet<usize>,
    pub data: LabelStore,
}
