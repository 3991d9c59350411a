// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tagging configuration.
//!
//! Loaded from YAML or JSON (chosen by file extension). Field names follow
//! the camelCase layout of the tagging server's `tagging:` section.

use crate::models::label::{Label, LabelRing};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A video available for labeling: a directory of extracted frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub directory: String,
    pub num_frames: usize,
}

/// Complete tagging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggingConfig {
    /// Minimum area of a drawn box, in square pixels.
    #[serde(default = "default_box_area_threshold")]
    pub box_area_threshold: i64,
    /// Luma level above which a pixel counts as bright when refining boxes.
    #[serde(default = "default_box_pixel_threshold")]
    pub box_pixel_threshold: u8,
    /// Default search buffer around a box, in pixels.
    #[serde(default = "default_box_area_buffer")]
    pub box_area_buffer: u32,
    /// Boxes wider or taller than this are carried over without refinement.
    #[serde(default = "default_box_area_max_size")]
    pub box_area_max_size: i32,
    /// Delay before a finished drag returns the canvas to idle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Number of creations kept for undo.
    #[serde(default = "default_max_undo")]
    pub max_undo: usize,
    pub labels: Vec<Label>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

fn default_box_area_threshold() -> i64 {
    25
}

fn default_box_pixel_threshold() -> u8 {
    128
}

fn default_box_area_buffer() -> u32 {
    15
}

fn default_box_area_max_size() -> i32 {
    100
}

fn default_settle_delay_ms() -> u64 {
    100
}

fn default_max_undo() -> usize {
    10
}

impl TaggingConfig {
    /// A configuration with default thresholds and the given labels.
    pub fn with_labels(labels: Vec<Label>) -> Self {
        Self {
            box_area_threshold: default_box_area_threshold(),
            box_pixel_threshold: default_box_pixel_threshold(),
            box_area_buffer: default_box_area_buffer(),
            box_area_max_size: default_box_area_max_size(),
            settle_delay_ms: default_settle_delay_ms(),
            max_undo: default_max_undo(),
            labels,
            videos: Vec::new(),
        }
    }

    /// Load a configuration file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let extension = path.extension().and_then(|s| s.to_str());
        let config: Self = match extension {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
            _ => bail!("Unsupported config extension: {:?}", extension),
        };
        config.validate()?;
        log::info!(
            "Loaded config {} ({} labels, {} videos)",
            path.display(),
            config.labels.len(),
            config.videos.len()
        );
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        LabelRing::new(self.labels.clone()).context("invalid label set")?;
        if self.box_area_threshold < 0 {
            bail!("boxAreaThreshold must not be negative");
        }
        if self.max_undo == 0 {
            bail!("maxUndo must be at least 1");
        }
        Ok(())
    }

    pub fn video(&self, directory: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.directory == directory)
    }
}
