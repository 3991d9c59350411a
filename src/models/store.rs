// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-frame label maps.
//!
//! The store maps frame ids to `cell key -> label name` maps. It is keyed by
//! geometry, not identity: writing the same key twice keeps the later label.
//! A frame whose last key is removed disappears from the outer map.

use crate::util::geometry::CellKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a frame, e.g. `clip_0000000004.jpg`.
pub type FrameId = String;

/// Labels of one frame, keyed by cell geometry.
pub type FrameLabels = BTreeMap<CellKey, String>;

/// The session's label store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<FrameId, FrameLabels>", into = "BTreeMap<FrameId, FrameLabels>")]
pub struct LabelStore {
    frames: BTreeMap<FrameId, FrameLabels>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw frame maps, dropping frames without entries.
    pub fn from_frames(frames: BTreeMap<FrameId, FrameLabels>) -> Self {
        let mut store = Self { frames };
        store.frames.retain(|_, labels| !labels.is_empty());
        store
    }

    /// Write a label at `key`, creating the frame entry if needed.
    ///
    /// Returns the label previously stored under the same key.
    pub fn insert(&mut self, frame: &str, key: CellKey, label: &str) -> Option<String> {
        self.frames
            .entry(frame.to_string())
            .or_default()
            .insert(key, label.to_string())
    }

    /// Remove `key` from a frame, dropping the frame once it is empty.
    pub fn remove(&mut self, frame: &str, key: &CellKey) -> Option<String> {
        let labels = self.frames.get_mut(frame)?;
        let removed = labels.remove(key);
        if labels.is_empty() {
            self.frames.remove(frame);
        }
        removed
    }

    pub fn frame(&self, frame: &str) -> Option<&FrameLabels> {
        self.frames.get(frame)
    }

    pub fn label_at(&self, frame: &str, key: &CellKey) -> Option<&str> {
        self.frames.get(frame)?.get(key).map(String::as_str)
    }

    pub fn contains_frame(&self, frame: &str) -> bool {
        self.frames.contains_key(frame)
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = &FrameId> {
        self.frames.keys()
    }

    /// Total number of labeled cells across all frames.
    pub fn cell_count(&self) -> usize {
        self.frames.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<BTreeMap<FrameId, FrameLabels>> for LabelStore {
    fn from(frames: BTreeMap<FrameId, FrameLabels>) -> Self {
        Self::from_frames(frames)
    }
}

impl From<LabelStore> for BTreeMap<FrameId, FrameLabels> {
    fn from(store: LabelStore) -> Self {
        store.frames
    }
}
