// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labels and the label ring.
//!
//! The active label set is an immutable ordered ring: clicking a cell moves
//! it to the successor label, and the successor of the last label is the
//! first. Cells refer to labels by [`LabelId`]; names only appear at the
//! store boundary.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A label an annotator can assign to a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub name: String,
    pub color: String,
    /// Human readable name of the color, shown in the help text.
    #[serde(default)]
    pub color_text: String,
}

impl Label {
    pub fn new(name: &str, color: &str, color_text: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            color_text: color_text.to_string(),
        }
    }
}

/// Position of a label within its ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(usize);

impl LabelId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered, cyclic set of labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRing {
    labels: Vec<Label>,
}

impl LabelRing {
    /// Build a ring, rejecting empty sets and duplicate names.
    pub fn new(labels: Vec<Label>) -> Result<Self> {
        if labels.is_empty() {
            bail!("at least one label must be configured");
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.name.as_str()) {
                bail!("duplicate label name {:?}", label.name);
            }
        }
        Ok(Self { labels })
    }

    /// The label newly drawn cells start with.
    pub fn first(&self) -> LabelId {
        LabelId(0)
    }

    pub fn successor(&self, id: LabelId) -> LabelId {
        LabelId((id.0 + 1) % self.labels.len())
    }

    pub fn name(&self, id: LabelId) -> &str {
        &self.labels[id.0].name
    }

    /// Resolve a stored label name.
    pub fn find(&self, name: &str) -> Option<LabelId> {
        self.labels.iter().position(|l| l.name == name).map(LabelId)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
