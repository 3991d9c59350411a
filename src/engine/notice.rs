// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! User-facing notices.
//!
//! Nothing in the engine is fatal: rejected gestures, empty undo and failed
//! oracle calls are reported as notices for the UI to show, and logged.

use crate::models::store::FrameId;
use crate::util::geometry::CellKey;
use std::fmt;

/// Something the annotator should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A drawn box was below the minimum area.
    TinyBox { area: i64, threshold: i64 },
    /// Undo was requested with an empty history.
    NothingToUndo,
    /// The box position oracle could not refine a carried box.
    OracleFailed { bounds: CellKey, reason: String },
    /// A stored entry names a label outside the active ring.
    UnknownLabel { frame: FrameId, key: CellKey, label: String },
    /// A stored key could not be decoded into geometry.
    MalformedKey { frame: FrameId, key: CellKey },
    /// Canvas input arrived while labels are switched off.
    LabelsDisabled,
}

impl Notice {
    /// Log the notice at the level matching its severity.
    pub(crate) fn log(&self) {
        match self {
            Notice::OracleFailed { .. } | Notice::MalformedKey { .. } => log::error!("{}", self),
            _ => log::warn!("{}", self),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TinyBox { area, threshold } => write!(
                f,
                "Tiny boxes not permitted! Please create a larger box ({} < {} px).",
                area, threshold
            ),
            Notice::NothingToUndo => f.write_str("Nothing to undo."),
            Notice::OracleFailed { bounds, reason } => {
                write!(f, "Could not track box {} into the next frame: {}", bounds, reason)
            }
            Notice::UnknownLabel { frame, key, label } => {
                write!(f, "Skipping cell {} on {}: unknown label {:?}", key, frame, label)
            }
            Notice::MalformedKey { frame, key } => {
                write!(f, "Skipping malformed cell key {:?} on {}", key.as_str(), frame)
            }
            Notice::LabelsDisabled => f.write_str("Labels are disabled! Please enable labels to edit."),
        }
    }
}
