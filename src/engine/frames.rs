// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame identity as seen by the canvas.
//!
//! The navigator owns the frame index. The canvas only ever sees a
//! [`FrameCursor`] captured from it at navigation time.

use crate::models::store::FrameId;

/// Read-only view of the navigator's position.
pub trait FrameIdentity {
    fn current_frame_id(&self) -> FrameId;
    fn previous_frame_id(&self) -> Option<FrameId>;
    fn next_frame_id(&self) -> Option<FrameId>;
    fn is_visited(&self, frame: &FrameId) -> bool;

    /// File the box position oracle should read for `frame`.
    fn frame_file(&self, frame: &FrameId) -> String {
        frame.clone()
    }
}

/// A frame id together with its image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub id: FrameId,
    pub file: String,
}

impl FrameRef {
    fn resolve(frames: &dyn FrameIdentity, id: FrameId) -> Self {
        let file = frames.frame_file(&id);
        Self { id, file }
    }
}

/// Snapshot of the navigator taken when a frame is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCursor {
    pub current: FrameRef,
    pub previous: Option<FrameRef>,
    pub next: Option<FrameRef>,
    /// Whether the next frame had been visited when this cursor was taken.
    pub next_visited: bool,
}

impl FrameCursor {
    pub fn capture(frames: &dyn FrameIdentity) -> Self {
        let next = frames.next_frame_id();
        let next_visited = next.as_ref().is_some_and(|id| frames.is_visited(id));
        Self {
            current: FrameRef::resolve(frames, frames.current_frame_id()),
            previous: frames.previous_frame_id().map(|id| FrameRef::resolve(frames, id)),
            next: next.map(|id| FrameRef::resolve(frames, id)),
            next_visited,
        }
    }

    /// A cursor for a lone frame with no neighbours.
    pub fn detached(id: &str) -> Self {
        Self {
            current: FrameRef {
                id: id.to_string(),
                file: id.to_string(),
            },
            previous: None,
            next: None,
            next_visited: false,
        }
    }

    /// Changes on this frame still need to be carried into the next one.
    pub fn next_unvisited(&self) -> bool {
        !self.next_visited
    }
}
