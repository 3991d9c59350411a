// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame index and visited-frame bookkeeping for one video.

use crate::config::Video;
use crate::engine::frames::FrameIdentity;
use crate::models::store::FrameId;
use std::collections::BTreeSet;

/// Position within a video's frame sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNavigator {
    directory: String,
    num_frames: usize,
    index: usize,
    visited: BTreeSet<usize>,
}

impl FrameNavigator {
    pub fn new(directory: &str, num_frames: usize) -> Self {
        Self {
            directory: directory.to_string(),
            num_frames: num_frames.max(1),
            index: 0,
            visited: BTreeSet::new(),
        }
    }

    pub fn from_video(video: &Video) -> Self {
        Self::new(&video.directory, video.num_frames)
    }

    /// Frame name for an index, e.g. `clip_0000000004.jpg`.
    pub fn frame_name(&self, index: usize) -> FrameId {
        format!("{}_{:010}.jpg", self.directory, index)
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.num_frames
    }

    /// Advance one frame. Returns false at the last frame.
    pub fn step_forward(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Go back one frame. Returns false at the first frame.
    pub fn step_backward(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to a frame, clamped to the video.
    pub fn jump_to(&mut self, index: usize) {
        self.index = index.min(self.num_frames - 1);
    }

    pub fn mark_visited(&mut self) {
        self.visited.insert(self.index);
    }

    /// Review sessions never carry boxes forward.
    pub fn mark_all_visited(&mut self) {
        self.visited.extend(0..self.num_frames);
    }

    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    /// Resume at a saved position.
    pub fn restore(&mut self, index: usize, visited: BTreeSet<usize>) {
        self.visited = visited.into_iter().filter(|i| *i < self.num_frames).collect();
        self.jump_to(index);
    }

    fn index_of(&self, frame: &FrameId) -> Option<usize> {
        let digits = frame
            .strip_prefix(self.directory.as_str())?
            .strip_prefix('_')?
            .strip_suffix(".jpg")?;
        digits.parse().ok()
    }
}

impl FrameIdentity for FrameNavigator {
    fn current_frame_id(&self) -> FrameId {
        self.frame_name(self.index)
    }

    fn previous_frame_id(&self) -> Option<FrameId> {
        self.index.checked_sub(1).map(|i| self.frame_name(i))
    }

    fn next_frame_id(&self) -> Option<FrameId> {
        (!self.is_last()).then(|| self.frame_name(self.index + 1))
    }

    fn is_visited(&self, frame: &FrameId) -> bool {
        self.index_of(frame).is_some_and(|i| self.visited.contains(&i))
    }

    fn frame_file(&self, frame: &FrameId) -> String {
        format!("{}/{}", self.directory, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::frames::FrameCursor;

    #[test]
    fn test_frame_names() {
        let nav = FrameNavigator::new("clip", 3);
        assert_eq!(nav.frame_name(4), "clip_0000000004.jpg");
        assert_eq!(nav.current_frame_id(), "clip_0000000000.jpg");
        assert_eq!(nav.previous_frame_id(), None);
        assert_eq!(nav.next_frame_id().as_deref(), Some("clip_0000000001.jpg"));
        assert_eq!(nav.frame_file(&nav.current_frame_id()), "clip/clip_0000000000.jpg");
    }

    #[test]
    fn test_steps_clamp_at_ends() {
        let mut nav = FrameNavigator::new("clip", 2);
        assert!(!nav.step_backward());
        assert!(nav.step_forward());
        assert!(!nav.step_forward());
        assert_eq!(nav.index(), 1);
        assert_eq!(nav.next_frame_id(), None);
    }

    #[test]
    fn test_cursor_sees_visited_next_frame() {
        let mut nav = FrameNavigator::new("clip", 3);
        nav.mark_visited();
        nav.step_forward();
        nav.mark_visited();
        nav.step_backward();
        let cursor = FrameCursor::capture(&nav);
        assert!(cursor.next_visited);
        assert_eq!(cursor.current.file, "clip/clip_0000000000.jpg");

        nav.step_forward();
        assert!(FrameCursor::capture(&nav).next_unvisited());
    }

    #[test]
    fn test_mark_all_visited() {
        let mut nav = FrameNavigator::new("clip", 4);
        nav.mark_all_visited();
        assert_eq!(nav.visited().len(), 4);
        assert!(nav.is_visited(&"clip_0000000003.jpg".to_string()));
        assert!(!nav.is_visited(&"other_0000000003.jpg".to_string()));
    }

    #[test]
    fn test_restore_drops_out_of_range() {
        let mut nav = FrameNavigator::new("clip", 4);
        nav.restore(9, [0, 1, 7].into_iter().collect());
        assert_eq!(nav.index(), 3);
        assert_eq!(nav.visited().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }
}
