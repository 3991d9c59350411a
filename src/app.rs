// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state.
//!
//! [`Annotator`] ties the frame navigator, the canvas controller and the
//! carry-over engine together and exposes the user-level actions: seeking,
//! playback, undo, label toggling and canvas pointer input.

use crate::config::TaggingConfig;
use crate::engine::canvas::{CanvasController, DataUpdateHook};
use crate::engine::carry_over::{CarryMode, CarryOverEngine, CarryOverReport};
use crate::engine::cell::Modifiers;
use crate::engine::frames::FrameCursor;
use crate::engine::notice::Notice;
use crate::engine::oracle::BoxOracle;
use crate::models::session::{AnnotationSession, SessionSnapshot};
use crate::models::store::LabelStore;
use crate::navigator::FrameNavigator;
use crate::util::geometry::{CanvasSize, Point, Rect};
use anyhow::{Context, Result};
use std::rc::Rc;
use std::time::Instant;

/// One annotator working through one video.
pub struct Annotator<O: BoxOracle> {
    navigator: FrameNavigator,
    canvas: CanvasController,
    carry: CarryOverEngine<O>,
    /// Review sessions treat every frame as visited
    review: bool,
    labels_enabled: bool,
    playing: bool,
}

impl<O: BoxOracle> Annotator<O> {
    pub fn new(session: Rc<AnnotationSession>, navigator: FrameNavigator, canvas: CanvasSize, oracle: O) -> Self {
        let cursor = FrameCursor::capture(&navigator);
        Self {
            carry: CarryOverEngine::new(&session.settings, oracle),
            canvas: CanvasController::new(session, canvas, cursor),
            navigator,
            review: false,
            labels_enabled: true,
            playing: false,
        }
    }

    /// Build an annotator for one of the configured videos.
    pub fn from_config(config: &TaggingConfig, directory: &str, canvas: CanvasSize, oracle: O) -> Result<Self> {
        let video = config
            .video(directory)
            .with_context(|| format!("video {:?} is not configured", directory))?;
        let session = Rc::new(AnnotationSession::from_config(config)?);
        Ok(Self::new(session, FrameNavigator::from_video(video), canvas, oracle))
    }

    pub fn set_review_mode(&mut self, review: bool) {
        self.review = review;
    }

    pub fn set_data_update_hook(&mut self, hook: DataUpdateHook) {
        self.canvas.set_data_update_hook(hook);
    }

    /// Render the current frame. Call once frames are ready.
    pub fn start(&mut self) {
        if self.review {
            self.navigator.mark_all_visited();
        }
        self.canvas.reload_state(FrameCursor::capture(&self.navigator));
        self.navigator.mark_visited();
        log::info!(
            "Annotating {} from frame {} of {}",
            self.navigator.directory(),
            self.navigator.index(),
            self.navigator.num_frames()
        );
    }

    /// Seed labels saved by an earlier session. Takes effect on `start`.
    pub fn load_data(&mut self, store: LabelStore) {
        self.canvas.load_data(store);
    }

    /// Resume an auto-saved session. Takes effect on `start`.
    pub fn load_snapshot(&mut self, snapshot: SessionSnapshot) {
        if snapshot.directory != self.navigator.directory() {
            log::warn!(
                "Snapshot is for {}, not {}",
                snapshot.directory,
                self.navigator.directory()
            );
        }
        self.navigator.restore(snapshot.frame_index, snapshot.visited);
        self.canvas.load_data(snapshot.data);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            directory: self.navigator.directory().to_string(),
            frame_index: self.navigator.index(),
            visited: self.navigator.visited().clone(),
            data: self.canvas.store().clone(),
        }
    }

    /// Move to the next frame, carrying this frame's changes into it.
    ///
    /// An active group selection is re-selected on the next frame. Returns
    /// `None` at the last frame.
    pub async fn seek_forward(&mut self) -> Option<CarryOverReport> {
        self.canvas.reset_undo_stack();
        if self.navigator.is_last() {
            return None;
        }
        let group = self.canvas.group_snapshot();
        let leaving = FrameCursor::capture(&self.navigator);
        self.navigator.step_forward();
        let entering = FrameCursor::capture(&self.navigator);

        let report = self.carry.carry_over(&mut self.canvas, &leaving, entering).await;
        self.canvas.restore_group(&group);
        self.navigator.mark_visited();
        Some(report)
    }

    /// Move to the previous frame. Nothing is carried backward.
    pub fn seek_backward(&mut self) -> bool {
        self.canvas.deselect_group();
        self.canvas.reset_undo_stack();
        if !self.navigator.step_backward() {
            return false;
        }
        self.canvas.reload_state(FrameCursor::capture(&self.navigator));
        self.canvas.clear_modified();
        self.navigator.mark_visited();
        true
    }

    pub fn play(&mut self) {
        self.canvas.deselect_group();
        self.canvas.reset_undo_stack();
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.canvas.deselect_group();
        self.canvas.reset_undo_stack();
        self.playing = false;
    }

    /// Stop playback and return to the first frame.
    pub fn stop(&mut self) {
        self.pause();
        self.navigator.jump_to(1);
        if !self.seek_backward() {
            self.canvas.reload_state(FrameCursor::capture(&self.navigator));
        }
    }

    /// One playback tick: advance a frame, pausing at the end.
    pub async fn advance_playback(&mut self) -> Option<CarryOverReport> {
        if !self.playing {
            return None;
        }
        let report = self.seek_forward().await;
        if self.navigator.is_last() {
            self.pause();
        }
        report
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Undo the last creation on this frame once `confirm` agrees.
    pub fn undo(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        self.canvas.undo(confirm)
    }

    /// Show or hide labels. Hidden labels cannot be edited.
    pub fn toggle_labels(&mut self) -> bool {
        self.labels_enabled = !self.labels_enabled;
        if !self.labels_enabled {
            self.canvas.deselect_group();
        }
        self.labels_enabled
    }

    pub fn labels_enabled(&self) -> bool {
        self.labels_enabled
    }

    pub fn set_buffer_size(&mut self, buffer_size: u32) {
        self.carry.set_buffer_size(buffer_size);
    }

    pub fn toggle_copy(&mut self) -> CarryMode {
        self.carry.toggle_copy()
    }

    /// Search areas the oracle would use for this frame's boxes.
    pub fn buffer_preview(&self) -> Vec<Rect> {
        self.canvas.buffered_boxes(self.carry.buffer_size())
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.canvas.set_modifiers(modifiers);
    }

    pub fn pointer_down(&mut self, point: Point, now: Instant) {
        if !self.labels_enabled {
            self.canvas.notify(Notice::LabelsDisabled);
            return;
        }
        self.canvas.pointer_down(point, now);
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) {
        if self.labels_enabled {
            self.canvas.pointer_move(point, now);
        }
    }

    pub fn pointer_up(&mut self, point: Point, now: Instant) {
        if self.labels_enabled {
            self.canvas.pointer_up(point, now);
        }
    }

    pub fn click(&mut self, point: Point, now: Instant) {
        if self.labels_enabled {
            self.canvas.click(point, now);
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.canvas.take_notices()
    }

    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasController {
        &mut self.canvas
    }

    pub fn navigator(&self) -> &FrameNavigator {
        &self.navigator
    }

    pub fn carry(&self) -> &CarryOverEngine<O> {
        &self.carry
    }

    pub fn store(&self) -> &LabelStore {
        self.canvas.store()
    }
}
