// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! A labeled region on the current frame.
//!
//! A cell owns its geometry, its label and its render handle. It never
//! touches the label store: every change is reported to a [`CellObserver`]
//! (the canvas controller), which decides what to persist.

use super::mode::Mode;
use crate::models::label::{LabelId, LabelRing};
use crate::util::geometry::{CellKey, Point, Rect};
use serde::{Deserialize, Serialize};

/// Identity of a live cell, unique within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u64);

/// Why a cell is reporting an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellChange {
    /// The cell was drawn or moved to a new key by the annotator.
    Placed,
    /// The label changed in place.
    Relabeled,
    /// The cell was rebuilt from stored entries.
    Restored,
    /// The cell is between keys and carries no label.
    Vacated,
}

/// Receiver of cell lifecycle events.
pub trait CellObserver {
    fn on_update(&mut self, cell: &Cell, change: CellChange);
    fn on_delete(&mut self, cell: &Cell);
    fn on_selection_changed(&mut self, cell: &Cell, selected: bool);
    fn on_drag_start(&mut self, cell: &Cell);
}

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Toggle group membership (Ctrl).
    pub select: bool,
    /// Delete the clicked cell (Shift).
    pub delete: bool,
}

/// Where the cell is drawn on the canvas. Dragging moves the handle first;
/// the geometry follows when the drag stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHandle {
    pub origin: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    rect: Rect,
    label: Option<LabelId>,
    handle: Option<RenderHandle>,
    selected: bool,
}

impl Cell {
    pub(crate) fn new(id: CellId, rect: Rect, label: LabelId) -> Self {
        Self {
            id,
            rect,
            label: Some(label),
            handle: None,
            selected: false,
        }
    }

    /// Create the render handle and report the cell so it is stored before
    /// any further interaction.
    pub fn render(&mut self, change: CellChange, observer: &mut dyn CellObserver) {
        if self.handle.is_none() {
            self.handle = Some(RenderHandle {
                origin: self.rect.origin(),
            });
            observer.on_update(self, change);
        }
    }

    /// Handle a click on the cell.
    pub fn on_click(
        &mut self,
        mode: Mode,
        modifiers: Modifiers,
        labels: &LabelRing,
        observer: &mut dyn CellObserver,
    ) {
        // The click that ends a drag is not a label change
        if mode == Mode::Dragging {
            return;
        }
        if modifiers.select {
            self.toggle_selection(observer);
        } else if modifiers.delete {
            self.delete(observer);
        } else if let Some(label) = self.label {
            self.label = Some(labels.successor(label));
            observer.on_update(self, CellChange::Relabeled);
        }
    }

    pub fn on_drag_start(&mut self, observer: &mut dyn CellObserver) {
        observer.on_drag_start(self);
    }

    /// Move the rendered cell without committing the new geometry.
    pub fn drag_to(&mut self, origin: Point) {
        if let Some(handle) = self.handle.as_mut() {
            handle.origin = origin;
        }
    }

    /// Commit the rendered position as the cell's geometry.
    ///
    /// The store is keyed by geometry, so a move is reported as the cell
    /// leaving its old key without a label, then arriving at the new key.
    pub fn on_drag_stop(&mut self, observer: &mut dyn CellObserver) {
        if let Some(label) = self.vacate(observer) {
            self.settle(label, observer);
        }
    }

    /// First half of a move: leave the old key.
    pub(crate) fn vacate(&mut self, observer: &mut dyn CellObserver) -> Option<LabelId> {
        self.handle?;
        let label = self.label.take()?;
        observer.on_update(self, CellChange::Vacated);
        Some(label)
    }

    /// Second half of a move: take the rendered position and its key.
    pub(crate) fn settle(&mut self, label: LabelId, observer: &mut dyn CellObserver) {
        let Some(handle) = self.handle else {
            return;
        };
        self.rect = self.rect.moved_to(handle.origin);
        self.label = Some(label);
        observer.on_update(self, CellChange::Placed);
    }

    /// Remove the cell from the canvas and report the deletion.
    pub fn delete(&mut self, observer: &mut dyn CellObserver) {
        if self.handle.is_none() {
            return;
        }
        self.label = None;
        self.handle = None;
        self.selected = false;
        observer.on_delete(self);
    }

    pub fn toggle_selection(&mut self, observer: &mut dyn CellObserver) {
        self.selected = !self.selected;
        observer.on_selection_changed(self, self.selected);
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn key(&self) -> CellKey {
        self.rect.key()
    }

    pub fn label(&self) -> Option<LabelId> {
        self.label
    }

    pub fn is_rendered(&self) -> bool {
        self.handle.is_some()
    }

    /// The rectangle as currently drawn, which differs from [`Cell::rect`]
    /// while a drag is in progress.
    pub fn rendered_rect(&self) -> Option<Rect> {
        self.handle.map(|h| self.rect.moved_to(h.origin))
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}
