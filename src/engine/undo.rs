// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounded undo stack of cell creations.

use super::cell::CellId;
use std::collections::VecDeque;

/// Undo history for cell creation.
///
/// Only creations are recorded. When full, pushing evicts the oldest entry;
/// eviction forgets the entry without touching the cell itself.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<CellId>,
    /// Maximum history size
    max_size: usize,
}

impl UndoStack {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Record a newly created cell.
    pub fn push(&mut self, id: CellId) {
        if self.entries.len() == self.max_size {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("Undo history full, forgetting cell {:?}", evicted);
            }
        }
        self.entries.push_back(id);
    }

    /// Take the most recent creation.
    pub fn pop(&mut self) -> Option<CellId> {
        self.entries.pop_back()
    }

    /// Forget a cell that was deleted by other means.
    pub fn remove(&mut self, id: CellId) {
        self.entries.retain(|entry| *entry != id);
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.entries.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
