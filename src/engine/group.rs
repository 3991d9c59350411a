// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Group selection.
//!
//! Selected cells are dragged together through a wrapper covering all of
//! them. Hit-testing uses the member rectangles plus any marquee rectangle
//! the group was selected with, so a click in the gaps between members
//! still deselects the group.

use super::cell::CellId;
use crate::util::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A group member described by value, for re-selection on another frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub rect: Rect,
    pub label: String,
}

/// The active group selection.
#[derive(Debug, Clone, Default)]
pub struct GroupSelection {
    members: Vec<(CellId, Rect)>,
    marquees: Vec<Rect>,
}

impl GroupSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.members.iter().any(|(member, _)| *member == id)
    }

    /// Add a member. Adding an existing member only refreshes its rectangle.
    pub fn add(&mut self, id: CellId, rect: Rect) {
        match self.members.iter_mut().find(|(member, _)| *member == id) {
            Some(entry) => entry.1 = rect,
            None => self.members.push((id, rect)),
        }
    }

    /// Remove a member. The group dissolves with its last member.
    pub fn remove(&mut self, id: CellId) {
        self.members.retain(|(member, _)| *member != id);
        if self.members.is_empty() {
            self.marquees.clear();
        }
    }

    /// Record a marquee rectangle as part of the group's hit area.
    pub fn add_marquee(&mut self, rect: Rect) {
        self.marquees.push(rect);
    }

    pub fn member_ids(&self) -> Vec<CellId> {
        self.members.iter().map(|(id, _)| *id).collect()
    }

    /// Rectangles used for hit-testing.
    pub fn areas(&self) -> impl Iterator<Item = &Rect> {
        self.members.iter().map(|(_, rect)| rect).chain(self.marquees.iter())
    }

    /// Union of all member rectangles.
    pub fn wrapper(&self) -> Option<Rect> {
        Rect::union(self.members.iter().map(|(_, rect)| rect))
    }

    /// Check if a point falls inside any recorded group rectangle.
    pub fn hit(&self, point: Point) -> bool {
        self.areas().any(|area| area.contains(point))
    }

    /// Shift every recorded rectangle by the same offset.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for (_, rect) in self.members.iter_mut() {
            *rect = rect.translated(dx, dy);
        }
        for rect in self.marquees.iter_mut() {
            *rect = rect.translated(dx, dy);
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.marquees.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut group = GroupSelection::new();
        group.add(CellId(1), Rect::new(0, 0, 10, 10));
        group.add(CellId(1), Rect::new(5, 5, 10, 10));
        assert_eq!(group.member_ids(), vec![CellId(1)]);
        assert_eq!(group.wrapper(), Some(Rect::new(5, 5, 10, 10)));
    }

    #[test]
    fn test_hit_uses_member_rectangles_not_wrapper() {
        let mut group = GroupSelection::new();
        group.add(CellId(1), Rect::new(0, 0, 10, 10));
        group.add(CellId(2), Rect::new(50, 50, 10, 10));

        assert_eq!(group.wrapper(), Some(Rect::new(0, 0, 60, 60)));
        assert!(group.hit(Point::new(5, 5)));
        assert!(group.hit(Point::new(55, 55)));
        // Inside the wrapper but between members
        assert!(!group.hit(Point::new(30, 30)));

        group.add_marquee(Rect::new(0, 0, 60, 60));
        assert!(group.hit(Point::new(30, 30)));
    }

    #[test]
    fn test_remove_last_member_dissolves() {
        let mut group = GroupSelection::new();
        group.add(CellId(1), Rect::new(0, 0, 10, 10));
        group.add_marquee(Rect::new(0, 0, 20, 20));
        group.remove(CellId(1));
        assert!(!group.is_active());
        assert!(!group.hit(Point::new(15, 15)));
    }

    #[test]
    fn test_translate() {
        let mut group = GroupSelection::new();
        group.add(CellId(1), Rect::new(0, 0, 10, 10));
        group.translate(3, -2);
        assert_eq!(group.wrapper(), Some(Rect::new(3, -2, 10, 10)));
    }
}
