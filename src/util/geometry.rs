// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Canvas-relative integer geometry: points, rectangles, the canvas bounds,
//! and the comma-joined cell key that indexes a frame's label map.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset from `origin` to this point.
    pub fn delta_from(&self, origin: Point) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Size of the drawable canvas (the overlay sized to the frame image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: i32,
    pub height: i32,
}

impl CanvasSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle with its top-left corner at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rectangle from two drag corners given in any order.
    pub fn from_corners(start: Point, end: Point) -> Self {
        let x = start.x.min(end.x);
        let y = start.y.min(end.y);
        Self {
            x,
            y,
            w: (end.x - start.x).abs(),
            h: (end.y - start.y).abs(),
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// A rectangle with no extent along either axis.
    pub fn is_degenerate(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Check if a point lies inside the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn moved_to(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.w, self.h)
    }

    /// Smallest rectangle covering every rectangle in `rects`.
    pub fn union<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc: Option<Rect>, r| {
            Some(match acc {
                None => *r,
                Some(u) => {
                    let x = u.x.min(r.x);
                    let y = u.y.min(r.y);
                    Rect::new(x, y, u.right().max(r.right()) - x, u.bottom().max(r.bottom()) - y)
                }
            })
        })
    }

    /// Clip a carried-over box to the canvas.
    ///
    /// The origin is floored at zero and the extent cut back so the box
    /// ends at the canvas edge.
    pub fn clamp_to(&self, canvas: CanvasSize) -> Rect {
        let x = self.x.max(0);
        let y = self.y.max(0);
        Rect::new(x, y, self.w.min(canvas.width - x), self.h.min(canvas.height - y))
    }

    /// Origin for this rectangle moved to `target` but kept fully on the canvas.
    pub fn contain_origin(&self, target: Point, canvas: CanvasSize) -> Point {
        let max_x = (canvas.width - self.w).max(0);
        let max_y = (canvas.height - self.h).max(0);
        Point::new(target.x.clamp(0, max_x), target.y.clamp(0, max_y))
    }

    /// Grow the rectangle by `buffer` pixels on each side, limited to the last
    /// addressable pixel of the canvas.
    pub fn buffered(&self, buffer: i32, canvas: CanvasSize) -> Rect {
        let x1 = (self.x - buffer).max(0);
        let y1 = (self.y - buffer).max(0);
        let x2 = (self.right() + buffer).min(canvas.width - 1);
        let y2 = (self.bottom() + buffer).min(canvas.height - 1);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn key(&self) -> CellKey {
        CellKey::from_rect(self)
    }
}

/// Largest magnitude accepted for a key component; edge sums stay within `i32`.
const MAX_KEY_COMPONENT: i32 = i32::MAX / 4;

/// The `"x,y,w,h"` encoding of a cell's geometry, used as a frame map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    pub fn from_rect(rect: &Rect) -> Self {
        Self(format!("{},{},{},{}", rect.x, rect.y, rect.w, rect.h))
    }

    /// Decode the key back into a rectangle.
    ///
    /// Fractional components (written by older clients) are rounded to the
    /// nearest pixel.
    pub fn parse(&self) -> Result<Rect> {
        let parts: Vec<&str> = self.0.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            bail!("cell key {:?} must have 4 components, found {}", self.0, parts.len());
        }
        let mut values = [0i32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let value: f64 = part
                .parse()
                .with_context(|| format!("invalid component {:?} in cell key {:?}", part, self.0))?;
            let value = value.round();
            if !value.is_finite() || value.abs() > MAX_KEY_COMPONENT as f64 {
                bail!("component {:?} in cell key {:?} is out of range", part, self.0);
            }
            *slot = value as i32;
        }
        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
