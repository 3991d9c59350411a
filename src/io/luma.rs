// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Reference box position oracle over grayscale frames.
//!
//! The search area is the box grown by the buffer. Pixels of the entered
//! frame above the luma threshold are grouped into 4-connected components,
//! and the box is centred on the single largest one.

use crate::engine::oracle::{BoxOracle, OracleRequest, Refinement};
use crate::models::session::EngineSettings;
use crate::util::geometry::{CanvasSize, Rect};
use anyhow::{bail, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An 8-bit grayscale frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct LumaFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl LumaFrame {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != width * height {
            bail!(
                "frame of {}x{} needs {} pixels, got {}",
                width,
                height,
                width * height,
                pixels.len()
            );
        }
        Ok(Self { width, height, pixels })
    }

    /// A frame filled with one value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.pixels[y * self.width + x] = value;
    }

    /// Paint a filled rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, rect: Rect, value: u8) {
        let x0 = rect.x.max(0) as usize;
        let y0 = rect.y.max(0) as usize;
        let x1 = (rect.right().max(0) as usize).min(self.width);
        let y1 = (rect.bottom().max(0) as usize).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, value);
            }
        }
    }

    fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width as i32, self.height as i32)
    }
}

#[derive(Deserialize)]
struct RawFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl TryFrom<RawFrame> for LumaFrame {
    type Error = anyhow::Error;

    fn try_from(raw: RawFrame) -> Result<Self> {
        LumaFrame::new(raw.width, raw.height, raw.pixels)
    }
}

/// Lookup of decoded frames by file name.
pub trait FrameSource {
    fn frame(&self, file: &str) -> Option<&LumaFrame>;
}

impl FrameSource for HashMap<String, LumaFrame> {
    fn frame(&self, file: &str) -> Option<&LumaFrame> {
        self.get(file)
    }
}

/// Box position oracle that tracks the brightest blob near each box.
pub struct LumaOracle<S: FrameSource> {
    source: S,
    max_size: i32,
    pixel_threshold: u8,
}

impl<S: FrameSource> LumaOracle<S> {
    pub fn new(source: S, settings: &EngineSettings) -> Self {
        Self {
            source,
            max_size: settings.box_area_max_size,
            pixel_threshold: settings.box_pixel_threshold,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn refine(&self, request: &OracleRequest) -> Refinement {
        let bounds = match request.bounds.parse() {
            Ok(bounds) => bounds,
            Err(err) => return Refinement::Failed(format!("{:#}", err)),
        };
        if bounds.w > self.max_size || bounds.h > self.max_size {
            log::debug!("Box {} exceeds {} px, not refined", request.bounds, self.max_size);
            return Refinement::Unrefined;
        }

        let Some(prev) = self.source.frame(&request.prev_filename) else {
            return Refinement::Failed(format!("frame {} not found", request.prev_filename));
        };
        let Some(curr) = self.source.frame(&request.curr_filename) else {
            return Refinement::Failed(format!("frame {} not found", request.curr_filename));
        };

        let area = bounds.buffered(request.buffer_size as i32, prev.size());
        if area.w <= 0 || area.h <= 0 {
            return Refinement::Unrefined;
        }
        if area.right() > curr.width as i32 || area.bottom() > curr.height as i32 {
            return Refinement::Failed(format!(
                "search area {} lies outside {} ({}x{})",
                area.key(),
                request.curr_filename,
                curr.width,
                curr.height
            ));
        }

        let (w, h) = (area.w as usize, area.h as usize);
        let mut mask = vec![false; w * h];
        for y in 0..h {
            for x in 0..w {
                let value = curr.get(area.x as usize + x, area.y as usize + y);
                mask[y * w + x] = value > self.pixel_threshold;
            }
        }

        match largest_component_midpoint(&mask, w, h) {
            Some((mid_x, mid_y)) => Refinement::Refined(Rect::new(
                area.x + mid_x - bounds.w / 2,
                area.y + mid_y - bounds.h / 2,
                bounds.w,
                bounds.h,
            )),
            None => Refinement::Unrefined,
        }
    }
}

impl<S: FrameSource> BoxOracle for LumaOracle<S> {
    fn locate<'a>(&'a self, request: &'a OracleRequest) -> LocalBoxFuture<'a, Refinement> {
        async move { self.refine(request) }.boxed_local()
    }
}

/// Midpoint of the bounding box of the largest 4-connected set of bright
/// pixels. Single pixels do not count, and a tie for largest has no answer.
fn largest_component_midpoint(mask: &[bool], width: usize, height: usize) -> Option<(i32, i32)> {
    let mut visited = vec![false; mask.len()];
    let mut best: Option<(usize, (usize, usize, usize, usize))> = None;
    let mut tied = false;

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![start];
        let mut size = 0;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);

        while let Some(index) = stack.pop() {
            size += 1;
            let (x, y) = (index % width, index / width);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let neighbours = [
                (x > 0).then(|| index - 1),
                (x + 1 < width).then(|| index + 1),
                (y > 0).then(|| index - width),
                (y + 1 < height).then(|| index + width),
            ];
            for next in neighbours.into_iter().flatten() {
                if mask[next] && !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        if size < 2 {
            continue;
        }
        match best {
            Some((best_size, _)) if size < best_size => {}
            Some((best_size, _)) if size == best_size => tied = true,
            _ => {
                best = Some((size, (min_x, min_y, max_x, max_y)));
                tied = false;
            }
        }
    }

    if tied {
        return None;
    }
    best.map(|(_, (min_x, min_y, max_x, max_y))| {
        let mid_x = min_x + (max_x - min_x) / 2;
        let mid_y = min_y + (max_y - min_y) / 2;
        (mid_x as i32, mid_y as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::CellKey;
    use futures::executor::block_on;

    fn oracle(curr: LumaFrame) -> LumaOracle<HashMap<String, LumaFrame>> {
        let mut frames = HashMap::new();
        frames.insert("prev.jpg".to_string(), LumaFrame::filled(30, 30, 0));
        frames.insert("curr.jpg".to_string(), curr);
        LumaOracle::new(frames, &EngineSettings::default())
    }

    fn request(bounds: &str, buffer_size: u32) -> OracleRequest {
        OracleRequest {
            prev_filename: "prev.jpg".into(),
            curr_filename: "curr.jpg".into(),
            bounds: CellKey::from(bounds),
            buffer_size,
        }
    }

    #[test]
    fn test_frame_size_is_checked() {
        assert!(LumaFrame::new(3, 2, vec![0; 5]).is_err());
        assert!(LumaFrame::new(3, 2, vec![0; 6]).is_ok());

        let bad = serde_json::from_str::<LumaFrame>(r#"{"width": 2, "height": 2, "pixels": [0, 0, 0]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_centres_box_on_blob() {
        let mut curr = LumaFrame::filled(30, 30, 0);
        curr.fill_rect(Rect::new(14, 12, 4, 4), 255);
        let oracle = oracle(curr);

        // Search area is 7,7,12,12; blob spans local x 7..=10, y 5..=8
        let result = block_on(oracle.locate(&request("10,10,6,6", 3)));
        assert_eq!(result, Refinement::Refined(Rect::new(12, 10, 6, 6)));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut curr = LumaFrame::filled(30, 30, 0);
        curr.fill_rect(Rect::new(14, 12, 4, 4), 128);
        let result = block_on(oracle(curr).locate(&request("10,10,6,6", 3)));
        assert_eq!(result, Refinement::Unrefined);
    }

    #[test]
    fn test_largest_component_wins() {
        let mut curr = LumaFrame::filled(30, 30, 0);
        curr.fill_rect(Rect::new(8, 8, 2, 1), 255);
        curr.fill_rect(Rect::new(14, 12, 3, 3), 255);
        let result = block_on(oracle(curr).locate(&request("10,10,6,6", 3)));
        // Largest blob spans local x 7..=9, y 5..=7
        assert_eq!(result, Refinement::Refined(Rect::new(12, 10, 6, 6)));
    }

    #[test]
    fn test_tie_and_specks_are_unrefined() {
        let mut tie = LumaFrame::filled(30, 30, 0);
        tie.fill_rect(Rect::new(8, 8, 2, 1), 255);
        tie.fill_rect(Rect::new(14, 14, 1, 2), 255);
        assert_eq!(block_on(oracle(tie).locate(&request("10,10,6,6", 3))), Refinement::Unrefined);

        let mut specks = LumaFrame::filled(30, 30, 0);
        specks.set(9, 9, 255);
        specks.set(11, 11, 255);
        assert_eq!(block_on(oracle(specks).locate(&request("10,10,6,6", 3))), Refinement::Unrefined);
    }

    #[test]
    fn test_oversize_box_is_unrefined() {
        let mut settings = EngineSettings::default();
        settings.box_area_max_size = 5;
        let mut frames = HashMap::new();
        frames.insert("curr.jpg".to_string(), LumaFrame::filled(30, 30, 255));
        let oracle = LumaOracle::new(frames, &settings);
        // Frames are not even read for oversize boxes
        assert_eq!(block_on(oracle.locate(&request("10,10,6,6", 3))), Refinement::Unrefined);
    }

    #[test]
    fn test_missing_frame_fails() {
        let mut oracle = oracle(LumaFrame::filled(30, 30, 0));
        oracle.source_mut().remove("curr.jpg");
        let result = block_on(oracle.locate(&request("10,10,6,6", 3)));
        assert!(matches!(result, Refinement::Failed(reason) if reason.contains("curr.jpg")));
    }
}
