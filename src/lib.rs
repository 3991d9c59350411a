// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! celltag - video frame cell annotation engine
//!
//! Annotators draw labeled boxes ("cells") over the frames of a video.
//! Boxes placed on one frame are carried into the next unvisited frame,
//! optionally moved by a box position oracle.

pub mod app;
pub mod config;
pub mod engine;
pub mod io;
pub mod models;
pub mod navigator;
pub mod util;
