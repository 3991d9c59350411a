// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation state engine: cells, the canvas controller and frame carry-over.

pub mod canvas;
pub mod carry_over;
pub mod cell;
pub mod frames;
pub mod group;
pub mod mode;
pub mod notice;
pub mod oracle;
pub mod undo;
