// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: label data files, replay scripts and box position oracles.

pub mod luma;
pub mod script;
pub mod scripted;
pub mod serialization;
