// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the annotation session.

pub mod label;
pub mod session;
pub mod store;
