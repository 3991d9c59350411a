// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box position oracle interface.
//!
//! The oracle predicts where a box from the previous frame sits in the
//! current one. It is the only asynchronous call in the engine.

use crate::util::geometry::{CellKey, Rect};
use futures::future::LocalBoxFuture;

/// One box to locate in the frame being entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Image of the frame the box was drawn on.
    pub prev_filename: String,
    /// Image of the frame being entered.
    pub curr_filename: String,
    pub bounds: CellKey,
    /// Pixels searched around the box on each side.
    pub buffer_size: u32,
}

/// Outcome of a locate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// The box was found at a new position.
    Refined(Rect),
    /// No better position; keep the original bounds.
    Unrefined,
    /// The call itself failed. The box is not carried.
    Failed(String),
}

/// A box position oracle.
pub trait BoxOracle {
    fn locate<'a>(&'a self, request: &'a OracleRequest) -> LocalBoxFuture<'a, Refinement>;
}

impl<T: BoxOracle + ?Sized> BoxOracle for Box<T> {
    fn locate<'a>(&'a self, request: &'a OracleRequest) -> LocalBoxFuture<'a, Refinement> {
        (**self).locate(request)
    }
}
