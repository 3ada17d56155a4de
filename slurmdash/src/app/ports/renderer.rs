// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;
use crate::app::types::{GridLayout, Metric};

/// Lower and upper bound of the colour scale, identical for every image.
pub const SCALE_MIN: f64 = 0.0;
pub const SCALE_MAX: f64 = 100.0;

/// Turns a packed grid into an encoded image.
///
/// Implementations must map values onto the fixed `[SCALE_MIN, SCALE_MAX]`
/// scale regardless of the data range, draw no axis tick labels, and render
/// `None` cells in a way that cannot be mistaken for 0%.
pub trait HeatmapRendererPort: Send + Sync {
    fn file_extension(&self) -> &'static str;
    fn render(&self, grid: &GridLayout, partition: &str, metric: Metric) -> AppResult<Vec<u8>>;
}
