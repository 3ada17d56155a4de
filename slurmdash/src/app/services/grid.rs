// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Packs a partition's nodes into a near-square heatmap grid.
//!
//! The grid always has one more column than rows, and is the smallest such
//! rectangle that holds every node: `rows` starts at `floor(sqrt(n))` and is
//! bumped by one when `rows * (rows + 1)` would still be too small (for example
//! n = 8 needs 3x4, not 2x3). Node `i` lands in cell `(i / cols, i % cols)`.

use crate::app::types::{GridLayout, NodeLoad, PartitionSnapshot};

/// Returns `(rows, cols)` for `n` items. `n == 0` gives the degenerate `(0, 1)`.
pub fn grid_dimensions(n: usize) -> (usize, usize) {
    let mut rows = isqrt(n);
    if rows * (rows + 1) < n {
        rows += 1;
    }
    (rows, rows + 1)
}

/// Places `selector(node)` for every node in snapshot order, row-major.
/// Nodes the selector has no value for, and the unused tail, become `None`.
pub fn pack<F>(snapshot: &PartitionSnapshot, selector: F) -> GridLayout
where
    F: Fn(&NodeLoad) -> Option<f64>,
{
    let nodes = snapshot.nodes();
    let (rows, cols) = grid_dimensions(nodes.len());
    let mut cells = vec![None; rows * cols];
    for (index, node) in nodes.iter().enumerate() {
        cells[index] = selector(node);
    }
    GridLayout { rows, cols, cells }
}

fn isqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    // Correct float rounding at perfect-square boundaries.
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}
