// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::{NodeLoad, PartitionSnapshot};

/// Descriptive statistics of one numeric column, absent values skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub partition: String,
    pub columns: Vec<(&'static str, Option<ColumnStats>)>,
}

pub fn summarize(snapshot: &PartitionSnapshot) -> SnapshotSummary {
    let nodes = snapshot.nodes();
    let column = |select: &dyn Fn(&NodeLoad) -> Option<f64>| {
        column_stats(nodes.iter().filter_map(select).collect())
    };
    SnapshotSummary {
        partition: snapshot.partition().to_string(),
        columns: vec![
            ("threads", column(&|n| Some(f64::from(n.thread_count)))),
            ("allocated", column(&|n| Some(f64::from(n.allocated_cpus)))),
            ("load", column(&|n| Some(n.raw_load))),
            ("load %", column(&|n| Some(n.load_fraction_pct))),
            ("gres total", column(&|n| n.accelerator_total.map(f64::from))),
            ("gres used", column(&|n| n.accelerator_used.map(f64::from))),
            ("gres %", column(&|n| n.accelerator_used_pct)),
        ],
    }
}

pub fn column_stats(mut values: Vec<f64>) -> Option<ColumnStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        f64::NAN
    } else {
        let sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sq / (count - 1) as f64).sqrt()
    };
    Some(ColumnStats {
        count,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
