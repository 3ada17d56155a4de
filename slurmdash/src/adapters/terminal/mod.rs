// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io::Write;

use crate::app::errors::{AppResult, local_error};
use crate::app::ports::SnapshotOutputPort;
use crate::app::services::summary::SnapshotSummary;
use crate::app::types::PartitionSnapshot;

/// Prints the node table and column statistics to stdout.
#[derive(Clone, Default)]
pub struct StdoutTable;

impl StdoutTable {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotOutputPort for StdoutTable {
    fn emit(&self, snapshot: &PartitionSnapshot, summary: &SnapshotSummary) -> AppResult<()> {
        let mut out = std::io::stdout().lock();
        let text = format!(
            "partition {}\n\n{}\n{}",
            summary.partition,
            format_nodes_table(snapshot),
            format_summary_table(summary)
        );
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|err| local_error(format!("failed to write node table: {err}")))
    }
}

pub fn format_nodes_table(snapshot: &PartitionSnapshot) -> String {
    if snapshot.is_empty() {
        return "No nodes\n".to_string();
    }

    let headers = [
        "node",
        "threads",
        "allocated",
        "load",
        "load %",
        "gres total",
        "gres used",
        "gres %",
    ];
    let rows: Vec<[String; 8]> = snapshot
        .nodes()
        .iter()
        .map(|node| {
            [
                node.node_name.clone(),
                node.thread_count.to_string(),
                node.allocated_cpus.to_string(),
                format!("{:.2}", node.raw_load),
                format!("{:.2}", node.load_fraction_pct),
                optional(node.accelerator_total.map(|v| v.to_string())),
                optional(node.accelerator_used.map(|v| v.to_string())),
                optional(node.accelerator_used_pct.map(|v| format!("{v:.2}"))),
            ]
        })
        .collect();

    let mut widths = headers.map(str_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(str_width(cell));
        }
    }

    let mut output = String::new();
    push_row(&mut output, &headers, &widths);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut output, &cells, &widths);
    }
    output
}

pub fn format_summary_table(summary: &SnapshotSummary) -> String {
    let stat_names = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    let mut headers: Vec<&str> = vec![""];
    headers.extend(summary.columns.iter().map(|(name, _)| *name));

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(stat_names.len());
    for (idx, stat) in stat_names.iter().enumerate() {
        let mut row = vec![stat.to_string()];
        for (_, stats) in &summary.columns {
            let cell = match stats {
                None => "-".to_string(),
                Some(s) if idx == 0 => s.count.to_string(),
                Some(s) => {
                    let value = [s.mean, s.std, s.min, s.p25, s.p50, s.p75, s.max][idx - 1];
                    if value.is_nan() {
                        "NaN".to_string()
                    } else {
                        format!("{value:.2}")
                    }
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| str_width(h)).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(str_width(cell));
        }
    }

    let mut output = String::new();
    push_row(&mut output, &headers, &widths);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut output, &cells, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    output.push_str(line.join("  ").trim_end());
    output.push('\n');
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn str_width(value: &str) -> usize {
    value.chars().count()
}
