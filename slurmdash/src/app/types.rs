// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// One element of the `sinfo --Node --json` record array, before validation.
pub type RawRecordValue = serde_json::Value;

/// Per-node record as reported by `sinfo --Node --json`.
/// Only the fields the dashboard needs are modelled; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNodeRecord {
    pub nodes: RawNodeNames,
    pub sockets: RawMaximum,
    pub cores: RawMaximum,
    pub threads: RawMaximum,
    pub cpus: RawCpus,
    #[serde(default)]
    pub gres: RawGres,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNodeNames {
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawMaximum {
    pub maximum: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawCpus {
    pub allocated: u32,
    pub load: RawLoad,
}

/// Load as reported by Slurm, in hundredths of one core.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawLoad {
    #[serde(default)]
    pub minimum: f64,
    pub maximum: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGres {
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub used: String,
}

/// Derived metrics for one node in one partition snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLoad {
    pub node_name: String,
    pub thread_count: u32,
    pub allocated_cpus: u32,
    pub raw_load: f64,
    pub load_min: f64,
    pub load_fraction_pct: f64,
    pub allocated_pct: f64,
    pub accelerator_total: Option<u32>,
    pub accelerator_used: Option<u32>,
    pub accelerator_used_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedNode {
    /// Position of the record in the query response.
    pub index: usize,
    pub node_name: Option<String>,
    pub reason: String,
}

/// Nodes of one partition in query-response order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSnapshot {
    partition: String,
    nodes: Vec<NodeLoad>,
}

impl PartitionSnapshot {
    pub fn new(partition: impl Into<String>, nodes: Vec<NodeLoad>) -> Self {
        Self {
            partition: partition.into(),
            nodes,
        }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn nodes(&self) -> &[NodeLoad] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Row-major heatmap cells. `None` marks "no data": either a tail cell past the
/// last node or a node the metric does not apply to. It is never the same as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Option<f64>>,
}

impl GridLayout {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    pub fn is_degenerate(&self) -> bool {
        self.rows == 0
    }

    pub fn has_data(&self) -> bool {
        self.cells.iter().any(Option::is_some)
    }

    pub fn no_data_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }
}

/// Node metric rendered as a heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Load,
    Gpu,
    Alloc,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Load, Metric::Gpu, Metric::Alloc];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Load => "load",
            Metric::Gpu => "gpu",
            Metric::Alloc => "alloc",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Load => "CPU load (% of hardware threads)",
            Metric::Gpu => "Accelerators in use (%)",
            Metric::Alloc => "CPUs allocated (%)",
        }
    }

    pub fn select(self, node: &NodeLoad) -> Option<f64> {
        match self {
            Metric::Load => Some(node.load_fraction_pct),
            Metric::Gpu => node.accelerator_used_pct,
            Metric::Alloc => Some(node.allocated_pct),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown metric '{0}' (expected one of: load, gpu, alloc)")]
pub struct ParseMetricError(String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(Metric::Load),
            "gpu" | "gres" | "accelerator" => Ok(Metric::Gpu),
            "alloc" | "allocated" => Ok(Metric::Alloc),
            _ => Err(ParseMetricError(s.to_string())),
        }
    }
}

/// Diagnostic switches from the command line, passed explicitly to each component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub debug: bool,
    pub verbose: bool,
}

impl Diagnostics {
    /// Per-node dumps are only emitted when both switches are on.
    pub fn trace_nodes(self) -> bool {
        self.debug && self.verbose
    }

    pub fn filter_directive(self) -> &'static str {
        match (self.debug, self.verbose) {
            (true, true) => "trace",
            (true, false) => "debug",
            (false, _) => "info",
        }
    }
}
