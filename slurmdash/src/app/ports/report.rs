// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;
use crate::app::types::Metric;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub metric: Metric,
    /// File name relative to the report document.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartitionStatus {
    Rendered,
    NoNodes,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub partition: String,
    pub node_count: usize,
    /// One line per node record left out of the snapshot.
    pub skipped: Vec<String>,
    pub status: PartitionStatus,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub title: String,
    /// Sections in processing order.
    pub sections: Vec<ReportSection>,
}

/// Assembles the static document that references the rendered images.
pub trait ReportComposerPort: Send + Sync {
    fn file_name(&self) -> &str;
    fn compose(&self, report: &ReportInput) -> AppResult<String>;
}
