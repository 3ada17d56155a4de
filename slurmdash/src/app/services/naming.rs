// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::Metric;

/// File name of the heatmap for one (partition, metric) pair.
/// Stable across runs so each run overwrites the previous image.
pub fn image_file_name(partition: &str, metric: Metric, extension: &str) -> String {
    format!(
        "heatmap_{}_{}.{}",
        sanitize_component(partition),
        metric.as_str(),
        extension
    )
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
