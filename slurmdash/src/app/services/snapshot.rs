// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::{AppResult, codes};
use crate::app::ports::ClusterQueryPort;
use crate::app::services::normalize::{decode_record, normalize, record_name_hint};
use crate::app::types::{Diagnostics, NodeLoad, PartitionSnapshot, RejectedNode};

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOutcome {
    pub snapshot: PartitionSnapshot,
    pub rejected: Vec<RejectedNode>,
}

/// Queries one partition and normalizes every returned record.
///
/// A failing query is returned as-is (fatal for the partition). A record that
/// cannot be normalized is logged, listed in `rejected` and left out; the rest
/// of the snapshot is unaffected. Response order and duplicates are kept.
#[tracing::instrument(name = "snapshot", level = "debug", skip(query, diagnostics))]
pub async fn build_snapshot(
    query: &dyn ClusterQueryPort,
    partition: &str,
    diagnostics: Diagnostics,
) -> AppResult<SnapshotOutcome> {
    let records = query.query_nodes(partition).await?;
    tracing::debug!("query returned {} records partition={partition}", records.len());

    let mut nodes: Vec<NodeLoad> = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (index, value) in records.iter().enumerate() {
        let result = decode_record(value).and_then(|record| normalize(&record).map(|n| (record, n)));
        match result {
            Ok((record, node)) => {
                if diagnostics.trace_nodes() {
                    if record.cpus.load.minimum != record.cpus.load.maximum {
                        tracing::trace!(
                            "load minimum differs from maximum node={} min={:.2} max={:.2}",
                            node.node_name,
                            node.load_min,
                            node.raw_load
                        );
                    }
                    tracing::trace!(
                        "node={} threads={} allocated={} load={:.2} load_pct={:.2} gres_total={:?} gres_used={:?}",
                        node.node_name,
                        node.thread_count,
                        node.allocated_cpus,
                        node.raw_load,
                        node.load_fraction_pct,
                        node.accelerator_total,
                        node.accelerator_used
                    );
                }
                nodes.push(node);
            }
            Err(err) => {
                let node_name = record_name_hint(value);
                tracing::warn!(
                    code = codes::RECORD_PARSE_ERROR,
                    "skipping node partition={partition} index={index} node={} error={err}",
                    node_name.as_deref().unwrap_or("?")
                );
                rejected.push(RejectedNode {
                    index,
                    node_name,
                    reason: err.to_string(),
                });
            }
        }
    }

    if nodes.is_empty() {
        tracing::info!("partition {partition} has no usable nodes");
    }

    Ok(SnapshotOutcome {
        snapshot: PartitionSnapshot::new(partition, nodes),
        rejected,
    })
}
