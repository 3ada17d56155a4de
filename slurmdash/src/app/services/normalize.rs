// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Deserialize;

use crate::app::services::gres::{self, GresParseError};
use crate::app::types::{NodeLoad, RawNodeRecord, RawRecordValue};

/// Slurm reports load in hundredths of one core.
const LOAD_SCALE: f64 = 100.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecordError {
    #[error("malformed node record: {0}")]
    Malformed(String),
    #[error("node record has no node name")]
    MissingName,
    #[error(
        "node reports zero hardware threads (sockets={sockets}, cores={cores}, threads={threads})"
    )]
    ZeroThreads { sockets: u32, cores: u32, threads: u32 },
    #[error("invalid gres {field} description: {source}")]
    Gres {
        field: &'static str,
        #[source]
        source: GresParseError,
    },
}

/// Decodes one element of the query response into the typed record.
pub fn decode_record(value: &RawRecordValue) -> Result<RawNodeRecord, RecordError> {
    RawNodeRecord::deserialize(value).map_err(|err| RecordError::Malformed(err.to_string()))
}

/// Best-effort node name for diagnostics about records that failed to decode.
pub fn record_name_hint(value: &RawRecordValue) -> Option<String> {
    value
        .pointer("/nodes/nodes/0")
        .and_then(|name| name.as_str())
        .map(str::to_string)
}

pub fn normalize(record: &RawNodeRecord) -> Result<NodeLoad, RecordError> {
    let node_name = record
        .nodes
        .nodes
        .first()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .ok_or(RecordError::MissingName)?
        .to_string();

    let sockets = record.sockets.maximum;
    let cores = record.cores.maximum;
    let threads = record.threads.maximum;
    let thread_count = sockets
        .checked_mul(cores)
        .and_then(|value| value.checked_mul(threads))
        .filter(|value| *value > 0)
        .ok_or(RecordError::ZeroThreads {
            sockets,
            cores,
            threads,
        })?;

    let raw_load = record.cpus.load.maximum / LOAD_SCALE;
    let load_min = record.cpus.load.minimum / LOAD_SCALE;
    let load_fraction_pct = raw_load / f64::from(thread_count) * 100.0;
    let allocated_pct = f64::from(record.cpus.allocated) / f64::from(thread_count) * 100.0;

    let (accelerator_total, accelerator_used) = accelerators(&record.gres.total, &record.gres.used)?;
    let accelerator_used_pct = match (accelerator_total, accelerator_used) {
        (Some(total), Some(used)) if total > 0 => Some(f64::from(used) / f64::from(total) * 100.0),
        _ => None,
    };

    Ok(NodeLoad {
        node_name,
        thread_count,
        allocated_cpus: record.cpus.allocated,
        raw_load,
        load_min,
        load_fraction_pct,
        allocated_pct,
        accelerator_total,
        accelerator_used,
        accelerator_used_pct,
    })
}

/// Usage is counted in the resource type the total lists first, whatever order `used` lists it in.
fn accelerators(total: &str, used: &str) -> Result<(Option<u32>, Option<u32>), RecordError> {
    if gres::is_absent(total) {
        return Ok((None, None));
    }
    let total_entries = gres::parse_gres(total).map_err(|source| RecordError::Gres {
        field: "total",
        source,
    })?;
    let Some(kind) = gres::primary_kind(&total_entries) else {
        return Ok((None, None));
    };
    let total = gres::count_of_kind(&total_entries, kind);
    let used = if gres::is_absent(used) {
        0
    } else {
        let used_entries = gres::parse_gres(used).map_err(|source| RecordError::Gres {
            field: "used",
            source,
        })?;
        gres::count_of_kind(&used_entries, kind)
    };
    Ok((Some(total), Some(used)))
}
