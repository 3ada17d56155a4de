// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;
use crate::app::services::summary::SnapshotSummary;
use crate::app::types::PartitionSnapshot;

/// Operator-facing dump of a snapshot (per-node table plus column statistics).
pub trait SnapshotOutputPort: Send + Sync {
    fn emit(&self, snapshot: &PartitionSnapshot, summary: &SnapshotSummary) -> AppResult<()>;
}

#[derive(Clone, Default)]
pub struct NoopSnapshotOutput;

impl SnapshotOutputPort for NoopSnapshotOutput {
    fn emit(&self, _snapshot: &PartitionSnapshot, _summary: &SnapshotSummary) -> AppResult<()> {
        Ok(())
    }
}
