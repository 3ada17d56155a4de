// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::RawRecordValue;

#[async_trait]
/// Cluster resource manager boundary.
/// Returns the per-node records of one partition in response order, or fails
/// with a `query_failure` error; never a silently truncated set.
pub trait ClusterQueryPort: Send + Sync {
    async fn query_nodes(&self, partition: &str) -> AppResult<Vec<RawRecordValue>>;
}
