// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod cluster_query;
pub mod local_fs;
pub mod renderer;
pub mod report;
pub mod snapshot_output;

pub use cluster_query::ClusterQueryPort;
pub use local_fs::LocalFilesystemPort;
pub use renderer::HeatmapRendererPort;
pub use report::{ImageRef, PartitionStatus, ReportComposerPort, ReportInput, ReportSection};
pub use snapshot_output::{NoopSnapshotOutput, SnapshotOutputPort};
