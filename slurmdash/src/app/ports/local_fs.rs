// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::Path;

use async_trait::async_trait;

use crate::app::errors::AppResult;

#[async_trait]
/// Local filesystem boundary for the produced artifacts.
/// Writes replace the destination atomically so readers never see a partial file.
pub trait LocalFilesystemPort: Send + Sync {
    async fn ensure_dir(&self, path: &Path) -> AppResult<()>;
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> AppResult<()>;
    /// Removing a file that does not exist succeeds.
    async fn remove_file(&self, path: &Path) -> AppResult<()>;
}
