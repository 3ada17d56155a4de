// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::app::errors::{AppResult, local_error};
use crate::app::ports::LocalFilesystemPort;

#[derive(Clone, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalFilesystemPort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "ensure_dir", path = %path.display()))]
    async fn ensure_dir(&self, path: &Path) -> AppResult<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(path).map_err(|err| {
            local_error(format!(
                "failed to create output directory {}: {err}",
                path.display()
            ))
        })
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path, contents), fields(op = "write_atomic", path = %path.display(), bytes = contents.len()))]
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> AppResult<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| {
            local_error(format!(
                "failed to create temporary file in {}: {err}",
                dir.display()
            ))
        })?;
        tmp.write_all(contents)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| local_error(format!("failed to write {}: {err}", path.display())))?;
        tmp.persist(path).map_err(|err| {
            local_error(format!("failed to replace {}: {}", path.display(), err.error))
        })?;
        Ok(())
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "remove_file", path = %path.display()))]
    async fn remove_file(&self, path: &Path) -> AppResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(local_error(format!(
                "failed to remove {}: {err}",
                path.display()
            ))),
        }
    }
}
