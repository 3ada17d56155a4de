// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{
    ClusterQueryPort, HeatmapRendererPort, ImageRef, LocalFilesystemPort, PartitionStatus,
    ReportComposerPort, ReportInput, ReportSection, SnapshotOutputPort,
};
use crate::app::services::{grid, naming, snapshot, summary};
use crate::app::types::{Diagnostics, Metric, PartitionSnapshot, RejectedNode};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub metrics: Vec<Metric>,
    pub report_title: String,
    pub diagnostics: Diagnostics,
    pub print_table: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    pub partition: String,
    pub status: PartitionStatus,
    pub node_count: usize,
    pub rejected: Vec<RejectedNode>,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcomes: Vec<PartitionOutcome>,
    pub report_path: PathBuf,
}

impl RunSummary {
    pub fn failed_partitions(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, PartitionStatus::Failed(_)))
            .map(|outcome| outcome.partition.as_str())
            .collect()
    }
}

#[derive(Clone)]
pub struct UseCases {
    pub(crate) query: Arc<dyn ClusterQueryPort>,
    pub(crate) renderer: Arc<dyn HeatmapRendererPort>,
    pub(crate) report: Arc<dyn ReportComposerPort>,
    pub(crate) local_fs: Arc<dyn LocalFilesystemPort>,
    pub(crate) snapshot_output: Arc<dyn SnapshotOutputPort>,
}

impl UseCases {
    pub fn new(
        query: Arc<dyn ClusterQueryPort>,
        renderer: Arc<dyn HeatmapRendererPort>,
        report: Arc<dyn ReportComposerPort>,
        local_fs: Arc<dyn LocalFilesystemPort>,
        snapshot_output: Arc<dyn SnapshotOutputPort>,
    ) -> Self {
        Self {
            query,
            renderer,
            report,
            local_fs,
            snapshot_output,
        }
    }

    /// Processes every partition in the given order, then writes the report.
    ///
    /// A partition that fails is recorded and the remaining partitions still
    /// run; only output-directory and report errors abort the run.
    pub async fn run(&self, partitions: &[String], options: &RunOptions) -> AppResult<RunSummary> {
        self.local_fs.ensure_dir(&options.output_dir).await?;

        let mut outcomes = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let outcome = self.process_partition(partition, options).await;
            outcomes.push(outcome);
        }

        let input = ReportInput {
            title: options.report_title.clone(),
            sections: outcomes
                .iter()
                .map(|outcome| ReportSection {
                    partition: outcome.partition.clone(),
                    node_count: outcome.node_count,
                    skipped: outcome.rejected.iter().map(describe_rejected).collect(),
                    status: outcome.status.clone(),
                    images: outcome.images.clone(),
                })
                .collect(),
        };
        let document = self.report.compose(&input)?;
        let report_path = options.output_dir.join(self.report.file_name());
        self.local_fs
            .write_atomic(&report_path, document.as_bytes())
            .await?;
        tracing::info!("report written to {}", report_path.display());

        Ok(RunSummary {
            outcomes,
            report_path,
        })
    }

    /// Heatmaps from earlier runs are removed first, so a partition that fails
    /// or has nothing to draw never leaves an outdated image behind.
    #[tracing::instrument(name = "partition", level = "info", skip(self, options))]
    pub async fn process_partition(&self, partition: &str, options: &RunOptions) -> PartitionOutcome {
        if let Err(err) = self.clear_heatmaps(partition, options).await {
            tracing::error!(
                code = err.code(),
                kind = ?err.kind(),
                "could not clear previous heatmaps for partition {partition}: {err}"
            );
            return failed_outcome(partition, &err);
        }

        let outcome =
            match snapshot::build_snapshot(self.query.as_ref(), partition, options.diagnostics).await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(
                        code = err.code(),
                        kind = ?err.kind(),
                        "query failed for partition {partition}: {err}"
                    );
                    return failed_outcome(partition, &err);
                }
            };
        let snapshot::SnapshotOutcome { snapshot, rejected } = outcome;

        let mut result = PartitionOutcome {
            partition: partition.to_string(),
            status: PartitionStatus::Rendered,
            node_count: snapshot.len(),
            rejected,
            images: Vec::new(),
        };

        if options.print_table {
            let stats = summary::summarize(&snapshot);
            if let Err(err) = self.snapshot_output.emit(&snapshot, &stats) {
                tracing::warn!("failed to print node table for partition {partition}: {err}");
            }
        }

        if snapshot.is_empty() {
            tracing::info!("partition {partition} returned no nodes; skipping heatmaps");
            result.status = PartitionStatus::NoNodes;
            return result;
        }

        match self.render_heatmaps(&snapshot, options).await {
            Ok(images) => result.images = images,
            Err(err) => {
                tracing::error!(
                    code = err.code(),
                    kind = ?err.kind(),
                    "rendering failed for partition {partition}: {err}"
                );
                // A failed partition is reported without images.
                if let Err(cleanup) = self.clear_heatmaps(partition, options).await {
                    tracing::warn!(
                        "failed to remove partial heatmaps for partition {partition}: {cleanup}"
                    );
                }
                result.status = PartitionStatus::Failed(err.to_string());
            }
        }
        result
    }

    /// Removes the image of every known metric, including metrics this run does not draw.
    async fn clear_heatmaps(&self, partition: &str, options: &RunOptions) -> AppResult<()> {
        for metric in Metric::ALL {
            let file_name =
                naming::image_file_name(partition, metric, self.renderer.file_extension());
            self.local_fs
                .remove_file(&options.output_dir.join(file_name))
                .await
                .map_err(|err: AppError| err.with_context(format!("partition={partition}")))?;
        }
        Ok(())
    }

    async fn render_heatmaps(
        &self,
        snapshot: &PartitionSnapshot,
        options: &RunOptions,
    ) -> AppResult<Vec<ImageRef>> {
        let partition = snapshot.partition();
        let mut images = Vec::with_capacity(options.metrics.len());
        for metric in &options.metrics {
            let metric = *metric;
            let layout = grid::pack(snapshot, |node| metric.select(node));
            if !layout.has_data() {
                tracing::info!("no {metric} data in partition {partition}; heatmap skipped");
                continue;
            }
            tracing::debug!(
                "packed {} nodes into {}x{} grid metric={metric} empty_cells={}",
                snapshot.len(),
                layout.rows,
                layout.cols,
                layout.no_data_count()
            );
            let bytes = self.renderer.render(&layout, partition, metric)?;
            let file_name =
                naming::image_file_name(partition, metric, self.renderer.file_extension());
            let path = options.output_dir.join(&file_name);
            self.local_fs
                .write_atomic(&path, &bytes)
                .await
                .map_err(|err: AppError| err.with_context(format!("partition={partition}")))?;
            tracing::info!("wrote {}", path.display());
            images.push(ImageRef { metric, file_name });
        }
        Ok(images)
    }
}

fn failed_outcome(partition: &str, err: &AppError) -> PartitionOutcome {
    PartitionOutcome {
        partition: partition.to_string(),
        status: PartitionStatus::Failed(err.to_string()),
        node_count: 0,
        rejected: Vec::new(),
        images: Vec::new(),
    }
}

fn describe_rejected(node: &RejectedNode) -> String {
    format!(
        "{} (record {}): {}",
        node.node_name.as_deref().unwrap_or("unnamed"),
        node.index,
        node.reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    use serde_json::Value;
    use tempfile::TempDir;

    use crate::adapters::fs::LocalFilesystem;
    use crate::app::errors::{AppErrorKind, codes, local_error, query_failure};
    use crate::app::services::snapshot::tests::node_json;
    use crate::app::ports::NoopSnapshotOutput;
    use crate::app::services::summary::SnapshotSummary;
    use crate::app::types::GridLayout;

    struct MapQuery {
        responses: Mutex<HashMap<String, AppResult<Vec<Value>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MapQuery {
        fn new(responses: Vec<(&str, AppResult<Vec<Value>>)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(name, response)| (name.to_string(), response))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait::async_trait]
    impl ClusterQueryPort for MapQuery {
        async fn query_nodes(&self, partition: &str) -> AppResult<Vec<Value>> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(partition.to_string());
            self.responses
                .lock()
                .expect("responses lock")
                .remove(partition)
                .unwrap_or_else(|| panic!("unexpected query for partition {partition}"))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        grids: Mutex<Vec<(String, Metric, GridLayout)>>,
        fail_on: Option<Metric>,
    }

    impl HeatmapRendererPort for RecordingRenderer {
        fn file_extension(&self) -> &'static str {
            "txt"
        }

        fn render(&self, grid: &GridLayout, partition: &str, metric: Metric) -> AppResult<Vec<u8>> {
            if self.fail_on == Some(metric) {
                return Err(AppError::with_message(
                    AppErrorKind::Internal,
                    codes::RENDER_FAILURE,
                    "renderer exploded",
                ));
            }
            self.grids
                .lock()
                .expect("grids lock")
                .push((partition.to_string(), metric, grid.clone()));
            Ok(format!("{partition}:{metric}:{}x{}", grid.rows, grid.cols).into_bytes())
        }
    }

    struct ListingReport;

    impl ReportComposerPort for ListingReport {
        fn file_name(&self) -> &str {
            "index.txt"
        }

        fn compose(&self, report: &ReportInput) -> AppResult<String> {
            let lines: Vec<String> = report
                .sections
                .iter()
                .map(|section| {
                    let images: Vec<&str> = section
                        .images
                        .iter()
                        .map(|image| image.file_name.as_str())
                        .collect();
                    format!("{} {:?} {}", section.partition, section.status, images.join(","))
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }

    #[derive(Default)]
    struct MemoryFs {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        dirs: Mutex<Vec<PathBuf>>,
        fail_writes: bool,
    }

    impl MemoryFs {
        fn file(&self, path: &str) -> Option<String> {
            self.files
                .lock()
                .expect("files lock")
                .get(Path::new(path))
                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
        }

        fn file_count(&self) -> usize {
            self.files.lock().expect("files lock").len()
        }
    }

    #[async_trait::async_trait]
    impl LocalFilesystemPort for MemoryFs {
        async fn ensure_dir(&self, path: &Path) -> AppResult<()> {
            self.dirs.lock().expect("dirs lock").push(path.to_path_buf());
            Ok(())
        }

        async fn write_atomic(&self, path: &Path, contents: &[u8]) -> AppResult<()> {
            if self.fail_writes {
                return Err(local_error(format!("disk full writing {}", path.display())));
            }
            self.files
                .lock()
                .expect("files lock")
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }

        async fn remove_file(&self, path: &Path) -> AppResult<()> {
            self.files.lock().expect("files lock").remove(path);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingOutput {
        emitted: Mutex<Vec<(String, usize)>>,
    }

    impl SnapshotOutputPort for RecordingOutput {
        fn emit(&self, snapshot: &PartitionSnapshot, _summary: &SnapshotSummary) -> AppResult<()> {
            self.emitted
                .lock()
                .expect("emitted lock")
                .push((snapshot.partition().to_string(), snapshot.len()));
            Ok(())
        }
    }

    struct Harness {
        query: Arc<MapQuery>,
        renderer: Arc<RecordingRenderer>,
        fs: Arc<MemoryFs>,
        output: Arc<RecordingOutput>,
        usecases: UseCases,
    }

    fn harness(query: MapQuery, renderer: RecordingRenderer, fs: MemoryFs) -> Harness {
        let query = Arc::new(query);
        let renderer = Arc::new(renderer);
        let fs = Arc::new(fs);
        let output = Arc::new(RecordingOutput::default());
        let usecases = UseCases::new(
            query.clone(),
            renderer.clone(),
            Arc::new(ListingReport),
            fs.clone(),
            output.clone(),
        );
        Harness {
            query,
            renderer,
            fs,
            output,
            usecases,
        }
    }

    fn options(metrics: Vec<Metric>) -> RunOptions {
        RunOptions {
            output_dir: PathBuf::from("/out"),
            metrics,
            report_title: "Cluster load".to_string(),
            diagnostics: Diagnostics::default(),
            print_table: false,
        }
    }

    fn partitions(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn on_disk(query: MapQuery, renderer: RecordingRenderer) -> UseCases {
        UseCases::new(
            Arc::new(query),
            Arc::new(renderer),
            Arc::new(ListingReport),
            Arc::new(LocalFilesystem::new()),
            Arc::new(NoopSnapshotOutput),
        )
    }

    fn options_in(dir: &Path, metrics: Vec<Metric>) -> RunOptions {
        RunOptions {
            output_dir: dir.to_path_buf(),
            ..options(metrics)
        }
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn gpu_nodes() -> Vec<Value> {
        vec![node_json("g001", 4, 100, ("gpu:4", "gpu:1"))]
    }

    fn cpu_nodes(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| node_json(&format!("c{i:03}"), 4, 100, ("", "")))
            .collect()
    }

    #[tokio::test]
    async fn nine_node_partition_renders_three_by_four_grid() {
        let h = harness(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(9)))]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["cpu"]), &options(vec![Metric::Load]))
            .await
            .unwrap();

        let grids = h.renderer.grids.lock().unwrap();
        assert_eq!(grids.len(), 1);
        let (_, metric, grid) = &grids[0];
        assert_eq!(*metric, Metric::Load);
        assert_eq!((grid.rows, grid.cols), (3, 4));
        assert_eq!(&grid.cells[9..], &[None, None, None]);
        assert_eq!(grid.get(0, 0), Some(25.0));
        assert_eq!(
            h.fs.file("/out/heatmap_cpu_load.txt").as_deref(),
            Some("cpu:load:3x4")
        );
        assert_eq!(summary.report_path, PathBuf::from("/out/index.txt"));
        assert!(summary.failed_partitions().is_empty());
        assert_eq!(h.fs.dirs.lock().unwrap().as_slice(), &[PathBuf::from("/out")]);
    }

    #[tokio::test]
    async fn query_failure_is_isolated_to_its_partition() {
        let h = harness(
            MapQuery::new(vec![
                ("bad", Err(query_failure("bad", "sinfo exited with status 1"))),
                ("cpu", Ok(cpu_nodes(2))),
            ]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["bad", "cpu"]), &options(vec![Metric::Load]))
            .await
            .unwrap();

        assert_eq!(h.query.calls(), partitions(&["bad", "cpu"]));
        assert_eq!(summary.failed_partitions(), vec!["bad"]);
        match &summary.outcomes[0].status {
            PartitionStatus::Failed(message) => assert!(message.contains("partition=bad")),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(h.fs.file("/out/heatmap_bad_load.txt"), None);
        assert!(h.fs.file("/out/heatmap_cpu_load.txt").is_some());
        let report = h.fs.file("/out/index.txt").unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].starts_with("bad Failed("));
        assert_eq!(lines[1], "cpu Rendered heatmap_cpu_load.txt");
    }

    #[tokio::test]
    async fn empty_partition_produces_no_image() {
        let h = harness(
            MapQuery::new(vec![("empty", Ok(Vec::new()))]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["empty"]), &options(vec![Metric::Load, Metric::Gpu]))
            .await
            .unwrap();

        assert_eq!(summary.outcomes[0].status, PartitionStatus::NoNodes);
        assert!(h.renderer.grids.lock().unwrap().is_empty());
        // Only the report was written.
        assert_eq!(h.fs.file_count(), 1);
        assert!(summary.failed_partitions().is_empty());
    }

    #[tokio::test]
    async fn accelerator_heatmap_skipped_without_accelerators() {
        let mut nodes = cpu_nodes(2);
        nodes.push(node_json("g001", 4, 0, ("gpu:4(IDX:0-3)", "gpu:1(IDX:0)")));
        let h = harness(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(3))), ("gpu", Ok(nodes))]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["cpu", "gpu"]), &options(vec![Metric::Load, Metric::Gpu]))
            .await
            .unwrap();

        let cpu_images: Vec<Metric> = summary.outcomes[0].images.iter().map(|i| i.metric).collect();
        assert_eq!(cpu_images, vec![Metric::Load]);
        let gpu_images: Vec<Metric> = summary.outcomes[1].images.iter().map(|i| i.metric).collect();
        assert_eq!(gpu_images, vec![Metric::Load, Metric::Gpu]);

        let grids = h.renderer.grids.lock().unwrap();
        let (_, _, gpu_grid) = grids
            .iter()
            .find(|(partition, metric, _)| partition == "gpu" && *metric == Metric::Gpu)
            .unwrap();
        assert_eq!(gpu_grid.cells, vec![None, None, Some(25.0), None, None, None]);
    }

    #[tokio::test]
    async fn rejected_nodes_are_counted_and_excluded() {
        let mut nodes = cpu_nodes(1);
        nodes.push(node_json("broken", 0, 100, ("", "")));
        let h = harness(
            MapQuery::new(vec![("cpu", Ok(nodes))]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["cpu"]), &options(vec![Metric::Load]))
            .await
            .unwrap();
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.node_count, 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].node_name.as_deref(), Some("broken"));
        assert!(
            describe_rejected(&outcome.rejected[0])
                .starts_with("broken (record 1): node reports zero hardware threads")
        );
        let grids = h.renderer.grids.lock().unwrap();
        assert_eq!((grids[0].2.rows, grids[0].2.cols), (1, 2));
    }

    #[tokio::test]
    async fn render_failure_marks_partition_failed() {
        let h = harness(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(2)))]),
            RecordingRenderer {
                fail_on: Some(Metric::Load),
                ..RecordingRenderer::default()
            },
            MemoryFs::default(),
        );
        let summary = h
            .usecases
            .run(&partitions(&["cpu"]), &options(vec![Metric::Load]))
            .await
            .unwrap();
        assert_eq!(summary.failed_partitions(), vec!["cpu"]);
        assert_eq!(h.fs.file("/out/heatmap_cpu_load.txt"), None);
    }

    #[tokio::test]
    async fn report_write_failure_aborts_run() {
        let h = harness(
            MapQuery::new(vec![("empty", Ok(Vec::new()))]),
            RecordingRenderer::default(),
            MemoryFs {
                fail_writes: true,
                ..MemoryFs::default()
            },
        );
        let err = h
            .usecases
            .run(&partitions(&["empty"]), &options(vec![Metric::Load]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::LOCAL_ERROR);
    }

    #[tokio::test]
    async fn table_output_only_when_requested() {
        let h = harness(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(2))), ("gpu", Ok(cpu_nodes(1)))]),
            RecordingRenderer::default(),
            MemoryFs::default(),
        );
        h.usecases
            .process_partition("cpu", &options(vec![Metric::Load]))
            .await;
        assert!(h.output.emitted.lock().unwrap().is_empty());

        let mut with_table = options(vec![Metric::Load]);
        with_table.print_table = true;
        h.usecases.process_partition("gpu", &with_table).await;
        assert_eq!(
            h.output.emitted.lock().unwrap().as_slice(),
            &[("gpu".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn failed_query_removes_previous_heatmaps() {
        let dir = TempDir::new().unwrap();
        let opts = options_in(dir.path(), vec![Metric::Load, Metric::Gpu]);
        let parts = partitions(&["gpu"]);

        on_disk(
            MapQuery::new(vec![("gpu", Ok(gpu_nodes()))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &opts)
        .await
        .unwrap();
        assert_eq!(
            listing(dir.path()),
            vec!["heatmap_gpu_gpu.txt", "heatmap_gpu_load.txt", "index.txt"]
        );

        let summary = on_disk(
            MapQuery::new(vec![("gpu", Err(query_failure("gpu", "sinfo timed out")))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &opts)
        .await
        .unwrap();
        assert_eq!(summary.failed_partitions(), vec!["gpu"]);
        assert_eq!(listing(dir.path()), vec!["index.txt"]);
    }

    #[tokio::test]
    async fn skipped_metric_and_empty_partition_remove_previous_heatmaps() {
        let dir = TempDir::new().unwrap();
        let opts = options_in(dir.path(), vec![Metric::Load, Metric::Gpu]);
        let parts = partitions(&["gpu", "debug"]);

        on_disk(
            MapQuery::new(vec![("gpu", Ok(gpu_nodes())), ("debug", Ok(cpu_nodes(2)))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &opts)
        .await
        .unwrap();
        assert_eq!(
            listing(dir.path()),
            vec![
                "heatmap_debug_load.txt",
                "heatmap_gpu_gpu.txt",
                "heatmap_gpu_load.txt",
                "index.txt"
            ]
        );

        // The accelerators are gone and the debug partition is drained.
        on_disk(
            MapQuery::new(vec![("gpu", Ok(cpu_nodes(1))), ("debug", Ok(Vec::new()))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &opts)
        .await
        .unwrap();
        assert_eq!(listing(dir.path()), vec!["heatmap_gpu_load.txt", "index.txt"]);
    }

    #[tokio::test]
    async fn heatmaps_of_dropped_metrics_are_removed() {
        let dir = TempDir::new().unwrap();
        let parts = partitions(&["cpu"]);

        on_disk(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(2)))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &options_in(dir.path(), vec![Metric::Load, Metric::Alloc]))
        .await
        .unwrap();
        on_disk(
            MapQuery::new(vec![("cpu", Ok(cpu_nodes(2)))]),
            RecordingRenderer::default(),
        )
        .run(&parts, &options_in(dir.path(), vec![Metric::Load]))
        .await
        .unwrap();
        assert_eq!(listing(dir.path()), vec!["heatmap_cpu_load.txt", "index.txt"]);
    }

    #[tokio::test]
    async fn later_render_failure_removes_earlier_images() {
        let dir = TempDir::new().unwrap();
        let summary = on_disk(
            MapQuery::new(vec![("gpu", Ok(gpu_nodes()))]),
            RecordingRenderer {
                fail_on: Some(Metric::Gpu),
                ..RecordingRenderer::default()
            },
        )
        .run(
            &partitions(&["gpu"]),
            &options_in(dir.path(), vec![Metric::Load, Metric::Gpu]),
        )
        .await
        .unwrap();

        let outcome = &summary.outcomes[0];
        assert!(matches!(outcome.status, PartitionStatus::Failed(_)));
        assert!(outcome.images.is_empty());
        assert_eq!(listing(dir.path()), vec!["index.txt"]);
        let report = std::fs::read_to_string(dir.path().join("index.txt")).unwrap();
        assert!(report.starts_with("gpu Failed("));
        assert!(!report.contains("heatmap_gpu_load"));
    }
}
