// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use anyhow::Context;

mod adapters;
mod app;
mod config;
mod logging;

use app::ports::{NoopSnapshotOutput, SnapshotOutputPort};
use app::types::Diagnostics;
use app::usecases::{RunOptions, UseCases};

fn log_config_report(report: &config::ConfigReport) {
    match (&report.config_path, report.config_path_source) {
        (Some(path), Some(source)) => {
            tracing::info!(
                "config path: {} (source={}, present={})",
                path.display(),
                source.as_str(),
                report.config_file_present
            );
        }
        (Some(path), None) => {
            tracing::info!(
                "config path: {} (present={})",
                path.display(),
                report.config_file_present
            );
        }
        (None, _) => {
            tracing::info!("config path: (none)");
        }
    }
    tracing::info!(
        "config output_dir: {} (source={})",
        report.output_dir.value.display(),
        report.output_dir.source.as_str()
    );
    tracing::info!(
        "config partitions: {} (source={})",
        report.partitions.value.join(","),
        report.partitions.source.as_str()
    );
    let metrics: Vec<&str> = report.metrics.value.iter().map(|m| m.as_str()).collect();
    tracing::info!(
        "config metrics: {} (source={})",
        metrics.join(","),
        report.metrics.source.as_str()
    );
    tracing::info!(
        "config sinfo_command: {} (source={})",
        report.sinfo_command.value,
        report.sinfo_command.source.as_str()
    );
    tracing::info!(
        "config report_file: {} (source={})",
        report.report_file.value,
        report.report_file.source.as_str()
    );
    tracing::info!(
        "config debug: {} (source={}), verbose: {} (source={})",
        report.debug.value,
        report.debug.source.as_str(),
        report.verbose.value,
        report.verbose.source.as_str()
    );
    tracing::info!(
        "config log_format: {} (source={})",
        report.log_format.value,
        report.log_format.source.as_str()
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let parsed = adapters::cli::parse_opts();
    let opts = parsed.opts;
    let config::LoadResult { config, report } = config::load_with_report(
        opts.config,
        config::Overrides {
            output_dir: opts.output_dir,
            partition: opts.partition,
            metrics: Some(opts.metrics),
            verbose: parsed.verbose_override,
            debug: parsed.debug_override,
        },
    )?;

    let diagnostics = Diagnostics {
        debug: config.debug,
        verbose: config.verbose,
    };
    logging::init(diagnostics, config.log_format, config.log_file.as_deref())?;
    log_config_report(&report);

    let snapshot_output: Arc<dyn SnapshotOutputPort> = if opts.table {
        Arc::new(adapters::terminal::StdoutTable::new())
    } else {
        Arc::new(NoopSnapshotOutput)
    };
    let usecases = UseCases::new(
        Arc::new(adapters::sinfo::SinfoQuery::new(config.sinfo_command.clone())),
        Arc::new(adapters::svg::SvgHeatmapRenderer::new()),
        Arc::new(adapters::html::HtmlReportComposer::new(
            config.report_file.clone(),
        )),
        Arc::new(adapters::fs::LocalFilesystem::new()),
        snapshot_output,
    );

    let options = RunOptions {
        output_dir: config.output_dir.clone(),
        metrics: config.metrics.clone(),
        report_title: config.report_title.clone(),
        diagnostics,
        print_table: opts.table,
    };
    let summary = usecases
        .run(&config.partitions, &options)
        .await
        .with_context(|| format!("failed to build report in {}", config.output_dir.display()))?;

    let images: usize = summary.outcomes.iter().map(|o| o.images.len()).sum();
    tracing::info!(
        "{} partition(s), {} heatmap(s), report at {}",
        summary.outcomes.len(),
        images,
        summary.report_path.display()
    );

    let failed = summary.failed_partitions();
    if !failed.is_empty() {
        anyhow::bail!("partition(s) failed: {}", failed.join(", "));
    }
    Ok(())
}
