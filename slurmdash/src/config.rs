// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::adapters::html::DEFAULT_REPORT_FILE;
use crate::adapters::sinfo::DEFAULT_SINFO_COMMAND;
use crate::app::types::Metric;
use crate::logging::LogFormat;

const APP_DIR_NAME: &str = "slurmdash";
const CONFIG_FILE_NAME: &str = "slurmdash.toml";
const DEFAULT_OUTPUT_DIR: &str = "dashboard";
const DEFAULT_PARTITIONS: [&str; 1] = ["all"];
const DEFAULT_REPORT_TITLE: &str = "Cluster load";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    output_dir: Option<String>,
    partitions: Option<Vec<String>>,
    metrics: Option<Vec<String>>,
    sinfo_command: Option<String>,
    report_file: Option<String>,
    report_title: Option<String>,
    verbose: Option<bool>,
    debug: Option<bool>,
    log_format: Option<String>,
    log_file: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub output_dir: PathBuf,
    pub partitions: Vec<String>,
    pub metrics: Vec<Metric>,
    pub sinfo_command: String,
    pub report_file: String,
    pub report_title: String,
    pub verbose: bool,
    pub debug: bool,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub output_dir: ConfigValue<PathBuf>,
    pub partitions: ConfigValue<Vec<String>>,
    pub metrics: ConfigValue<Vec<Metric>>,
    pub sinfo_command: ConfigValue<String>,
    pub report_file: ConfigValue<String>,
    pub verbose: ConfigValue<bool>,
    pub debug: ConfigValue<bool>,
    pub log_format: ConfigValue<LogFormat>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub partition: Option<String>,
    pub metrics: Option<Vec<Metric>>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
}

#[cfg(test)]
pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Config> {
    Ok(load_with_report(config_path_override, overrides)?.config)
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match default_config_path().ok() {
            Some(path) => (Some(path), Some(ConfigSource::Default), false),
            None => (None, None, false),
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };
    let base_dir = config_path.as_deref().and_then(|path| path.parent());

    let (output_dir, output_dir_source) = match overrides.output_dir {
        Some(path) => (expand_path(path), ConfigSource::Override),
        None => match file_config.output_dir.as_deref() {
            Some(raw) => (resolve_path(raw, base_dir), ConfigSource::ConfigFile),
            None => (PathBuf::from(DEFAULT_OUTPUT_DIR), ConfigSource::Default),
        },
    };

    let (partitions, partitions_source) = match overrides.partition {
        Some(partition) => (vec![partition], ConfigSource::Override),
        None => match file_config.partitions {
            Some(list) => (list, ConfigSource::ConfigFile),
            None => (
                DEFAULT_PARTITIONS.iter().map(|p| p.to_string()).collect(),
                ConfigSource::Default,
            ),
        },
    };
    validate_partitions(&partitions)?;

    let (metrics, metrics_source) = match overrides.metrics.filter(|m| !m.is_empty()) {
        Some(metrics) => (metrics, ConfigSource::Override),
        None => match file_config.metrics {
            Some(raw) => (parse_metrics(&raw)?, ConfigSource::ConfigFile),
            None => (Metric::ALL.to_vec(), ConfigSource::Default),
        },
    };
    if metrics.is_empty() {
        anyhow::bail!("metrics must name at least one of: load, gpu, alloc");
    }
    let metrics = dedup_metrics(metrics);

    let (sinfo_command, sinfo_command_source) = match file_config.sinfo_command {
        Some(raw) if !raw.trim().is_empty() => {
            (shellexpand::tilde(raw.trim()).to_string(), ConfigSource::ConfigFile)
        }
        Some(_) => anyhow::bail!("sinfo_command must not be empty"),
        None => (DEFAULT_SINFO_COMMAND.to_string(), ConfigSource::Default),
    };

    let (report_file, report_file_source) = match file_config.report_file {
        Some(name) => {
            validate_report_file(&name)?;
            (name, ConfigSource::ConfigFile)
        }
        None => (DEFAULT_REPORT_FILE.to_string(), ConfigSource::Default),
    };

    let report_title = file_config
        .report_title
        .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string());

    let (verbose, verbose_source) = match overrides.verbose {
        Some(verbose) => (verbose, ConfigSource::Override),
        None => match file_config.verbose {
            Some(verbose) => (verbose, ConfigSource::ConfigFile),
            None => (false, ConfigSource::Default),
        },
    };
    let (debug, debug_source) = match overrides.debug {
        Some(debug) => (debug, ConfigSource::Override),
        None => match file_config.debug {
            Some(debug) => (debug, ConfigSource::ConfigFile),
            None => (false, ConfigSource::Default),
        },
    };

    let (log_format, log_format_source) = match file_config.log_format.as_deref() {
        Some(raw) => (
            raw.parse::<LogFormat>()
                .map_err(|err| anyhow::anyhow!("invalid log_format: {err}"))?,
            ConfigSource::ConfigFile,
        ),
        None => (LogFormat::default(), ConfigSource::Default),
    };
    let log_file = file_config
        .log_file
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| resolve_path(raw, base_dir));

    let config = Config {
        output_dir,
        partitions,
        metrics,
        sinfo_command,
        report_file,
        report_title,
        verbose,
        debug,
        log_format,
        log_file,
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        output_dir: ConfigValue {
            value: config.output_dir.clone(),
            source: output_dir_source,
        },
        partitions: ConfigValue {
            value: config.partitions.clone(),
            source: partitions_source,
        },
        metrics: ConfigValue {
            value: config.metrics.clone(),
            source: metrics_source,
        },
        sinfo_command: ConfigValue {
            value: config.sinfo_command.clone(),
            source: sinfo_command_source,
        },
        report_file: ConfigValue {
            value: config.report_file.clone(),
            source: report_file_source,
        },
        verbose: ConfigValue {
            value: config.verbose,
            source: verbose_source,
        },
        debug: ConfigValue {
            value: config.debug,
            source: debug_source,
        },
        log_format: ConfigValue {
            value: config.log_format,
            source: log_format_source,
        },
    };

    Ok(LoadResult { config, report })
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn validate_partitions(partitions: &[String]) -> Result<()> {
    if partitions.is_empty() {
        anyhow::bail!("partitions must list at least one partition");
    }
    if let Some(bad) = partitions
        .iter()
        .find(|p| p.trim().is_empty() || p.chars().any(char::is_whitespace))
    {
        anyhow::bail!("invalid partition name {bad:?}");
    }
    Ok(())
}

fn parse_metrics(raw: &[String]) -> Result<Vec<Metric>> {
    raw.iter()
        .map(|name| {
            name.parse::<Metric>()
                .with_context(|| "invalid metrics entry in config file")
        })
        .collect()
}

fn dedup_metrics(metrics: Vec<Metric>) -> Vec<Metric> {
    let mut unique = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !unique.contains(&metric) {
            unique.push(metric);
        }
    }
    unique
}

fn validate_report_file(name: &str) -> Result<()> {
    let path = Path::new(name);
    let plain = path.file_name().map(|f| f == path.as_os_str()).unwrap_or(false);
    if name.trim().is_empty() || !plain {
        anyhow::bail!("report_file must be a plain file name, got {name:?}");
    }
    Ok(())
}

fn resolve_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        return path;
    }
    match base_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("slurmdash.toml");
        fs::write(&config_path, body).unwrap();
        config_path
    }

    #[test]
    fn missing_optional_config_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let cfg = read_config_file(&dir.path().join("missing.toml"), false).unwrap();
        assert!(cfg.output_dir.is_none());
        assert!(cfg.partitions.is_none());
    }

    #[test]
    fn missing_required_config_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = load(Some(dir.path().join("missing.toml")), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn empty_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "");
        let LoadResult { config, report } =
            load_with_report(Some(config_path), Overrides::default()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.partitions, vec!["all".to_string()]);
        assert_eq!(config.metrics, Metric::ALL.to_vec());
        assert_eq!(config.sinfo_command, "sinfo");
        assert_eq!(config.report_file, "index.html");
        assert_eq!(config.report_title, DEFAULT_REPORT_TITLE);
        assert!(!config.verbose && !config.debug);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.log_file.is_none());
        assert_eq!(report.partitions.source, ConfigSource::Default);
        assert_eq!(report.config_path_source, Some(ConfigSource::Override));
        assert!(report.config_file_present);
    }

    #[test]
    fn resolves_relative_paths_from_config_dir() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            "output_dir = \"www/dash\"\nlog_file = \"logs/slurmdash.log\"\n",
        );
        let config = load(Some(config_path.clone()), Overrides::default()).unwrap();
        let config_dir = config_path.parent().unwrap();
        assert_eq!(config.output_dir, config_dir.join("www").join("dash"));
        assert_eq!(
            config.log_file,
            Some(config_dir.join("logs").join("slurmdash.log"))
        );
    }

    #[test]
    fn reads_partitions_and_metrics_in_order() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            "partitions = [\"gpu\", \"cpu\", \"bigmem\"]\nmetrics = [\"alloc\", \"load\", \"alloc\"]\n",
        );
        let LoadResult { config, report } =
            load_with_report(Some(config_path), Overrides::default()).unwrap();
        assert_eq!(config.partitions, vec!["gpu", "cpu", "bigmem"]);
        assert_eq!(config.metrics, vec![Metric::Alloc, Metric::Load]);
        assert_eq!(report.metrics.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn cli_overrides_take_precedence_over_file_config() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            "output_dir = \"from_config\"\npartitions = [\"gpu\", \"cpu\"]\nverbose = false\ndebug = false\n",
        );
        let LoadResult { config, report } = load_with_report(
            Some(config_path),
            Overrides {
                output_dir: Some(PathBuf::from("from_flag")),
                partition: Some("debug".to_string()),
                metrics: Some(vec![Metric::Gpu]),
                verbose: Some(true),
                debug: Some(true),
            },
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("from_flag"));
        assert_eq!(config.partitions, vec!["debug"]);
        assert_eq!(config.metrics, vec![Metric::Gpu]);
        assert!(config.verbose && config.debug);
        assert_eq!(report.output_dir.source, ConfigSource::Override);
        assert_eq!(report.debug.source, ConfigSource::Override);
    }

    #[test]
    fn overrides_apply_per_field() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "partitions = [\"gpu\"]\ndebug = true\n");
        let config = load(
            Some(config_path),
            Overrides {
                verbose: Some(true),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.partitions, vec!["gpu"]);
        assert!(config.debug);
        assert!(config.verbose);
    }

    #[test]
    fn empty_metric_override_falls_back_to_config() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "metrics = [\"load\"]\n");
        let config = load(
            Some(config_path),
            Overrides {
                metrics: Some(Vec::new()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.metrics, vec![Metric::Load]);
    }

    #[test]
    fn rejects_unknown_metric() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "metrics = [\"memory\"]\n");
        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown metric 'memory'"));
    }

    #[test]
    fn rejects_empty_partition_list() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "partitions = []\n");
        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("at least one partition"));
    }

    #[test]
    fn rejects_partition_with_whitespace() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "partitions = [\"gpu cpu\"]\n");
        assert!(load(Some(config_path), Overrides::default()).is_err());
    }

    #[test]
    fn rejects_report_file_with_directory() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "report_file = \"../index.html\"\n");
        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("plain file name"));
    }

    #[test]
    fn reads_report_and_logging_settings() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            "report_file = \"dash.html\"\nreport_title = \"Lab cluster\"\nlog_format = \"json\"\nsinfo_command = \"/opt/slurm/bin/sinfo\"\n",
        );
        let config = load(Some(config_path), Overrides::default()).unwrap();
        assert_eq!(config.report_file, "dash.html");
        assert_eq!(config.report_title, "Lab cluster");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.sinfo_command, "/opt/slurm/bin/sinfo");
    }

    #[test]
    fn rejects_unknown_log_format() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "log_format = \"xml\"\n");
        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("invalid log_format"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "port = 40001\n");
        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
