// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

use crate::app::types::Metric;

#[derive(Parser, Debug)]
#[command(
    name = "slurmdash",
    version,
    about = "Render per-node load heatmaps and an HTML report for Slurm partitions",
    long_about = None,
    after_help = "Configuration precedence: defaults < config file < command-line flags.\n\
If --config is omitted, slurmdash tries the default config file location; a missing default config is OK.\n\
Paths in the config file are resolved relative to the config file directory; paths passed as flags are resolved relative to the current working directory."
)]
pub struct Opts {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, the default config file location is used if present."
    )]
    pub config: Option<PathBuf>,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Enable debug diagnostics. Overrides `debug` from the config file."
    )]
    pub debug: bool,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Together with --debug, dump every node record. Overrides `verbose` from the config file."
    )]
    pub verbose: bool,
    #[arg(
        short,
        long,
        value_name = "NAME",
        help = "Process only this partition instead of the configured `partitions`."
    )]
    pub partition: Option<String>,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Directory for heatmaps and the report. Overrides `output_dir` from the config file."
    )]
    pub output_dir: Option<PathBuf>,
    #[arg(
        short,
        long = "metric",
        value_name = "NAME",
        help = "Metric to render (load, gpu, alloc). Repeat for several. Overrides `metrics` from the config file."
    )]
    pub metrics: Vec<Metric>,
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Print the per-node table and column statistics to stdout."
    )]
    pub table: bool,
}

pub struct ParsedOpts {
    pub opts: Opts,
    pub debug_override: Option<bool>,
    pub verbose_override: Option<bool>,
}

const HELP_TEMPLATE: &str = r#"slurmdash

{before-help}{about-with-newline}{usage-heading} {usage}
{after-help}

{all-args}
"#;

pub fn cli_command() -> clap::Command {
    Opts::command().help_template(HELP_TEMPLATE)
}

pub fn parse_opts() -> ParsedOpts {
    let matches = cli_command().get_matches();
    parsed_from_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn parsed_from_matches(matches: &clap::ArgMatches) -> Result<ParsedOpts, clap::Error> {
    let flag = |name: &str| matches.get_flag(name).then_some(true);
    let debug_override = flag("debug");
    let verbose_override = flag("verbose");
    let opts = Opts::from_arg_matches(matches)?;
    Ok(ParsedOpts {
        opts,
        debug_override,
        verbose_override,
    })
}
