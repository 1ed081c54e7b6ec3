// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use helmboot::{
    config::Settings,
    path::{default_settings_path, expand_path},
    pipeline::{BootstrapPipeline, BootstrapRequest},
    requirements::overrides::RequirementOverrides,
    source::SourceRequest,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "helmboot [options] <helmboot-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file.
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let settings = match self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::load(default_settings_path()?)?,
        };

        match self.command {
            Command::Create(opts) => run_create(opts, settings),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create a new git repository for a new installation.
    ///
    /// If the target directory is already a git clone, then it is modified in
    /// place. Otherwise, the initial configuration files are cloned into a new
    /// directory, and the requirements are written on top of them.
    #[command(override_usage = "helmboot create [options]")]
    Create(CreateOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CreateOptions {
    /// Git URL to clone the initial set of configuration files from.
    #[arg(long, value_name = "url")]
    pub initial_git_url: Option<String>,

    /// Use the Jenkins operator configuration as the initial set of files.
    #[arg(long)]
    pub jenkins: bool,

    /// Working directory to use instead of a new temporary directory.
    #[arg(long, value_name = "path")]
    pub dir: Option<String>,

    /// Remote URL to push the dev environment git repository to.
    #[arg(long, value_name = "url")]
    pub push_url: Option<String>,

    #[command(flatten)]
    pub requirements: RequirementOverrides,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_create(opts: CreateOptions, settings: Settings) -> Result<()> {
    let dir = match opts.dir.as_deref().filter(|dir| !dir.is_empty()) {
        Some(dir) => Some(expand_path(dir)?),
        None => None,
    };

    let request = BootstrapRequest {
        source: SourceRequest {
            initial_git_url: opts.initial_git_url,
            jenkins: opts.jenkins,
            dir,
        },
        overrides: opts.requirements,
    };

    let pipeline = BootstrapPipeline::with_settings(settings, opts.push_url);
    let report = pipeline.run(&request)?;
    info!(
        "bootstrapped {} with requirements at {}",
        report.dir.display(),
        report.requirements_path.display()
    );

    Ok(())
}
