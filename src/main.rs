//! # cudnn-links CLI Entry Point
//!
//! Parses CLI arguments using clap and drives the update pipeline.
//!
//! ## Commands
//!
//! - `update` - Rewrite links files from the current manifests
//! - `check` - Report stale links files without writing (exit 1 if stale)
//! - `versions` - List the manifests the index currently publishes
//! - `completion` - Generate shell completions

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use cudnn_links::config::LinksConfig;
use cudnn_links::redist::HttpTransport;
use cudnn_links::update::{UpdateReport, Updater, WriteMode};
use cudnn_links::version::ManifestVersion;

#[derive(Parser)]
#[command(name = "cudnn-links")]
#[command(about = "Sync generated cuDNN link tables with NVIDIA's redist manifests", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a links.toml (default: ./links.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory that relative target paths are resolved against
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch manifests and rewrite every links file
    Update {
        /// Show what would change without writing any file
        #[arg(long)]
        dry_run: bool,
        /// Ignore manifests older than this version
        #[arg(long)]
        min_version: Option<ManifestVersion>,
    },
    /// Exit non-zero if any links file is out of date
    Check {
        /// Ignore manifests older than this version
        #[arg(long)]
        min_version: Option<ManifestVersion>,
    },
    /// List manifest versions published in the index
    Versions {
        /// Ignore manifests older than this version
        #[arg(long)]
        min_version: Option<ManifestVersion>,
        /// Sort by version instead of index order
        #[arg(long)]
        sorted: bool,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let mut config = LinksConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config = config.with_root(root);
    }
    let transport = HttpTransport::new(config.timeout());
    let updater = Updater::new(&config, transport);

    match command {
        Commands::Update {
            dry_run,
            min_version,
        } => {
            let mode = if *dry_run {
                WriteMode::DryRun
            } else {
                WriteMode::Write
            };
            let report = updater.run(min_version.as_ref(), mode)?;
            finish(&report)?;
            if *dry_run && !report.is_up_to_date() {
                println!(
                    "{} Dry run: re-run without {} to write changes.",
                    "ℹ".blue(),
                    "--dry-run".yellow()
                );
            }
            Ok(())
        }
        Commands::Check { min_version } => {
            let report = updater.run(min_version.as_ref(), WriteMode::DryRun)?;
            finish(&report)?;
            if !report.has_data() {
                println!(
                    "{} No platform had manifest data; check the index at {}.",
                    "x".red(),
                    config.source.base_url
                );
                std::process::exit(1);
            }
            if !report.is_up_to_date() {
                println!(
                    "{} Links are out of date. Run {} to refresh them.",
                    "x".red(),
                    "cudnn-links update".yellow()
                );
                std::process::exit(1);
            }
            println!("{} All links files are up to date.", "✓".green());
            Ok(())
        }
        Commands::Versions {
            min_version,
            sorted,
        } => {
            let mut versions = updater
                .discover(min_version.as_ref())
                .context("Failed to list manifest versions")?;
            if *sorted {
                versions.sort();
            }
            for v in versions {
                println!("{}", v);
            }
            Ok(())
        }
        Commands::Completion { .. } => Ok(()),
    }
}

/// Print the summary and turn per-file failures into a non-zero exit.
fn finish(report: &UpdateReport) -> Result<()> {
    println!();
    report.print_summary();

    let failed: Vec<String> = report
        .failures()
        .map(|p| p.platform.to_string())
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("Failed to update links for: {}", failed.join(", "));
    }
    Ok(())
}
