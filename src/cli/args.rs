//! Command-line argument definitions for the GCPV watcher
//!
//! This module defines the CLI interface using the clap derive API.

use crate::{Error, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the GCPV watcher
///
/// Watches a directory of GCPV race exports and keeps the FinishLynx race
/// list (`Lynx.evt`) in sync with them.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gcpv-watcher",
    version,
    about = "Keep a FinishLynx Lynx.evt race list in sync with GCPV race exports",
    long_about = "Watches a directory of GCPV race exports, converts every race it finds into \
                  FinishLynx format and reconciles the results into a single Lynx.evt race list. \
                  Each rewrite of the race list is preceded by a timestamped backup."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Watch an export directory and keep Lynx.evt up to date (main command)
    Watch(WatchArgs),
    /// Convert one export file and print the resulting race list
    Convert(ConvertArgs),
}

/// Verbosity flags shared by all commands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Verbosity {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Verbosity {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Arguments for the watch command
#[derive(Debug, Clone, Parser)]
pub struct WatchArgs {
    /// Directory the registration tool writes its race exports to
    #[arg(
        short = 'w',
        long = "watch-dir",
        value_name = "DIR",
        help = "Directory containing GCPV race exports"
    )]
    pub watch_dir: PathBuf,

    /// FinishLynx input directory holding Lynx.evt and Lynx.ppl
    ///
    /// Lynx.evt is created here if it does not exist. Backups are written to
    /// the configured backup directory, relative to this one.
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "FinishLynx directory containing Lynx.evt"
    )]
    pub output_dir: PathBuf,

    /// Path to configuration file
    ///
    /// JSON configuration with the export pattern and key fields. If not
    /// specified, looks for ./appconfig.json, then the per-user config
    /// directory.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

impl WatchArgs {
    /// Validate the watch arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.watch_dir.is_dir() {
            return Err(Error::file_not_found(format!(
                "Watch directory does not exist: {}",
                self.watch_dir.display()
            )));
        }
        if !self.output_dir.is_dir() {
            return Err(Error::file_not_found(format!(
                "FinishLynx directory does not exist: {}",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// GCPV export file to convert
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Path to configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

impl Commands {
    pub fn verbosity(&self) -> &Verbosity {
        match self {
            Self::Watch(args) => &args.verbosity,
            Self::Convert(args) => &args.verbosity,
        }
    }
}
