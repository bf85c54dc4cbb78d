//! SAMADhi CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line front end to the SAMADhi catalog.
//!
//! # Overview
//!
//! - **Search**: find datasets, samples, results or analyses by id, name
//!   pattern or path pattern (`samadhi search sample -n 'ttbar_*'`)
//! - **Reports**: one line per record, or a detailed report with `--long`
//! - **Configuration**: credentials file location from `--credentials`,
//!   `SAMADHI_CREDENTIALS` or the default `~/.samadhi`

pub mod commands;
pub mod config;
pub mod error;
pub mod paths;
pub mod report;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// SAMADhi - catalog of datasets, samples and physics results
#[derive(Parser, Debug)]
#[command(name = "samadhi")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Credentials file (defaults to ~/.samadhi)
    #[arg(long, env = "SAMADHI_CREDENTIALS", global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for datasets, samples, results or analyses
    Search(SearchArgs),
}

/// Arguments of `samadhi search`
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("filter").required(true).args(["name", "path", "id"])))]
pub struct SearchArgs {
    /// Record type to search for
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Detailed output
    #[arg(short, long)]
    pub long: bool,

    /// Filter on name (`*` and `?` wildcards)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Filter on path (`*` and `?` wildcards, `~` and `$VAR` expanded)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Filter on id
    #[arg(short, long)]
    pub id: Option<i64>,
}

/// Record types the search command can look up
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Dataset,
    Sample,
    Result,
    Analysis,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Dataset => "dataset",
            EntityKind::Sample => "sample",
            EntityKind::Result => "result",
            EntityKind::Analysis => "analysis",
        }
    }

    /// Whether `--name` applies (analyses match it against their description)
    pub fn supports_name(self) -> bool {
        !matches!(self, EntityKind::Result)
    }

    pub fn supports_path(self) -> bool {
        matches!(self, EntityKind::Sample | EntityKind::Result)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
