//! These structs provide the CLI interface for the koinly CLI.

use crate::adapters::Source;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// koinly: Converts exchange and blockchain exports into Koinly universal import files.
///
/// Each supported export format is converted into Koinly's semicolon-separated layout. Chain
/// exports are additionally consolidated: the several lines a single contract interaction leaves
/// in the explorer exports (wrapping, lending, swaps, bridging) are merged into the trades they
/// represent.
///
/// The output is written next to the first input file, with a `koinly_` prefix. Use the check
/// subcommand on it to compare the net balance changes against the source account.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert one export (two for etherlink) into a Koinly import file.
    ///
    /// The etherlink mode takes the native transfer export first and the token transfer export
    /// second. Rows that cannot be converted are reported as warnings and left out; the rest of
    /// the file is still written.
    Convert(ConvertArgs),
    /// Print the net balance change of every currency in a Koinly import file.
    Check(CheckArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber EnvFilter documentation.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// A JSON file overriding the default currencies and localized status and side names.
    #[arg(long, global = true, env = "KOINLY_CONFIG")]
    config: Option<PathBuf>,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: Option<PathBuf>) -> Self {
        Self { log_level, config }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Args for the `koinly convert` command.
#[derive(Debug, Parser, Clone)]
pub struct ConvertArgs {
    /// The export format of the input file(s).
    #[arg(value_enum)]
    mode: Source,

    /// The export to convert. The etherlink mode takes two: native transfers, then token
    /// transfers.
    #[arg(required = true, num_args = 1..=2)]
    files: Vec<PathBuf>,
}

impl ConvertArgs {
    pub fn new(mode: Source, files: Vec<PathBuf>) -> Self {
        Self { mode, files }
    }

    pub fn mode(&self) -> Source {
        self.mode
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Args for the `koinly check` command.
#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    /// The Koinly import file to check.
    file: PathBuf,
}

impl CheckArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}
