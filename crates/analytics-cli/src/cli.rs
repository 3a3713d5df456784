//! CLI argument definitions for the analytics query engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "analytics",
    version,
    about = "Tracker analytics query engine",
    long_about = "Build and run line-list queries over tracker analytics tables.\n\n\
                  Repeatable enrollments and events are addressed by offset; items can be\n\
                  resolved in SQL or from the per-row enrollment payload."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Engine configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow row values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the row and count queries for a params file.
    Sql(SqlArgs),

    /// Execute a params file against a SQLite analytics database.
    Run(RunArgs),

    /// Resolve payload-bound items for rows given as JSON, without a database.
    Resolve(ResolveArgs),
}

#[derive(Parser)]
pub struct SqlArgs {
    /// Query params (JSON).
    #[arg(value_name = "PARAMS")]
    pub params: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Query params (JSON). An array runs every entry as an independent sub-query.
    #[arg(value_name = "PARAMS")]
    pub params: PathBuf,

    /// SQLite database holding the analytics tables.
    #[arg(long = "db", value_name = "PATH")]
    pub database: PathBuf,

    /// Only print the execution plan.
    #[arg(long = "analyze")]
    pub analyze: bool,

    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Tracked-entity query params (JSON).
    #[arg(value_name = "PARAMS")]
    pub params: PathBuf,

    /// Rows (JSON array of objects keyed by column label).
    #[arg(value_name = "ROWS")]
    pub rows: PathBuf,

    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

/// How grids are printed.
#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
