//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "paperlist",
    version,
    about = "Render conference paper listings with dynamic columns",
    long_about = "Render a paper listing for one viewer.\n\n\
                  Columns are resolved by name: fixed columns such as `title` or `status`,\n\
                  tag columns such as `#accept`, review score abbreviations, saved formula\n\
                  names, and formula expressions such as `avg(OveMer)`."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
        default_value = "compact",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render a listing of the given papers.
    Render(RenderArgs),

    /// List the column names the viewer can complete.
    Columns(ConferenceArgs),
}

/// Inputs every command needs.
#[derive(Args)]
pub struct ConferenceArgs {
    /// Conference settings (TOML).
    #[arg(long = "settings", value_name = "PATH")]
    pub settings: PathBuf,

    /// The viewer (JSON contact record).
    #[arg(long = "viewer", value_name = "PATH")]
    pub viewer: PathBuf,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub conference: ConferenceArgs,

    /// Papers to list (JSON array of records).
    #[arg(long = "papers", value_name = "PATH")]
    pub papers: PathBuf,

    /// Listing options (JSON); flags below add to them.
    #[arg(long = "options", value_name = "PATH")]
    pub options: Option<PathBuf>,

    /// Columns to show, in order.
    #[arg(short = 'c', long = "columns", value_delimiter = ',', value_name = "NAMES")]
    pub columns: Vec<String>,

    /// Sort specification such as `-title` or `OveMer:avg`; may repeat.
    #[arg(short = 's', long = "sort", value_name = "SPEC")]
    pub sort: Vec<String>,

    /// Column or section to fold away; may repeat.
    #[arg(long = "fold", value_name = "NAME")]
    pub fold: Vec<String>,

    /// Search limit, e.g. `s` or `a`.
    #[arg(long = "limit", value_name = "LIMIT")]
    pub limit: Option<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// Plain-text cells in a terminal table.
    Table,
    /// The full rendered listing, markup included.
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
