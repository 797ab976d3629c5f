use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use snapcdc_source::DEFAULT_KEY_ATTRIBUTE;

#[derive(Parser, Debug)]
#[command(
    name = "snapcdc",
    about = "Snapshot-diff change data capture for directory sources",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll a source and print every field change until interrupted
    Watch(WatchArgs),
    /// Print the changes between two snapshot dumps
    Diff(DiffArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: PathBuf,
    /// Refresh period in seconds, overriding the config file
    #[arg(long)]
    pub refresh: Option<u64>,
    /// Additional field to ignore (repeatable)
    #[arg(long = "ignore", value_name = "FIELD")]
    pub ignore: Vec<String>,
    /// Log start, poll cycles, reconnects and shutdown
    #[arg(long)]
    pub diagnostics: bool,
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Earlier snapshot (JSON records or key -> fields object)
    pub before: PathBuf,
    /// Later snapshot
    pub after: PathBuf,
    /// Field to ignore (repeatable)
    #[arg(long = "ignore", value_name = "FIELD")]
    pub ignore: Vec<String>,
    /// Attribute holding the entity key
    #[arg(long, default_value = DEFAULT_KEY_ATTRIBUTE)]
    pub key_attribute: String,
}
