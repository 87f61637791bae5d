//! CLI argument definitions for inventory.

use clap::{Parser, Subcommand, ValueEnum};
use inv_query::QueryKind;
use std::path::PathBuf;

pub use inv_cli_common::LogLevel;

/// Keeps a table of object-store inventory current.
///
/// Bulk-loads object metadata, follows change notifications, and builds the
/// access-classification queries over the loaded tables.
///
/// ## Examples
///
/// Load two buckets into the inventory table:
///   inventory load photos logs
///
/// Dump one prefix as JSON lines:
///   inventory cat -p 2024/ photos > photos.jsonl
///
/// Replay notifications from a file:
///   inventory listen --input stdin < events.jsonl
#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long, env = "INVENTORY_CONFIG", default_value = "./default.toml")]
    pub config: PathBuf,

    /// Log level; overrides runtime.log_level from the config file
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List buckets and write every object's metadata to the inventory table
    Load(ListArgs),

    /// List buckets and print every object's metadata as JSON lines
    Cat(ListArgs),

    /// Apply change notifications to the inventory table until interrupted
    Listen(ListenArgs),

    /// Print or run an access-classification query
    Query(QueryArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only list objects whose key starts with this prefix
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Buckets to list; all buckets in the project when empty
    pub buckets: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListenArgs {
    /// Notification source
    #[arg(short = 'i', long, value_enum, default_value = "sqs")]
    pub input: InputType,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    /// Which query to build
    #[arg(value_enum)]
    pub kind: QueryArg,

    /// Run the query instead of printing it
    #[arg(long, requires = "destination")]
    pub execute: bool,

    /// Table (in the configured dataset) that receives the query result
    #[arg(long)]
    pub destination: Option<String>,
}

/// Notification source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputType {
    /// Receive notifications from the configured SQS queue
    Sqs,
    /// Read JSONL notifications from stdin
    Stdin,
}

/// Query selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryArg {
    /// Last access and recent access count per object
    Access,
    /// Objects accessed often enough to move to a warmer class
    Warmup,
    /// Objects idle long enough to move to a colder class
    Cooldown,
}

impl From<QueryArg> for QueryKind {
    fn from(arg: QueryArg) -> Self {
        match arg {
            QueryArg::Access => QueryKind::Access,
            QueryArg::Warmup => QueryKind::Warmup,
            QueryArg::Cooldown => QueryKind::Cooldown,
        }
    }
}
