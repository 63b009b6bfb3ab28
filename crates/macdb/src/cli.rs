//! Clap derive structures for the `macdb` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module may
//! only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// macdb -- MAC address inventory backed by CouchDB
#[derive(Debug, Parser)]
#[command(
    name = "macdb",
    version,
    about = "Manage a MAC address inventory stored in CouchDB",
    long_about = "Keeps one record per MAC address (connection type, device code, \
        free-form info) in a CouchDB database.\n\n\
        Server access comes from SERVER_CLIENT_ADDRESS, SERVER_HOST_PORT, \
        SERVER_USER and SERVER_PASSWORD, optionally layered over a TOML \
        config file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: $XDG_CONFIG_HOME/macdb/config.toml)
    #[arg(long, env = "MACDB_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database holding the records
    #[arg(long, env = "MACDB_COLLECTION", default_value = "macs", global = true)]
    pub collection: String,

    /// Output format for `show` and `list`
    #[arg(
        long,
        short = 'o',
        env = "MACDB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, env = "MACDB_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,

    /// Seconds to wait before retrying an unreachable server
    #[arg(long, env = "MACDB_RETRY_DELAY", default_value = "10", global = true)]
    pub retry_delay: u64,

    /// Retries after the first failed connection attempt (default: forever)
    #[arg(long, env = "MACDB_MAX_RETRIES", global = true)]
    pub max_retries: Option<u32>,

    /// How the retry delay grows between attempts
    #[arg(long, default_value = "fixed", global = true)]
    pub backoff: BackoffMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one MAC address per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackoffMode {
    /// Same delay every time
    Fixed,
    /// Double the delay after each failure, up to five minutes
    Exponential,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add or update a single MAC record
    UpsertOne(UpsertArgs),

    /// Add or update records from a CSV file (MAC,WE,code,info per line)
    ImportCsv {
        /// CSV file; reading stops at the first empty line
        file: PathBuf,
    },

    /// Write every record to stdout as CSV, sorted by MAC
    ExportCsv,

    /// Delete every record, keeping the database
    WipeAll,

    /// Show one record
    Show {
        /// MAC address (case-insensitive)
        #[arg(allow_hyphen_values = true)]
        mac: String,
    },

    /// Delete one record
    #[command(alias = "rm")]
    Remove {
        /// MAC address (case-insensitive)
        #[arg(allow_hyphen_values = true)]
        mac: String,
    },

    /// List every record, sorted by MAC
    #[command(alias = "ls")]
    List,

    /// Print how many records are stored
    Count,

    /// Delete every record and drop the database
    Destroy,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct UpsertArgs {
    /// MAC address; stored uppercased
    #[arg(allow_hyphen_values = true)]
    pub mac: String,

    /// Connection type: W (wifi) or E (wired ethernet)
    #[arg(allow_hyphen_values = true)]
    pub connection_type: String,

    /// Device code: RPi, APi, OPi, NVD, APL, AMZ, iPC or OTH
    #[arg(allow_hyphen_values = true)]
    pub device_code: String,

    /// Free-form description
    #[arg(allow_hyphen_values = true)]
    pub info: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
