//! Clap derive structures for the `bigsync` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! module intentionally depends on nothing but `clap` and `clap_complete`
//! so `build.rs` can include it for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bigsync -- declarative reconciliation for BIG-IP partitions
#[derive(Debug, Parser)]
#[command(
    name = "bigsync",
    version,
    about = "Converge a BIG-IP partition toward a declared service document",
    long_about = "Reads a JSON service document, diffs it against the live state of a\n\
        BIG-IP partition over iControl REST, and issues the create/update/delete\n\
        operations needed to make the device match the document.\n\n\
        Passes are idempotent: a converged partition produces zero operations.",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "BIGSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device management host or URL (overrides profile)
    #[arg(long, env = "BIGSYNC_HOST", global = true)]
    pub host: Option<String>,

    /// Partition to reconcile (overrides profile)
    #[arg(long, short = 'P', env = "BIGSYNC_PARTITION", global = true)]
    pub partition: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'f',
        env = "BIGSYNC_FORMAT",
        default_value = "table",
        global = true
    )]
    pub format: OutputFormat,

    /// Max in-flight device operations per resource kind
    #[arg(long, short = 'j', env = "BIGSYNC_JOBS", global = true)]
    pub jobs: Option<usize>,

    /// Accept self-signed management certificates
    #[arg(long, short = 'k', env = "BIGSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BIGSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a reconciliation pass from a service document
    Apply(ApplyArgs),

    /// Show what a pass would change, without writing anything
    #[command(alias = "plan")]
    Diff(DiffArgs),

    /// Show connectivity and partition object counts
    #[command(alias = "st")]
    Status,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Apply ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Path to the JSON service document
    pub document: PathBuf,

    /// Keep reconciling on an interval until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Seconds between passes in watch mode
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,

    /// Compute and render the plan instead of applying it
    #[arg(long, conflicts_with = "watch")]
    pub dry_run: bool,
}

// ── Diff ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Path to the JSON service document
    pub document: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the initial config file with guided setup
    Init,

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Config key (host, partition, auth, username, password-env,
        /// insecure, timeout, jobs)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to make the default
        name: String,
    },

    /// Store a username and keyring password for a profile
    SetCredentials {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
