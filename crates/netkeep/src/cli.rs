//! Clap derive structures for the `netkeep` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netkeep -- self-hosted network inventory and IPAM
#[derive(Debug, Parser)]
#[command(
    name = "netkeep",
    version,
    about = "Track devices, subnets, VLANs, and WiFi networks for a site",
    long_about = "Self-hosted network inventory and IPAM manager.\n\n\
        Run the API server with `netkeep serve`, then manage the inventory\n\
        and site backups from this CLI or any HTTP client.",
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
    /// Base URL of the netkeep server
    #[arg(
        long,
        env = "NETKEEP_SERVER",
        default_value = "http://127.0.0.1:8420",
        global = true
    )]
    pub server: String,

    /// Site slug the commands operate on
    #[arg(long, short = 's', env = "NETKEEP_SITE", default_value = "default", global = true)]
    pub site: String,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETKEEP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the netkeep API server
    Serve(ServeArgs),

    /// Export or restore full-site backups
    Backup(BackupArgs),

    /// Inspect inventory devices
    Devices(DevicesArgs),

    /// Inspect subnets and their utilization
    Subnets(SubnetsArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides the config file)
    #[arg(long)]
    pub listen: Option<String>,

    /// Path to a config file (default: the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Download a snapshot of the site to a JSON file
    Export {
        /// Output file (default: <site>-backup-<date>.json)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
    /// Replace ALL data under the site with a snapshot file
    Import {
        /// Snapshot file produced by `backup export`
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List the site's devices
    List,
}

#[derive(Debug, Args)]
pub struct SubnetsArgs {
    #[command(subcommand)]
    pub command: SubnetsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubnetsCommand {
    /// List the site's subnets with utilization
    List,
}
