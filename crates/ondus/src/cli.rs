//! Clap derive structures for the `ondus` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ondus_api::WaterType;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ondus -- browse and control GROHE ONDUS appliances
#[derive(Debug, Parser)]
#[command(
    name = "ondus",
    version,
    about = "Browse and control GROHE smart-home appliances from the command line",
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
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, env = "ONDUS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Refresh token (overrides config)
    #[arg(long, global = true)]
    pub refresh_token: Option<String>,

    /// API root (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates (debugging proxies)
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the dashboard and print the full location/room/appliance tree
    Tree,

    /// List locations
    Locations,

    /// List rooms across all locations
    Rooms,

    /// List supported appliances across all rooms
    Appliances,

    /// Dispense water from a GROHE Blue Home tap
    Tap(TapArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct TapArgs {
    /// Appliance id of the tap
    #[arg(long, short = 'a')]
    pub appliance: String,

    /// Water type to dispense
    #[arg(long, short = 'w', default_value = "still")]
    pub water: WaterArg,

    /// Amount in millilitres
    #[arg(long, short = 'm', value_parser = clap::value_parser!(u32).range(1..=2000))]
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WaterArg {
    Still,
    Carbonated,
}

impl From<WaterArg> for WaterType {
    fn from(arg: WaterArg) -> Self {
        match arg {
            WaterArg::Still => Self::Still,
            WaterArg::Carbonated => Self::Carbonated,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
