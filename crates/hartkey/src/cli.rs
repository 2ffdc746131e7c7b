//! Clap derive structures for the `hartkey` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hartkey -- keep an eye on (and open) Hartkey intercoms and gates
#[derive(Debug, Parser)]
#[command(
    name = "hartkey",
    version,
    about = "Monitor and open Hartkey intercoms and gates from the command line",
    long_about = "Polls the Hartkey cloud for your household's intercoms and gates and\n\
        their latest open events, and relays remote open commands.",
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
    /// Bearer token (overrides config and keyring)
    #[arg(long, env = "HARTKEY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Poll interval in minutes (1-1440)
    #[arg(long, short = 'i', global = true)]
    pub interval: Option<u64>,

    /// Output format [default: config value, else table]
    #[arg(long, short = 'o', env = "HARTKEY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "HARTKEY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The selected output format, `table` when nothing chose one.
    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List devices with their latest open event
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// List recent open events for a device
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// Open a door or gate
    Open(OpenArgs),

    /// Run the sync loop and print every update until Ctrl-C
    Watch,

    /// Show the buttons and sensors each device exposes
    Entities,

    /// Manage CLI configuration and the stored token
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Device ID or name
    pub device: String,

    /// Max events to show (1-100)
    #[arg(
        long,
        short = 'l',
        default_value = "10",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub limit: u32,
}

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Device ID or name
    pub device: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the current configuration (secrets masked)
    Show,

    /// Store a bearer token (read from stdin when omitted)
    SetToken {
        /// The token to store
        token: Option<String>,

        /// Check the token against the remote before storing it
        #[arg(long)]
        verify: bool,

        /// Write the token to the config file instead of the system keyring
        #[arg(long)]
        plaintext: bool,
    },

    /// Set the poll interval in minutes (1-1440)
    SetInterval {
        /// Minutes between polls
        minutes: u64,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
