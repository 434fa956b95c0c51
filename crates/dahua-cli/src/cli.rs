//! Clap derive structures for the `dahua` CLI.
//!
//! Only depends on clap so the build script can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dahua -- query and control Dahua cameras and doorbells
#[derive(Debug, Parser)]
#[command(
    name = "dahua",
    version,
    about = "Query and control Dahua IP cameras and doorbells",
    long_about = "Talks to a Dahua (or Amcrest / Lorex OEM) device over its HTTP CGI API.\n\n\
        One-shot state queries, live event watching, and a handful of\n\
        device commands (motion detection, infrared light).",
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
    #[arg(long, short = 'p', env = "DAHUA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address or base URL (overrides profile)
    #[arg(long, short = 'a', env = "DAHUA_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Device username (overrides profile)
    #[arg(long, short = 'u', env = "DAHUA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Device password
    #[arg(long, env = "DAHUA_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DAHUA_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DAHUA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "DAHUA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Verify the credentials against the device
    Check,

    /// Show model, firmware, capabilities and derived state
    #[command(alias = "i")]
    Info,

    /// Dump the raw key/value state after one refresh
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Stream device events until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Enable or disable motion detection
    Motion(MotionArgs),

    /// Set the infrared light mode
    #[command(alias = "ir")]
    Infrared(InfraredArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Only show keys starting with this prefix (e.g. "table.Lighting")
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Event codes to subscribe to (comma-separated; default from profile)
    #[arg(long, short = 'e', value_delimiter = ',')]
    pub events: Vec<String>,

    /// Exit after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MotionArgs {
    pub state: Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct InfraredArgs {
    pub mode: InfraredModeArg,

    /// Brightness in percent
    #[arg(long, short = 'b', default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub brightness: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InfraredModeArg {
    On,
    Off,
    Auto,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
