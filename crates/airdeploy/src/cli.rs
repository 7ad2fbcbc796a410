//! Clap derive structures for the `airdeploy` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap + clap_complete so `build.rs` can include it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airdeploy -- deploy WLANs across sites and keep them in sync
#[derive(Debug, Parser)]
#[command(
    name = "airdeploy",
    version,
    about = "Deploy WLANs to controller profiles and reconcile drift",
    long_about = "Deploys a WLAN to every profile selected by per-site policies,\n\
        records the intended state locally, and reconciles it against the\n\
        controller to detect and remediate drift.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "AIRDEPLOY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "AIRDEPLOY_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller API key
    #[arg(long, env = "AIRDEPLOY_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Directory holding the assignment store (overrides config)
    #[arg(long, env = "AIRDEPLOY_STORE_DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRDEPLOY_OUTPUT",
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

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "AIRDEPLOY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "AIRDEPLOY_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output, Color & Log Enums ────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a WLAN and assign it to every profile selected by site policies
    #[command(alias = "d")]
    Deploy(DeployArgs),

    /// Compare recorded assignments with the controller
    #[command(alias = "rec")]
    Reconcile(ReconcileArgs),

    /// Plan and apply fixes for detected mismatches
    #[command(alias = "fix")]
    Remediate(RemediateArgs),

    /// Show deployment status of tracked WLANs
    #[command(alias = "st")]
    Status(StatusArgs),

    /// List recorded assignments for a WLAN
    #[command(alias = "ls")]
    Assignments(AssignmentsArgs),

    /// Compare intended and observed WLANs at a site
    #[command(alias = "inv")]
    Inventory(InventoryArgs),

    /// Delete a WLAN from the controller and forget its assignments
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEPLOY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// SSID to broadcast
    #[arg(long, required_unless_present = "from_file")]
    pub ssid: Option<String>,

    /// Display name (defaults to the SSID)
    #[arg(long)]
    pub name: Option<String>,

    /// Security mode
    #[arg(long, default_value = "wpa2-personal", value_enum)]
    pub security: WlanSecurityArg,

    /// Pre-shared key for personal security modes
    #[arg(long, env = "AIRDEPLOY_PASSPHRASE", hide_env = true)]
    pub passphrase: Option<String>,

    /// VLAN tag
    #[arg(long)]
    pub vlan: Option<u16>,

    /// Radio band
    #[arg(long, default_value = "all", value_enum)]
    pub band: WlanBandArg,

    /// Create the WLAN disabled
    #[arg(long)]
    pub disabled: bool,

    /// Deploy to every profile at SITE (repeatable)
    #[arg(long = "site", value_name = "SITE")]
    pub sites: Vec<String>,

    /// Deploy only to the listed profiles at a site (repeatable)
    #[arg(long = "include", value_name = "SITE:PROFILE[,PROFILE...]")]
    pub include: Vec<String>,

    /// Deploy to every profile at a site except the listed ones (repeatable)
    #[arg(long = "exclude", value_name = "SITE:PROFILE[,PROFILE...]")]
    pub exclude: Vec<String>,

    /// Read WLAN settings and site policies from a JSON or YAML plan
    #[arg(
        long,
        short = 'F',
        conflicts_with_all = &["ssid", "name", "sites", "include", "exclude"]
    )]
    pub from_file: Option<PathBuf>,

    /// Compute and show the target profiles without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip pushing configuration to devices after assignment
    #[arg(long)]
    pub no_sync: bool,

    /// Assignment calls in flight at once (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub batch_size: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WlanSecurityArg {
    Open,
    Wpa2Personal,
    Wpa3Personal,
    Wpa2Wpa3Personal,
    Wpa2Enterprise,
    Wpa3Enterprise,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WlanBandArg {
    #[value(name = "2.4")]
    Band2_4,
    #[value(name = "5")]
    Band5,
    #[value(name = "6")]
    Band6,
    All,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RECONCILE / REMEDIATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// WLAN ID to reconcile
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub wlan: Option<String>,

    /// Reconcile every tracked WLAN
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct RemediateArgs {
    /// WLAN ID to remediate
    pub wlan: String,

    /// Show the planned actions without executing them
    #[arg(long)]
    pub plan_only: bool,

    /// Skip the reconciliation pass that refreshes mismatches first
    #[arg(long)]
    pub no_reconcile: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS / ASSIGNMENTS / INVENTORY / DELETE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// WLAN ID (all tracked WLANs when omitted)
    pub wlan: Option<String>,
}

#[derive(Debug, Args)]
pub struct AssignmentsArgs {
    /// WLAN ID
    pub wlan: String,

    /// Show site policies instead of profile assignments
    #[arg(long)]
    pub sites: bool,

    /// Only show assignments with a mismatch or failed sync
    #[arg(long)]
    pub unhealthy: bool,
}

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Site ID
    pub site: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// WLAN ID
    pub wlan: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
