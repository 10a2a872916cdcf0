use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hearth")]
#[command(version)]
#[command(about = "Reconcile your workstation and inventory its tools", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Platform to reconcile for (defaults to the host's)
    #[arg(long, global = true, env = "HEARTH_PLATFORM")]
    pub platform: Option<String>,

    /// Config file (defaults to ~/.config/hearth/config.toml)
    #[arg(long, global = true, env = "HEARTH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate every configuration group
    Status(GroupArgs),

    /// Install whatever is missing
    Apply(ChangeArgs),

    /// Remove whatever is present
    Reset(ChangeArgs),

    /// Probe installed package managers, cloud CLIs and tool versions
    Inventory(InventoryArgs),

    /// Count AWS resources per profile and region
    Resources(ResourcesArgs),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct GroupArgs {
    /// Only these groups (repeatable)
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,
}

#[derive(Args)]
pub struct ChangeArgs {
    /// Only these groups (repeatable)
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct InventoryArgs {
    /// Per-probe timeout in seconds (overrides config)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ResourcesArgs {
    /// AWS profile (repeatable; overrides config)
    #[arg(long = "profile", value_name = "PROFILE")]
    pub profiles: Vec<String>,

    /// AWS region (repeatable; overrides config)
    #[arg(long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Include regions with no resources
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Check the config file and list the groups it declares
    Validate,
}
