use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drift")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative configuration for network devices", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the manifest file
    #[arg(short, long, global = true, env = "DRIFT_MANIFEST")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview drift between declared and live state
    Plan,

    /// Converge live state to declared state
    Apply(ApplyArgs),

    /// Show declared resources and their live state
    Status,

    /// Validate the manifest without touching a device
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Don't enforce anything, only report what would change
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of resources reconciled concurrently
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}
