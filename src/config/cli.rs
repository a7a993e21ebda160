use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line flags. Anything left unset falls back to `--config`, then to
/// built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "loyalty-tiers")]
#[command(about = "Aggregates loyalty points per customer and summarises them per tier")]
pub struct CliConfig {
    /// Raw transaction CSV
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub intermediate_dir: Option<String>,

    #[arg(long)]
    pub final_dir: Option<String>,

    /// Lines containing this token are skipped as headers
    #[arg(long)]
    pub header_token: Option<String>,

    #[arg(long)]
    pub workers: Option<usize>,

    /// Replace output directories left by an earlier successful run
    #[arg(long)]
    pub overwrite: bool,

    /// TOML job file
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub execution_id: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[arg(long, help = "Print the resolved plan without running it")]
    pub dry_run: bool,
}
