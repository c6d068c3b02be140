//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// VoxCourier - resilient step-by-step interview recorder
#[derive(Parser, Debug)]
#[command(name = "vox-courier")]
#[command(version = "0.1.0")]
#[command(about = "Record interview answers step by step and upload each one reliably")]
#[command(long_about = None)]
pub struct Cli {
    /// Session identity token issued during sign-in
    #[arg(short = 't', long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Destination folder assigned to this session
    #[arg(short = 'f', long, value_name = "FOLDER")]
    pub folder: Option<String>,

    /// Collector base URL
    #[arg(long, value_name = "URL")]
    pub collector_url: Option<String>,

    /// Number of interview steps
    #[arg(short = 's', long, value_name = "COUNT")]
    pub steps: Option<u32>,

    /// Automatic retries per upload before asking to retry manually
    #[arg(short = 'r', long, value_name = "COUNT")]
    pub retries: Option<u32>,

    /// Initial backoff delay in milliseconds (doubles per retry)
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Play audio cues when recording starts and stops
    #[arg(short = 'c', long)]
    pub cues: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Discard the persisted session and start fresh next run
    Reset,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "collector_url",
    "steps",
    "retry_budget",
    "base_delay_ms",
    "cues",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
