use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stackwatch: live progress display for infrastructure stack deployments
#[derive(Parser, Debug, Clone)]
#[command(name = "stackwatch")]
#[command(version)]
#[command(about = "Live progress display for stack deployments", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH", env = "STACKWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Redraw interval in milliseconds. Overrides config.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Replay a recorded deployment with the live progress display
    Replay {
        /// JSON-lines recording of the deployment
        file: PathBuf,

        /// Playback speed multiplier. Overrides config.
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Write the default configuration file if none exists
    InitConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
