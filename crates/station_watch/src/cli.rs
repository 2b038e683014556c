//! Command-line interface for station_watch.
//!
//! Every option here overrides the matching value from the config file.

use clap::Parser;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Parser, Debug, Clone)]
#[command(name = "station_watch", author, version, about = "Live player-to-station distance monitor", long_about = None)]
pub struct CliArgs {
    /// Configuration file path
    ///
    /// If the file doesn't exist, a default configuration is written there.
    #[arg(short, long = "config", default_value = "station_watch.toml")]
    pub config_path: PathBuf,

    /// WebSocket URI of the live player feed
    #[arg(short, long = "stream")]
    pub stream_uri: Option<String>,

    /// Marker document locator (URL or local path)
    #[arg(short, long)]
    pub document: Option<String>,

    /// Write the loaded marker table to this file as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds to wait before reconnecting
    #[arg(long)]
    pub reconnect_delay: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,
}
