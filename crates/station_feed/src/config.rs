//! Feed configuration types and defaults.
//!
//! This module contains the configuration structure used to build a
//! [`Supervisor`](crate::supervisor::Supervisor) and the default values used
//! when the binary's config file leaves something out.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::raw_file_url;
use crate::markers::DEFAULT_DECLARATION;

/// Default live map feed.
pub const DEFAULT_STREAM_TARGET: &str = "wss://map.dovedale.wiki/ws";

/// Configuration for one feed pipeline.
///
/// Contains where the marker document lives, which WebSocket to follow, and
/// how the supervisor paces reconnects.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Locator handed to the document fetcher (URL or local path)
    pub document_locator: String,

    /// Name of the `const` declaration holding the markers
    pub declaration: String,

    /// WebSocket URI of the live player feed
    pub stream_target: String,

    /// Wait between a terminated attempt and the next connect
    pub reconnect_delay: Duration,

    /// Time the consumer gets to drain queued frames after the receiver ends
    pub grace_period: Duration,

    /// How long a cancelled consumer may take to finish its current message
    /// before its task is aborted
    pub cancel_timeout: Duration,

    /// Capacity of the frame queue; a full queue blocks the receiver
    pub queue_capacity: usize,

    /// Where to dump the startup marker table, if anywhere
    pub output_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            document_locator: raw_file_url(
                "https://raw.githubusercontent.com",
                "dovedalerailway",
                "dovedale-map",
                "main",
                "public/index.js",
            ),
            declaration: DEFAULT_DECLARATION.to_string(),
            stream_target: DEFAULT_STREAM_TARGET.to_string(),
            reconnect_delay: Duration::from_secs(5),
            grace_period: Duration::from_millis(100),
            cancel_timeout: Duration::from_secs(2),
            queue_capacity: 1024,
            output_path: None,
        }
    }
}
