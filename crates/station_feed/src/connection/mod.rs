//! Stream receivers.
//!
//! A receiver models exactly one connection attempt: it connects, pushes
//! every frame into the queue, and returns the reason it stopped. Retrying is
//! left to the supervisor.

pub mod websocket;

pub use websocket::WebSocketReceiver;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StreamError;

/// Sending half of the frame queue.
pub type FrameSink = mpsc::Sender<String>;

/// A source of raw text frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Runs one connection until it ends and returns the cause.
    ///
    /// Frames are pushed in arrival order; a full queue suspends the
    /// receiver until the consumer catches up.
    async fn receive(&self, sink: &FrameSink) -> StreamError;
}
