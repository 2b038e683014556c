//! Reconnection supervisor.
//!
//! Each attempt pairs one receiver with a freshly spawned consumer. When the
//! receiver ends, the consumer gets a short grace period to finish what it
//! has dequeued, is cancelled, and hands the queue back. A consumer that does
//! not stop within `cancel_timeout` (stuck in a fetch, say) is aborted and the
//! next attempt starts on a fresh queue. The supervisor then waits
//! `reconnect_delay` and starts over. Only the shutdown token ends the loop.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::FeedConfig;
use crate::connection::{FrameSink, FrameSource};
use crate::consumer::Consumer;
use crate::fetch::DocumentFetcher;
use crate::report::ReportSink;

/// Keeps one feed alive: connects, consumes, backs off, reconnects.
pub struct Supervisor {
    config: FeedConfig,
    source: Arc<dyn FrameSource>,
    fetcher: Arc<dyn DocumentFetcher>,
    reporter: Arc<dyn ReportSink>,
}

impl Supervisor {
    /// Creates a supervisor.
    ///
    /// # Arguments
    ///
    /// * `config` - Pacing, queue capacity and the marker document to load
    /// * `source` - Connection that produces frames, one call per attempt
    /// * `fetcher` - Used by every consumer to load its own marker table
    /// * `reporter` - Receives reports and per-message diagnostics
    pub fn new(
        config: FeedConfig,
        source: Arc<dyn FrameSource>,
        fetcher: Arc<dyn DocumentFetcher>,
        reporter: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            config,
            source,
            fetcher,
            reporter,
        }
    }

    /// Runs attempts until `shutdown` is cancelled.
    ///
    /// Shutdown is immediate: an in-flight attempt is dropped and its
    /// consumer stops at its next message boundary.
    pub async fn run(&self, shutdown: CancellationToken) {
        let capacity = self.config.queue_capacity.max(1);
        let (mut sink, receiver) = mpsc::channel(capacity);
        let mut queue = Some(receiver);
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let receiver = match queue.take() {
                Some(receiver) => receiver,
                None => {
                    let (fresh_sink, fresh_receiver) = mpsc::channel(capacity);
                    sink = fresh_sink;
                    fresh_receiver
                }
            };

            info!(
                "🚀 Connection attempt {} to {}",
                attempt, self.config.stream_target
            );
            tokio::select! {
                returned = self.run_attempt(&sink, receiver, &shutdown) => queue = returned,
                _ = shutdown.cancelled() => {
                    info!("🛑 Supervisor shutting down during attempt {}", attempt);
                    return;
                }
            }

            info!(
                "🔄 Reconnecting in {:.1} seconds...",
                self.config.reconnect_delay.as_secs_f64()
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown.cancelled() => {
                    info!("🛑 Supervisor shutting down during backoff");
                    return;
                }
            }
        }
    }

    /// Runs one receiver/consumer pair to completion.
    ///
    /// # Returns
    ///
    /// The queue for the next attempt, or `None` if the consumer task died or
    /// had to be aborted and took the queue along.
    pub async fn run_attempt(
        &self,
        sink: &FrameSink,
        queue: mpsc::Receiver<String>,
        shutdown: &CancellationToken,
    ) -> Option<mpsc::Receiver<String>> {
        let cancel = shutdown.child_token();
        let consumer = Consumer::new(
            self.fetcher.clone(),
            self.reporter.clone(),
            self.config.document_locator.clone(),
            self.config.declaration.clone(),
        );
        let mut handle = tokio::spawn(consumer.run(queue, cancel.clone()));

        let cause = self.source.receive(sink).await;
        if cause.is_connect_failure() {
            warn!("WebSocket connection failed: {}", cause);
        } else {
            warn!("WebSocket error: {}", cause);
        }

        tokio::time::sleep(self.config.grace_period).await;
        cancel.cancel();

        match tokio::time::timeout(self.config.cancel_timeout, &mut handle).await {
            Ok(Ok(queue)) => Some(queue),
            Ok(Err(e)) => {
                error!("Consumer task failed: {}", e);
                None
            }
            Err(_) => {
                handle.abort();
                error!(
                    "Consumer did not stop within {:?} of cancellation; aborted",
                    self.config.cancel_timeout
                );
                None
            }
        }
    }
}
