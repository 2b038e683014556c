//! Message consumer: turns queued frames into distance reports.
//!
//! A consumer lives for one connection attempt. It loads the station table
//! on the first message it sees and keeps it for the rest of its life; a
//! failed load leaves it with an empty table rather than retrying mid-stream.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::distance::{DistanceReport, PlayerSample};
use crate::error::{LoadError, MessageError};
use crate::fetch::DocumentFetcher;
use crate::markers::{fetch_reference_table, ReferenceTable};
use crate::report::ReportSink;

pub struct Consumer {
    fetcher: Arc<dyn DocumentFetcher>,
    reporter: Arc<dyn ReportSink>,
    locator: String,
    declaration: String,
    table: Option<ReferenceTable>,
    load_error: Option<LoadError>,
    processed: u64,
}

impl Consumer {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        reporter: Arc<dyn ReportSink>,
        locator: impl Into<String>,
        declaration: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            reporter,
            locator: locator.into(),
            declaration: declaration.into(),
            table: None,
            load_error: None,
            processed: 0,
        }
    }

    /// The station table, once the first message has triggered a load.
    pub fn table(&self) -> Option<&ReferenceTable> {
        self.table.as_ref()
    }

    /// Why the table is empty, if loading failed.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Drains `queue` until `cancel` fires or the queue closes.
    ///
    /// Cancellation is only observed between messages. The queue is handed
    /// back so that frames still waiting in it survive for the next consumer.
    pub async fn run(
        mut self,
        mut queue: mpsc::Receiver<String>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<String> {
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = queue.recv() => match message {
                    Some(message) => message,
                    None => {
                        warn!("Frame queue closed, consumer exiting");
                        break;
                    }
                },
            };
            self.handle_message(&message).await;
        }

        debug!(
            "Consumer stopped after {} messages ({} still queued)",
            self.processed,
            queue.len()
        );
        queue
    }

    /// Processes one raw frame. Returns the report if one was emitted.
    pub async fn handle_message(&mut self, raw: &str) -> Option<DistanceReport> {
        self.processed += 1;

        let data = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}", MessageError::Decode(e));
                Value::String(raw.to_string())
            }
        };

        self.ensure_table().await;

        let Some(record) = data.as_object() else {
            self.reporter
                .diagnostic(&format!("Received non-object message: {data}"));
            return None;
        };

        let players = match record.get("players").and_then(Value::as_array) {
            Some(players) if !players.is_empty() => players,
            _ => return None,
        };

        let mut samples = Vec::with_capacity(players.len());
        for entry in players {
            match PlayerSample::from_value(entry) {
                Ok(sample) => samples.push(sample),
                Err(e) => self.reporter.diagnostic(&e.to_string()),
            }
        }

        let table = self.table.get_or_insert_with(ReferenceTable::default);
        let report = DistanceReport::compute(&samples, table);
        self.reporter.report(&report);
        Some(report)
    }

    async fn ensure_table(&mut self) {
        if self.table.is_some() {
            return;
        }

        let table = match fetch_reference_table(self.fetcher.as_ref(), &self.locator, &self.declaration).await {
            Ok(table) => table,
            Err(e) => {
                self.reporter
                    .diagnostic(&format!("Failed to load station markers: {e}"));
                self.load_error = Some(e);
                ReferenceTable::default()
            }
        };
        self.table = Some(table);
    }
}
