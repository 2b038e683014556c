//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::distance::DistanceReport;
use crate::error::RetrievalError;
use crate::fetch::DocumentFetcher;
use crate::report::ReportSink;

/// Serves a fixed document (or a fixed failure) and counts calls.
pub(crate) struct MockFetcher {
    document: Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn with_document(document: &str) -> Self {
        Self {
            document: Ok(document.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            document: Err(reason.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch_text(&self, locator: &str) -> Result<String, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.document.clone().map_err(|reason| RetrievalError::Request {
            locator: locator.to_string(),
            reason,
        })
    }
}

/// Keeps everything it is given.
#[derive(Default)]
pub(crate) struct CollectingSink {
    reports: Mutex<Vec<DistanceReport>>,
    diagnostics: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub(crate) fn reports(&self) -> Vec<DistanceReport> {
        self.reports.lock().unwrap().clone()
    }

    pub(crate) fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().unwrap().clone()
    }
}

impl ReportSink for CollectingSink {
    fn report(&self, report: &DistanceReport) {
        self.reports.lock().unwrap().push(report.clone());
    }

    fn diagnostic(&self, message: &str) {
        self.diagnostics.lock().unwrap().push(message.to_string());
    }
}
