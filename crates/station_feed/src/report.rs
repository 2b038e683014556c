//! Output side of the consumer.

use tracing::{info, warn};

use crate::distance::DistanceReport;

/// Receives finished reports and diagnostics. Implementations must not block.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: &DistanceReport);

    fn diagnostic(&self, message: &str);
}

/// Writes reports and diagnostics through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LogReporter;

impl ReportSink for LogReporter {
    fn report(&self, report: &DistanceReport) {
        info!(players = report.len(), "📏 {}", report);
    }

    fn diagnostic(&self, message: &str) {
        warn!("{}", message);
    }
}
