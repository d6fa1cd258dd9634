//! Failure reporting for dispatched work.
//!
//! By the time a queued item runs, its submitter may be long gone, so item
//! failures are never propagated back through the enqueue call. They are
//! reported through a sink abstraction instead — the dispatcher doesn't know
//! how reports are consumed, it only emits them ("emit, don't present").
//! Consumers (logging, metrics, crash reporting) decide how to present or
//! aggregate them.

use std::fmt;

use tracing::error;

use super::error::ItemPanic;

/// Where a failure was captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Same-thread fast path: the item ran inside the enqueue call itself.
    FastPath,

    /// Normal drain execution on the affinity thread.
    Drain,

    /// The drain machinery, not an individual item. The remainder of that
    /// tick's batch was discarded.
    Batch,
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FastPath => write!(f, "fast-path"),
            Self::Drain => write!(f, "drain"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// A failure captured at the execution boundary.
#[derive(Clone, Debug)]
pub struct FailureReport {
    /// Where the failure was captured.
    pub origin: FailureOrigin,

    /// The captured panic.
    pub panic: ItemPanic,

    /// Items still pending in the same batch when the failure was captured.
    /// For a `Batch` origin these items were discarded, not retried.
    pub remaining_in_batch: usize,
}

/// Sink for failure reports.
pub trait ReportSink: Send + Sync {
    /// Consumes one failure report.
    fn report(&self, report: FailureReport);
}

/// Reports failures through `tracing` at error level.
///
/// This is the default sink.
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn report(&self, report: FailureReport) {
        error!(
            origin = %report.origin,
            panic = %report.panic,
            remaining_in_batch = report.remaining_in_batch,
            "Dispatched item failed"
        );
    }
}

/// Discards all reports.
pub struct NullReportSink;

impl ReportSink for NullReportSink {
    fn report(&self, _report: FailureReport) {}
}
