//! Per-tick drain of the pending queue.
//!
//! Invoked once per tick by the host, on the affinity thread. Items run
//! outside any lock, each individually fault-isolated: one failing item must
//! not stop the rest of its batch, and no failure reaches the tick caller.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

use super::core::AffinityDispatcher;
use super::error::ItemPanic;
use super::report::{FailureOrigin, FailureReport};

impl AffinityDispatcher {
    /// Drains and executes all currently queued items, in enqueue order.
    ///
    /// Skipped entirely when the host context is inactive or the dispatcher
    /// is shutting down; in both cases pending items stay queued. A panic in
    /// the batch machinery itself (as opposed to an item body) discards the
    /// remainder of that tick's batch rather than retrying it.
    ///
    /// Returns the number of items executed this tick.
    pub fn drain(&self) -> usize {
        if !self.is_affinity_thread() {
            warn!(label = %self.config.label, "Drain invoked off the affinity thread; ignoring");
            return 0;
        }
        if !self.host.is_active() {
            trace!(label = %self.config.label, "Host inactive; skipping drain");
            return 0;
        }
        // Checked once before the per-item loop: a flag set mid-batch does
        // not abort the batch, but a flag already set here means no item is
        // even considered, and the queue is left as the quit signal found it.
        if self.is_shutting_down() {
            debug!(
                label = %self.config.label,
                pending = self.queued_count(),
                "Shutting down; skipping drain"
            );
            return 0;
        }

        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return 0;
        }
        let total = batch.len();
        trace!(label = %self.config.label, batch = total, "Draining work queue");

        let executed = Cell::new(0usize);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for item in batch {
                self.run_isolated(item, FailureOrigin::Drain, total - executed.get() - 1);
                executed.set(executed.get() + 1);
            }
        }));

        if let Err(payload) = outcome {
            // Machinery failure: the unexecuted remainder of the batch was
            // dropped with the unwound loop, not retried.
            self.reports.report(FailureReport {
                origin: FailureOrigin::Batch,
                panic: ItemPanic::from_payload(payload.as_ref()),
                remaining_in_batch: total - executed.get(),
            });
        }

        executed.get()
    }
}
