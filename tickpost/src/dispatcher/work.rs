//! Work items and fault-isolated invocation.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::error::ItemPanic;

/// A zero-argument deferred operation submitted for affinity-thread execution.
///
/// The queue owns the item from enqueue time until it is dequeued and invoked,
/// after which it is discarded. Items carry no identity beyond their queue
/// position.
pub(crate) struct WorkItem {
    op: Box<dyn FnOnce() + Send + 'static>,
}

impl WorkItem {
    /// Wraps an operation as a work item.
    pub fn new(op: impl FnOnce() + Send + 'static) -> Self {
        Self { op: Box::new(op) }
    }

    /// Consumes and invokes the item, capturing any panic from its body.
    ///
    /// Must be called outside the queue lock: the body may enqueue more work.
    pub(crate) fn invoke(self) -> Result<(), ItemPanic> {
        run_captured(self.op)
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem").finish_non_exhaustive()
    }
}

/// Runs `f`, converting an unwinding panic into an [`ItemPanic`].
pub(crate) fn run_captured<T>(f: impl FnOnce() -> T) -> Result<T, ItemPanic> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| ItemPanic::from_payload(payload.as_ref()))
}
