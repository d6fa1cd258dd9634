//! Thread-safe FIFO of pending work items.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::work::WorkItem;

/// Mutex-guarded FIFO holding work items until the next drain.
///
/// Insertion order is significant: items are drained in exactly the order
/// they were pushed. Every operation holds the lock only for the append or
/// bulk-remove itself; no operation invokes a work item while the lock is
/// held, so an item is free to enqueue more work from its own body.
pub(crate) struct TaskQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl TaskQueue {
    /// Creates a queue with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends an item at the tail.
    pub fn push(&self, item: WorkItem) {
        self.items.lock().push_back(item);
    }

    /// Atomically removes and returns every currently queued item, in order.
    ///
    /// A push racing with this call lands either in the returned batch or in
    /// the next one, never both and never lost.
    pub fn drain_all(&self) -> VecDeque<WorkItem> {
        std::mem::take(&mut *self.items.lock())
    }

    /// Discards all pending items without executing them.
    ///
    /// Returns the number of items discarded.
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let discarded = items.len();
        items.clear();
        discarded
    }

    /// Point-in-time count of pending items; may be stale immediately after.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}
