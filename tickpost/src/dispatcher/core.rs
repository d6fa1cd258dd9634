//! Dispatcher core - struct and dispatch API.
//!
//! This module contains the [`AffinityDispatcher`] struct and the enqueue
//! entry points. The per-tick drain is implemented in the `drain` module.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{debug, trace};

use crate::host::Host;

use super::config::DispatcherConfig;
use super::error::DispatchError;
use super::queue::TaskQueue;
use super::report::{FailureOrigin, FailureReport, ReportSink, TracingReportSink};
use super::resumable::Resumable;
use super::ticket::{self, CompletionTicket};
use super::work::{self, WorkItem};

/// The affinity dispatcher: a thread-safe handoff queue with a same-thread
/// fast path.
///
/// Any number of producer threads enqueue work; exactly one consumer thread
/// (the affinity thread) executes it, either immediately (when the producer
/// *is* the affinity thread) or during the per-tick drain.
///
/// Most embedders obtain a shared instance through the
/// [`registry`](crate::registry); hosts that prefer explicit ownership can
/// construct one directly with [`new`](Self::new) and share the `Arc`.
pub struct AffinityDispatcher {
    /// Pending cross-thread work.
    pub(crate) queue: TaskQueue,

    /// The one thread allowed to execute dispatched work. Fixed for the
    /// lifetime of the instance.
    pub(crate) affinity: ThreadId,

    /// Hosting context; gates resumable acceptance and tick draining.
    pub(crate) host: Arc<dyn Host>,

    /// Failure report sink.
    pub(crate) reports: Arc<dyn ReportSink>,

    /// Set by the quit signal, monotonic for the life of this instance. Only
    /// a full registry reset yields a dispatcher with a clear flag again.
    pub(crate) shutting_down: Arc<AtomicBool>,

    /// Configuration, fixed at construction.
    pub(crate) config: DispatcherConfig,
}

impl AffinityDispatcher {
    /// Creates a dispatcher bound to the calling thread, reporting failures
    /// through `tracing`.
    pub fn new(config: DispatcherConfig, host: Arc<dyn Host>) -> Arc<Self> {
        Self::with_report_sink(config, host, Arc::new(TracingReportSink))
    }

    /// Creates a dispatcher bound to the calling thread with a custom
    /// failure report sink.
    pub fn with_report_sink(
        config: DispatcherConfig,
        host: Arc<dyn Host>,
        reports: Arc<dyn ReportSink>,
    ) -> Arc<Self> {
        Self::bound(
            config,
            host,
            reports,
            thread::current().id(),
            Arc::new(AtomicBool::new(false)),
        )
    }

    /// Creates a dispatcher with an explicit affinity identity and a shared
    /// shutdown flag.
    ///
    /// Used by the registry, which fixes the affinity thread at first-ever
    /// construction and owns the flag across instance lifetimes.
    pub(crate) fn bound(
        config: DispatcherConfig,
        host: Arc<dyn Host>,
        reports: Arc<dyn ReportSink>,
        affinity: ThreadId,
        shutting_down: Arc<AtomicBool>,
    ) -> Arc<Self> {
        debug!(label = %config.label, affinity = ?affinity, "Dispatcher created");
        Arc::new(Self {
            queue: TaskQueue::with_capacity(config.queue_capacity),
            affinity,
            host,
            reports,
            shutting_down,
            config,
        })
    }

    /// Identity of the affinity thread.
    pub fn affinity_thread(&self) -> ThreadId {
        self.affinity
    }

    /// True if the calling thread is the affinity thread.
    pub fn is_affinity_thread(&self) -> bool {
        thread::current().id() == self.affinity
    }

    /// True once the quit signal has been seen.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Marks the dispatcher unavailable.
    ///
    /// All later dispatch calls fail with
    /// [`DispatchError::Unavailable`]; already-queued work is left in place,
    /// not cleared.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        debug!(label = %self.config.label, "Dispatcher shutting down");
    }

    /// Schedules `op` to run on the affinity thread.
    ///
    /// Called from the affinity thread itself, `op` runs synchronously before
    /// this returns, bypassing the queue, with the same fault isolation as
    /// drain-time execution: a panic in `op` is reported through the sink,
    /// never propagated, so callers cannot distinguish immediate from queued
    /// execution by failure behavior.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unavailable`] if the dispatcher is shutting
    /// down.
    pub fn enqueue(&self, op: impl FnOnce() + Send + 'static) -> Result<(), DispatchError> {
        self.enqueue_item(WorkItem::new(op))
    }

    /// Schedules `op` and returns a ticket for its result.
    ///
    /// The operation is wrapped so that a normal return resolves the ticket
    /// with `Ok` and a panic resolves it with the captured failure — an item
    /// that runs never leaves its ticket unresolved. The ticket is returned
    /// immediately and may be awaited from any thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unavailable`] if the dispatcher is shutting
    /// down.
    pub fn enqueue_async<T, F>(&self, op: F) -> Result<CompletionTicket<T>, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (resolver, ticket) = ticket::channel();
        self.enqueue(move || resolver.resolve(work::run_captured(op)))?;
        Ok(ticket)
    }

    /// Submits a resumable sequence for the host's executor.
    ///
    /// The checks happen at call time, not at drain time, so the caller gets
    /// an immediate, synchronous rejection. On success the sequence is handed
    /// to [`Host::start_resumable`] on the affinity thread (immediately when
    /// called from it, otherwise during the next drain).
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidArgument`] if the sequence has no steps
    /// - [`DispatchError::Unavailable`] if the dispatcher is shutting down
    /// - [`DispatchError::InvalidOperation`] if the host context is inactive
    pub fn enqueue_resumable(&self, sequence: Resumable) -> Result<(), DispatchError> {
        if sequence.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "resumable sequence has no steps",
            ));
        }
        if self.is_shutting_down() {
            return Err(DispatchError::Unavailable("dispatcher is shutting down"));
        }
        if !self.host.is_active() {
            return Err(DispatchError::InvalidOperation(
                "host context is inactive and cannot take a resumable sequence",
            ));
        }
        let host = Arc::clone(&self.host);
        self.enqueue_item(WorkItem::new(move || host.start_resumable(sequence)))
    }

    /// Generic post convenience: ignores `state` and forwards to
    /// [`enqueue`](Self::enqueue).
    pub fn post<S>(
        &self,
        action: impl FnOnce() + Send + 'static,
        _state: S,
    ) -> Result<(), DispatchError> {
        self.enqueue(action)
    }

    /// Discards all pending items without executing them.
    ///
    /// Does not cancel an item already mid-execution. Returns the number of
    /// items discarded.
    pub fn clear_queue(&self) -> usize {
        let discarded = self.queue.clear();
        if discarded > 0 {
            debug!(label = %self.config.label, discarded, "Cleared pending work queue");
        }
        discarded
    }

    /// Point-in-time count of pending items.
    ///
    /// Accurate at some instant during the call; may be stale immediately
    /// after it returns.
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Shared enqueue path for plain and wrapped items.
    pub(crate) fn enqueue_item(&self, item: WorkItem) -> Result<(), DispatchError> {
        if self.is_shutting_down() {
            return Err(DispatchError::Unavailable("dispatcher is shutting down"));
        }
        if self.is_affinity_thread() {
            trace!(label = %self.config.label, "Running item on the same-thread fast path");
            self.run_isolated(item, FailureOrigin::FastPath, 0);
            return Ok(());
        }
        self.queue.push(item);
        Ok(())
    }

    /// Invokes one item, reporting a panic instead of propagating it.
    pub(crate) fn run_isolated(
        &self,
        item: WorkItem,
        origin: FailureOrigin,
        remaining_in_batch: usize,
    ) {
        if let Err(panic) = item.invoke() {
            self.reports.report(FailureReport {
                origin,
                panic,
                remaining_in_batch,
            });
        }
    }
}

impl fmt::Debug for AffinityDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityDispatcher")
            .field("label", &self.config.label)
            .field("affinity", &self.affinity)
            .field("queued", &self.queued_count())
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;
    use crate::dispatcher::ResumeState;

    /// Host stub that records started sequences.
    struct TestHost {
        active: AtomicBool,
        started: Mutex<Vec<Resumable>>,
    }

    impl TestHost {
        fn new(active: bool) -> Arc<Self> {
            Arc::new(Self {
                active: AtomicBool::new(active),
                started: Mutex::new(Vec::new()),
            })
        }
    }

    impl Host for TestHost {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn start_resumable(&self, sequence: Resumable) {
            self.started.lock().push(sequence);
        }
    }

    fn dispatcher() -> Arc<AffinityDispatcher> {
        AffinityDispatcher::new(DispatcherConfig::default(), TestHost::new(true))
    }

    #[test]
    fn test_same_thread_enqueue_runs_before_return() {
        let dispatcher = dispatcher();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        dispatcher
            .enqueue(move || ran_clone.store(true, Ordering::SeqCst))
            .unwrap();

        assert!(ran.load(Ordering::SeqCst), "fast path must run synchronously");
        assert_eq!(dispatcher.queued_count(), 0);
    }

    #[test]
    fn test_cross_thread_enqueue_is_queued() {
        let dispatcher = dispatcher();
        let dispatcher_clone = Arc::clone(&dispatcher);

        std::thread::spawn(move || {
            dispatcher_clone.enqueue(|| {}).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(dispatcher.queued_count(), 1);
    }

    #[test]
    fn test_shutdown_rejects_new_work_and_keeps_queue() {
        let dispatcher = dispatcher();
        let dispatcher_clone = Arc::clone(&dispatcher);
        std::thread::spawn(move || {
            dispatcher_clone.enqueue(|| {}).unwrap();
        })
        .join()
        .unwrap();

        dispatcher.shutdown();

        assert!(matches!(
            dispatcher.enqueue(|| {}),
            Err(DispatchError::Unavailable(_))
        ));
        assert_eq!(dispatcher.queued_count(), 1, "quit must not clear the queue");
    }

    #[test]
    fn test_fast_path_isolates_panics() {
        let dispatcher = dispatcher();

        // A panicking item must not unwind into the enqueuer.
        dispatcher.enqueue(|| panic!("fast path boom")).unwrap();
    }

    #[test]
    fn test_post_ignores_state() {
        let dispatcher = dispatcher();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        dispatcher
            .post(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                },
                "opaque state",
            )
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enqueue_resumable_rejects_empty_sequence() {
        let dispatcher = dispatcher();

        assert!(matches!(
            dispatcher.enqueue_resumable(Resumable::empty()),
            Err(DispatchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_enqueue_resumable_rejects_inactive_host_at_call_time() {
        let host = TestHost::new(false);
        let dispatcher = AffinityDispatcher::new(DispatcherConfig::default(), host);

        assert!(matches!(
            dispatcher.enqueue_resumable(Resumable::from_step(|| ResumeState::Complete)),
            Err(DispatchError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_enqueue_resumable_fast_path_starts_immediately() {
        let host = TestHost::new(true);
        let dispatcher = AffinityDispatcher::new(DispatcherConfig::default(), Arc::clone(&host) as Arc<dyn Host>);

        dispatcher
            .enqueue_resumable(Resumable::from_step(|| ResumeState::Complete))
            .unwrap();

        assert_eq!(host.started.lock().len(), 1);
    }

    #[test]
    fn test_enqueue_async_fast_path_resolves_synchronously() {
        let dispatcher = dispatcher();

        let ticket = dispatcher.enqueue_async(|| 6 * 7).unwrap();
        assert_eq!(ticket.blocking_wait().unwrap(), 42);
    }

    #[test]
    fn test_enqueue_async_fast_path_captures_panic() {
        let dispatcher = dispatcher();

        let ticket = dispatcher
            .enqueue_async(|| -> u32 { panic!("async boom") })
            .unwrap();

        match ticket.blocking_wait() {
            Err(DispatchError::ItemFailure(panic)) => assert_eq!(panic.message(), "async boom"),
            other => panic!("expected ItemFailure, got {:?}", other),
        }
    }
}
