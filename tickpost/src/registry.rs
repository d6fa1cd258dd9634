//! Process-wide dispatcher singleton and lifecycle events.
//!
//! The registry owns one [`AffinityDispatcher`] for the whole process and
//! routes host lifecycle events to it. Construction races collapse into a
//! single mutex-guarded get-or-create: the first access constructs, every
//! concurrent access waits and receives the same instance.
//!
//! The affinity thread identity is fixed at first-ever construction and
//! survives instance teardown — a host that destroys and re-creates its
//! dispatcher keeps the original binding. Only [`full_reset`] (used by hosts
//! that reload code/state in place) un-fixes it.
//!
//! State machine:
//!
//! ```text
//! Uninitialized ──acquire──▶ Constructing ──▶ Live ──quit──▶ ShuttingDown
//!       ▲                                      │
//!       │                                   destroyed
//!   full_reset ◀─────(any state)               ▼
//!       │                                  Destroyed ──acquire──▶ Constructing
//! ```

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::dispatcher::{
    AffinityDispatcher, DispatchError, DispatcherConfig, ReportSink, TracingReportSink,
};
use crate::host::{Host, HostEvent};

// =============================================================================
// Registry State
// =============================================================================

struct RegistryState {
    /// The live instance, if one has been constructed.
    instance: Option<Arc<AffinityDispatcher>>,

    /// Shared with the instance. Survives instance teardown so that access
    /// between the quit signal and final teardown cannot resurrect a
    /// dispatcher mid-shutdown.
    shutting_down: Arc<AtomicBool>,

    /// True while a construction is in progress.
    constructing: bool,

    /// Affinity identity, fixed at first-ever construction.
    affinity: Option<ThreadId>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            instance: None,
            shutting_down: Arc::new(AtomicBool::new(false)),
            constructing: false,
            affinity: None,
        }
    }
}

static REGISTRY: Mutex<Option<RegistryState>> = Mutex::new(None);

thread_local! {
    /// Set while this thread is inside construction. Host discovery calling
    /// back into the registry would deadlock on the registry lock otherwise;
    /// with the marker set, re-entrant access reports unavailable instead.
    static CONSTRUCTING_HERE: Cell<bool> = const { Cell::new(false) };
}

// =============================================================================
// Lifecycle State
// =============================================================================

/// Lifecycle states of the process-wide singleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// No singleton exists; the next access constructs one.
    Uninitialized,

    /// A construction is in progress.
    Constructing,

    /// A singleton is live and accepting work.
    Live,

    /// The quit signal has been seen; access is refused until a full reset.
    ShuttingDown,

    /// The instance was torn down; the next access reconstructs, keeping
    /// the original affinity binding.
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Constructing => write!(f, "Constructing"),
            Self::Live => write!(f, "Live"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Destroyed => write!(f, "Destroyed"),
        }
    }
}

/// Current state of the singleton's lifecycle.
pub fn lifecycle_state() -> LifecycleState {
    if CONSTRUCTING_HERE.get() {
        return LifecycleState::Constructing;
    }
    let guard = REGISTRY.lock();
    match guard.as_ref() {
        None => LifecycleState::Uninitialized,
        Some(state) if state.shutting_down.load(Ordering::Acquire) => LifecycleState::ShuttingDown,
        Some(state) if state.constructing => LifecycleState::Constructing,
        Some(state) if state.instance.is_some() => LifecycleState::Live,
        Some(state) if state.affinity.is_some() => LifecycleState::Destroyed,
        Some(_) => LifecycleState::Uninitialized,
    }
}

// =============================================================================
// Access
// =============================================================================

/// Returns the singleton, constructing it on first access.
///
/// Concurrent first accesses collapse into one construction; everyone gets
/// the same instance. The calling thread of the first-ever construction is
/// recorded as the affinity thread.
///
/// # Errors
///
/// Returns [`DispatchError::Unavailable`] while the host is shutting down,
/// or when called re-entrantly from inside host discovery.
pub fn acquire(host: Arc<dyn Host>) -> Result<Arc<AffinityDispatcher>, DispatchError> {
    acquire_with(
        DispatcherConfig::default(),
        host,
        Arc::new(TracingReportSink),
    )
}

/// [`acquire`] with explicit configuration and failure report sink.
///
/// The configuration only applies if this call performs the construction;
/// when an instance already exists it is returned as-is.
pub fn acquire_with(
    config: DispatcherConfig,
    host: Arc<dyn Host>,
    reports: Arc<dyn ReportSink>,
) -> Result<Arc<AffinityDispatcher>, DispatchError> {
    if CONSTRUCTING_HERE.get() {
        return Err(DispatchError::Unavailable(
            "dispatcher is being constructed on this thread",
        ));
    }

    let mut guard = REGISTRY.lock();
    let state = guard.get_or_insert_with(RegistryState::new);

    if state.shutting_down.load(Ordering::Acquire) {
        return Err(DispatchError::Unavailable("host is shutting down"));
    }

    // Double-checked: a creator that raced us to the lock already finished.
    if let Some(existing) = &state.instance {
        return Ok(Arc::clone(existing));
    }

    state.constructing = true;
    // Fixed at first-ever construction; survives instance teardown and is
    // cleared only by a full reset.
    let affinity = *state
        .affinity
        .get_or_insert_with(|| thread::current().id());

    CONSTRUCTING_HERE.set(true);
    let discovery = panic::catch_unwind(AssertUnwindSafe(|| host.bind_anchor()));
    CONSTRUCTING_HERE.set(false);

    let anchors = match discovery {
        Ok(anchors) => anchors,
        Err(payload) => {
            state.constructing = false;
            panic::resume_unwind(payload);
        }
    };
    match anchors {
        0 => debug!("Created host anchor for dispatcher"),
        1 => debug!("Adopted existing host anchor"),
        found => warn!(
            shed = found - 1,
            "Multiple host anchors found; duplicates shed"
        ),
    }

    let dispatcher = AffinityDispatcher::bound(
        config,
        host,
        reports,
        affinity,
        Arc::clone(&state.shutting_down),
    );
    state.instance = Some(Arc::clone(&dispatcher));
    state.constructing = false;
    info!(affinity = ?affinity, "Dispatcher singleton constructed");
    Ok(dispatcher)
}

/// Returns the live singleton without constructing one.
///
/// Returns `None` while uninitialized, mid-construction, or shutting down.
pub fn current() -> Option<Arc<AffinityDispatcher>> {
    if CONSTRUCTING_HERE.get() {
        return None;
    }
    let guard = REGISTRY.lock();
    let state = guard.as_ref()?;
    if state.shutting_down.load(Ordering::Acquire) {
        return None;
    }
    state.instance.clone()
}

// =============================================================================
// Lifecycle Events
// =============================================================================

/// Routes a host lifecycle event to the matching handler.
pub fn handle_event(event: HostEvent) {
    match event {
        HostEvent::Tick => notify_tick(),
        HostEvent::Quit => notify_quit(),
        HostEvent::Destroyed => clear_current_instance(),
        HostEvent::FullReset => full_reset(),
    }
}

/// Drains the singleton's queue. Called once per frame, on the affinity
/// thread.
pub fn notify_tick() {
    // Taken out of the registry lock first; the drain runs with no registry
    // involvement so drained items are free to call back in.
    if let Some(dispatcher) = current() {
        dispatcher.drain();
    }
}

/// Marks the dispatcher as shutting down.
///
/// All later `enqueue*` calls fail with `Unavailable`. Already-queued work
/// is left in place, not cleared. Monotonic: only [`full_reset`] clears it.
pub fn notify_quit() {
    let mut guard = REGISTRY.lock();
    let state = guard.get_or_insert_with(RegistryState::new);
    state.shutting_down.store(true, Ordering::Release);
    info!("Quit signal received; dispatcher is now unavailable");
}

/// Clears the singleton slot if `dispatcher` is the current singleton.
///
/// Destroying a duplicate that never became the singleton leaves global
/// state untouched.
pub fn notify_destroyed(dispatcher: &Arc<AffinityDispatcher>) {
    let mut guard = REGISTRY.lock();
    let Some(state) = guard.as_mut() else {
        return;
    };
    let is_current = state
        .instance
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(current, dispatcher));
    if is_current {
        state.instance = None;
        info!("Dispatcher singleton destroyed");
    } else {
        debug!("Ignoring destruction of a non-singleton dispatcher");
    }
}

/// [`HostEvent::Destroyed`] form of [`notify_destroyed`]: the host anchors
/// only the singleton, so the event always refers to it.
fn clear_current_instance() {
    let mut guard = REGISTRY.lock();
    if let Some(state) = guard.as_mut() {
        if state.instance.take().is_some() {
            info!("Dispatcher singleton destroyed");
        }
    }
}

/// Returns all dispatcher state to its pre-construction state.
///
/// The instance reference, shutdown flag, constructing flag, pending queue
/// and the recorded affinity identity are all cleared; the next access
/// constructs a fresh singleton with a fresh affinity binding. This is the
/// only operation that can un-fix the affinity identity. Used by hosts that
/// reload code/state without a process restart.
pub fn full_reset() {
    // The stale state is taken out first; the queue is cleared with the
    // registry lock released, so the registry and queue locks are never held
    // together.
    let stale = REGISTRY.lock().take();
    if let Some(state) = stale {
        // The old flag is shared with the old instance: setting it turns
        // stale handles into `Unavailable` instead of leaving them feeding a
        // queue nobody will drain again.
        state.shutting_down.store(true, Ordering::Release);
        if let Some(instance) = state.instance {
            instance.clear_queue();
        }
    }
    info!("Dispatcher state fully reset");
}
