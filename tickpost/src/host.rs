//! Host collaborator interface.
//!
//! The dispatcher core never reaches into a host's object model. The
//! embedding host implements [`Host`] and delivers lifecycle events to the
//! [`registry`](crate::registry) as they happen in its own loop:
//!
//! - [`HostEvent::Tick`] once per frame, from the affinity thread
//! - [`HostEvent::Quit`] when the application starts shutting down
//! - [`HostEvent::Destroyed`] when the hosting object is torn down
//! - [`HostEvent::FullReset`] when the host reloads code/state in place

use std::fmt;

use crate::dispatcher::Resumable;

/// The hosting context the dispatcher runs inside.
///
/// Implemented by the embedder. All methods may be called from the affinity
/// thread; `is_active` may be called from any thread.
pub trait Host: Send + Sync {
    /// True while the hosting context is active (e.g. the owning component
    /// is enabled). Gates resumable-sequence acceptance and tick draining.
    fn is_active(&self) -> bool;

    /// Takes ownership of an accepted resumable sequence.
    ///
    /// The host's executor advances the sequence from here on; the
    /// dispatcher's involvement ends with this call.
    fn start_resumable(&self, sequence: Resumable);

    /// Finds or creates the host-side object anchoring the dispatcher,
    /// tearing down any surplus anchors found.
    ///
    /// Called once during construction. Returns the number of anchors that
    /// already existed: `0` means one was created, `1` means an existing
    /// anchor was adopted, and more than one means independent call sites
    /// raced to create the singleton and the extras were shed.
    fn bind_anchor(&self) -> usize {
        0
    }
}

/// Lifecycle events delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// Per-frame tick: drain the pending queue.
    Tick,

    /// The host application is quitting. New dispatches fail from here on;
    /// already-queued work is left in place.
    Quit,

    /// The hosting object was destroyed. Clears the singleton reference.
    Destroyed,

    /// The host reloaded code/state without a process restart. All
    /// dispatcher state returns to its pre-construction state.
    FullReset,
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => write!(f, "Tick"),
            Self::Quit => write!(f, "Quit"),
            Self::Destroyed => write!(f, "Destroyed"),
            Self::FullReset => write!(f, "FullReset"),
        }
    }
}
