//! tickpost - thread-affinity work dispatcher for frame-loop hosts
//!
//! This library lets any thread schedule work onto one designated "affinity
//! thread" (typically a host application's single-threaded update loop) and
//! optionally await the result.
//!
//! # High-Level API
//!
//! Most embedders use the process-wide singleton managed by the [`registry`]
//! module, driven by host lifecycle events:
//!
//! ```ignore
//! use tickpost::registry;
//! use tickpost::host::HostEvent;
//!
//! // On the frame-loop thread, at startup:
//! let dispatcher = registry::acquire(host)?;
//!
//! // From any worker thread:
//! let ticket = dispatcher.enqueue_async(|| expensive_result())?;
//!
//! // Once per frame, on the frame-loop thread:
//! registry::handle_event(HostEvent::Tick);
//! ```
//!
//! Embedders that prefer explicit ownership over a singleton can construct an
//! [`dispatcher::AffinityDispatcher`] directly and share it by `Arc`.

pub mod dispatcher;
pub mod host;
pub mod logging;
pub mod registry;

/// Version of the tickpost library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
