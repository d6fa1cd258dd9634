//! Affinity Dispatcher
//!
//! This module provides the thread-safe handoff queue that moves work from
//! arbitrary producer threads onto the one designated affinity thread.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Dispatch API                              │
//! │  enqueue / enqueue_async / enqueue_resumable / post          │
//! ├─────────────────────────────────────────────────────────────┤
//! │   same-thread fast path          │        TaskQueue          │
//! │   (runs inline, isolated)        │   (mutex-guarded FIFO)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Drain (once per host tick)                │
//! │  snapshot queue, run items in order, isolate each failure    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Work item**: a zero-argument deferred operation. Enqueued from the
//!   affinity thread itself it runs immediately and synchronously; from any
//!   other thread it is queued until the next drain.
//!
//! - **Completion ticket**: a single-assignment result container returned by
//!   async dispatch, resolved exactly once with the operation's value or its
//!   captured panic.
//!
//! - **Resumable sequence**: an opaque multi-step computation; the dispatcher
//!   only delivers it to the host's executor, it never advances it.
//!
//! - **Fault isolation**: item failures are reported through a
//!   [`ReportSink`], never propagated to the enqueuer or the tick caller.
//!   Only async dispatch surfaces an item's failure, through its ticket.
//!
//! # Ordering
//!
//! Items enqueued from a single producer thread drain in enqueue order.
//! Items from different producers only preserve their own within-thread
//! order; no global cross-thread order is guaranteed.
//!
//! # Example
//!
//! ```ignore
//! use tickpost::dispatcher::{AffinityDispatcher, DispatcherConfig};
//!
//! // On the frame-loop thread:
//! let dispatcher = AffinityDispatcher::new(DispatcherConfig::default(), host);
//!
//! // From a worker thread:
//! dispatcher.enqueue(|| update_ui())?;
//! let ticket = dispatcher.enqueue_async(|| compute())?;
//!
//! // On the frame-loop thread, once per tick:
//! dispatcher.drain();
//!
//! // Back on the worker:
//! let value = ticket.blocking_wait()?;
//! ```

// Module declarations
mod config;
mod core;
mod drain;
mod error;
mod queue;
mod report;
mod resumable;
mod ticket;
mod work;

// Re-export public types

// Configuration
pub use config::{DispatcherConfig, DEFAULT_LABEL, DEFAULT_QUEUE_CAPACITY};

// Dispatcher core
pub use core::AffinityDispatcher;

// Errors
pub use error::{DispatchError, ItemPanic};

// Failure reporting
pub use report::{FailureOrigin, FailureReport, NullReportSink, ReportSink, TracingReportSink};

// Resumable sequences
pub use resumable::{Resumable, ResumeState};

// Completion tickets
pub use ticket::CompletionTicket;
