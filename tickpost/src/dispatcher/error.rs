//! Error types for dispatch operations.

use std::any::Any;

use thiserror::Error;

/// Errors surfaced by dispatch calls.
///
/// `InvalidArgument`, `Unavailable` and `InvalidOperation` are returned
/// synchronously from the dispatch call itself. `ItemFailure` is never thrown
/// back at a synchronous enqueuer; it only reaches callers through the
/// [`CompletionTicket`](super::CompletionTicket) of an async dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The submitted work was empty (a resumable sequence with no steps).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The dispatcher is shutting down or not constructed.
    ///
    /// Not a transient condition: callers must re-acquire the dispatcher
    /// rather than retry the call.
    #[error("dispatcher unavailable: {0}")]
    Unavailable(&'static str),

    /// The host context is inactive and cannot take a resumable sequence.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// A dispatched item's body panicked.
    #[error("dispatched item failed: {0}")]
    ItemFailure(#[from] ItemPanic),
}

/// A panic captured from a dispatched item's body.
///
/// The original payload is reduced to its message at the capture boundary so
/// the report can cross threads and be cloned freely.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ItemPanic {
    message: String,
}

impl ItemPanic {
    /// Extracts the panic message from an unwind payload.
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    /// The captured panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
