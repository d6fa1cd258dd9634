//! Completion tickets for async dispatches.
//!
//! A [`CompletionTicket`] is the single-assignment result container returned
//! by [`AffinityDispatcher::enqueue_async`](super::AffinityDispatcher::enqueue_async).
//! It is created at dispatch time, resolved at most once by the affinity
//! thread (with either the operation's return value or its captured panic),
//! and consumed by the awaiting caller from any thread.
//!
//! # Example
//!
//! ```ignore
//! let ticket = dispatcher.enqueue_async(|| load_texture(id))?;
//!
//! // From an async context:
//! let texture = ticket.wait().await?;
//!
//! // Or from a plain thread:
//! let texture = ticket.blocking_wait()?;
//! ```

use std::fmt;

use tokio::sync::oneshot;

use super::error::{DispatchError, ItemPanic};

/// Creates a connected resolver/ticket pair.
pub(crate) fn channel<T>() -> (Resolver<T>, CompletionTicket<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, CompletionTicket { rx })
}

/// Resolves a ticket exactly once from the executing side.
pub(crate) struct Resolver<T> {
    tx: oneshot::Sender<Result<T, ItemPanic>>,
}

impl<T> Resolver<T> {
    /// Delivers the outcome to the awaiting side.
    ///
    /// A caller that dropped its ticket is no longer listening; the outcome
    /// is discarded in that case.
    pub fn resolve(self, outcome: Result<T, ItemPanic>) {
        let _ = self.tx.send(outcome);
    }
}

/// Single-assignment result container bridging a dispatched operation to an
/// awaiting caller.
pub struct CompletionTicket<T> {
    rx: oneshot::Receiver<Result<T, ItemPanic>>,
}

impl<T> CompletionTicket<T> {
    /// Waits for the dispatched operation to run and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ItemFailure`] if the operation's body
    /// panicked, or [`DispatchError::Unavailable`] if the item was discarded
    /// before it ran (queue cleared or dispatcher reset).
    pub async fn wait(self) -> Result<T, DispatchError> {
        match self.rx.await {
            Ok(outcome) => outcome.map_err(DispatchError::from),
            Err(_) => Err(DispatchError::Unavailable(
                "work item was discarded before it ran",
            )),
        }
    }

    /// Blocking form of [`wait`](Self::wait) for plain threads.
    ///
    /// Must not be called from inside an async runtime; use `wait` there.
    pub fn blocking_wait(self) -> Result<T, DispatchError> {
        match self.rx.blocking_recv() {
            Ok(outcome) => outcome.map_err(DispatchError::from),
            Err(_) => Err(DispatchError::Unavailable(
                "work item was discarded before it ran",
            )),
        }
    }
}

impl<T> fmt::Debug for CompletionTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTicket").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;

    #[test]
    fn test_resolved_value_is_delivered() {
        let (resolver, ticket) = channel();
        resolver.resolve(Ok(42));

        assert_eq!(ticket.blocking_wait().unwrap(), 42);
    }

    #[test]
    fn test_captured_panic_is_delivered_as_item_failure() {
        let (resolver, ticket) = channel::<()>();
        let payload: Box<dyn Any + Send> = Box::new("boom");
        resolver.resolve(Err(ItemPanic::from_payload(payload.as_ref())));

        match ticket.blocking_wait() {
            Err(DispatchError::ItemFailure(panic)) => assert_eq!(panic.message(), "boom"),
            other => panic!("expected ItemFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_dropped_resolver_reports_unavailable() {
        let (resolver, ticket) = channel::<u32>();
        drop(resolver);

        assert!(matches!(
            ticket.blocking_wait(),
            Err(DispatchError::Unavailable(_))
        ));
    }

    #[test]
    fn test_resolve_after_ticket_dropped_is_a_noop() {
        let (resolver, ticket) = channel();
        drop(ticket);

        // Must not panic even though nobody is listening.
        resolver.resolve(Ok(7));
    }

    #[tokio::test]
    async fn test_wait_from_async_context() {
        let (resolver, ticket) = channel();
        resolver.resolve(Ok("done"));

        assert_eq!(ticket.wait().await.unwrap(), "done");
    }
}
