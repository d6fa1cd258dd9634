//! Opaque resumable sequences.
//!
//! A [`Resumable`] is a multi-step computation that yields control between
//! steps. The dispatcher never advances a sequence itself; its only contract
//! is to deliver an accepted sequence to the host's executor
//! ([`Host::start_resumable`](crate::host::Host::start_resumable)), which
//! owns and advances it from then on.

use std::fmt;

/// State returned by advancing a resumable sequence one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeState {
    /// The sequence yielded and wants to be resumed again later.
    Yielded,

    /// The sequence finished; further resumes are no-ops.
    Complete,
}

/// Handle to a multi-step computation advanced by the host's executor.
pub struct Resumable {
    step: Option<Box<dyn FnMut() -> ResumeState + Send + 'static>>,
}

impl Resumable {
    /// Wraps a step function.
    ///
    /// The host executor calls [`resume`](Self::resume) repeatedly, typically
    /// once per tick, until the function returns [`ResumeState::Complete`].
    pub fn from_step(step: impl FnMut() -> ResumeState + Send + 'static) -> Self {
        Self {
            step: Some(Box::new(step)),
        }
    }

    /// A sequence with no steps. The dispatcher rejects it at submission.
    pub fn empty() -> Self {
        Self { step: None }
    }

    /// True if the sequence has no steps left.
    pub fn is_empty(&self) -> bool {
        self.step.is_none()
    }

    /// Advances the sequence one step.
    ///
    /// Called by host executors, not by the dispatcher. Resuming an empty or
    /// completed sequence returns [`ResumeState::Complete`].
    pub fn resume(&mut self) -> ResumeState {
        match self.step.as_mut() {
            Some(step) => {
                let state = step();
                if state == ResumeState::Complete {
                    self.step = None;
                }
                state
            }
            None => ResumeState::Complete,
        }
    }
}

impl fmt::Debug for Resumable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resumable")
            .field("is_empty", &self.is_empty())
            .finish()
    }
}
