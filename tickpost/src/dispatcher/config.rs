//! Dispatcher configuration.

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default initial capacity of the pending work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default label used in log output.
pub const DEFAULT_LABEL: &str = "main";

// =============================================================================
// Dispatcher Configuration
// =============================================================================

/// Configuration for an affinity dispatcher.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Initial capacity of the pending work queue.
    ///
    /// The queue grows past this on demand; the capacity only pre-sizes the
    /// backing storage to avoid reallocation in steady state.
    pub queue_capacity: usize,

    /// Label attached to this dispatcher's log output, to tell instances
    /// apart in hosts that reset and reconstruct.
    pub label: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            label: DEFAULT_LABEL.to_string(),
        }
    }
}
