//! Errors reported by the search engine.

use thiserror::Error;

/// Represents possible errors that can occur during MCTS operations.
#[derive(Debug, Error)]
pub enum MctsError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine has no root yet; `set_root` must be called first.
    #[error("no root state, call set_root first")]
    NoRoot,

    /// The root already represents a finished game, so there is no action to take.
    #[error("search is already over, the root state is terminal")]
    SearchAlreadyOver,

    /// `take_action` was called before every root action was tried once.
    #[error("root is not fully expanded, run think before taking an action")]
    RootNotExpanded,

    /// A non-terminal state reported no legal actions during a rollout.
    #[error("non-terminal state has no legal actions")]
    NoLegalActions,

    /// Every child of a fully expanded node was abandoned, or it has none.
    #[error("no selectable child in an expanded, non-terminal node")]
    NoSelectableChild,

    /// The bounded busy-wait on an unvisited child gave up.
    #[error("gave up waiting for a child to be visited after {spins} spins")]
    SpinLimitExceeded {
        /// Number of spins performed before giving up.
        spins: u64,
    },

    /// The `State` implementation panicked while the engine was calling it.
    #[error("state implementation panicked: {0}")]
    StatePanicked(String),

    /// A worker thread aborted its search because of `source`.
    #[error("worker {worker} failed: {source}")]
    WorkerFailed {
        /// Index of the failed worker.
        worker: usize,
        /// The fault that stopped the worker.
        #[source]
        source: Box<MctsError>,
    },
}

impl MctsError {
    /// Converts a panic payload caught by `catch_unwind` into an error.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        MctsError::StatePanicked(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_panic_str() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let error = MctsError::from_panic(payload);
        assert_eq!(error.to_string(), "state implementation panicked: boom");
    }

    #[test]
    fn test_from_panic_string() {
        let payload = std::panic::catch_unwind(|| panic!("cell {} taken", 4)).unwrap_err();
        assert!(matches!(MctsError::from_panic(payload), MctsError::StatePanicked(m) if m == "cell 4 taken"));
    }

    #[test]
    fn test_worker_failed_source() {
        use std::error::Error;

        let error = MctsError::WorkerFailed { worker: 2, source: Box::new(MctsError::NoLegalActions) };
        assert_eq!(error.to_string(), "worker 2 failed: non-terminal state has no legal actions");
        assert!(error.source().is_some());
    }
}
