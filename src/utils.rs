use std::hint;

use crate::MctsError;

/// Busy-waits until `poll` yields a value.
///
/// This is the only waiting primitive of the engine: no sleep, no backoff,
/// no blocking. Each failed poll issues a [`hint::spin_loop`] and polls again.
///
/// # Parameters
/// - `limit`: Maximum number of failed polls before giving up. `None` spins
///            forever, which is the engine default.
/// - `poll`: Returns `Some(value)` once the awaited condition holds.
///
/// # Returns
/// The first value produced by `poll`, or [`MctsError::SpinLimitExceeded`]
/// once `limit` failed polls were performed.
///
/// # Examples
/// ```rust
/// use lockfree_mcts::utils::spin_until;
/// let mut countdown = 3;
/// let value = spin_until(None, || {
///     countdown -= 1;
///     (countdown == 0).then_some("ready")
/// });
/// assert_eq!(value.unwrap(), "ready");
/// ```
pub fn spin_until<T>(limit: Option<u64>, mut poll: impl FnMut() -> Option<T>) -> Result<T, MctsError> {
    let mut spins: u64 = 0;

    loop {
        if let Some(value) = poll() {
            return Ok(value);
        }

        if limit.is_some_and(|limit| spins >= limit) {
            return Err(MctsError::SpinLimitExceeded { spins });
        }

        spins += 1;
        hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_ready_immediately() {
        assert_eq!(spin_until(Some(0), || Some(7)).unwrap(), 7);
    }

    #[test]
    fn test_limit_exceeded() {
        let mut polls = 0;
        let result: Result<(), MctsError> = spin_until(Some(10), || {
            polls += 1;
            None
        });

        assert!(matches!(result, Err(MctsError::SpinLimitExceeded { spins: 10 })));
        assert_eq!(polls, 11);
    }

    #[test]
    fn test_wait_for_other_thread() {
        let flag = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| flag.store(true, Ordering::Release));
            let seen = spin_until(None, || flag.load(Ordering::Acquire).then_some(true));
            assert!(seen.unwrap());
        });
    }
}
