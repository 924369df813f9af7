//! Tree and rollout policies: how children are scored during selection and how
//! moves are picked during a random playout.

use rand::{rngs::StdRng, Rng};

use crate::{MctsError, State};

/// Type alias for a function pointer used to determine a node's selection score.
///
/// This function takes the following parameters:
/// - `value`: The mean reward of the child node.
/// - `n_visits`: The number of times the child node has been visited (always `>= 1`).
/// - `parent_n_visits`: The number of times the parent node has been visited (always `>= 1`).
/// - `exploration_coef`: `0` for the final decision, the configured constant during descent.
///
/// It returns an `f64` score; the child with the highest score is selected.
pub type SelectionFunction = fn(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64;

/// The Upper Confidence bound applied to Trees (UCT) score.
///
/// `value + c * sqrt(ln(parent_n_visits) / n_visits)`. With `c = 0` this is
/// the plain mean reward, which is what the final decision maximizes.
///
/// # Examples
/// ```rust
/// use lockfree_mcts::uct;
/// assert_eq!(uct(0.5, 4., 10., 0.), 0.5);
/// assert!(uct(0.5, 1., 10., std::f64::consts::SQRT_2) > uct(0.5, 9., 10., std::f64::consts::SQRT_2));
/// ```
pub fn uct(value: f64, n_visits: f64, parent_n_visits: f64, exploration_coef: f64) -> f64 {
    value + exploration_coef * (parent_n_visits.ln() / n_visits).sqrt()
}

/// Chooses the moves of a rollout.
///
/// The engine ships only [`UniformRollout`]. Biased or heuristic playouts are
/// meant to be plugged in through this trait with [`crate::Mcts::with_rollout`].
pub trait RolloutPolicy<S: State>: Send + Sync {
    /// Picks the next action to apply to `state`, which is not terminal.
    ///
    /// Returns `None` when `state` has no legal action.
    fn choose(&self, state: &S, rng: &mut StdRng) -> Option<S::Action>;
}

/// Rollout policy picking a uniformly random legal action.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRollout;

impl<S: State> RolloutPolicy<S> for UniformRollout {
    fn choose(&self, state: &S, rng: &mut StdRng) -> Option<S::Action> {
        let mut actions = state.get_actions();
        if actions.is_empty() {
            return None;
        }

        let index = rng.random_range(0..actions.len());
        Some(actions.swap_remove(index))
    }
}

/// Plays `policy` from a copy of `state` until the game is over.
///
/// # Returns
/// The terminal state reached, or [`MctsError::NoLegalActions`] if a
/// non-terminal state on the way had no legal action.
pub fn rollout<S: State>(state: &S, policy: &dyn RolloutPolicy<S>, rng: &mut StdRng) -> Result<S, MctsError> {
    let mut state = state.copy();

    while !state.is_terminal() {
        let action = policy.choose(&state, rng).ok_or(MctsError::NoLegalActions)?;
        state.apply_action(&action);
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::test_utils::{Countdown, Stuck};
    use crate::{TicTacToe, NO_AGENT};

    #[test]
    fn test_uct_exploit_is_mean() {
        assert_eq!(uct(0.25, 3., 100., 0.), 0.25);
    }

    #[test]
    fn test_uct_prefers_less_visited() {
        let c = std::f64::consts::SQRT_2;
        assert!(uct(0.5, 2., 50., c) > uct(0.5, 20., 50., c));
        assert_eq!(uct(0.75, 5., 1., c), 0.75);
    }

    #[test]
    fn test_uniform_rollout_reaches_terminal() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = TicTacToe::start(3);

        let end = rollout(&start, &UniformRollout, &mut rng).unwrap();

        assert!(end.is_terminal());
        assert!(!start.is_terminal());
        assert_eq!(start.get_actions().len(), 9);
        let reward = end.get_reward(1) + end.get_reward(2);
        assert_eq!(reward, 1.0);
        if end.get_winner() == NO_AGENT {
            assert_eq!(end.get_reward(1), 0.5);
        }
    }

    #[test]
    fn test_uniform_rollout_is_seeded() {
        let start = TicTacToe::start(4);
        let a = rollout(&start, &UniformRollout, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = rollout(&start, &UniformRollout, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_rollout_of_terminal_is_copy() {
        let mut rng = StdRng::seed_from_u64(0);
        let end = rollout(&Countdown::new(0), &UniformRollout, &mut rng).unwrap();
        assert_eq!(end.remaining(), 0);
    }

    #[test]
    fn test_rollout_without_actions() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = rollout(&Stuck, &UniformRollout, &mut rng);
        assert!(matches!(result, Err(MctsError::NoLegalActions)));
    }
}
