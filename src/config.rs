//! Search configuration.

use std::time::Duration;

use crate::{uct, MctsError, SelectionFunction};

/// Configuration parameters for a [`crate::Mcts`] engine.
///
/// A worker keeps iterating while
/// `iterations < max_iterations && (iterations < min_iterations || elapsed < time_per_action)`,
/// and in any case until every action of the root has been tried once.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Number of worker threads growing the shared tree. With `1`, the search
    /// runs on the calling thread.
    pub threads: usize,

    /// Time budget of one `think` call. Advisory: every worker checks it
    /// between iterations, and an in-flight iteration always completes.
    pub time_per_action: Duration,

    /// Iterations each worker performs regardless of the time budget.
    pub min_iterations: u64,

    /// Iterations after which each worker stops, whatever time is left.
    pub max_iterations: u64,

    /// Exploration constant used while descending the tree. The final
    /// decision always uses `0`.
    pub exploration_coef: f64,

    /// Function scoring a child during selection, [`uct`] by default.
    pub selection_function: SelectionFunction,

    /// Bound on the busy-wait for a claimed child to receive its first visit.
    /// `None` spins without limit.
    pub spin_limit: Option<u64>,

    /// Seed of the worker random generators. Worker `i` uses `seed + i`.
    /// `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl MctsConfig {
    /// The default configuration.
    ///
    /// - `threads`: `1`
    /// - `time_per_action`: one second
    /// - `min_iterations`: `0`, `max_iterations`: unbounded
    /// - `exploration_coef`: `std::f64::consts::SQRT_2`
    /// - `selection_function`: [`uct`]
    /// - `spin_limit`, `seed`: `None`
    pub const DEFAULT: MctsConfig = MctsConfig {
        threads: 1,
        time_per_action: Duration::from_secs(1),
        min_iterations: 0,
        max_iterations: u64::MAX,
        exploration_coef: std::f64::consts::SQRT_2,
        selection_function: uct,
        spin_limit: None,
        seed: None,
    };

    /// Single worker, fixed seed and a fixed budget of `iterations` per
    /// decision with no time cutoff. Searches are reproducible.
    pub fn fixed_iterations(iterations: u64) -> Self {
        Self::DEFAULT.with_time_per_action(Duration::MAX).with_max_iterations(iterations).with_seed(0)
    }

    /// Builder pattern: set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Builder pattern: set the time budget of one decision.
    pub fn with_time_per_action(mut self, time_per_action: Duration) -> Self {
        self.time_per_action = time_per_action;
        self
    }

    /// Builder pattern: set the minimum iterations per worker.
    pub fn with_min_iterations(mut self, min_iterations: u64) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    /// Builder pattern: set the maximum iterations per worker.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_exploration_coef(mut self, exploration_coef: f64) -> Self {
        self.exploration_coef = exploration_coef;
        self
    }

    /// Builder pattern: set the selection function.
    pub fn with_selection_function(mut self, selection_function: SelectionFunction) -> Self {
        self.selection_function = selection_function;
        self
    }

    /// Builder pattern: bound the selection busy-wait.
    pub fn with_spin_limit(mut self, spin_limit: u64) -> Self {
        self.spin_limit = Some(spin_limit);
        self
    }

    /// Builder pattern: seed the worker random generators.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that every parameter is within its accepted range.
    pub fn validate(&self) -> Result<(), MctsError> {
        if self.threads == 0 {
            return Err(MctsError::InvalidConfig("threads must be at least 1".to_string()));
        }
        if !self.exploration_coef.is_finite() || self.exploration_coef < 0.0 {
            return Err(MctsError::InvalidConfig(format!(
                "exploration_coef must be finite and non-negative, got {}",
                self.exploration_coef
            )));
        }
        if self.min_iterations > self.max_iterations {
            return Err(MctsError::InvalidConfig(format!(
                "min_iterations ({}) exceeds max_iterations ({})",
                self.min_iterations, self.max_iterations
            )));
        }
        Ok(())
    }
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MctsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threads, 1);
        assert_eq!(config.exploration_coef, std::f64::consts::SQRT_2);
        assert!(config.spin_limit.is_none());
    }

    #[test]
    fn test_fixed_iterations() {
        let config = MctsConfig::fixed_iterations(500);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.time_per_action, Duration::MAX);
        assert_eq!(config.seed, Some(0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(MctsConfig::default().with_threads(0).validate(), Err(MctsError::InvalidConfig(_))));
        assert!(MctsConfig::default().with_exploration_coef(-1.0).validate().is_err());
        assert!(MctsConfig::default().with_exploration_coef(f64::NAN).validate().is_err());
        assert!(MctsConfig::default().with_max_iterations(5).with_min_iterations(6).validate().is_err());
    }
}
