//! Implementation of the parallel Monte Carlo Tree Search (MCTS) engine.
//!
//! Every worker thread runs the same loop against one shared tree:
//! select-or-expand a node, play a random rollout from it, then credit the
//! result to every node up to the root. Workers coordinate only through the
//! atomics of [`SearchNode`]; there is no lock and no barrier between them.

use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::policy::rollout;
use crate::{MctsConfig, MctsError, RolloutPolicy, SearchNode, State, UniformRollout};

/// Summary of one [`Mcts::think`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Completed iterations, per worker.
    pub iterations: Vec<u64>,
    /// Wall-clock time spent searching.
    pub elapsed: Duration,
    /// Visits of the root once every worker returned.
    pub root_visits: u64,
}

impl SearchStats {
    /// Iterations completed by all workers together.
    pub fn total_iterations(&self) -> u64 {
        self.iterations.iter().sum()
    }
}

/// The Monte Carlo Tree Search engine.
///
/// The engine keeps its tree between decisions: after [`Mcts::take_action`]
/// or a [`Mcts::set_root`] matching a child of the current root, the subtree
/// below the action played is reused with all its statistics.
///
/// # Type Parameters
/// - `S`: The game state type that implements the [`State`] trait.
/// - `P`: The rollout policy, uniformly random by default.
///
/// # Examples
/// ```rust
/// use lockfree_mcts::{Mcts, MctsConfig, MctsError, State, TicTacToe};
///
/// fn main() -> Result<(), MctsError> {
///     let mut mcts = Mcts::new(MctsConfig::fixed_iterations(200))?;
///     let start = TicTacToe::start(3);
///
///     mcts.set_root(None, start.copy());
///     let stats = mcts.think()?;
///     assert_eq!(stats.total_iterations(), 200);
///
///     let next = mcts.take_action()?;
///     assert_eq!(next.get_actions().len(), 8);
///     println!("played {}", mcts.get_last_action().unwrap());
///     Ok(())
/// }
/// ```
pub struct Mcts<S: State, P = UniformRollout> {
    config: MctsConfig,
    rollout: P,
    /// One generator per worker.
    rngs: Vec<StdRng>,
    root: Option<Box<SearchNode<S>>>,
    last_action: Option<S::Action>,
}

impl<S: State> Mcts<S> {
    /// Creates an engine with uniformly random rollouts.
    ///
    /// # Returns
    /// `Err(MctsError::InvalidConfig(_))` if `config` does not validate.
    pub fn new(config: MctsConfig) -> Result<Self, MctsError> {
        Self::with_rollout(config, UniformRollout)
    }
}

impl<S: State, P: RolloutPolicy<S>> Mcts<S, P> {
    /// Creates an engine playing rollouts with `rollout`.
    pub fn with_rollout(config: MctsConfig, rollout: P) -> Result<Self, MctsError> {
        config.validate()?;

        let rngs = (0..config.threads)
            .map(|worker| match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
                None => StdRng::from_os_rng(),
            })
            .collect();

        Ok(Mcts { config, rollout, rngs, root: None, last_action: None })
    }

    /// Gets the configuration of this engine.
    pub fn get_config(&self) -> &MctsConfig {
        &self.config
    }

    /// Gets the current root of the tree, if any.
    pub fn get_root(&self) -> Option<&SearchNode<S>> {
        self.root.as_deref()
    }

    /// Gets the action chosen by the last [`Mcts::take_action`].
    pub fn get_last_action(&self) -> Option<&S::Action> {
        self.last_action.as_ref()
    }

    /// Positions the engine on `state`, reached by `action`.
    ///
    /// If the current root has a child for `action`, that child becomes the
    /// root and keeps its statistics; `state` is then assumed to be the state
    /// of that child. Otherwise the tree is discarded and a fresh root is built
    /// from `state`.
    ///
    /// # Returns
    /// `true` if an existing subtree was reused.
    pub fn set_root(&mut self, action: Option<&S::Action>, state: S) -> bool {
        if let Some(action) = action {
            if self.reroot(action) {
                let visits = self.root.as_ref().map_or(0, |root| root.get_visits());
                debug!(visits, "reusing subtree as root");
                return true;
            }
        }

        self.root = Some(SearchNode::new_root(state));
        false
    }

    /// Grows the tree until the configured budget is spent.
    ///
    /// Each worker stops on its own once its iteration or time budget is
    /// exhausted and the root is fully expanded. The root is always expanded
    /// completely, even if that overruns the budget. A terminal root returns
    /// immediately without iterating.
    ///
    /// A fault, either an error or a panic of the [`State`] implementation,
    /// aborts only the iteration it happened in. The worker keeps iterating
    /// until its budget is spent, and other workers are not interrupted.
    ///
    /// # Returns
    /// Statistics of the search, or the first fault of the lowest faulted
    /// worker, reported as [`MctsError::WorkerFailed`] once every worker has
    /// returned.
    pub fn think(&mut self) -> Result<SearchStats, MctsError> {
        let root = self.root.as_deref().ok_or(MctsError::NoRoot)?;
        let started = Instant::now();

        if root.is_terminal() {
            return Ok(SearchStats {
                iterations: vec![0; self.rngs.len()],
                elapsed: started.elapsed(),
                root_visits: root.get_visits(),
            });
        }

        let search = Search { root, config: &self.config, rollout: &self.rollout, started };

        let results: Vec<Result<u64, MctsError>> = if self.rngs.len() == 1 {
            vec![search.run_worker(0, &mut self.rngs[0])]
        } else {
            thread::scope(|scope| {
                let search = &search;
                let handles: Vec<_> = self
                    .rngs
                    .iter_mut()
                    .enumerate()
                    .map(|(worker, rng)| scope.spawn(move || search.run_worker(worker, rng)))
                    .collect();

                handles
                    .into_iter()
                    .enumerate()
                    .map(|(worker, handle)| {
                        handle.join().unwrap_or_else(|payload| {
                            let source = Box::new(MctsError::from_panic(payload));
                            Err(MctsError::WorkerFailed { worker, source })
                        })
                    })
                    .collect()
            })
        };

        let iterations = results.into_iter().collect::<Result<Vec<u64>, MctsError>>()?;
        let stats = SearchStats { iterations, elapsed: started.elapsed(), root_visits: root.get_visits() };

        debug!(
            iterations = stats.total_iterations(),
            root_visits = stats.root_visits,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "think finished"
        );
        Ok(stats)
    }

    /// Plays the best action found so far.
    ///
    /// The child of the root with the highest mean reward is chosen, becomes
    /// the new root, and its state is returned.
    ///
    /// # Returns
    /// - `Err(MctsError::NoRoot)` if no root was set.
    /// - `Err(MctsError::SearchAlreadyOver)` if the root is terminal.
    /// - `Err(MctsError::RootNotExpanded)` if `think` did not try every action yet.
    pub fn take_action(&mut self) -> Result<S, MctsError> {
        let root = self.root.as_deref().ok_or(MctsError::NoRoot)?;

        if root.is_terminal() {
            return Err(MctsError::SearchAlreadyOver);
        }
        if !root.is_expanded() {
            return Err(MctsError::RootNotExpanded);
        }

        let best = root.best_child(0.0, self.config.selection_function, self.config.spin_limit)?;
        let Some(action) = best.get_action().cloned() else {
            return Err(MctsError::NoSelectableChild);
        };
        debug!(?action, visits = best.get_visits(), value = best.get_value(), "taking action");

        if !self.reroot(&action) {
            return Err(MctsError::NoSelectableChild);
        }
        self.last_action = Some(action);

        let root = self.root.as_deref().ok_or(MctsError::NoRoot)?;
        Ok(root.get_state().copy())
    }

    /// Moves the root to its child for `action` and drops the rest of the tree.
    fn reroot(&mut self, action: &S::Action) -> bool {
        match self.root.as_mut().and_then(|root| root.take_child_for(action)) {
            Some(child) => {
                self.root = Some(child);
                true
            }
            None => false,
        }
    }
}

/// What every worker of one `think` call shares.
struct Search<'a, S: State, P> {
    root: &'a SearchNode<S>,
    config: &'a MctsConfig,
    rollout: &'a P,
    started: Instant,
}

impl<'a, S: State, P: RolloutPolicy<S>> Search<'a, S, P> {
    fn run_worker(&self, worker: usize, rng: &mut StdRng) -> Result<u64, MctsError> {
        let mut iterations: u64 = 0;
        let mut fault: Option<MctsError> = None;
        let mut faulted: u64 = 0;

        while self.should_continue(iterations) {
            if let Err(source) = self.grow_tree(rng) {
                if fault.is_none() {
                    warn!(worker, iterations, error = %source, "iteration aborted");
                    fault = Some(source);
                }
                faulted += 1;
            }
            iterations += 1;
        }

        trace!(worker, iterations, faulted, "worker finished");
        match fault {
            Some(source) => Err(MctsError::WorkerFailed { worker, source: Box::new(source) }),
            None => Ok(iterations),
        }
    }

    fn should_continue(&self, iterations: u64) -> bool {
        let config = self.config;
        let within_budget = iterations < config.max_iterations
            && (iterations < config.min_iterations || self.started.elapsed() < config.time_per_action);

        within_budget || !self.root.is_expanded()
    }

    /// One iteration: select-or-expand, rollout, backpropagation.
    ///
    /// A fault, including a panic of the state implementation, aborts the
    /// iteration. If the reached node was never credited a visit, it is
    /// abandoned so that no other worker waits for it.
    fn grow_tree(&self, rng: &mut StdRng) -> Result<(), MctsError> {
        let mut leaf: Option<&SearchNode<S>> = None;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), MctsError> {
            let node = self.select_or_expand()?;
            leaf = Some(node);

            let terminal = rollout(node.get_state(), self.rollout, rng)?;
            backpropagate(node, &terminal);
            Ok(())
        }));

        let result = outcome.unwrap_or_else(|payload| Err(MctsError::from_panic(payload)));
        if result.is_err() {
            if let Some(node) = leaf.filter(|node| node.get_visits() == 0) {
                node.abandon();
            }
        }
        result
    }

    /// Descends from the root until a terminal node or a freshly expanded leaf.
    fn select_or_expand(&self) -> Result<&'a SearchNode<S>, MctsError> {
        let mut node = self.root;

        while !node.is_terminal() {
            if !node.is_expanded() {
                if let Some(child) = node.expand()? {
                    return Ok(child);
                }
            }
            let config = self.config;
            node = node.best_child(config.exploration_coef, config.selection_function, config.spin_limit)?;
        }

        Ok(node)
    }
}

/// Credits the outcome of `terminal` to `node` and every ancestor up to the root.
///
/// Each node receives the reward of the agent that moved into it.
fn backpropagate<S: State>(node: &SearchNode<S>, terminal: &S) {
    let mut current = Some(node);

    while let Some(node) = current {
        node.update_rewards(terminal.get_reward(node.get_state().get_previous_agent()));
        current = node.get_parent();
    }
}
