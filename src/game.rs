//! Module defining the trait a domain model implements to be searched by MCTS.

use std::fmt::Debug;

/// Identifier of a player taking part in the game.
///
/// Agents are positive integers. [`NO_AGENT`] is reserved for "nobody",
/// which is what [`State::get_winner`] reports for a draw.
pub type Agent = u32;

/// The agent id meaning "no agent" (a draw, or a game not won yet).
pub const NO_AGENT: Agent = 0;

/// Trait defining the interface for a position that can be searched with MCTS.
///
/// A `State` is a snapshot of the game for one agent-to-move. The search engine
/// only ever reads the canonical state stored in a tree node; rollouts run on a
/// private copy obtained through [`State::copy`] and advance it in place with
/// [`State::apply_action`].
///
/// All game-specific logic lives in implementations of this trait. The engine
/// shares states between worker threads, hence the `Send + Sync` bound.
pub trait State: Send + Sync + Sized {
    /// The move identifier enumerated by [`State::get_actions`].
    ///
    /// Actions are compared with `==` when the engine looks up the child
    /// reached by an action played outside of the search.
    type Action: Clone + PartialEq + Debug + Send + Sync;

    /// Determines if the game has reached a terminal state.
    ///
    /// # Examples
    /// ```rust
    /// use lockfree_mcts::{State, TicTacToe};
    /// let state = TicTacToe::start(3);
    /// assert!(!state.is_terminal());
    /// ```
    fn is_terminal(&self) -> bool;

    /// Returns the legal actions from this state, in a stable order.
    ///
    /// The sequence is fixed for a given snapshot and may be empty. The engine
    /// allocates one child slot per returned action, in this order.
    ///
    /// # Examples
    /// ```rust
    /// use lockfree_mcts::{State, TicTacToe};
    /// let state = TicTacToe::start(3);
    /// assert_eq!(state.get_actions().len(), 9);
    /// ```
    fn get_actions(&self) -> Vec<Self::Action>;

    /// Returns the agent whose turn it is.
    fn get_agent(&self) -> Agent;

    /// Returns the agent that made the move leading into this state.
    ///
    /// Backpropagation credits each node with the reward of this agent, since
    /// it is the agent that chose to move into the node.
    fn get_previous_agent(&self) -> Agent;

    /// Returns the reward of `agent`, a value in `[0, 1]`.
    ///
    /// Conventionally `1.0` is a win, `0.0` a loss and `0.5` a draw. Only
    /// meaningful on a terminal state; implementations may panic otherwise.
    fn get_reward(&self, agent: Agent) -> f64;

    /// Creates an independent copy of this state.
    ///
    /// Mutating the copy through [`State::apply_action`] must never affect
    /// the original.
    fn copy(&self) -> Self;

    /// Applies `action` in place, transitioning this state to the next one.
    ///
    /// This is the fast path used during rollouts. It's assumed that `action`
    /// is one of the actions returned by [`State::get_actions`].
    fn apply_action(&mut self, action: &Self::Action);

    /// Returns the state reached by playing `action`, leaving `self` untouched.
    ///
    /// # Examples
    /// ```rust
    /// use lockfree_mcts::{State, TicTacToe};
    /// let state = TicTacToe::start(3);
    /// let action = state.get_actions()[4].clone();
    /// let next = state.take_action(&action);
    /// assert_eq!(state.get_actions().len(), 9);
    /// assert_eq!(next.get_actions().len(), 8);
    /// assert_eq!(next.get_previous_agent(), state.get_agent());
    /// ```
    fn take_action(&self, action: &Self::Action) -> Self {
        let mut next = self.copy();
        next.apply_action(action);
        next
    }

    /// Returns the winner of a finished game, or [`NO_AGENT`] for a draw or an
    /// unfinished game.
    ///
    /// The engine does not use this for scoring; it exists for drivers and tests.
    fn get_winner(&self) -> Agent;
}
