//! A Rust library providing a lock-free, parallel
//! Monte Carlo Tree Search (MCTS) engine with UCT selection.
//!
//! Any number of worker threads grow one shared search tree. Nodes are
//! claimed, published and updated with atomics only, and the tree is kept
//! between decisions so that the subtree of the action played is reused.
//!
//! # Modules
//! - `game`: Defines the [`State`] trait implemented by games.
//! - `tree`: Implements the lock-free tree data structure used by MCTS.
//! - `policy`: Selection scores and rollout policies.
//! - `mcts`: Provides the [`Mcts`] engine and its worker loop.
//! - `config`: Search parameters, see [`MctsConfig`].
//! - `self_play`: Plays two engines against each other.
//! - `tictactoe`: Generalized tic-tac-toe, used by the demo driver and the tests.
//! - `utils`: Contains general utility functions.
//! - `test_utils`: Provides small games for testing the engine.
//!
//! # Examples
//! ```rust
//! use lockfree_mcts::{Mcts, MctsConfig, MctsError, State, TicTacToe};
//!
//! fn main() -> Result<(), MctsError> {
//!     let config = MctsConfig::fixed_iterations(500).with_threads(2);
//!     let mut mcts = Mcts::new(config)?;
//!     let mut state = TicTacToe::start(3);
//!     mcts.set_root(None, state.copy());
//!
//!     // Both sides are played by the same engine: after `take_action` the
//!     // root already is the new state, with the statistics gathered so far.
//!     while !state.is_terminal() {
//!         mcts.think()?;
//!         state = mcts.take_action()?;
//!     }
//!
//!     println!("{state}");
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod game;
mod mcts;
mod policy;
mod self_play;
mod tictactoe;
mod tree;
pub mod utils;

#[doc(hidden)]
pub mod test_utils;

pub use config::*;
pub use error::*;
pub use game::*;
pub use mcts::*;
pub use policy::*;
pub use self_play::*;
pub use tictactoe::*;
pub use tree::SearchNode;
