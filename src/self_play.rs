//! Plays a game between two engines, each growing its own tree.

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, trace};

use crate::{Agent, Mcts, MctsConfig, MctsError, State, NO_AGENT};

/// Result of a finished game, from the engines' point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// Nobody won.
    Draw,
    /// Engine `1` or `2` won.
    Won(usize),
}

impl GameOutcome {
    /// Index used in score tables: `0` for a draw, the winning engine otherwise.
    pub fn index(self) -> usize {
        match self {
            GameOutcome::Draw => 0,
            GameOutcome::Won(engine) => engine,
        }
    }
}

/// A finished game.
#[derive(Debug, Clone)]
pub struct GameRecord<S: State> {
    /// Which engine won, if any.
    pub outcome: GameOutcome,
    /// Every action played, in order.
    pub moves: Vec<S::Action>,
    /// The terminal state the game ended in.
    pub final_state: S,
}

/// Two engines playing one game against each other.
///
/// Engine `1` is configured by `config1` and engine `2` by `config2`. Each
/// agent of the game is bound to an engine the first time it has to move,
/// starting with the first engine and alternating afterwards. A win of an
/// agent that never moved is reported as a draw.
pub struct SelfPlay<S: State> {
    state: S,
    engines: [Mcts<S>; 2],
    first: Option<usize>,
}

impl<S: State> SelfPlay<S> {
    /// Creates a game starting at `state`, between an engine configured by
    /// `config1` and one configured by `config2`.
    ///
    /// # Returns
    /// `Err(MctsError::InvalidConfig(_))` if either configuration does not validate.
    pub fn new(state: S, config1: MctsConfig, config2: MctsConfig) -> Result<Self, MctsError> {
        Ok(SelfPlay { state, engines: [Mcts::new(config1)?, Mcts::new(config2)?], first: None })
    }

    /// Builder pattern: let engine `engine` (`1` or `2`) move first instead
    /// of drawing it at random.
    ///
    /// # Returns
    /// `Err(MctsError::InvalidConfig(_))` for any other engine number.
    pub fn with_first(mut self, engine: usize) -> Result<Self, MctsError> {
        if engine != 1 && engine != 2 {
            return Err(MctsError::InvalidConfig(format!("first engine must be 1 or 2, got {engine}")));
        }
        self.first = Some(engine);
        Ok(self)
    }

    /// Plays until the state is terminal.
    ///
    /// Every turn, the engine to move is positioned on the current state
    /// through the opponent's last action, so that it reuses its subtree when
    /// it has one, then thinks and plays.
    pub fn play(mut self) -> Result<GameRecord<S>, MctsError> {
        let first = match self.first {
            Some(engine) => engine - 1,
            None => rand::rng().random_range(0..2),
        };

        let mut seats: HashMap<Agent, usize> = HashMap::new();
        let mut moves: Vec<S::Action> = Vec::new();

        while !self.state.is_terminal() {
            let agent = self.state.get_agent();
            let seat_count = seats.len();
            let seat = *seats.entry(agent).or_insert((first + seat_count) % 2);

            let mcts = &mut self.engines[seat];
            mcts.set_root(moves.last(), self.state.copy());
            let stats = mcts.think()?;
            self.state = mcts.take_action()?;

            let action = mcts.get_last_action().cloned().ok_or(MctsError::NoSelectableChild)?;
            let iterations = stats.total_iterations();
            trace!(engine = seat + 1, agent, ?action, iterations, "move played");
            moves.push(action);
        }

        let winner = self.state.get_winner();
        let outcome = match seats.get(&winner) {
            Some(&seat) if winner != NO_AGENT => GameOutcome::Won(seat + 1),
            _ => GameOutcome::Draw,
        };
        debug!(?outcome, moves = moves.len(), "game over");

        Ok(GameRecord { outcome, moves, final_state: self.state })
    }
}
