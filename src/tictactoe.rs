//! Generalized tic-tac-toe: a `dim × dim` board where `needed` marks in a row,
//! column or diagonal win. Used by the demo driver, the benchmarks and the tests.

use std::fmt;

use crate::{Agent, State, NO_AGENT};

/// A move: the cell to mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Row index, from the top.
    pub row: u8,
    /// Column index, from the left.
    pub col: u8,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[row={}, col={}]", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    InProgress,
    Draw,
    Won(Agent),
}

/// A tic-tac-toe position. Agent `1` plays `X` and moves first, agent `2` plays `O`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    board: Vec<Agent>,
    dim: u8,
    needed: u8,
    agent: Agent,
    round: u16,
    status: Status,
}

/// Directions scanned for a line through the last move: row, column and both diagonals.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

impl TicTacToe {
    /// Classic game: `dim × dim` board, a full line is needed to win.
    ///
    /// # Examples
    /// ```rust
    /// use lockfree_mcts::{State, TicTacToe};
    /// let game = TicTacToe::start(3);
    /// assert_eq!(game.get_agent(), 1);
    /// assert_eq!(game.get_actions().len(), 9);
    /// ```
    pub fn start(dim: u8) -> Self {
        Self::start_with(dim, dim)
    }

    /// `dim × dim` board where `needed` marks in a row win.
    pub fn start_with(dim: u8, needed: u8) -> Self {
        assert!(dim > 0 && needed > 0 && needed <= dim, "invalid board {dim}x{dim} with {needed} in a row");
        TicTacToe {
            board: vec![NO_AGENT; dim as usize * dim as usize],
            dim,
            needed,
            agent: 1,
            round: 0,
            status: Status::InProgress,
        }
    }

    /// Side length of the board.
    pub fn dim(&self) -> u8 {
        self.dim
    }

    /// Number of marks in a row needed to win.
    pub fn needed(&self) -> u8 {
        self.needed
    }

    /// Owner of a cell, [`NO_AGENT`] if empty.
    pub fn get(&self, cell: Cell) -> Agent {
        self.board[self.offset(cell.row as i32, cell.col as i32)]
    }

    fn offset(&self, row: i32, col: i32) -> usize {
        row as usize * self.dim as usize + col as usize
    }

    fn owned_by(&self, row: i32, col: i32, agent: Agent) -> bool {
        let dim = self.dim as i32;
        (0..dim).contains(&row) && (0..dim).contains(&col) && self.board[self.offset(row, col)] == agent
    }

    /// Length of the line of `agent` marks through `cell` along `(dr, dc)`.
    fn line_length(&self, cell: Cell, (dr, dc): (i32, i32), agent: Agent) -> u8 {
        let (row, col) = (cell.row as i32, cell.col as i32);
        let mut length = 1;

        for sign in [1, -1] {
            let mut step = 1;
            while self.owned_by(row + sign * step * dr, col + sign * step * dc, agent) {
                length += 1;
                step += 1;
            }
        }

        length
    }

    fn status_after(&self, cell: Cell, agent: Agent) -> Status {
        let won = DIRECTIONS.iter().any(|&direction| self.line_length(cell, direction, agent) >= self.needed);

        if won {
            Status::Won(agent)
        } else if self.round as usize == self.board.len() {
            Status::Draw
        } else {
            Status::InProgress
        }
    }
}

impl State for TicTacToe {
    type Action = Cell;

    fn is_terminal(&self) -> bool {
        self.status != Status::InProgress
    }

    fn get_actions(&self) -> Vec<Cell> {
        if self.is_terminal() {
            return Vec::new();
        }

        (0..self.dim)
            .flat_map(|row| (0..self.dim).map(move |col| Cell { row, col }))
            .filter(|&cell| self.get(cell) == NO_AGENT)
            .collect()
    }

    fn get_agent(&self) -> Agent {
        self.agent
    }

    fn get_previous_agent(&self) -> Agent {
        3 - self.agent
    }

    fn get_reward(&self, agent: Agent) -> f64 {
        match self.status {
            Status::Won(winner) if winner == agent => 1.0,
            Status::Won(_) => 0.0,
            Status::Draw => 0.5,
            Status::InProgress => panic!("reward requested for an unfinished game"),
        }
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn apply_action(&mut self, action: &Cell) {
        let offset = self.offset(action.row as i32, action.col as i32);
        assert_eq!(self.board[offset], NO_AGENT, "cell {action} is already taken");

        let agent = self.agent;
        self.board[offset] = agent;
        self.round += 1;
        self.agent = 3 - agent;
        self.status = self.status_after(*action, agent);
    }

    fn get_winner(&self) -> Agent {
        match self.status {
            Status::Won(winner) => winner,
            _ => NO_AGENT,
        }
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.chunks(self.dim as usize) {
            for &owner in row {
                let mark = match owner {
                    1 => 'X',
                    2 => 'O',
                    _ => '.',
                };
                write!(f, "{mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut TicTacToe, cells: &[(u8, u8)]) {
        for &(row, col) in cells {
            game.apply_action(&Cell { row, col });
        }
    }

    #[test]
    fn test_start() {
        let game = TicTacToe::start_with(6, 3);
        assert_eq!(game.get_actions().len(), 36);
        assert_eq!(game.get_agent(), 1);
        assert_eq!(game.get_previous_agent(), 2);
        assert!(!game.is_terminal());
        assert_eq!(game.get_winner(), NO_AGENT);
    }

    #[test]
    fn test_row_win() {
        let mut game = TicTacToe::start(3);
        play(&mut game, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);

        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), 1);
        assert_eq!(game.get_reward(1), 1.0);
        assert_eq!(game.get_reward(2), 0.0);
        assert!(game.get_actions().is_empty());
        assert_eq!(game.to_string(), "XXX\nOO.\n...\n");
    }

    #[test]
    fn test_column_win() {
        let mut game = TicTacToe::start(3);
        play(&mut game, &[(0, 0), (0, 1), (2, 2), (1, 1), (1, 0), (2, 1)]);

        assert_eq!(game.get_winner(), 2);
        assert_eq!(game.get_previous_agent(), 2);
    }

    #[test]
    fn test_short_diagonal_on_large_board() {
        let mut game = TicTacToe::start_with(6, 3);
        play(&mut game, &[(1, 4), (0, 0), (2, 3), (0, 1), (3, 2)]);

        assert_eq!(game.get_winner(), 1);
    }

    #[test]
    fn test_broken_line_does_not_win() {
        let mut game = TicTacToe::start_with(5, 3);
        play(&mut game, &[(0, 0), (4, 4), (0, 1), (4, 3), (0, 3)]);

        assert!(!game.is_terminal());
    }

    #[test]
    fn test_draw() {
        let mut game = TicTacToe::start(3);
        play(&mut game, &[(0, 0), (0, 1), (0, 2), (1, 1), (1, 0), (1, 2), (2, 1), (2, 0), (2, 2)]);

        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), NO_AGENT);
        assert_eq!(game.get_reward(1), 0.5);
        assert_eq!(game.get_reward(2), 0.5);
    }

    #[test]
    fn test_take_action_is_pure() {
        let game = TicTacToe::start(3);
        let next = game.take_action(&Cell { row: 1, col: 1 });

        assert_eq!(game.get(Cell { row: 1, col: 1 }), NO_AGENT);
        assert_eq!(next.get(Cell { row: 1, col: 1 }), 1);
        assert_eq!(next.get_agent(), 2);
    }

    #[test]
    #[should_panic]
    fn test_taken_cell() {
        let mut game = TicTacToe::start(3);
        play(&mut game, &[(0, 0), (0, 0)]);
    }
}
