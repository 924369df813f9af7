//! Small games used to test the search engine.

use crate::{Agent, State, NO_AGENT};

/// Subtraction game: players alternately take 1 to `max_take` items from a
/// pile, and whoever takes the last item wins.
///
/// With `max_take == 2`, a pile that is a multiple of 3 is lost for the player
/// to move, which gives tests a known best action.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining: u32,
    max_take: u32,
    agent: Agent,
}

impl Countdown {
    /// A pile of `remaining` items where 1 or 2 items can be taken.
    pub fn new(remaining: u32) -> Self {
        Countdown { remaining, max_take: 2, agent: 1 }
    }

    /// A pile where exactly one item is taken per move, so every node has a
    /// single child. Useful to build deep trees.
    pub fn chain(remaining: u32) -> Self {
        Countdown { remaining, max_take: 1, agent: 1 }
    }

    /// Items left on the pile.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl State for Countdown {
    type Action = u32;

    fn is_terminal(&self) -> bool {
        self.remaining == 0
    }

    fn get_actions(&self) -> Vec<u32> {
        (1..=self.max_take.min(self.remaining)).collect()
    }

    fn get_agent(&self) -> Agent {
        self.agent
    }

    fn get_previous_agent(&self) -> Agent {
        3 - self.agent
    }

    fn get_reward(&self, agent: Agent) -> f64 {
        assert!(self.is_terminal(), "reward of an unfinished game");
        if agent == self.get_winner() { 1.0 } else { 0.0 }
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn apply_action(&mut self, action: &u32) {
        self.remaining -= action;
        self.agent = 3 - self.agent;
    }

    fn get_winner(&self) -> Agent {
        if self.is_terminal() { self.get_previous_agent() } else { NO_AGENT }
    }
}

/// A [`Countdown`] that panics when a move leaves exactly `fuse` items.
#[derive(Debug, Clone)]
pub struct Exploding {
    inner: Countdown,
    fuse: u32,
}

impl Exploding {
    /// A pile of `remaining` items that explodes when `fuse` items are left.
    pub fn new(remaining: u32, fuse: u32) -> Self {
        Exploding { inner: Countdown::new(remaining), fuse }
    }
}

impl State for Exploding {
    type Action = u32;

    fn is_terminal(&self) -> bool {
        self.inner.is_terminal()
    }

    fn get_actions(&self) -> Vec<u32> {
        self.inner.get_actions()
    }

    fn get_agent(&self) -> Agent {
        self.inner.get_agent()
    }

    fn get_previous_agent(&self) -> Agent {
        self.inner.get_previous_agent()
    }

    fn get_reward(&self, agent: Agent) -> f64 {
        self.inner.get_reward(agent)
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn apply_action(&mut self, action: &u32) {
        self.inner.apply_action(action);
        if self.inner.remaining() == self.fuse {
            panic!("fuse blown at {}", self.fuse);
        }
    }

    fn get_winner(&self) -> Agent {
        self.inner.get_winner()
    }
}

/// A broken state: never terminal, yet without any legal action.
#[derive(Debug, Clone, Copy)]
pub struct Stuck;

impl State for Stuck {
    type Action = u32;

    fn is_terminal(&self) -> bool {
        false
    }

    fn get_actions(&self) -> Vec<u32> {
        Vec::new()
    }

    fn get_agent(&self) -> Agent {
        1
    }

    fn get_previous_agent(&self) -> Agent {
        2
    }

    fn get_reward(&self, _agent: Agent) -> f64 {
        0.5
    }

    fn copy(&self) -> Self {
        Stuck
    }

    fn apply_action(&mut self, _action: &u32) {}

    fn get_winner(&self) -> Agent {
        NO_AGENT
    }
}
