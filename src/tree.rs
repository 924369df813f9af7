//! Lock-free search tree shared by every worker thread.
//!
//! Each [`SearchNode`] owns its children through a fixed array of slots, one
//! per legal action of its state. Worker threads grow the tree concurrently
//! with nothing but atomics:
//!
//! - a claim counter hands every action index to exactly one thread,
//! - each slot is published once through a [`OnceLock`],
//! - visits and accumulated reward are two independent atomic counters,
//! - selection busy-waits on children that are claimed but not yet visited.
//!
//! Children are boxed, so a node never moves once it is in the tree. The
//! parent back-link is a plain pointer to that stable address.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicPtr, AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::utils::spin_until;
use crate::{MctsError, SelectionFunction, State};

/// An `f64` that can be updated concurrently, stored as bits in an `AtomicU64`.
#[derive(Debug)]
struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    fn new(value: f64) -> Self {
        AtomicF64 { bits: AtomicU64::new(value.to_bits()) }
    }

    #[inline]
    fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.bits.load(ordering))
    }

    /// Lock-free add through a compare-exchange loop. Returns the previous value.
    #[inline]
    fn fetch_add(&self, value: f64, ordering: Ordering) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self.bits.compare_exchange_weak(current, next, ordering, Ordering::Relaxed) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Storage for the child reached by one action.
struct Slot<S: State> {
    child: OnceLock<Box<SearchNode<S>>>,
    /// Set when a worker faulted while building or simulating this child.
    /// Selection skips abandoned slots instead of waiting for them forever.
    abandoned: AtomicBool,
}

impl<S: State> Slot<S> {
    fn new() -> Self {
        Slot { child: OnceLock::new(), abandoned: AtomicBool::new(false) }
    }

    /// Polled by the selection busy-wait.
    ///
    /// `None` keeps spinning, `Some(None)` skips the slot and `Some(Some(child))`
    /// yields a child with at least one visit.
    fn poll_visited(&self) -> Option<Option<&SearchNode<S>>> {
        if self.abandoned.load(Ordering::Acquire) {
            return Some(None);
        }

        match self.child.get() {
            Some(child) if child.get_visits() > 0 => Some(Some(child)),
            _ => None,
        }
    }
}

/// One explored position of the search tree.
///
/// A node owns its state, the action that led to it and one slot per legal
/// action of its state. Statistics are updated through atomics so that any
/// number of threads can share a `&SearchNode`.
pub struct SearchNode<S: State> {
    state: S,
    action: Option<S::Action>,
    /// Index of this node in its parent's slots.
    index: usize,
    parent: AtomicPtr<SearchNode<S>>,
    actions: Vec<S::Action>,
    slots: Box<[Slot<S>]>,
    /// Next action index to hand out. Negative once every action is claimed.
    next_action: AtomicIsize,
    visits: AtomicU64,
    rewards: AtomicF64,
}

impl<S: State> SearchNode<S> {
    fn new(parent: *mut SearchNode<S>, index: usize, action: Option<S::Action>, state: S) -> Self {
        let actions = if state.is_terminal() { Vec::new() } else { state.get_actions() };
        let slots = actions.iter().map(|_| Slot::new()).collect();
        let next_action = AtomicIsize::new(actions.len() as isize - 1);

        SearchNode {
            state,
            action,
            index,
            parent: AtomicPtr::new(parent),
            actions,
            slots,
            next_action,
            visits: AtomicU64::new(0),
            rewards: AtomicF64::new(0.0),
        }
    }

    /// Creates a root node for `state`.
    ///
    /// Nodes are always boxed: children keep a pointer to their parent, so a
    /// node must not move once it has been expanded.
    pub(crate) fn new_root(state: S) -> Box<Self> {
        Box::new(SearchNode::new(ptr::null_mut(), 0, None, state))
    }

    /// Gets the state of this position.
    #[inline]
    pub fn get_state(&self) -> &S {
        &self.state
    }

    /// Gets the action that led to this node, `None` for a node created as root.
    #[inline]
    pub fn get_action(&self) -> Option<&S::Action> {
        self.action.as_ref()
    }

    /// Gets the legal actions snapshotted at construction, in slot order.
    #[inline]
    pub fn get_actions(&self) -> &[S::Action] {
        &self.actions
    }

    /// Checks if this node is the root (has no parent).
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.load(Ordering::Relaxed).is_null()
    }

    /// Gets the parent node if it exists.
    #[inline]
    pub fn get_parent(&self) -> Option<&SearchNode<S>> {
        let parent = self.parent.load(Ordering::Relaxed);
        // SAFETY: a non-null parent owns `self` through one of its slots and
        // nodes are boxed, so the pointee is alive and pinned for as long as
        // `self` is borrowed. Detaching `self` from its parent requires
        // `&mut self` and happens before the former parent is dropped.
        unsafe { parent.as_ref() }
    }

    /// Whether the game is over at this node.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether every action of this node has been claimed by some thread.
    ///
    /// Once true, stays true. A node without legal actions is expanded from
    /// the start.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.next_action.load(Ordering::Acquire) < 0
    }

    /// Number of child slots, i.e. legal actions at construction time.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.slots.len()
    }

    /// Gets the child created for action index `i`, if it exists yet.
    #[inline]
    pub fn get_child(&self, i: usize) -> Option<&SearchNode<S>> {
        self.slots.get(i).and_then(|slot| slot.child.get()).map(|child| &**child)
    }

    /// Iterates over the children created so far, in action order.
    pub fn children(&self) -> impl Iterator<Item = &SearchNode<S>> + '_ {
        self.slots.iter().filter_map(|slot| slot.child.get()).map(|child| &**child)
    }

    /// Number of times this node has been visited during backpropagation.
    #[inline]
    pub fn get_visits(&self) -> u64 {
        self.visits.load(Ordering::Acquire)
    }

    /// Sum of the rewards credited to this node.
    #[inline]
    pub fn get_reward_sum(&self) -> f64 {
        self.rewards.load(Ordering::Acquire)
    }

    /// Mean reward of this node, `0.0` while unvisited.
    #[inline]
    pub fn get_value(&self) -> f64 {
        let visits = self.get_visits();
        if visits != 0 { self.get_reward_sum() / visits as f64 } else { 0.0 }
    }

    /// Claims the next untried action and creates its child.
    ///
    /// # Returns
    /// - `Ok(Some(child))` when this thread won an action. The child is new and
    ///   unvisited; the caller is expected to simulate and backpropagate it.
    /// - `Ok(None)` when every action was already claimed.
    /// - `Err(MctsError::StatePanicked)` when the state panicked while building
    ///   the child. The slot is then marked abandoned.
    pub(crate) fn expand(&self) -> Result<Option<&SearchNode<S>>, MctsError> {
        let claimed = self.next_action.fetch_sub(1, Ordering::AcqRel);
        if claimed < 0 {
            return Ok(None);
        }

        let index = claimed as usize;
        let slot = &self.slots[index];
        let parent = self as *const SearchNode<S> as *mut SearchNode<S>;

        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            let action = self.actions[index].clone();
            let state = self.state.take_action(&action);
            SearchNode::new(parent, index, Some(action), state)
        }));

        match built {
            Ok(child) => Ok(Some(&**slot.child.get_or_init(|| Box::new(child)))),
            Err(payload) => {
                slot.abandoned.store(true, Ordering::Release);
                Err(MctsError::from_panic(payload))
            }
        }
    }

    /// Marks this node's slot in its parent as abandoned.
    ///
    /// Used when a worker faulted between expanding this node and crediting it
    /// a visit, so that no other worker waits on it.
    pub(crate) fn abandon(&self) {
        if let Some(parent) = self.get_parent() {
            parent.slots[self.index].abandoned.store(true, Ordering::Release);
        }
    }

    /// Credits one visit and `reward` to this node.
    ///
    /// The visit counter and the reward sum are two separate atomic updates; a
    /// concurrent reader may observe one without the other.
    #[inline]
    pub(crate) fn update_rewards(&self, reward: f64) {
        self.visits.fetch_add(1, Ordering::Release);
        self.rewards.fetch_add(reward, Ordering::Release);
    }

    /// Selects the child with the highest score.
    ///
    /// Every slot is waited for until its child exists and has at least one
    /// visit, except abandoned slots which are skipped. Ties go to the first
    /// child in action order.
    ///
    /// # Parameters
    /// - `exploration_coef`: `0` for the final decision, the exploration constant otherwise.
    /// - `selection`: Scoring function, see [`crate::uct`].
    /// - `spin_limit`: Bound on each busy-wait, `None` to wait forever.
    pub(crate) fn best_child(
        &self,
        exploration_coef: f64,
        selection: SelectionFunction,
        spin_limit: Option<u64>,
    ) -> Result<&SearchNode<S>, MctsError> {
        let mut best: Option<(&SearchNode<S>, f64)> = None;

        for slot in self.slots.iter() {
            let Some(child) = spin_until(spin_limit, || slot.poll_visited())? else {
                continue;
            };

            let parent_visits = self.get_visits().max(1) as f64;
            let score = selection(child.get_value(), child.get_visits() as f64, parent_visits, exploration_coef);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }

        best.map(|(child, _)| child).ok_or(MctsError::NoSelectableChild)
    }

    /// Finds the child reached by `action` with a linear scan.
    pub fn find_child_for(&self, action: &S::Action) -> Option<&SearchNode<S>> {
        self.children().find(|child| child.action.as_ref() == Some(action))
    }

    /// Removes the child reached by `action` from this node and returns it as
    /// a new root, with its subtree and statistics.
    pub(crate) fn take_child_for(&mut self, action: &S::Action) -> Option<Box<SearchNode<S>>> {
        let index = self.find_child_for(action)?.index;
        let mut child = self.slots[index].child.take()?;
        child.detach();
        Some(child)
    }

    /// Releases the parent link, so that this node never points to a parent
    /// it outlives.
    fn detach(&mut self) {
        *self.parent.get_mut() = ptr::null_mut();
    }

    fn take_children(&mut self) -> impl Iterator<Item = Box<SearchNode<S>>> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.child.take())
    }
}

impl<S: State> Drop for SearchNode<S> {
    // Subtrees can be as deep as a game is long, so they are torn down
    // iteratively rather than through recursive drops.
    fn drop(&mut self) {
        let mut pending: Vec<Box<SearchNode<S>>> = self.take_children().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.take_children());
        }
    }
}

impl<S: State> std::fmt::Debug for SearchNode<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchNode")
            .field("action", &self.action)
            .field("visits", &self.get_visits())
            .field("rewards", &self.get_reward_sum())
            .field("children", &self.children().count())
            .field("expanded", &self.is_expanded())
            .finish()
    }
}
