//! Search strategies.
//!
//! One generic expansion loop lives in `search::SearchTree`; everything a
//! variant decides for itself - frontier ordering, novelty admission, what
//! happens when the root advances - goes through this trait. The historical
//! alternative (one subclass per variant, each with its own copy of the
//! control loop) is exactly what this seam exists to avoid.

use crate::config::{SearchConfig, SearchMethod};
use crate::node::NodeId;
use crate::tree::{DuplicateMode, Tree};

mod breadth_first;
mod iw1;
mod piw1;

pub use breadth_first::BreadthFirstStrategy;
pub use iw1::Iw1Strategy;
pub use piw1::Piw1Strategy;

/// Per-variant policy consumed by the generic expansion loop.
pub trait Strategy: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether this strategy prunes by novelty. Strategies that do get
    /// their pruned nodes re-examined when a reused subtree is expanded.
    fn novelty_pruning(&self) -> bool {
        true
    }

    /// Sibling-duplicate predicate this strategy uses.
    fn duplicate_mode(&self) -> DuplicateMode {
        DuplicateMode::State
    }

    /// Drop all per-episode state: frontier and novelty tables.
    fn clear(&mut self);

    /// The root advanced; novelty tables reset so previously pruned states
    /// can be reconsidered. The frontier is rebuilt by `begin`.
    fn on_root_advanced(&mut self);

    /// Start a new expansion pass from `root`.
    fn begin(&mut self, tree: &Tree, root: NodeId);

    /// Record the root observation before any child is admitted.
    fn seed_root(&mut self, obs: &[u8], accumulated_reward: f32);

    /// Novelty gate for a simulated child. Returning `false` prunes it.
    /// A passing check also records the observation.
    fn admit(&mut self, obs: &[u8], accumulated_reward: f32) -> bool;

    /// Count of novel features seen by the last passing `admit` call.
    fn novelty_score(&self) -> u32 {
        0
    }

    /// Offer an expandable node to the frontier.
    fn frontier_push(&mut self, tree: &Tree, id: NodeId);

    /// Next node to expand, or `None` when the search space is exhausted.
    fn frontier_pop(&mut self, tree: &Tree) -> Option<NodeId>;

    fn frontier_is_empty(&self) -> bool;
}

/// Build the strategy selected by the configuration.
pub fn make_strategy(config: &SearchConfig, obs_len: usize) -> Box<dyn Strategy> {
    match config.method {
        SearchMethod::BreadthFirst => Box::new(BreadthFirstStrategy::new()),
        SearchMethod::Iw1 => Box::new(Iw1Strategy::new(config, obs_len)),
        SearchMethod::Piw1 => Box::new(Piw1Strategy::new(config, obs_len)),
    }
}

/// Shared pivot bookkeeping for the IW-family strategies.
///
/// Rewarding nodes are not expanded immediately; they park on a pivot list
/// and seed a fresh wave once the current frontier drains. Depth limits are
/// measured relative to the pivot a node descends from, so the horizon
/// restarts at every reward.
#[derive(Debug, Default)]
pub(crate) struct PivotList {
    pivots: std::collections::VecDeque<NodeId>,
    /// Pivot-relative base depth inherited by pushed children
    pub current_base: u32,
}

impl PivotList {
    pub fn clear(&mut self) {
        self.pivots.clear();
        self.current_base = 0;
    }

    pub fn push(&mut self, id: NodeId) {
        self.pivots.push_back(id);
    }

    pub fn pop(&mut self, tree: &Tree) -> Option<NodeId> {
        let id = self.pivots.pop_front()?;
        self.current_base = tree.get(id).depth;
        Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Whether a node popped from the queue should be deferred to the pivot
    /// list instead of expanded.
    pub fn defers(&self, stop_on_first_reward: bool, node_reward: f32) -> bool {
        stop_on_first_reward && node_reward != 0.0
    }

    /// Whether the node is past the pivot-relative reward horizon.
    pub fn past_horizon(&self, depth: u32, base: u32, horizon: u32) -> bool {
        horizon != 0 && depth.saturating_sub(base) > horizon - 1
    }
}
