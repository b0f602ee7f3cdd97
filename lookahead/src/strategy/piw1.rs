//! p-IW(1): reward-aware novelty search with a priority frontier.
//!
//! The presence table is replaced by a reward-ceiling table: a state is
//! admitted if it reaches some observation feature with a higher accumulated
//! reward than any state before it. The frontier is a priority queue ordered
//! either by accumulated reward or by the count of novel features.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::{Piw1Priority, SearchConfig};
use crate::node::NodeId;
use crate::novelty::RewardTable;
use crate::strategy::{PivotList, Strategy};
use crate::tree::{DuplicateMode, Tree};

/// Frontier entry carrying its priority keys and pivot base depth.
#[derive(Debug, Clone, Copy)]
struct Entry {
    id: NodeId,
    accumulated_reward: f32,
    novelty: u32,
    base: u32,
}

/// Max accumulated reward first; among equals, fewer novel features first.
#[derive(Debug)]
struct ByReward(Entry);

impl PartialEq for ByReward {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ByReward {}
impl PartialOrd for ByReward {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ByReward {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .accumulated_reward
            .total_cmp(&other.0.accumulated_reward)
            .then_with(|| other.0.novelty.cmp(&self.0.novelty))
    }
}

/// Max novel-feature count first; among equals, higher accumulated reward.
#[derive(Debug)]
struct ByNovelty(Entry);

impl PartialEq for ByNovelty {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ByNovelty {}
impl PartialOrd for ByNovelty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ByNovelty {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .novelty
            .cmp(&other.0.novelty)
            .then_with(|| {
                self.0
                    .accumulated_reward
                    .total_cmp(&other.0.accumulated_reward)
            })
    }
}

#[derive(Debug)]
enum Frontier {
    Reward(BinaryHeap<ByReward>),
    Novelty(BinaryHeap<ByNovelty>),
}

impl Frontier {
    fn new(priority: Piw1Priority) -> Self {
        match priority {
            Piw1Priority::Reward => Self::Reward(BinaryHeap::new()),
            Piw1Priority::Novelty => Self::Novelty(BinaryHeap::new()),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Reward(heap) => heap.clear(),
            Self::Novelty(heap) => heap.clear(),
        }
    }

    fn push(&mut self, entry: Entry) {
        match self {
            Self::Reward(heap) => heap.push(ByReward(entry)),
            Self::Novelty(heap) => heap.push(ByNovelty(entry)),
        }
    }

    fn pop(&mut self) -> Option<Entry> {
        match self {
            Self::Reward(heap) => heap.pop().map(|e| e.0),
            Self::Novelty(heap) => heap.pop().map(|e| e.0),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Reward(heap) => heap.is_empty(),
            Self::Novelty(heap) => heap.is_empty(),
        }
    }
}

#[derive(Debug)]
pub struct Piw1Strategy {
    table: RewardTable,
    frontier: Frontier,
    pivots: PivotList,
    last_novelty: u32,
    stop_on_first_reward: bool,
    /// 0 = unlimited
    reward_horizon: u32,
}

impl Piw1Strategy {
    pub fn new(config: &SearchConfig, obs_len: usize) -> Self {
        Self {
            table: RewardTable::new(obs_len, config.novelty_boolean),
            frontier: Frontier::new(config.piw1_priority),
            pivots: PivotList::default(),
            last_novelty: 0,
            stop_on_first_reward: config.iw1_stop_on_first_reward,
            reward_horizon: config.iw1_reward_horizon,
        }
    }
}

impl Strategy for Piw1Strategy {
    fn name(&self) -> &'static str {
        "piw1"
    }

    fn duplicate_mode(&self) -> DuplicateMode {
        DuplicateMode::RewardDominant
    }

    fn clear(&mut self) {
        self.table.clear();
        self.frontier.clear();
        self.pivots.clear();
        self.last_novelty = 0;
    }

    fn on_root_advanced(&mut self) {
        self.table.clear();
    }

    fn begin(&mut self, _tree: &Tree, root: NodeId) {
        self.frontier.clear();
        self.pivots.clear();
        self.pivots.push(root);
    }

    fn seed_root(&mut self, obs: &[u8], accumulated_reward: f32) {
        self.table.update(obs, accumulated_reward);
    }

    fn admit(&mut self, obs: &[u8], accumulated_reward: f32) -> bool {
        if self.table.check_novelty(obs, accumulated_reward) {
            self.last_novelty = self.table.novel_count(obs, accumulated_reward);
            self.table.update(obs, accumulated_reward);
            true
        } else {
            self.last_novelty = 0;
            false
        }
    }

    fn novelty_score(&self) -> u32 {
        self.last_novelty
    }

    fn frontier_push(&mut self, tree: &Tree, id: NodeId) {
        let node = tree.get(id);
        self.frontier.push(Entry {
            id,
            accumulated_reward: node.accumulated_reward,
            novelty: node.novelty,
            base: self.pivots.current_base,
        });
    }

    fn frontier_pop(&mut self, tree: &Tree) -> Option<NodeId> {
        loop {
            if let Some(entry) = self.frontier.pop() {
                let node = tree.get(entry.id);
                if self
                    .pivots
                    .past_horizon(node.depth, entry.base, self.reward_horizon)
                {
                    continue;
                }
                if self.pivots.defers(self.stop_on_first_reward, node.node_reward) {
                    self.pivots.push(entry.id);
                    continue;
                }
                self.pivots.current_base = entry.base;
                return Some(entry.id);
            }
            return self.pivots.pop(tree);
        }
    }

    fn frontier_is_empty(&self) -> bool {
        self.frontier.is_empty() && self.pivots.is_empty()
    }
}
