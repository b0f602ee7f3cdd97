//! Plain breadth-first lookahead: FIFO frontier, no novelty pruning.

use std::collections::VecDeque;

use crate::node::NodeId;
use crate::strategy::Strategy;
use crate::tree::Tree;

#[derive(Debug, Default)]
pub struct BreadthFirstStrategy {
    queue: VecDeque<NodeId>,
}

impl BreadthFirstStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BreadthFirstStrategy {
    fn name(&self) -> &'static str {
        "brfs"
    }

    fn novelty_pruning(&self) -> bool {
        false
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn on_root_advanced(&mut self) {}

    fn begin(&mut self, _tree: &Tree, root: NodeId) {
        self.queue.clear();
        self.queue.push_back(root);
    }

    fn seed_root(&mut self, _obs: &[u8], _accumulated_reward: f32) {}

    fn admit(&mut self, _obs: &[u8], _accumulated_reward: f32) -> bool {
        true
    }

    fn frontier_push(&mut self, _tree: &Tree, id: NodeId) {
        self.queue.push_back(id);
    }

    fn frontier_pop(&mut self, _tree: &Tree) -> Option<NodeId> {
        self.queue.pop_front()
    }

    fn frontier_is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
