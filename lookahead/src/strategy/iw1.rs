//! IW(1): breadth-first search pruned by feature novelty.
//!
//! A generated state survives only if some (position, value) observation
//! feature is new to the current planning episode. Rewarding nodes become
//! pivots: they are set aside and expanded as fresh waves once the current
//! frontier drains, with the optional reward horizon measured from the
//! pivot.

use std::collections::VecDeque;

use crate::config::SearchConfig;
use crate::node::NodeId;
use crate::novelty::PresenceTable;
use crate::strategy::{PivotList, Strategy};
use crate::tree::Tree;

#[derive(Debug)]
pub struct Iw1Strategy {
    table: PresenceTable,
    /// FIFO frontier entries carry the pivot-relative base depth
    queue: VecDeque<(NodeId, u32)>,
    pivots: PivotList,
    stop_on_first_reward: bool,
    /// 0 = unlimited
    reward_horizon: u32,
}

impl Iw1Strategy {
    pub fn new(config: &SearchConfig, obs_len: usize) -> Self {
        Self {
            table: PresenceTable::new(obs_len, config.novelty_boolean),
            queue: VecDeque::new(),
            pivots: PivotList::default(),
            stop_on_first_reward: config.iw1_stop_on_first_reward,
            reward_horizon: config.iw1_reward_horizon,
        }
    }
}

impl Strategy for Iw1Strategy {
    fn name(&self) -> &'static str {
        "iw1"
    }

    fn clear(&mut self) {
        self.table.clear();
        self.queue.clear();
        self.pivots.clear();
    }

    fn on_root_advanced(&mut self) {
        self.table.clear();
    }

    fn begin(&mut self, _tree: &Tree, root: NodeId) {
        self.queue.clear();
        self.pivots.clear();
        self.pivots.push(root);
    }

    fn seed_root(&mut self, obs: &[u8], _accumulated_reward: f32) {
        self.table.update(obs);
    }

    fn admit(&mut self, obs: &[u8], _accumulated_reward: f32) -> bool {
        if self.table.check_novelty(obs) {
            self.table.update(obs);
            true
        } else {
            false
        }
    }

    fn frontier_push(&mut self, _tree: &Tree, id: NodeId) {
        self.queue.push_back((id, self.pivots.current_base));
    }

    fn frontier_pop(&mut self, tree: &Tree) -> Option<NodeId> {
        loop {
            if let Some((id, base)) = self.queue.pop_front() {
                let node = tree.get(id);
                if self.pivots.past_horizon(node.depth, base, self.reward_horizon) {
                    continue;
                }
                if self.pivots.defers(self.stop_on_first_reward, node.node_reward) {
                    self.pivots.push(id);
                    continue;
                }
                self.pivots.current_base = base;
                return Some(id);
            }
            return self.pivots.pop(tree);
        }
    }

    fn frontier_is_empty(&self) -> bool {
        self.queue.is_empty() && self.pivots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;

    fn test_config() -> SearchConfig {
        SearchConfig::for_testing()
    }

    fn tree_with_root() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        (tree, root)
    }

    fn child(tree: &mut Tree, parent: NodeId, action: u8, obs: Vec<u8>, reward: f32) -> NodeId {
        let parent_node = tree.get(parent).clone();
        if tree.get(parent).children.len() <= action as usize {
            tree.get_mut(parent).children.resize(action as usize + 1, None);
        }
        let node = TreeNode::new_child(
            parent,
            &parent_node,
            action,
            obs.clone(),
            obs,
            reward,
            false,
            1,
            1.0,
        );
        tree.attach_child(parent, action as usize, node)
    }

    #[test]
    fn test_admit_prunes_seen_observations() {
        let config = test_config();
        let mut strategy = Iw1Strategy::new(&config, 1);

        strategy.seed_root(&[0], 0.0);
        assert!(strategy.admit(&[1], 0.0));
        // Same observation again: pruned
        assert!(!strategy.admit(&[1], 0.0));
        // Table reset on root advance revives it
        strategy.on_root_advanced();
        assert!(strategy.admit(&[1], 0.0));
    }

    #[test]
    fn test_root_is_first_pivot() {
        let config = test_config();
        let mut strategy = Iw1Strategy::new(&config, 1);
        let (tree, root) = tree_with_root();

        strategy.begin(&tree, root);
        assert_eq!(strategy.frontier_pop(&tree), Some(root));
        assert_eq!(strategy.frontier_pop(&tree), None);
    }

    #[test]
    fn test_rewarding_nodes_defer_to_pivots() {
        let config = test_config();
        let mut strategy = Iw1Strategy::new(&config, 1);
        let (mut tree, root) = tree_with_root();
        let plain = child(&mut tree, root, 0, vec![1], 0.0);
        let rewarding = child(&mut tree, root, 1, vec![2], 1.0);

        strategy.begin(&tree, root);
        assert_eq!(strategy.frontier_pop(&tree), Some(root));
        strategy.frontier_push(&tree, plain);
        strategy.frontier_push(&tree, rewarding);

        // The rewarding node is passed over in favor of the plain one...
        assert_eq!(strategy.frontier_pop(&tree), Some(plain));
        // ...and comes back as a pivot once the queue drains.
        assert_eq!(strategy.frontier_pop(&tree), Some(rewarding));
        assert_eq!(strategy.frontier_pop(&tree), None);
    }

    #[test]
    fn test_reward_horizon_is_pivot_relative() {
        let mut config = test_config();
        config.iw1_reward_horizon = 2;
        let mut strategy = Iw1Strategy::new(&config, 1);
        let (mut tree, root) = tree_with_root();
        let depth1 = child(&mut tree, root, 0, vec![1], 0.0);
        let depth2 = child(&mut tree, depth1, 0, vec![2], 0.0);

        strategy.begin(&tree, root);
        assert_eq!(strategy.frontier_pop(&tree), Some(root));
        strategy.frontier_push(&tree, depth1);
        assert_eq!(strategy.frontier_pop(&tree), Some(depth1));
        strategy.frontier_push(&tree, depth2);

        // depth 2 is past the horizon measured from the root pivot
        assert_eq!(strategy.frontier_pop(&tree), None);
    }
}
