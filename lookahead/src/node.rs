//! Search tree node representation.
//!
//! Each node represents one simulated state transition: the snapshot reached
//! by holding an action for `sim_steps_per_node` primitive steps from the
//! parent. Nodes live in an arena (`tree::Tree`) and reference each other by
//! `NodeId` index.

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action held to reach this node from the parent
    pub action: u8,

    /// State snapshot after the transition
    pub state: Vec<u8>,

    /// Observation after the transition (novelty features)
    pub obs: Vec<u8>,

    /// Immediate reward of the transition
    pub node_reward: f32,

    /// Immediate reward scaled by the compounded path discount
    pub discounted_node_reward: f32,

    /// Sum of node rewards from the root
    pub accumulated_reward: f32,

    /// Sum of discounted node rewards from the root
    pub discounted_accumulated_reward: f32,

    /// Compounded discount along the path (root = 1.0)
    pub discount: f32,

    /// Per-edge discount factor this node was created with
    pub edge_discount: f32,

    /// Distance from the root
    pub depth: u32,

    /// Backpropagated max-discounted-return estimate for this subtree
    pub branch_return: f32,

    /// Deepest descendant depth in this subtree
    pub branch_depth: u32,

    /// Child index selected by the last backup pass
    pub best_branch: Option<usize>,

    /// Terminal transition, or pruned (see `pruned_by_novelty`)
    pub is_terminal: bool,

    /// Marked terminal by a failed novelty check or as a dominated-action
    /// placeholder; such nodes may be re-activated after a table reset.
    pub pruned_by_novelty: bool,

    /// Resulting state equals an earlier sibling's
    pub duplicate: bool,

    /// Whether the transition has actually been simulated
    pub initialized: bool,

    /// Count of novel features at admission time (p-IW priority key)
    pub novelty: u32,

    /// Primitive steps the gateway executed for this node
    pub num_simulated_steps: u32,

    /// Cached subtree size, used for the per-frame reuse budget check
    pub num_nodes_reusable: u32,

    /// Children, index-aligned with `available_actions`. `None` slots are
    /// unexpanded placeholders.
    pub children: Vec<Option<NodeId>>,

    /// Action order captured when this node was expanded
    pub available_actions: Vec<u8>,
}

impl TreeNode {
    /// Create an unsimulated root node holding the given snapshot.
    pub fn new_root(state: Vec<u8>, obs: Vec<u8>) -> Self {
        Self {
            parent: NodeId::NONE,
            action: 0,
            state,
            obs,
            node_reward: 0.0,
            discounted_node_reward: 0.0,
            accumulated_reward: 0.0,
            discounted_accumulated_reward: 0.0,
            discount: 1.0,
            edge_discount: 1.0,
            depth: 0,
            branch_return: 0.0,
            branch_depth: 0,
            best_branch: None,
            is_terminal: false,
            pruned_by_novelty: false,
            duplicate: false,
            initialized: false,
            novelty: 0,
            num_simulated_steps: 0,
            num_nodes_reusable: 0,
            children: Vec::new(),
            available_actions: Vec::new(),
        }
    }

    /// Create a simulated child of `parent`.
    ///
    /// `state`/`obs` are the gateway's resulting snapshot; reward, depth and
    /// discount bookkeeping is derived from the parent's values.
    #[allow(clippy::too_many_arguments)]
    pub fn new_child(
        parent_id: NodeId,
        parent: &TreeNode,
        action: u8,
        state: Vec<u8>,
        obs: Vec<u8>,
        node_reward: f32,
        is_terminal: bool,
        num_simulated_steps: u32,
        edge_discount: f32,
    ) -> Self {
        let discount = parent.discount * edge_discount;
        let discounted_node_reward = node_reward * discount;
        let depth = parent.depth + 1;
        Self {
            parent: parent_id,
            action,
            state,
            obs,
            node_reward,
            discounted_node_reward,
            accumulated_reward: parent.accumulated_reward + node_reward,
            discounted_accumulated_reward: parent.discounted_accumulated_reward
                + discounted_node_reward,
            discount,
            edge_discount,
            depth,
            branch_return: node_reward,
            branch_depth: depth,
            best_branch: None,
            is_terminal,
            pruned_by_novelty: false,
            duplicate: false,
            initialized: true,
            novelty: 0,
            num_simulated_steps,
            num_nodes_reusable: 0,
            children: Vec::new(),
            available_actions: Vec::new(),
        }
    }

    /// Whether this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the node's transition has been simulated.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the node was flagged as a sibling duplicate.
    #[inline]
    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }

    /// Recompute depth, discount and accumulated values from the parent's.
    ///
    /// Used when a node is reused across decision frames after the root has
    /// moved. Roots pass `None`.
    pub fn refresh_from_parent(&mut self, parent: Option<(&TreeNode, NodeId)>) {
        match parent {
            None => {
                self.parent = NodeId::NONE;
                self.depth = 0;
                self.discount = 1.0;
                self.discounted_node_reward = self.node_reward * self.discount;
                self.accumulated_reward = self.node_reward;
                self.discounted_accumulated_reward = self.discounted_node_reward;
            }
            Some((parent, parent_id)) => {
                self.parent = parent_id;
                self.depth = parent.depth + 1;
                self.discount = parent.discount * self.edge_discount;
                self.discounted_node_reward = self.node_reward * self.discount;
                self.accumulated_reward = parent.accumulated_reward + self.node_reward;
                self.discounted_accumulated_reward =
                    parent.discounted_accumulated_reward + self.discounted_node_reward;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_new_root() {
        let node = TreeNode::new_root(vec![1, 2], vec![3]);

        assert!(node.parent.is_none());
        assert!(!node.initialized);
        assert_eq!(node.depth, 0);
        assert_eq!(node.discount, 1.0);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_new_child_bookkeeping() {
        let mut root = TreeNode::new_root(vec![0], vec![0]);
        root.accumulated_reward = 2.0;
        root.discounted_accumulated_reward = 2.0;

        let child = TreeNode::new_child(
            NodeId(0),
            &root,
            3,
            vec![1],
            vec![1],
            1.5,
            false,
            5,
            0.9,
        );

        assert_eq!(child.depth, 1);
        assert!((child.discount - 0.9).abs() < 1e-6);
        assert!((child.accumulated_reward - 3.5).abs() < 1e-6);
        assert!((child.discounted_node_reward - 1.35).abs() < 1e-6);
        assert!((child.branch_return - 1.5).abs() < 1e-6);
        assert!(child.initialized);
    }

    #[test]
    fn test_refresh_from_parent_as_root() {
        let root = TreeNode::new_root(vec![0], vec![0]);
        let mut child = TreeNode::new_child(
            NodeId(0),
            &root,
            1,
            vec![1],
            vec![1],
            2.0,
            false,
            5,
            0.5,
        );

        child.refresh_from_parent(None);

        assert_eq!(child.depth, 0);
        assert_eq!(child.discount, 1.0);
        assert!((child.accumulated_reward - 2.0).abs() < 1e-6);
        assert!(child.parent.is_none());
    }

    #[test]
    fn test_refresh_from_parent_recomputes_chain_values() {
        let mut root = TreeNode::new_root(vec![0], vec![0]);
        root.accumulated_reward = 1.0;
        root.discounted_accumulated_reward = 1.0;

        let mut child = TreeNode::new_child(
            NodeId(0),
            &root,
            1,
            vec![1],
            vec![1],
            2.0,
            false,
            5,
            0.5,
        );

        // Parent values change (e.g. after a root move); refresh follows them.
        root.accumulated_reward = 0.0;
        root.discounted_accumulated_reward = 0.0;
        root.depth = 0;
        root.discount = 1.0;

        child.refresh_from_parent(Some((&root, NodeId(0))));

        assert_eq!(child.depth, 1);
        assert!((child.accumulated_reward - 2.0).abs() < 1e-6);
        assert!((child.discount - 0.5).abs() < 1e-6);
    }
}
