//! Dominated action sequence detection.
//!
//! Across planning iterations, some actions (or longer action sequences)
//! only ever reproduce states that other actions reach from the same node.
//! These are junk: simulating them spends budget on nothing new. The
//! learners here walk the finished tree once per decision frame, record
//! which sequences produced unique outcomes, build a dominance graph over
//! outcome-equivalent sequences, and hand the expansion loop a keep-mask for
//! the next frame.
//!
//! Two consumption policies exist: hard pruning (`pruning`), which excludes
//! dominated sequences outright, and probabilistic avoidance (`avoidance`),
//! which tolerates transient misclassification by keeping dominated actions
//! with low probability.

use rand_chacha::ChaCha20Rng;

use crate::config::{DasdMode, SearchConfig};
use crate::node::NodeId;
use crate::sequence::{index_to_seq, num_sequences, ActionPermutation};
use crate::tree::Tree;
use crate::vertex_cover::VertexCover;

mod avoidance;
mod pruning;

pub use avoidance::DominatedSequenceAvoidance;
pub use pruning::DominatedSequencePruning;

/// Learner interface consumed by the search tree.
pub trait DominatedSequenceLearner: std::fmt::Debug {
    /// Walk the already-built tree and refresh dominance knowledge.
    /// Runs once per decision frame, after action selection.
    fn learn(&mut self, tree: &Tree, rng: &mut ChaCha20Rng);

    /// Keep-mask over actions, given the most recent executed/ancestor
    /// action suffix. All-true during the grace period.
    fn effective_actions(
        &mut self,
        previous: &[u8],
        current_frame: u32,
        rng: &mut ChaCha20Rng,
    ) -> Vec<bool>;

    /// Informational count of actions currently considered useful.
    fn detected_used_actions(&self) -> usize;
}

/// Build the learner selected by the configuration.
pub fn make_learner(
    config: &SearchConfig,
    num_actions: usize,
) -> Box<dyn DominatedSequenceLearner> {
    match config.dasd_mode {
        DasdMode::Pruning => Box::new(DominatedSequencePruning::new(config, num_actions)),
        DasdMode::Avoidance => Box::new(DominatedSequenceAvoidance::new(config, num_actions)),
    }
}

/// State shared by both learners: the action permutation and the per-length
/// dominance graphs rebuilt on every learn pass.
#[derive(Debug)]
pub(crate) struct DasdCore {
    pub num_actions: usize,
    pub seq_len: usize,
    pub junk_decision_frame: u32,
    permutate: bool,
    pub permutation: ActionPermutation,
    permutation_ready: bool,
    pub graphs: Vec<VertexCover>,
}

impl DasdCore {
    pub fn new(config: &SearchConfig, num_actions: usize) -> Self {
        Self {
            num_actions,
            seq_len: config.dasd_sequence_length,
            junk_decision_frame: config.junk_decision_frame,
            permutate: config.permutate_action,
            permutation: ActionPermutation::identity(num_actions),
            permutation_ready: false,
            graphs: Vec::new(),
        }
    }

    /// Shuffle the permutation once, lazily, if configured.
    pub fn ensure_init(&mut self, rng: &mut ChaCha20Rng) {
        if !self.permutation_ready {
            if self.permutate {
                self.permutation = ActionPermutation::shuffled(self.num_actions, rng);
            }
            self.permutation_ready = true;
        }
    }

    /// Fresh dominance graphs for a new learn pass.
    pub fn begin_learn(&mut self) {
        self.graphs = (1..=self.seq_len)
            .map(|len| VertexCover::new(num_sequences(self.num_actions, len)))
            .collect();
    }
}

/// Visit every tree node and hand the callback the node reached by each
/// permuted action sequence of the given length (`None` where the subtree
/// is not expanded that far).
pub(crate) fn for_each_sequence_list(
    tree: &Tree,
    seq_len: usize,
    num_actions: usize,
    permutation: &ActionPermutation,
    visit: &mut dyn FnMut(&Tree, &[Option<NodeId>]),
) {
    if !tree.has_root() {
        return;
    }
    let size = num_sequences(num_actions, seq_len);
    let mut stack = vec![tree.root()];
    let mut list = vec![None; size];
    while let Some(id) = stack.pop() {
        for (index, slot) in list.iter_mut().enumerate() {
            let mut seq = index_to_seq(index, seq_len, num_actions);
            permutation.apply(&mut seq);
            *slot = tree.resulting_node(id, &seq);
        }
        visit(tree, &list);
        stack.extend(tree.get(id).children.iter().flatten().copied());
    }
}

/// Fold one node's sequence list into the dominance graph: an edge joins
/// two sequences whose resulting states are equal; a sequence that matched
/// nothing is marked unique. Terminal results are skipped on both sides.
pub(crate) fn accumulate_dominance(
    tree: &Tree,
    list: &[Option<NodeId>],
    permutation: &ActionPermutation,
    seq_len: usize,
    graph: &mut VertexCover,
) {
    for (i, entry) in list.iter().enumerate() {
        let Some(node_i) = *entry else { continue };
        if tree.get(node_i).is_terminal {
            continue;
        }
        let i_orig = permutation.to_original(i, seq_len);

        let mut is_duplicate = false;
        for (j, other) in list.iter().enumerate() {
            if i == j {
                continue;
            }
            let Some(node_j) = *other else { continue };
            if tree.get(node_j).is_terminal {
                continue;
            }
            if tree.get(node_i).state == tree.get(node_j).state {
                is_duplicate = true;
                let j_orig = permutation.to_original(j, seq_len);
                graph.add_edge(i_orig, j_orig);
                break;
            }
        }
        if !is_duplicate {
            graph.mark(i_orig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;

    fn add_child(tree: &mut Tree, parent: NodeId, action: u8, state: Vec<u8>) -> NodeId {
        let parent_node = tree.get(parent).clone();
        if tree.get(parent).children.len() <= action as usize {
            tree.get_mut(parent)
                .children
                .resize(action as usize + 1, None);
        }
        let node = TreeNode::new_child(
            parent,
            &parent_node,
            action,
            state.clone(),
            state,
            0.0,
            false,
            1,
            1.0,
        );
        tree.attach_child(parent, action as usize, node)
    }

    #[test]
    fn test_for_each_sequence_list_visits_all_nodes() {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        let a = add_child(&mut tree, root, 0, vec![1]);
        add_child(&mut tree, root, 1, vec![2]);
        add_child(&mut tree, a, 0, vec![3]);

        let permutation = ActionPermutation::identity(2);
        let mut visits = 0;
        for_each_sequence_list(&tree, 1, 2, &permutation, &mut |_, list| {
            visits += 1;
            assert_eq!(list.len(), 2);
        });
        // Root, two children, one grandchild
        assert_eq!(visits, 4);
    }

    #[test]
    fn test_sequence_list_contains_reached_nodes() {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        let a = add_child(&mut tree, root, 0, vec![1]);
        let aa = add_child(&mut tree, a, 0, vec![3]);

        let permutation = ActionPermutation::identity(2);
        let mut root_list = Vec::new();
        let mut first = true;
        for_each_sequence_list(&tree, 2, 2, &permutation, &mut |_, list| {
            if first {
                root_list = list.to_vec();
                first = false;
            }
        });

        // Sequence [0,0] reaches the grandchild; everything else is missing
        assert_eq!(root_list[0], Some(aa));
        assert_eq!(root_list[1], None);
        assert_eq!(root_list[2], None);
        assert_eq!(root_list[3], None);
    }

    #[test]
    fn test_accumulate_dominance_edges_and_marks() {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        // Actions 0 and 1 collide; action 2 is unique
        add_child(&mut tree, root, 0, vec![7]);
        add_child(&mut tree, root, 1, vec![7]);
        add_child(&mut tree, root, 2, vec![9]);

        let permutation = ActionPermutation::identity(3);
        let mut graph = VertexCover::new(3);
        for_each_sequence_list(&tree, 1, 3, &permutation, &mut |tree, list| {
            accumulate_dominance(tree, list, &permutation, 1, &mut graph);
        });

        assert_eq!(graph.unique_set(), vec![false, false, true]);
        let cover = graph.minimal_cover();
        // The colliding pair is covered; the unique action is forced in
        assert!(cover[0] && cover[1] && cover[2]);
    }

    #[test]
    fn test_accumulate_dominance_skips_terminal_candidates() {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        add_child(&mut tree, root, 0, vec![7]);
        let b = add_child(&mut tree, root, 1, vec![7]);
        tree.get_mut(b).is_terminal = true;

        let permutation = ActionPermutation::identity(2);
        let mut graph = VertexCover::new(2);
        for_each_sequence_list(&tree, 1, 2, &permutation, &mut |tree, list| {
            accumulate_dominance(tree, list, &permutation, 1, &mut graph);
        });

        // The terminal sibling does not witness a duplicate: 0 stays unique
        assert_eq!(graph.unique_set(), vec![true, false]);
    }
}
