//! Probabilistic avoidance of dominated action sequences.
//!
//! Instead of a hard mask, each action keeps a recency-discounted estimate
//! of how often it produced a novel (non-duplicate) state. The estimate is
//! squashed through a logistic function, multiplied over the sequence
//! positions, blended with an exploration floor and used as a Bernoulli
//! keep-probability, so an action misclassified as junk for a frame or two
//! still gets occasional chances to prove itself.

use std::collections::VecDeque;

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Bernoulli, Distribution};
use tracing::debug;

use crate::config::{DasaSampling, SearchConfig};
use crate::dasd::{
    accumulate_dominance, for_each_sequence_list, DasdCore, DominatedSequenceLearner,
};
use crate::node::NodeId;
use crate::sequence::{num_sequences, seq_to_index, ActionPermutation};
use crate::tree::Tree;
use crate::vertex_cover::VertexCover;

/// Logistic gain applied to the centered novelty ratio: ratio 0.5 maps to
/// the 50% point and the slope is steep enough that 0.3/0.7 are decisive.
const RATIO_GAIN: f64 = 5.0;

/// Missing-data sentinel: no frame recorded this sequence.
const NO_DATA: f64 = -1.0;

/// Out-of-history sentinel: asked further back than we remember.
const NO_HISTORY: f64 = 2.0;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug)]
pub struct DominatedSequenceAvoidance {
    core: DasdCore,
    discount: f64,
    epsilon: f64,
    max_steps: usize,
    sampling: DasaSampling,
    /// Per length: per remembered frame, per canonical sequence index
    novel_counts: Vec<VecDeque<Vec<u32>>>,
    duplicate_counts: Vec<VecDeque<Vec<u32>>>,
    /// Per length: discounted running novelty estimate per sequence
    ratio_of_novelty: Vec<Vec<f64>>,
}

impl DominatedSequenceAvoidance {
    pub fn new(config: &SearchConfig, num_actions: usize) -> Self {
        let core = DasdCore::new(config, num_actions);
        let lengths = core.seq_len;
        Self {
            core,
            discount: config.asd_discount_factor,
            epsilon: config.asd_epsilon,
            max_steps: config.asd_maximum_steps_to_consider,
            sampling: config.asd_sampling,
            novel_counts: vec![VecDeque::new(); lengths],
            duplicate_counts: vec![VecDeque::new(); lengths],
            ratio_of_novelty: vec![Vec::new(); lengths],
        }
    }

    /// Count novel/duplicate outcomes for one node's sequence list into the
    /// current frame's slot.
    fn count_outcomes(
        tree: &Tree,
        list: &[Option<NodeId>],
        permutation: &ActionPermutation,
        seq_len: usize,
        novel: &mut [u32],
        duplicate: &mut [u32],
    ) {
        for (i, entry) in list.iter().enumerate() {
            let Some(node_i) = *entry else { continue };
            if tree.get(node_i).is_terminal {
                continue;
            }

            let mut is_duplicate = false;
            for other in list.iter().take(i) {
                let Some(node_j) = *other else { continue };
                if tree.get(node_j).is_terminal {
                    continue;
                }
                if tree.get(node_i).state == tree.get(node_j).state {
                    is_duplicate = true;
                    break;
                }
            }

            let index = permutation.to_original(i, seq_len);
            if is_duplicate {
                duplicate[index] += 1;
            } else {
                novel[index] += 1;
            }
        }
    }

    /// Fraction of novel outcomes for `sequence`, `steps_back` frames ago.
    /// `NO_DATA` when the frame recorded nothing for it, `NO_HISTORY` when
    /// the history is shorter than `steps_back`.
    fn novel_ratio(&self, steps_back: usize, sequence: usize, seq_len: usize) -> f64 {
        let novel = &self.novel_counts[seq_len - 1];
        let duplicate = &self.duplicate_counts[seq_len - 1];
        if steps_back > novel.len() || steps_back > duplicate.len() {
            return NO_HISTORY;
        }
        let n = novel[novel.len() - steps_back][sequence];
        let d = duplicate[duplicate.len() - steps_back][sequence];
        if n + d == 0 {
            return NO_DATA;
        }
        f64::from(n) / f64::from(n + d)
    }

    /// Exponentially discounted novelty average over the remembered frames.
    /// Frames without data drop out of the normalizer; with no data at all
    /// the action is assumed maximally novel (1.0) to keep exploring.
    fn calc_qvalue(&self, sequence: usize, seq_len: usize) -> f64 {
        let mut q = 0.0;
        let mut normalizer =
            (1.0 - self.discount.powi(self.max_steps as i32)) / (1.0 - self.discount);

        for i in 0..self.max_steps {
            let ratio = self.novel_ratio(i + 1, sequence, seq_len);
            if (0.0..=1.0).contains(&ratio) {
                q += self.discount.powi(i as i32) * ratio;
            } else {
                normalizer -= self.discount.powi(i as i32);
            }
        }

        if normalizer < 1e-4 {
            return 1.0;
        }
        q / normalizer
    }

    /// Blend the latest frame's ratios into the running estimates.
    fn updated_ratios(&self, seq_len: usize) -> Vec<f64> {
        let size = num_sequences(self.core.num_actions, seq_len);
        let previous = &self.ratio_of_novelty[seq_len - 1];

        (0..size)
            .map(|sequence| {
                let ratio = self.novel_ratio(1, sequence, seq_len);
                if previous.is_empty() {
                    // First planning iteration
                    1.0
                } else if !(0.0..=1.0).contains(&ratio) {
                    // No fresh data for this sequence
                    previous[sequence]
                } else {
                    (previous[sequence] * self.discount + ratio) / (1.0 + self.discount)
                }
            })
            .collect()
    }

    /// Keep-probability of a (suffix, action) sequence: logistic-squashed
    /// prefix novelty estimates multiplied together, with the epsilon floor.
    fn keep_probability(&self, sequence: &[u8]) -> f64 {
        let n = self.core.num_actions;
        let mut p = 1.0;
        for prefix_len in 1..=sequence.len() {
            let table = &self.ratio_of_novelty[prefix_len - 1];
            let ratio = if table.is_empty() {
                1.0
            } else {
                table[seq_to_index(&sequence[..prefix_len], n)]
            };
            p *= sigmoid((ratio - 0.5) * RATIO_GAIN);
        }
        (p * (1.0 - self.epsilon) + self.epsilon).min(1.0)
    }

    /// Re-sort the permutation: unique actions first, then cover members,
    /// then the rest, each group in current permutation order.
    fn sort_by_novelty(&self, marked: &[bool], minset: &[bool]) -> Vec<u8> {
        let mut unique = Vec::new();
        let mut cover = Vec::new();
        let mut rest = Vec::new();
        for position in 0..self.core.num_actions {
            let action = self.core.permutation.get(position);
            if marked[action as usize] {
                unique.push(action);
            } else if minset[action as usize] {
                cover.push(action);
            } else {
                rest.push(action);
            }
        }
        unique.extend(cover);
        unique.extend(rest);
        unique
    }

    fn has_learned(&self) -> bool {
        !self.ratio_of_novelty[0].is_empty()
    }
}

impl DominatedSequenceLearner for DominatedSequenceAvoidance {
    fn learn(&mut self, tree: &Tree, rng: &mut ChaCha20Rng) {
        self.core.ensure_init(rng);
        self.core.begin_learn();

        // Open this frame's counter slot per sequence length
        for len in 1..=self.core.seq_len {
            let size = num_sequences(self.core.num_actions, len);
            self.novel_counts[len - 1].push_back(vec![0; size]);
            self.duplicate_counts[len - 1].push_back(vec![0; size]);
            while self.novel_counts[len - 1].len() > self.max_steps {
                self.novel_counts[len - 1].pop_front();
                self.duplicate_counts[len - 1].pop_front();
            }
        }

        for len in 1..=self.core.seq_len {
            let permutation = self.core.permutation.clone();
            let mut novel = self.novel_counts[len - 1].pop_back().unwrap_or_default();
            let mut duplicate = self.duplicate_counts[len - 1].pop_back().unwrap_or_default();
            let mut graph = VertexCover::new(num_sequences(self.core.num_actions, len));
            for_each_sequence_list(
                tree,
                len,
                self.core.num_actions,
                &permutation,
                &mut |tree, list| {
                    Self::count_outcomes(tree, list, &permutation, len, &mut novel, &mut duplicate);
                    accumulate_dominance(tree, list, &permutation, len, &mut graph);
                },
            );
            self.novel_counts[len - 1].push_back(novel);
            self.duplicate_counts[len - 1].push_back(duplicate);
            self.core.graphs[len - 1] = graph;
        }

        for len in 1..=self.core.seq_len {
            let updated = self.updated_ratios(len);
            self.ratio_of_novelty[len - 1] = updated;
        }

        if self.core.permutate {
            let minset = self.core.graphs[0].minimal_cover();
            let cover_size = minset.iter().filter(|&&b| b).count();
            let presumed_junk = self.ratio_of_novelty[0]
                .iter()
                .filter(|&&r| r < 0.1)
                .count();
            if cover_size < presumed_junk {
                debug!(cover_size, presumed_junk, "re-sorting actions by novelty");
                let marked = self.core.graphs[0].unique_set();
                let order = self.sort_by_novelty(&marked, &minset);
                self.core.permutation.reorder(order);
            }
        }
    }

    fn effective_actions(
        &mut self,
        previous: &[u8],
        current_frame: u32,
        rng: &mut ChaCha20Rng,
    ) -> Vec<bool> {
        let n = self.core.num_actions;
        if current_frame < self.core.junk_decision_frame || !self.has_learned() {
            return vec![true; n];
        }

        let suffix_len = previous.len().min(self.core.seq_len - 1);
        let suffix = &previous[previous.len() - suffix_len..];
        let shared_draw: f64 = rng.gen();

        (0..n as u8)
            .map(|action| {
                let mut sequence = suffix.to_vec();
                sequence.push(action);
                let p = self.keep_probability(&sequence);
                match self.sampling {
                    DasaSampling::PerAction => Bernoulli::new(p).unwrap().sample(rng),
                    DasaSampling::SharedDraw => shared_draw < p,
                }
            })
            .collect()
    }

    fn detected_used_actions(&self) -> usize {
        let n = self.core.num_actions;
        let used = (0..n)
            .filter(|&action| self.calc_qvalue(action, 1) > 0.05)
            .count();

        if self.has_learned() {
            // Expected number of actions surviving the keep-sampling
            let average: f64 = (0..n)
                .map(|action| {
                    let centered = (self.ratio_of_novelty[0][action] - 0.5) * RATIO_GAIN;
                    sigmoid(centered) * (1.0 - self.epsilon) + self.epsilon
                })
                .sum();
            debug!(
                detected_used_actions = used,
                average_actions_per_state = average,
                "dominated sequence avoidance"
            );
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DasdMode;
    use crate::node::TreeNode;
    use rand::SeedableRng;

    fn config(seq_len: usize) -> SearchConfig {
        let mut config = SearchConfig::for_testing().with_dasd(DasdMode::Avoidance, seq_len);
        config.junk_decision_frame = 0;
        config
    }

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

    /// Action 1 always duplicates action 0; action 2 is unique.
    fn collision_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.set_root(TreeNode::new_root(vec![0], vec![0]));
        add_child(&mut tree, root, 0, vec![7]);
        add_child(&mut tree, root, 1, vec![7]);
        add_child(&mut tree, root, 2, vec![9]);
        tree
    }

    #[test]
    fn test_sigmoid_center() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-9);
        assert!(sigmoid(2.5) > 0.9);
        assert!(sigmoid(-2.5) < 0.1);
    }

    #[test]
    fn test_grace_period_keeps_everything() {
        let mut cfg = config(1);
        cfg.junk_decision_frame = 100;
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let tree = collision_tree();
        learner.learn(&tree, &mut rng);

        for _ in 0..20 {
            let mask = learner.effective_actions(&[], 10, &mut rng);
            assert_eq!(mask, vec![true, true, true]);
        }
    }

    #[test]
    fn test_first_learn_assumes_full_novelty() {
        let cfg = config(1);
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        learner.learn(&collision_tree(), &mut rng);

        // First planning iteration: everything rates 1.0
        assert!(learner.ratio_of_novelty[0].iter().all(|&r| r == 1.0));
    }

    #[test]
    fn test_repeated_learning_lowers_junk_ratio() {
        let cfg = config(1);
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let tree = collision_tree();
        for _ in 0..10 {
            learner.learn(&tree, &mut rng);
        }

        let ratios = &learner.ratio_of_novelty[0];
        // Action 1 keeps duplicating action 0's outcome
        assert!(ratios[1] < 0.5);
        // Actions 0 and 2 stay novel
        assert!(ratios[0] > 0.9);
        assert!(ratios[2] > 0.9);
    }

    #[test]
    fn test_junk_action_is_sampled_out_most_of_the_time() {
        let cfg = config(1);
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let tree = collision_tree();
        for _ in 0..20 {
            learner.learn(&tree, &mut rng);
        }

        let mut kept = [0u32; 3];
        for _ in 0..200 {
            let mask = learner.effective_actions(&[], 10, &mut rng);
            for (action, &keep) in mask.iter().enumerate() {
                if keep {
                    kept[action] += 1;
                }
            }
        }

        // Useful actions essentially always survive; the junk action only
        // through the epsilon floor.
        assert!(kept[0] > 170);
        assert!(kept[2] > 170);
        assert!(kept[1] < 100);
        // But the floor keeps it alive occasionally
        assert!(kept[1] > 0);
    }

    #[test]
    fn test_qvalue_defaults_to_exploration_without_data() {
        let cfg = config(1);
        let learner = DominatedSequenceAvoidance::new(&cfg, 3);
        assert_eq!(learner.calc_qvalue(0, 1), 1.0);
    }

    #[test]
    fn test_detected_used_actions_counts_novel_ones() {
        let cfg = config(1);
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let tree = collision_tree();
        for _ in 0..10 {
            learner.learn(&tree, &mut rng);
        }

        // The duplicating action's q-value decays but stays above the 0.05
        // reporting threshold for a while; the unique ones count for sure.
        assert!(learner.detected_used_actions() >= 2);
    }

    #[test]
    fn test_shared_draw_sampling_is_consistent() {
        let mut cfg = config(1);
        cfg.asd_sampling = DasaSampling::SharedDraw;
        let mut learner = DominatedSequenceAvoidance::new(&cfg, 3);
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let tree = collision_tree();
        for _ in 0..20 {
            learner.learn(&tree, &mut rng);
        }

        // With one shared draw, whenever the junk action survives, the
        // higher-probability actions must have survived too.
        for _ in 0..200 {
            let mask = learner.effective_actions(&[], 10, &mut rng);
            if mask[1] {
                assert!(mask[0] && mask[2]);
            }
        }
    }
}
