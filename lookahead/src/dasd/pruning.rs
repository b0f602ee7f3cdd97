//! Hard pruning of dominated action sequences.
//!
//! A sequence is "used" if it was witnessed producing a state no
//! earlier-indexed sequence produced from the same node anywhere in the
//! tree. When action permutation is enabled and the vertex cover of the
//! dominance graph is strictly smaller than the used set, the cover
//! replaces it and the permutation re-sorts so kept actions come first.

use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::config::SearchConfig;
use crate::dasd::{
    accumulate_dominance, for_each_sequence_list, DasdCore, DominatedSequenceLearner,
};
use crate::node::NodeId;
use crate::sequence::{num_sequences, seq_to_index, ActionPermutation};
use crate::tree::Tree;
use crate::vertex_cover::VertexCover;

#[derive(Debug)]
pub struct DominatedSequencePruning {
    core: DasdCore,
    /// Per length: which canonical sequence indices are worth simulating
    used: Vec<Vec<bool>>,
    learned: bool,
}

impl DominatedSequencePruning {
    pub fn new(config: &SearchConfig, num_actions: usize) -> Self {
        let core = DasdCore::new(config, num_actions);
        let used = (1..=core.seq_len)
            .map(|len| vec![false; num_sequences(num_actions, len)])
            .collect();
        Self {
            core,
            used,
            learned: false,
        }
    }

    /// Mark sequences whose result matches no earlier-indexed sequence.
    fn mark_used(
        tree: &Tree,
        list: &[Option<NodeId>],
        permutation: &ActionPermutation,
        seq_len: usize,
        used: &mut [bool],
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
            if !is_duplicate {
                used[permutation.to_original(i, seq_len)] = true;
            }
        }
    }

    /// Replace the used set with the vertex cover when strictly smaller,
    /// and re-sort the permutation so kept actions come first.
    fn shrink_to_cover(&mut self) {
        let minset = self.core.graphs[0].minimal_cover();
        let cover_size = minset.iter().filter(|&&b| b).count();
        let used_size = self.used[0].iter().filter(|&&b| b).count();
        if cover_size >= used_size {
            return;
        }
        debug!(cover_size, used_size, "vertex cover beats the used set");
        self.used[0] = minset;

        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for position in 0..self.core.num_actions {
            let action = self.core.permutation.get(position);
            if self.used[0][action as usize] {
                kept.push(action);
            } else {
                dropped.push(action);
            }
        }
        kept.extend(dropped);
        self.core.permutation.reorder(kept);
    }

    fn log_patterns(&self) {
        for (len_index, used) in self.used.iter().enumerate() {
            let pattern: String = used.iter().map(|&u| if u { 'o' } else { 'x' }).collect();
            debug!(length = len_index + 1, %pattern, "non-dominated action sequences");
        }
    }
}

impl DominatedSequenceLearner for DominatedSequencePruning {
    fn learn(&mut self, tree: &Tree, rng: &mut ChaCha20Rng) {
        self.core.ensure_init(rng);
        self.core.begin_learn();

        for len in 1..=self.core.seq_len {
            let permutation = self.core.permutation.clone();
            let mut used = std::mem::take(&mut self.used[len - 1]);
            let mut graph = VertexCover::new(num_sequences(self.core.num_actions, len));
            for_each_sequence_list(
                tree,
                len,
                self.core.num_actions,
                &permutation,
                &mut |tree, list| {
                    Self::mark_used(tree, list, &permutation, len, &mut used);
                    accumulate_dominance(tree, list, &permutation, len, &mut graph);
                },
            );
            self.used[len - 1] = used;
            self.core.graphs[len - 1] = graph;
        }

        if self.core.permutate {
            self.shrink_to_cover();
        }
        self.learned = true;
        self.log_patterns();
    }

    fn effective_actions(
        &mut self,
        previous: &[u8],
        current_frame: u32,
        _rng: &mut ChaCha20Rng,
    ) -> Vec<bool> {
        let n = self.core.num_actions;
        if current_frame < self.core.junk_decision_frame || !self.learned {
            return vec![true; n];
        }

        let mut available = self.used[0].clone();

        // Longer junk: a length-l sequence ending in action a that was never
        // used vetoes a even if a alone is useful.
        let max_len = (previous.len() + 1).min(self.core.seq_len);
        for len in 2..=max_len {
            let suffix = &previous[previous.len() - (len - 1)..];
            for action in 0..n as u8 {
                let mut seq = suffix.to_vec();
                seq.push(action);
                let index = seq_to_index(&seq, n);
                if !self.used[len - 1][index] {
                    available[action as usize] = false;
                }
            }
        }

        available
    }

    fn detected_used_actions(&self) -> usize {
        let n = self.used[0].iter().filter(|&&u| u).count();
        debug!(detected_used_actions = n, "dominated sequence pruning");
        n
    }
}
