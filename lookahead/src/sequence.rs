//! Action-sequence indexing and the action permutation bijection.
//!
//! Sequences of length L over an action set of size N are addressed by their
//! base-N integer encoding. When action permutation is enabled, the
//! permutation is carried as an explicit bijection object and every piece of
//! indexing math translates through it, so statistics stay keyed by the
//! canonical action enumeration.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// Number of distinct action sequences of the given length.
pub fn num_sequences(num_actions: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    num_actions.pow(len as u32)
}

/// Base-N encoding of a sequence, most significant action first.
pub fn seq_to_index(sequence: &[u8], num_actions: usize) -> usize {
    sequence
        .iter()
        .fold(0, |acc, &a| acc * num_actions + a as usize)
}

/// Inverse of `seq_to_index` for sequences of a known length.
pub fn index_to_seq(index: usize, len: usize, num_actions: usize) -> Vec<u8> {
    let mut sequence = vec![0u8; len];
    let mut rest = index;
    for slot in sequence.iter_mut().rev() {
        *slot = (rest % num_actions) as u8;
        rest /= num_actions;
    }
    sequence
}

/// Explicit bijection over the action set.
///
/// `get(i)` is the actual action placed at position `i` of the reordered
/// enumeration. Identity until a shuffle or a learned re-sort replaces it.
#[derive(Debug, Clone)]
pub struct ActionPermutation {
    map: Vec<u8>,
}

impl ActionPermutation {
    pub fn identity(num_actions: usize) -> Self {
        Self {
            map: (0..num_actions as u8).collect(),
        }
    }

    pub fn shuffled(num_actions: usize, rng: &mut ChaCha20Rng) -> Self {
        let mut map: Vec<u8> = (0..num_actions as u8).collect();
        map.shuffle(rng);
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn get(&self, position: usize) -> u8 {
        self.map[position]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    /// Replace the ordering. The new order must be a permutation of the
    /// action set.
    pub fn reorder(&mut self, order: Vec<u8>) {
        assert_eq!(order.len(), self.map.len(), "permutation size changed");
        debug_assert!({
            let mut sorted = order.clone();
            sorted.sort_unstable();
            sorted.iter().enumerate().all(|(i, &a)| a as usize == i)
        });
        self.map = order;
    }

    /// Map a position-indexed sequence to actual actions, in place.
    pub fn apply(&self, sequence: &mut [u8]) {
        for slot in sequence.iter_mut() {
            *slot = self.map[*slot as usize];
        }
    }

    /// Translate a sequence index expressed in permuted positions back to
    /// the canonical (unpermuted) sequence index.
    pub fn to_original(&self, index: usize, len: usize) -> usize {
        let num_actions = self.map.len();
        let mut sequence = index_to_seq(index, len, num_actions);
        for slot in sequence.iter_mut() {
            // Position whose permuted action equals this one
            let position = self
                .map
                .iter()
                .position(|&a| a == *slot)
                .expect("action missing from permutation");
            *slot = position as u8;
        }
        seq_to_index(&sequence, num_actions)
    }
}
