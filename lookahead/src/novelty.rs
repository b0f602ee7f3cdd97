//! Novelty tables over observation bytes.
//!
//! A presence table answers "has this (position, value) feature been seen in
//! the current planning episode"; the reward table generalizes it to "has
//! this feature been reached with a higher accumulated reward than before",
//! turning binary novelty pruning into reward-guided pruning.
//!
//! Both come in two shapes: byte granularity (position x 256 cells) and
//! boolean granularity (per-bit true/false pair tables), which trades
//! resolution for table size.

/// Presence novelty table.
#[derive(Debug)]
pub enum PresenceTable {
    Byte {
        obs_len: usize,
        seen: Vec<bool>,
    },
    Boolean {
        obs_len: usize,
        seen_true: Vec<bool>,
        seen_false: Vec<bool>,
    },
}

impl PresenceTable {
    pub fn new(obs_len: usize, boolean: bool) -> Self {
        if boolean {
            Self::Boolean {
                obs_len,
                seen_true: vec![false; obs_len * 8],
                seen_false: vec![false; obs_len * 8],
            }
        } else {
            Self::Byte {
                obs_len,
                seen: vec![false; obs_len * 256],
            }
        }
    }

    /// True if the observation carries any feature not yet in the table.
    pub fn check_novelty(&self, obs: &[u8]) -> bool {
        match self {
            Self::Byte { obs_len, seen } => {
                debug_assert_eq!(obs.len(), *obs_len);
                obs.iter()
                    .enumerate()
                    .any(|(i, &byte)| !seen[i * 256 + byte as usize])
            }
            Self::Boolean {
                obs_len,
                seen_true,
                seen_false,
            } => {
                debug_assert_eq!(obs.len(), *obs_len);
                obs.iter().enumerate().any(|(i, &byte)| {
                    (0..8).any(|j| {
                        if byte & (1 << j) != 0 {
                            !seen_true[i * 8 + j]
                        } else {
                            !seen_false[i * 8 + j]
                        }
                    })
                })
            }
        }
    }

    /// Mark every feature of the observation as seen. Idempotent.
    pub fn update(&mut self, obs: &[u8]) {
        match self {
            Self::Byte { seen, .. } => {
                for (i, &byte) in obs.iter().enumerate() {
                    seen[i * 256 + byte as usize] = true;
                }
            }
            Self::Boolean {
                seen_true,
                seen_false,
                ..
            } => {
                for (i, &byte) in obs.iter().enumerate() {
                    for j in 0..8 {
                        if byte & (1 << j) != 0 {
                            seen_true[i * 8 + j] = true;
                        } else {
                            seen_false[i * 8 + j] = true;
                        }
                    }
                }
            }
        }
    }

    /// Forget everything (root moved discontinuously or episode ended).
    pub fn clear(&mut self) {
        match self {
            Self::Byte { seen, .. } => seen.fill(false),
            Self::Boolean {
                seen_true,
                seen_false,
                ..
            } => {
                seen_true.fill(false);
                seen_false.fill(false);
            }
        }
    }
}

/// Reward-ceiling novelty table: stores the best accumulated reward each
/// feature has been reached with.
#[derive(Debug)]
pub enum RewardTable {
    Byte {
        obs_len: usize,
        best: Vec<f32>,
    },
    Boolean {
        obs_len: usize,
        best_true: Vec<f32>,
        best_false: Vec<f32>,
    },
}

impl RewardTable {
    pub fn new(obs_len: usize, boolean: bool) -> Self {
        if boolean {
            Self::Boolean {
                obs_len,
                best_true: vec![f32::NEG_INFINITY; obs_len * 8],
                best_false: vec![f32::NEG_INFINITY; obs_len * 8],
            }
        } else {
            Self::Byte {
                obs_len,
                best: vec![f32::NEG_INFINITY; obs_len * 256],
            }
        }
    }

    /// True if any feature can be reached with a strictly higher accumulated
    /// reward than the stored ceiling.
    pub fn check_novelty(&self, obs: &[u8], accumulated_reward: f32) -> bool {
        match self {
            Self::Byte { obs_len, best } => {
                debug_assert_eq!(obs.len(), *obs_len);
                obs.iter()
                    .enumerate()
                    .any(|(i, &byte)| accumulated_reward > best[i * 256 + byte as usize])
            }
            Self::Boolean {
                obs_len,
                best_true,
                best_false,
            } => {
                debug_assert_eq!(obs.len(), *obs_len);
                obs.iter().enumerate().any(|(i, &byte)| {
                    (0..8).any(|j| {
                        if byte & (1 << j) != 0 {
                            accumulated_reward > best_true[i * 8 + j]
                        } else {
                            accumulated_reward > best_false[i * 8 + j]
                        }
                    })
                })
            }
        }
    }

    /// Count of features that would be novel at this reward level.
    pub fn novel_count(&self, obs: &[u8], accumulated_reward: f32) -> u32 {
        match self {
            Self::Byte { best, .. } => obs
                .iter()
                .enumerate()
                .filter(|&(i, &byte)| accumulated_reward > best[i * 256 + byte as usize])
                .count() as u32,
            Self::Boolean {
                best_true,
                best_false,
                ..
            } => obs
                .iter()
                .enumerate()
                .map(|(i, &byte)| {
                    (0..8)
                        .filter(|&j| {
                            if byte & (1 << j) != 0 {
                                accumulated_reward > best_true[i * 8 + j]
                            } else {
                                accumulated_reward > best_false[i * 8 + j]
                            }
                        })
                        .count() as u32
                })
                .sum(),
        }
    }

    /// Raise the stored ceilings to `accumulated_reward` where it is higher.
    pub fn update(&mut self, obs: &[u8], accumulated_reward: f32) {
        match self {
            Self::Byte { best, .. } => {
                for (i, &byte) in obs.iter().enumerate() {
                    let cell = &mut best[i * 256 + byte as usize];
                    if accumulated_reward > *cell {
                        *cell = accumulated_reward;
                    }
                }
            }
            Self::Boolean {
                best_true,
                best_false,
                ..
            } => {
                for (i, &byte) in obs.iter().enumerate() {
                    for j in 0..8 {
                        let cell = if byte & (1 << j) != 0 {
                            &mut best_true[i * 8 + j]
                        } else {
                            &mut best_false[i * 8 + j]
                        };
                        if accumulated_reward > *cell {
                            *cell = accumulated_reward;
                        }
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        match self {
            Self::Byte { best, .. } => best.fill(f32::NEG_INFINITY),
            Self::Boolean {
                best_true,
                best_false,
                ..
            } => {
                best_true.fill(f32::NEG_INFINITY);
                best_false.fill(f32::NEG_INFINITY);
            }
        }
    }
}
