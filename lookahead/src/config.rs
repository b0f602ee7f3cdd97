//! Search configuration parameters.

use std::str::FromStr;

use crate::error::SearchError;

/// Which search strategy drives the expansion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// Plain breadth-first lookahead, no novelty pruning
    BreadthFirst,
    /// Novelty-pruned breadth-first search (IW(1))
    Iw1,
    /// Reward-aware novelty search with a priority frontier (p-IW(1))
    Piw1,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::BreadthFirst => "brfs",
            SearchMethod::Iw1 => "iw1",
            SearchMethod::Piw1 => "piw1",
        }
    }
}

impl FromStr for SearchMethod {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brfs" => Ok(SearchMethod::BreadthFirst),
            "iw1" => Ok(SearchMethod::Iw1),
            "piw1" => Ok(SearchMethod::Piw1),
            other => Err(SearchError::UnknownSearchMethod(other.to_string())),
        }
    }
}

/// Frontier ordering for the p-IW(1) strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piw1Priority {
    /// Order by accumulated reward, then by fewer novel features
    Reward,
    /// Order by count of novel features, then by accumulated reward
    Novelty,
}

impl FromStr for Piw1Priority {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reward" => Ok(Piw1Priority::Reward),
            "novelty" => Ok(Piw1Priority::Novelty),
            other => Err(SearchError::UnknownPriority(other.to_string())),
        }
    }
}

/// How learned junk action sequences are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DasdMode {
    /// Hard pruning: dominated sequences are excluded deterministically
    Pruning,
    /// Probabilistic avoidance: dominated sequences are kept with low probability
    Avoidance,
}

impl FromStr for DasdMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pruning" => Ok(DasdMode::Pruning),
            "avoidance" => Ok(DasdMode::Avoidance),
            other => Err(SearchError::UnknownDasdMode(other.to_string())),
        }
    }
}

/// Random sampling policy for the avoidance keep-decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DasaSampling {
    /// One independent Bernoulli draw per action
    PerAction,
    /// One uniform draw shared across the whole action set, so the kept set
    /// is consistent at longer lookahead depths
    SharedDraw,
}

impl FromStr for DasaSampling {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_action" => Ok(DasaSampling::PerAction),
            "shared_draw" => Ok(DasaSampling::SharedDraw),
            other => Err(SearchError::UnknownSampling(other.to_string())),
        }
    }
}

/// Configuration for a lookahead search tree.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search strategy to run.
    pub method: SearchMethod,

    /// Primitive simulator steps executed per tree node.
    pub sim_steps_per_node: u32,

    /// Simulation-step budget per decision frame. Expansion stops at the
    /// first check point after the budget is exhausted.
    pub max_sim_steps_per_frame: u32,

    /// Per-node discount applied to future rewards. Compounds once per
    /// node super-step, not per primitive step.
    pub discount_factor: f32,

    /// Normalize rewards by the magnitude of the first non-zero reward seen.
    pub normalize_rewards: bool,

    /// Skip sibling-duplicate states during expansion and backup.
    pub ignore_duplicate_nodes: bool,

    /// Normalize branch returns by depth when picking the best action, so
    /// deeper branches gain no advantage from length alone.
    pub depth_normalized_reward: bool,

    /// Shuffle the action order once per expanded node.
    pub randomize_successors: bool,

    /// Use per-bit boolean novelty tables instead of per-byte tables.
    /// Trades resolution for table size.
    pub novelty_boolean: bool,

    /// Detect duplicates by observation equality instead of full state
    /// equality. Children of the root are exempt because a single action
    /// may not change the observation immediately.
    pub obs_duplicates: bool,

    /// IW(1): stop expanding below a rewarding node; it becomes a pivot
    /// expanded after the current frontier drains.
    pub iw1_stop_on_first_reward: bool,

    /// IW(1): maximum pivot-relative depth to expand. 0 means unlimited.
    pub iw1_reward_horizon: u32,

    /// p-IW(1): frontier ordering.
    pub piw1_priority: Piw1Priority,

    /// Master switch for dominated action sequence detection.
    pub action_sequence_detection: bool,

    /// How detected junk sequences are consumed.
    pub dasd_mode: DasdMode,

    /// Longest action-sequence length considered by detection.
    pub dasd_sequence_length: usize,

    /// Grace period: no junk pruning before this environment frame.
    pub junk_decision_frame: u32,

    /// Avoidance: recency discount for per-frame novelty statistics.
    pub asd_discount_factor: f64,

    /// Avoidance: how many past decision frames contribute statistics.
    pub asd_maximum_steps_to_consider: usize,

    /// Avoidance: exploration floor blended into keep-probabilities.
    pub asd_epsilon: f64,

    /// Avoidance: sampling policy for the keep-decision.
    pub asd_sampling: DasaSampling,

    /// Reorder actions so empirically unique ones sort first.
    pub permutate_action: bool,

    /// Seed for the search RNG (tie-breaking, shuffles, avoidance draws).
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            method: SearchMethod::Iw1,
            sim_steps_per_node: 5,
            max_sim_steps_per_frame: 300,
            discount_factor: 0.995,
            normalize_rewards: false,
            ignore_duplicate_nodes: false,
            depth_normalized_reward: false,
            randomize_successors: false,
            novelty_boolean: false,
            obs_duplicates: false,
            iw1_stop_on_first_reward: true,
            iw1_reward_horizon: 0,
            piw1_priority: Piw1Priority::Reward,
            action_sequence_detection: false,
            dasd_mode: DasdMode::Pruning,
            dasd_sequence_length: 2,
            junk_decision_frame: 12,
            asd_discount_factor: 0.95,
            asd_maximum_steps_to_consider: 30,
            asd_epsilon: 0.1,
            asd_sampling: DasaSampling::PerAction,
            permutate_action: false,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// Create a small-budget config for tests.
    pub fn for_testing() -> Self {
        Self {
            sim_steps_per_node: 1,
            max_sim_steps_per_frame: 100,
            discount_factor: 0.9,
            ignore_duplicate_nodes: true,
            ..Self::default()
        }
    }

    /// Builder pattern: set the search method.
    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.method = method;
        self
    }

    /// Builder pattern: set the per-frame simulation budget.
    pub fn with_budget(mut self, max_sim_steps_per_frame: u32) -> Self {
        self.max_sim_steps_per_frame = max_sim_steps_per_frame;
        self
    }

    /// Builder pattern: set the discount factor.
    pub fn with_discount(mut self, discount_factor: f32) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    /// Builder pattern: set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: enable dominated action sequence detection.
    pub fn with_dasd(mut self, mode: DasdMode, sequence_length: usize) -> Self {
        self.action_sequence_detection = true;
        self.dasd_mode = mode;
        self.dasd_sequence_length = sequence_length;
        self
    }

    /// Check invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.sim_steps_per_node == 0 {
            return Err(SearchError::InvalidConfig(
                "sim_steps_per_node must be positive".into(),
            ));
        }
        if self.max_sim_steps_per_frame == 0 {
            return Err(SearchError::InvalidConfig(
                "max_sim_steps_per_frame must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(SearchError::InvalidConfig(format!(
                "discount_factor {} out of [0, 1]",
                self.discount_factor
            )));
        }
        if self.dasd_sequence_length == 0 {
            return Err(SearchError::InvalidConfig(
                "dasd_sequence_length must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.asd_epsilon) {
            return Err(SearchError::InvalidConfig(format!(
                "asd_epsilon {} out of [0, 1]",
                self.asd_epsilon
            )));
        }
        if !(0.0..=1.0).contains(&self.asd_discount_factor) {
            return Err(SearchError::InvalidConfig(format!(
                "asd_discount_factor {} out of [0, 1]",
                self.asd_discount_factor
            )));
        }
        Ok(())
    }
}
