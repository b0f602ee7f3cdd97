//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from the defaults module
// ============================================================================

fn d_env_id() -> String {
    defaults::env_id().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_search_method() -> String {
    defaults::search_method().into()
}
fn d_sim_steps_per_node() -> i32 {
    defaults::sim_steps_per_node()
}
fn d_max_sim_steps_per_frame() -> i32 {
    defaults::max_sim_steps_per_frame()
}
fn d_discount_factor() -> f64 {
    defaults::discount_factor()
}
fn d_normalize_rewards() -> bool {
    defaults::normalize_rewards()
}
fn d_ignore_duplicate_nodes() -> bool {
    defaults::ignore_duplicate_nodes()
}
fn d_depth_normalized_reward() -> bool {
    defaults::depth_normalized_reward()
}
fn d_randomize_successors() -> bool {
    defaults::randomize_successors()
}
fn d_novelty_boolean() -> bool {
    defaults::novelty_boolean()
}
fn d_obs_duplicates() -> bool {
    defaults::obs_duplicates()
}
fn d_iw1_stop_on_first_reward() -> bool {
    defaults::iw1_stop_on_first_reward()
}
fn d_iw1_reward_horizon() -> i32 {
    defaults::iw1_reward_horizon()
}
fn d_piw1_priority() -> String {
    defaults::piw1_priority().into()
}
fn d_action_sequence_detection() -> bool {
    defaults::action_sequence_detection()
}
fn d_dasd_mode() -> String {
    defaults::dasd_mode().into()
}
fn d_dasd_sequence_length() -> i32 {
    defaults::dasd_sequence_length()
}
fn d_junk_decision_frame() -> i32 {
    defaults::junk_decision_frame()
}
fn d_asd_discount_factor() -> f64 {
    defaults::asd_discount_factor()
}
fn d_asd_maximum_steps_to_consider() -> i32 {
    defaults::asd_maximum_steps_to_consider()
}
fn d_asd_epsilon() -> f64 {
    defaults::asd_epsilon()
}
fn d_asd_sampling() -> String {
    defaults::asd_sampling().into()
}
fn d_permutate_action() -> bool {
    defaults::permutate_action()
}
fn d_seed() -> i64 {
    defaults::seed()
}
fn d_max_episodes() -> i32 {
    defaults::max_episodes()
}
fn d_max_frames_per_episode() -> i32 {
    defaults::max_frames_per_episode()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl CentralConfig {
    /// Replace negative numeric values with their documented defaults.
    /// A `-1` in config.toml (or an env override) means "use the default".
    pub fn sanitize(mut self) -> Self {
        self.search = self.search.sanitize();
        self.runner = self.runner.sanitize();
        self
    }
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_env_id")]
    pub env_id: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            env_id: defaults::env_id().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchSection {
    #[serde(default = "d_search_method")]
    pub search_method: String,
    #[serde(default = "d_sim_steps_per_node")]
    pub sim_steps_per_node: i32,
    #[serde(default = "d_max_sim_steps_per_frame")]
    pub max_sim_steps_per_frame: i32,
    #[serde(default = "d_discount_factor")]
    pub discount_factor: f64,
    #[serde(default = "d_normalize_rewards")]
    pub normalize_rewards: bool,
    #[serde(default = "d_ignore_duplicate_nodes")]
    pub ignore_duplicate_nodes: bool,
    #[serde(default = "d_depth_normalized_reward")]
    pub depth_normalized_reward: bool,
    #[serde(default = "d_randomize_successors")]
    pub randomize_successors: bool,
    #[serde(default = "d_novelty_boolean")]
    pub novelty_boolean: bool,
    #[serde(default = "d_obs_duplicates")]
    pub obs_duplicates: bool,
    #[serde(default = "d_iw1_stop_on_first_reward")]
    pub iw1_stop_on_first_reward: bool,
    #[serde(default = "d_iw1_reward_horizon")]
    pub iw1_reward_horizon: i32,
    #[serde(default = "d_piw1_priority")]
    pub piw1_priority: String,
    #[serde(default = "d_action_sequence_detection")]
    pub action_sequence_detection: bool,
    #[serde(default = "d_dasd_mode")]
    pub dasd_mode: String,
    #[serde(default = "d_dasd_sequence_length")]
    pub dasd_sequence_length: i32,
    #[serde(default = "d_junk_decision_frame")]
    pub junk_decision_frame: i32,
    #[serde(default = "d_asd_discount_factor")]
    pub asd_discount_factor: f64,
    #[serde(default = "d_asd_maximum_steps_to_consider")]
    pub asd_maximum_steps_to_consider: i32,
    #[serde(default = "d_asd_epsilon")]
    pub asd_epsilon: f64,
    #[serde(default = "d_asd_sampling")]
    pub asd_sampling: String,
    #[serde(default = "d_permutate_action")]
    pub permutate_action: bool,
    #[serde(default = "d_seed")]
    pub seed: i64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            search_method: defaults::search_method().into(),
            sim_steps_per_node: defaults::sim_steps_per_node(),
            max_sim_steps_per_frame: defaults::max_sim_steps_per_frame(),
            discount_factor: defaults::discount_factor(),
            normalize_rewards: defaults::normalize_rewards(),
            ignore_duplicate_nodes: defaults::ignore_duplicate_nodes(),
            depth_normalized_reward: defaults::depth_normalized_reward(),
            randomize_successors: defaults::randomize_successors(),
            novelty_boolean: defaults::novelty_boolean(),
            obs_duplicates: defaults::obs_duplicates(),
            iw1_stop_on_first_reward: defaults::iw1_stop_on_first_reward(),
            iw1_reward_horizon: defaults::iw1_reward_horizon(),
            piw1_priority: defaults::piw1_priority().into(),
            action_sequence_detection: defaults::action_sequence_detection(),
            dasd_mode: defaults::dasd_mode().into(),
            dasd_sequence_length: defaults::dasd_sequence_length(),
            junk_decision_frame: defaults::junk_decision_frame(),
            asd_discount_factor: defaults::asd_discount_factor(),
            asd_maximum_steps_to_consider: defaults::asd_maximum_steps_to_consider(),
            asd_epsilon: defaults::asd_epsilon(),
            asd_sampling: defaults::asd_sampling().into(),
            permutate_action: defaults::permutate_action(),
            seed: defaults::seed(),
        }
    }
}

impl SearchSection {
    /// Negative numeric values fall back to their documented defaults.
    pub fn sanitize(mut self) -> Self {
        if self.sim_steps_per_node < 0 {
            self.sim_steps_per_node = defaults::sim_steps_per_node();
        }
        if self.max_sim_steps_per_frame < 0 {
            self.max_sim_steps_per_frame = defaults::max_sim_steps_per_frame();
        }
        if self.discount_factor < 0.0 {
            self.discount_factor = defaults::discount_factor();
        }
        if self.iw1_reward_horizon < 0 {
            self.iw1_reward_horizon = defaults::iw1_reward_horizon();
        }
        if self.dasd_sequence_length < 0 {
            self.dasd_sequence_length = defaults::dasd_sequence_length();
        }
        if self.junk_decision_frame < 0 {
            self.junk_decision_frame = defaults::junk_decision_frame();
        }
        if self.asd_discount_factor < 0.0 {
            self.asd_discount_factor = defaults::asd_discount_factor();
        }
        if self.asd_maximum_steps_to_consider < 0 {
            self.asd_maximum_steps_to_consider = defaults::asd_maximum_steps_to_consider();
        }
        if self.asd_epsilon < 0.0 {
            self.asd_epsilon = defaults::asd_epsilon();
        }
        if self.seed < 0 {
            self.seed = defaults::seed();
        }
        self
    }
}

/// Episode runner configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerConfig {
    #[serde(default = "d_max_episodes")]
    pub max_episodes: i32,
    #[serde(default = "d_max_frames_per_episode")]
    pub max_frames_per_episode: i32,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_episodes: defaults::max_episodes(),
            max_frames_per_episode: defaults::max_frames_per_episode(),
            log_interval: defaults::log_interval(),
        }
    }
}

impl RunnerConfig {
    pub fn sanitize(mut self) -> Self {
        if self.max_episodes < 0 {
            self.max_episodes = defaults::max_episodes();
        }
        if self.max_frames_per_episode < 0 {
            self.max_frames_per_episode = defaults::max_frames_per_episode();
        }
        self
    }
}
