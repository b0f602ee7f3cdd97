//! Default configuration values.
//!
//! Single source of truth for every configurable knob. The accessor
//! functions are referenced both by the serde defaults and by the
//! negative-value sanitizing pass.

// ============================================================================
// Common
// ============================================================================

pub fn env_id() -> &'static str {
    "gridworld"
}

pub fn log_level() -> &'static str {
    "info"
}

// ============================================================================
// Search
// ============================================================================

pub fn search_method() -> &'static str {
    "iw1"
}

pub fn sim_steps_per_node() -> i32 {
    5
}

pub fn max_sim_steps_per_frame() -> i32 {
    300
}

pub fn discount_factor() -> f64 {
    0.995
}

pub fn normalize_rewards() -> bool {
    false
}

pub fn ignore_duplicate_nodes() -> bool {
    false
}

pub fn depth_normalized_reward() -> bool {
    false
}

pub fn randomize_successors() -> bool {
    false
}

pub fn novelty_boolean() -> bool {
    false
}

pub fn obs_duplicates() -> bool {
    false
}

pub fn iw1_stop_on_first_reward() -> bool {
    true
}

/// 0 = unlimited
pub fn iw1_reward_horizon() -> i32 {
    0
}

pub fn piw1_priority() -> &'static str {
    "reward"
}

pub fn action_sequence_detection() -> bool {
    false
}

pub fn dasd_mode() -> &'static str {
    "pruning"
}

pub fn dasd_sequence_length() -> i32 {
    2
}

pub fn junk_decision_frame() -> i32 {
    12
}

pub fn asd_discount_factor() -> f64 {
    0.95
}

pub fn asd_maximum_steps_to_consider() -> i32 {
    30
}

pub fn asd_epsilon() -> f64 {
    0.1
}

pub fn asd_sampling() -> &'static str {
    "per_action"
}

pub fn permutate_action() -> bool {
    false
}

pub fn seed() -> i64 {
    0
}

// ============================================================================
// Runner
// ============================================================================

pub fn max_episodes() -> i32 {
    1
}

pub fn max_frames_per_episode() -> i32 {
    18_000
}

pub fn log_interval() -> u32 {
    1
}
