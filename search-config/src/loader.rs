//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable
//! overrides.

use crate::CentralConfig;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a subdirectory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the LOOKAHEAD_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied and negative
/// numeric values are replaced with their defaults.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("LOOKAHEAD_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from LOOKAHEAD_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "LOOKAHEAD_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default()).sanitize()
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &PathBuf) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config).sanitize(),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default()).sanitize()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default()).sanitize()
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (i32, u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: LOOKAHEAD_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.env_id, "LOOKAHEAD_COMMON_ENV_ID");
    env_override!(config, common.log_level, "LOOKAHEAD_COMMON_LOG_LEVEL");

    // Search
    env_override!(config, search.search_method, "LOOKAHEAD_SEARCH_SEARCH_METHOD");
    env_override!(
        config,
        search.sim_steps_per_node,
        "LOOKAHEAD_SEARCH_SIM_STEPS_PER_NODE",
        parse
    );
    env_override!(
        config,
        search.max_sim_steps_per_frame,
        "LOOKAHEAD_SEARCH_MAX_SIM_STEPS_PER_FRAME",
        parse
    );
    env_override!(
        config,
        search.discount_factor,
        "LOOKAHEAD_SEARCH_DISCOUNT_FACTOR",
        parse
    );
    env_override!(
        config,
        search.normalize_rewards,
        "LOOKAHEAD_SEARCH_NORMALIZE_REWARDS",
        parse
    );
    env_override!(
        config,
        search.ignore_duplicate_nodes,
        "LOOKAHEAD_SEARCH_IGNORE_DUPLICATE_NODES",
        parse
    );
    env_override!(
        config,
        search.depth_normalized_reward,
        "LOOKAHEAD_SEARCH_DEPTH_NORMALIZED_REWARD",
        parse
    );
    env_override!(
        config,
        search.randomize_successors,
        "LOOKAHEAD_SEARCH_RANDOMIZE_SUCCESSORS",
        parse
    );
    env_override!(
        config,
        search.novelty_boolean,
        "LOOKAHEAD_SEARCH_NOVELTY_BOOLEAN",
        parse
    );
    env_override!(
        config,
        search.obs_duplicates,
        "LOOKAHEAD_SEARCH_OBS_DUPLICATES",
        parse
    );
    env_override!(
        config,
        search.iw1_stop_on_first_reward,
        "LOOKAHEAD_SEARCH_IW1_STOP_ON_FIRST_REWARD",
        parse
    );
    env_override!(
        config,
        search.iw1_reward_horizon,
        "LOOKAHEAD_SEARCH_IW1_REWARD_HORIZON",
        parse
    );
    env_override!(config, search.piw1_priority, "LOOKAHEAD_SEARCH_PIW1_PRIORITY");
    env_override!(
        config,
        search.action_sequence_detection,
        "LOOKAHEAD_SEARCH_ACTION_SEQUENCE_DETECTION",
        parse
    );
    env_override!(config, search.dasd_mode, "LOOKAHEAD_SEARCH_DASD_MODE");
    env_override!(
        config,
        search.dasd_sequence_length,
        "LOOKAHEAD_SEARCH_DASD_SEQUENCE_LENGTH",
        parse
    );
    env_override!(
        config,
        search.junk_decision_frame,
        "LOOKAHEAD_SEARCH_JUNK_DECISION_FRAME",
        parse
    );
    env_override!(
        config,
        search.asd_discount_factor,
        "LOOKAHEAD_SEARCH_ASD_DISCOUNT_FACTOR",
        parse
    );
    env_override!(
        config,
        search.asd_maximum_steps_to_consider,
        "LOOKAHEAD_SEARCH_ASD_MAXIMUM_STEPS_TO_CONSIDER",
        parse
    );
    env_override!(
        config,
        search.asd_epsilon,
        "LOOKAHEAD_SEARCH_ASD_EPSILON",
        parse
    );
    env_override!(config, search.asd_sampling, "LOOKAHEAD_SEARCH_ASD_SAMPLING");
    env_override!(
        config,
        search.permutate_action,
        "LOOKAHEAD_SEARCH_PERMUTATE_ACTION",
        parse
    );
    env_override!(config, search.seed, "LOOKAHEAD_SEARCH_SEED", parse);

    // Runner
    env_override!(
        config,
        runner.max_episodes,
        "LOOKAHEAD_RUNNER_MAX_EPISODES",
        parse
    );
    env_override!(
        config,
        runner.max_frames_per_episode,
        "LOOKAHEAD_RUNNER_MAX_FRAMES_PER_EPISODE",
        parse
    );
    env_override!(
        config,
        runner.log_interval,
        "LOOKAHEAD_RUNNER_LOG_INTERVAL",
        parse
    );

    config
}
