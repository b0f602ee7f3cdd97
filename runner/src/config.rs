//! Configuration for the episode runner
//!
//! Configuration is loaded from config.toml with environment variable
//! overrides. CLI arguments take highest priority, followed by env vars,
//! then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

use lookahead::{DasaSampling, DasdMode, Piw1Priority, SearchConfig, SearchMethod};
use search_config::{load_config, CentralConfig};

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_env_id() -> String {
    CENTRAL_CONFIG.common.env_id.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_search_method() -> String {
    CENTRAL_CONFIG.search.search_method.clone()
}

fn default_max_episodes() -> i32 {
    CENTRAL_CONFIG.runner.max_episodes
}

fn default_max_frames() -> i32 {
    CENTRAL_CONFIG.runner.max_frames_per_episode
}

fn default_log_interval() -> u32 {
    CENTRAL_CONFIG.runner.log_interval
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.search.seed as u64
}

#[derive(Parser, Debug, Clone)]
#[command(name = "runner")]
#[command(about = "Lookahead planner - episode runner")]
#[command(
    long_about = "Runs lookahead-search episodes against a registered simulator,
emitting one structured trace line per decision frame.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Environment ID to run (e.g., gridworld)
    #[arg(long, default_value_t = default_env_id())]
    pub env_id: String,

    /// Search method (brfs, iw1, piw1)
    #[arg(long, default_value_t = default_search_method())]
    pub search_method: String,

    /// Number of episodes to run
    #[arg(long, default_value_t = default_max_episodes())]
    pub max_episodes: i32,

    /// Hard cap on decision frames per episode
    #[arg(long, default_value_t = default_max_frames())]
    pub max_frames_per_episode: i32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Print an episode summary every N episodes (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u32,

    /// Base RNG / environment seed
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.env_id.is_empty() {
            return Err(anyhow!("env_id cannot be empty"));
        }
        if self.max_frames_per_episode <= 0 {
            return Err(anyhow!("max_frames_per_episode must be positive"));
        }
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }
        Ok(())
    }

    /// Assemble the search configuration: central config first, CLI
    /// overrides on top. Unknown method/mode strings fail here.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let section = &CENTRAL_CONFIG.search;

        let config = SearchConfig {
            method: SearchMethod::from_str(&self.search_method)?,
            sim_steps_per_node: section.sim_steps_per_node as u32,
            max_sim_steps_per_frame: section.max_sim_steps_per_frame as u32,
            discount_factor: section.discount_factor as f32,
            normalize_rewards: section.normalize_rewards,
            ignore_duplicate_nodes: section.ignore_duplicate_nodes,
            depth_normalized_reward: section.depth_normalized_reward,
            randomize_successors: section.randomize_successors,
            novelty_boolean: section.novelty_boolean,
            obs_duplicates: section.obs_duplicates,
            iw1_stop_on_first_reward: section.iw1_stop_on_first_reward,
            iw1_reward_horizon: section.iw1_reward_horizon as u32,
            piw1_priority: Piw1Priority::from_str(&section.piw1_priority)?,
            action_sequence_detection: section.action_sequence_detection,
            dasd_mode: DasdMode::from_str(&section.dasd_mode)?,
            dasd_sequence_length: section.dasd_sequence_length as usize,
            junk_decision_frame: section.junk_decision_frame as u32,
            asd_discount_factor: section.asd_discount_factor,
            asd_maximum_steps_to_consider: section.asd_maximum_steps_to_consider as usize,
            asd_epsilon: section.asd_epsilon,
            asd_sampling: DasaSampling::from_str(&section.asd_sampling)?,
            permutate_action: section.permutate_action,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            env_id: "gridworld".into(),
            search_method: "iw1".into(),
            max_episodes: 1,
            max_frames_per_episode: 100,
            log_level: "info".into(),
            log_interval: 1,
            seed: 0,
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_env_id() {
        let mut cfg = base_config();
        cfg.env_id.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("env_id"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_nonpositive_frame_cap() {
        let mut cfg = base_config();
        cfg.max_frames_per_episode = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn search_config_rejects_unknown_method() {
        let mut cfg = base_config();
        cfg.search_method = "uct".into();
        assert!(cfg.search_config().is_err());
    }

    #[test]
    fn search_config_applies_cli_method_and_seed() {
        let mut cfg = base_config();
        cfg.search_method = "brfs".into();
        cfg.seed = 99;

        let search = cfg.search_config().unwrap();
        assert_eq!(search.method, SearchMethod::BreadthFirst);
        assert_eq!(search.seed, 99);
    }
}
