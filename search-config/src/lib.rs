//! Central configuration for the lookahead planner.
//!
//! Configuration is loaded from config.toml with environment variable
//! overrides (`LOOKAHEAD_<SECTION>_<KEY>`). Every key has a built-in
//! default that also applies when a loaded value is negative, so partial
//! config files and `-1` sentinels behave sensibly.

pub mod defaults;
pub mod loader;
pub mod structs;

pub use loader::{load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::{CentralConfig, CommonConfig, RunnerConfig, SearchSection};

#[cfg(test)]
mod tests;
