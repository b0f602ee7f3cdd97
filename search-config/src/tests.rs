use crate::loader::{apply_env_overrides, load_from_path};
use crate::structs::CentralConfig;
use crate::defaults;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Serializes tests that read or write LOOKAHEAD_* environment variables
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

fn write_temp_config(name: &str, content: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("lookahead-config-test-{}-{}.toml", std::process::id(), name));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn defaults_cover_every_section() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    let config = CentralConfig::default();

    assert_eq!(config.common.env_id, defaults::env_id());
    assert_eq!(config.search.search_method, "iw1");
    assert_eq!(config.search.sim_steps_per_node, 5);
    assert_eq!(config.search.max_sim_steps_per_frame, 300);
    assert!((config.search.discount_factor - 0.995).abs() < 1e-9);
    assert!(!config.search.action_sequence_detection);
    assert_eq!(config.search.dasd_sequence_length, 2);
    assert_eq!(config.search.junk_decision_frame, 12);
    assert!((config.search.asd_discount_factor - 0.95).abs() < 1e-9);
    assert_eq!(config.search.asd_maximum_steps_to_consider, 30);
    assert!((config.search.asd_epsilon - 0.1).abs() < 1e-9);
    assert_eq!(config.runner.max_episodes, 1);
}

#[test]
fn partial_file_fills_in_defaults() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    let path = write_temp_config(
        "partial",
        r#"
[search]
search_method = "piw1"
max_sim_steps_per_frame = 1000

[runner]
max_episodes = 5
"#,
    );

    let config = load_from_path(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(config.search.search_method, "piw1");
    assert_eq!(config.search.max_sim_steps_per_frame, 1000);
    // Unset keys keep their defaults
    assert_eq!(config.search.sim_steps_per_node, 5);
    assert_eq!(config.runner.max_episodes, 5);
    assert_eq!(config.common.env_id, defaults::env_id());
}

#[test]
fn negative_values_fall_back_to_defaults() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    let path = write_temp_config(
        "negative",
        r#"
[search]
sim_steps_per_node = -1
dasd_sequence_length = -1
junk_decision_frame = -1
asd_discount_factor = -1.0
asd_epsilon = -0.5
"#,
    );

    let config = load_from_path(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(config.search.sim_steps_per_node, 5);
    assert_eq!(config.search.dasd_sequence_length, 2);
    assert_eq!(config.search.junk_decision_frame, 12);
    assert!((config.search.asd_discount_factor - 0.95).abs() < 1e-9);
    assert!((config.search.asd_epsilon - 0.1).abs() < 1e-9);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    let path = write_temp_config("malformed", "this is not toml [[[");

    let config = load_from_path(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(config.search.search_method, "iw1");
    assert_eq!(config.search.sim_steps_per_node, 5);
}

#[test]
fn env_override_beats_file_value() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    // Env overrides are applied on top of whatever was loaded
    std::env::set_var("LOOKAHEAD_SEARCH_SEARCH_METHOD", "brfs");
    std::env::set_var("LOOKAHEAD_SEARCH_MAX_SIM_STEPS_PER_FRAME", "42");
    std::env::set_var("LOOKAHEAD_RUNNER_MAX_EPISODES", "9");

    let config = apply_env_overrides(CentralConfig::default());

    std::env::remove_var("LOOKAHEAD_SEARCH_SEARCH_METHOD");
    std::env::remove_var("LOOKAHEAD_SEARCH_MAX_SIM_STEPS_PER_FRAME");
    std::env::remove_var("LOOKAHEAD_RUNNER_MAX_EPISODES");

    assert_eq!(config.search.search_method, "brfs");
    assert_eq!(config.search.max_sim_steps_per_frame, 42);
    assert_eq!(config.runner.max_episodes, 9);
}

#[test]
fn unparseable_env_override_is_ignored() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap();
    std::env::set_var("LOOKAHEAD_SEARCH_SIM_STEPS_PER_NODE", "not-a-number");

    let config = apply_env_overrides(CentralConfig::default());

    std::env::remove_var("LOOKAHEAD_SEARCH_SIM_STEPS_PER_NODE");

    assert_eq!(config.search.sim_steps_per_node, 5);
}
