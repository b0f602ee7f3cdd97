//! Static simulator registry
//!
//! This module provides a thread-safe registry that allows simulators to be
//! registered at startup and looked up at runtime by their env_id.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::erased::ErasedSimulator;

/// Factory function type for creating simulator instances
pub type SimFactory = fn() -> Box<dyn ErasedSimulator>;

/// Thread-safe registry mapping env_id to simulator factory functions
static REGISTRY: Lazy<Mutex<HashMap<String, SimFactory>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Register a simulator with the global registry
///
/// Typically called from a simulator crate's `register_*` function or via
/// the `register_simulator!` macro.
pub fn register_simulator(env_id: String, factory: SimFactory) {
    let mut registry = REGISTRY.lock().unwrap();
    if registry.contains_key(&env_id) {
        warn!(env_id = %env_id, "Overriding existing simulator registration");
    }
    registry.insert(env_id, factory);
}

/// Create a new simulator instance by env_id
///
/// Returns `Some(sim)` if the env_id is registered, `None` otherwise.
pub fn create_simulator(env_id: &str) -> Option<Box<dyn ErasedSimulator>> {
    let registry = REGISTRY.lock().unwrap();
    match registry.get(env_id) {
        Some(factory) => Some(factory()),
        None => {
            warn!(env_id = %env_id, "Attempted to create unregistered simulator");
            None
        }
    }
}

/// Get list of all registered environment IDs
pub fn list_registered_simulators() -> Vec<String> {
    let registry = REGISTRY.lock().unwrap();
    registry.keys().cloned().collect()
}

/// Check if a simulator is registered
pub fn is_registered(env_id: &str) -> bool {
    let registry = REGISTRY.lock().unwrap();
    registry.contains_key(env_id)
}

/// Clear all registered simulators (mainly for testing)
pub fn clear_registry() {
    let mut registry = REGISTRY.lock().unwrap();
    registry.clear();
}

/// Convenience macro for registering simulators
///
/// # Example
///
/// ```ignore
/// register_simulator!(Gridworld, "gridworld");
/// ```
#[macro_export]
macro_rules! register_simulator {
    ($sim_type:ty, $env_id:expr) => {{
        fn factory() -> Box<dyn $crate::erased::ErasedSimulator> {
            Box::new(<$sim_type>::default())
        }
        $crate::registry::register_simulator($env_id.to_string(), factory);
    }};
}
