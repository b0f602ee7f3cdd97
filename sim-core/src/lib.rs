//! Core traits and types for driving byte-erased simulators
//!
//! This crate provides the simulation gateway used by the lookahead planner:
//! - `ErasedSimulator`: runtime interface that works only with bytes
//! - `SimContext`: high-level API for reset/step/simulate with owned buffers
//! - `Registry`: static registration system for simulators

pub mod context;
pub mod erased;
pub mod registry;

// Re-export main types for convenience
pub use context::{ResetResult, SimContext, SimulateOutcome, StepResult};
pub use erased::{ErasedSimulator, SimError, SimId};
pub use registry::{
    clear_registry, create_simulator, is_registered, list_registered_simulators,
    register_simulator, SimFactory,
};

/// Test utilities (internal use only)
#[cfg(test)]
pub(crate) mod test_utils {
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    /// Global mutex to serialize all registry-dependent tests
    pub static REGISTRY_TEST_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
}
