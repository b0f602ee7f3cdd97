//! Erased simulator interface for runtime polymorphism
//!
//! This trait provides a bytes-only interface so planners can be written
//! without generics. States and observations are opaque byte snapshots and
//! actions are discrete indices. Every `step` receives the snapshot to start
//! from, so one simulator instance serves an entire search tree: the caller
//! swaps snapshots in and out instead of cloning the simulator.

/// Runtime error for erased simulator operations
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Decoding error: {0}")]
    Decoding(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Simulator logic error: {0}")]
    Logic(String),
}

/// Identification for a simulator implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimId {
    /// Environment identifier used for registry lookup (e.g., "gridworld")
    pub env_id: String,
    /// Implementation/build version string
    pub build_id: String,
}

/// Simulator trait that works only with bytes
///
/// All data is passed as byte slices and results are written to provided
/// output buffers to enable allocation-free hot paths.
///
/// # Example Usage
///
/// ```rust
/// # use sim_core::erased::*;
/// fn run_one_step(sim: &mut dyn ErasedSimulator) -> Result<(), SimError> {
///     let mut state = Vec::new();
///     let mut obs = Vec::new();
///     sim.reset(42, &mut state, &mut obs)?;
///
///     let mut next_state = Vec::new();
///     let mut next_obs = Vec::new();
///     let (reward, terminal) = sim.step(&state, 0, &mut next_state, &mut next_obs)?;
///
///     println!("Reward: {}, Terminal: {}", reward, terminal);
///     Ok(())
/// }
/// ```
pub trait ErasedSimulator: Send + std::fmt::Debug + 'static {
    /// Get simulator identification information
    fn sim_id(&self) -> SimId;

    /// Number of discrete actions; valid action indices are `0..num_actions()`
    fn num_actions(&self) -> usize;

    /// Length in bytes of the observation vector (fixed per simulator)
    fn obs_len(&self) -> usize;

    /// Reset the simulator to an initial state
    ///
    /// # Arguments
    ///
    /// * `seed` - Random seed for deterministic reset
    /// * `out_state` - Buffer to write the encoded initial state
    /// * `out_obs` - Buffer to write the encoded initial observation
    fn reset(
        &mut self,
        seed: u64,
        out_state: &mut Vec<u8>,
        out_obs: &mut Vec<u8>,
    ) -> Result<(), SimError>;

    /// Perform one primitive simulation step
    ///
    /// # Arguments
    ///
    /// * `state` - Snapshot to start from, encoded as bytes
    /// * `action` - Discrete action index
    /// * `out_state` - Buffer to write the encoded successor state
    /// * `out_obs` - Buffer to write the encoded successor observation
    ///
    /// # Returns
    ///
    /// Returns `Ok((reward, terminal))` on success, where `reward` is the
    /// immediate reward of the transition and `terminal` tells whether the
    /// episode has ended.
    fn step(
        &mut self,
        state: &[u8],
        action: u8,
        out_state: &mut Vec<u8>,
        out_obs: &mut Vec<u8>,
    ) -> Result<(f32, bool), SimError>;
}
