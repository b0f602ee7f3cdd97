//! Simulation context providing a high-level API over an erased simulator
//!
//! This module provides `SimContext`, a convenient wrapper for running
//! simulations without dealing with raw buffers and registry lookups. It also
//! keeps the bookkeeping the planner reports each frame: primitive steps
//! simulated and wall-clock time spent inside the simulator.

use std::time::Instant;

use crate::erased::{ErasedSimulator, SimError, SimId};
use crate::registry::create_simulator;

/// High-level context for running simulations
///
/// `SimContext` wraps an `ErasedSimulator` instance and provides convenient
/// methods for reset/step operations while managing internal buffers. The
/// planner treats it as an exclusively-owned resource: every call passes in
/// the snapshot to restore, so no per-node simulator copies exist.
#[derive(Debug)]
pub struct SimContext {
    sim: Box<dyn ErasedSimulator>,
    state_buf: Vec<u8>,
    obs_buf: Vec<u8>,
    steps_since_take: u64,
    steps_total: u64,
    emulation_micros: u64,
}

/// Result of a reset operation
#[derive(Debug, Clone)]
pub struct ResetResult {
    /// Initial state snapshot
    pub state: Vec<u8>,
    /// Initial observation
    pub obs: Vec<u8>,
}

/// Result of a single primitive step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Successor state snapshot
    pub state: Vec<u8>,
    /// Successor observation
    pub obs: Vec<u8>,
    /// Reward received from this step
    pub reward: f32,
    /// Whether the episode has terminated
    pub terminal: bool,
}

/// Result of a multi-step simulation under a fixed action
#[derive(Debug, Clone)]
pub struct SimulateOutcome {
    /// State snapshot after the last executed step
    pub state: Vec<u8>,
    /// Observation after the last executed step
    pub obs: Vec<u8>,
    /// Steps actually executed (may be short of the request on termination)
    pub steps_executed: u32,
    /// Accumulated (undiscounted) reward over the executed steps
    pub reward: f32,
    /// Whether the episode terminated during the simulation
    pub terminal: bool,
}

impl SimContext {
    /// Create a new context for the registered simulator `env_id`
    ///
    /// Returns `None` if no simulator is registered under that id.
    pub fn new(env_id: &str) -> Option<Self> {
        let sim = create_simulator(env_id)?;
        Some(Self::from_simulator(sim))
    }

    /// Create a context from an existing simulator instance
    pub fn from_simulator(sim: Box<dyn ErasedSimulator>) -> Self {
        Self {
            sim,
            state_buf: Vec::with_capacity(256),
            obs_buf: Vec::with_capacity(256),
            steps_since_take: 0,
            steps_total: 0,
            emulation_micros: 0,
        }
    }

    pub fn sim_id(&self) -> SimId {
        self.sim.sim_id()
    }

    pub fn num_actions(&self) -> usize {
        self.sim.num_actions()
    }

    pub fn obs_len(&self) -> usize {
        self.sim.obs_len()
    }

    /// Reset the simulator to an initial state
    pub fn reset(&mut self, seed: u64) -> Result<ResetResult, SimError> {
        self.state_buf.clear();
        self.obs_buf.clear();

        self.sim.reset(seed, &mut self.state_buf, &mut self.obs_buf)?;

        Ok(ResetResult {
            state: self.state_buf.clone(),
            obs: self.obs_buf.clone(),
        })
    }

    /// Perform one primitive simulation step
    pub fn step(&mut self, state: &[u8], action: u8) -> Result<StepResult, SimError> {
        self.state_buf.clear();
        self.obs_buf.clear();

        let start = Instant::now();
        let (reward, terminal) =
            self.sim
                .step(state, action, &mut self.state_buf, &mut self.obs_buf)?;
        self.emulation_micros += start.elapsed().as_micros() as u64;
        self.steps_since_take += 1;
        self.steps_total += 1;

        Ok(StepResult {
            state: self.state_buf.clone(),
            obs: self.obs_buf.clone(),
            reward,
            terminal,
        })
    }

    /// Simulate forward for up to `num_steps` primitive steps under `action`,
    /// accumulating reward and stopping early on termination.
    ///
    /// This is the gateway call the search tree makes once per generated
    /// node: the snapshot in `state` is restored implicitly by passing it to
    /// the first step, and the resulting snapshot is returned by value.
    pub fn simulate(
        &mut self,
        state: &[u8],
        action: u8,
        num_steps: u32,
    ) -> Result<SimulateOutcome, SimError> {
        let mut current = state.to_vec();
        let mut obs = Vec::new();
        let mut total_reward = 0.0;
        let mut terminal = false;
        let mut executed = 0;

        for _ in 0..num_steps {
            let step = self.step(&current, action)?;
            current = step.state;
            obs = step.obs;
            total_reward += step.reward;
            executed += 1;

            if step.terminal {
                terminal = true;
                break;
            }
        }

        Ok(SimulateOutcome {
            state: current,
            obs,
            steps_executed: executed,
            reward: total_reward,
            terminal,
        })
    }

    /// Primitive steps simulated since the last call to this function.
    pub fn take_simulation_steps(&mut self) -> u64 {
        let s = self.steps_since_take;
        self.steps_since_take = 0;
        s
    }

    /// Primitive steps simulated over the lifetime of this context.
    pub fn total_simulation_steps(&self) -> u64 {
        self.steps_total
    }

    /// Wall-clock microseconds spent inside the simulator.
    pub fn emulation_micros(&self) -> u64 {
        self.emulation_micros
    }

    /// Get access to the underlying simulator
    pub fn simulator(&self) -> &dyn ErasedSimulator {
        self.sim.as_ref()
    }
}
