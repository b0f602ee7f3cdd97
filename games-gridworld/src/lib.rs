//! Deterministic grid-world simulator for the lookahead planner
//!
//! A 7x7 grid with border walls, a short interior wall and three pellets.
//! The agent moves in four directions or stays put; walking into a wall
//! leaves the position unchanged, which makes several actions
//! outcome-equivalent from many cells - exactly the situation dominated
//! action detection is built to exploit. Entering a pellet cell yields
//! reward 1 and removes the pellet; collecting all pellets ends the episode.
//!
//! The dynamics are fully deterministic and independent of the reset seed,
//! which keeps planner tests reproducible.

use sim_core::erased::{ErasedSimulator, SimError, SimId};
use sim_core::register_simulator;

pub const WIDTH: u8 = 7;
pub const HEIGHT: u8 = 7;

/// Number of discrete actions: stay, up, down, left, right
pub const NUM_ACTIONS: usize = 5;

pub const ACTION_STAY: u8 = 0;
pub const ACTION_UP: u8 = 1;
pub const ACTION_DOWN: u8 = 2;
pub const ACTION_LEFT: u8 = 3;
pub const ACTION_RIGHT: u8 = 4;

/// Pellet positions, fixed per episode
const PELLETS: [(u8, u8); 3] = [(5, 1), (5, 5), (1, 5)];

const START: (u8, u8) = (1, 1);

/// Register the grid world with the global simulator registry
///
/// Call once at startup to make it available via
/// `SimContext::new("gridworld")`.
pub fn register_gridworld() {
    register_simulator!(Gridworld, "gridworld");
}

/// Grid-world state: agent position plus the remaining-pellet mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub x: u8,
    pub y: u8,
    /// Bit i set = pellet i still present
    pub pellets: u8,
}

impl State {
    pub fn initial() -> Self {
        Self {
            x: START.0,
            y: START.1,
            pellets: (1 << PELLETS.len()) - 1,
        }
    }

    pub fn is_done(&self) -> bool {
        self.pellets == 0
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.x);
        out.push(self.y);
        out.push(self.pellets);
    }

    fn decode(buf: &[u8]) -> Result<Self, SimError> {
        if buf.len() != 3 {
            return Err(SimError::InvalidState(format!(
                "Expected 3 bytes, got {}",
                buf.len()
            )));
        }
        Ok(Self {
            x: buf[0],
            y: buf[1],
            pellets: buf[2],
        })
    }
}

/// Wall test: border cells plus a short vertical wall at x=3, y=2..=4
/// with the corridor gaps at y=1 and y=5.
pub fn is_wall(x: u8, y: u8) -> bool {
    if x == 0 || y == 0 || x == WIDTH - 1 || y == HEIGHT - 1 {
        return true;
    }
    x == 3 && (2..=4).contains(&y)
}

/// The grid-world simulator
#[derive(Debug, Default)]
pub struct Gridworld;

impl ErasedSimulator for Gridworld {
    fn sim_id(&self) -> SimId {
        SimId {
            env_id: "gridworld".to_string(),
            build_id: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn num_actions(&self) -> usize {
        NUM_ACTIONS
    }

    fn obs_len(&self) -> usize {
        3
    }

    fn reset(
        &mut self,
        _seed: u64,
        out_state: &mut Vec<u8>,
        out_obs: &mut Vec<u8>,
    ) -> Result<(), SimError> {
        let state = State::initial();
        state.encode(out_state);
        state.encode(out_obs);
        Ok(())
    }

    fn step(
        &mut self,
        state: &[u8],
        action: u8,
        out_state: &mut Vec<u8>,
        out_obs: &mut Vec<u8>,
    ) -> Result<(f32, bool), SimError> {
        let mut s = State::decode(state)?;

        let (dx, dy): (i8, i8) = match action {
            ACTION_STAY => (0, 0),
            ACTION_UP => (0, -1),
            ACTION_DOWN => (0, 1),
            ACTION_LEFT => (-1, 0),
            ACTION_RIGHT => (1, 0),
            _ => {
                return Err(SimError::InvalidAction(format!(
                    "action {} out of range",
                    action
                )))
            }
        };

        let nx = s.x.wrapping_add(dx as u8);
        let ny = s.y.wrapping_add(dy as u8);
        if !is_wall(nx, ny) {
            s.x = nx;
            s.y = ny;
        }

        let mut reward = 0.0;
        for (i, &(px, py)) in PELLETS.iter().enumerate() {
            if s.pellets & (1 << i) != 0 && s.x == px && s.y == py {
                s.pellets &= !(1 << i);
                reward = 1.0;
            }
        }

        s.encode(out_state);
        s.encode(out_obs);
        Ok((reward, s.is_done()))
    }
}

#[cfg(test)]
mod tests;
