//! Width-based lookahead tree search over byte-erased simulators.
//!
//! This crate implements planning agents that build a tree of future
//! state/action trajectories by repeatedly invoking a step-simulation
//! gateway (`sim_core::SimContext`), then select the locally-best action
//! before advancing the environment.
//!
//! # Overview
//!
//! One generic engine (`SearchTree`) owns the arena-allocated tree, the
//! expansion/backup control loop and the tree-reuse protocol; pluggable
//! strategies decide frontier order and novelty admission:
//!
//! - `brfs`: plain breadth-first lookahead
//! - `iw1`: novelty-pruned breadth-first search - a state survives only if
//!   it exhibits an unseen (position, value) observation feature
//! - `piw1`: reward-aware novelty with a priority frontier - features are
//!   re-opened when reached with a higher accumulated reward
//!
//! Redundant work is cut three ways: sibling-duplicate detection (two
//! actions reaching the same state from one node), novelty tables shared
//! across the whole planning episode, and dominated action sequence
//! detection, which learns across decision frames that some actions only
//! ever reproduce other actions' outcomes and prunes (or probabilistically
//! avoids) them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lookahead::{SearchAgent, SearchConfig, SearchMethod};
//! use sim_core::SimContext;
//!
//! games_gridworld::register_gridworld();
//! let mut ctx = SimContext::new("gridworld").unwrap();
//!
//! let config = SearchConfig::default().with_method(SearchMethod::Iw1);
//! let mut agent = SearchAgent::new(config, &ctx).unwrap();
//!
//! agent.episode_start(&mut ctx, 42).unwrap();
//! while !agent.is_terminal() {
//!     let step = agent.step(&mut ctx).unwrap();
//!     println!("{}", step.trace);
//! }
//! agent.episode_end();
//! ```

pub mod agent;
pub mod config;
pub mod dasd;
pub mod error;
pub mod node;
pub mod novelty;
pub mod search;
pub mod sequence;
pub mod strategy;
pub mod trace;
pub mod tree;
pub mod vertex_cover;

// Re-export main types
pub use agent::{AgentStep, SearchAgent};
pub use config::{DasaSampling, DasdMode, Piw1Priority, SearchConfig, SearchMethod};
pub use error::SearchError;
pub use node::{NodeId, TreeNode};
pub use search::SearchTree;
pub use trace::FrameTrace;
pub use tree::{DuplicateMode, Tree};
pub use vertex_cover::VertexCover;
