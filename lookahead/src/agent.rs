//! Per-frame agent driver.
//!
//! Owns a search tree and walks one environment episode decision frame by
//! decision frame: reuse (or rebuild) the tree, pick the best action, feed
//! the junk-sequence learner, execute the action for `sim_steps_per_node`
//! primitive steps and emit the frame trace.

use std::time::Instant;

use sim_core::SimContext;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::search::SearchTree;
use crate::trace::FrameTrace;

/// Result of one decision frame.
#[derive(Debug, Clone)]
pub struct AgentStep {
    /// Action executed in the environment
    pub action: u8,
    /// Environment reward collected over the executed steps
    pub reward: f32,
    /// Whether the episode ended during this frame
    pub terminal: bool,
    pub trace: FrameTrace,
}

/// Lookahead-search agent for a byte-erased simulator.
#[derive(Debug)]
pub struct SearchAgent {
    tree: SearchTree,
    sim_steps_per_node: u32,
    frame_number: u64,
    episode: u32,
    state: Vec<u8>,
    obs: Vec<u8>,
    terminal: bool,
}

impl SearchAgent {
    pub fn new(config: SearchConfig, ctx: &SimContext) -> Result<Self, SearchError> {
        let sim_steps_per_node = config.sim_steps_per_node;
        let tree = SearchTree::new(config, ctx.num_actions(), ctx.obs_len())?;
        Ok(Self {
            tree,
            sim_steps_per_node,
            frame_number: 0,
            episode: 0,
            state: Vec::new(),
            obs: Vec::new(),
            terminal: true,
        })
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Reset the environment and start a fresh episode.
    pub fn episode_start(&mut self, ctx: &mut SimContext, seed: u64) -> Result<(), SearchError> {
        let reset = ctx.reset(seed)?;
        self.state = reset.state;
        self.obs = reset.obs;
        self.terminal = false;
        self.frame_number = 0;
        self.episode += 1;
        self.tree.clear();
        debug!(episode = self.episode, "episode start");
        Ok(())
    }

    /// The episode is over; the tree is useless now.
    pub fn episode_end(&mut self) {
        let used = self.tree.detected_used_actions();
        info!(
            episode = self.episode,
            frames = self.frame_number,
            detected_used_actions = used,
            "episode end"
        );
        self.tree.clear();
    }

    /// Plan and execute one decision frame.
    pub fn step(&mut self, ctx: &mut SimContext) -> Result<AgentStep, SearchError> {
        assert!(!self.terminal, "episode is over, call episode_start");

        let planning_start = Instant::now();
        self.tree.set_current_frame(self.frame_number as u32);

        if self.tree.is_built() {
            // Reuse the previous frame's tree: the child for the executed
            // action becomes the new root.
            self.tree.move_to_best_sub_branch();
            let root = self.tree.tree().root();
            if self.tree.tree().get(root).state == self.state {
                self.tree.update_tree(ctx)?;
            } else {
                debug!("root state mismatch, rebuilding tree");
                self.tree.clear();
                self.tree.build(ctx, self.state.clone(), self.obs.clone())?;
            }
        } else {
            self.tree.clear();
            self.tree.build(ctx, self.state.clone(), self.obs.clone())?;
        }

        let action = self.tree.get_best_action();

        self.tree.learn_junk_action_sequences();
        self.tree.save_used_action(action);

        // Execute the chosen action in the environment
        let outcome = ctx.simulate(&self.state, action, self.sim_steps_per_node)?;
        self.state = outcome.state;
        self.obs = outcome.obs;
        self.terminal = outcome.terminal;

        let elapsed = planning_start.elapsed().as_secs_f32();
        let trace = self
            .tree
            .frame_trace(self.frame_number, elapsed, action, ctx);
        trace.emit();

        self.frame_number += outcome.steps_executed as u64;

        Ok(AgentStep {
            action,
            reward: outcome.reward,
            terminal: outcome.terminal,
            trace,
        })
    }
}
