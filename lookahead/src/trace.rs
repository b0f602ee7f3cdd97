//! Per-decision-frame trace record.

use std::fmt;

/// One structured line of planning statistics per decision frame.
#[derive(Debug, Clone)]
pub struct FrameTrace {
    pub frame: u64,
    pub expanded: u32,
    pub generated: u32,
    pub pruned: u32,
    pub jasd_pruned: u32,
    pub depth_tree: u32,
    pub tree_size: u32,
    pub best_action: u8,
    pub branch_reward: f32,
    /// Wall-clock seconds spent planning this frame
    pub elapsed: f32,
    pub total_simulation_steps: u64,
    /// Cumulative microseconds inside the simulator
    pub emulation_time: u64,
}

impl fmt::Display for FrameTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame={},expanded={},generated={},pruned={},jasd_pruned={},depth_tree={},tree_size={},best_action={},branch_reward={},elapsed={},total_simulation_steps={},emulation_time={}",
            self.frame,
            self.expanded,
            self.generated,
            self.pruned,
            self.jasd_pruned,
            self.depth_tree,
            self.tree_size,
            self.best_action,
            self.branch_reward,
            self.elapsed,
            self.total_simulation_steps,
            self.emulation_time,
        )
    }
}

impl FrameTrace {
    /// Emit the record as a structured tracing event.
    pub fn emit(&self) {
        tracing::info!(
            target: "lookahead::frame",
            frame = self.frame,
            expanded = self.expanded,
            generated = self.generated,
            pruned = self.pruned,
            jasd_pruned = self.jasd_pruned,
            depth_tree = self.depth_tree,
            tree_size = self.tree_size,
            best_action = self.best_action,
            branch_reward = self.branch_reward,
            elapsed = self.elapsed,
            total_simulation_steps = self.total_simulation_steps,
            emulation_time = self.emulation_time,
            "decision frame"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_key_value_line() {
        let trace = FrameTrace {
            frame: 10,
            expanded: 4,
            generated: 20,
            pruned: 3,
            jasd_pruned: 1,
            depth_tree: 5,
            tree_size: 18,
            best_action: 2,
            branch_reward: 1.5,
            elapsed: 0.25,
            total_simulation_steps: 100,
            emulation_time: 4200,
        };

        let line = trace.to_string();
        assert!(line.starts_with("frame=10,"));
        assert!(line.contains("expanded=4"));
        assert!(line.contains("jasd_pruned=1"));
        assert!(line.contains("best_action=2"));
        assert!(line.contains("branch_reward=1.5"));
        assert!(line.contains("emulation_time=4200"));
    }
}
