//! Per-frame chunk rendering counters.

use bevy_ecs::prelude::Resource;

/// What the last render pass did.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub visible_chunks: usize,
    /// Chunks rebuilt outside the budget because an edit touched them.
    pub immediate_rebuilds: usize,
    /// Chunks rebuilt within the per-frame budget.
    pub budgeted_rebuilds: usize,
    /// Rebuilds since startup.
    pub total_rebuilds: u64,
}

impl FrameStats {
    pub fn record(&mut self, visible: usize, immediate: usize, budgeted: usize) {
        self.frame += 1;
        self.visible_chunks = visible;
        self.immediate_rebuilds = immediate;
        self.budgeted_rebuilds = budgeted;
        self.total_rebuilds += (immediate + budgeted) as u64;
    }

    pub fn rebuilds(&self) -> usize {
        self.immediate_rebuilds + self.budgeted_rebuilds
    }
}
