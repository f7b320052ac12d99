//! Undo/redo history.
//!
//! The history is a list of full snapshots of both layers, with a cursor on
//! the snapshot matching the current world. Each edit records the state
//! *after* it; undo and redo move the cursor and hand back a copy of the
//! snapshot there. Recording after an undo drops the undone future.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use log::debug;

use crate::resources::worldgrid::LayerMap;

pub const DEFAULT_UNDO_DEPTH: usize = 500;

#[derive(Debug, Clone)]
struct Snapshot {
    layers: [LayerMap; 2],
    description: String,
}

#[derive(Resource, Debug)]
pub struct UndoHistory {
    states: VecDeque<Snapshot>,
    /// Index of the snapshot matching the world, if any.
    cursor: Option<usize>,
    max_depth: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl UndoHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            states: VecDeque::new(),
            cursor: None,
            max_depth: max_depth.max(1),
        }
    }

    /// Record the world as it is after an edit.
    pub fn record(&mut self, layers: [LayerMap; 2], description: impl Into<String>) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.states.truncate(keep);
        self.states.push_back(Snapshot {
            layers,
            description: description.into(),
        });
        if self.states.len() > self.max_depth {
            self.states.pop_front();
        }
        self.cursor = Some(self.states.len() - 1);
        debug!("Recorded '{}' ({} states)", self.description().unwrap_or(""), self.states.len());
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.states.len())
    }

    /// Step back one snapshot and return it.
    pub fn undo(&mut self) -> Option<[LayerMap; 2]> {
        if !self.can_undo() {
            return None;
        }
        let cursor = self.cursor? - 1;
        self.cursor = Some(cursor);
        self.states.get(cursor).map(|s| s.layers.clone())
    }

    /// Step forward one snapshot and return it.
    pub fn redo(&mut self) -> Option<[LayerMap; 2]> {
        if !self.can_redo() {
            return None;
        }
        let cursor = self.cursor? + 1;
        self.cursor = Some(cursor);
        self.states.get(cursor).map(|s| s.layers.clone())
    }

    /// Description of the current snapshot.
    pub fn description(&self) -> Option<&str> {
        self.states.get(self.cursor?).map(|s| s.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::blockinstance::{BlockInstance, TileMode};
    use crate::components::gridpos::GridPos;

    fn state(n: i32) -> [LayerMap; 2] {
        let mut mid = LayerMap::default();
        for x in 0..n {
            mid.insert(GridPos::new(x, 0), BlockInstance::new("dirt", TileMode::All));
        }
        [LayerMap::default(), mid]
    }

    #[test]
    fn test_undo_redo_walks_history() {
        let mut history = UndoHistory::new(10);
        history.record(state(0), "start");
        history.record(state(1), "place");
        history.record(state(2), "place");
        assert_eq!(history.undo().map(|l| l[1].len()), Some(1));
        assert_eq!(history.undo().map(|l| l[1].len()), Some(0));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().map(|l| l[1].len()), Some(1));
    }

    #[test]
    fn test_record_drops_future() {
        let mut history = UndoHistory::new(10);
        history.record(state(0), "start");
        history.record(state(1), "a");
        history.undo();
        history.record(state(3), "b");
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.description(), Some("b"));
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let mut history = UndoHistory::new(3);
        for n in 0..5 {
            history.record(state(n), format!("step {n}"));
        }
        assert_eq!(history.len(), 3);
        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.description(), Some("step 2"));
    }
}
