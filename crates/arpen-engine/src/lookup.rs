//! Reporting of scene nodes a technique expected but could not find
//!
//! A missing node skips that frame's work. The first miss of a node logs a
//! warning; repeats are counted and re-surfaced periodically, since a node
//! that stays missing points at a setup-ordering bug.

use std::collections::HashMap;

use arpen_core::NodeId;

/// Re-surface a persisting miss every this many frames
const REPEAT_INTERVAL: u64 = 120;

#[derive(Debug, Default)]
pub struct MissingNodeLog {
    misses: HashMap<(&'static str, NodeId), u64>,
}

impl MissingNodeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `role` node `id` was absent for `technique` this frame.
    pub fn report(&mut self, technique: &'static str, role: &'static str, id: NodeId) {
        let count = self.misses.entry((role, id)).or_insert(0);
        *count += 1;
        if *count == 1 {
            tracing::warn!("{}: {} node {} is missing, skipping frame", technique, role, id);
        } else if *count % REPEAT_INTERVAL == 0 {
            tracing::warn!(
                "{}: {} node {} still missing after {} frames",
                technique,
                role,
                id,
                count
            );
        }
    }

    /// Total misses since the last clear
    pub fn total(&self) -> u64 {
        self.misses.values().sum()
    }

    pub fn count(&self, role: &'static str, id: NodeId) -> u64 {
        self.misses.get(&(role, id)).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.misses.clear();
    }
}
