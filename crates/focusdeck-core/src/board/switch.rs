//! Per-task suspended timer state.
//!
//! When the user switches away from a task, its run is captured here and
//! restored -- always paused -- when they come back. Entries are a
//! resumability cache, not a durable record: discarding one at any time
//! costs nothing, because durable state lives in the task's persisted
//! focus seconds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::timer::{CycleConfig, StepKind};

/// Snapshot of a task's run at the moment the user switched away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspendedTimer {
    pub mode: StepKind,
    pub remaining_seconds: u64,
    pub cycle_index: u32,
    pub config: Option<CycleConfig>,
    /// Live-accumulated focus seconds at capture time, so in-flight
    /// session time is carried rather than lost.
    pub last_focused_seconds: u64,
    /// Whether the user supplied the cycle count themselves (blocks the
    /// auto-suggestion on restore).
    pub user_set_cycles: bool,
}

/// Map of suspended runs keyed by task id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchMap {
    entries: HashMap<String, SuspendedTimer>,
}

impl SwitchMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, task_id: &str, snapshot: SuspendedTimer) {
        self.entries.insert(task_id.to_string(), snapshot);
    }

    pub fn take(&mut self, task_id: &str) -> Option<SuspendedTimer> {
        self.entries.remove(task_id)
    }

    pub fn discard(&mut self, task_id: &str) {
        self.entries.remove(task_id);
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.entries.contains_key(task_id)
    }
}
