//! Task records and the in-memory task store.
//!
//! A task carries its planned duration (fixed at creation) and the durable
//! count of seconds focused on it. Overdue bookkeeping lives here too:
//! `overdue_seconds` mirrors what the backend last reported, while
//! `overdue_notified` / `overdue_baseline_seconds` track the local
//! confirmation episode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound for any accumulated focus value (one day). Guards against
/// clock anomalies such as a machine resumed from sleep.
pub const MAX_FOCUS_SECONDS: u64 = 24 * 3600;

/// A single tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique identifier
    pub id: String,
    /// Task title
    pub text: String,
    /// Planned duration in seconds. Never mutated after creation.
    pub planned_seconds: u64,
    /// Durable accumulated focus time in seconds.
    pub focused_seconds: u64,
    /// Seconds beyond plan as last reported by the backend. Sync-only;
    /// the core never computes this for storage.
    #[serde(default)]
    pub overdue_seconds: u64,
    /// Set the first time this task's budget crossing raised a
    /// confirmation. Cleared only by un-complete or reset.
    #[serde(default)]
    pub overdue_notified: bool,
    /// Planned-duration snapshot taken at the first crossing; not
    /// recomputed if the plan changes mid-episode.
    #[serde(default)]
    pub overdue_baseline_seconds: Option<u64>,
    /// Completed tasks are excluded from all session/overdue processing.
    #[serde(default)]
    pub completed: bool,
}

impl TaskRecord {
    /// Create a new task with a fresh id from an hours + minutes budget.
    pub fn new(text: impl Into<String>, duration_hours: u64, duration_minutes: u64) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            text,
            duration_hours,
            duration_minutes,
        )
    }

    /// Create a task under an externally assigned id (the backend owns
    /// id assignment in the add flow).
    pub fn with_id(
        id: impl Into<String>,
        text: impl Into<String>,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            planned_seconds: duration_hours * 3600 + duration_minutes * 60,
            focused_seconds: 0,
            overdue_seconds: 0,
            overdue_notified: false,
            overdue_baseline_seconds: None,
            completed: false,
        }
    }

    /// Planned seconds not yet consumed by accumulated focus time.
    pub fn remaining_planned_seconds(&self) -> u64 {
        self.planned_seconds.saturating_sub(self.focused_seconds)
    }

    /// Whether accumulated focus time has reached the plan.
    pub fn is_overdue(&self) -> bool {
        self.planned_seconds > 0 && self.focused_seconds >= self.planned_seconds
    }

    /// Clear the local overdue episode so a new crossing can fire.
    pub fn clear_overdue_episode(&mut self) {
        self.overdue_notified = false;
        self.overdue_baseline_seconds = None;
    }
}

/// In-memory map of task records keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStore {
    tasks: HashMap<String, TaskRecord>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task: TaskRecord) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<TaskRecord> {
        self.tasks.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }

    /// Ids of tasks still open for session/overdue processing.
    pub fn open_task_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tasks
            .values()
            .filter(|t| !t.completed)
            .map(|t| t.id.clone())
            .collect();
        ids.sort();
        ids
    }
}
