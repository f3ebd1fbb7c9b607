//! In-memory backend with the server's normalization rules.
//!
//! Used by the CLI's local mode and by tests. Mirrors the reference
//! server's handling of focus-time updates: an implausibly large value is
//! assumed to be milliseconds and divided down, the result is clamped to
//! one day, and overdue seconds are recomputed against the stored plan.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{FocusTimeReceipt, TaskBackend};
use crate::error::BackendError;
use crate::task::MAX_FOCUS_SECONDS;

/// Values above this are treated as milliseconds written where seconds
/// belong, and divided by 1000.
const MILLIS_HEURISTIC_THRESHOLD: u64 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTask {
    planned_seconds: u64,
    focused_seconds: u64,
    overdue_seconds: u64,
    completed: bool,
}

/// Backend that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tasks: Mutex<HashMap<String, StoredTask>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task so later persist calls can compute overdue values
    /// against its plan. The board calls this from its add-task flow.
    pub fn register_task(&self, task_id: &str, planned_seconds: u64) {
        self.tasks.lock().unwrap().insert(
            task_id.to_string(),
            StoredTask {
                planned_seconds,
                focused_seconds: 0,
                overdue_seconds: 0,
                completed: false,
            },
        );
    }

    /// Stored focus seconds, for tests and the CLI status view.
    pub fn focused_seconds(&self, task_id: &str) -> Option<u64> {
        self.tasks
            .lock()
            .unwrap()
            .get(task_id)
            .map(|t| t.focused_seconds)
    }

    pub fn is_completed(&self, task_id: &str) -> Option<bool> {
        self.tasks
            .lock()
            .unwrap()
            .get(task_id)
            .map(|t| t.completed)
    }

    fn normalize(focused_seconds: u64) -> u64 {
        let value = if focused_seconds > MILLIS_HEURISTIC_THRESHOLD {
            focused_seconds / 1000
        } else {
            focused_seconds
        };
        value.min(MAX_FOCUS_SECONDS)
    }
}

impl TaskBackend for MemoryBackend {
    fn add_task(
        &self,
        _text: &str,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Result<String, BackendError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.register_task(&id, duration_hours * 3600 + duration_minutes * 60);
        Ok(id)
    }

    fn persist_focus_time(
        &self,
        task_id: &str,
        focused_seconds: u64,
    ) -> Result<FocusTimeReceipt, BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| BackendError::RequestFailed {
                endpoint: "/update_focus_time".into(),
                message: format!("unknown task {task_id}"),
            })?;
        let normalized = Self::normalize(focused_seconds);
        task.focused_seconds = normalized;
        let (was_overdue, overdue_seconds) =
            if task.planned_seconds > 0 && normalized > task.planned_seconds {
                (true, normalized - task.planned_seconds)
            } else {
                (false, 0)
            };
        task.overdue_seconds = overdue_seconds;
        Ok(FocusTimeReceipt {
            focused_seconds: normalized,
            was_overdue,
            overdue_seconds,
        })
    }

    fn mark_complete(&self, task_id: &str) -> Result<bool, BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(task_id) {
            Some(task) => {
                task.completed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn mark_incomplete(&self, task_id: &str) -> Result<bool, BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(task_id) {
            Some(task) => {
                task.completed = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_task(&self, task_id: &str) -> Result<bool, BackendError> {
        Ok(self.tasks.lock().unwrap().remove(task_id).is_some())
    }
}
