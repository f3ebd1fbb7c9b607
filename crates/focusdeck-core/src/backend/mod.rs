//! External collaborator seams.
//!
//! The core never talks to a server or a screen directly. Persistence
//! goes through [`TaskBackend`] and user interaction through
//! [`UserPrompt`]; the board adopts whatever a backend receipt says over
//! its own locally computed values.

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Server response to a focus-time persist. The server is authoritative
/// for normalization and overdue computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTimeReceipt {
    pub focused_seconds: u64,
    pub was_overdue: bool,
    pub overdue_seconds: u64,
}

/// Resolution of an overdue confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationChoice {
    MarkComplete,
    Continue,
}

/// Category hint for fire-and-forget notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyCategory {
    FocusEnded,
    BreakEnded,
    CyclesCompleted,
    Overdue,
}

/// Persistence collaborator. Call/response semantics only; the transport
/// is the implementation's business.
pub trait TaskBackend {
    /// Create a task and return the server-assigned id.
    fn add_task(
        &self,
        text: &str,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Result<String, BackendError>;

    /// Persist accumulated focus time and receive the normalized values.
    fn persist_focus_time(
        &self,
        task_id: &str,
        focused_seconds: u64,
    ) -> Result<FocusTimeReceipt, BackendError>;

    /// Mark a task completed. Returns whether the server accepted.
    fn mark_complete(&self, task_id: &str) -> Result<bool, BackendError>;

    /// Re-open a completed task.
    fn mark_incomplete(&self, task_id: &str) -> Result<bool, BackendError>;

    /// Delete a task. Any later operation on this id is a no-op.
    fn delete_task(&self, task_id: &str) -> Result<bool, BackendError>;
}

/// Presentation collaborator for decisions and notifications.
pub trait UserPrompt {
    /// Modal confirmation for an overdue crossing. The core enforces the
    /// at-most-once-per-episode invariant; implementations just answer.
    fn request_confirmation(&self, task_id: &str, message: &str) -> ConfirmationChoice;

    /// Fire-and-forget notification; no return value is consumed.
    fn notify(&self, _title: &str, _body: &str, _category: NotifyCategory) {}
}
