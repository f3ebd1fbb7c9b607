use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{CycleState, FlashCue, StepKind};

/// Every state change in the system produces an Event.
/// The presentation layer is a read-only subscriber; it polls or collects
/// the events returned by board commands and ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        task_id: String,
        cycle_index: u32,
        total_cycles: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        task_id: String,
        cycle_index: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        task_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        task_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Skip forced the focus/break transition; `cue` is the one-shot
    /// visual flash for the presentation layer.
    SessionSkipped {
        task_id: String,
        to_mode: StepKind,
        cue: FlashCue,
        at: DateTime<Utc>,
    },
    /// Reset undid the most recent segment only.
    SessionReset {
        task_id: String,
        undone_secs: u64,
        at: DateTime<Utc>,
    },
    /// A break finished and a new focus cycle began.
    CycleAdvanced {
        task_id: String,
        cycle_index: u32,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    /// The final focus cycle finished.
    CyclesCompleted {
        task_id: String,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    /// A task's budget crossing raised its one-shot confirmation.
    OverdueCrossed {
        task_id: String,
        planned_secs: u64,
        live_secs: u64,
        at: DateTime<Utc>,
    },
    /// The confirmation was resolved.
    OverdueResolved {
        task_id: String,
        marked_complete: bool,
        at: DateTime<Utc>,
    },
    TaskSwitched {
        from_task: Option<String>,
        to_task: String,
        restored: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        task_id: Option<String>,
        state: CycleState,
        mode: StepKind,
        remaining_secs: u64,
        cycle_index: u32,
        total_cycles: u32,
        live_focused_secs: u64,
        overdue_extra_secs: u64,
        at: DateTime<Utc>,
    },
}
