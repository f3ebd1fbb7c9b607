//! Focus segment tracking.
//!
//! A segment is one uninterrupted interval counting toward a task's
//! accumulated focus time. At most one segment is active at any time,
//! for at most one task -- break time never runs through here.

use serde::{Deserialize, Serialize};

use crate::clock::elapsed_secs;
use crate::task::MAX_FOCUS_SECONDS;

/// The currently accruing segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActiveSegment {
    task_id: String,
    /// Epoch milliseconds when this segment started counting.
    started_at_epoch_ms: u64,
    /// Accumulated focus seconds the task had when the segment started.
    base_seconds: u64,
}

/// Result of stopping a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEnd {
    pub task_id: String,
    /// Whole seconds this segment ran.
    pub elapsed_seconds: u64,
    /// New accumulated total, clamped to [`MAX_FOCUS_SECONDS`].
    pub new_total: u64,
}

/// Tracks the single active focus segment and the size of the most
/// recently completed one (consumed by reset/undo).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusSessionTracker {
    active: Option<ActiveSegment>,
    /// Seconds added by the last completed segment.
    last_increment: u64,
}

impl FocusSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin accruing focus time for `task_id`.
    ///
    /// The caller must have stopped any previous segment first; starting
    /// over an active segment for a different task is a logic error and
    /// the old segment's time is discarded.
    pub fn start(&mut self, task_id: &str, base_seconds: u64, now_ms: u64) {
        debug_assert!(
            self.active.is_none(),
            "segment started while another is active"
        );
        self.active = Some(ActiveSegment {
            task_id: task_id.to_string(),
            started_at_epoch_ms: now_ms,
            base_seconds,
        });
    }

    /// Stop the active segment, if any, and return the merged total.
    ///
    /// The clamp bounds the result against clock anomalies (resume from
    /// sleep, wall-clock jumps).
    pub fn stop(&mut self, now_ms: u64) -> Option<SegmentEnd> {
        let segment = self.active.take()?;
        let elapsed = elapsed_secs(segment.started_at_epoch_ms, now_ms);
        let new_total = segment
            .base_seconds
            .saturating_add(elapsed)
            .min(MAX_FOCUS_SECONDS);
        self.last_increment = elapsed;
        Some(SegmentEnd {
            task_id: segment.task_id,
            elapsed_seconds: elapsed,
            new_total,
        })
    }

    /// Discard the active segment without recording its time.
    pub fn abandon(&mut self) {
        self.active = None;
    }

    /// Live accumulated focus seconds for `task_id`.
    ///
    /// Pure query: the stored value plus in-flight elapsed time when this
    /// task's segment is running, otherwise the stored value unchanged.
    pub fn live_total(&self, task_id: &str, stored_seconds: u64, now_ms: u64) -> u64 {
        match &self.active {
            Some(seg) if seg.task_id == task_id => seg
                .base_seconds
                .saturating_add(elapsed_secs(seg.started_at_epoch_ms, now_ms))
                .min(MAX_FOCUS_SECONDS),
            _ => stored_seconds,
        }
    }

    /// Id of the task whose segment is accruing, if any.
    pub fn active_task(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.task_id.as_str())
    }

    pub fn is_active_for(&self, task_id: &str) -> bool {
        self.active_task() == Some(task_id)
    }

    /// Seconds added by the most recently completed segment.
    pub fn last_increment(&self) -> u64 {
        self.last_increment
    }

    /// Forget the last increment after reset consumed it.
    pub fn clear_last_increment(&mut self) {
        self.last_increment = 0;
    }
}
