//! Budget-crossing detection.
//!
//! The detector turns a stream of per-tick observations into at most one
//! confirmation per overdue episode. A crossing seen on a task that is
//! not actively accruing is not trusted immediately -- stale values from
//! a restore can look crossed for one read -- so it arms a marker and
//! fires only when a subsequent tick confirms the same numbers.
//!
//! It also owns the processing guards: a task is guarded between the
//! moment a crossing is handled and the backend's acknowledgment, so the
//! global sweep cannot race a second confirmation against an in-flight
//! persist call. Stale guards expire after a fixed grace period; a failed
//! persist must not wedge the sweep forever.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// How long a processing guard may outlive its persist call.
pub const GUARD_GRACE_MS: u64 = 10_000;

/// Outcome of one crossing evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Not crossed, or episode already notified.
    No,
    /// Crossed on a non-running task; deferred to the next tick.
    Armed,
    /// Crossed and confirmed; raise the confirmation now.
    Fire,
}

/// One-shot crossing detection per task, with debounce for tasks that
/// are not actively running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverdueDetector {
    /// Tasks whose crossing was observed once but not yet trusted.
    crossed: HashSet<String>,
    /// Tasks guarded against duplicate processing, with the epoch-ms
    /// instant the guard was taken.
    guards: HashMap<String, u64>,
}

impl OverdueDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one observation of a task's live accumulated time.
    pub fn evaluate(
        &mut self,
        task_id: &str,
        live_seconds: u64,
        planned_seconds: u64,
        actively_running: bool,
        already_notified: bool,
    ) -> Crossing {
        let crossed_now = planned_seconds > 0 && live_seconds >= planned_seconds;
        if !crossed_now {
            // Un-crossing before notification clears the marker; no
            // confirmation is owed.
            self.crossed.remove(task_id);
            return Crossing::No;
        }
        if already_notified {
            return Crossing::No;
        }
        if actively_running {
            self.crossed.insert(task_id.to_string());
            return Crossing::Fire;
        }
        if self.crossed.insert(task_id.to_string()) {
            Crossing::Armed
        } else {
            Crossing::Fire
        }
    }

    /// Forget all episode state for a task (reset, un-complete, delete).
    pub fn clear(&mut self, task_id: &str) {
        self.crossed.remove(task_id);
        self.guards.remove(task_id);
    }

    // ── Processing guards ────────────────────────────────────────────

    /// Take the guard for a task about to be processed.
    pub fn guard(&mut self, task_id: &str, now_ms: u64) {
        self.guards.insert(task_id.to_string(), now_ms);
    }

    /// Release the guard after the backend acknowledged (or the failure
    /// was absorbed).
    pub fn release_guard(&mut self, task_id: &str) {
        self.guards.remove(task_id);
    }

    /// Whether the sweep must skip this task right now.
    pub fn is_guarded(&self, task_id: &str) -> bool {
        self.guards.contains_key(task_id)
    }

    /// Drop guards older than the grace period. Called by the sweep so a
    /// persist call that never acknowledged cannot block a task forever.
    pub fn expire_stale_guards(&mut self, now_ms: u64) {
        self.guards
            .retain(|_, taken_at| now_ms.saturating_sub(*taken_at) < GUARD_GRACE_MS);
    }
}
