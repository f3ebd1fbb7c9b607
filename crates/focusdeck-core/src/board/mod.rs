//! The task board: command surface and tick loop.
//!
//! `TaskBoard` wires the session tracker, cycle scheduler, overdue
//! detector and switch map together behind an explicit command
//! interface. The host environment supplies the cadence: call `tick()`
//! once per second and forward user actions as commands. Each tick runs
//! the countdown, the active task's progress recompute and the global
//! overdue sweep as one atomic pass -- nothing re-enters mid-tick.
//!
//! Failure policy inside ticks: a task that vanished mid-flight is
//! silently skipped, and a failed persist leaves the locally clamped
//! value in place (the processing guard then expires on its own).

mod switch;

pub use switch::{SuspendedTimer, SwitchMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::backend::{ConfirmationChoice, NotifyCategory, TaskBackend, UserPrompt};
use crate::clock::Clock;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::task::{TaskRecord, TaskStore};
use crate::timer::{
    Crossing, CycleConfig, CycleScheduler, CycleState, CycleTransition, FocusSessionTracker,
    OverdueDetector, StepKind,
};

/// Serializable portion of the board, for hosts that snapshot state
/// between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardState {
    pub tasks: TaskStore,
    pub tracker: FocusSessionTracker,
    pub scheduler: CycleScheduler,
    pub detector: OverdueDetector,
    pub suspended: SwitchMap,
    pub active_task: Option<String>,
    pub user_set_cycles: bool,
}

/// Focus-time accounting core behind an explicit command interface.
pub struct TaskBoard {
    clock: Box<dyn Clock>,
    backend: Box<dyn TaskBackend>,
    prompt: Box<dyn UserPrompt>,
    state: BoardState,
}

impl TaskBoard {
    pub fn new(
        clock: Box<dyn Clock>,
        backend: Box<dyn TaskBackend>,
        prompt: Box<dyn UserPrompt>,
    ) -> Self {
        Self::from_state(BoardState::default(), clock, backend, prompt)
    }

    pub fn from_state(
        state: BoardState,
        clock: Box<dyn Clock>,
        backend: Box<dyn TaskBackend>,
        prompt: Box<dyn UserPrompt>,
    ) -> Self {
        Self {
            clock,
            backend,
            prompt,
            state,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.state.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskRecord> {
        self.state.tasks.get(task_id)
    }

    pub fn active_task(&self) -> Option<&str> {
        self.state.active_task.as_deref()
    }

    pub fn scheduler_state(&self) -> CycleState {
        self.state.scheduler.state()
    }

    /// Live accumulated focus seconds, including any in-flight segment.
    pub fn live_focused_seconds(&self, task_id: &str) -> u64 {
        let stored = self
            .state
            .tasks
            .get(task_id)
            .map(|t| t.focused_seconds)
            .unwrap_or(0);
        self.state
            .tracker
            .live_total(task_id, stored, self.clock.now_ms())
    }

    /// Derived display quantity: focus time beyond the episode baseline
    /// that the backend has not yet accounted as overdue. Never persisted.
    pub fn overdue_extra_seconds(&self, task_id: &str) -> u64 {
        let Some(task) = self.state.tasks.get(task_id) else {
            return 0;
        };
        let Some(baseline) = task.overdue_baseline_seconds else {
            return 0;
        };
        self.live_focused_seconds(task_id)
            .saturating_sub(baseline)
            .saturating_sub(task.overdue_seconds)
    }

    pub fn is_overdue_extra_visible(&self, task_id: &str) -> bool {
        self.state
            .tasks
            .get(task_id)
            .map(|t| t.overdue_notified && t.overdue_baseline_seconds.is_some())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> Event {
        let scheduler = &self.state.scheduler;
        let (live, extra) = match self.state.active_task.as_deref() {
            Some(id) => (
                self.live_focused_seconds(id),
                self.overdue_extra_seconds(id),
            ),
            None => (0, 0),
        };
        Event::StateSnapshot {
            task_id: self.state.active_task.clone(),
            state: scheduler.state(),
            mode: scheduler.mode(),
            remaining_secs: scheduler.remaining_seconds(),
            cycle_index: scheduler.cycle_index(),
            total_cycles: scheduler.total_cycles(),
            live_focused_secs: live,
            overdue_extra_secs: extra,
            at: Utc::now(),
        }
    }

    // ── Task commands ────────────────────────────────────────────────

    /// Create a task through the backend's add flow.
    pub fn add_task(
        &mut self,
        text: &str,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Result<String, CoreError> {
        if text.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "text".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        let id = self
            .backend
            .add_task(text, duration_hours, duration_minutes)?;
        self.state
            .tasks
            .insert(TaskRecord::with_id(&id, text, duration_hours, duration_minutes));
        Ok(id)
    }

    /// Toggle a task's completion, stopping and persisting any in-flight
    /// segment first. Un-completing clears the overdue episode so a new
    /// crossing may fire.
    pub fn toggle_done(&mut self, task_id: &str) -> Result<(), CoreError> {
        if !self.state.tasks.contains(task_id) {
            return Err(ValidationError::UnknownTask(task_id.to_string()).into());
        }
        let completed = self.state.tasks.get(task_id).map(|t| t.completed).unwrap_or(false);
        if completed {
            self.backend.mark_incomplete(task_id)?;
            if let Some(task) = self.state.tasks.get_mut(task_id) {
                task.completed = false;
                task.clear_overdue_episode();
            }
            self.state.detector.clear(task_id);
        } else {
            if self.state.tracker.is_active_for(task_id) {
                self.stop_and_persist();
            }
            if self.state.active_task.as_deref() == Some(task_id) {
                self.state.scheduler.force_idle();
            }
            self.backend.mark_complete(task_id)?;
            if let Some(task) = self.state.tasks.get_mut(task_id) {
                task.completed = true;
            }
        }
        Ok(())
    }

    /// Delete a task everywhere. Later operations on the id are no-ops.
    pub fn delete_task(&mut self, task_id: &str) -> Result<(), CoreError> {
        self.backend.delete_task(task_id)?;
        if self.state.tracker.is_active_for(task_id) {
            self.state.tracker.abandon();
        }
        if self.state.active_task.as_deref() == Some(task_id) {
            self.state.scheduler.force_idle();
            self.state.active_task = None;
        }
        self.state.tasks.remove(task_id);
        self.state.suspended.discard(task_id);
        self.state.detector.clear(task_id);
        Ok(())
    }

    /// Switch the active task, capturing the old run and restoring any
    /// suspended run for the new one (always paused). In-flight focus
    /// time is persisted before the switch; nothing is lost.
    pub fn select_task(&mut self, task_id: &str) -> Result<Event, CoreError> {
        if !self.state.tasks.contains(task_id) {
            return Err(ValidationError::UnknownTask(task_id.to_string()).into());
        }
        let from_task = self.state.active_task.clone();
        if from_task.as_deref() == Some(task_id) {
            return Ok(Event::TaskSwitched {
                from_task,
                to_task: task_id.to_string(),
                restored: false,
                at: Utc::now(),
            });
        }

        if let Some(old_id) = &from_task {
            let last_focused = self.live_focused_seconds(old_id);
            let snapshot = SuspendedTimer {
                mode: self.state.scheduler.mode(),
                remaining_seconds: self.state.scheduler.remaining_seconds(),
                cycle_index: self.state.scheduler.cycle_index(),
                config: self.state.scheduler.config(),
                last_focused_seconds: last_focused,
                user_set_cycles: self.state.user_set_cycles,
            };
            let old_id = old_id.clone();
            self.stop_and_persist();
            self.state.suspended.capture(&old_id, snapshot);
            self.state.scheduler.force_idle();
        }

        let restored = match self.state.suspended.take(task_id) {
            Some(snapshot) => {
                self.state.user_set_cycles = snapshot.user_set_cycles;
                match snapshot.config {
                    Some(config) => {
                        self.state.scheduler.restore_paused(
                            config,
                            snapshot.mode,
                            snapshot.remaining_seconds,
                            snapshot.cycle_index,
                        );
                        true
                    }
                    None => {
                        self.state.scheduler.force_idle();
                        false
                    }
                }
            }
            None => {
                self.state.user_set_cycles = false;
                self.state.scheduler.force_idle();
                false
            }
        };
        self.state.active_task = Some(task_id.to_string());
        Ok(Event::TaskSwitched {
            from_task,
            to_task: task_id.to_string(),
            restored,
            at: Utc::now(),
        })
    }

    // ── Pomodoro commands ────────────────────────────────────────────

    /// Start a run on the active task. A `None` cycle count takes the
    /// auto-suggestion from the remaining budget.
    pub fn pomodoro_start(
        &mut self,
        focus_minutes: u64,
        break_minutes: u64,
        total_cycles: Option<u32>,
    ) -> Result<Event, CoreError> {
        let task_id = self.require_active_task()?;
        let (remaining, overdue, focused) = {
            let task = self
                .state
                .tasks
                .get(&task_id)
                .ok_or_else(|| ValidationError::UnknownTask(task_id.clone()))?;
            (
                task.remaining_planned_seconds(),
                task.is_overdue(),
                task.focused_seconds,
            )
        };
        self.state.user_set_cycles = total_cycles.is_some();
        let total_cycles = total_cycles
            .unwrap_or_else(|| CycleScheduler::suggest_cycles(remaining, focus_minutes));
        let config = CycleConfig {
            focus_minutes,
            break_minutes,
            total_cycles,
        };
        self.state
            .scheduler
            .start(config, Some(remaining), overdue)?;
        self.state
            .tracker
            .start(&task_id, focused, self.clock.now_ms());
        Ok(Event::FocusStarted {
            task_id,
            cycle_index: self.state.scheduler.cycle_index(),
            total_cycles: self.state.scheduler.total_cycles(),
            duration_secs: self.state.scheduler.remaining_seconds(),
            at: Utc::now(),
        })
    }

    /// Pause the countdown. A paused focus segment is stopped and
    /// persisted; break pauses touch no focus time.
    pub fn pomodoro_pause(&mut self) -> Result<Event, CoreError> {
        let task_id = self.require_active_task()?;
        let was_focus = self.state.scheduler.state() == CycleState::FocusRunning;
        if !self.state.scheduler.pause() {
            return Err(ValidationError::InvalidState {
                state: self.state.scheduler.state().as_str().into(),
                message: "nothing to pause".into(),
            }
            .into());
        }
        if was_focus {
            self.stop_and_persist();
        }
        Ok(Event::SessionPaused {
            task_id,
            remaining_secs: self.state.scheduler.remaining_seconds(),
            at: Utc::now(),
        })
    }

    pub fn pomodoro_resume(&mut self) -> Result<Event, CoreError> {
        let task_id = self.require_active_task()?;
        if !self.state.scheduler.resume() {
            return Err(ValidationError::InvalidState {
                state: self.state.scheduler.state().as_str().into(),
                message: "nothing to resume".into(),
            }
            .into());
        }
        if self.state.scheduler.state() == CycleState::FocusRunning {
            let focused = self
                .state
                .tasks
                .get(&task_id)
                .map(|t| t.focused_seconds)
                .unwrap_or(0);
            self.state
                .tracker
                .start(&task_id, focused, self.clock.now_ms());
        }
        Ok(Event::SessionResumed {
            task_id,
            remaining_secs: self.state.scheduler.remaining_seconds(),
            at: Utc::now(),
        })
    }

    /// Force the focus/break transition now.
    pub fn pomodoro_skip(&mut self) -> Result<Event, CoreError> {
        let task_id = self.require_active_task()?;
        let leaving_focus = self.state.scheduler.mode() == StepKind::Focus;
        if leaving_focus {
            self.stop_and_persist();
        }
        let (remaining, overdue) = self.budget_of(&task_id);
        let Some((to_mode, cue)) = self.state.scheduler.skip(remaining, overdue) else {
            return Err(ValidationError::InvalidState {
                state: self.state.scheduler.state().as_str().into(),
                message: "no run to skip".into(),
            }
            .into());
        };
        if to_mode == StepKind::Focus {
            let focused = self
                .state
                .tasks
                .get(&task_id)
                .map(|t| t.focused_seconds)
                .unwrap_or(0);
            self.state
                .tracker
                .start(&task_id, focused, self.clock.now_ms());
        }
        Ok(Event::SessionSkipped {
            task_id,
            to_mode,
            cue,
            at: Utc::now(),
        })
    }

    /// Undo the most recent segment: stop any active segment, subtract
    /// only its increment from the accumulated total, re-persist, and
    /// drop the scheduler to idle. Clears the overdue episode.
    pub fn pomodoro_reset(&mut self) -> Result<Event, CoreError> {
        let task_id = self.require_active_task()?;
        let now = self.clock.now_ms();
        if let Some(end) = self.state.tracker.stop(now) {
            if let Some(task) = self.state.tasks.get_mut(&end.task_id) {
                task.focused_seconds = end.new_total;
            }
        }
        let undone = self.state.tracker.last_increment();
        let corrected = self
            .state
            .tasks
            .get(&task_id)
            .map(|t| t.focused_seconds.saturating_sub(undone))
            .unwrap_or(0);
        self.persist_total(&task_id, corrected);
        self.state.tracker.clear_last_increment();
        if let Some(task) = self.state.tasks.get_mut(&task_id) {
            task.clear_overdue_episode();
        }
        self.state.detector.clear(&task_id);
        self.state.scheduler.force_idle();
        Ok(Event::SessionReset {
            task_id,
            undone_secs: undone,
            at: Utc::now(),
        })
    }

    /// Acknowledge a finished run (all cycles complete).
    pub fn pomodoro_acknowledge_completion(&mut self) {
        self.state.scheduler.resolve_completed();
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// One atomic 1 Hz pass: countdown, active-task progress recompute,
    /// global overdue sweep. Never fails; stale references and backend
    /// errors are absorbed.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.tick_countdown(&mut events);
        self.tick_active_progress(&mut events);
        self.tick_sweep(&mut events);
        events
    }

    fn tick_countdown(&mut self, events: &mut Vec<Event>) {
        let Some(task_id) = self.state.active_task.clone() else {
            return;
        };
        if !self.state.tasks.contains(&task_id) {
            // Deleted out from under us: drop the run silently.
            self.state.tracker.abandon();
            self.state.scheduler.force_idle();
            self.state.active_task = None;
            return;
        }
        let (remaining, overdue) = self.budget_of(&task_id);
        match self.state.scheduler.tick(remaining, overdue) {
            Some(CycleTransition::FocusFinished { final_cycle }) => {
                self.stop_and_persist();
                if final_cycle {
                    self.prompt.notify(
                        "All cycles completed!",
                        "The run is finished.",
                        NotifyCategory::CyclesCompleted,
                    );
                    events.push(Event::CyclesCompleted {
                        task_id,
                        total_cycles: self.state.scheduler.total_cycles(),
                        at: Utc::now(),
                    });
                } else {
                    self.prompt.notify(
                        "Focus session ended!",
                        "Time for a break.",
                        NotifyCategory::FocusEnded,
                    );
                    events.push(Event::BreakStarted {
                        task_id,
                        cycle_index: self.state.scheduler.cycle_index(),
                        duration_secs: self.state.scheduler.remaining_seconds(),
                        at: Utc::now(),
                    });
                }
            }
            Some(CycleTransition::BreakFinished { cycle_index }) => {
                let focused = self
                    .state
                    .tasks
                    .get(&task_id)
                    .map(|t| t.focused_seconds)
                    .unwrap_or(0);
                self.state
                    .tracker
                    .start(&task_id, focused, self.clock.now_ms());
                self.prompt.notify(
                    "Break ended!",
                    "Time to focus.",
                    NotifyCategory::BreakEnded,
                );
                events.push(Event::CycleAdvanced {
                    task_id,
                    cycle_index,
                    total_cycles: self.state.scheduler.total_cycles(),
                    at: Utc::now(),
                });
            }
            None => {}
        }
    }

    fn tick_active_progress(&mut self, events: &mut Vec<Event>) {
        let Some(task_id) = self.state.active_task.clone() else {
            return;
        };
        if self.state.detector.is_guarded(&task_id) {
            return;
        }
        let Some(task) = self.state.tasks.get(&task_id) else {
            return;
        };
        if task.completed {
            return;
        }
        let planned = task.planned_seconds;
        let notified = task.overdue_notified;
        let live = self.live_focused_seconds(&task_id);
        let running = self.state.tracker.is_active_for(&task_id)
            && self.state.scheduler.state() == CycleState::FocusRunning;
        let crossing =
            self.state
                .detector
                .evaluate(&task_id, live, planned, running, notified);
        if crossing == Crossing::Fire {
            self.handle_crossing(&task_id, live, planned, events);
        }
    }

    fn tick_sweep(&mut self, events: &mut Vec<Event>) {
        let now = self.clock.now_ms();
        self.state.detector.expire_stale_guards(now);
        for task_id in self.state.tasks.open_task_ids() {
            // The active task was already evaluated this tick.
            if self.state.active_task.as_deref() == Some(task_id.as_str()) {
                continue;
            }
            if self.state.detector.is_guarded(&task_id) {
                continue;
            }
            let Some(task) = self.state.tasks.get(&task_id) else {
                continue;
            };
            let planned = task.planned_seconds;
            let notified = task.overdue_notified;
            let live = task.focused_seconds;
            let crossing = self
                .state
                .detector
                .evaluate(&task_id, live, planned, false, notified);
            if crossing == Crossing::Fire {
                self.handle_crossing(&task_id, live, planned, events);
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require_active_task(&self) -> Result<String, ValidationError> {
        self.state
            .active_task
            .clone()
            .ok_or_else(|| ValidationError::InvalidState {
                state: "idle".into(),
                message: "no task selected".into(),
            })
    }

    fn budget_of(&self, task_id: &str) -> (Option<u64>, bool) {
        match self.state.tasks.get(task_id) {
            Some(task) => (Some(task.remaining_planned_seconds()), task.is_overdue()),
            None => (None, false),
        }
    }

    /// Stop the active segment and persist the merged total. Returns
    /// whether the backend acknowledged.
    fn stop_and_persist(&mut self) -> bool {
        let now = self.clock.now_ms();
        let Some(end) = self.state.tracker.stop(now) else {
            return true;
        };
        if !self.state.tasks.contains(&end.task_id) {
            // Task deleted mid-session: degrade to a no-op.
            return true;
        }
        self.persist_total(&end.task_id, end.new_total)
    }

    /// Set the local total and hand it to the backend, adopting the
    /// receipt verbatim on success. On failure the locally clamped
    /// value stays the working value.
    fn persist_total(&mut self, task_id: &str, total: u64) -> bool {
        if let Some(task) = self.state.tasks.get_mut(task_id) {
            task.focused_seconds = total;
        } else {
            return true;
        }
        match self.backend.persist_focus_time(task_id, total) {
            Ok(receipt) => {
                if let Some(task) = self.state.tasks.get_mut(task_id) {
                    task.focused_seconds = receipt.focused_seconds;
                    task.overdue_seconds = receipt.overdue_seconds;
                }
                true
            }
            Err(_) => false,
        }
    }

    /// Exactly-once confirmation for a budget crossing.
    fn handle_crossing(
        &mut self,
        task_id: &str,
        live: u64,
        planned: u64,
        events: &mut Vec<Event>,
    ) {
        let now = self.clock.now_ms();
        self.state.detector.guard(task_id, now);

        let was_accruing = self.state.tracker.is_active_for(task_id);
        let mut persisted = true;
        if was_accruing {
            persisted = self.stop_and_persist();
        }
        let is_active = self.state.active_task.as_deref() == Some(task_id);
        if is_active {
            self.state.scheduler.suspend_for_confirmation();
        }
        if let Some(task) = self.state.tasks.get_mut(task_id) {
            task.overdue_notified = true;
        }
        events.push(Event::OverdueCrossed {
            task_id: task_id.to_string(),
            planned_secs: planned,
            live_secs: live,
            at: Utc::now(),
        });
        self.prompt.notify(
            "Task time is up",
            "Planned time for this task has been used.",
            NotifyCategory::Overdue,
        );

        let message = format!(
            "You have reached the planned time ({planned}s). Mark the task as done?"
        );
        let choice = self.prompt.request_confirmation(task_id, &message);
        let marked_complete = match choice {
            ConfirmationChoice::MarkComplete => {
                if self.backend.mark_complete(task_id).is_err() {
                    persisted = false;
                }
                if let Some(task) = self.state.tasks.get_mut(task_id) {
                    task.completed = true;
                    task.clear_overdue_episode();
                }
                self.state.detector.clear(task_id);
                if is_active {
                    self.state.scheduler.force_idle();
                }
                true
            }
            ConfirmationChoice::Continue => {
                if let Some(task) = self.state.tasks.get_mut(task_id) {
                    if task.overdue_baseline_seconds.is_none() {
                        task.overdue_baseline_seconds = Some(planned);
                    }
                }
                if is_active {
                    self.state.scheduler.resolve_continue();
                    if self.state.scheduler.state() == CycleState::FocusRunning && was_accruing {
                        let focused = self
                            .state
                            .tasks
                            .get(task_id)
                            .map(|t| t.focused_seconds)
                            .unwrap_or(0);
                        self.state.tracker.start(task_id, focused, now);
                    }
                }
                false
            }
        };
        if persisted {
            self.state.detector.release_guard(task_id);
        }
        events.push(Event::OverdueResolved {
            task_id: task_id.to_string(),
            marked_complete,
            at: Utc::now(),
        });
    }
}
