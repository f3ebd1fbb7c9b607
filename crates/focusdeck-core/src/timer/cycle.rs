//! Focus/break cycle scheduler.
//!
//! A wall-clock-free countdown state machine: the caller supplies the
//! 1 Hz cadence by invoking `tick()` once per second. Focus-time accrual
//! is not handled here -- the board pairs scheduler transitions with the
//! session tracker.
//!
//! ## State transitions
//!
//! ```text
//! Idle --start--> FocusRunning <--tick--> BreakRunning
//!                      |  ^
//!                  pause  resume
//!                      v  |
//!                 FocusPaused        (Break* likewise)
//!
//! final focus expiry --> AwaitingConfirmation --> CompletedCycles | Idle
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Focus,
    Break,
}

/// One-shot visual cue emitted on skip, so the presentation layer can
/// flash the focus color or the break color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCue {
    Focus,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleState {
    Idle,
    FocusRunning,
    FocusPaused,
    BreakRunning,
    BreakPaused,
    /// Countdown suspended while a user decision is pending.
    AwaitingConfirmation,
    /// All configured cycles finished; terminal until reset or switch.
    CompletedCycles,
}

impl CycleState {
    pub fn is_running(self) -> bool {
        matches!(self, CycleState::FocusRunning | CycleState::BreakRunning)
    }

    pub fn mode(self) -> StepKind {
        match self {
            CycleState::BreakRunning | CycleState::BreakPaused => StepKind::Break,
            _ => StepKind::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::FocusRunning => "focus-running",
            CycleState::FocusPaused => "focus-paused",
            CycleState::BreakRunning => "break-running",
            CycleState::BreakPaused => "break-paused",
            CycleState::AwaitingConfirmation => "awaiting-confirmation",
            CycleState::CompletedCycles => "completed-cycles",
        }
    }
}

/// User-configured cycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    pub focus_minutes: u64,
    pub break_minutes: u64,
    pub total_cycles: u32,
}

impl CycleConfig {
    pub fn focus_seconds(&self) -> u64 {
        self.focus_minutes.saturating_mul(60)
    }

    pub fn break_seconds(&self) -> u64 {
        self.break_minutes.saturating_mul(60)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("focus_minutes", self.focus_minutes),
            ("break_minutes", self.break_minutes),
            ("total_cycles", self.total_cycles as u64),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be a positive number".into(),
                });
            }
        }
        Ok(())
    }
}

/// What a tick or skip just did, for the board to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTransition {
    /// A focus segment ran out. `final_cycle` means the run is over and
    /// the scheduler is now awaiting confirmation.
    FocusFinished { final_cycle: bool },
    /// A break ran out and a new focus cycle began.
    BreakFinished { cycle_index: u32 },
}

/// The focus/break alternation state machine with cycle counting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleScheduler {
    state: CycleState,
    config: Option<CycleConfig>,
    remaining_seconds: u64,
    /// 1-based once a run starts; 0 means no run yet.
    cycle_index: u32,
    /// State to return to when a confirmation suspension is released.
    #[serde(default)]
    suspended_from: Option<CycleState>,
}

impl Default for CycleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleScheduler {
    pub fn new() -> Self {
        Self {
            state: CycleState::Idle,
            config: None,
            remaining_seconds: 0,
            cycle_index: 0,
            suspended_from: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn mode(&self) -> StepKind {
        self.state.mode()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn cycle_index(&self) -> u32 {
        self.cycle_index
    }

    pub fn total_cycles(&self) -> u32 {
        self.config.map(|c| c.total_cycles).unwrap_or(0)
    }

    pub fn config(&self) -> Option<CycleConfig> {
        self.config
    }

    /// Auto-suggested cycle count when the user left it unset:
    /// how many focus segments fit in the remaining plan, minimum one.
    pub fn suggest_cycles(planned_remaining_seconds: u64, focus_minutes: u64) -> u32 {
        if focus_minutes == 0 {
            return 1;
        }
        let fit = (planned_remaining_seconds / 60) / focus_minutes;
        fit.max(1) as u32
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a run from idle.
    ///
    /// `remaining_planned` is the task's unconsumed budget when knowable.
    /// A focus duration that cannot fit in the remaining budget of a
    /// not-yet-overdue task is rejected loudly; the clamp below only
    /// covers caps arising mid-run.
    pub fn start(
        &mut self,
        config: CycleConfig,
        remaining_planned: Option<u64>,
        task_overdue: bool,
    ) -> Result<(), ValidationError> {
        if self.state != CycleState::Idle {
            return Err(ValidationError::InvalidState {
                state: self.state.as_str().into(),
                message: "a run is already in progress".into(),
            });
        }
        config.validate()?;
        if let Some(remaining) = remaining_planned {
            if !task_overdue && config.focus_seconds() > remaining {
                return Err(ValidationError::FocusExceedsBudget {
                    focus_seconds: config.focus_seconds(),
                    remaining_seconds: remaining,
                });
            }
        }
        self.remaining_seconds = Self::capped_focus(&config, remaining_planned, task_overdue);
        self.config = Some(config);
        self.cycle_index = 1;
        self.state = CycleState::FocusRunning;
        self.suspended_from = None;
        Ok(())
    }

    /// Count down one second. Call at 1 Hz while running.
    pub fn tick(
        &mut self,
        remaining_planned: Option<u64>,
        task_overdue: bool,
    ) -> Option<CycleTransition> {
        let config = self.config?;
        match self.state {
            CycleState::FocusRunning => {
                self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
                if self.remaining_seconds > 0 {
                    return None;
                }
                if self.cycle_index >= config.total_cycles {
                    self.state = CycleState::AwaitingConfirmation;
                    self.suspended_from = None;
                    Some(CycleTransition::FocusFinished { final_cycle: true })
                } else {
                    self.state = CycleState::BreakRunning;
                    self.remaining_seconds = config.break_seconds();
                    Some(CycleTransition::FocusFinished { final_cycle: false })
                }
            }
            CycleState::BreakRunning => {
                self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
                if self.remaining_seconds > 0 {
                    return None;
                }
                self.cycle_index += 1;
                self.state = CycleState::FocusRunning;
                self.remaining_seconds =
                    Self::capped_focus(&config, remaining_planned, task_overdue);
                Some(CycleTransition::BreakFinished {
                    cycle_index: self.cycle_index,
                })
            }
            _ => None,
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.state {
            CycleState::FocusRunning => {
                self.state = CycleState::FocusPaused;
                true
            }
            CycleState::BreakRunning => {
                self.state = CycleState::BreakPaused;
                true
            }
            _ => false,
        }
    }

    pub fn resume(&mut self) -> bool {
        match self.state {
            CycleState::FocusPaused => {
                self.state = CycleState::FocusRunning;
                true
            }
            CycleState::BreakPaused => {
                self.state = CycleState::BreakRunning;
                true
            }
            _ => false,
        }
    }

    /// Force the focus/break transition immediately, with the same
    /// capping and incrementing rules as natural expiry.
    pub fn skip(
        &mut self,
        remaining_planned: Option<u64>,
        task_overdue: bool,
    ) -> Option<(StepKind, FlashCue)> {
        let config = self.config?;
        match self.state.mode() {
            StepKind::Focus
                if matches!(
                    self.state,
                    CycleState::FocusRunning | CycleState::FocusPaused
                ) =>
            {
                self.state = CycleState::BreakRunning;
                self.remaining_seconds = config.break_seconds();
                Some((StepKind::Break, FlashCue::Break))
            }
            StepKind::Break => {
                self.cycle_index += 1;
                self.state = CycleState::FocusRunning;
                self.remaining_seconds =
                    Self::capped_focus(&config, remaining_planned, task_overdue);
                Some((StepKind::Focus, FlashCue::Focus))
            }
            _ => None,
        }
    }

    /// Suspend the countdown for a pending user decision, remembering
    /// where to resume.
    pub fn suspend_for_confirmation(&mut self) {
        if self.state == CycleState::AwaitingConfirmation {
            return;
        }
        self.suspended_from = Some(self.state);
        self.state = CycleState::AwaitingConfirmation;
    }

    /// Release a confirmation suspension back to where it came from.
    /// A suspension entered by final-cycle expiry resolves to idle.
    pub fn resolve_continue(&mut self) {
        if self.state != CycleState::AwaitingConfirmation {
            return;
        }
        self.state = self.suspended_from.take().unwrap_or(CycleState::Idle);
    }

    /// Mark the run finished (terminal until reset or task switch).
    pub fn resolve_completed(&mut self) {
        if self.state == CycleState::AwaitingConfirmation {
            self.suspended_from = None;
            self.state = CycleState::CompletedCycles;
        }
    }

    /// Drop back to idle, clearing the run. Reset and task-switch path.
    pub fn force_idle(&mut self) {
        self.state = CycleState::Idle;
        self.remaining_seconds = 0;
        self.cycle_index = 0;
        self.suspended_from = None;
    }

    /// Restore a previously captured run into a paused state.
    pub fn restore_paused(
        &mut self,
        config: CycleConfig,
        mode: StepKind,
        remaining_seconds: u64,
        cycle_index: u32,
    ) {
        self.config = Some(config);
        self.remaining_seconds = remaining_seconds;
        self.cycle_index = cycle_index;
        self.suspended_from = None;
        self.state = if cycle_index == 0 {
            CycleState::Idle
        } else {
            match mode {
                StepKind::Focus => CycleState::FocusPaused,
                StepKind::Break => CycleState::BreakPaused,
            }
        };
    }

    fn capped_focus(
        config: &CycleConfig,
        remaining_planned: Option<u64>,
        task_overdue: bool,
    ) -> u64 {
        match remaining_planned {
            Some(remaining) if !task_overdue && remaining > 0 => {
                config.focus_seconds().min(remaining)
            }
            _ => config.focus_seconds(),
        }
    }
}
