//! # FocusDeck Core Library
//!
//! Core business logic for FocusDeck: a to-do list combined with a
//! Pomodoro focus timer that accounts focused time per task against a
//! planned budget and detects budget crossings exactly once.
//!
//! ## Architecture
//!
//! - **Task board**: an explicit command interface over the session
//!   tracker, cycle scheduler and overdue detector; the caller supplies
//!   the 1 Hz cadence by invoking `tick()`
//! - **Backends**: persistence and user-prompt collaborators behind
//!   traits, with HTTP and in-memory implementations
//! - **Config**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TaskBoard`]: command surface and tick loop
//! - [`CycleScheduler`]: focus/break alternation state machine
//! - [`FocusSessionTracker`]: wall-clock focus segment accounting
//! - [`OverdueDetector`]: one-shot budget-crossing detection
//! - [`TaskBackend`]: persistence collaborator seam

pub mod backend;
pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod task;
pub mod timer;

pub use backend::{
    ConfirmationChoice, FocusTimeReceipt, HttpBackend, MemoryBackend, NotifyCategory,
    TaskBackend, UserPrompt,
};
pub use board::{BoardState, SuspendedTimer, SwitchMap, TaskBoard};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{BackendError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use task::{TaskRecord, TaskStore, MAX_FOCUS_SECONDS};
pub use timer::{
    CycleConfig, CycleScheduler, CycleState, FlashCue, FocusSessionTracker, OverdueDetector,
    StepKind,
};
