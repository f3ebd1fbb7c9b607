//! Integration tests for overdue detection across the sweep: deferred
//! crossings on restored state, processing-guard behavior under persist
//! failure, and receipt adoption.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use focusdeck_core::backend::{ConfirmationChoice, TaskBackend, UserPrompt};
use focusdeck_core::{
    BackendError, BoardState, FocusTimeReceipt, ManualClock, TaskBoard, TaskRecord,
};

#[derive(Clone, Default)]
struct RecordingPrompt {
    asked: Arc<Mutex<Vec<String>>>,
    answer_complete: Arc<AtomicBool>,
}

impl RecordingPrompt {
    fn asked_count(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl UserPrompt for RecordingPrompt {
    fn request_confirmation(&self, task_id: &str, _message: &str) -> ConfirmationChoice {
        self.asked.lock().unwrap().push(task_id.to_string());
        if self.answer_complete.load(Ordering::SeqCst) {
            ConfirmationChoice::MarkComplete
        } else {
            ConfirmationChoice::Continue
        }
    }
}

/// Backend whose persist calls can be made to fail, and which records
/// the last value it accepted.
#[derive(Clone, Default)]
struct FlakyBackend {
    fail_persist: Arc<AtomicBool>,
    last_persisted: Arc<Mutex<Option<(String, u64)>>>,
}

impl TaskBackend for FlakyBackend {
    fn add_task(
        &self,
        _text: &str,
        _duration_hours: u64,
        _duration_minutes: u64,
    ) -> Result<String, BackendError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn persist_focus_time(
        &self,
        task_id: &str,
        focused_seconds: u64,
    ) -> Result<FocusTimeReceipt, BackendError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(BackendError::RequestFailed {
                endpoint: "/update_focus_time".into(),
                message: "connection refused".into(),
            });
        }
        *self.last_persisted.lock().unwrap() = Some((task_id.to_string(), focused_seconds));
        Ok(FocusTimeReceipt {
            focused_seconds,
            was_overdue: false,
            overdue_seconds: 0,
        })
    }

    fn mark_complete(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn mark_incomplete(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn delete_task(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }
}

/// Backend that always answers with the same normalized receipt,
/// regardless of what was sent.
#[derive(Clone)]
struct NormalizingBackend {
    receipt: FocusTimeReceipt,
}

impl TaskBackend for NormalizingBackend {
    fn add_task(
        &self,
        _text: &str,
        _duration_hours: u64,
        _duration_minutes: u64,
    ) -> Result<String, BackendError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn persist_focus_time(
        &self,
        _task_id: &str,
        _focused_seconds: u64,
    ) -> Result<FocusTimeReceipt, BackendError> {
        Ok(self.receipt)
    }

    fn mark_complete(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn mark_incomplete(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn delete_task(&self, _task_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }
}

/// Board restored from a snapshot where a non-active task is already
/// past its budget.
fn restored_board(
    clock: &ManualClock,
    prompt: &RecordingPrompt,
    task: TaskRecord,
) -> TaskBoard {
    let mut state = BoardState::default();
    state.tasks.insert(task);
    TaskBoard::from_state(
        state,
        Box::new(clock.clone()),
        Box::new(FlakyBackend::default()),
        Box::new(prompt.clone()),
    )
}

fn past_budget_task() -> TaskRecord {
    let mut task = TaskRecord::with_id("restored", "old work", 0, 1);
    task.focused_seconds = 100; // plan is 60
    task
}

#[test]
fn restored_crossing_is_deferred_one_tick() {
    let clock = ManualClock::new(0);
    let prompt = RecordingPrompt::default();
    let mut board = restored_board(&clock, &prompt, past_budget_task());

    // First sweep observation arms the marker but asks nothing.
    clock.advance_secs(1);
    board.tick();
    assert_eq!(prompt.asked_count(), 0);

    // The consistent recheck on the next tick fires the confirmation.
    clock.advance_secs(1);
    board.tick();
    assert_eq!(prompt.asked_count(), 1);
    assert!(board.task("restored").unwrap().overdue_notified);

    // Closed episode: no further prompts.
    for _ in 0..30 {
        clock.advance_secs(1);
        board.tick();
    }
    assert_eq!(prompt.asked_count(), 1);
}

#[test]
fn continue_resolution_pins_the_baseline_once() {
    let clock = ManualClock::new(0);
    let prompt = RecordingPrompt::default();
    let mut board = restored_board(&clock, &prompt, past_budget_task());

    for _ in 0..3 {
        clock.advance_secs(1);
        board.tick();
    }
    let task = board.task("restored").unwrap();
    assert_eq!(task.overdue_baseline_seconds, Some(60));
    assert!(!task.completed);
}

#[test]
fn mark_complete_resolution_excludes_task_from_sweep() {
    let clock = ManualClock::new(0);
    let prompt = RecordingPrompt::default();
    prompt.answer_complete.store(true, Ordering::SeqCst);
    let mut board = restored_board(&clock, &prompt, past_budget_task());

    for _ in 0..5 {
        clock.advance_secs(1);
        board.tick();
    }
    assert_eq!(prompt.asked_count(), 1);
    let task = board.task("restored").unwrap();
    assert!(task.completed);
    assert!(!task.overdue_notified);
}

#[test]
fn failed_persist_keeps_local_value_and_guard_expires() {
    let clock = ManualClock::new(0);
    let prompt = RecordingPrompt::default();
    let backend = FlakyBackend::default();
    let mut state = BoardState::default();
    state.tasks.insert(past_budget_task());
    let mut board = TaskBoard::from_state(
        state,
        Box::new(clock.clone()),
        Box::new(backend.clone()),
        Box::new(prompt.clone()),
    );

    // Starting a run on an already-overdue task is allowed; the crossing
    // then fires while the segment is accruing.
    board.select_task("restored").unwrap();
    board.pomodoro_start(1, 1, Some(1)).unwrap();
    backend.fail_persist.store(true, Ordering::SeqCst);

    for _ in 0..5 {
        clock.advance_secs(1);
        board.tick();
    }
    assert_eq!(prompt.asked_count(), 1);
    // The locally clamped value survives the failed round trip.
    assert_eq!(board.task("restored").unwrap().focused_seconds, 101);
    // Guard is still held: the acknowledgment never came.
    assert!(board.state().detector.is_guarded("restored"));
    assert!(backend.last_persisted.lock().unwrap().is_none());

    // After the grace period the sweep releases it on its own, without a
    // second confirmation.
    for _ in 0..7 {
        clock.advance_secs(1);
        board.tick();
    }
    assert!(!board.state().detector.is_guarded("restored"));
    assert_eq!(prompt.asked_count(), 1);
}

#[test]
fn backend_receipt_overrides_local_estimate() {
    let clock = ManualClock::new(0);
    let prompt = RecordingPrompt::default();
    let receipt = FocusTimeReceipt {
        focused_seconds: 650,
        was_overdue: true,
        overdue_seconds: 50,
    };
    let mut board = TaskBoard::from_state(
        BoardState::default(),
        Box::new(clock.clone()),
        Box::new(NormalizingBackend { receipt }),
        Box::new(prompt.clone()),
    );
    let id = board.add_task("normalized", 1, 0).unwrap();
    board.select_task(&id).unwrap();
    board.pomodoro_start(25, 5, Some(1)).unwrap();

    for _ in 0..30 {
        clock.advance_secs(1);
        board.tick();
    }
    board.pomodoro_pause().unwrap();

    let task = board.task(&id).unwrap();
    assert_eq!(task.focused_seconds, 650);
    assert_eq!(task.overdue_seconds, 50);
}
