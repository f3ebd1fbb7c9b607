//! Integration tests for the task board's accounting guarantees:
//! no time loss on switch, undo-last-segment reset, validation, and the
//! full focus/break/cap cycle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use focusdeck_core::backend::{ConfirmationChoice, TaskBackend, UserPrompt};
use focusdeck_core::{
    CoreError, CycleState, Event, ManualClock, MemoryBackend, TaskBoard, ValidationError,
};

/// Backend handle shared between the board and the test.
#[derive(Clone)]
struct SharedBackend(Arc<MemoryBackend>);

impl TaskBackend for SharedBackend {
    fn add_task(
        &self,
        text: &str,
        duration_hours: u64,
        duration_minutes: u64,
    ) -> Result<String, focusdeck_core::BackendError> {
        self.0.add_task(text, duration_hours, duration_minutes)
    }

    fn persist_focus_time(
        &self,
        task_id: &str,
        focused_seconds: u64,
    ) -> Result<focusdeck_core::FocusTimeReceipt, focusdeck_core::BackendError> {
        self.0.persist_focus_time(task_id, focused_seconds)
    }

    fn mark_complete(&self, task_id: &str) -> Result<bool, focusdeck_core::BackendError> {
        self.0.mark_complete(task_id)
    }

    fn mark_incomplete(&self, task_id: &str) -> Result<bool, focusdeck_core::BackendError> {
        self.0.mark_incomplete(task_id)
    }

    fn delete_task(&self, task_id: &str) -> Result<bool, focusdeck_core::BackendError> {
        self.0.delete_task(task_id)
    }
}

/// Prompt that answers from a script and records every confirmation.
#[derive(Clone, Default)]
struct ScriptedPrompt {
    choices: Arc<Mutex<VecDeque<ConfirmationChoice>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    fn push(&self, choice: ConfirmationChoice) {
        self.choices.lock().unwrap().push_back(choice);
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn request_confirmation(&self, task_id: &str, _message: &str) -> ConfirmationChoice {
        self.asked.lock().unwrap().push(task_id.to_string());
        self.choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfirmationChoice::Continue)
    }
}

struct Harness {
    board: TaskBoard,
    clock: ManualClock,
    backend: SharedBackend,
    prompt: ScriptedPrompt,
}

fn harness() -> Harness {
    let clock = ManualClock::new(0);
    let backend = SharedBackend(Arc::new(MemoryBackend::new()));
    let prompt = ScriptedPrompt::default();
    let board = TaskBoard::new(
        Box::new(clock.clone()),
        Box::new(backend.clone()),
        Box::new(prompt.clone()),
    );
    Harness {
        board,
        clock,
        backend,
        prompt,
    }
}

/// Advance wall clock and tick once, `n` times.
fn run_seconds(h: &mut Harness, n: u64) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..n {
        h.clock.advance_secs(1);
        events.extend(h.board.tick());
    }
    events
}

#[test]
fn switching_tasks_persists_in_flight_time_exactly() {
    let mut h = harness();
    let a = h.board.add_task("alpha", 1, 0).unwrap();
    let b = h.board.add_task("beta", 1, 0).unwrap();

    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(25, 5, Some(2)).unwrap();
    run_seconds(&mut h, 30);

    h.board.select_task(&b).unwrap();

    assert_eq!(h.backend.0.focused_seconds(&a), Some(30));
    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 30);
    // No segment is accruing for anyone until B starts.
    assert_eq!(h.board.state().tracker.active_task(), None);

    h.board.pomodoro_start(25, 5, Some(1)).unwrap();
    assert_eq!(h.board.state().tracker.active_task(), Some(b.as_str()));
    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 30);
}

#[test]
fn switch_back_restores_suspended_run_paused() {
    let mut h = harness();
    let a = h.board.add_task("alpha", 1, 0).unwrap();
    let b = h.board.add_task("beta", 1, 0).unwrap();

    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(25, 5, Some(2)).unwrap();
    run_seconds(&mut h, 100);

    h.board.select_task(&b).unwrap();
    let event = h.board.select_task(&a).unwrap();
    match event {
        Event::TaskSwitched { restored, .. } => assert!(restored),
        other => panic!("expected TaskSwitched, got {other:?}"),
    }
    assert_eq!(h.board.scheduler_state(), CycleState::FocusPaused);
    assert_eq!(
        h.board.state().scheduler.remaining_seconds(),
        25 * 60 - 100
    );

    // Resuming picks the countdown and the accrual back up.
    h.board.pomodoro_resume().unwrap();
    run_seconds(&mut h, 10);
    assert_eq!(h.board.live_focused_seconds(&a), 110);
}

#[test]
fn reset_undoes_only_the_last_segment() {
    let mut h = harness();
    let a = h.board.add_task("alpha", 1, 0).unwrap();
    h.board.select_task(&a).unwrap();

    // First segment: 100s, persisted on pause.
    h.board.pomodoro_start(25, 5, Some(2)).unwrap();
    run_seconds(&mut h, 100);
    h.board.pomodoro_pause().unwrap();
    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 100);

    // Second segment: 20s, then reset.
    h.board.pomodoro_resume().unwrap();
    run_seconds(&mut h, 20);
    let event = h.board.pomodoro_reset().unwrap();
    match event {
        Event::SessionReset { undone_secs, .. } => assert_eq!(undone_secs, 20),
        other => panic!("expected SessionReset, got {other:?}"),
    }

    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 100);
    assert_eq!(h.backend.0.focused_seconds(&a), Some(100));
    assert_eq!(h.board.scheduler_state(), CycleState::Idle);
}

#[test]
fn oversized_focus_duration_is_rejected_loudly() {
    let mut h = harness();
    // 10-minute budget.
    let a = h.board.add_task("short", 0, 10).unwrap();
    h.board.select_task(&a).unwrap();

    let err = h.board.pomodoro_start(20, 5, Some(1)).unwrap_err();
    match err {
        CoreError::Validation(ValidationError::FocusExceedsBudget {
            focus_seconds,
            remaining_seconds,
        }) => {
            assert_eq!(focus_seconds, 1200);
            assert_eq!(remaining_seconds, 600);
        }
        other => panic!("expected FocusExceedsBudget, got {other}"),
    }
    assert_eq!(h.board.scheduler_state(), CycleState::Idle);
}

#[test]
fn unset_cycle_count_takes_the_auto_suggestion() {
    let mut h = harness();
    // 25-minute budget, 10-minute focus segments -> 2 cycles.
    let a = h.board.add_task("alpha", 0, 25).unwrap();
    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(10, 2, None).unwrap();
    assert_eq!(h.board.state().scheduler.total_cycles(), 2);
}

#[test]
fn full_cycle_run_caps_final_focus_to_remaining_budget() {
    let mut h = harness();
    // 30-minute task, 25+5 run.
    let a = h.board.add_task("report", 0, 30).unwrap();
    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(25, 5, Some(2)).unwrap();

    // 25:00 of focus.
    let events = run_seconds(&mut h, 25 * 60);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::BreakStarted { cycle_index: 1, .. })));
    assert_eq!(h.board.scheduler_state(), CycleState::BreakRunning);
    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 1500);
    assert_eq!(h.backend.0.focused_seconds(&a), Some(1500));

    // 5:00 of break; cycle 2 begins capped at the 300s of budget left.
    let events = run_seconds(&mut h, 5 * 60);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CycleAdvanced { cycle_index: 2, .. })));
    assert_eq!(h.board.scheduler_state(), CycleState::FocusRunning);
    assert_eq!(h.board.state().scheduler.remaining_seconds(), 300);
}

#[test]
fn crossing_confirms_exactly_once_per_episode() {
    let mut h = harness();
    // 1-minute budget.
    let a = h.board.add_task("tiny", 0, 1).unwrap();
    h.board.select_task(&a).unwrap();
    h.prompt.push(ConfirmationChoice::Continue);
    h.board.pomodoro_start(1, 1, Some(2)).unwrap();

    // Run well past the crossing.
    run_seconds(&mut h, 90);
    assert_eq!(h.prompt.asked(), vec![a.clone()]);
    assert!(h.board.task(&a).unwrap().overdue_notified);
    assert_eq!(
        h.board.task(&a).unwrap().overdue_baseline_seconds,
        Some(60)
    );

    // Reset re-arms the episode; the next crossing asks again.
    h.board.pomodoro_reset().unwrap();
    assert!(!h.board.task(&a).unwrap().overdue_notified);
}

#[test]
fn mark_complete_resolution_completes_and_clears_episode() {
    let mut h = harness();
    let a = h.board.add_task("tiny", 0, 1).unwrap();
    h.board.select_task(&a).unwrap();
    h.prompt.push(ConfirmationChoice::MarkComplete);
    h.board.pomodoro_start(1, 1, Some(1)).unwrap();

    run_seconds(&mut h, 70);
    let task = h.board.task(&a).unwrap();
    assert!(task.completed);
    assert!(!task.overdue_notified);
    assert_eq!(task.overdue_baseline_seconds, None);
    assert_eq!(h.backend.0.is_completed(&a), Some(true));
    // Completed task is out of session processing entirely.
    assert_eq!(h.board.scheduler_state(), CycleState::Idle);
    run_seconds(&mut h, 30);
    assert_eq!(h.prompt.asked().len(), 1);
}

#[test]
fn deleting_the_active_task_silences_later_ticks() {
    let mut h = harness();
    let a = h.board.add_task("gone", 0, 5).unwrap();
    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(5, 1, Some(1)).unwrap();
    run_seconds(&mut h, 10);

    h.board.delete_task(&a).unwrap();
    assert_eq!(h.board.active_task(), None);
    // Ticks after deletion are clean no-ops.
    let events = run_seconds(&mut h, 10);
    assert!(events.is_empty());
    assert!(h.board.task(&a).is_none());
}

#[test]
fn break_time_is_never_counted_as_focus() {
    let mut h = harness();
    let a = h.board.add_task("alpha", 0, 10).unwrap();
    h.board.select_task(&a).unwrap();
    h.board.pomodoro_start(1, 5, Some(2)).unwrap();

    // One focus minute, then deep into the break.
    run_seconds(&mut h, 60 + 120);
    assert_eq!(h.board.scheduler_state(), CycleState::BreakRunning);
    assert_eq!(h.board.task(&a).unwrap().focused_seconds, 60);
    assert_eq!(h.board.live_focused_seconds(&a), 60);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        SelectA,
        SelectB,
        Start,
        Pause,
        Resume,
        Skip,
        Reset,
        Tick,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::SelectA),
            Just(Op::SelectB),
            Just(Op::Start),
            Just(Op::Pause),
            Just(Op::Resume),
            Just(Op::Skip),
            Just(Op::Reset),
            Just(Op::Tick),
        ]
    }

    proptest! {
        /// For any command sequence, at most one task has an accruing
        /// segment, and it is always the selected task.
        #[test]
        fn at_most_one_active_segment(ops in proptest::collection::vec(op_strategy(), 1..120)) {
            let mut h = harness();
            let a = h.board.add_task("alpha", 1, 0).unwrap();
            let b = h.board.add_task("beta", 1, 0).unwrap();

            for op in ops {
                let _ = match op {
                    Op::SelectA => h.board.select_task(&a).map(|_| ()),
                    Op::SelectB => h.board.select_task(&b).map(|_| ()),
                    Op::Start => h.board.pomodoro_start(5, 1, Some(2)).map(|_| ()),
                    Op::Pause => h.board.pomodoro_pause().map(|_| ()),
                    Op::Resume => h.board.pomodoro_resume().map(|_| ()),
                    Op::Skip => h.board.pomodoro_skip().map(|_| ()),
                    Op::Reset => h.board.pomodoro_reset().map(|_| ()),
                    Op::Tick => {
                        h.clock.advance_secs(1);
                        h.board.tick();
                        Ok(())
                    }
                };
                let accruing = h.board.state().tracker.active_task();
                if let Some(task_id) = accruing {
                    prop_assert_eq!(Some(task_id), h.board.active_task());
                }
            }
        }
    }
}
