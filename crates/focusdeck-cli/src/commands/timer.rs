//! Pomodoro timer commands for CLI.
//!
//! The board is caller-driven at 1 Hz; `timer run` supplies that cadence
//! for a bounded stretch, printing every event it produces. The other
//! subcommands apply a single command and print the resulting event.

use std::time::Duration;

use clap::Subcommand;

use crate::store;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a pomodoro run on the selected task
    Start {
        /// Focus minutes (defaults from config)
        #[arg(long)]
        focus: Option<u64>,
        /// Break minutes (defaults from config)
        #[arg(long = "break")]
        break_minutes: Option<u64>,
        /// Cycle count; omitted means auto-suggested from the plan
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Force the focus/break transition now
    Skip,
    /// Undo the most recent focus segment and drop to idle
    Reset,
    /// Acknowledge a finished run
    Ack,
    /// Print the current board snapshot as JSON
    Status,
    /// Drive the 1 Hz tick loop for a bounded number of seconds
    Run {
        /// How long to run, in seconds
        #[arg(long, default_value = "60")]
        seconds: u64,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = store::load_config()?;
    let mut board = store::open_board()?;

    match action {
        TimerAction::Start {
            focus,
            break_minutes,
            cycles,
        } => {
            let focus = focus.unwrap_or(config.timer.focus_minutes);
            let brk = break_minutes.unwrap_or(config.timer.break_minutes);
            let event = board.pomodoro_start(focus, brk, cycles)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Pause => {
            let event = board.pomodoro_pause()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Resume => {
            let event = board.pomodoro_resume()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Skip => {
            let event = board.pomodoro_skip()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Reset => {
            let event = board.pomodoro_reset()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Ack => {
            board.pomodoro_acknowledge_completion();
            println!("{}", serde_json::to_string_pretty(&board.snapshot())?);
        }
        TimerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&board.snapshot())?);
        }
        TimerAction::Run { seconds } => {
            for _ in 0..seconds {
                std::thread::sleep(Duration::from_secs(1));
                for event in board.tick() {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&board.snapshot())?);
        }
    }

    store::save_state(board.state())?;
    Ok(())
}
