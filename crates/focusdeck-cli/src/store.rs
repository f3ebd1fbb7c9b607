//! Board persistence between CLI invocations.
//!
//! The board's serializable state is kept as a JSON snapshot in the user
//! data directory; each invocation rebuilds the board from it, applies
//! one command, and writes it back. `FOCUSDECK_STATE` and
//! `FOCUSDECK_CONFIG` override the paths for scripting and tests.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use focusdeck_core::backend::{ConfirmationChoice, NotifyCategory, UserPrompt};
use focusdeck_core::{
    BoardState, Config, HttpBackend, MemoryBackend, SystemClock, TaskBackend, TaskBoard,
};

const STATE_ENV: &str = "FOCUSDECK_STATE";
const CONFIG_ENV: &str = "FOCUSDECK_CONFIG";

pub fn state_path() -> PathBuf {
    if let Ok(path) = std::env::var(STATE_ENV) {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("focusdeck")
        .join("board.json")
}

pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => PathBuf::from(path),
        Err(_) => Config::default_path(),
    }
}

pub fn load_config() -> Result<Config, Box<dyn Error>> {
    Ok(Config::load_from(&config_path())?)
}

/// Load the persisted board state; a missing or unreadable snapshot
/// starts fresh.
pub fn load_state() -> BoardState {
    match std::fs::read_to_string(state_path()) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => BoardState::default(),
    }
}

pub fn save_state(state: &BoardState) -> Result<(), Box<dyn Error>> {
    let path = state_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

/// Rebuild the board: persisted state, the wall clock, and the backend
/// the config selects. Without a base URL the in-memory backend is
/// re-seeded from the stored tasks so persist calls can recompute
/// overdue values against their plans.
pub fn open_board() -> Result<TaskBoard, Box<dyn Error>> {
    let config = load_config()?;
    let state = load_state();
    let backend: Box<dyn TaskBackend> = match &config.backend.base_url {
        Some(url) => Box::new(HttpBackend::new(url)?),
        None => {
            let memory = MemoryBackend::new();
            for task in state.tasks.iter() {
                memory.register_task(&task.id, task.planned_seconds);
            }
            Box::new(memory)
        }
    };
    Ok(TaskBoard::from_state(
        state,
        Box::new(SystemClock),
        backend,
        Box::new(ConsolePrompt),
    ))
}

/// Terminal prompt: notifications to stderr, confirmations from stdin.
pub struct ConsolePrompt;

impl UserPrompt for ConsolePrompt {
    fn request_confirmation(&self, _task_id: &str, message: &str) -> ConfirmationChoice {
        eprint!("{message} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return ConfirmationChoice::Continue;
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => ConfirmationChoice::MarkComplete,
            _ => ConfirmationChoice::Continue,
        }
    }

    fn notify(&self, title: &str, body: &str, _category: NotifyCategory) {
        eprintln!("{title} {body}");
    }
}
