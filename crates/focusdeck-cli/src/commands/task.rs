//! Task management commands for CLI.

use clap::Subcommand;

use crate::store;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task with a planned duration
    Add {
        /// Task text
        text: String,
        /// Planned hours
        #[arg(long, default_value = "0")]
        hours: u64,
        /// Planned minutes
        #[arg(long, default_value = "25")]
        minutes: u64,
    },
    /// List tasks as JSON
    List,
    /// Select the task that focus time accrues against
    Select {
        /// Task ID
        id: String,
    },
    /// Toggle a task's completion
    Done {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = store::open_board()?;

    match action {
        TaskAction::Add {
            text,
            hours,
            minutes,
        } => {
            let id = board.add_task(&text, hours, minutes)?;
            println!("Task created: {id}");
        }
        TaskAction::List => {
            let mut tasks: Vec<_> = board.tasks().iter().collect();
            tasks.sort_by(|a, b| a.id.cmp(&b.id));
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Select { id } => {
            let event = board.select_task(&id)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TaskAction::Done { id } => {
            board.toggle_done(&id)?;
            println!("Task toggled: {id}");
        }
        TaskAction::Delete { id } => {
            board.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
    }

    store::save_state(board.state())?;
    Ok(())
}
