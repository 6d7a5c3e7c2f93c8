use chrono::Utc;
use clap::Subcommand;
use lifeloop_core::EventKind;

use super::{open_session, print_json};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task
    Add {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Due time (HH:mm)
        #[arg(long)]
        time: Option<String>,
        /// Create a one-off reminder instead of a task
        #[arg(long)]
        reminder: bool,
    },
    /// List all tasks
    List,
    /// Incomplete tasks due soonest
    Upcoming {
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Toggle a task's completed flag
    Done {
        /// Task ID
        id: String,
    },
}

pub async fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session().await?;
    let now = Utc::now();

    match action {
        TaskAction::Add {
            title,
            date,
            time,
            reminder,
        } => {
            let kind = if reminder { EventKind::Reminder } else { EventKind::Task };
            let task = session
                .add_task(kind, &title, date.as_deref(), time.as_deref(), now)
                .await?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List => {
            print_json(&session.state().tasks)?;
        }
        TaskAction::Upcoming { limit } => {
            let upcoming: Vec<_> = session
                .upcoming_tasks(now, limit)
                .into_iter()
                .map(|(due, task)| {
                    serde_json::json!({
                        "id": task.id,
                        "title": task.title,
                        "kind": task.kind,
                        "due": due,
                    })
                })
                .collect();
            print_json(&upcoming)?;
        }
        TaskAction::Done { id } => {
            let task = session.complete_task(&id, now).await?;
            println!("{}: completed = {}", task.title, task.completed);
        }
    }
    Ok(())
}
