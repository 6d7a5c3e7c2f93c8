use chrono::Utc;
use clap::Subcommand;

use super::{open_session, print_json};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Create a routine
    Add {
        title: String,
        /// Start time (HH:mm)
        #[arg(long)]
        time: Option<String>,
        /// Weekday codes (e.g. Mon,Tue); empty means every day
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
    },
    /// List routines with their steps
    List,
    /// Append a step to a routine
    Step {
        /// Routine ID
        routine: String,
        /// Step title
        title: String,
    },
    /// Remove a step from a routine
    Unstep {
        routine: String,
        /// Step ID
        step: String,
    },
    /// Reorder steps; pass every step ID in the new order
    Reorder {
        routine: String,
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

pub async fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session().await?;

    match action {
        RoutineAction::Add { title, time, days } => {
            let routine = session
                .add_routine(&title, time.as_deref(), days, Utc::now())
                .await?;
            println!("Routine created: {}", routine.id);
        }
        RoutineAction::List => {
            print_json(&session.state().routines)?;
        }
        RoutineAction::Step { routine, title } => {
            let routine = session.add_routine_task(&routine, &title, Utc::now()).await?;
            print_json(&routine.tasks)?;
        }
        RoutineAction::Unstep { routine, step } => {
            let routine = session.remove_routine_task(&routine, &step, Utc::now()).await?;
            print_json(&routine.tasks)?;
        }
        RoutineAction::Reorder { routine, steps } => {
            let routine = session.reorder_routine(&routine, &steps, Utc::now()).await?;
            print_json(&routine.tasks)?;
        }
    }
    Ok(())
}
