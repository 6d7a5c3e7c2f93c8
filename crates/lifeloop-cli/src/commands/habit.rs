use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use lifeloop_core::Recurrence;

use super::{open_session, print_json};

#[derive(Clone, Copy, ValueEnum)]
pub enum CadenceArg {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Habit title
        title: String,
        /// Category label
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long, value_enum, default_value = "daily")]
        cadence: CadenceArg,
        /// Weekday codes for weekly habits (e.g. Mon,Wed,Fri)
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
        /// Day of month for monthly habits
        #[arg(long)]
        day_of_month: Option<u32>,
        /// Reminder time (HH:mm)
        #[arg(long)]
        time: Option<String>,
    },
    /// List habits
    List,
    /// Toggle today's completion
    Toggle {
        /// Habit ID
        id: String,
    },
    /// Delete a habit
    Remove {
        /// Habit ID
        id: String,
    },
    /// Best streak and counters that disagree with the completion log
    Streaks,
}

pub async fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session().await?;
    let now = Utc::now();

    match action {
        HabitAction::Add {
            title,
            category,
            cadence,
            days,
            day_of_month,
            time,
        } => {
            let recurrence = match cadence {
                CadenceArg::Daily => Recurrence::daily(),
                CadenceArg::Weekly => Recurrence::weekly(days),
                CadenceArg::Monthly => Recurrence::monthly(day_of_month.ok_or("--day-of-month is required for monthly habits")?),
            };
            let habit = session
                .add_habit(&title, &category, recurrence, time.as_deref(), now)
                .await?;
            println!("Habit created: {}", habit.id);
        }
        HabitAction::List => {
            print_json(&session.state().habits)?;
        }
        HabitAction::Toggle { id } => {
            let habit = session.toggle_habit(&id, now).await?;
            let done = session.is_completed_today(&id, now);
            println!(
                "{}: {} (streak {})",
                habit.title,
                if done { "done today" } else { "not done today" },
                habit.streak
            );
        }
        HabitAction::Remove { id } => {
            let habit = session.remove_habit(&id, now).await?;
            println!("Habit removed: {}", habit.title);
        }
        HabitAction::Streaks => {
            print_json(&serde_json::json!({
                "best": session.best_streak(),
                "drift": session.streak_drift(now),
            }))?;
        }
    }
    Ok(())
}
