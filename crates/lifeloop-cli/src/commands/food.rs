use chrono::Utc;
use clap::Subcommand;
use lifeloop_core::summary::nutrition_totals;

use super::{day_or_today, open_session, print_json};

#[derive(Subcommand)]
pub enum FoodAction {
    /// Log a food entry
    Log {
        name: String,
        calories: u32,
        /// Day (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a food entry by its position in `show` output
    Remove {
        index: usize,
        #[arg(long)]
        date: Option<String>,
    },
    /// Add water in millilitres
    Water {
        ml: u32,
        #[arg(long)]
        date: Option<String>,
    },
    /// Rate last night's sleep (1-5)
    Sleep {
        quality: u8,
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a day's record and totals
    Show {
        #[arg(long)]
        date: Option<String>,
    },
    /// Merge the remote log for a day into the local one
    Sync {
        #[arg(long)]
        date: Option<String>,
    },
}

pub async fn run(action: FoodAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session().await?;

    match action {
        FoodAction::Log { name, calories, date } => {
            let day = day_or_today(&session, date.as_deref())?;
            let record = session.log_food(day, &name, calories, Utc::now()).await?;
            println!("{day}: {} kcal", record.calories);
        }
        FoodAction::Remove { index, date } => {
            let day = day_or_today(&session, date.as_deref())?;
            let identity = session
                .day_record(day)
                .foods
                .get(index)
                .map(|entry| entry.identity())
                .ok_or_else(|| format!("no food entry at index {index} on {day}"))?;
            let record = session.remove_food(day, &identity).await;
            println!("{day}: {} kcal", record.calories);
        }
        FoodAction::Water { ml, date } => {
            let day = day_or_today(&session, date.as_deref())?;
            let record = session.log_water(day, ml).await;
            println!("{day}: {} ml water", record.water_ml);
        }
        FoodAction::Sleep { quality, date } => {
            let day = day_or_today(&session, date.as_deref())?;
            session.rate_sleep(day, quality).await?;
            println!("{day}: sleep rated {quality}");
        }
        FoodAction::Show { date } => {
            let day = day_or_today(&session, date.as_deref())?;
            let record = session.day_record(day);
            print_json(&serde_json::json!({
                "record": record,
                "totals": nutrition_totals(&record),
            }))?;
        }
        FoodAction::Sync { date } => {
            let day = day_or_today(&session, date.as_deref())?;
            let record = session.reconcile_day(day).await;
            print_json(&record)?;
        }
    }
    Ok(())
}
