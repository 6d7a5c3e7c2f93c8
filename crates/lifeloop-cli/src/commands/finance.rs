use clap::{Subcommand, ValueEnum};
use lifeloop_core::summary::{expenses_by_category, summary_for_month};
use lifeloop_core::{DayKey, EntryKind, LedgerEntry};

use super::{day_or_today, open_session, print_json};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

#[derive(Subcommand)]
pub enum FinanceAction {
    /// Record an income or expense
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        /// Amount (non-negative)
        amount: f64,
        category: String,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Day (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Income, expenses and balance for one day
    Day {
        #[arg(long)]
        date: Option<String>,
    },
    /// Income, expenses and balance for a calendar month
    Month { year: i32, month: u32 },
    /// Expense totals per category over a day range
    Categories {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

pub async fn run(action: FinanceAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session().await?;

    match action {
        FinanceAction::Add {
            kind,
            amount,
            category,
            currency,
            date,
        } => {
            let day = day_or_today(&session, date.as_deref())?;
            let kind = match kind {
                KindArg::Income => EntryKind::Income,
                KindArg::Expense => EntryKind::Expense,
            };
            let entry = LedgerEntry::new(kind, amount, &category, &currency, &day.to_string())?;
            let entry = session.add_transaction(entry)?;
            println!("Entry recorded: {}", entry.id);
        }
        FinanceAction::Day { date } => {
            let day = day_or_today(&session, date.as_deref())?;
            print_json(&session.summary_for_day(day))?;
        }
        FinanceAction::Month { year, month } => {
            print_json(&summary_for_month(&session.state().transactions, year, month))?;
        }
        FinanceAction::Categories { from, to } => {
            let from = DayKey::parse(&from).ok_or_else(|| format!("unrecognized date: {from}"))?;
            let to = DayKey::parse(&to).ok_or_else(|| format!("unrecognized date: {to}"))?;
            print_json(&expenses_by_category(&session.state().transactions, from, to))?;
        }
    }
    Ok(())
}
