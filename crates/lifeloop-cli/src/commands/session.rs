use chrono::Utc;
use clap::Subcommand;

use super::{open_session, print_json};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Sign in as a user id
    Login {
        /// User id the remote backend filters by
        user_id: String,
    },
    /// Sign out and clear scheduled notifications
    Logout,
    /// Show the signed-in user and cached collection sizes
    Status,
    /// Refresh every collection from the remote backend
    Refresh,
}

pub async fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session().await?;

    match action {
        SessionAction::Login { user_id } => {
            session.sign_in(&user_id, Utc::now()).await?;
            println!("signed in as {user_id}");
        }
        SessionAction::Logout => {
            session.sign_out(Utc::now()).await?;
            println!("signed out");
        }
        SessionAction::Status => {
            let state = session.state();
            print_json(&serde_json::json!({
                "userId": session.user_id(),
                "habits": state.habits.len(),
                "routines": state.routines.len(),
                "tasks": state.tasks.len(),
                "transactions": state.transactions.len(),
            }))?;
        }
        SessionAction::Refresh => {
            let report = session.refresh(Utc::now()).await?;
            print_json(&report)?;
        }
    }
    Ok(())
}
