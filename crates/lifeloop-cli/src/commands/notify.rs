use chrono::Utc;
use clap::Subcommand;

use super::{open_session, print_json};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List the triggers a scheduling pass would register, with next fire times
    Plan,
    /// Run a full scheduling pass against the recording backend
    Reschedule,
}

pub async fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session().await?;
    let now = Utc::now();

    match action {
        NotifyAction::Plan => {
            let offset = session.offset();
            let state = session.state();
            let snapshot = lifeloop_core::ScheduleSnapshot {
                habits: &state.habits,
                routines: &state.routines,
                events: &state.tasks,
            };
            let planned: Vec<_> = session
                .scheduler()
                .plan(&snapshot, now)
                .into_iter()
                .map(|intent| {
                    serde_json::json!({
                        "tag": intent.tag,
                        "title": intent.title,
                        "body": intent.body,
                        "trigger": intent.trigger,
                        "nextFire": intent.trigger.next_fire(now, offset),
                    })
                })
                .collect();
            print_json(&planned)?;
        }
        NotifyAction::Reschedule => {
            let report = session.try_reschedule(now).await?;
            print_json(&report)?;
        }
    }
    Ok(())
}
