pub mod config;
pub mod finance;
pub mod food;
pub mod habit;
pub mod notify;
pub mod routine;
pub mod session;
pub mod task;

use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use lifeloop_core::{CacheDb, Config, ConfiguredRemote, DayKey, RecordingBackend, Session};

/// Session over the on-disk cache. The CLI records notification triggers
/// instead of registering them with the OS.
pub type CliSession = Session<CacheDb, ConfiguredRemote, RecordingBackend>;

/// Open the session and run its startup scheduling pass.
pub async fn open_session() -> Result<CliSession, Box<dyn Error>> {
    let config = Config::load()?;
    let cache = Arc::new(CacheDb::open()?);
    let remote = ConfiguredRemote::from_config(&config)?;
    let offline = remote.is_offline();
    let mut session = Session::start(cache, remote, RecordingBackend::granted(), &config);
    session.resume(Utc::now()).await;
    tracing::debug!(user = ?session.user_id(), offline, "session opened");
    Ok(session)
}

/// Day from an optional user-supplied date, defaulting to today.
pub fn day_or_today(session: &CliSession, date: Option<&str>) -> Result<DayKey, Box<dyn Error>> {
    match date {
        Some(input) => DayKey::parse(input).ok_or_else(|| format!("unrecognized date: {input}").into()),
        None => Ok(session.today(Utc::now())),
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
