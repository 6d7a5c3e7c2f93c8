//! Tracing subscriber setup for binaries embedding the engine.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `lifeloop_core=debug`.
pub const LOG_ENV: &str = "LIFELOOP_LOG";

/// Filter from `LIFELOOP_LOG`, falling back to `default_level` for the engine
/// crates and `warn` for everything else.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,lifeloop_core={default_level},lifeloop_cli={default_level}"
        ))
    })
}

/// Install a stderr fmt subscriber. Calling it again is a no-op.
pub fn init(default_level: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("logging initialized");
    }
}
