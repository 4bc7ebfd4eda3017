//! Refresh daemon.
//!
//! Keeps a roster cache warm until SIGTERM or SIGINT. SIGHUP forces an
//! immediate refresh.

use guildsheet_server::{SignalListener, run_until_shutdown};
use tracing::info;

use crate::commands::Backend;
use crate::config::GuildConfig;
use crate::error::CliResult;

pub async fn run(config: &GuildConfig) -> CliResult<()> {
    let backend = Backend::connect(config)?;
    let signals = SignalListener::install()?;

    info!(
        members_sheet = %backend.roster.schema.members_sheet,
        interval_secs = backend.roster.refresh_interval.as_secs(),
        "starting roster refresh"
    );
    run_until_shutdown(backend.cache.clone(), &backend.roster, signals).await;
    Ok(())
}
