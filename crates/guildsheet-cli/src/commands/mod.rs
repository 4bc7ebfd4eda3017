//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod member;
pub mod roster;
pub mod serve;

use std::sync::Arc;

use guildsheet_server::{RefreshTrigger, RosterCache, RosterConfig, RosterService};
use guildsheet_sheets::google::{GoogleCredentialStore, GoogleSheets};

use crate::config::GuildConfig;
use crate::error::{CliError, CliResult};

/// The Google backend wired into a roster cache and service.
pub struct Backend {
    pub credentials: Arc<GoogleCredentialStore>,
    pub cache: Arc<RosterCache>,
    pub service: RosterService,
    pub roster: RosterConfig,
}

impl Backend {
    pub fn connect(config: &GuildConfig) -> CliResult<Self> {
        let google = config.google_config().map_err(CliError::Config)?;
        let roster = config.roster_config();
        roster.validate()?;

        let sheets = GoogleSheets::connect(&google)?;
        let credentials = sheets.credentials();
        let gateway = sheets.gateway();
        let cache = Arc::new(RosterCache::new(gateway.clone(), roster.schema.clone()));
        let service = RosterService::new(cache.clone(), gateway, credentials.clone());

        Ok(Self {
            credentials,
            cache,
            service,
            roster,
        })
    }

    /// Connects and loads the roster once. One-shot commands surface a
    /// failed load instead of working on an empty roster.
    pub async fn loaded(config: &GuildConfig) -> CliResult<Self> {
        let backend = Self::connect(config)?;
        backend.cache.try_refresh(RefreshTrigger::Manual).await?;
        Ok(backend)
    }
}
