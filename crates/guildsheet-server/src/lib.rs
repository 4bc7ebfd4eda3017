//! Roster service: the in-process member cache, its periodic refresh and
//! the write-through mutations.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use guildsheet_server::{RefreshTrigger, RosterCache, RosterConfig, RosterService};
//!
//! let config = RosterConfig::default();
//! let cache = Arc::new(RosterCache::new(gateway.clone(), config.schema.clone()));
//! cache.refresh(RefreshTrigger::Manual).await;
//!
//! let service = RosterService::new(cache, gateway, credentials);
//! service.update_mood_phrase("U1234", "back tomorrow").await?;
//! ```

mod cache;
mod config;
mod daemon;
mod error;
mod scheduler;
mod service;
mod signals;

#[cfg(test)]
mod testing;

pub use cache::{RefreshTrigger, RosterCache, RosterSnapshot, build_roster};
pub use config::{RosterConfig, RosterSchema};
pub use daemon::{run_until_shutdown, spawn_refresh_loop};
pub use error::{RosterError, RosterErrorCode, RosterResult};
pub use scheduler::{
    RunReason, Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use service::RosterService;
pub use signals::{Signal, SignalListener};
