//! Long-running refresh loop driven by process signals.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{RefreshTrigger, RosterCache};
use crate::config::RosterConfig;
use crate::scheduler::{RunReason, Scheduler, SchedulerConfig, SchedulerHandle};
use crate::signals::{Signal, SignalListener};

/// Starts refreshing `cache` now and then every `config.refresh_interval`.
pub fn spawn_refresh_loop(
    cache: Arc<RosterCache>,
    config: &RosterConfig,
) -> (SchedulerHandle, JoinHandle<()>) {
    let scheduler = Scheduler::new(SchedulerConfig::new(config.refresh_interval));
    let handle = scheduler.handle();
    let task = tokio::spawn(scheduler.run(move |reason| {
        let cache = cache.clone();
        async move {
            let trigger = match reason {
                RunReason::Startup | RunReason::Interval => RefreshTrigger::Scheduled,
                RunReason::Requested => RefreshTrigger::Manual,
            };
            cache.refresh(trigger).await;
        }
    }));
    (handle, task)
}

/// Runs the refresh loop until a shutdown signal arrives.
pub async fn run_until_shutdown(
    cache: Arc<RosterCache>,
    config: &RosterConfig,
    mut signals: SignalListener,
) {
    let (handle, task) = spawn_refresh_loop(cache, config);

    loop {
        match signals.next().await {
            Signal::Refresh => handle.refresh_now().await,
            Signal::Shutdown => break,
        }
    }

    handle.stop().await;
    if let Err(e) = task.await {
        warn!(error = %e, "refresh loop ended abnormally");
    }
    info!("refresh loop stopped");
}
