//! Periodic roster refresh.
//!
//! The scheduler runs its job once at startup and then on a fixed interval
//! until stopped. A failed run is not retried early; the next tick is the
//! retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
}

impl SchedulerConfig {
    /// Shortest tick period; a zero interval is raised to this.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    fn period(&self) -> Duration {
        self.interval.max(Self::MIN_INTERVAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run the job now, outside the interval.
    RefreshNow,
    /// Skip interval ticks until resumed. Requested runs still happen.
    Pause,
    Resume,
    Stop,
}

/// Why the job is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunReason {
    Startup,
    Interval,
    Requested,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub paused: bool,
    pub runs: u64,
    pub last_run: Option<DateTime<Utc>>,
}

impl SchedulerState {
    fn record_run(&mut self) {
        self.runs += 1;
        self.last_run = Some(Utc::now());
    }
}

pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::default()))
}

pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs `job` at startup and on every tick until stopped.
    ///
    /// Returns once [`SchedulerCommand::Stop`] is received or every handle,
    /// including the scheduler's own, has been dropped.
    pub async fn run<F, Fut>(self, job: F)
    where
        F: Fn(RunReason) -> Fut + Send + Sync,
        Fut: Future<Output = ()> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only external handles keep the loop alive.
        drop(command_tx);

        info!(interval_secs = config.interval.as_secs(), "scheduler started");
        Self::run_job(&state, &job, RunReason::Startup).await;

        // Ticks keep their own deadline; commands never push it back.
        let period = config.period();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if state.read().await.paused {
                        debug!("scheduler paused, skipping tick");
                        continue;
                    }
                    Self::run_job(&state, &job, RunReason::Interval).await;
                }
                cmd = command_rx.recv() => match cmd {
                    Some(SchedulerCommand::RefreshNow) => {
                        debug!("refresh requested");
                        Self::run_job(&state, &job, RunReason::Requested).await;
                    }
                    Some(SchedulerCommand::Pause) => {
                        info!("scheduler paused");
                        state.write().await.paused = true;
                    }
                    Some(SchedulerCommand::Resume) => {
                        info!("scheduler resumed");
                        state.write().await.paused = false;
                    }
                    Some(SchedulerCommand::Stop) | None => {
                        info!("scheduler stopping");
                        break;
                    }
                },
            }
        }
    }

    async fn run_job<F, Fut>(state: &SharedSchedulerState, job: &F, reason: RunReason)
    where
        F: Fn(RunReason) -> Fut,
        Fut: Future<Output = ()>,
    {
        job(reason).await;
        state.write().await.record_run();
    }
}

/// Sends commands to a running [`Scheduler`].
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    async fn send(&self, command: SchedulerCommand) {
        if self.command_tx.send(command).await.is_err() {
            warn!(?command, "scheduler is no longer running");
        }
    }

    pub async fn refresh_now(&self) {
        self.send(SchedulerCommand::RefreshNow).await;
    }

    pub async fn pause(&self) {
        self.send(SchedulerCommand::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(SchedulerCommand::Resume).await;
    }

    pub async fn stop(&self) {
        self.send(SchedulerCommand::Stop).await;
    }

    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.read().await.paused
    }
}
