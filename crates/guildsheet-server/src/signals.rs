//! Process signals for the refresh daemon.
//!
//! SIGTERM and SIGINT stop the daemon. SIGHUP asks for an immediate roster
//! refresh. Elsewhere only Ctrl-C is handled.

use std::io;

use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Refresh,
}

/// Receives translated process signals.
#[derive(Debug)]
pub struct SignalListener {
    rx: mpsc::Receiver<Signal>,
}

impl SignalListener {
    /// Installs the handlers and spawns the listener task.
    ///
    /// # Errors
    ///
    /// Fails if a signal handler cannot be registered.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    _ = sigterm.recv() => {
                        info!("received SIGTERM");
                        Signal::Shutdown
                    }
                    _ = sigint.recv() => {
                        info!("received SIGINT");
                        Signal::Shutdown
                    }
                    _ = sighup.recv() => {
                        info!("received SIGHUP, refreshing roster");
                        Signal::Refresh
                    }
                };
                if tx.send(signal).await.is_err() || signal == Signal::Shutdown {
                    break;
                }
            }
            debug!("signal listener stopped");
        });

        Ok(Self { rx })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl-C");
                let _ = tx.send(Signal::Shutdown).await;
            }
        });
        Ok(Self { rx })
    }

    /// A listener fed by the given channel instead of the OS.
    pub fn from_channel(rx: mpsc::Receiver<Signal>) -> Self {
        Self { rx }
    }

    /// Waits for the next signal. A closed listener reads as shutdown.
    pub async fn next(&mut self) -> Signal {
        self.rx.recv().await.unwrap_or(Signal::Shutdown)
    }
}
