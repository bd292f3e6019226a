//! Background sweep of idle rate limit keys.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::memory::SlidingWindowRateLimiter;

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps. Should be much longer than any limit window.
    pub interval: Duration,
    /// How long a key's log must have been empty before it is dropped.
    pub grace: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            grace: Duration::from_secs(600),
        }
    }
}

impl SweepConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("RATE_LIMIT_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            grace: std::env::var("RATE_LIMIT_SWEEP_GRACE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.grace),
        }
    }
}

/// Owns a running sweeper task. Dropping the handle stops the task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Rate limit sweeper panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start sweeping `limiter` every `config.interval` on the current runtime.
pub fn spawn_sweeper(limiter: Arc<SlidingWindowRateLimiter>, config: SweepConfig) -> SweeperHandle {
    let (tx, mut rx) = watch::channel(false);
    let grace_ms = config.grace.as_millis() as u64;

    let task = tokio::spawn(async move {
        tracing::info!(
            interval_secs = config.interval.as_secs(),
            grace_secs = config.grace.as_secs(),
            "Rate limit sweeper started"
        );

        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    limiter.sweep(grace_ms);
                }
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Rate limit sweeper stopped");
    });

    SweeperHandle {
        shutdown: tx,
        task: Some(task),
    }
}
