//! Periodic expiry of cached cooldown windows.
//!
//! The sweeper calls [`CooldownTracker::expire`] on a fixed interval so the
//! window cache does not grow with every actor that ever placed an item.

use crate::application::{
    ports::{Clock, UsageStore},
    tracker::CooldownTracker,
};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweeperConfigError {
    /// Sweep interval duration must be greater than zero
    #[error("sweep interval must be greater than 0")]
    ZeroInterval,
}

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl SweeperConfig {
    /// Create a new sweeper config with the specified interval.
    ///
    /// # Errors
    /// Returns `SweeperConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }
}

/// Drives expiry of cached windows on a fixed interval.
pub struct ExpirySweeper<S>
where
    S: UsageStore,
{
    tracker: Arc<CooldownTracker<S>>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
}

impl<S> ExpirySweeper<S>
where
    S: UsageStore,
{
    /// Create a new sweeper.
    pub fn new(tracker: Arc<CooldownTracker<S>>, clock: Arc<dyn Clock>, config: SweeperConfig) -> Self {
        Self {
            tracker,
            clock,
            config,
        }
    }

    /// Expire windows as of the clock's current time.
    pub fn sweep_once(&self) -> usize {
        self.tracker.expire(self.clock.now())
    }

    /// Start sweeping periodically in a background task.
    ///
    /// The first sweep happens one interval after starting. Ticks missed
    /// while the runtime was busy are skipped, not replayed.
    ///
    /// Must be called from within a tokio runtime. The task runs until
    /// [`SweeperHandle::shutdown`] is called or the runtime stops.
    #[cfg(feature = "async")]
    pub fn start(self) -> SweeperHandle
    where
        S: 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);
        let period = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep_once();
                    }
                    _ = stop.notified() => {
                        tracing::debug!("expiry sweeper stopped");
                        break;
                    }
                }
            }
        });

        SweeperHandle { shutdown, task }
    }

    /// Get the sweeper configuration.
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }
}

/// Error returned when the sweeper task did not shut down cleanly.
#[cfg(feature = "async")]
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// The sweeper task panicked or was aborted
    #[error("sweeper task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Handle to a running sweeper task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown) to stop it.
#[cfg(feature = "async")]
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

#[cfg(feature = "async")]
impl SweeperHandle {
    /// Stop the sweeper and wait for the task to finish.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        // Stores a permit if the task is mid-sweep, so the stop is not lost.
        self.shutdown.notify_one();
        self.task.await?;
        Ok(())
    }

    /// Check if the task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
