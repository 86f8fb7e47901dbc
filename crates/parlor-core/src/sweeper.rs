//! Expiration sweeper background task.
//!
//! Periodically evicts participants whose last heartbeat is older than the
//! inactivity timeout:
//! 1. Finds participants last seen at or before `now - timeout`
//! 2. Emits one departure status message per participant, in one batch
//! 3. Deletes participants matching the same cutoff filter
//!
//! Steps 1 to 3 are not atomic against heartbeats. Because the delete
//! re-evaluates the cutoff filter, a participant refreshed in between keeps
//! its presence; at worst a spurious departure notice is recorded.
//!
//! # Graceful Shutdown
//!
//! The task exits when its cancellation token is cancelled. A cycle that
//! fails is logged and the task waits for the next tick.

use crate::clock::Clock;
use crate::error::ChatError;
use crate::router::MessageRouter;
use parlor_protocol::DEPARTURE_NOTICE;
use parlor_store::{ParticipantFilter, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default time between sweep cycles (15 seconds).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15);

/// Default inactivity before eviction (10 seconds).
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the expiration sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between sweep cycles.
    pub interval: Duration,
    /// Inactivity after which a participant is evicted.
    pub inactivity_timeout: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
        }
    }
}

/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Cutoff used by the cycle (ms since the Unix epoch).
    pub cutoff: u64,
    /// Participants given a departure notice. Can exceed `removed` when a
    /// heartbeat lands between the find and the delete.
    pub announced: Vec<String>,
    /// Participants actually deleted.
    pub removed: u64,
}

/// Evicts inactive participants.
#[derive(Debug, Clone)]
pub struct ExpirationSweeper {
    store: Store,
    router: MessageRouter,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
}

impl ExpirationSweeper {
    /// Create a sweeper.
    #[must_use]
    pub fn new(
        store: Store,
        router: MessageRouter,
        clock: Arc<dyn Clock>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            store,
            router,
            clock,
            config,
        }
    }

    /// The sweeper configuration.
    #[must_use]
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Run a single sweep cycle now.
    ///
    /// # Errors
    ///
    /// Returns `Store` if any store call fails. Nothing is retried.
    pub async fn run_cycle(&self) -> Result<SweepReport, ChatError> {
        let timeout_ms = self.config.inactivity_timeout.as_millis() as u64;
        let cutoff = self.clock.now_millis().saturating_sub(timeout_ms);
        let filter = ParticipantFilter::stale_at(cutoff);

        let stale = self.store.participants.find_all(&filter).await?;
        if stale.is_empty() {
            debug!(cutoff, "Sweep found no inactive participants");
            return Ok(SweepReport {
                cutoff,
                ..SweepReport::default()
            });
        }

        let announced: Vec<String> = stale.into_iter().map(|p| p.name).collect();
        self.router
            .emit_statuses(announced.iter().cloned(), DEPARTURE_NOTICE)
            .await?;
        let removed = self.store.participants.delete_many(&filter).await?;

        if removed < announced.len() as u64 {
            debug!(
                announced = announced.len(),
                removed,
                "Some participants refreshed during the sweep"
            );
        }

        info!(cutoff, removed, participants = ?announced, "Evicted inactive participants");
        Ok(SweepReport {
            cutoff,
            announced,
            removed,
        })
    }

    /// Run sweep cycles until cancelled.
    pub async fn run(self, cancel_token: CancellationToken) {
        self.run_with(cancel_token, |_| {}).await;
    }

    /// Run sweep cycles until cancelled, passing each outcome to `on_cycle`.
    #[instrument(skip_all, name = "parlor.task.sweeper")]
    pub async fn run_with<F>(self, cancel_token: CancellationToken, mut on_cycle: F)
    where
        F: FnMut(Result<&SweepReport, &ChatError>) + Send,
    {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            inactivity_timeout_ms = self.config.inactivity_timeout.as_millis() as u64,
            "Starting expiration sweeper"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_cycle().await {
                        Ok(report) => on_cycle(Ok(&report)),
                        Err(e) => {
                            warn!(error = %e, "Sweep cycle failed, waiting for next cycle");
                            on_cycle(Err(&e));
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("Expiration sweeper received shutdown signal, exiting");
                    break;
                }
            }
        }

        info!("Expiration sweeper stopped");
    }

    /// Spawn the sweep loop on the current runtime.
    pub fn spawn(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel_token))
    }
}
