//! Scheduled retention cleanup.
//!
//! One sweep has two independent best-effort phases:
//! 1. age-based expiry of unreferenced objects in the active storage
//!    backend, via `delete_older_than`
//! 2. deletion of database-tracked records whose explicit `expires_at`
//!    has passed (for callers that keep some objects forever, or expire
//!    them sooner than the blanket policy)
//!
//! A failure in either phase is logged and never aborts the other or the
//! process. The sweeper assumes nothing about concurrent traffic: a
//! delete racing a read resolves to a not-found on the read side.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dropstash_storage::StorageBackend;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

// ============================================================================
// Retention policy
// ============================================================================

/// Blanket retention for unreferenced objects.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;
/// How often the sweeper wakes up.
pub const DEFAULT_INTERVAL_HOURS: u64 = 24;

/// Age limit and schedule for the cleanup job.
#[derive(Clone, Copy, Debug)]
pub struct RetentionPolicy {
    /// Objects older than this are removed from the backend.
    pub max_age: Duration,
    /// Wall-clock interval between sweeps.
    pub interval: std::time::Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
            interval: std::time::Duration::from_secs(DEFAULT_INTERVAL_HOURS * 3600),
        }
    }
}

/// Expiry timestamp for a newly stored record: `None` when the caller
/// asked to retain it indefinitely, otherwise one retention period from
/// now.
pub fn expiry_deadline(keep: bool) -> Option<DateTime<Utc>> {
    if keep {
        None
    } else {
        Some(Utc::now() + Duration::hours(DEFAULT_MAX_AGE_HOURS))
    }
}

// ============================================================================
// Record expiry collaborator
// ============================================================================

/// Store of records carrying their own `expires_at` timestamps.
///
/// Implemented by the database layer. The sweeper only needs a deletion
/// hook: remove everything whose `expires_at` is set and has passed.
#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// Deletes all records with `expires_at <= now`, returning how many
    /// were removed. Records with no `expires_at` never expire.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

#[async_trait]
impl<T: ExpiryStore + ?Sized> ExpiryStore for Arc<T> {
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        (**self).purge_expired(now).await
    }
}

// ============================================================================
// Sweeper
// ============================================================================

enum SweeperCommand {
    Stop,
}

/// Handle for stopping a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    command_tx: mpsc::Sender<SweeperCommand>,
}

impl SweeperHandle {
    pub async fn stop(&self) {
        let _ = self.command_tx.send(SweeperCommand::Stop).await;
    }
}

/// Recurring cleanup job over the active backend and the record store.
pub struct RetentionSweeper<B: StorageBackend, E: ExpiryStore> {
    storage: Arc<B>,
    expiry_store: E,
    policy: RetentionPolicy,
    command_rx: mpsc::Receiver<SweeperCommand>,
}

/// Creates a sweeper and its stop handle.
pub fn create_sweeper<B: StorageBackend, E: ExpiryStore>(
    storage: Arc<B>,
    expiry_store: E,
    policy: RetentionPolicy,
) -> (SweeperHandle, RetentionSweeper<B, E>) {
    let (command_tx, command_rx) = mpsc::channel(8);
    (
        SweeperHandle { command_tx },
        RetentionSweeper {
            storage,
            expiry_store,
            policy,
            command_rx,
        },
    )
}

impl<B: StorageBackend, E: ExpiryStore> RetentionSweeper<B, E> {
    /// Runs the sweep loop until stopped.
    pub async fn run(mut self) {
        info!(
            "retention sweeper started (max age {}h, interval {:?})",
            self.policy.max_age.num_hours(),
            self.policy.interval
        );

        let mut interval = tokio::time::interval(self.policy.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Skip the immediate first tick; the first sweep happens one full
        // interval after startup.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SweeperCommand::Stop) | None => {
                            info!("retention sweeper stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// One sweep. Both phases run even when the other fails.
    pub async fn sweep(&self) {
        match self
            .storage
            .delete_older_than("", self.policy.max_age)
            .await
        {
            Ok(deleted) if !deleted.is_empty() => {
                info!("cleaned up {} expired objects", deleted.len());
            }
            Ok(_) => {}
            Err(e) => error!("object sweep failed: {e}"),
        }

        match self.expiry_store.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => info!("cleaned up {purged} expired records"),
            Err(e) => error!("record expiry sweep failed: {e}"),
        }
    }
}
