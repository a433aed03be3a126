//! Tracking of tokens invalidated by logout.
//!
//! Entries live until the token's own expiry. After that the codec rejects
//! the token anyway, so the periodic sweep can drop them without changing
//! what callers observe.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, info};

const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<String, DateTime<Utc>>>;

/// Concurrent set of revoked token strings, partitioned to limit lock contention.
pub struct RevocationStore {
    shards: Vec<Shard>,
    hasher: RandomState,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, token: &str) -> &Shard {
        let index = self.hasher.hash_one(token) as usize % SHARD_COUNT;
        &self.shards[index]
    }

    /// Record `token` as revoked until `expires_at`. Repeated calls keep the later expiry.
    pub fn revoke(&self, token: &str, expires_at: DateTime<Utc>) {
        let mut shard = self.shard(token).write();
        shard
            .entry(token.to_string())
            .and_modify(|existing| {
                if expires_at > *existing {
                    *existing = expires_at;
                }
            })
            .or_insert(expires_at);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.shard(token).read().contains_key(token)
    }

    /// Drop entries whose expiry is before `now`. Returns how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                let mut entries = shard.write();
                let before = entries.len();
                entries.retain(|_, expires_at| *expires_at >= now);
                before - entries.len()
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Start a scheduler that sweeps expired revocations every `interval`.
///
/// The returned scheduler must be kept alive for as long as sweeping should continue.
pub async fn schedule_sweep(
    store: Arc<RevocationStore>,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(interval, move |_id, _scheduler| {
        let store = store.clone();
        Box::pin(async move {
            let removed = store.sweep_expired(Utc::now());
            if removed > 0 {
                info!(removed, remaining = store.len(), "Swept expired revocations");
            } else {
                debug!(remaining = store.len(), "Revocation sweep found nothing to remove");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(interval_secs = interval.as_secs(), "Revocation sweeper started");
    Ok(scheduler)
}
