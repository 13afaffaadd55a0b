//! Expiry Sweep Task
//!
//! Background task that periodically drops expired cache entries and
//! expired sessions. Reads already ignore both, so the sweep only bounds
//! memory held by keys nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::SessionStore;
use crate::cache::CacheService;

/// Spawns the sweep loop. Abort the returned handle on shutdown.
pub fn spawn_cleanup_task(
    cache: CacheService,
    sessions: SessionStore,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "starting expiry sweep task");

        loop {
            tokio::time::sleep(period).await;

            let entries = cache.sweep().await;
            let expired_sessions = sessions.cleanup_expired().await;

            if entries > 0 || expired_sessions > 0 {
                info!(entries, sessions = expired_sessions, "expiry sweep removed items");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
