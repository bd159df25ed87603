//! Optional periodic expiry sweep.
//!
//! Heartbeats and queries already sweep on access; this task only bounds
//! memory held by listeners that went silent while nobody was querying.

use std::sync::Arc;
use std::time::Duration;

use crate::presence::registry::PresenceRegistry;

/// Spawn a background task that sweeps the registry every `interval_secs` seconds.
pub fn spawn_periodic_sweep(registry: Arc<PresenceRegistry>, interval_secs: u64) {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let purged = registry.sweep();
            if purged > 0 {
                tracing::info!("Presence sweep: purged {} stale listeners", purged);
            } else {
                tracing::debug!("Presence sweep: no stale listeners");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::registry::now_millis;

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sweep_purges_stale_entries() {
        let registry = Arc::new(PresenceRegistry::new(1_000));
        // Last seen long ago, so any sweep against the wall clock drops it
        registry.heartbeat_at("u1", "lofi", now_millis() - 60_000).ok();
        assert_eq!(registry.total_listeners(), 1);

        spawn_periodic_sweep(registry.clone(), 5);
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(registry.total_listeners(), 0);
    }
}
