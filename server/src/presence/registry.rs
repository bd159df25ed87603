use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Silence after which a listener is considered gone.
pub const DEFAULT_EXPIRY_WINDOW_MS: u64 = 30_000;

/// Error type for presence registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    /// A heartbeat was missing its listener or channel id. Carries the field name.
    #[error("missing {0}")]
    InvalidArgument(&'static str),
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Default)]
struct RegistryState {
    /// channel_id -> (listener_id -> last seen millis)
    channels: HashMap<String, HashMap<String, u64>>,
    /// listener_id -> channel_id it is currently counted in
    listeners: HashMap<String, String>,
}

impl RegistryState {
    /// Drop `listener_id` from `channel_id`, purging the channel if it empties.
    fn remove_entry(&mut self, channel_id: &str, listener_id: &str) -> bool {
        let Some(members) = self.channels.get_mut(channel_id) else {
            return false;
        };
        let removed = members.remove(listener_id).is_some();
        if members.is_empty() {
            self.channels.remove(channel_id);
        }
        removed
    }

    fn sweep(&mut self, now: u64, expiry_window_ms: u64) -> usize {
        let mut purged = 0;
        let listeners = &mut self.listeners;

        self.channels.retain(|channel_id, members| {
            members.retain(|listener_id, last_seen| {
                let live = now.saturating_sub(*last_seen) <= expiry_window_ms;
                if !live {
                    purged += 1;
                    if listeners.get(listener_id).is_some_and(|c| c == channel_id) {
                        listeners.remove(listener_id);
                    }
                }
                live
            });
            !members.is_empty()
        });

        if purged > 0 {
            tracing::debug!(purged, "Expired stale listeners");
        }
        purged
    }
}

/// In-memory, time-windowed listener membership.
///
/// A listener is counted in at most one channel at a time. Entries age out
/// once they have been silent for longer than the expiry window; the sweep
/// runs on every heartbeat and query rather than on a timer.
///
/// All state lives behind a single mutex. Channel map and reverse index are
/// always mutated together inside one critical section.
#[derive(Debug)]
pub struct PresenceRegistry {
    expiry_window_ms: u64,
    state: Mutex<RegistryState>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_WINDOW_MS)
    }
}

impl PresenceRegistry {
    pub fn new(expiry_window_ms: u64) -> Self {
        Self {
            expiry_window_ms,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn expiry_window_ms(&self) -> u64 {
        self.expiry_window_ms
    }

    // A panic mid-operation cannot leave the maps structurally invalid,
    // so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that `listener_id` is tuned into `channel_id`.
    ///
    /// Returns the live real count for `channel_id` after the sweep.
    pub fn heartbeat(&self, listener_id: &str, channel_id: &str) -> Result<usize, PresenceError> {
        self.heartbeat_at(listener_id, channel_id, now_millis())
    }

    pub fn heartbeat_at(
        &self,
        listener_id: &str,
        channel_id: &str,
        now: u64,
    ) -> Result<usize, PresenceError> {
        if listener_id.is_empty() {
            return Err(PresenceError::InvalidArgument("listenerId"));
        }
        if channel_id.is_empty() {
            return Err(PresenceError::InvalidArgument("channelId"));
        }

        let mut state = self.lock();

        // Leave the previous channel before joining the new one
        if let Some(previous) = state.listeners.get(listener_id).cloned() {
            if previous != channel_id {
                state.remove_entry(&previous, listener_id);
            }
        }

        state
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(listener_id.to_string(), now);
        state
            .listeners
            .insert(listener_id.to_string(), channel_id.to_string());

        state.sweep(now, self.expiry_window_ms);

        Ok(state.channels.get(channel_id).map_or(0, HashMap::len))
    }

    /// Live real count for every channel with at least one listener.
    pub fn query(&self) -> BTreeMap<String, usize> {
        self.query_at(now_millis())
    }

    pub fn query_at(&self, now: u64) -> BTreeMap<String, usize> {
        let mut state = self.lock();
        state.sweep(now, self.expiry_window_ms);
        state
            .channels
            .iter()
            .map(|(channel_id, members)| (channel_id.clone(), members.len()))
            .collect()
    }

    /// Remove `listener_id` from whichever channel holds it.
    ///
    /// Returns the channel it was removed from, if any. Unknown listeners are a no-op.
    pub fn disconnect(&self, listener_id: &str) -> Option<String> {
        let mut state = self.lock();
        let channel_id = state.listeners.remove(listener_id)?;
        state.remove_entry(&channel_id, listener_id);
        Some(channel_id)
    }

    /// Purge every entry older than the expiry window. Returns the number purged.
    pub fn sweep(&self) -> usize {
        self.sweep_at(now_millis())
    }

    pub fn sweep_at(&self, now: u64) -> usize {
        self.lock().sweep(now, self.expiry_window_ms)
    }

    /// Real count for one channel, without sweeping.
    pub fn real_count(&self, channel_id: &str) -> usize {
        self.lock().channels.get(channel_id).map_or(0, HashMap::len)
    }

    /// Channel the listener is currently counted in, without sweeping.
    pub fn listener_channel(&self, listener_id: &str) -> Option<String> {
        self.lock().listeners.get(listener_id).cloned()
    }

    pub fn total_listeners(&self) -> usize {
        self.lock().listeners.len()
    }

    #[cfg(test)]
    fn has_channel_key(&self, channel_id: &str) -> bool {
        self.lock().channels.contains_key(channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn test_first_heartbeat_counts_one() {
        let registry = PresenceRegistry::default();
        assert_eq!(registry.heartbeat_at("u1", "lofi", T0), Ok(1));
        assert_eq!(registry.listener_channel("u1").as_deref(), Some("lofi"));
    }

    #[test]
    fn test_repeated_heartbeat_is_idempotent() {
        let registry = PresenceRegistry::default();
        let once = registry.heartbeat_at("u1", "lofi", T0).unwrap();
        let twice = registry.heartbeat_at("u1", "lofi", T0 + 10_000).unwrap();
        assert_eq!(once, twice);
        assert_eq!(registry.query_at(T0 + 10_000).get("lofi"), Some(&1));
    }

    #[test]
    fn test_switching_channel_leaves_previous() {
        let registry = PresenceRegistry::default();
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u2", "lofi", T0).unwrap();
        registry.heartbeat_at("u1", "jazz", T0 + 1).unwrap();

        let counts = registry.query_at(T0 + 2);
        assert_eq!(counts.get("lofi"), Some(&1));
        assert_eq!(counts.get("jazz"), Some(&1));
        assert_eq!(registry.total_listeners(), 2);
    }

    #[test]
    fn test_switching_purges_emptied_channel() {
        let registry = PresenceRegistry::default();
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u1", "jazz", T0).unwrap();
        assert!(!registry.has_channel_key("lofi"));
        assert_eq!(registry.query_at(T0).get("lofi"), None);
    }

    #[test]
    fn test_invalid_heartbeat_changes_nothing() {
        let registry = PresenceRegistry::default();
        registry.heartbeat_at("u1", "lofi", T0).unwrap();

        assert_eq!(
            registry.heartbeat_at("", "lofi", T0),
            Err(PresenceError::InvalidArgument("listenerId"))
        );
        assert_eq!(
            registry.heartbeat_at("u1", "", T0),
            Err(PresenceError::InvalidArgument("channelId"))
        );

        assert_eq!(registry.listener_channel("u1").as_deref(), Some("lofi"));
        assert_eq!(registry.query_at(T0).len(), 1);
        assert_eq!(registry.real_count("lofi"), 1);
    }

    #[test]
    fn test_entry_expires_after_window() {
        let registry = PresenceRegistry::new(30_000);
        registry.heartbeat_at("u1", "lofi", T0).unwrap();

        // Exactly at the window edge the entry is still live
        assert_eq!(registry.query_at(T0 + 30_000).get("lofi"), Some(&1));

        let counts = registry.query_at(T0 + 30_001);
        assert!(counts.is_empty());
        assert!(!registry.has_channel_key("lofi"));
        assert_eq!(registry.listener_channel("u1"), None);
    }

    #[test]
    fn test_heartbeat_sweeps_other_channels() {
        let registry = PresenceRegistry::new(30_000);
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u2", "jazz", T0 + 40_000).unwrap();
        assert!(!registry.has_channel_key("lofi"));
        assert_eq!(registry.total_listeners(), 1);
    }

    #[test]
    fn test_refresh_keeps_listener_alive() {
        let registry = PresenceRegistry::new(30_000);
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u1", "lofi", T0 + 25_000).unwrap();
        assert_eq!(registry.query_at(T0 + 50_000).get("lofi"), Some(&1));
    }

    #[test]
    fn test_disconnect_unknown_listener_is_noop() {
        let registry = PresenceRegistry::default();
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        assert_eq!(registry.disconnect("nonexistent"), None);
        assert_eq!(registry.query_at(T0).get("lofi"), Some(&1));
    }

    #[test]
    fn test_disconnect_removes_listener() {
        let registry = PresenceRegistry::default();
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u2", "lofi", T0).unwrap();
        assert_eq!(registry.disconnect("u2").as_deref(), Some("lofi"));
        assert_eq!(registry.real_count("lofi"), 1);
        assert_eq!(registry.disconnect("u2"), None);
    }

    #[test]
    fn test_sweep_reports_purged_entries() {
        let registry = PresenceRegistry::new(1_000);
        registry.heartbeat_at("u1", "lofi", T0).unwrap();
        registry.heartbeat_at("u2", "jazz", T0).unwrap();
        registry.heartbeat_at("u3", "jazz", T0 + 900).unwrap();
        assert_eq!(registry.sweep_at(T0 + 1_500), 2);
        assert_eq!(registry.query_at(T0 + 1_500).get("jazz"), Some(&1));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let registry = PresenceRegistry::default();
        assert_eq!(registry.heartbeat_at("u1", "lofi", T0), Ok(1));
        assert_eq!(registry.heartbeat_at("u2", "lofi", T0 + 1), Ok(2));
        assert_eq!(registry.heartbeat_at("u1", "jazz", T0 + 2), Ok(1));
        assert_eq!(registry.real_count("lofi"), 1);

        registry.disconnect("u2");
        let counts = registry.query_at(T0 + 3);
        assert_eq!(counts.get("lofi"), None);
        assert_eq!(counts.get("jazz"), Some(&1));
    }

    #[test]
    fn test_concurrent_heartbeats_keep_one_channel_per_listener() {
        let registry = Arc::new(PresenceRegistry::default());
        let channels = ["lofi", "jazz", "ambient", "classical"];

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..500usize {
                        let listener = format!("listener-{}", i % 50);
                        let channel = channels[(i + worker) % channels.len()];
                        registry.heartbeat_at(&listener, channel, T0).unwrap();
                        if i % 7 == 0 {
                            registry.disconnect(&listener);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let counts = registry.query_at(T0);
        let counted: usize = counts.values().sum();
        assert_eq!(counted, registry.total_listeners());
        assert!(counted <= 50);
    }
}
