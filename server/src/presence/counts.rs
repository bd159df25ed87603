//! Composition of public listener counts.
//!
//! The public count for a channel is always real + ambient. Every catalog
//! channel is reported, even with zero real listeners, so the UI always has
//! an ambient floor to show.

use std::collections::BTreeMap;

use crate::channels::catalog;
use crate::presence::ambient::AmbientBaseline;

/// Composed count for a single channel.
pub fn compose_one(channel_id: &str, real: usize, ambient: &AmbientBaseline, now: u64) -> u64 {
    real as u64 + u64::from(ambient.count(channel_id, now))
}

/// Composed counts for every catalog channel plus any other channel that has
/// live real listeners.
pub fn compose_all(
    real: &BTreeMap<String, usize>,
    ambient: &AmbientBaseline,
    now: u64,
) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = catalog::all()
        .iter()
        .map(|c| (c.id.to_string(), compose_one(c.id, 0, ambient, now)))
        .collect();

    for (channel_id, listeners) in real {
        counts.insert(
            channel_id.clone(),
            compose_one(channel_id, *listeners, ambient, now),
        );
    }

    counts
}
