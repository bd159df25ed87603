//! Ambient baseline generator.
//!
//! Produces a synthetic per-channel floor that is blended into real listener
//! counts before they leave the service. The value is a pure function of
//! (channel id, time bucket): every caller inside the same bucket sees the
//! same number, and the number drifts once per bucket instead of per request.

use crate::channels::catalog;

/// Width of one ambient time bucket.
pub const DEFAULT_BUCKET_MS: u64 = 45_000;

/// Ambient count for `channel_id` at `now_millis` using the default bucket width.
pub fn ambient_count(channel_id: &str, now_millis: u64) -> u32 {
    ambient_count_with_bucket(channel_id, now_millis, DEFAULT_BUCKET_MS)
}

/// Ambient count with an explicit bucket width. Always lies within the
/// channel's catalog range (or the default range for unknown ids).
pub fn ambient_count_with_bucket(channel_id: &str, now_millis: u64, bucket_ms: u64) -> u32 {
    let (min, max) = catalog::ambient_range(channel_id);
    let bucket = now_millis / bucket_ms.max(1);
    let seed = format!("{}:{}", channel_id, bucket);

    // abs() in 64 bits so i32::MIN does not overflow
    let norm = (i64::from(seed_hash(&seed)).abs() % 1000) as f64 / 1000.0;
    min + (norm * f64::from(max - min)).round() as u32
}

/// 31-multiplier polynomial hash over UTF-16 code units, wrapping at 32 bits.
pub fn seed_hash(seed: &str) -> i32 {
    seed.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

/// Configured ambient padding, shared by the request handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientBaseline {
    pub enabled: bool,
    pub bucket_ms: u64,
}

impl Default for AmbientBaseline {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket_ms: DEFAULT_BUCKET_MS,
        }
    }
}

impl AmbientBaseline {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Addend for `channel_id` at `now_millis`; 0 when padding is disabled.
    pub fn count(&self, channel_id: &str, now_millis: u64) -> u32 {
        if !self.enabled {
            return 0;
        }
        ambient_count_with_bucket(channel_id, now_millis, self.bucket_ms)
    }
}
