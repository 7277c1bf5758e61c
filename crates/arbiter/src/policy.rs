//! Timing and fallback policy for the arbiter.
//!
//! Centralizes debounce, retry and restoration constants.

use std::time::Duration;

/// Minimum time between accepted classification events.
pub const DEBOUNCE_WINDOW_MS: u64 = 500;

/// Delay between a write and the re-read that confirms it.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Re-writes allowed after the first one before a request is abandoned.
pub const RETRY_CEILING: u32 = 3;

/// Restoration level, as a percentage of max, when no baseline was stored.
pub const DEFAULT_RESTORE_PERCENT: u8 = 50;

/// Tunables for [`crate::VolumeArbiter`]. Defaults match the constants above.
#[derive(Debug, Clone)]
pub struct ArbiterConfig {
    pub debounce_window_ms: u64,
    pub retry_delay: Duration,
    pub retry_ceiling: u32,
    pub default_restore_percent: u8,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEBOUNCE_WINDOW_MS,
            retry_delay: RETRY_DELAY,
            retry_ceiling: RETRY_CEILING,
            default_restore_percent: DEFAULT_RESTORE_PERCENT,
        }
    }
}

/// `floor(max_level * percent / 100)`.
pub fn level_for_percent(max_level: u32, percent: u8) -> u32 {
    let percent = u64::from(percent.min(100));
    ((u64::from(max_level) * percent) / 100) as u32
}
