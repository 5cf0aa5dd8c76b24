use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

const fn threshold(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => NonZeroU32::MIN,
    }
}

/// Tunables for one harvest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Stop once this many records are accepted (default: unlimited)
    pub max_records: Option<usize>,

    /// Only accept reviews from the last N years (default: 5)
    pub years_back: u32,

    /// Switch the feed to newest-first before harvesting (default: true)
    pub sort_newest_first: bool,

    /// Consecutive iterations without a new record before giving up (default: 5)
    pub stall_threshold: NonZeroU32,

    /// Consecutive out-of-window items before assuming the rest are older (default: 30)
    pub aged_out_threshold: NonZeroU32,

    /// Pause after each scroll so the feed can render, in milliseconds (default: 300)
    pub scroll_pause_ms: u64,

    /// Log progress every N scroll iterations (default: 3)
    pub progress_interval: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_records: None,
            years_back: 5,
            sort_newest_first: true,
            stall_threshold: threshold(5),
            aged_out_threshold: threshold(30),
            scroll_pause_ms: 300,
            progress_interval: 3,
        }
    }
}

impl HarvestConfig {
    /// Get the post-scroll pause as a Duration
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    /// Capped run for a quick look at a place (200 records)
    pub fn sample() -> Self {
        Self {
            max_records: Some(200),
            stall_threshold: threshold(7),
            ..Default::default()
        }
    }

    /// Slow feeds: wait longer per scroll and tolerate long stalls
    pub fn patient() -> Self {
        Self {
            stall_threshold: threshold(15),
            scroll_pause_ms: 1200,
            ..Default::default()
        }
    }
}
