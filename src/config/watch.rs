//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[watch]` section in foc.toml - file watcher settings.
///
/// # Example
/// ```toml
/// [watch]
/// debounce = 50   # milliseconds of quiet before rebuilding
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce interval in milliseconds.
    #[serde(default = "defaults::watch::debounce")]
    #[educe(Default = defaults::watch::debounce())]
    pub debounce: u64,
}

impl WatchConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }
}
