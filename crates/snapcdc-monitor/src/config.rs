use std::time::Duration;

use serde::{Deserialize, Serialize};
use snapcdc_types::IgnoreSet;

/// Refresh period used when none (or zero) is configured.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(20);

/// Default event queue capacity; sized to absorb one full diff burst.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for a [`Monitor`](crate::Monitor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause between the end of one poll cycle and the start of the next.
    #[serde(rename = "refresh_period_secs", with = "secs")]
    pub refresh_period: Duration,
    /// Field names never reported as changes.
    pub ignore_fields: IgnoreSet,
    /// Emit human-readable lines for start, cycle boundaries and shutdown.
    pub diagnostics: bool,
    /// Capacity of the event queue between the poll loop and dispatch, and of
    /// each listener's delivery lane.
    pub queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_period: DEFAULT_REFRESH_PERIOD,
            ignore_fields: IgnoreSet::empty(),
            diagnostics: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// The refresh period actually used: zero falls back to the default.
    pub fn effective_refresh_period(&self) -> Duration {
        if self.refresh_period.is_zero() {
            DEFAULT_REFRESH_PERIOD
        } else {
            self.refresh_period
        }
    }

    /// The queue capacity actually used: at least one slot.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

/// Durations as (fractional) seconds.
mod secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
