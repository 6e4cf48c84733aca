//! ESP32 wall clock backed by the system time SNTP maintains.

use crate::traits::{Clock, TimeOfDay};
use std::time::{SystemTime, UNIX_EPOCH};

/// ESP32 clock reading the libc system time.
///
/// Until SNTP has synced, the RTC counts from 1970; anything before
/// 2020-01-01 is treated as unset.
///
/// # Example
///
/// ```ignore
/// use garage_link::hal::esp32::Esp32Clock;
/// use garage_link::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// if let Some(t) = clock.time_of_day() {
///     log::info!("{}", t);
/// }
/// ```
pub struct Esp32Clock;

impl Esp32Clock {
    /// 2020-01-01T00:00:00Z
    const SYNCED_AFTER_SECS: u64 = 1_577_836_800;

    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Esp32Clock {
    fn time_of_day(&self) -> Option<TimeOfDay> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        (secs >= Self::SYNCED_AFTER_SECS).then(|| TimeOfDay::from_unix_secs(secs))
    }
}
