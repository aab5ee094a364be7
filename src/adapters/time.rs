//! ESP32 time adapter.
//!
//! - **`target_os = "espidf"`**: wall time from the SNTP-synced system
//!   clock (`gettimeofday` + `localtime_r`), monotonic time from
//!   `esp_timer_get_time()`.
//! - **`not(target_os = "espidf")`**: monotonic time from
//!   `std::time::Instant`; wall time is never available unless injected
//!   through [`SimClock`].

use core::cell::Cell;
use core::time::Duration;

use crate::app::ports::ClockPort;
use crate::schedule::WallTime;

/// Anything earlier than 2020-01-01 means SNTP has not synced yet.
#[cfg(target_os = "espidf")]
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter;

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Milliseconds since boot (monotonic).
    pub fn uptime_ms(&self) -> u64 {
        monotonic().as_millis() as u64
    }
}

impl ClockPort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now(&self) -> Option<WallTime> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: tv is a valid out-pointer; tz may be null.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        // SAFETY: tm is plain data; localtime_r fills it or returns null.
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..=23).contains(&tm.tm_hour) || !(0..=59).contains(&tm.tm_min) {
            return None;
        }
        Some(WallTime::new(
            tm.tm_yday as u16,
            tm.tm_hour as u8,
            tm.tm_min as u8,
        ))
    }

    /// On non-ESP targets there is no wall clock.
    #[cfg(not(target_os = "espidf"))]
    fn now(&self) -> Option<WallTime> {
        None
    }
}

/// Monotonic time since boot.
#[cfg(target_os = "espidf")]
pub fn monotonic() -> Duration {
    // SAFETY: esp_timer_get_time is a read of the high-resolution timer.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

/// Monotonic time since first call.
#[cfg(not(target_os = "espidf"))]
pub fn monotonic() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}

/// Manually driven clock for simulation and tests.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<Option<WallTime>>,
}

impl SimClock {
    pub fn new(now: Option<WallTime>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Option<WallTime>) {
        self.now.set(now);
    }
}

impl ClockPort for SimClock {
    fn now(&self) -> Option<WallTime> {
        self.now.get()
    }
}
