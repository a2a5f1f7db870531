//! ESP32 time adapter.
//!
//! Implements [`ClockPort`] for the feeder.
//!
//! - **`target_os = "espidf"`**: monotonic time from `esp_timer_get_time()`
//!   (microsecond precision), wall clock from `gettimeofday` +
//!   `localtime_r`, so the scheduler follows the configured `TZ`.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side simulation; there is no wall clock, so the scheduler idles.

use crate::app::ports::ClockPort;
use crate::scheduler::WallClock;

/// Wall-clock readings before 2020-01-01 mean the RTC was never set.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Local time from the system clock. `None` if the clock is not synced.
    #[cfg(target_os = "espidf")]
    fn local_time(&self) -> Option<WallClock> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if (tv.tv_sec as i64) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        wall_clock_from_tm(tm.tm_hour, tm.tm_min, tm.tm_yday)
    }

    #[cfg(not(target_os = "espidf"))]
    fn local_time(&self) -> Option<WallClock> {
        None
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn monotonic_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    fn wall_clock(&self) -> Option<WallClock> {
        self.local_time()
    }
}

/// Range-check broken-down time fields from libc.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn wall_clock_from_tm(hour: i32, minute: i32, yday: i32) -> Option<WallClock> {
    Some(WallClock {
        hour: u8::try_from(hour).ok().filter(|h| *h <= 23)?,
        minute: u8::try_from(minute).ok().filter(|m| *m <= 59)?,
        day_of_year: u16::try_from(yday).ok().filter(|d| *d <= 365)?,
    })
}
