//! ESP32 time adapter.
//!
//! Provides the monotonic breath-phase timer.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::clock::Clock;

/// Phase timer backed by the platform's monotonic clock.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    boot: std::time::Instant,
    /// Microseconds since boot at the last reset.
    mark_us: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        let mut clock = Self {
            #[cfg(not(target_os = "espidf"))]
            boot: std::time::Instant::now(),
            mark_us: 0,
        };
        clock.mark_us = clock.uptime_us();
        clock
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since this adapter was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.boot.elapsed().as_micros() as u64
    }

    /// Milliseconds since boot, truncated to `u32` (wraps after ~49 days).
    pub fn uptime_ms(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}

impl Clock for MonotonicClock {
    fn elapsed_ms(&self) -> u32 {
        let us = self.uptime_us().saturating_sub(self.mark_us);
        u32::try_from(us / 1_000).unwrap_or(u32::MAX)
    }

    fn reset(&mut self) {
        self.mark_us = self.uptime_us();
    }
}
