//! Phase timer abstraction.
//!
//! Every breath phase is timed against a [`Clock`]: a monotonic elapsed-time
//! source that the state handlers reset explicitly at phase boundaries.
//! Nothing resets it implicitly.  The production implementation lives in
//! [`adapters::time`](crate::adapters::time); [`ManualClock`] is a fake that
//! tests and simulations advance by hand.

/// Monotonic, resettable elapsed-time source with millisecond resolution.
pub trait Clock {
    /// Milliseconds elapsed since the last [`reset`](Clock::reset).
    fn elapsed_ms(&self) -> u32;

    /// Restart the elapsed count from zero.
    fn reset(&mut self);

    /// True once strictly more than `secs` seconds have elapsed.
    ///
    /// All phase guards go through this so the `seconds × 1000` conversion
    /// and the strict comparison live in one place.
    fn exceeds_secs(&self, secs: f32) -> bool {
        self.elapsed_ms() as f32 > secs * 1000.0
    }
}

/// Clock advanced explicitly by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    elapsed_ms: u32,
    resets: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `ms` milliseconds.
    pub fn advance(&mut self, ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
    }

    /// Number of times [`Clock::reset`] has been called.
    pub fn resets(&self) -> u32 {
        self.resets
    }
}

impl Clock for ManualClock {
    fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.resets = self.resets.wrapping_add(1);
    }
}
