//! Alarm evaluator.
//!
//! Pure predicates mapping one pressure sample to an [`Alarm`] bitmask.
//! The evaluator holds only its thresholds; every check is a function of
//! its argument alone, so the same sample always yields the same mask.
//!
//! ## Where the checks run
//!
//! | Check            | Invoked at                                   |
//! |------------------|----------------------------------------------|
//! | high pressure    | every Inhale / Peak step, InhaleAbort        |
//! | low pressure     | Inhale→Peak edge, only when enabled in config |
//! | PEEP (high/low)  | Reset edge                                   |
//!
//! The results are OR-ed into `BreathContext::errors`; nothing here ever
//! clears a flag.

use crate::config::AlarmThresholds;
use crate::error::Alarm;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmEvaluator {
    thresholds: AlarmThresholds,
}

impl AlarmEvaluator {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlarmThresholds {
        &self.thresholds
    }

    /// `HighPressure` if `pressure > max_pressure`.
    pub fn check_high_pressure(&self, pressure: f32) -> u16 {
        flag_if(pressure > self.thresholds.max_pressure, Alarm::HighPressure)
    }

    /// `LowPressure` if `pressure < min_pressure`.
    pub fn check_low_pressure(&self, pressure: f32) -> u16 {
        flag_if(pressure < self.thresholds.min_pressure, Alarm::LowPressure)
    }

    /// Both airway-pressure bounds.
    pub fn check_pressure(&self, pressure: f32) -> u16 {
        self.check_high_pressure(pressure) | self.check_low_pressure(pressure)
    }

    /// `HighPeep` if `pressure > max_peep`.
    pub fn check_high_peep(&self, pressure: f32) -> u16 {
        flag_if(pressure > self.thresholds.max_peep, Alarm::HighPeep)
    }

    /// `LowPeep` if `pressure < min_peep`.
    pub fn check_low_peep(&self, pressure: f32) -> u16 {
        flag_if(pressure < self.thresholds.min_peep, Alarm::LowPeep)
    }

    /// Both PEEP bounds.
    pub fn check_peep(&self, pressure: f32) -> u16 {
        self.check_high_peep(pressure) | self.check_low_peep(pressure)
    }
}

impl Default for AlarmEvaluator {
    fn default() -> Self {
        Self::new(AlarmThresholds::default())
    }
}

const fn flag_if(condition: bool, alarm: Alarm) -> u16 {
    if condition { alarm.mask() } else { 0 }
}
