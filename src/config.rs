//! Ventilator configuration parameters
//!
//! All tunable parameters for one ventilator run.  The configuration is
//! handed to the [`BreathController`](crate::app::service::BreathController)
//! at construction; nothing in the core reads process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// --- Parameter limits (front-panel ranges) ---

pub const MIN_BPM: f32 = 10.0;
pub const MAX_BPM: f32 = 40.0;
pub const MIN_INSPIRATION_TIME_S: f32 = 0.2;
pub const MAX_INSPIRATION_TIME_S: f32 = 3.0;
pub const MIN_PLATEAU_PAUSE_S: f32 = 0.1;
pub const MAX_PLATEAU_PAUSE_S: f32 = 0.5;
pub const MIN_TIDAL_VOLUME_PERCENT: f32 = 0.0;
pub const MAX_TIDAL_VOLUME_PERCENT: f32 = 100.0;

/// Default assist-control trigger window (seconds).
pub const AC_THRESHOLD_TIME_S: f32 = 0.5;
/// Default plateau hold (seconds).
pub const HOLD_TIME_S: f32 = 0.25;

/// Operating mode of the breath controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentMode {
    /// Assist-control: the patient (or a timeout) triggers each breath.
    AssistControl,
    /// Volume-control: every breath is machine-timed.
    VolumeControl,
}

/// Per-breath timing and trigger parameters.  Read-only to the state
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeParameters {
    /// Inhale phase duration (seconds).
    pub inspiration_time_s: f32,
    /// Exhale phase duration (seconds).
    pub expiration_time_s: f32,
    /// AC trigger: pressure below this (cmH2O) counts as patient effort.
    pub trigger_threshold_pressure: f32,
    /// AC trigger: machine breath after this long without effort (seconds).
    pub trigger_threshold_time_s: f32,
    /// Plateau hold after inhale (seconds).
    pub plateau_pause_s: f32,
    /// Tidal volume as a percentage of the full bag stroke.
    pub tidal_volume_percent: f32,
}

impl ModeParameters {
    /// Derive the expiration time from a breath rate.
    ///
    /// One breath lasts `60 / bpm` seconds; whatever is left after the
    /// inhale and the plateau hold is exhale.
    pub fn from_breath_rate(
        bpm: f32,
        inspiration_time_s: f32,
        plateau_pause_s: f32,
    ) -> Result<Self, ConfigError> {
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(ConfigError::OutOfRange("bpm"));
        }
        let period_s = 60.0 / bpm;
        let expiration_time_s = period_s - inspiration_time_s - plateau_pause_s;
        if expiration_time_s <= 0.0 {
            return Err(ConfigError::InvalidTiming(
                "inspiration + plateau exceed breath period",
            ));
        }
        let params = Self {
            inspiration_time_s,
            expiration_time_s,
            plateau_pause_s,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Full breath period implied by these parameters (seconds).
    pub fn breath_period_s(&self) -> f32 {
        self.inspiration_time_s + self.plateau_pause_s + self.expiration_time_s
    }

    /// Breaths per minute implied by these parameters.
    pub fn breaths_per_minute(&self) -> f32 {
        60.0 / self.breath_period_s()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_INSPIRATION_TIME_S..=MAX_INSPIRATION_TIME_S).contains(&self.inspiration_time_s) {
            return Err(ConfigError::OutOfRange("inspiration_time_s"));
        }
        if !(MIN_PLATEAU_PAUSE_S..=MAX_PLATEAU_PAUSE_S).contains(&self.plateau_pause_s) {
            return Err(ConfigError::OutOfRange("plateau_pause_s"));
        }
        if !(MIN_TIDAL_VOLUME_PERCENT..=MAX_TIDAL_VOLUME_PERCENT)
            .contains(&self.tidal_volume_percent)
        {
            return Err(ConfigError::OutOfRange("tidal_volume_percent"));
        }
        // NaN fails both comparisons below, so it is rejected too.
        if !(self.expiration_time_s > 0.0) {
            return Err(ConfigError::OutOfRange("expiration_time_s"));
        }
        if !(self.trigger_threshold_time_s > 0.0) {
            return Err(ConfigError::OutOfRange("trigger_threshold_time_s"));
        }
        if !self.trigger_threshold_pressure.is_finite() {
            return Err(ConfigError::OutOfRange("trigger_threshold_pressure"));
        }
        let bpm = self.breaths_per_minute();
        if !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(ConfigError::InvalidTiming("breath rate outside 10-40 bpm"));
        }
        Ok(())
    }
}

impl Default for ModeParameters {
    fn default() -> Self {
        // 15 bpm: 4 s period = 1.0 s inhale + 0.25 s hold + 2.75 s exhale.
        Self {
            inspiration_time_s: 1.0,
            expiration_time_s: 2.75,
            trigger_threshold_pressure: 3.0,
            trigger_threshold_time_s: AC_THRESHOLD_TIME_S,
            plateau_pause_s: HOLD_TIME_S,
            tidal_volume_percent: 60.0,
        }
    }
}

/// Pressure bounds checked by the [`AlarmEvaluator`](crate::alarms::AlarmEvaluator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    /// Airway pressure above this raises `HighPressure` (cmH2O).
    pub max_pressure: f32,
    /// Airway pressure below this raises `LowPressure` (cmH2O).
    pub min_pressure: f32,
    /// PEEP above this raises `HighPeep` (cmH2O).
    pub max_peep: f32,
    /// PEEP below this raises `LowPeep` (cmH2O).
    pub min_peep: f32,
}

impl AlarmThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_pressure > self.min_pressure) {
            return Err(ConfigError::InvertedThresholds("max_pressure/min_pressure"));
        }
        if !(self.max_peep > self.min_peep) {
            return Err(ConfigError::InvertedThresholds("max_peep/min_peep"));
        }
        Ok(())
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            max_pressure: 40.0,
            min_pressure: 5.0,
            max_peep: 15.0,
            min_peep: 2.0,
        }
    }
}

/// Core ventilator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VentilatorConfig {
    /// Mode the controller starts in.
    pub mode: VentMode,
    /// Breath timing and trigger parameters.
    pub breath: ModeParameters,
    /// Alarm thresholds.
    pub alarms: AlarmThresholds,
    /// Also evaluate `LowPressure` against the captured peak at the
    /// Inhale→Peak edge.
    pub check_low_pressure_at_peak: bool,
    /// Consecutive pressure-read failures tolerated before `DeviceFailure`.
    pub sensor_fault_tolerance: u8,
    /// Control loop period (milliseconds).
    pub control_loop_interval_ms: u32,
}

impl VentilatorConfig {
    /// Reject any configuration the breath controller must not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.breath.validate()?;
        self.alarms.validate()?;
        if self.sensor_fault_tolerance == 0 {
            return Err(ConfigError::OutOfRange("sensor_fault_tolerance"));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::OutOfRange("control_loop_interval_ms"));
        }
        let shortest_phase_ms = self.breath.plateau_pause_s * 1000.0;
        if self.control_loop_interval_ms as f32 >= shortest_phase_ms {
            return Err(ConfigError::InvalidTiming(
                "control loop slower than shortest phase",
            ));
        }
        Ok(())
    }
}

impl Default for VentilatorConfig {
    fn default() -> Self {
        Self {
            mode: VentMode::VolumeControl,
            breath: ModeParameters::default(),
            alarms: AlarmThresholds::default(),
            check_low_pressure_at_peak: false,
            sensor_fault_tolerance: 3,
            control_loop_interval_ms: 10, // 100 Hz
        }
    }
}
