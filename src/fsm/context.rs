//! Breath-cycle context threaded through every state handler.
//!
//! `BreathContext` is the single record the AC and VC handlers read from
//! and write to: the latest pressure sample, the phase-boundary captures,
//! the accumulated alarm bitmask and the read-only mode parameters.  It is
//! created once per ventilator run and re-armed on every Reset edge.
//!
//! Capture rules:
//!
//! | Field               | Written                                   |
//! |---------------------|-------------------------------------------|
//! | `pressure`          | every step (by the outer loop)            |
//! | `temp_peak_pressure`| every Inhale step (running max); zeroed on inhale entry and Reset |
//! | `peak_pressure`     | once, Inhale→Peak                         |
//! | `plateau_pressure`  | once, Peak→Exhale                         |
//! | `peep_pressure`     | once, Exhale→Reset                        |
//! | `errors`            | OR only; cleared by [`BreathContext::clear_errors`] |

use crate::alarms::AlarmEvaluator;
use crate::config::{ModeParameters, VentilatorConfig};

/// What started the current breath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Machine-initiated: VC timing or the AC trigger window expired.
    Timed,
    /// AC: airway pressure dropped below the trigger threshold.
    PatientEffort,
}

/// Which phase-boundary captures happened during the current cycle.
/// Reset on every Start so tests can check the exactly-once rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureCounts {
    pub peak: u8,
    pub plateau: u8,
    pub peep: u8,
}

#[derive(Debug, Clone)]
pub struct BreathContext {
    // -- Measurements --
    /// Most recent calibrated sample (cmH2O).
    pub pressure: f32,
    /// Running maximum during the current inhale.
    pub temp_peak_pressure: f32,
    /// Peak inspiratory pressure of the last completed inhale.
    pub peak_pressure: f32,
    /// Plateau pressure at the end of the last hold.
    pub plateau_pressure: f32,
    /// Pressure at the end of the last exhale.
    pub peep_pressure: f32,
    pub captures: CaptureCounts,

    // -- Alarms --
    /// Accumulated [`Alarm`](crate::error::Alarm) bitmask.
    pub errors: u16,
    pub alarms: AlarmEvaluator,
    /// OR `LowPressure` against the captured peak at Inhale→Peak.
    pub check_low_pressure_at_peak: bool,

    // -- Cycle bookkeeping --
    pub trigger: Option<TriggerSource>,
    /// Completed Reset edges since the run began.
    pub cycles_completed: u32,

    // -- Parameters --
    pub params: ModeParameters,
}

impl BreathContext {
    /// Create a context for a new ventilator run.
    pub fn new(config: &VentilatorConfig) -> Self {
        Self {
            pressure: 0.0,
            temp_peak_pressure: 0.0,
            peak_pressure: 0.0,
            plateau_pressure: 0.0,
            peep_pressure: 0.0,
            captures: CaptureCounts::default(),
            errors: 0,
            alarms: AlarmEvaluator::new(config.alarms),
            check_low_pressure_at_peak: config.check_low_pressure_at_peak,
            trigger: None,
            cycles_completed: 0,
            params: config.breath,
        }
    }

    /// OR a mask into the accumulator.
    pub fn raise(&mut self, mask: u16) {
        self.errors |= mask;
    }

    /// The only operation that removes flags.  Called on an explicit
    /// acknowledgment from the alarm collaborator, never by a state handler.
    pub fn clear_errors(&mut self) {
        self.errors = 0;
    }

    /// Fold the current sample into the inhale running maximum.
    pub fn track_peak(&mut self) {
        if self.pressure > self.temp_peak_pressure {
            self.temp_peak_pressure = self.pressure;
        }
    }

    pub(crate) fn capture_peak(&mut self) {
        self.peak_pressure = self.temp_peak_pressure;
        self.captures.peak = self.captures.peak.saturating_add(1);
    }

    pub(crate) fn capture_plateau(&mut self) {
        self.plateau_pressure = self.pressure;
        self.captures.plateau = self.captures.plateau.saturating_add(1);
    }

    pub(crate) fn capture_peep(&mut self) {
        self.peep_pressure = self.pressure;
        self.captures.peep = self.captures.peep.saturating_add(1);
    }
}
