//! Outbound application events.
//!
//! The [`BreathController`](super::service::BreathController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, update a
//! display, forward over a telemetry link.

use crate::config::{ModeParameters, VentMode};
use crate::error::SensorError;
use crate::fsm::BreathState;
use crate::fsm::context::TriggerSource;
use crate::supervisor::MachineState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum VentEvent {
    /// The breath loop was entered (carries the initial state).
    Started(BreathState),

    /// The active mode moved between states.
    StateChanged { from: BreathState, to: BreathState },

    /// The supervisor changed the machine state.
    MachineStateChanged { from: MachineState, to: MachineState },

    /// A breath reached its Reset edge.
    BreathCompleted(BreathSummary),

    /// Flags newly set during this tick (only the new bits).
    AlarmRaised(u16),

    /// The operator acknowledged and cleared all flags.
    AlarmsCleared,

    /// A pressure read failed; the last good sample was reused.
    SensorFault(SensorError),

    /// A pending mode switch took effect at a cycle boundary.
    ModeChanged(VentMode),

    /// Pending breath parameters took effect at a cycle boundary.
    ParametersApplied(ModeParameters),
}

/// Measurements of one completed breath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreathSummary {
    pub mode: VentMode,
    /// Cycle number, 1 for the first breath of a run.
    pub cycle: u32,
    pub peak_pressure: f32,
    pub plateau_pressure: f32,
    pub peep_pressure: f32,
    /// Error bitmask as it stood at the Reset edge.
    pub errors: u16,
    pub trigger: Option<TriggerSource>,
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: BreathState,
    /// 1-indexed state position, for the diagnostic display.
    pub debug_code: u8,
    pub machine_state: MachineState,
    pub pressure: f32,
    pub peak_pressure: f32,
    pub plateau_pressure: f32,
    pub peep_pressure: f32,
    pub errors: u16,
    pub cycles_completed: u32,
    pub breaths_per_minute: f32,
}
