//! Port traits: the hexagonal boundary between the breath core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BreathController (domain)
//! ```
//!
//! Driven adapters (pressure sensor, motor, event sinks, alarm
//! annunciation) implement these traits.  The
//! [`BreathController`](super::service::BreathController) consumes them via
//! generics, so the state machine never touches hardware directly.

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Pressure source (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one calibrated airway-pressure sample per call.
///
/// Blocking.  Worst-case latency (bus transaction plus settling delay)
/// must stay well inside one control tick.  Retries, if any, belong to
/// the implementation; the core never retries.
pub trait PressureSource {
    /// Latest calibrated sample in cmH2O.
    fn read_pressure(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Motor actuator (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Actuator request issued by the breath phases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    /// Return the paddle to its zero point.
    Home,
    /// Compress the bag to `tidal_volume_percent` of full stroke over
    /// `duration_ms`.
    BeginInhale {
        tidal_volume_percent: f32,
        duration_ms: u32,
    },
    /// Hold the current position (plateau).
    Hold,
    /// Release back to zero over `duration_ms`.
    BeginExhale { duration_ms: u32 },
}

/// Write-side port: fire-and-forget.  No acknowledgment is consulted
/// before a phase advances.
pub trait MotorActuator {
    fn command(&mut self, command: MotorCommand);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`VentEvent`](super::events::VentEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// display, telemetry link).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::VentEvent);
}

// ───────────────────────────────────────────────────────────────
// Alarm handler port (driven adapter: domain → buzzer / alarm LCD)
// ───────────────────────────────────────────────────────────────

/// Consumer of the error bitmask, called once per tick with the complete
/// mask.  Sound and display behaviour are entirely the handler's concern.
/// Clearing the mask goes through
/// [`VentCommand::AcknowledgeAlarms`](super::commands::VentCommand::AcknowledgeAlarms).
pub trait AlarmHandler {
    fn annunciate(&mut self, errors: u16);
}
