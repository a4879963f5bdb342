//! Inbound commands to the breath controller.
//!
//! These represent operator actions (front-panel switches, a service
//! console) that the [`BreathController`](super::service::BreathController)
//! interprets and acts upon.

use crate::config::{ModeParameters, VentMode};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VentCommand {
    /// Enter the breath loop from standby (or after a halt once the fatal
    /// alarms have been acknowledged).
    Start,

    /// Finish the current breath, then go to standby.
    Stop,

    /// Switch ventilation mode at the next cycle boundary.
    SetMode(VentMode),

    /// Replace the breath parameters at the next cycle boundary.
    UpdateParameters(ModeParameters),

    /// Operator acknowledgment: clears every latched alarm flag.
    AcknowledgeAlarms,

    /// Cut an in-progress inhale short.
    AbortInhale,
}
