//! Machine-state supervisor.
//!
//! The breath state machine writes [`MachineState::BreathLoopStart`] on
//! every Reset edge.  The supervisor runs **after** each step and turns
//! that signal into a run decision:
//!
//! ```text
//!   Standby ──start──▶ BreathLoop ──Reset edge──▶ BreathLoopStart
//!      ▲                   ▲                            │
//!      │                   └────────[healthy]───────────┤
//!      └──────────[stop requested]──────────────────────┤
//!                 Halted ◀──────[fatal flag set]────────┘
//! ```
//!
//! Fatal flags ([`Alarm::FATAL_MASK`]) are only acted on at the cycle
//! boundary so a breath in progress always completes its exhale.

use log::{error, info};

use crate::error::Alarm;

/// Top-level run state of the ventilator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    /// Not ventilating; waiting for a start command.
    Standby,
    /// Written by the breath machine on Reset: a new breath may begin.
    BreathLoopStart,
    /// Breath cycle in progress.
    BreathLoop,
    /// Stopped on a fatal alarm.  Only leaves via an explicit restart.
    Halted,
}

impl MachineState {
    /// Whether the breath state machine is stepped in this state.
    pub fn is_ventilating(self) -> bool {
        matches!(self, Self::BreathLoop | Self::BreathLoopStart)
    }
}

/// Owns the keep-looping / standby / halt decision.
#[derive(Debug)]
pub struct MachineSupervisor {
    stop_requested: bool,
}

impl MachineSupervisor {
    pub fn new() -> Self {
        Self {
            stop_requested: false,
        }
    }

    /// Ask for standby at the end of the current breath.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Withdraw a pending stop.  Returns whether one was pending.
    pub fn cancel_stop(&mut self) -> bool {
        core::mem::replace(&mut self.stop_requested, false)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Enter the breath loop from `Standby` or `Halted`.
    pub fn start(&mut self, state: &mut MachineState) {
        self.stop_requested = false;
        if *state != MachineState::BreathLoop {
            info!("SUPERVISOR: {:?} -> BreathLoop", state);
        }
        *state = MachineState::BreathLoop;
    }

    /// Decide what happens after a step.  Only acts on the Reset signal.
    pub fn evaluate(&mut self, state: &mut MachineState, errors: u16) {
        if *state != MachineState::BreathLoopStart {
            return;
        }

        *state = if errors & Alarm::FATAL_MASK != 0 {
            for alarm in Alarm::iter_set(errors & Alarm::FATAL_MASK) {
                error!("SUPERVISOR: halting breath loop on {alarm}");
            }
            MachineState::Halted
        } else if self.stop_requested {
            self.stop_requested = false;
            info!("SUPERVISOR: stop requested, entering standby");
            MachineState::Standby
        } else {
            MachineState::BreathLoop
        };
    }
}

impl Default for MachineSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
