//! Assist-control (AC) state table.
//!
//! The patient starts each breath by pulling airway pressure below the
//! trigger threshold; if no effort arrives inside the trigger window the
//! machine breathes anyway.
//!
//! ```text
//!  START ──▶ INHALE_WAIT ──[timeout | p < threshold]──▶ INHALE_COMMAND
//!    ▲                                                      │
//!    │                                                      ▼
//!  RESET ◀──[t > exp]── EXHALE ◀──[t > pause]── PEAK ◀──[t > insp]── INHALE
//!                         ▲  ▲                                        │
//!                         │  └──────────── INHALE_ABORT ◀──[command]──┘
//!                    EXHALE_COMMAND
//! ```
//!
//! When both InhaleWait guards hold on the same step the timeout is
//! checked first, so the breath is recorded as [`TriggerSource::Timed`].

use log::trace;

use super::context::{BreathContext, TriggerSource};
use super::{ModeController, ModeState, StateDescriptor, StepIo, phases};

// ═══════════════════════════════════════════════════════════════════════════
//  State identity
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AcState {
    Start = 0,
    InhaleWait = 1,
    InhaleCommand = 2,
    Inhale = 3,
    InhaleAbort = 4,
    Peak = 5,
    ExhaleCommand = 6,
    Exhale = 7,
    Reset = 8,
}

impl ModeState for AcState {
    const COUNT: usize = 9;

    fn index(self) -> usize {
        self as usize
    }

    fn is_reset(self) -> bool {
        self == Self::Reset
    }

    fn is_start(self) -> bool {
        self == Self::Start
    }
}

impl AcState {
    /// True while an inhale can still be aborted.
    pub fn is_inhaling(self) -> bool {
        matches!(self, Self::InhaleCommand | Self::Inhale)
    }
}

pub type AcModeController = ModeController<AcState, { AcState::COUNT }>;

/// Build the AC controller.  Called once at startup.
pub fn controller() -> AcModeController {
    ModeController::new(build_state_table())
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor<AcState>; AcState::COUNT] {
    [
        StateDescriptor {
            id: AcState::Start,
            name: "ACStart",
            on_step: ac_start,
        },
        StateDescriptor {
            id: AcState::InhaleWait,
            name: "ACInhaleWait",
            on_step: ac_inhale_wait,
        },
        StateDescriptor {
            id: AcState::InhaleCommand,
            name: "ACInhaleCommand",
            on_step: ac_inhale_command,
        },
        StateDescriptor {
            id: AcState::Inhale,
            name: "ACInhale",
            on_step: ac_inhale,
        },
        StateDescriptor {
            id: AcState::InhaleAbort,
            name: "ACInhaleAbort",
            on_step: ac_inhale_abort,
        },
        StateDescriptor {
            id: AcState::Peak,
            name: "ACPeak",
            on_step: ac_peak,
        },
        StateDescriptor {
            id: AcState::ExhaleCommand,
            name: "ACExhaleCommand",
            on_step: ac_exhale_command,
        },
        StateDescriptor {
            id: AcState::Exhale,
            name: "ACExhale",
            on_step: ac_exhale,
        },
        StateDescriptor {
            id: AcState::Reset,
            name: "ACReset",
            on_step: ac_reset,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Handlers
// ═══════════════════════════════════════════════════════════════════════════

fn ac_start(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    phases::start(ctx, io);
    AcState::InhaleWait
}

fn ac_inhale_wait(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    trace!("ACInhaleWait: {} ms", io.breath_timer.elapsed_ms());

    let trigger = if io
        .breath_timer
        .exceeds_secs(ctx.params.trigger_threshold_time_s)
    {
        // Apnea is not flagged on timeout; the machine breath covers it.
        TriggerSource::Timed
    } else if ctx.pressure < ctx.params.trigger_threshold_pressure {
        TriggerSource::PatientEffort
    } else {
        return AcState::InhaleWait;
    };

    ctx.trigger = Some(trigger);
    io.breath_timer.reset();
    ctx.temp_peak_pressure = 0.0;
    AcState::InhaleCommand
}

fn ac_inhale_command(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    phases::command_inhale(ctx, io);
    AcState::Inhale
}

fn ac_inhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    if phases::inhale(ctx, io) {
        AcState::Peak
    } else {
        AcState::Inhale
    }
}

fn ac_inhale_abort(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    phases::abort_inhale(ctx, io);
    AcState::Exhale
}

fn ac_peak(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    if phases::hold(ctx, io) {
        AcState::Exhale
    } else {
        AcState::Peak
    }
}

fn ac_exhale_command(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    phases::command_exhale(ctx, io);
    AcState::Exhale
}

fn ac_exhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    if phases::exhale(ctx, io) {
        AcState::Reset
    } else {
        AcState::Exhale
    }
}

fn ac_reset(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> AcState {
    phases::reset(ctx, io);
    AcState::Start
}
