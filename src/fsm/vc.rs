//! Volume-control (VC) state table.
//!
//! Every breath is machine-initiated: there is no trigger wait, and the
//! cycle is a pure function of elapsed time.  Pressure only feeds the
//! captures and the alarm checks.
//!
//! ```text
//!  START ──▶ INHALE_COMMAND ──▶ INHALE ──[t > insp]──▶ PEAK ──[t > pause]──▶ EXHALE
//!    ▲                            │                                           │  ▲
//!    │                       [command]                                  [t > exp]│
//!    │                            ▼                                           │  │
//!    │                       INHALE_ABORT ────────────────────────────────────┼──┘
//!    └──────────────────────────── RESET ◀────────────────────────────────────┘
//! ```

use log::trace;

use super::context::{BreathContext, TriggerSource};
use super::{ModeController, ModeState, StateDescriptor, StepIo, phases};

// ═══════════════════════════════════════════════════════════════════════════
//  State identity
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VcState {
    Start = 0,
    InhaleCommand = 1,
    Inhale = 2,
    InhaleAbort = 3,
    Peak = 4,
    Exhale = 5,
    Reset = 6,
}

impl ModeState for VcState {
    const COUNT: usize = 7;

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

impl VcState {
    /// True while an inhale can still be aborted.
    pub fn is_inhaling(self) -> bool {
        matches!(self, Self::InhaleCommand | Self::Inhale)
    }
}

pub type VcModeController = ModeController<VcState, { VcState::COUNT }>;

/// Build the VC controller.  Called once at startup.
pub fn controller() -> VcModeController {
    ModeController::new(build_state_table())
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor<VcState>; VcState::COUNT] {
    [
        StateDescriptor {
            id: VcState::Start,
            name: "VCStart",
            on_step: vc_start,
        },
        StateDescriptor {
            id: VcState::InhaleCommand,
            name: "VCInhaleCommand",
            on_step: vc_inhale_command,
        },
        StateDescriptor {
            id: VcState::Inhale,
            name: "VCInhale",
            on_step: vc_inhale,
        },
        StateDescriptor {
            id: VcState::InhaleAbort,
            name: "VCInhaleAbort",
            on_step: vc_inhale_abort,
        },
        StateDescriptor {
            id: VcState::Peak,
            name: "VCPeak",
            on_step: vc_peak,
        },
        StateDescriptor {
            id: VcState::Exhale,
            name: "VCExhale",
            on_step: vc_exhale,
        },
        StateDescriptor {
            id: VcState::Reset,
            name: "VCReset",
            on_step: vc_reset,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Handlers
// ═══════════════════════════════════════════════════════════════════════════

fn vc_start(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    phases::start(ctx, io);
    ctx.temp_peak_pressure = 0.0;
    ctx.trigger = Some(TriggerSource::Timed);
    VcState::InhaleCommand
}

fn vc_inhale_command(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    phases::command_inhale(ctx, io);
    VcState::Inhale
}

fn vc_inhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    if phases::inhale(ctx, io) {
        VcState::Peak
    } else {
        VcState::Inhale
    }
}

fn vc_inhale_abort(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    phases::abort_inhale(ctx, io);
    VcState::Exhale
}

fn vc_peak(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    trace!(
        "VCPeak: breath {} inhale {:.2} s, peak {:.1} cmH2O",
        ctx.cycles_completed, ctx.params.inspiration_time_s, ctx.peak_pressure
    );
    if phases::hold(ctx, io) {
        VcState::Exhale
    } else {
        VcState::Peak
    }
}

fn vc_exhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    if phases::exhale(ctx, io) {
        VcState::Reset
    } else {
        VcState::Exhale
    }
}

fn vc_reset(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> VcState {
    phases::reset(ctx, io);
    VcState::Start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::MotorCommand;
    use crate::clock::Clock;
    use crate::error::Alarm;
    use crate::fsm::test_support::Rig;
    use crate::supervisor::MachineState;

    const TICK_MS: u32 = 10;

    /// Run one cycle from Start until Reset has executed, recording the
    /// tick at which each state was first entered.
    fn run_cycle(rig: &mut Rig, pressure: impl Fn(u32) -> f32) -> Vec<(VcState, u32)> {
        let fsm = controller();
        let mut state = VcState::Start;
        let mut entered = vec![(state, 0)];
        for tick in 0..2000 {
            let was_reset = state == VcState::Reset;
            state = rig.step(&fsm, state, pressure(tick), TICK_MS);
            if was_reset {
                return entered;
            }
            if entered.last().map(|(s, _)| *s) != Some(state) {
                entered.push((state, tick + 1));
            }
        }
        panic!("cycle did not complete");
    }

    #[test]
    fn debug_codes_are_one_indexed() {
        assert_eq!(VcState::Start.debug_code(), 1);
        assert_eq!(VcState::InhaleCommand.debug_code(), 2);
        assert_eq!(VcState::Reset.debug_code(), 7);
    }

    #[test]
    fn start_goes_straight_to_inhale_command() {
        let fsm = controller();
        let mut rig = Rig::new();
        rig.ctx.temp_peak_pressure = 18.0;
        rig.clock.advance(300);

        let state = rig.step(&fsm, VcState::Start, 10.0, 0);
        assert_eq!(state, VcState::InhaleCommand);
        assert_eq!(rig.clock.elapsed_ms(), 0);
        assert_eq!(rig.ctx.temp_peak_pressure, 0.0);
        assert_eq!(rig.ctx.trigger, Some(TriggerSource::Timed));
    }

    #[test]
    fn full_cycle_is_timed_independent_of_pressure() {
        let mut quiet = Rig::new();
        let a = run_cycle(&mut quiet, |_| 10.0);

        let mut noisy = Rig::new();
        let b = run_cycle(&mut noisy, |t| if t % 2 == 0 { 0.5 } else { 39.0 });

        assert_eq!(a, b);
        let states: Vec<VcState> = a.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            states,
            vec![
                VcState::Start,
                VcState::InhaleCommand,
                VcState::Inhale,
                VcState::Peak,
                VcState::Exhale,
                VcState::Reset,
            ]
        );
        assert_eq!(quiet.machine, MachineState::BreathLoopStart);
        assert_eq!(noisy.machine, MachineState::BreathLoopStart);
    }

    #[test]
    fn phase_durations_follow_parameters() {
        let mut rig = Rig::new();
        let entered = run_cycle(&mut rig, |_| 10.0);
        let at = |s: VcState| entered.iter().find(|(x, _)| *x == s).map(|(_, t)| *t).unwrap();

        // Timer armed at InhaleCommand; edge on the first step above 1000 ms.
        assert_eq!(at(VcState::Peak) - at(VcState::Inhale), 101);
        assert_eq!(at(VcState::Exhale) - at(VcState::Peak), 26);
        assert_eq!(at(VcState::Reset) - at(VcState::Exhale), 276);
    }

    #[test]
    fn noisy_pressure_only_changes_flags() {
        let mut rig = Rig::new();
        run_cycle(&mut rig, |t| if t % 2 == 0 { 0.5 } else { 45.0 });
        assert!(Alarm::HighPressure.is_set(rig.ctx.errors));
        assert_eq!(rig.ctx.cycles_completed, 1);
    }

    #[test]
    fn captures_happen_once_per_cycle() {
        let mut rig = Rig::new();
        run_cycle(&mut rig, |t| 5.0 + (t % 20) as f32);
        assert_eq!(rig.ctx.captures.peak, 1);
        assert_eq!(rig.ctx.captures.plateau, 1);
        assert_eq!(rig.ctx.captures.peep, 1);
    }

    #[test]
    fn motor_sequence_over_one_cycle() {
        let mut rig = Rig::new();
        run_cycle(&mut rig, |_| 10.0);
        assert_eq!(
            rig.motor.commands,
            vec![
                MotorCommand::Home,
                MotorCommand::BeginInhale {
                    tidal_volume_percent: 60.0,
                    duration_ms: 1000,
                },
                MotorCommand::Hold,
                MotorCommand::BeginExhale { duration_ms: 2750 },
            ]
        );
    }

    #[test]
    fn abort_skips_plateau_capture() {
        let fsm = controller();
        let mut rig = Rig::new();
        let state = rig.step(&fsm, VcState::InhaleAbort, 20.0, 0);
        assert_eq!(state, VcState::Exhale);
        assert_eq!(rig.ctx.captures.plateau, 0);
        assert_eq!(rig.ctx.captures.peak, 1);
    }
}
