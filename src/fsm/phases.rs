//! Phase bodies shared by the AC and VC tables.
//!
//! Both modes run the same inhale / hold / exhale / reset rules; they differ
//! only in how a breath starts.  Each function here performs one phase's
//! sampling, alarm checks and edge captures, and reports whether the phase
//! guard fired so the mode table can pick its own next state.

use log::trace;

use super::context::BreathContext;
use super::{StepIo, secs_to_ms};
use crate::app::ports::MotorCommand;
use crate::supervisor::MachineState;

/// Cycle start: clear per-cycle bookkeeping and home the paddle.
pub(crate) fn start(ctx: &mut BreathContext, io: &mut StepIo<'_>) {
    io.breath_timer.reset();
    ctx.captures = Default::default();
    ctx.trigger = None;
    io.actuator.command(MotorCommand::Home);
}

/// Issue the inhale stroke and arm the inhale phase timer.
pub(crate) fn command_inhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) {
    io.actuator.command(MotorCommand::BeginInhale {
        tidal_volume_percent: ctx.params.tidal_volume_percent,
        duration_ms: secs_to_ms(ctx.params.inspiration_time_s),
    });
    io.breath_timer.reset();
}

/// Issue the exhale release and arm the exhale phase timer.
pub(crate) fn command_exhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) {
    io.actuator.command(MotorCommand::BeginExhale {
        duration_ms: secs_to_ms(ctx.params.expiration_time_s),
    });
    io.breath_timer.reset();
}

/// Inhale: track the running peak and check for over-pressure every step.
/// Returns `true` on the Inhale→Peak edge, after capturing the peak.
pub(crate) fn inhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> bool {
    trace!(
        "Inhale: {} ms of {:.2} s",
        io.breath_timer.elapsed_ms(),
        ctx.params.inspiration_time_s
    );

    ctx.track_peak();
    ctx.raise(ctx.alarms.check_high_pressure(ctx.pressure));

    if !io.breath_timer.exceeds_secs(ctx.params.inspiration_time_s) {
        return false;
    }

    io.breath_timer.reset();
    ctx.capture_peak();
    if ctx.check_low_pressure_at_peak {
        ctx.raise(ctx.alarms.check_low_pressure(ctx.peak_pressure));
    }
    io.actuator.command(MotorCommand::Hold);
    true
}

/// Early exit from an inhale.  Still captures the peak seen so far and
/// checks the current sample before the exhale starts.
pub(crate) fn abort_inhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) {
    trace!("InhaleAbort: {} ms", io.breath_timer.elapsed_ms());

    ctx.track_peak();
    ctx.capture_peak();
    ctx.raise(ctx.alarms.check_high_pressure(ctx.pressure));
    command_exhale(ctx, io);
}

/// Plateau hold.  Over-pressure is flagged every step; only the timer
/// ends the phase.  Returns `true` on the Peak→Exhale edge.
pub(crate) fn hold(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> bool {
    trace!(
        "Peak: {} ms of {:.2} s",
        io.breath_timer.elapsed_ms(),
        ctx.params.plateau_pause_s
    );

    ctx.raise(ctx.alarms.check_high_pressure(ctx.pressure));

    if !io.breath_timer.exceeds_secs(ctx.params.plateau_pause_s) {
        return false;
    }

    ctx.capture_plateau();
    command_exhale(ctx, io);
    true
}

/// Exhale.  Returns `true` on the Exhale→Reset edge, after capturing PEEP.
pub(crate) fn exhale(ctx: &mut BreathContext, io: &mut StepIo<'_>) -> bool {
    trace!(
        "Exhale: {} ms of {:.2} s",
        io.breath_timer.elapsed_ms(),
        ctx.params.expiration_time_s
    );

    if !io.breath_timer.exceeds_secs(ctx.params.expiration_time_s) {
        return false;
    }

    io.breath_timer.reset();
    ctx.capture_peep();
    true
}

/// Cycle end: PEEP alarms on the current sample, re-arm the context and
/// signal the supervisor.
pub(crate) fn reset(ctx: &mut BreathContext, io: &mut StepIo<'_>) {
    ctx.raise(ctx.alarms.check_peep(ctx.pressure));
    io.breath_timer.reset();
    ctx.temp_peak_pressure = 0.0;
    ctx.cycles_completed = ctx.cycles_completed.wrapping_add(1);
    *io.machine_state = MachineState::BreathLoopStart;
}
