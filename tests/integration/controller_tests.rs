//! Integration tests for `BreathController` in volume-control mode.
//!
//! Drives the full per-tick loop against `MockHardware` with scripted
//! pressure waveforms and asserts on emitted events, motor commands and
//! the supervisor's decisions.

use ventcore::app::commands::VentCommand;
use ventcore::app::events::VentEvent;
use ventcore::app::ports::MotorCommand;
use ventcore::app::service::BreathController;
use ventcore::config::{AlarmThresholds, VentMode, VentilatorConfig};
use ventcore::error::{Alarm, SensorError};
use ventcore::fsm::BreathState;
use ventcore::fsm::ac::AcState;
use ventcore::fsm::context::TriggerSource;
use ventcore::fsm::vc::VcState;
use ventcore::supervisor::MachineState;

use super::mock_hw::{Harness, MockHardware};

/// One VC breath at the default 15 bpm, including the three bookkeeping
/// ticks (Start, InhaleCommand, Reset) and edge granularity.
const VC_BREATH_MS: u32 = 4060;

/// Ramp to ~25 cmH2O over the inhale, 20 cmH2O plateau, 5 cmH2O PEEP.
fn lung_waveform(t: u32) -> Result<f32, SensorError> {
    let phase = t % VC_BREATH_MS;
    Ok(match phase {
        0..20 => 5.0,
        20..1030 => 5.0 + 20.0 * (phase - 20) as f32 / 1010.0,
        1030..1290 => 20.0,
        _ => 5.0,
    })
}

fn started(config: VentilatorConfig, hw: MockHardware) -> Harness {
    let ctl = BreathController::new(config).unwrap();
    let mut h = Harness::new(ctl, hw);
    h.ctl.start(&mut h.sink);
    h
}

fn vc_harness(hw: MockHardware) -> Harness {
    started(VentilatorConfig::default(), hw)
}

// ── Timing ────────────────────────────────────────────────────

#[test]
fn vc_breath_period_tracks_parameters() {
    let mut h = vc_harness(MockHardware::constant(10.0));
    h.run_breaths(1);
    let first = h.hw.now_ms;
    h.run_breaths(1);
    let period = h.hw.now_ms - first;
    assert_eq!(period, VC_BREATH_MS);
    assert!((4000..=4100).contains(&period));
}

#[test]
fn vc_motor_sequence_repeats_every_breath() {
    let mut h = vc_harness(MockHardware::constant(10.0));
    h.run_breaths(3);
    assert_eq!(h.hw.count(|c| *c == MotorCommand::Home), 3);
    assert_eq!(
        h.hw.count(|c| matches!(c, MotorCommand::BeginInhale { .. })),
        3
    );
    assert_eq!(h.hw.count(|c| *c == MotorCommand::Hold), 3);
    assert_eq!(
        h.hw
            .count(|c| *c == MotorCommand::BeginExhale { duration_ms: 2750 }),
        3
    );
}

// ── Captures and summaries ────────────────────────────────────

#[test]
fn breath_summary_captures_lung_pressures() {
    let mut h = vc_harness(MockHardware::with_waveform(Box::new(lung_waveform)));
    h.run_breaths(3);

    let breaths: Vec<_> = h.ctl.recent_breaths().copied().collect();
    assert_eq!(breaths.len(), 3);
    for (i, b) in breaths.iter().enumerate() {
        assert_eq!(b.cycle, i as u32 + 1);
        assert_eq!(b.mode, VentMode::VolumeControl);
        assert_eq!(b.trigger, Some(TriggerSource::Timed));
        assert!(b.peak_pressure > 24.0 && b.peak_pressure <= 25.0, "{b:?}");
        assert_eq!(b.plateau_pressure, 20.0);
        assert_eq!(b.peep_pressure, 5.0);
        assert_eq!(b.errors, 0);
    }
    assert_eq!(h.ctl.errors(), 0);
    assert!(h.alarms.masks.iter().all(|m| *m == 0));
}

#[test]
fn state_changes_are_emitted_in_order() {
    let mut h = vc_harness(MockHardware::constant(10.0));
    h.run_breaths(1);
    let visited: Vec<BreathState> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            VentEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        visited,
        vec![
            BreathState::Vc(VcState::InhaleCommand),
            BreathState::Vc(VcState::Inhale),
            BreathState::Vc(VcState::Peak),
            BreathState::Vc(VcState::Exhale),
            BreathState::Vc(VcState::Reset),
            BreathState::Vc(VcState::Start),
        ]
    );
}

// ── Alarms ────────────────────────────────────────────────────

#[test]
fn soft_alarm_latches_across_breaths_until_acknowledged() {
    let config = VentilatorConfig {
        alarms: AlarmThresholds {
            max_pressure: 22.0,
            ..AlarmThresholds::default()
        },
        ..VentilatorConfig::default()
    };
    let mut h = started(
        config,
        MockHardware::with_waveform(Box::new(lung_waveform)),
    );
    h.run_breaths(2);

    // Soft alarm: the loop keeps going and the flag stays set.
    assert_eq!(h.ctl.machine_state(), MachineState::BreathLoop);
    assert!(Alarm::HighPressure.is_set(h.ctl.errors()));
    let raised = h
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, VentEvent::AlarmRaised(_)))
        .count();
    assert_eq!(raised, 1, "a latched flag is only reported once");

    h.ctl
        .handle_command(VentCommand::AcknowledgeAlarms, &mut h.sink)
        .unwrap();
    assert_eq!(h.ctl.errors(), 0);

    // The next breath raises it again.
    h.run_breaths(1);
    assert!(Alarm::HighPressure.is_set(h.ctl.errors()));
}

#[test]
fn peep_out_of_range_flags_at_reset() {
    let mut h = vc_harness(MockHardware::constant(18.0));
    h.run_breaths(1);
    assert_eq!(h.ctl.errors(), Alarm::HighPeep.mask());
    let summary = h.ctl.recent_breaths().last().copied().unwrap();
    assert_eq!(summary.errors, Alarm::HighPeep.mask());
}

#[test]
fn sensor_loss_halts_at_end_of_breath() {
    // Healthy for 300 ms, then the bus dies.
    let hw = MockHardware::with_waveform(Box::new(|t| {
        if t < 300 {
            Ok(12.0)
        } else {
            Err(SensorError::BusReadFailed)
        }
    }));
    let mut h = vc_harness(hw);

    h.run_for_ms(400);
    assert!(Alarm::DeviceFailure.is_set(h.ctl.errors()));
    assert_eq!(h.ctl.machine_state(), MachineState::BreathLoop);
    // Last good sample reused.
    assert_eq!(h.ctl.context().pressure, 12.0);

    h.run_for_ms(VC_BREATH_MS);
    assert_eq!(h.ctl.machine_state(), MachineState::Halted);
    let commands_at_halt = h.hw.motor.len();

    h.run_for_ms(2000);
    assert_eq!(h.hw.motor.len(), commands_at_halt, "halted loop must not drive the motor");
    assert!(
        h.alarms
            .masks
            .last()
            .is_some_and(|m| Alarm::DeviceFailure.is_set(*m))
    );
    assert!(
        h.sink
            .events
            .iter()
            .any(|e| *e == VentEvent::SensorFault(SensorError::BusReadFailed))
    );
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn stop_then_restart() {
    let mut h = vc_harness(MockHardware::constant(10.0));
    h.run_for_ms(500);
    h.ctl.handle_command(VentCommand::Stop, &mut h.sink).unwrap();
    h.run_breaths(1);
    assert_eq!(h.ctl.machine_state(), MachineState::Standby);

    let cycles = h.ctl.context().cycles_completed;
    h.run_for_ms(5000);
    assert_eq!(h.ctl.context().cycles_completed, cycles);

    h.ctl.handle_command(VentCommand::Start, &mut h.sink).unwrap();
    h.run_breaths(1);
    assert_eq!(h.ctl.machine_state(), MachineState::BreathLoop);
}

#[test]
fn mode_switch_to_assist_control_at_boundary() {
    let mut h = vc_harness(MockHardware::constant(10.0));
    h.run_for_ms(1500);
    h.ctl
        .handle_command(VentCommand::SetMode(VentMode::AssistControl), &mut h.sink)
        .unwrap();
    assert!(matches!(h.ctl.state(), BreathState::Vc(_)));

    h.run_breaths(1);
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::Start));
    assert_eq!(h.ctl.debug_code(), 1);

    // No patient effort at 10 cmH2O: the next breath is machine-timed.
    h.run_breaths(1);
    let last = h.ctl.recent_breaths().last().copied().unwrap();
    assert_eq!(last.mode, VentMode::AssistControl);
    assert_eq!(last.trigger, Some(TriggerSource::Timed));
}

#[test]
fn telemetry_snapshot_mid_breath() {
    let mut h = vc_harness(MockHardware::with_waveform(Box::new(lung_waveform)));
    h.run_breaths(1);
    h.run_for_ms(500);
    let t = h.ctl.build_telemetry();
    assert_eq!(t.state, BreathState::Vc(VcState::Inhale));
    assert_eq!(t.debug_code, 3);
    assert_eq!(t.cycles_completed, 1);
    assert_eq!(t.peep_pressure, 5.0);
}
