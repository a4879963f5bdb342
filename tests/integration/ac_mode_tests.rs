//! Assist-control scenarios: patient-triggered and machine-timed breaths,
//! and operator aborts, through the full controller loop.

use ventcore::app::commands::VentCommand;
use ventcore::app::events::VentEvent;
use ventcore::app::ports::MotorCommand;
use ventcore::app::service::BreathController;
use ventcore::config::{VentMode, VentilatorConfig};
use ventcore::fsm::BreathState;
use ventcore::fsm::ac::AcState;
use ventcore::fsm::context::TriggerSource;

use super::mock_hw::{Harness, MockHardware};

fn ac_harness(hw: MockHardware) -> Harness {
    let config = VentilatorConfig {
        mode: VentMode::AssistControl,
        ..VentilatorConfig::default()
    };
    let mut h = Harness::new(BreathController::new(config).unwrap(), hw);
    h.ctl.start(&mut h.sink);
    h
}

#[test]
fn patient_effort_triggers_before_timeout() {
    // Airway pressure dips below the 3 cmH2O trigger 200 ms into the wait.
    let hw = MockHardware::with_waveform(Box::new(|t| Ok(if t == 200 { 1.0 } else { 8.0 })));
    let mut h = ac_harness(hw);

    h.run_for_ms(200);
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::InhaleWait));
    h.tick();
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::InhaleCommand));
    assert_eq!(h.ctl.context().trigger, Some(TriggerSource::PatientEffort));
}

#[test]
fn no_effort_times_out_into_machine_breath() {
    let mut h = ac_harness(MockHardware::constant(8.0));
    h.run_breaths(1);
    let b = h.ctl.recent_breaths().last().copied().unwrap();
    assert_eq!(b.trigger, Some(TriggerSource::Timed));
    assert_eq!(b.mode, VentMode::AssistControl);

    // Wait window (0.5 s) plus a VC-length breath.
    assert_eq!(h.hw.now_ms, 4570);
}

#[test]
fn debug_code_follows_ac_enumeration() {
    let mut h = ac_harness(MockHardware::constant(8.0));
    let mut codes = vec![h.ctl.debug_code()];
    for _ in 0..200 {
        h.tick();
        if codes.last() != Some(&h.ctl.debug_code()) {
            codes.push(h.ctl.debug_code());
        }
    }
    // Start, InhaleWait, InhaleCommand, Inhale, Peak.  InhaleAbort (5) is
    // only visited on an operator abort.
    assert_eq!(codes, vec![1, 2, 3, 4, 6]);
}

#[test]
fn operator_abort_skips_plateau() {
    let mut h = ac_harness(MockHardware::constant(8.0));
    // Through the 0.5 s wait and into the inhale.
    h.run_for_ms(700);
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::Inhale));

    h.ctl
        .handle_command(VentCommand::AbortInhale, &mut h.sink)
        .unwrap();
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::InhaleAbort));
    h.tick();
    assert_eq!(h.ctl.state(), BreathState::Ac(AcState::Exhale));
    assert_eq!(
        h.hw.last_motor(),
        Some(&MotorCommand::BeginExhale { duration_ms: 2750 })
    );
    assert!(!h.hw.motor.contains(&MotorCommand::Hold));

    h.run_breaths(1);
    let b = h.ctl.recent_breaths().last().copied().unwrap();
    assert_eq!(b.peak_pressure, 8.0);
    assert_eq!(h.ctl.context().captures.plateau, 0);
    assert!(h.sink.events.contains(&VentEvent::StateChanged {
        from: BreathState::Ac(AcState::Inhale),
        to: BreathState::Ac(AcState::InhaleAbort),
    }));
}
