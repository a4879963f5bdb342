//! Fuzz target: breath controller under arbitrary input streams
//!
//! Each input byte pair becomes one control tick: a pressure sample (or a
//! sensor failure), a tick length, and occasionally an operator command.
//! Verifies:
//! - No panics for any sequence
//! - The debug code always lies within the active mode's enumeration
//! - Flags only leave the bitmask through `AcknowledgeAlarms`
//! - A halted controller never issues motor commands
//!
//! cargo fuzz run fuzz_breath_step

#![no_main]

use libfuzzer_sys::fuzz_target;
use ventcore::app::commands::VentCommand;
use ventcore::app::events::VentEvent;
use ventcore::app::ports::{AlarmHandler, EventSink, MotorActuator, MotorCommand, PressureSource};
use ventcore::app::service::BreathController;
use ventcore::clock::ManualClock;
use ventcore::config::{VentMode, VentilatorConfig};
use ventcore::error::SensorError;
use ventcore::fsm::BreathState;
use ventcore::supervisor::MachineState;

struct FuzzHw {
    next: Result<f32, SensorError>,
    commands: usize,
}

impl PressureSource for FuzzHw {
    fn read_pressure(&mut self) -> Result<f32, SensorError> {
        self.next
    }
}

impl MotorActuator for FuzzHw {
    fn command(&mut self, _command: MotorCommand) {
        self.commands += 1;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &VentEvent) {}
}

impl AlarmHandler for Discard {
    fn annunciate(&mut self, _errors: u16) {}
}

fuzz_target!(|data: &[u8]| {
    let mode = if data.first().is_some_and(|b| b & 1 == 1) {
        VentMode::AssistControl
    } else {
        VentMode::VolumeControl
    };
    let config = VentilatorConfig {
        mode,
        ..VentilatorConfig::default()
    };
    let Ok(mut ctl) = BreathController::new(config) else {
        return;
    };
    let mut hw = FuzzHw {
        next: Ok(0.0),
        commands: 0,
    };
    let mut timer = ManualClock::new();
    let mut sink = Discard;
    let mut alarms = Discard;
    ctl.start(&mut sink);

    for pair in data.chunks_exact(2) {
        let (a, b) = (pair[0], pair[1]);
        hw.next = match a {
            0xff => Err(SensorError::BusReadFailed),
            0xfe => Err(SensorError::StaleData),
            _ => Ok(f32::from(a) * 0.5 - 20.0),
        };

        let acknowledged = match b {
            0xf0 => {
                let _ = ctl.handle_command(VentCommand::AcknowledgeAlarms, &mut sink);
                true
            }
            0xf1 => {
                let _ = ctl.handle_command(VentCommand::AbortInhale, &mut sink);
                false
            }
            0xf2 => {
                let _ = ctl.handle_command(VentCommand::Stop, &mut sink);
                false
            }
            0xf3 => {
                let _ = ctl.handle_command(VentCommand::Start, &mut sink);
                false
            }
            0xf4 => {
                let _ = ctl.handle_command(VentCommand::SetMode(VentMode::AssistControl), &mut sink);
                false
            }
            0xf5 => {
                let _ = ctl.handle_command(VentCommand::SetMode(VentMode::VolumeControl), &mut sink);
                false
            }
            _ => false,
        };

        let errors_before = ctl.errors();
        let commands_before = hw.commands;
        let halted = ctl.machine_state() == MachineState::Halted;

        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(u32::from(b & 0x3f) + 1);

        if !acknowledged {
            assert_eq!(ctl.errors() & errors_before, errors_before);
        }
        if halted {
            assert_eq!(hw.commands, commands_before);
        }
        let limit = match ctl.state() {
            BreathState::Ac(_) => 9,
            BreathState::Vc(_) => 7,
        };
        assert!((1..=limit).contains(&ctl.debug_code()));
    }
});
