//! End-to-end: scripted I2C frames → pressure driver → hardware adapter →
//! breath controller.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use ventcore::adapters::hardware::HardwareAdapter;
use ventcore::app::commands::VentCommand;
use ventcore::app::service::BreathController;
use ventcore::clock::ManualClock;
use ventcore::config::VentilatorConfig;
use ventcore::drivers::buzzer::Buzzer;
use ventcore::drivers::motor::{MotorState, PaddleMotor};
use ventcore::error::Alarm;
use ventcore::sensors::HscPressureSensor;
use ventcore::sensors::pressure::DEFAULT_ADDRESS;
use ventcore::supervisor::MachineState;

use super::mock_hw::{RecordingAlarms, RecordingSink, TICK_MS};

/// Bus whose reply frame can be changed while the sensor owns it.
#[derive(Clone)]
struct SharedBus {
    frame: Rc<Cell<[u8; 2]>>,
}

impl ErrorType for SharedBus {
    type Error = ErrorKind;
}

impl I2c for SharedBus {
    fn transaction(&mut self, address: u8, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if address != DEFAULT_ADDRESS {
            return Err(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            ));
        }
        let frame = self.frame.get();
        for op in ops {
            if let Operation::Read(buf) = op {
                buf.copy_from_slice(&frame[..buf.len()]);
            }
        }
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// ≈10 cmH2O with normal status.
const FRAME_10_CMH2O: [u8; 2] = [(9124u16 >> 8) as u8, (9124u16 & 0xff) as u8];
/// Same count with the stale status bits set.
const FRAME_STALE: [u8; 2] = [0b1000_0000 | (9124u16 >> 8) as u8, (9124u16 & 0xff) as u8];

type Hw = HardwareAdapter<HscPressureSensor<SharedBus, NoDelay>>;

fn rig(frame: [u8; 2]) -> (Rc<Cell<[u8; 2]>>, Hw, BreathController) {
    let cell = Rc::new(Cell::new(frame));
    let bus = SharedBus { frame: cell.clone() };
    let hw = HardwareAdapter::new(
        HscPressureSensor::new(bus, NoDelay),
        PaddleMotor::new(),
        Buzzer::new(),
    );
    let ctl = BreathController::new(VentilatorConfig::default()).unwrap();
    (cell, hw, ctl)
}

#[test]
fn real_driver_chain_completes_a_breath() {
    let (_cell, mut hw, mut ctl) = rig(FRAME_10_CMH2O);
    let mut timer = ManualClock::new();
    let mut sink = RecordingSink::default();
    let mut alarms = RecordingAlarms::default();
    ctl.start(&mut sink);

    while ctl.context().cycles_completed == 0 {
        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(TICK_MS);
    }

    let b = ctl.recent_breaths().last().copied().unwrap();
    assert!((b.peep_pressure - 10.0).abs() < 0.05, "{b:?}");
    assert_eq!(b.errors, 0);
    assert!(matches!(hw.motor().state(), MotorState::Releasing { .. }));
}

#[test]
fn stale_frames_escalate_to_device_failure() {
    let (cell, mut hw, mut ctl) = rig(FRAME_10_CMH2O);
    let mut timer = ManualClock::new();
    let mut sink = RecordingSink::default();
    let mut alarms = RecordingAlarms::default();
    ctl.start(&mut sink);

    for _ in 0..5 {
        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(TICK_MS);
    }
    cell.set(FRAME_STALE);
    for _ in 0..3 {
        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(TICK_MS);
    }
    assert!(Alarm::DeviceFailure.is_set(ctl.errors()));
    assert!((ctl.context().pressure - 10.0).abs() < 0.05);

    // The buzzer follows the same mask the alarm handler sees.
    hw_annunciate(&mut hw, ctl.errors());
    assert!(hw.buzzer().is_on());

    while ctl.machine_state() != MachineState::Halted {
        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(TICK_MS);
    }
}

fn hw_annunciate(hw: &mut Hw, errors: u16) {
    use ventcore::app::ports::AlarmHandler;
    hw.annunciate(errors);
}

#[test]
fn acknowledge_stops_the_buzzer() {
    let (cell, mut hw, mut ctl) = rig(FRAME_10_CMH2O);
    let mut timer = ManualClock::new();
    let mut sink = RecordingSink::default();
    let mut alarms = RecordingAlarms::default();
    ctl.start(&mut sink);

    ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
    cell.set(FRAME_STALE);
    for _ in 0..3 {
        ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
        timer.advance(TICK_MS);
    }
    hw_annunciate(&mut hw, ctl.errors());
    assert!(hw.buzzer().is_on());

    // Alarm switch press, as the front panel issues it.
    ctl.handle_command(VentCommand::AcknowledgeAlarms, &mut sink)
        .unwrap();
    cell.set(FRAME_10_CMH2O);
    ctl.tick(&mut hw, &mut timer, &mut sink, &mut alarms);
    hw_annunciate(&mut hw, ctl.errors());
    assert_eq!(ctl.errors(), 0);
    assert!(!hw.buzzer().is_on());
}
