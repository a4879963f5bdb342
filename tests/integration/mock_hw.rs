//! Mock hardware adapter for integration tests.
//!
//! Plays back a scripted pressure waveform and records every motor command
//! and alarm annunciation so tests can assert on the full history without
//! touching real GPIO/PWM registers.

use ventcore::app::events::VentEvent;
use ventcore::app::ports::{AlarmHandler, EventSink, MotorActuator, MotorCommand, PressureSource};
use ventcore::app::service::BreathController;
use ventcore::clock::{Clock, ManualClock};
use ventcore::error::SensorError;

/// Control period used by every scenario (ms).
pub const TICK_MS: u32 = 10;

// ── MockHardware ──────────────────────────────────────────────

/// Pressure as a function of elapsed run time (ms).
pub type Waveform = Box<dyn FnMut(u32) -> Result<f32, SensorError>>;

pub struct MockHardware {
    pub waveform: Waveform,
    pub now_ms: u32,
    pub motor: Vec<MotorCommand>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn constant(pressure: f32) -> Self {
        Self::with_waveform(Box::new(move |_| Ok(pressure)))
    }

    pub fn with_waveform(waveform: Waveform) -> Self {
        Self {
            waveform,
            now_ms: 0,
            motor: Vec::new(),
        }
    }

    pub fn last_motor(&self) -> Option<&MotorCommand> {
        self.motor.last()
    }

    pub fn count(&self, pred: impl Fn(&MotorCommand) -> bool) -> usize {
        self.motor.iter().filter(|c| pred(c)).count()
    }
}

impl PressureSource for MockHardware {
    fn read_pressure(&mut self) -> Result<f32, SensorError> {
        (self.waveform)(self.now_ms)
    }
}

impl MotorActuator for MockHardware {
    fn command(&mut self, command: MotorCommand) {
        self.motor.push(command);
    }
}

// ── Recording sinks ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<VentEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &VentEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingAlarms {
    pub masks: Vec<u16>,
}

impl AlarmHandler for RecordingAlarms {
    fn annunciate(&mut self, errors: u16) {
        self.masks.push(errors);
    }
}

// ── Harness ───────────────────────────────────────────────────

pub struct Harness {
    pub ctl: BreathController,
    pub hw: MockHardware,
    pub timer: ManualClock,
    pub sink: RecordingSink,
    pub alarms: RecordingAlarms,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(ctl: BreathController, hw: MockHardware) -> Self {
        Self {
            ctl,
            hw,
            timer: ManualClock::new(),
            sink: RecordingSink::default(),
            alarms: RecordingAlarms::default(),
        }
    }

    /// One control period: tick, then let time pass.
    pub fn tick(&mut self) {
        self.ctl
            .tick(&mut self.hw, &mut self.timer, &mut self.sink, &mut self.alarms);
        self.timer.advance(TICK_MS);
        self.hw.now_ms += TICK_MS;
    }

    pub fn run_for_ms(&mut self, ms: u32) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Tick until `n` more breaths have completed.
    pub fn run_breaths(&mut self, n: u32) {
        let target = self.ctl.context().cycles_completed + n;
        for _ in 0..100_000 {
            if self.ctl.context().cycles_completed >= target {
                return;
            }
            self.tick();
        }
        panic!("breaths did not complete");
    }

    pub fn timer_ms(&self) -> u32 {
        self.timer.elapsed_ms()
    }
}
