//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the pressure sensor, the paddle motor and the buzzer, exposing
//! them through [`PressureSource`], [`MotorActuator`] and
//! [`AlarmHandler`].  This is the only module in the system that touches
//! actual hardware.  The sensor is generic so the host can substitute a
//! scripted source; the motor and buzzer use cfg-gated no-op GPIO on
//! non-espidf targets.

use crate::app::ports::{AlarmHandler, MotorActuator, MotorCommand, PressureSource};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::motor::PaddleMotor;
use crate::error::SensorError;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P> {
    pressure: P,
    motor: PaddleMotor,
    buzzer: Buzzer,
}

impl<P: PressureSource> HardwareAdapter<P> {
    pub fn new(pressure: P, motor: PaddleMotor, buzzer: Buzzer) -> Self {
        Self {
            pressure,
            motor,
            buzzer,
        }
    }

    pub fn motor(&self) -> &PaddleMotor {
        &self.motor
    }

    pub fn buzzer(&self) -> &Buzzer {
        &self.buzzer
    }

    /// De-energise the bridge.  The buzzer keeps following the alarms.
    pub fn motor_off(&mut self) {
        self.motor.disable();
    }
}

// ── PressureSource implementation ─────────────────────────────

impl<P: PressureSource> PressureSource for HardwareAdapter<P> {
    fn read_pressure(&mut self) -> Result<f32, SensorError> {
        self.pressure.read_pressure()
    }
}

// ── MotorActuator implementation ──────────────────────────────

impl<P> MotorActuator for HardwareAdapter<P> {
    fn command(&mut self, command: MotorCommand) {
        self.motor.command(command);
    }
}

// ── AlarmHandler implementation ───────────────────────────────

impl<P> AlarmHandler for HardwareAdapter<P> {
    fn annunciate(&mut self, errors: u16) {
        self.buzzer.update(errors);
    }
}
