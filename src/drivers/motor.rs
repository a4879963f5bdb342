//! Paddle motor driver (brushed DC gearmotor on an H-bridge).
//!
//! Translates breath-phase [`MotorCommand`]s into a direction level and a
//! PWM duty.  The paddle speed for a stroke is chosen so that the requested
//! fraction of the full stroke completes in the requested time; the exhale
//! stroke returns the same distance the inhale travelled.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use log::debug;

use crate::app::ports::{MotorActuator, MotorCommand};
use crate::drivers::hw_init;
use crate::pins;

/// Full 0→100% stroke time at 100% duty (ms).
pub const FULL_STROKE_MS: f32 = 600.0;
/// Duty used to drive the paddle back to its zero stop.
pub const HOME_DUTY: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorState {
    Idle,
    Homing,
    Compressing { duty: u8 },
    Holding,
    Releasing { duty: u8 },
}

pub struct PaddleMotor {
    state: MotorState,
    /// Stroke fraction commanded by the last inhale (0–100).
    stroke_percent: f32,
    last_command: Option<MotorCommand>,
}

impl PaddleMotor {
    pub fn new() -> Self {
        Self {
            state: MotorState::Idle,
            stroke_percent: 0.0,
            last_command: None,
        }
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.last_command
    }

    /// De-energise the bridge.
    pub fn disable(&mut self) {
        self.drive(Direction::Release, 0);
        hw_init::gpio_write(pins::MOTOR_ENABLE_GPIO, false);
        self.state = MotorState::Idle;
    }

    fn drive(&mut self, dir: Direction, duty: u8) {
        hw_init::gpio_write(pins::MOTOR_ENABLE_GPIO, true);
        hw_init::gpio_write(pins::MOTOR_DIR_GPIO, dir == Direction::Compress);
        let duty_8bit = ((duty.min(100) as u16) * 255 / 100) as u8;
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, duty_8bit);
    }
}

impl Default for PaddleMotor {
    fn default() -> Self {
        Self::new()
    }
}

/// Duty (0–100) that moves `stroke_percent` of the stroke in `duration_ms`.
pub fn stroke_duty(stroke_percent: f32, duration_ms: u32) -> u8 {
    if duration_ms == 0 || stroke_percent <= 0.0 {
        return 0;
    }
    let travel_ms = stroke_percent / 100.0 * FULL_STROKE_MS;
    let duty = travel_ms / duration_ms as f32 * 100.0;
    duty.clamp(0.0, 100.0) as u8
}

impl MotorActuator for PaddleMotor {
    fn command(&mut self, command: MotorCommand) {
        debug!("motor: {:?}", command);
        self.last_command = Some(command);
        match command {
            MotorCommand::Home => {
                self.drive(Direction::Release, HOME_DUTY);
                self.stroke_percent = 0.0;
                self.state = MotorState::Homing;
            }
            MotorCommand::BeginInhale {
                tidal_volume_percent,
                duration_ms,
            } => {
                let duty = stroke_duty(tidal_volume_percent, duration_ms);
                self.drive(Direction::Compress, duty);
                self.stroke_percent = tidal_volume_percent;
                self.state = MotorState::Compressing { duty };
            }
            MotorCommand::Hold => {
                self.drive(Direction::Compress, 0);
                self.state = MotorState::Holding;
            }
            MotorCommand::BeginExhale { duration_ms } => {
                let duty = stroke_duty(self.stroke_percent, duration_ms);
                self.drive(Direction::Release, duty);
                self.stroke_percent = 0.0;
                self.state = MotorState::Releasing { duty };
            }
        }
    }
}
