//! GPIO / peripheral pin assignments for the ventilator main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Paddle motor (H-bridge)
// ---------------------------------------------------------------------------

/// LEDC PWM output for paddle speed.
pub const MOTOR_PWM_GPIO: i32 = 1;
/// Digital output: HIGH = compress (inhale), LOW = release (exhale).
pub const MOTOR_DIR_GPIO: i32 = 2;
/// Digital output: H-bridge enable (active HIGH).  Holding position needs
/// the bridge enabled with zero duty.
pub const MOTOR_ENABLE_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Front-panel switches (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Alarm acknowledge switch.
pub const ALARM_SWITCH_GPIO: i32 = 4;
/// Mode select switch: LOW = assist-control, HIGH = volume-control.
pub const MODE_SWITCH_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Alarm annunciation
// ---------------------------------------------------------------------------

/// Piezo buzzer driver (active HIGH).
pub const ALARM_BUZZER_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// I²C bus (airway pressure sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// Bus clock.  The pressure sensor supports up to 400 kHz.
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the paddle motor (25 kHz, inaudible).
pub const MOTOR_PWM_FREQ_HZ: u32 = 25_000;
