//! Unified error types for the ventilator core.
//!
//! A single `Error` enum that every subsystem converts into, plus the
//! [`Alarm`] flag set that the breath controller accumulates into its
//! `u16` error bitmask.  All variants are `Copy` so they can be passed
//! through the state machine and the supervisor without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pressure sensor could not deliver a sample.
    Sensor(SensorError),
    /// Configuration is out of range or inconsistent.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction failed or returned no bytes.
    BusReadFailed,
    /// The sensor reported stale data (status bits `10`).
    StaleData,
    /// The sensor reported a diagnostic condition (status bits `11`).
    Diagnostic,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusReadFailed => write!(f, "bus read failed"),
            Self::StaleData => write!(f, "stale data"),
            Self::Diagnostic => write!(f, "sensor diagnostic fault"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field is outside its permitted range.  Names the field.
    OutOfRange(&'static str),
    /// Timing parameters do not fit inside one breath period.
    InvalidTiming(&'static str),
    /// An upper threshold is not above its lower counterpart.
    InvertedThresholds(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(field) => write!(f, "{field} out of range"),
            Self::InvalidTiming(msg) => write!(f, "invalid timing: {msg}"),
            Self::InvertedThresholds(pair) => write!(f, "inverted thresholds: {pair}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Alarm flags
// ---------------------------------------------------------------------------

/// Alarm conditions, one bit each in the `u16` error bitmask.
///
/// Pressure-bound alarms are soft: they are flagged and reported but the
/// phase that raised them keeps running on its own timer.  `Disconnect`
/// and `DeviceFailure` are fatal-class and cause the supervisor to halt
/// the breath loop at the next cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Alarm {
    HighPressure = 1 << 0,
    LowPressure = 1 << 1,
    HighPeep = 1 << 2,
    LowPeep = 1 << 3,
    Disconnect = 1 << 4,
    HighTemp = 1 << 5,
    /// Defined for completeness; never raised by the breath controller.
    Apnea = 1 << 6,
    DeviceFailure = 1 << 7,
}

impl Alarm {
    /// Every defined flag, in bit order.
    pub const ALL: [Alarm; 8] = [
        Self::HighPressure,
        Self::LowPressure,
        Self::HighPeep,
        Self::LowPeep,
        Self::Disconnect,
        Self::HighTemp,
        Self::Apnea,
        Self::DeviceFailure,
    ];

    /// Flags that stop the breath loop.
    pub const FATAL_MASK: u16 = Self::Disconnect.mask() | Self::DeviceFailure.mask();

    /// Return the bitmask for this alarm.
    pub const fn mask(self) -> u16 {
        self as u16
    }

    /// True if this alarm must halt the breath loop.
    pub const fn is_fatal(self) -> bool {
        self.mask() & Self::FATAL_MASK != 0
    }

    /// Check whether this alarm is set in `errors`.
    pub const fn is_set(self, errors: u16) -> bool {
        errors & self.mask() != 0
    }

    /// Iterate over the alarms set in `errors`.
    pub fn iter_set(errors: u16) -> impl Iterator<Item = Alarm> {
        Self::ALL.into_iter().filter(move |a| a.is_set(errors))
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighPressure => write!(f, "high pressure"),
            Self::LowPressure => write!(f, "low pressure"),
            Self::HighPeep => write!(f, "high PEEP"),
            Self::LowPeep => write!(f, "low PEEP"),
            Self::Disconnect => write!(f, "circuit disconnect"),
            Self::HighTemp => write!(f, "high temperature"),
            Self::Apnea => write!(f, "apnea"),
            Self::DeviceFailure => write!(f, "device failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
