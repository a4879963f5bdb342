//! Differential airway-pressure sensor on I2C (±1 psi, 14-bit output).
//!
//! The sensor answers a plain 2-byte read:
//!
//! ```text
//!   byte 0: [S1 S0 b13 b12 b11 b10 b9 b8]
//!   byte 1: [b7 b6 b5  b4  b3  b2  b1 b0]
//! ```
//!
//! `S1 S0` is the status field (`00` normal, `01` command mode, `10` stale,
//! `11` diagnostic).  The 14-bit count spans the 10%–90% transfer band,
//! 1638 to 14745 counts for −1 psi to +1 psi.
//!
//! ## Dual-target design
//!
//! The driver is generic over [`I2c`] and [`DelayNs`]; `main` hands it the
//! ESP-IDF `I2cDriver` and `Delay`, tests hand it a scripted bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, warn};

use crate::app::ports::PressureSource;
use crate::error::SensorError;

/// Factory-default 7-bit bus address.
pub const DEFAULT_ADDRESS: u8 = 0x28;

const STATUS_MASK: u8 = 0b1100_0000;
const COUNT_MSB_MASK: u8 = 0b0011_1111;

const MIN_COUNTS: u16 = 1638;
const MAX_COUNTS: u16 = 14745;
const MIN_PSI: f32 = -1.0;
const MAX_PSI: f32 = 1.0;

pub const PSI_TO_CMH2O: f32 = 70.307;

/// Conversion settling time before each read (ms).
const SETTLE_MS: u32 = 5;

/// Status field of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Normal,
    CommandMode,
    Stale,
    Diagnostic,
}

impl SensorStatus {
    fn from_msb(msb: u8) -> Self {
        match (msb & STATUS_MASK) >> 6 {
            0b00 => Self::Normal,
            0b01 => Self::CommandMode,
            0b10 => Self::Stale,
            _ => Self::Diagnostic,
        }
    }
}

/// Split a raw frame into its status field and 14-bit count.
pub fn decode_frame(frame: [u8; 2]) -> (SensorStatus, u16) {
    let status = SensorStatus::from_msb(frame[0]);
    let counts = (u16::from(frame[0] & COUNT_MSB_MASK) << 8) | u16::from(frame[1]);
    (status, counts)
}

/// Linear counts → cmH2O over the calibrated band.  Counts outside the
/// band are rejected; they only occur on a faulted part.
pub fn counts_to_cmh2o(counts: u16) -> Result<f32, SensorError> {
    if !(MIN_COUNTS..=MAX_COUNTS).contains(&counts) {
        return Err(SensorError::OutOfRange);
    }
    let span = f32::from(MAX_COUNTS - MIN_COUNTS);
    let psi = f32::from(counts - MIN_COUNTS) * (MAX_PSI - MIN_PSI) / span + MIN_PSI;
    Ok(psi * PSI_TO_CMH2O)
}

pub struct HscPressureSensor<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    last_counts: u16,
}

impl<I2C: I2c, D: DelayNs> HscPressureSensor<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        debug!("pressure: sensor at 0x{:02x}", address);
        Self {
            i2c,
            delay,
            address,
            last_counts: 0,
        }
    }

    /// Raw count of the last successful read, for calibration logs.
    pub fn last_counts(&self) -> u16 {
        self.last_counts
    }

    /// Give the bus and delay back (e.g. to re-initialise the peripheral).
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read_frame(&mut self) -> Result<[u8; 2], SensorError> {
        self.delay.delay_ms(SETTLE_MS);
        let mut frame = [0u8; 2];
        self.i2c.read(self.address, &mut frame).map_err(|e| {
            warn!("pressure: i2c read failed: {:?}", e.kind());
            SensorError::BusReadFailed
        })?;
        Ok(frame)
    }
}

impl<I2C: I2c, D: DelayNs> PressureSource for HscPressureSensor<I2C, D> {
    fn read_pressure(&mut self) -> Result<f32, SensorError> {
        let (status, counts) = decode_frame(self.read_frame()?);
        match status {
            SensorStatus::Normal => {}
            SensorStatus::Stale => return Err(SensorError::StaleData),
            SensorStatus::CommandMode | SensorStatus::Diagnostic => {
                return Err(SensorError::Diagnostic);
            }
        }
        let cmh2o = counts_to_cmh2o(counts)?;
        self.last_counts = counts;
        Ok(cmh2o)
    }
}
