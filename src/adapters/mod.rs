//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                     | Connects to                   |
//! |------------|--------------------------------|-------------------------------|
//! | `hardware` | PressureSource, MotorActuator, | I2C pressure sensor, H-bridge,|
//! |            | AlarmHandler                   | buzzer                        |
//! | `log_sink` | EventSink, AlarmHandler        | Serial log output             |
//! | `time`     | Clock                          | ESP32 system timer            |

pub mod hardware;
pub mod log_sink;
pub mod time;
