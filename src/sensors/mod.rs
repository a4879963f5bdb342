//! Sensor drivers.
//!
//! Only airway pressure feeds the breath controller.  Drivers are generic
//! over `embedded-hal` 1.0 traits so they run against the ESP-IDF I2C
//! driver on target and against a mock bus on the host.

pub mod pressure;

pub use pressure::HscPressureSensor;
