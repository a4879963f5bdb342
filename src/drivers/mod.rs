//! Actuator drivers, front-panel inputs and peripheral helpers.

pub mod buzzer;
pub mod hw_init;
pub mod motor;
pub mod switches;
