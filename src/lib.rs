//! E-Vent breath-cycle controller library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! firmware binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alarms;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fsm;
pub mod supervisor;

pub mod pins;

// Hardware-facing modules.  On the host the GPIO/LEDC helpers are no-ops
// so the drivers stay unit-testable.
pub mod adapters;
pub mod drivers;
pub mod sensors;
