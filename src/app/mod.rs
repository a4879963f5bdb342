//! Application core: breath orchestration with zero direct I/O.
//!
//! This module ties the mode state machines, the alarm accumulator and the
//! machine supervisor into one per-tick loop.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
