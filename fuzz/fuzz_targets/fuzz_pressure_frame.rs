//! Fuzz target: pressure-sensor frame decoding
//!
//! Any 2-byte frame must decode without panicking; a successful
//! conversion always lies inside the sensor's ±1 psi span.
//!
//! cargo fuzz run fuzz_pressure_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use ventcore::sensors::pressure::{PSI_TO_CMH2O, counts_to_cmh2o, decode_frame};

fuzz_target!(|data: &[u8]| {
    let [msb, lsb, ..] = data else {
        return;
    };
    let (_status, counts) = decode_frame([*msb, *lsb]);
    assert!(counts <= 0x3fff);
    if let Ok(cmh2o) = counts_to_cmh2o(counts) {
        assert!(cmh2o.abs() <= PSI_TO_CMH2O + 1e-3);
    }
});
