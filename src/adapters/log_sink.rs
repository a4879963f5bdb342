//! Log-based event sink and alarm handler.
//!
//! Implements [`EventSink`] by writing structured breath events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production), and
//! [`AlarmHandler`] by logging the bitmask whenever it changes.

use log::{error, info, warn};

use crate::app::events::VentEvent;
use crate::app::ports::{AlarmHandler, EventSink};
use crate::error::Alarm;

/// Adapter that logs every [`VentEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &VentEvent) {
        match event {
            VentEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            VentEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?} (code {})", from, to, to.debug_code());
            }
            VentEvent::MachineStateChanged { from, to } => {
                info!("MACHINE | {:?} -> {:?}", from, to);
            }
            VentEvent::BreathCompleted(s) => {
                info!(
                    "BREATH #{} | {:?} | PIP={:.1} Pplat={:.1} PEEP={:.1} cmH2O | \
                     trigger={:?} | alarms=0b{:08b}",
                    s.cycle,
                    s.mode,
                    s.peak_pressure,
                    s.plateau_pressure,
                    s.peep_pressure,
                    s.trigger,
                    s.errors,
                );
            }
            VentEvent::AlarmRaised(flags) => {
                warn!("ALARM | raised flags=0b{:08b}", flags);
            }
            VentEvent::AlarmsCleared => {
                info!("ALARM | all cleared");
            }
            VentEvent::SensorFault(e) => {
                warn!("SENSOR | {}", e);
            }
            VentEvent::ModeChanged(mode) => {
                info!("MODE | {:?}", mode);
            }
            VentEvent::ParametersApplied(p) => {
                info!(
                    "PARAMS | {:.1} bpm | Ti={:.2}s pause={:.2}s Te={:.2}s | Vt={:.0}%",
                    p.breaths_per_minute(),
                    p.inspiration_time_s,
                    p.plateau_pause_s,
                    p.expiration_time_s,
                    p.tidal_volume_percent,
                );
            }
        }
    }
}

/// Logs the alarm bitmask once per change.
#[derive(Default)]
pub struct LogAlarmHandler {
    last: u16,
}

impl LogAlarmHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlarmHandler for LogAlarmHandler {
    fn annunciate(&mut self, errors: u16) {
        if errors == self.last {
            return;
        }
        self.last = errors;
        if errors == 0 {
            info!("ALARMS | none");
            return;
        }
        for alarm in Alarm::iter_set(errors) {
            if alarm.is_fatal() {
                error!("ALARMS | {alarm}");
            } else {
                warn!("ALARMS | {alarm}");
            }
        }
    }
}
