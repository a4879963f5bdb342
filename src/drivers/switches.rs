//! Front-panel switches: alarm acknowledge and mode select.
//!
//! Both are active-low with pull-ups and are polled from the main loop at
//! control-tick rate.  A level must hold for [`DEBOUNCE_MS`] before it is
//! accepted.
//!
//! | Switch | Accepted edge      | Command                          |
//! |--------|--------------------|----------------------------------|
//! | Alarm  | press (HIGH→LOW)   | `AcknowledgeAlarms`              |
//! | Mode   | any                | `SetMode(AssistControl / VolumeControl)` |

use heapless::Vec;

use crate::app::commands::VentCommand;
use crate::config::VentMode;
use crate::drivers::hw_init;
use crate::pins;

pub const DEBOUNCE_MS: u32 = 50;

/// Level-debounced input.
#[derive(Debug)]
pub struct DebouncedSwitch {
    gpio: i32,
    stable: bool,
    candidate: bool,
    since_ms: u32,
}

impl DebouncedSwitch {
    /// `initial` is the level sampled at boot.
    pub fn new(gpio: i32, initial: bool) -> Self {
        Self {
            gpio,
            stable: initial,
            candidate: initial,
            since_ms: 0,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Debounced level (`true` = HIGH = released).
    pub fn level(&self) -> bool {
        self.stable
    }

    /// Feed one raw sample.  Returns the new level when it changes.
    pub fn update(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        if raw != self.candidate {
            self.candidate = raw;
            self.since_ms = now_ms;
            return None;
        }
        if raw != self.stable && now_ms.wrapping_sub(self.since_ms) >= DEBOUNCE_MS {
            self.stable = raw;
            return Some(raw);
        }
        None
    }
}

fn mode_for_level(level: bool) -> VentMode {
    if level {
        VentMode::VolumeControl
    } else {
        VentMode::AssistControl
    }
}

pub struct FrontPanel {
    alarm: DebouncedSwitch,
    mode: DebouncedSwitch,
}

impl FrontPanel {
    /// Sample both switches once.
    pub fn new() -> Self {
        Self {
            alarm: DebouncedSwitch::new(
                pins::ALARM_SWITCH_GPIO,
                hw_init::gpio_read(pins::ALARM_SWITCH_GPIO),
            ),
            mode: DebouncedSwitch::new(
                pins::MODE_SWITCH_GPIO,
                hw_init::gpio_read(pins::MODE_SWITCH_GPIO),
            ),
        }
    }

    /// Mode the selector is set to right now.
    pub fn selected_mode(&self) -> VentMode {
        mode_for_level(self.mode.level())
    }

    /// Read the GPIOs and translate accepted edges into commands.
    pub fn poll(&mut self, now_ms: u32) -> Vec<VentCommand, 2> {
        self.apply(
            hw_init::gpio_read(pins::ALARM_SWITCH_GPIO),
            hw_init::gpio_read(pins::MODE_SWITCH_GPIO),
            now_ms,
        )
    }

    fn apply(&mut self, alarm_raw: bool, mode_raw: bool, now_ms: u32) -> Vec<VentCommand, 2> {
        let mut out = Vec::new();
        if self.alarm.update(alarm_raw, now_ms) == Some(false) {
            // Capacity 2, at most two pushes.
            let _ = out.push(VentCommand::AcknowledgeAlarms);
        }
        if let Some(level) = self.mode.update(mode_raw, now_ms) {
            let _ = out.push(VentCommand::SetMode(mode_for_level(level)));
        }
        out
    }
}

impl Default for FrontPanel {
    fn default() -> Self {
        Self::new()
    }
}
