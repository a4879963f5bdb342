//! Alarm buzzer.  Continuous tone while any alarm flag is latched; the
//! alarm switch acknowledges (clears) the flags, which stops it.

use crate::drivers::hw_init;
use crate::pins;

pub struct Buzzer {
    on: bool,
}

impl Buzzer {
    pub fn new() -> Self {
        Self { on: false }
    }

    /// Follow the alarm bitmask.  Returns whether the tone is on.
    pub fn update(&mut self, errors: u16) -> bool {
        let want = errors != 0;
        if want != self.on {
            hw_init::gpio_write(pins::ALARM_BUZZER_GPIO, want);
            self.on = want;
        }
        self.on
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}
