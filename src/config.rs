use fugit::{HertzU32, RateExtU32};

use crate::backlight::SleepEntry;
use crate::MAX_BUS_CLOCK_HZ;

/// Driver settings that are fixed for the lifetime of a [`St7789`](crate::St7789).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Command issued when the backlight is switched off.
    pub sleep_entry: SleepEntry,
    /// Upper bound for the parallel bus clock. The divisor is derived from it on every update.
    pub max_bus_clock: HertzU32,
    /// Backlight level applied once the init sequence has finished.
    pub startup_brightness: u8,
}

impl Config {
    pub fn new() -> Self {
        Self {
            sleep_entry: SleepEntry::LeaveSleep,
            max_bus_clock: MAX_BUS_CLOCK_HZ.Hz(),
            startup_brightness: 255,
        }
    }

    pub fn with_sleep_entry(mut self, sleep_entry: SleepEntry) -> Self {
        self.sleep_entry = sleep_entry;
        self
    }

    pub fn with_max_bus_clock(mut self, max_bus_clock: HertzU32) -> Self {
        self.max_bus_clock = max_bus_clock;
        self
    }

    pub fn with_startup_brightness(mut self, brightness: u8) -> Self {
        self.startup_brightness = brightness;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
