//! Backlight gamma and the sleep policy coupled to it.

use num_traits::Float;

use crate::command::Command;

const GAMMA: f32 = 2.8;

/// Settle time after the sleep command when the backlight goes dark.
pub const SLEEP_ENTRY_DELAY_MS: u32 = 5;
/// The panel regulators need this long after SLPOUT before the panel is usable.
pub const SLEEP_EXIT_DELAY_MS: u32 = 120;

/// Which opcode is sent when the backlight is switched off.
///
/// The panel firmware this driver was written against sends SLPOUT in both
/// directions, so the panel never actually enters sleep. `LeaveSleep` keeps
/// that behaviour; `SleepIn` sends the datasheet's SLPIN instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepEntry {
    #[default]
    LeaveSleep,
    SleepIn,
}

impl SleepEntry {
    pub fn command(self) -> Command {
        match self {
            SleepEntry::LeaveSleep => Command::SLPOUT,
            SleepEntry::SleepIn => Command::SLPIN,
        }
    }
}

/// Power state change required by a brightness request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepTransition {
    None,
    /// Zero the duty, then send the sleep command.
    Enter,
    /// Send SLPOUT and settle, then apply the duty.
    Exit,
}

impl SleepTransition {
    /// A zero request while already asleep is `None`: the panel stays asleep
    /// and no wake command is sent.
    pub fn for_request(brightness: u8, sleeping: bool) -> Self {
        match (brightness, sleeping) {
            (0, false) => SleepTransition::Enter,
            (1..=255, true) => SleepTransition::Exit,
            _ => SleepTransition::None,
        }
    }
}

/// Gamma-2.8 encodes a linear 0-255 brightness onto the 16 bit PWM range.
pub fn gamma_duty(brightness: u8) -> u16 {
    let linear = brightness as f32 / 255.0;
    (Float::powf(linear, GAMMA) * 65535.0 + 0.5) as u16
}
