//! Panel bring-up steps.
//!
//! Register payloads are the vendor's analog tuning values for this panel and
//! are kept as opaque bytes.

use crate::command::{Command, Madctl};
use crate::{PANEL_HEIGHT, PANEL_WIDTH};

/// Time the controller needs after SWRESET.
pub const RESET_DELAY_MS: u32 = 150;
/// Settle time after DISPON.
pub const DISPLAY_ON_DELAY_MS: u32 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Command(Command, &'static [u8]),
    Delay(u32),
}

/// Rotates the 240x320 native scan into a 320x240 landscape frame.
pub const ORIENTATION: Madctl = Madctl::ROW_ORDER
    .union(Madctl::SWAP_XY)
    .union(Madctl::SCAN_ORDER);

/// CASET/RASET payload: start and end address as big-endian words.
pub const fn address_window(start: u16, end: u16) -> [u8; 4] {
    let start = start.to_be_bytes();
    let end = end.to_be_bytes();
    [start[0], start[1], end[0], end[1]]
}

const MADCTL: [u8; 1] = [ORIENTATION.bits()];
const COLUMNS: [u8; 4] = address_window(0, PANEL_WIDTH - 1);
const ROWS: [u8; 4] = address_window(0, PANEL_HEIGHT - 1);

pub const INIT: &[Step] = &[
    Step::Command(Command::SWRESET, &[]),
    Step::Delay(RESET_DELAY_MS),
    // frame sync output
    Step::Command(Command::TEON, &[]),
    // 16 bits per pixel
    Step::Command(Command::COLMOD, &[0x05]),
    Step::Command(Command::PORCTRL, &[0x0c, 0x0c, 0x00, 0x33, 0x33]),
    Step::Command(Command::LCMCTRL, &[0x2c]),
    Step::Command(Command::VDVVRHEN, &[0x01]),
    Step::Command(Command::VRHS, &[0x12]),
    Step::Command(Command::VDVS, &[0x20]),
    Step::Command(Command::PWCTRL1, &[0xa4, 0xa1]),
    Step::Command(Command::FRCTRL2, &[0x0f]),
    // Without this, low brightness greens show a light grey banding once the
    // gamma tables are tuned.
    Step::Command(Command::RAMCTRL, &[0x00, 0xc0]),
    Step::Command(Command::GCTRL, &[0x35]),
    Step::Command(Command::VCOMS, &[0x1f]),
    Step::Command(
        Command::GMCTRP1,
        &[
            0xD0, 0x08, 0x11, 0x08, 0x0C, 0x15, 0x39, 0x33, 0x50, 0x36, 0x13, 0x14, 0x29, 0x2D,
        ],
    ),
    Step::Command(
        Command::GMCTRN1,
        &[
            0xD0, 0x08, 0x10, 0x08, 0x06, 0x06, 0x39, 0x44, 0x51, 0x0B, 0x16, 0x14, 0x2F, 0x31,
        ],
    ),
    Step::Command(Command::INVON, &[]),
    Step::Command(Command::SLPOUT, &[]),
    Step::Command(Command::DISPON, &[]),
    Step::Delay(DISPLAY_ON_DELAY_MS),
    Step::Command(Command::MADCTL, &MADCTL),
    Step::Command(Command::CASET, &COLUMNS),
    Step::Command(Command::RASET, &ROWS),
];
