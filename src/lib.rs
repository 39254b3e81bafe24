//! Parallel ST7789 display pipeline for the rp2350.
//!
//! The caller draws into a 160x120 [`Framebuffer`] of `R8 G8 B8 X8` pixels.
//! [`St7789::update`] converts it into a row-doubled RGB565 back-buffer and
//! streams that to the panel over an 8-bit parallel bus. The bus itself is
//! abstracted by [`ParallelBus`]; on the target it is backed by two PIO state
//! machines and two DMA channels (see `hardware`).
//!
//! The bulk pixel transfer keeps running after `update` returns. The next
//! operation that needs the bus waits for it, so the back-buffer is never
//! rewritten while DMA is still reading it.
#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod backlight;
pub mod bus;
pub mod command;
pub mod config;
pub mod convert;
pub mod driver;
pub mod framebuffer;
pub mod sequence;
pub mod transfer;

#[cfg(target_os = "none")]
pub mod hardware;

#[cfg(test)]
mod mock;

use display_interface::DisplayError;

pub use backlight::{gamma_duty, SleepEntry};
pub use bus::{clock_divisor, ParallelBus, SystemClock};
pub use command::{Command, Madctl};
pub use config::Config;
pub use convert::{convert_frame, panel_color};
pub use driver::{Parts, St7789};
pub use framebuffer::{BackBuffer, Framebuffer};
pub use transfer::Transfer;

/// Logical framebuffer width.
pub const WIDTH: usize = 160;
/// Logical framebuffer height.
pub const HEIGHT: usize = 120;
/// Native panel resolution, after horizontal and vertical doubling.
pub const PANEL_WIDTH: u16 = 320;
pub const PANEL_HEIGHT: u16 = 240;
/// Size of the caller-visible framebuffer in bytes.
pub const FRAMEBUFFER_BYTES: usize = WIDTH * HEIGHT * 4;
/// Number of RGB565 words in the back-buffer (rows are doubled).
pub const BACK_BUFFER_LEN: usize = WIDTH * HEIGHT * 2;

/// Fastest clock the parallel bus state machines are allowed to run at.
pub const MAX_BUS_CLOCK_HZ: u32 = 50_000_000;

#[derive(Clone, Debug)]
pub enum Error {
    /// Chip-select or data/command line could not be driven.
    Interface(DisplayError),
    /// The backlight PWM rejected the duty cycle.
    Backlight,
    /// The bus did not hand the back-buffer back after a transfer.
    FrameUnavailable,
}

impl From<DisplayError> for Error {
    fn from(error: DisplayError) -> Self {
        Error::Interface(error)
    }
}
