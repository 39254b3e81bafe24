//! The parallel bus seen by the transfer engine.

use fugit::HertzU32;

use crate::framebuffer::BackBuffer;

/// Byte and pixel channels of an 8-bit write-only bus.
///
/// Chip-select and data/command are plain GPIO and are driven by the caller;
/// an implementation only has to get bytes onto the bus with the write strobe.
pub trait ParallelBus {
    /// Shifts `bytes` out and spins until the shift FIFO is drained.
    fn write_blocking(&mut self, bytes: &[u8]);

    /// Integer clock divisor for the pixel shifter.
    fn set_clock_divisor(&mut self, divisor: u16);

    /// Starts streaming `frame` and returns as soon as the transfer is running.
    /// Every word is emitted twice on the bus.
    fn start_frame(&mut self, frame: &'static mut BackBuffer);

    /// Spins until the frame started by [`start_frame`](Self::start_frame) has
    /// left the shifter and hands the buffer back. `None` when nothing was in
    /// flight.
    fn wait_frame(&mut self) -> Option<&'static mut BackBuffer>;
}

/// Source of the current system clock, which can change between power modes.
pub trait SystemClock {
    fn system_clock(&self) -> HertzU32;
}

impl SystemClock for HertzU32 {
    fn system_clock(&self) -> HertzU32 {
        *self
    }
}

/// Smallest integer divisor that keeps the bus at or under `max`.
pub fn clock_divisor(system: HertzU32, max: HertzU32) -> u16 {
    let system = system.to_Hz();
    let max = max.to_Hz().max(1);
    let divisor = system.div_ceil(max).max(1);
    divisor.min(u16::MAX as u32) as u16
}
