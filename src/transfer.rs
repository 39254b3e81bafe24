//! Command framing and frame scheduling on top of a [`ParallelBus`].

use display_interface::DisplayError;
use embedded_hal::digital::OutputPin;
use fugit::HertzU32;

use crate::bus::{clock_divisor, ParallelBus, SystemClock};
use crate::command::Command;
use crate::convert::convert_frame;
use crate::framebuffer::{BackBuffer, Framebuffer};
use crate::Error;

type Result = core::result::Result<(), Error>;

pub struct Transfer<BUS, CS, DC, CLK> {
    bus: BUS,
    cs: CS,
    dc: DC,
    clock: CLK,
    max_bus_clock: HertzU32,
    divisor: u16,
    /// `None` while the bus owns the back-buffer for a running frame.
    frame: Option<&'static mut BackBuffer>,
}

impl<BUS, CS, DC, CLK> Transfer<BUS, CS, DC, CLK>
where
    BUS: ParallelBus,
    CS: OutputPin,
    DC: OutputPin,
    CLK: SystemClock,
{
    pub fn new(
        bus: BUS,
        mut cs: CS,
        mut dc: DC,
        clock: CLK,
        max_bus_clock: HertzU32,
        back_buffer: &'static mut BackBuffer,
    ) -> core::result::Result<Self, Error> {
        cs.set_high().map_err(|_| DisplayError::CSError)?;
        dc.set_high().map_err(|_| DisplayError::DCError)?;
        Ok(Self {
            bus,
            cs,
            dc,
            clock,
            max_bus_clock,
            divisor: 0,
            frame: Some(back_buffer),
        })
    }

    /// Sends an opcode followed by an optional payload and returns once both
    /// have left the bus and chip-select is released.
    pub fn command(&mut self, command: Command, data: &[u8]) -> Result {
        self.wait_idle()?;

        self.dc.set_low().map_err(|_| DisplayError::DCError)?;
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        self.bus.write_blocking(&[command.opcode()]);

        if !data.is_empty() {
            self.dc.set_high().map_err(|_| DisplayError::DCError)?;
            self.bus.write_blocking(data);
        }

        // `write_blocking` returns once the last byte has been strobed out.
        self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        Ok(())
    }

    /// Converts `framebuffer` and starts streaming it, without waiting for the
    /// transfer to finish.
    ///
    /// Blocks first if the previous frame is still being read by DMA.
    pub fn start_frame(&mut self, framebuffer: &Framebuffer) -> Result {
        self.wait_idle()?;

        let divisor = clock_divisor(self.clock.system_clock(), self.max_bus_clock);
        if divisor != self.divisor {
            debug!("bus clock divisor {} -> {}", self.divisor, divisor);
            self.divisor = divisor;
        }
        self.bus.set_clock_divisor(divisor);

        let frame = self.frame.take().ok_or(Error::FrameUnavailable)?;
        convert_frame(framebuffer, frame);

        if let Err(e) = self.open_memory_write() {
            self.frame = Some(frame);
            return Err(e);
        }
        self.bus.start_frame(frame);
        Ok(())
    }

    /// Blocks until no frame is in flight and releases chip-select.
    pub fn wait_idle(&mut self) -> Result {
        if let Some(frame) = self.bus.wait_frame() {
            self.frame = Some(frame);
            self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        }
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        self.frame.is_none()
    }

    pub fn divisor(&self) -> u16 {
        self.divisor
    }

    /// Read-only view of the last converted frame, `None` while it is being streamed.
    pub fn back_buffer(&self) -> Option<&BackBuffer> {
        self.frame.as_deref()
    }

    pub fn free(mut self) -> core::result::Result<(BUS, CS, DC, CLK, &'static mut BackBuffer), Error> {
        self.wait_idle()?;
        let frame = self.frame.take().ok_or(Error::FrameUnavailable)?;
        Ok((self.bus, self.cs, self.dc, self.clock, frame))
    }

    /// RAMWR with chip-select left asserted for the pixel stream.
    fn open_memory_write(&mut self) -> Result {
        self.dc.set_low().map_err(|_| DisplayError::DCError)?;
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        self.bus.write_blocking(&[Command::RAMWR.opcode()]);
        self.dc.set_high().map_err(|_| DisplayError::DCError)?;
        Ok(())
    }
}
