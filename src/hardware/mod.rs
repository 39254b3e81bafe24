//! rp2350 backing for [`ParallelBus`](crate::ParallelBus).

mod dma;
mod pio_bus;

use fugit::HertzU32;
use rp235x_hal as hal;

use hal::Clock;

pub use pio_bus::PioParallelBus;

impl crate::SystemClock for hal::clocks::SystemClock {
    fn system_clock(&self) -> HertzU32 {
        self.freq()
    }
}
