use rp235x_hal as hal;

use hal::dma::{Byte, HalfWord, SingleChannel, TransferSize, Word};
use hal::pio::{
    PIOBuilder, PIOExt, PinDir, Running, Rx, ShiftDirection, StateMachine, StateMachineIndex,
    Stopped, Tx, UninitStateMachine, PIO,
};

use super::dma::{ByteDma, PixelDma};
use crate::bus::ParallelBus;
use crate::framebuffer::BackBuffer;

/// 8080-style write bus driven by two PIO state machines running the same
/// program, each fed by its own DMA channel.
///
/// The byte machine pulls 8 bits at a time and carries commands. The pixel
/// machine pulls 32 bits at a time; a 16-bit DMA write into its FIFO is
/// replicated into both halves of the word, so every RGB565 pixel goes out
/// twice, high byte first. Only one of the two runs at any time.
pub struct PioParallelBus<P, SM1, SM2, CH1, CH2>
where
    P: PIOExt,
    SM1: StateMachineIndex,
    SM2: StateMachineIndex,
    CH1: SingleChannel,
    CH2: SingleChannel,
{
    mode: Option<PioMode<P, SM1, SM2>>,
    byte_dma: ByteDma<CH1, Tx<(P, SM1), Byte>>,
    byte_rx: Rx<(P, SM1)>,
    pixel_dma: PixelDma<CH2, Tx<(P, SM2), HalfWord>>,
    pixel_rx: Rx<(P, SM2)>,
    /// Frame finished on behalf of another request, held until `wait_frame`.
    parked: Option<&'static mut BackBuffer>,
}

enum PioMode<P: PIOExt, SM1: StateMachineIndex, SM2: StateMachineIndex> {
    Command(
        (
            StateMachine<(P, SM1), Running>,
            StateMachine<(P, SM2), Stopped>,
        ),
    ),
    Pixel(
        (
            StateMachine<(P, SM1), Stopped>,
            StateMachine<(P, SM2), Running>,
        ),
    ),
}

impl<P, SM1, SM2, CH1, CH2> PioParallelBus<P, SM1, SM2, CH1, CH2>
where
    P: PIOExt,
    SM1: StateMachineIndex,
    SM2: StateMachineIndex,
    CH1: SingleChannel,
    CH2: SingleChannel,
{
    /// `data_base` is the first of eight consecutive data pins, `wr` the
    /// write strobe. Both must already be switched to the PIO function.
    /// Command bytes are staged through `scratch`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock_divisor: u16,
        pio: &mut PIO<P>,
        sm1: UninitStateMachine<(P, SM1)>,
        sm2: UninitStateMachine<(P, SM2)>,
        command_channel: CH1,
        pixel_channel: CH2,
        scratch: &'static mut [u8],
        data_base: u8,
        wr: u8,
    ) -> Self {
        let program = pio_proc::pio_asm!(".side_set 1", "out pins, 8 side 0", "nop side 1",);
        let pin_dirs = || {
            (data_base..data_base + 8)
                .chain(core::iter::once(wr))
                .map(|pin| (pin, PinDir::Output))
        };

        let installed = pio.install(&program.program).unwrap();
        let (mut byte_sm, byte_rx, byte_tx) = PIOBuilder::from_installed_program(installed)
            .out_pins(data_base, 8)
            .side_set_pin_base(wr)
            .autopull(true)
            .pull_threshold(8)
            .out_shift_direction(ShiftDirection::Left)
            .buffers(hal::pio::Buffers::OnlyTx)
            .clock_divisor_fixed_point(clock_divisor, 0)
            .build(sm1);
        byte_sm.set_pindirs(pin_dirs());

        let installed = pio.install(&program.program).unwrap();
        let (mut pixel_sm, pixel_rx, pixel_tx) = PIOBuilder::from_installed_program(installed)
            .out_pins(data_base, 8)
            .side_set_pin_base(wr)
            .autopull(true)
            .pull_threshold(32)
            .out_shift_direction(ShiftDirection::Left)
            .buffers(hal::pio::Buffers::OnlyTx)
            .clock_divisor_fixed_point(clock_divisor, 0)
            .build(sm2);
        pixel_sm.set_pindirs(pin_dirs());

        Self {
            mode: Some(PioMode::Command((byte_sm.start(), pixel_sm))),
            byte_dma: ByteDma::new(command_channel, byte_tx.transfer_size(Byte), scratch),
            byte_rx,
            pixel_dma: PixelDma::new(pixel_channel, pixel_tx.transfer_size(HalfWord)),
            pixel_rx,
            parked: None,
        }
    }

    #[cold]
    fn set_command_mode(
        mode: PioMode<P, SM1, SM2>,
    ) -> (
        StateMachine<(P, SM1), Running>,
        StateMachine<(P, SM2), Stopped>,
    ) {
        match mode {
            PioMode::Command(machines) => machines,
            PioMode::Pixel((byte_sm, pixel_sm)) => (byte_sm.start(), pixel_sm.stop()),
        }
    }

    #[cold]
    fn set_pixel_mode(
        mode: PioMode<P, SM1, SM2>,
    ) -> (
        StateMachine<(P, SM1), Stopped>,
        StateMachine<(P, SM2), Running>,
    ) {
        match mode {
            PioMode::Command((byte_sm, pixel_sm)) => (byte_sm.stop(), pixel_sm.start()),
            PioMode::Pixel(machines) => machines,
        }
    }

    /// Spins until the FIFO is empty and the machine is parked on its next
    /// pull, i.e. the last byte has been strobed out.
    fn drain<SM: StateMachineIndex, S: TransferSize>(tx: &Tx<(P, SM), S>) {
        while !tx.is_empty() {}
        // A stalled machine sets the flag again on the next cycle.
        tx.clear_stalled_flag();
        while !tx.has_stalled() {}
    }

    /// Finishes any running frame and hands the pins back to the byte machine.
    fn finish(&mut self) -> Option<&'static mut BackBuffer> {
        let frame = self.pixel_dma.wait();
        if frame.is_some() {
            if let Some(tx) = self.pixel_dma.tx() {
                Self::drain(tx);
            }
        }
        let mode = self.mode.take().unwrap();
        self.mode = Some(PioMode::Command(Self::set_command_mode(mode)));
        frame
    }

    /// Completes the running frame ahead of another request on the bus.
    fn preempt(&mut self) {
        if self.pixel_dma.is_running() {
            warn!("bus: frame still streaming, waiting");
            self.parked = self.finish();
        }
    }

    /// Stops both machines and returns the hardware.
    #[allow(clippy::type_complexity)]
    pub fn free(
        mut self,
        pio: &mut PIO<P>,
    ) -> (
        UninitStateMachine<(P, SM1)>,
        UninitStateMachine<(P, SM2)>,
        CH1,
        CH2,
        &'static mut [u8],
        Option<&'static mut BackBuffer>,
    ) {
        let frame = self.finish().or(self.parked.take());
        let (byte_sm, pixel_sm) = match self.mode.take().unwrap() {
            PioMode::Command((byte_sm, pixel_sm)) => (byte_sm.stop(), pixel_sm),
            PioMode::Pixel((byte_sm, pixel_sm)) => (byte_sm, pixel_sm.stop()),
        };
        let (command_channel, byte_tx, scratch) = self.byte_dma.free();
        let (pixel_channel, pixel_tx, _) = self.pixel_dma.free();

        let (sm1, program) = byte_sm.uninit(self.byte_rx, byte_tx.transfer_size(Word));
        pio.uninstall(program);
        let (sm2, program) = pixel_sm.uninit(self.pixel_rx, pixel_tx.transfer_size(Word));
        pio.uninstall(program);
        (sm1, sm2, command_channel, pixel_channel, scratch, frame)
    }
}

impl<P, SM1, SM2, CH1, CH2> ParallelBus for PioParallelBus<P, SM1, SM2, CH1, CH2>
where
    P: PIOExt,
    SM1: StateMachineIndex,
    SM2: StateMachineIndex,
    CH1: SingleChannel,
    CH2: SingleChannel,
{
    fn write_blocking(&mut self, bytes: &[u8]) {
        self.preempt();
        self.byte_dma.write_blocking(bytes);
        Self::drain(self.byte_dma.tx());
    }

    fn set_clock_divisor(&mut self, divisor: u16) {
        self.preempt();
        // Both machines are stopped while the divider changes.
        let (byte_sm, mut pixel_sm) = Self::set_command_mode(self.mode.take().unwrap());
        let mut byte_sm = byte_sm.stop();
        byte_sm.clock_divisor_fixed_point(divisor, 0);
        pixel_sm.clock_divisor_fixed_point(divisor, 0);
        self.mode = Some(PioMode::Command((byte_sm.start(), pixel_sm)));
    }

    fn start_frame(&mut self, frame: &'static mut BackBuffer) {
        self.preempt();
        let mode = self.mode.take().unwrap();
        self.mode = Some(PioMode::Pixel(Self::set_pixel_mode(mode)));
        self.pixel_dma.start(frame);
    }

    fn wait_frame(&mut self) -> Option<&'static mut BackBuffer> {
        if let Some(frame) = self.parked.take() {
            return Some(frame);
        }
        if !self.pixel_dma.is_running() {
            return None;
        }
        self.finish()
    }
}
