use rp235x_hal as hal;

use embedded_dma::{ReadBuffer, Word};
use hal::dma::{single_buffer, ReadTarget, SingleChannel, WriteTarget};

use crate::framebuffer::BackBuffer;

enum DmaState<CH: SingleChannel, TO: WriteTarget<TransmittedWord = u16>> {
    IDLE(CH, TO),
    RUNNING(single_buffer::Transfer<CH, &'static mut BackBuffer, TO>),
}

/// Bulk channel: feeds a whole back-buffer into a PIO TX FIFO in the
/// background.
pub(super) struct PixelDma<CH: SingleChannel, TO: WriteTarget<TransmittedWord = u16>> {
    dma: Option<DmaState<CH, TO>>,
}

impl<CH, TO> PixelDma<CH, TO>
where
    CH: SingleChannel,
    TO: WriteTarget<TransmittedWord = u16>,
{
    pub fn new(channel: CH, tx: TO) -> Self {
        Self {
            dma: Some(DmaState::IDLE(channel, tx)),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.dma, Some(DmaState::RUNNING(_)))
    }

    /// Starts reading `frame`. Must only be called while idle.
    pub fn start(&mut self, frame: &'static mut BackBuffer) {
        let (channel, tx) = match self.dma.take() {
            Some(DmaState::IDLE(channel, tx)) => (channel, tx),
            _ => unreachable!(),
        };
        let transfer = single_buffer::Config::new(channel, frame, tx).start();
        self.dma = Some(DmaState::RUNNING(transfer));
    }

    /// Blocks until the running transfer has been read out of memory.
    pub fn wait(&mut self) -> Option<&'static mut BackBuffer> {
        match self.dma.take() {
            Some(DmaState::RUNNING(transfer)) => {
                let (channel, frame, tx) = transfer.wait();
                self.dma = Some(DmaState::IDLE(channel, tx));
                Some(frame)
            }
            idle => {
                self.dma = idle;
                None
            }
        }
    }

    /// The FIFO, while no transfer owns it.
    pub fn tx(&self) -> Option<&TO> {
        match &self.dma {
            Some(DmaState::IDLE(_, tx)) => Some(tx),
            _ => None,
        }
    }

    pub fn free(mut self) -> (CH, TO, Option<&'static mut BackBuffer>) {
        let frame = self.wait();
        match self.dma.take() {
            Some(DmaState::IDLE(channel, tx)) => (channel, tx, frame),
            _ => unreachable!(),
        }
    }
}

/// Command channel: blocking transfers staged through a small scratch buffer.
pub(super) struct ByteDma<CH: SingleChannel, TO: WriteTarget<TransmittedWord = u8>> {
    parts: Option<(CH, TO, &'static mut [u8])>,
}

impl<CH, TO> ByteDma<CH, TO>
where
    CH: SingleChannel,
    TO: WriteTarget<TransmittedWord = u8>,
{
    pub fn new(channel: CH, tx: TO, scratch: &'static mut [u8]) -> Self {
        Self {
            parts: Some((channel, tx, scratch)),
        }
    }

    /// Returns once every byte has been handed to the FIFO.
    pub fn write_blocking(&mut self, bytes: &[u8]) {
        let (mut channel, mut tx, mut scratch) = self.parts.take().unwrap();
        for chunk in bytes.chunks(scratch.len()) {
            scratch[..chunk.len()].copy_from_slice(chunk);
            let source = LimitingArrayReadTarget::new(scratch, chunk.len() as u32);
            let (ch, source, to) = single_buffer::Config::new(channel, source, tx)
                .start()
                .wait();
            channel = ch;
            tx = to;
            scratch = source.free();
        }
        self.parts = Some((channel, tx, scratch));
    }

    pub fn tx(&self) -> &TO {
        let (_, tx, _) = self.parts.as_ref().unwrap();
        tx
    }

    pub fn free(mut self) -> (CH, TO, &'static mut [u8]) {
        self.parts.take().unwrap()
    }
}

/// A slice of which only the first `max_read` words are transferred.
struct LimitingArrayReadTarget<T: Word + 'static> {
    array: &'static mut [T],
    max_read: u32,
}

impl<T: Word + 'static> LimitingArrayReadTarget<T> {
    fn new(array: &'static mut [T], max_read: u32) -> Self {
        Self { array, max_read }
    }

    fn free(self) -> &'static mut [T] {
        self.array
    }
}

unsafe impl<T: Word + 'static> ReadTarget for LimitingArrayReadTarget<T> {
    type ReceivedWord = T;

    fn rx_treq() -> Option<u8> {
        None
    }

    fn rx_address_count(&self) -> (u32, u32) {
        let (ptr, _) = unsafe { self.array.read_buffer() };
        (ptr as u32, self.max_read)
    }

    fn rx_increment(&self) -> bool {
        self.array.rx_increment()
    }
}
