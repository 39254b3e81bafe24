use byte_slice_cast::{AsByteSlice, AsMutByteSlice};
use embedded_graphics_core::pixelcolor::{Rgb888, RgbColor};

use crate::{BACK_BUFFER_LEN, HEIGHT, WIDTH};

/// Panel-format pixels, two destination rows per framebuffer row.
pub type BackBuffer = [u16; BACK_BUFFER_LEN];

/// Caller-facing pixels. Each pixel is stored as the bytes `R, G, B, pad`.
#[repr(C, align(4))]
pub struct Framebuffer {
    pixels: [u32; WIDTH * HEIGHT],
}

impl Framebuffer {
    pub const fn new() -> Self {
        Self {
            pixels: [0; WIDTH * HEIGHT],
        }
    }

    /// Packs a color into the in-memory pixel layout.
    pub fn pack(color: Rgb888) -> u32 {
        u32::from_le_bytes([color.r(), color.g(), color.b(), 0])
    }

    pub fn unpack(pixel: u32) -> Rgb888 {
        let [r, g, b, _] = pixel.to_le_bytes();
        Rgb888::new(r, g, b)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_byte_slice()
    }

    /// Raw view handed to code that writes pixels directly, `WIDTH * HEIGHT * 4` bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.pixels.as_mut_byte_slice()
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(Self::pack(color));
    }

    /// Writes one pixel, out of range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, color: Rgb888) {
        if x < WIDTH && y < HEIGHT {
            self.pixels[y * WIDTH + x] = Self::pack(color);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb888> {
        if x < WIDTH && y < HEIGHT {
            Some(Self::unpack(self.pixels[y * WIDTH + x]))
        } else {
            None
        }
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}
