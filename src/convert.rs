//! Framebuffer to panel pixel conversion.

use embedded_graphics_core::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics_core::pixelcolor::Rgb565;

use crate::framebuffer::{BackBuffer, Framebuffer};
use crate::WIDTH;

/// Truncates an 8 bit per channel color to RGB565.
#[inline(always)]
pub fn panel_color(r: u8, g: u8, b: u8) -> u16 {
    RawU16::from(Rgb565::new(r >> 3, g >> 2, b >> 3)).into_inner()
}

/// Rewrites the whole back-buffer from the framebuffer.
///
/// The panel scans twice as many rows as the framebuffer has, so source row
/// `y` is written to back-buffer rows `2y` and `2y + 1`.
pub fn convert_frame(framebuffer: &Framebuffer, back_buffer: &mut BackBuffer) {
    let rows = framebuffer.pixels().chunks_exact(WIDTH);
    let row_pairs = back_buffer.chunks_exact_mut(WIDTH * 2);

    for (src, dst) in rows.zip(row_pairs) {
        let (first, second) = dst.split_at_mut(WIDTH);
        for (out, pixel) in first.iter_mut().zip(src) {
            let [r, g, b, _] = pixel.to_le_bytes();
            *out = panel_color(r, g, b);
        }
        second.copy_from_slice(first);
    }
}
