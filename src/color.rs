//! RGB565 helpers.
//!
//! Colors are plain [`Rgb565`] values. The panel expects big-endian samples,
//! so anything streamed to it goes through [`to_wire`] first.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::IntoStorage;

/// Build a color from 8-bit channels, dropping the low bits.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

/// Sample whose in-memory byte order matches the wire order, on any host.
#[inline]
pub fn to_wire(color: Rgb565) -> u16 {
    color.into_storage().to_be()
}
