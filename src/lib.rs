#![cfg_attr(not(test), no_std)]

pub mod color;
pub mod font;
pub mod graphics;
pub mod ili9341;
pub mod interface;
pub mod primitives;
pub mod text;
pub mod touch;

#[cfg(test)]
mod mock;

// Board support (ESP32-S3 + ILI9341 module with XPT2046 touch)
#[cfg(feature = "esp32s3")]
pub mod display;
#[cfg(feature = "esp32s3")]
pub mod ui;
#[cfg(feature = "esp32s3")]
pub mod wiring;

pub use color::rgb;
pub use font::{Font, FontError, Glyph};
pub use ili9341::{Error, Ili9341, Rotation, ILI9341_HEIGHT, ILI9341_WIDTH};
pub use text::{TextLayout, TextStyle};
pub use touch::{Calibration, TouchError, Xpt2046};
