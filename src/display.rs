//! Display and touch bring-up for the ESP32-S3 profile.
//
// - `setup_display` builds the LCD bus on SPI2 and runs the panel init. The
//   backlight pin is handed back so the caller keeps it driven.
// - `setup_touch` puts the XPT2046 on SPI3 behind an `ExclusiveDevice`.
// - Both panic on failure; nothing useful can run without them.

use esp_hal::{
    delay::Delay,
    gpio::{Input, Output},
    spi::master::{Config, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use log::info;

use crate::ili9341::{Ili9341, Rotation};
use crate::touch::{Calibration, Xpt2046};
use crate::wiring::{LcdPins, TouchPins};

/// Logical size in the demo rotation.
pub const WIDTH: i32 = 320;
pub const HEIGHT: i32 = 240;
pub const ROTATION: Rotation = Rotation::Horizontal2;

// The panel takes up to ~40 MHz on writes; the touch ADC wants <= 2.5 MHz.
const LCD_SPI_MHZ: u32 = 40;
const TOUCH_SPI_MHZ: u32 = 2;

pub type DisplayType = Ili9341<Spi<'static, Blocking>, Output<'static>, Output<'static>, Output<'static>>;

pub type TouchType = Xpt2046<ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>, Input<'static>>;

pub fn setup_display(pins: LcdPins<'static>) -> (DisplayType, Output<'static>) {
    let LcdPins { spi, sck, mosi, miso, cs, dc, rst, bl } = pins;

    // SPI @ 40 MHz, Mode 0
    let bus = Spi::new(
        spi,
        Config::default()
            .with_frequency(Rate::from_mhz(LCD_SPI_MHZ))
            .with_mode(Mode::_0),
    )
    .expect("LCD SPI config")
    .with_sck(sck)
    .with_mosi(mosi)
    .with_miso(miso);

    let mut delay = Delay::new();
    let display = Ili9341::new(bus, cs, dc, rst, &mut delay, ROTATION, WIDTH, HEIGHT)
        .expect("ILI9341 init failed");

    info!("display up at {} MHz", LCD_SPI_MHZ);
    (display, bl)
}

pub fn setup_touch(pins: TouchPins<'static>) -> TouchType {
    let TouchPins { spi, sck, mosi, miso, cs, irq } = pins;

    let bus = Spi::new(
        spi,
        Config::default()
            .with_frequency(Rate::from_mhz(TOUCH_SPI_MHZ))
            .with_mode(Mode::_0),
    )
    .expect("touch SPI config")
    .with_sck(sck)
    .with_mosi(mosi)
    .with_miso(miso);

    let dev = ExclusiveDevice::new(bus, cs, NoDelay).expect("touch CS");
    Xpt2046::new(dev, irq, Calibration::default(), ROTATION, WIDTH, HEIGHT)
}
