// Board-specific pin mapping for the ESP32-S3 devkit profile.
//! The following wiring is assumed (2.8" ILI9341 module with XPT2046 touch):
//! - LCD SCK  => GPIO12
//! - LCD MOSI => GPIO11
//! - LCD MISO => GPIO13
//! - LCD CS   => GPIO10
//! - LCD D/C  => GPIO9
//! - LCD RST  => GPIO14
//! - LCD LED  => GPIO2 (backlight, driven high)
//! - T_CLK    => GPIO4
//! - T_DIN    => GPIO5
//! - T_DO     => GPIO6
//! - T_CS     => GPIO7
//! - T_IRQ    => GPIO15 (pulled up, low while pressed)
//! - VCC => 3.3V, GND => GND
//!
//! The panel and the touch controller are on separate SPI peripherals so the
//! panel can keep its own CS handling.

use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, GPIO11, GPIO12, GPIO13, GPIO4, GPIO5, GPIO6, SPI2, SPI3};

pub struct LcdPins<'a> {
    pub spi: SPI2<'a>,
    pub sck: GPIO12<'a>,
    pub mosi: GPIO11<'a>,
    pub miso: GPIO13<'a>,
    pub cs: Output<'a>,  // GPIO10
    pub dc: Output<'a>,  // GPIO9
    pub rst: Output<'a>, // GPIO14
    pub bl: Output<'a>,  // GPIO2
}

pub struct TouchPins<'a> {
    pub spi: SPI3<'a>,
    pub sck: GPIO4<'a>,
    pub mosi: GPIO5<'a>,
    pub miso: GPIO6<'a>,
    pub cs: Output<'a>, // GPIO7
    pub irq: Input<'a>, // GPIO15
}

pub fn init_board_pins(p: Peripherals) -> (LcdPins<'static>, TouchPins<'static>) {
    // LCD control pins, CS idle high, backlight on
    let cs = Output::new(p.GPIO10, Level::High, OutputConfig::default());
    let dc = Output::new(p.GPIO9, Level::Low, OutputConfig::default());
    let rst = Output::new(p.GPIO14, Level::High, OutputConfig::default());
    let bl = Output::new(p.GPIO2, Level::High, OutputConfig::default());

    // touch controller
    let t_cs = Output::new(p.GPIO7, Level::High, OutputConfig::default());
    let t_irq = Input::new(p.GPIO15, InputConfig::default().with_pull(Pull::Up));

    (
        LcdPins {
            spi: p.SPI2,
            sck: p.GPIO12,
            mosi: p.GPIO11,
            miso: p.GPIO13,
            cs,
            dc,
            rst,
            bl,
        },
        TouchPins {
            spi: p.SPI3,
            sck: p.GPIO4,
            mosi: p.GPIO5,
            miso: p.GPIO6,
            cs: t_cs,
            irq: t_irq,
        },
    )
}
