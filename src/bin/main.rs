//! ILI9341 demo
//! ========================================
//! Build with the board profile:
//! cargo run --release --features esp32s3
//! ========================================
//!
//! Cycles through the demo pages when the ">" button is tapped. On the touch
//! page, taps elsewhere leave a dot.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
// The macro automatically fills in the fields.
esp_bootloader_esp_idf::esp_app_desc!();

use esp_backtrace as _;

use esp_hal::{delay::Delay, main, Config};
use log::{error, info, warn};

use ili9341_tft::{
    color::rgb,
    display::{setup_display, setup_touch},
    ui::{is_next_button, render, Page},
    wiring::init_board_pins,
};

const POLL_MS: u32 = 10;

#[main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(Config::default());

    // one call hands out the LCD and touch pins from wiring.rs
    let (lcd_pins, touch_pins) = init_board_pins(peripherals);

    // the backlight has to stay driven for as long as we run
    let (mut display, _backlight) = setup_display(lcd_pins);
    let mut touch = setup_touch(touch_pins);

    let delay = Delay::new();
    let mut page = Page::Shapes;
    let mut needs_redraw = true;
    let mut was_pressed = false;

    info!("ili9341 demo running");

    loop {
        if needs_redraw {
            if let Err(e) = render(&mut display, page) {
                error!("render {:?} failed: {}", page, e);
            }
            needs_redraw = false;
        }

        match touch.coordinates() {
            Ok(Some(p)) => {
                // only the press edge turns pages, holding does not repeat
                if is_next_button(p) {
                    if !was_pressed {
                        page = page.next();
                        needs_redraw = true;
                        info!("page -> {:?}", page);
                    }
                } else if page == Page::Touch {
                    if let Err(e) = display.fill_circle(p.x, p.y, 2, rgb(255, 255, 0)) {
                        warn!("touch dot failed: {}", e);
                    }
                }
                was_pressed = true;
            }
            Ok(None) => was_pressed = false,
            Err(e) => warn!("touch read failed: {}", e),
        }

        delay.delay_millis(POLL_MS);
    }
}
