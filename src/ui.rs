//! Demo pages for the board profile.
//!
//! This module provides:
//! - The `Page` enum and its navigation methods (`next`, `prev`)
//! - `render` to draw a page from scratch
//! - The "next" button hit test used by the touch loop
//!
//! Shapes and images go through the driver's own primitives; labels use
//! embedded-graphics mono fonts through the `DrawTarget` impl.

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle, MonoTextStyleBuilder,
    },
    pixelcolor::Rgb565,
    prelude::{IntoStorage, Point, RgbColor},
    text::{Alignment, Text},
    Drawable,
};

use crate::color::rgb;
use crate::display::{DisplayType, HEIGHT, WIDTH};

pub type DisplayError = <DisplayType as embedded_graphics::draw_target::DrawTarget>::Error;

// "next" button in the bottom-right corner
const NEXT_W: i32 = 48;
const NEXT_H: i32 = 32;

const TILE: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Page {
    Shapes,
    Outlines,
    Images,
    Touch,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Shapes, Page::Outlines, Page::Images, Page::Touch];

    pub fn next(self) -> Self {
        use Page::*;
        match self {
            Shapes => Outlines,
            Outlines => Images,
            Images => Touch,
            Touch => Shapes,
        }
    }

    pub fn prev(self) -> Self {
        use Page::*;
        match self {
            Shapes => Touch,
            Outlines => Shapes,
            Images => Outlines,
            Touch => Images,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Shapes => "Filled shapes",
            Page::Outlines => "Outlines",
            Page::Images => "Images",
            Page::Touch => "Touch to draw",
        }
    }
}

pub fn is_next_button(p: Point) -> bool {
    p.x >= WIDTH - NEXT_W && p.y >= HEIGHT - NEXT_H
}

/// Clear the screen and draw `page`.
pub fn render(d: &mut DisplayType, page: Page) -> Result<(), DisplayError> {
    d.fill_screen(Rgb565::BLACK)?;

    let title = MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(Rgb565::WHITE)
        .background_color(Rgb565::BLACK)
        .build();
    Text::with_alignment(page.title(), Point::new(WIDTH / 2, 20), title, Alignment::Center).draw(d)?;

    match page {
        Page::Shapes => draw_shapes(d)?,
        Page::Outlines => draw_outlines(d)?,
        Page::Images => draw_images(d)?,
        Page::Touch => {}
    }

    draw_next_button(d)
}

fn draw_shapes(d: &mut DisplayType) -> Result<(), DisplayError> {
    d.fill_rect(20, 40, 80, 50, Rgb565::RED)?;
    d.fill_circle(160, 70, 30, Rgb565::GREEN)?;
    d.fill_ellipse(260, 70, 45, 25, Rgb565::BLUE)?;

    let star = [
        Point::new(60, 110),
        Point::new(72, 145),
        Point::new(108, 145),
        Point::new(80, 166),
        Point::new(90, 200),
        Point::new(60, 180),
        Point::new(30, 200),
        Point::new(40, 166),
        Point::new(12, 145),
        Point::new(48, 145),
    ];
    d.fill_polygon(&star, Rgb565::YELLOW)?;

    let tri = [Point::new(160, 110), Point::new(210, 200), Point::new(120, 200)];
    d.fill_polygon(&tri, rgb(255, 128, 0))?;

    // Negative size grows up and left from the anchor.
    d.fill_rect(300, 200, -50, -40, Rgb565::MAGENTA)
}

fn draw_outlines(d: &mut DisplayType) -> Result<(), DisplayError> {
    d.draw_rect(20, 40, 80, 50, Rgb565::WHITE)?;
    d.draw_rect_thick(120, 40, 80, 50, Rgb565::CYAN, 5)?;
    d.draw_circle(260, 65, 25, Rgb565::WHITE)?;
    d.draw_circle_thick(260, 65, 18, Rgb565::RED, 4)?;

    d.draw_ellipse(60, 150, 40, 25, Rgb565::GREEN)?;
    d.draw_ellipse_thick(160, 150, 45, 30, Rgb565::YELLOW, 6)?;

    let hex = [
        Point::new(250, 115),
        Point::new(285, 135),
        Point::new(285, 175),
        Point::new(250, 195),
        Point::new(215, 175),
        Point::new(215, 135),
    ];
    d.draw_polygon_thick(&hex, Rgb565::MAGENTA, 3, true)?;

    d.draw_line(10, 230, 200, 205, Rgb565::WHITE)?;
    d.draw_line_thick(20, 215, 190, 235, rgb(0, 160, 255), 5, true)
}

fn draw_images(d: &mut DisplayType) -> Result<(), DisplayError> {
    let mut tile = [0u8; TILE * TILE * 2];
    for y in 0..TILE {
        for x in 0..TILE {
            let c = rgb((x * 8) as u8, (y * 8) as u8, 160);
            let i = (y * TILE + x) * 2;
            tile[i..i + 2].copy_from_slice(&c.into_storage().to_be_bytes());
        }
    }

    // Fully visible, then clipped at the left and right edges.
    d.draw_image(40, 60, TILE as i32, TILE as i32, &tile)?;
    d.draw_image(90, 60, TILE as i32, TILE as i32, &tile)?;
    d.draw_image(-16, 120, TILE as i32, TILE as i32, &tile)?;
    d.draw_image(WIDTH - 16, 120, TILE as i32, TILE as i32, &tile)?;

    let small = MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE);
    Text::new("32x32 RGB565 tiles", Point::new(40, 110), small).draw(d)?;
    Ok(())
}

fn draw_next_button(d: &mut DisplayType) -> Result<(), DisplayError> {
    let (x, y) = (WIDTH - NEXT_W, HEIGHT - NEXT_H);
    d.fill_rect(x, y, NEXT_W, NEXT_H, rgb(60, 60, 60))?;

    let label = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);
    Text::with_alignment(">", Point::new(x + NEXT_W / 2, y + 22), label, Alignment::Center).draw(d)?;
    Ok(())
}
