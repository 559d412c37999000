//! Text rendering with [`Font`] glyph tables.
//!
//! Layout and rasterization are split: [`TextLayout`] walks a string and
//! yields pen positions (usable without a display, e.g. to measure), and
//! [`Ili9341::draw_text`] draws what it yields.
//!
//! Coordinates are pen positions: `x` is the left edge, `y` the baseline.

use core::iter::Peekable;
use core::str::Chars;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, Size};
use embedded_hal::{digital::OutputPin, spi::SpiBus};

use crate::color::to_wire;
use crate::font::{Font, Glyph};
use crate::ili9341::{Error, Ili9341};

/// Pixels buffered on the stack per write of an opaque glyph.
pub const GLYPH_BUFFER_LEN: usize = 256;

/// How a string is drawn.
///
/// ```ignore
/// let style = TextStyle::new(&FONT, Rgb565::WHITE)
///     .with_background(Rgb565::BLACK)
///     .with_scale(2)
///     .with_wrap(true);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'f> {
    pub font: &'f Font,
    pub color: Rgb565,
    /// `None` draws only the set bits (transparent).
    pub background: Option<Rgb565>,
    pub wrap: bool,
    pub scale: u8,
    /// Extra pixels between glyphs.
    pub tracking: i32,
    /// Extra pixels between lines.
    pub leading: i32,
}

impl<'f> TextStyle<'f> {
    pub const fn new(font: &'f Font, color: Rgb565) -> Self {
        Self { font, color, background: None, wrap: false, scale: 1, tracking: 0, leading: 0 }
    }

    pub const fn with_background(mut self, background: Rgb565) -> Self {
        self.background = Some(background);
        self
    }

    pub const fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub const fn with_scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
    }

    pub const fn with_tracking(mut self, tracking: i32) -> Self {
        self.tracking = tracking;
        self
    }

    pub const fn with_leading(mut self, leading: i32) -> Self {
        self.leading = leading;
        self
    }
}

/// A glyph and the pen position it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub glyph: &'static Glyph,
    pub position: Point,
}

/// Pen walk over a string inside a `viewport`-sized area.
///
/// `\r` returns to the starting column; `\n` moves one line down and stops
/// the walk once the new line starts below the viewport. With wrapping on,
/// a glyph that would touch the right edge starts a new line first; a space
/// that triggered the wrap is dropped.
pub struct TextLayout<'t, 'f> {
    chars: Peekable<Chars<'t>>,
    font: &'f Font,
    wrap: bool,
    scale: i32,
    tracking: i32,
    leading: i32,
    width: i32,
    height: i32,
    origin_x: i32,
    cursor: Point,
    done: bool,
}

impl<'t, 'f> TextLayout<'t, 'f> {
    pub fn new(text: &'t str, style: &TextStyle<'f>, origin: Point, viewport: Size) -> Self {
        let scale = style.scale as i32;
        let width = viewport.width as i32;
        let height = viewport.height as i32;
        let font = style.font;

        let done = scale < 1
            || origin.y + font.descent() as i32 * scale < 0
            || origin.y - font.ascent() as i32 * scale >= height;

        Self {
            chars: text.chars().peekable(),
            font,
            wrap: style.wrap,
            scale,
            tracking: style.tracking,
            leading: style.leading,
            width,
            height,
            origin_x: origin.x,
            cursor: origin,
            done,
        }
    }

    /// Pen position after the glyphs yielded so far.
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// True once nothing more will be yielded.
    pub fn is_finished(&self) -> bool {
        self.done
    }

    // Returns false when the new line starts below the viewport.
    fn new_line(&mut self) -> bool {
        self.cursor.y += self.font.line_height() as i32 * self.scale + self.leading;
        self.cursor.x = self.origin_x;
        self.cursor.y - self.font.ascent() as i32 * self.scale < self.height
    }
}

impl Iterator for TextLayout<'_, '_> {
    type Item = PlacedGlyph;

    fn next(&mut self) -> Option<PlacedGlyph> {
        while !self.done {
            let Some(ch) = self.chars.next() else {
                self.done = true;
                break;
            };

            match ch {
                '\r' => {
                    self.cursor.x = self.origin_x;
                    continue;
                }
                '\n' => {
                    if !self.new_line() {
                        self.done = true;
                    }
                    continue;
                }
                _ => {}
            }

            let glyph = self.font.glyph(ch);

            // Zero-advance glyphs (combining marks) never wrap.
            if self.wrap
                && glyph.advance > 0
                && self.cursor.x + (glyph.bb_x as i32 + glyph.width as i32) * self.scale + 1 >= self.width
            {
                if !self.new_line() {
                    self.done = true;
                    break;
                }
                if ch == ' ' || ch == '\u{A0}' {
                    continue;
                }
            }

            let position = self.cursor;
            self.cursor.x += glyph.advance as i32 * self.scale;

            // Tracking only before glyphs that advance, so marks stay on
            // their base letter. The end of the text counts as the fallback.
            if self.tracking != 0 {
                let next = self.font.glyph(self.chars.peek().copied().unwrap_or('\0'));
                if next.advance > 0 {
                    self.cursor.x += self.tracking;
                }
            }

            return Some(PlacedGlyph { ch, glyph, position });
        }
        None
    }
}

impl<SPI, CS, DC, RST, PinE> Ili9341<SPI, CS, DC, RST>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    /// Draw `text` with its first baseline at `y`. Returns the pen position
    /// after the last glyph.
    pub fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: &TextStyle<'_>,
    ) -> Result<Point, Error<SPI::Error, PinE>> {
        let viewport = Size::new(self.width() as u32, self.height() as u32);
        let mut layout = TextLayout::new(text, style, Point::new(x, y), viewport);
        if layout.is_finished() {
            return Ok(layout.cursor());
        }

        let scale = style.scale as i32;
        self.transaction(|d| {
            for placed in layout.by_ref() {
                let Point { x, y } = placed.position;
                match style.background {
                    Some(bg) => d.draw_glyph_fast(x, y, placed.glyph, style.color, bg, scale)?,
                    None => d.draw_glyph_transparent_fast(x, y, placed.glyph, style.color, scale)?,
                }
            }
            Ok(layout.cursor())
        })
    }

    // Top-left corner of the scaled glyph box, or None when it is empty or
    // fully off-screen.
    fn glyph_origin(&self, x: i32, y: i32, glyph: &Glyph, scale: i32) -> Option<(i32, i32)> {
        let (width, height) = self.bounds();
        let (x, y, scale) = (i64::from(x), i64::from(y), i64::from(scale));
        let (bw, bh) = (i64::from(glyph.width) * scale, i64::from(glyph.height) * scale);

        let start_x = x + i64::from(glyph.bb_x) * scale;
        let start_y = y - i64::from(glyph.bb_y) * scale - bh + 1;
        let end_x = start_x + bw - 1;
        let end_y = start_y + bh - 1;

        if bw == 0
            || bh == 0
            || end_x < 0
            || end_y < 0
            || start_x >= i64::from(width)
            || start_y >= i64::from(height)
        {
            return None;
        }
        // On screen now, so both fit back into i32.
        Some((start_x as i32, start_y as i32))
    }

    // Opaque: one window over the visible part of the box.
    #[allow(clippy::too_many_arguments)]
    fn draw_glyph_fast(
        &mut self,
        x: i32,
        y: i32,
        glyph: &Glyph,
        color: Rgb565,
        background: Rgb565,
        scale: i32,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let Some((start_x, start_y)) = self.glyph_origin(x, y, glyph, scale) else {
            return Ok(());
        };
        let (width, height) = self.bounds();
        let (bw, bh) = (glyph.width as i32 * scale, glyph.height as i32 * scale);

        let cx0 = if start_x < 0 { -start_x } else { 0 };
        let cy0 = if start_y < 0 { -start_y } else { 0 };
        let cx1 = if start_x + bw > width { width - start_x - 1 } else { bw - 1 };
        let cy1 = if start_y + bh > height { height - start_y - 1 } else { bh - 1 };

        self.set_address_window(
            (start_x + cx0) as u16,
            (start_y + cy0) as u16,
            (start_x + cx1) as u16,
            (start_y + cy1) as u16,
        )?;

        let (fg, bg) = (to_wire(color), to_wire(background));
        let stride = glyph.width as usize;
        let mut buf = [0u16; GLYPH_BUFFER_LEN];
        let mut n = 0;

        for row in cy0..=cy1 {
            let row_bits = (row / scale) as usize * stride;
            for col in cx0..=cx1 {
                buf[n] = if glyph.pixel(row_bits + (col / scale) as usize) { fg } else { bg };
                n += 1;
                if n == GLYPH_BUFFER_LEN {
                    self.write_pixels(bytemuck::cast_slice(&buf))?;
                    n = 0;
                }
            }
        }
        if n > 0 {
            self.write_pixels(bytemuck::cast_slice(&buf[..n]))?;
        }
        Ok(())
    }

    // Transparent: one scale x scale block per set bit.
    fn draw_glyph_transparent_fast(
        &mut self,
        x: i32,
        y: i32,
        glyph: &Glyph,
        color: Rgb565,
        scale: i32,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        let Some((start_x, start_y)) = self.glyph_origin(x, y, glyph, scale) else {
            return Ok(());
        };

        let (w, h) = (glyph.width as i32, glyph.height as i32);
        for row in 0..h {
            for col in 0..w {
                if glyph.pixel((row * w + col) as usize) {
                    self.fill_rect_fast(
                        i64::from(start_x + col * scale),
                        i64::from(start_y + row * scale),
                        scale.into(),
                        scale.into(),
                        color,
                    )?;
                }
            }
        }
        Ok(())
    }
}
