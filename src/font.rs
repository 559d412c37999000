//! Bitmap fonts.
//!
//! A [`Font`] covers one contiguous codepoint range. Each [`Glyph`] carries a
//! 1-bit bitmap of its bounding box, MSB first, rows packed back to back
//! without padding, row 0 at the top. The box is placed relative to the pen
//! position on the baseline: `bb_x` to the right, `bb_y` up from the baseline
//! to the bottom edge of the box.
//!
//! Fonts are checked once, in [`Font::new`], which is `const` so a bad table
//! fails the build when declared as a `const`:
//!
//! ```ignore
//! const FONT: Font = match Font::new(' ', '\x7F', 80, 11, 3, &GLYPHS) {
//!     Ok(f) => f,
//!     Err(_) => panic!("bad font table"),
//! };
//! ```

use core::fmt;

/// Glyph drawn for codepoints outside the font range.
pub const FALLBACK_CODEPOINT: char = '\x7F';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub bb_x: i16,
    pub bb_y: i16,
    pub width: u16,
    pub height: u16,
    /// Pen advance in pixels at scale 1.
    pub advance: u16,
    pub data: &'static [u8],
}

impl Glyph {
    pub const fn new(bb_x: i16, bb_y: i16, width: u16, height: u16, advance: u16, data: &'static [u8]) -> Self {
        Self { bb_x, bb_y, width, height, advance, data }
    }

    /// Bytes needed for the bitmap.
    pub const fn bitmap_len(&self) -> usize {
        (self.width as usize * self.height as usize).div_ceil(8)
    }

    /// Bit at linear index `row * width + col`.
    #[inline]
    pub fn pixel(&self, index: usize) -> bool {
        match self.data.get(index / 8) {
            Some(byte) => byte & (0x80 >> (index % 8)) != 0,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontError {
    /// `start` is above `end`.
    InvertedRange,
    /// One glyph per codepoint in `start..=end` is required.
    GlyphCount { expected: usize, actual: usize },
    /// The range does not contain [`FALLBACK_CODEPOINT`].
    MissingFallback,
    /// Glyph bitmap shorter than `ceil(width * height / 8)` bytes.
    GlyphData { codepoint: u32 },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::InvertedRange => write!(f, "font range start is after its end"),
            FontError::GlyphCount { expected, actual } => {
                write!(f, "font has {} glyphs, range needs {}", actual, expected)
            }
            FontError::MissingFallback => write!(f, "font range does not include U+007F"),
            FontError::GlyphData { codepoint } => {
                write!(f, "glyph U+{:04X} bitmap is too short", codepoint)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    start: u32,
    end: u32,
    average_width: u16,
    ascent: u16,
    descent: u16,
    glyphs: &'static [Glyph],
}

impl Font {
    /// Validate and build a font.
    ///
    /// * `average_width` - in tenths of a pixel (80 = 8 px).
    /// * `ascent` / `descent` - pixels above / below the baseline.
    /// * `glyphs` - one per codepoint of `start..=end`, in order.
    pub const fn new(
        start: char,
        end: char,
        average_width: u16,
        ascent: u16,
        descent: u16,
        glyphs: &'static [Glyph],
    ) -> Result<Self, FontError> {
        let (start, end) = (start as u32, end as u32);
        if start > end {
            return Err(FontError::InvertedRange);
        }

        let expected = (end - start + 1) as usize;
        if glyphs.len() != expected {
            return Err(FontError::GlyphCount { expected, actual: glyphs.len() });
        }

        let fallback = FALLBACK_CODEPOINT as u32;
        if fallback < start || fallback > end {
            return Err(FontError::MissingFallback);
        }

        let mut i = 0;
        while i < glyphs.len() {
            if glyphs[i].data.len() < glyphs[i].bitmap_len() {
                return Err(FontError::GlyphData { codepoint: start + i as u32 });
            }
            i += 1;
        }

        Ok(Self { start, end, average_width, ascent, descent, glyphs })
    }

    /// Glyph for `ch`, or the fallback glyph when `ch` is out of range.
    pub fn glyph(&self, ch: char) -> &'static Glyph {
        let code = ch as u32;
        let code = if code < self.start || code > self.end { FALLBACK_CODEPOINT as u32 } else { code };
        &self.glyphs[(code - self.start) as usize]
    }

    pub fn contains(&self, ch: char) -> bool {
        (self.start..=self.end).contains(&(ch as u32))
    }

    /// Baseline-to-baseline distance at scale 1, without leading.
    #[inline]
    pub const fn line_height(&self) -> u16 {
        self.ascent + self.descent
    }

    pub const fn ascent(&self) -> u16 { self.ascent }
    pub const fn descent(&self) -> u16 { self.descent }
    pub const fn average_width(&self) -> u16 { self.average_width }
    pub const fn glyphs(&self) -> &'static [Glyph] { self.glyphs }
}
