//! embedded-graphics `DrawTarget` for the panel, so the wider e-g ecosystem
//! (mono fonts, styled primitives, `ImageRaw`) can draw on it.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::{Dimensions, DrawTarget, OriginDimensions, Size},
    primitives::{PointsIter, Rectangle},
    Pixel,
};
use embedded_hal::{digital::OutputPin, spi::SpiBus};

use crate::color::to_wire;
use crate::ili9341::{Error, Ili9341};
use crate::primitives::FILL_BUFFER_LEN;

impl<SPI, CS, DC, RST, PinE> OriginDimensions for Ili9341<SPI, CS, DC, RST>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    fn size(&self) -> Size {
        Size::new(self.width() as u32, self.height() as u32)
    }
}

impl<SPI, CS, DC, RST, PinE> DrawTarget for Ili9341<SPI, CS, DC, RST>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    type Color = Rgb565;
    type Error = Error<SPI::Error, PinE>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.transaction(|d| {
            for Pixel(p, color) in pixels {
                d.draw_pixel_fast(p.x.into(), p.y.into(), color)?;
            }
            Ok(())
        })
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let drawable = area.intersection(&self.bounding_box());
        let Some(bottom_right) = drawable.bottom_right() else {
            return Ok(());
        };
        let top_left = drawable.top_left;

        // Colors cover `area` row by row; keep the ones inside `drawable`,
        // which then arrive in its own row-major order.
        let visible = area
            .points()
            .zip(colors)
            .filter(|(p, _)| drawable.contains(*p))
            .map(|(_, c)| to_wire(c));

        self.transaction(|d| {
            d.set_address_window(
                top_left.x as u16,
                top_left.y as u16,
                bottom_right.x as u16,
                bottom_right.y as u16,
            )?;

            let mut buf = [0u16; FILL_BUFFER_LEN];
            let mut n = 0;
            for sample in visible {
                buf[n] = sample;
                n += 1;
                if n == FILL_BUFFER_LEN {
                    d.write_pixels(bytemuck::cast_slice(&buf))?;
                    n = 0;
                }
            }
            if n > 0 {
                d.write_pixels(bytemuck::cast_slice(&buf[..n]))?;
            }
            Ok(())
        })
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let drawable = area.intersection(&self.bounding_box());
        if drawable.is_zero_sized() {
            return Ok(());
        }
        let Size { width, height } = drawable.size;
        self.fill_rect(drawable.top_left.x, drawable.top_left.y, width as i32, height as i32, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_screen(color)
    }
}
