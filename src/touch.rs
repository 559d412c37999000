// XPT2046 resistive touch controller (the one soldered on most ILI9341
// modules).
//
// The controller shares nothing with the panel but the board: it sits on its
// own `SpiDevice` (CS handled by the device) plus a pen IRQ line that reads
// low while the screen is pressed.
//
// One reading = 16 samples of Y (0x90) then X (0xD0), 12-bit results
// left-aligned in 16-bit big-endian words. The averages are clamped to the
// calibration box and scaled to screen coordinates for the current rotation.

use core::fmt;

use embedded_graphics::prelude::Point;
use embedded_hal::{
    digital::InputPin,
    spi::{Operation, SpiDevice},
};
use log::trace;

use crate::ili9341::Rotation;

const CMD_READ_Y: u8 = 0x90;
const CMD_READ_X: u8 = 0xD0;

/// Samples averaged per reading. Fewer pressed samples give no reading.
pub const SAMPLES: usize = 16;

#[derive(Debug)]
pub enum TouchError<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for TouchError<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchError::Spi(e) => write!(f, "touch spi error: {:?}", e),
            TouchError::Pin(e) => write!(f, "touch irq error: {:?}", e),
        }
    }
}

/// Raw readings at the panel edges. Averages outside the box are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub min_x: u16,
    pub max_x: u16,
    pub min_y: u16,
    pub max_y: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { min_x: 1500, max_x: 31000, min_y: 3276, max_y: 30110 }
    }
}

pub struct Xpt2046<SPI, IRQ> {
    spi: SPI,
    irq: IRQ,
    calibration: Calibration,
    rotation: Rotation,
    w: u16,
    h: u16,
}

impl<SPI, IRQ> Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice<u8>,
    IRQ: InputPin,
{
    /// `width` / `height` are the logical screen size in `rotation`, same as
    /// for the panel. Negative values are taken as absolute.
    pub fn new(spi: SPI, irq: IRQ, calibration: Calibration, rotation: Rotation, width: i32, height: i32) -> Self {
        Self {
            spi,
            irq,
            calibration,
            rotation,
            w: width.unsigned_abs().min(u16::MAX as u32) as u16,
            h: height.unsigned_abs().min(u16::MAX as u32) as u16,
        }
    }

    /// Follow a panel rotation change.
    pub fn set_orientation(&mut self, rotation: Rotation) {
        if self.rotation.swaps_axes(rotation) {
            core::mem::swap(&mut self.w, &mut self.h);
        }
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn size(&self) -> (u16, u16) {
        (self.w, self.h)
    }

    pub fn is_pressed(&mut self) -> Result<bool, TouchError<SPI::Error, IRQ::Error>> {
        self.irq.is_low().map_err(TouchError::Pin)
    }

    /// Averaged touch position in screen coordinates, or `None` when the pen
    /// was lifted before all samples were taken.
    pub fn coordinates(&mut self) -> Result<Option<Point>, TouchError<SPI::Error, IRQ::Error>> {
        let mut sum_x: u32 = 0;
        let mut sum_y: u32 = 0;

        for _ in 0..SAMPLES {
            if !self.is_pressed()? {
                return Ok(None);
            }
            let (x, y) = self.sample()?;
            sum_x += x as u32;
            sum_y += y as u32;
        }

        let raw_x = (sum_x / SAMPLES as u32) as i32;
        let raw_y = (sum_y / SAMPLES as u32) as i32;
        trace!("touch raw x={} y={}", raw_x, raw_y);

        Ok(Some(self.map(raw_x, raw_y)))
    }

    /// One raw (x, y) conversion pair.
    fn sample(&mut self) -> Result<(u16, u16), TouchError<SPI::Error, IRQ::Error>> {
        let mut y = [0u8; 2];
        let mut x = [0u8; 2];
        self.spi
            .transaction(&mut [
                Operation::Write(&[CMD_READ_Y]),
                Operation::Transfer(&mut y, &[0, 0]),
                Operation::Write(&[CMD_READ_X]),
                Operation::Transfer(&mut x, &[0, 0]),
            ])
            .map_err(TouchError::Spi)?;
        Ok((u16::from_be_bytes(x), u16::from_be_bytes(y)))
    }

    // Raw averages to screen coordinates. The X plate runs along the short
    // side of the panel.
    fn map(&self, raw_x: i32, raw_y: i32) -> Point {
        let c = &self.calibration;
        let (min_x, max_x) = (c.min_x as i32, c.max_x as i32);
        let (min_y, max_y) = (c.min_y as i32, c.max_y as i32);
        let (w, h) = (self.w as i32, self.h as i32);

        let raw_x = raw_x.clamp(min_x, max_x);
        let raw_y = raw_y.clamp(min_y, max_y);
        let dx = (max_x - min_x).max(1);
        let dy = (max_y - min_y).max(1);

        let (x, y) = match self.rotation {
            Rotation::Horizontal1 => ((raw_y - min_y) * w / dy, (raw_x - min_x) * h / dx),
            Rotation::Vertical1 => ((raw_x - min_x) * w / dx, h - 1 - (raw_y - min_y) * h / dy),
            Rotation::Horizontal2 => (w - 1 - (raw_y - min_y) * w / dy, h - 1 - (raw_x - min_x) * h / dx),
            Rotation::Vertical2 => (w - 1 - (raw_x - min_x) * w / dx, (raw_y - min_y) * h / dy),
        };

        // Full-scale readings land one past the last pixel.
        Point::new(x.clamp(0, (w - 1).max(0)), y.clamp(0, (h - 1).max(0)))
    }

    /// Hand the bus device and IRQ pin back.
    pub fn release(self) -> (SPI, IRQ) {
        (self.spi, self.irq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{IrqPin, TouchSpi};

    fn touch(raw_x: u16, raw_y: u16, presses: usize, rotation: Rotation, w: i32, h: i32) -> Xpt2046<TouchSpi, IrqPin> {
        Xpt2046::new(TouchSpi::new(raw_x, raw_y), IrqPin { presses }, Calibration::default(), rotation, w, h)
    }

    #[test]
    fn no_reading_without_pen() {
        let mut t = touch(10000, 10000, 0, Rotation::Vertical1, 240, 320);
        assert!(!t.is_pressed().unwrap());
        assert_eq!(t.coordinates().unwrap(), None);
        assert_eq!(t.spi.transactions, 0);
    }

    #[test]
    fn pen_lifted_mid_reading_is_discarded() {
        let mut t = touch(10000, 10000, 5, Rotation::Vertical1, 240, 320);
        assert_eq!(t.coordinates().unwrap(), None);
        assert_eq!(t.spi.transactions, 5);
    }

    #[test]
    fn reading_takes_sixteen_samples() {
        let mut t = touch(1500, 3276, SAMPLES, Rotation::Vertical1, 240, 320);
        assert_eq!(t.coordinates().unwrap(), Some(Point::new(0, 319)));
        assert_eq!(t.spi.transactions, SAMPLES);
    }

    #[test]
    fn corners_per_rotation() {
        let c = Calibration::default();

        // Minimum raw corner.
        let cases = [
            (Rotation::Horizontal1, 320, 240, Point::new(0, 0)),
            (Rotation::Vertical1, 240, 320, Point::new(0, 319)),
            (Rotation::Horizontal2, 320, 240, Point::new(319, 239)),
            (Rotation::Vertical2, 240, 320, Point::new(239, 0)),
        ];
        for (rotation, w, h, expected) in cases {
            let mut t = touch(c.min_x, c.min_y, SAMPLES, rotation, w, h);
            assert_eq!(t.coordinates().unwrap(), Some(expected), "{:?}", rotation);
        }

        // Readings beyond the box clamp to the far corner.
        let cases = [
            (Rotation::Horizontal1, 320, 240, Point::new(319, 239)),
            (Rotation::Vertical1, 240, 320, Point::new(239, 0)),
            (Rotation::Horizontal2, 320, 240, Point::new(0, 0)),
            (Rotation::Vertical2, 240, 320, Point::new(0, 319)),
        ];
        for (rotation, w, h, expected) in cases {
            let mut t = touch(u16::MAX, u16::MAX, SAMPLES, rotation, w, h);
            assert_eq!(t.coordinates().unwrap(), Some(expected), "{:?}", rotation);
        }
    }

    #[test]
    fn center_maps_to_center() {
        let mut t = touch(16250, 16693, SAMPLES, Rotation::Vertical1, 240, 320);
        let p = t.coordinates().unwrap().unwrap();
        assert!((119..=121).contains(&p.x), "{:?}", p);
        assert!((158..=161).contains(&p.y), "{:?}", p);
    }

    #[test]
    fn orientation_swaps_size_on_class_change() {
        let mut t = touch(0, 0, 0, Rotation::Vertical1, -240, 320);
        assert_eq!(t.size(), (240, 320));

        t.set_orientation(Rotation::Vertical2);
        assert_eq!(t.size(), (240, 320));
        t.set_orientation(Rotation::Horizontal2);
        assert_eq!(t.size(), (320, 240));
        assert_eq!(t.rotation(), Rotation::Horizontal2);
    }

    #[test]
    fn bus_failure_surfaces() {
        let mut t = touch(0, 0, SAMPLES, Rotation::Vertical1, 240, 320);
        t.spi.fail = true;
        assert!(matches!(t.coordinates(), Err(TouchError::Spi(_))));
    }
}
