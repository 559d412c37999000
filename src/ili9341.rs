// ILI9341 panel controller (4-wire SPI: CS + D/C + RST next to the bus).
//
// Works with any embedded-hal 1.0 `SpiBus` and `OutputPin`s; pass `&mut`
// references if the caller wants to keep owning the peripherals.
//
// Protocol:
//   command byte with D/C low, then its parameters with D/C high.
//   Drawing = CASET (0x2A) + RASET (0x2B) + RAMWR (0x2C), then big-endian
//   RGB565 samples until the next command.
//
// Geometry: 240 x 320 native, logical size follows the MADCTL rotation.

use core::fmt;

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
use log::{debug, info, trace};

use crate::interface::SpiInterface;

/// Native panel size in the vertical rotations.
pub const ILI9341_WIDTH: u16 = 240;
pub const ILI9341_HEIGHT: u16 = 320;

mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const INVOFF: u8 = 0x20;
    pub const INVON: u8 = 0x21;
    pub const GAMMASET: u8 = 0x26;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const PIXFMT: u8 = 0x3A;
    pub const WRDISBV: u8 = 0x51;
    pub const FRMCTR1: u8 = 0xB1;
    pub const DFUNCTR: u8 = 0xB6;
    pub const PWCTR1: u8 = 0xC0;
    pub const PWCTR2: u8 = 0xC1;
    pub const VMCTR1: u8 = 0xC5;
    pub const VMCTR2: u8 = 0xC7;
    pub const PWCTRA: u8 = 0xCB;
    pub const PWCTRB: u8 = 0xCF;
    pub const GMCTRP1: u8 = 0xE0;
    pub const GMCTRN1: u8 = 0xE1;
    pub const DTCTRA: u8 = 0xE8;
    pub const DTCTRB: u8 = 0xEA;
    pub const PWRSEQ: u8 = 0xED;
    pub const GAMMA3: u8 = 0xF2;
    pub const PUMPRC: u8 = 0xF7;
}

// MADCTL bits
const MADCTL_MY: u8 = 0x80;
const MADCTL_MX: u8 = 0x40;
const MADCTL_MV: u8 = 0x20;
const MADCTL_BGR: u8 = 0x08;

/// Errors from the bus or the control lines.
#[derive(Debug)]
pub enum Error<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
    /// Image buffer length does not match `2 * w * h`.
    ImageSize { expected: usize, actual: usize },
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(e) => write!(f, "spi error: {:?}", e),
            Error::Pin(e) => write!(f, "pin error: {:?}", e),
            Error::ImageSize { expected, actual } => {
                write!(f, "image is {} bytes, expected {}", actual, expected)
            }
        }
    }
}

/// Physical panel orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
    Vertical1,
    Horizontal1,
    Horizontal2,
    Vertical2,
}

impl Rotation {
    /// MADCTL parameter for this rotation.
    pub const fn madctl(self) -> u8 {
        match self {
            Rotation::Vertical1 => MADCTL_MX | MADCTL_BGR,
            Rotation::Horizontal1 => MADCTL_MX | MADCTL_MY | MADCTL_MV | MADCTL_BGR,
            Rotation::Horizontal2 => MADCTL_MV | MADCTL_BGR,
            Rotation::Vertical2 => MADCTL_MY | MADCTL_BGR,
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Rotation::Horizontal1 | Rotation::Horizontal2)
    }

    /// True when going from `self` to `other` exchanges width and height.
    pub const fn swaps_axes(self, other: Rotation) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }
}

/// ILI9341 device handle.
pub struct Ili9341<SPI, CS, DC, RST> {
    iface: SpiInterface<SPI, CS, DC>,
    rst: RST,
    rotation: Rotation,
    w: u16,
    h: u16,
}

impl<SPI, CS, DC, RST, PinE> Ili9341<SPI, CS, DC, RST>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
    RST: OutputPin<Error = PinE>,
{
    /// Reset and bring up the panel. Call once at startup.
    ///
    /// * `width`, `height` - logical size in `rotation`, e.g. 320 x 240 for
    ///   the horizontal rotations. Negative values are taken as absolute.
    /// * `delay` - only used during bring-up; the 1000 ms after SWRESET and
    ///   120 ms after SLPOUT are required by the panel.
    ///
    /// Returns the handle deselected.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spi: SPI,
        cs: CS,
        dc: DC,
        rst: RST,
        delay: &mut impl DelayNs,
        rotation: Rotation,
        width: i32,
        height: i32,
    ) -> Result<Self, Error<SPI::Error, PinE>> {
        let mut this = Self {
            iface: SpiInterface::new(spi, cs, dc),
            rst,
            rotation,
            w: clamp_dimension(width),
            h: clamp_dimension(height),
        };

        this.iface.select()?;

        // Hard reset
        this.rst.set_low().map_err(Error::Pin)?;
        delay.delay_ms(5);
        this.rst.set_high().map_err(Error::Pin)?;

        // SW reset + settle
        this.command(cmd::SWRESET, &[])?;
        delay.delay_ms(1000);

        // Power control A / B
        this.command(cmd::PWCTRA, &[0x39, 0x2C, 0x00, 0x34, 0x02])?;
        this.command(cmd::PWCTRB, &[0x00, 0xC1, 0x30])?;

        // Driver timing control A / B
        this.command(cmd::DTCTRA, &[0x85, 0x00, 0x78])?;
        this.command(cmd::DTCTRB, &[0x00, 0x00])?;

        // Power on sequence, pump ratio
        this.command(cmd::PWRSEQ, &[0x64, 0x03, 0x12, 0x81])?;
        this.command(cmd::PUMPRC, &[0x20])?;

        // Power control VRH[5:0], SAP[2:0];BT[3:0]
        this.command(cmd::PWCTR1, &[0x23])?;
        this.command(cmd::PWCTR2, &[0x10])?;

        // VCM control 1 / 2
        this.command(cmd::VMCTR1, &[0x3E, 0x28])?;
        this.command(cmd::VMCTR2, &[0x86])?;

        // Memory access control (default), pixel format = 16bpp (RGB565)
        this.command(cmd::MADCTL, &[0x48])?;
        this.command(cmd::PIXFMT, &[0x55])?;

        // Frame ratio, standard RGB color
        this.command(cmd::FRMCTR1, &[0x00, 0x18])?;

        // Display function control
        this.command(cmd::DFUNCTR, &[0x08, 0x82, 0x27])?;

        // 3Gamma off, gamma curve 1
        this.command(cmd::GAMMA3, &[0x00])?;
        this.command(cmd::GAMMASET, &[0x01])?;

        // Positive / negative gamma correction
        this.command(
            cmd::GMCTRP1,
            &[0x0F, 0x31, 0x2B, 0x0C, 0x0E, 0x08, 0x4E, 0xF1, 0x37, 0x07, 0x10, 0x03, 0x0E, 0x09, 0x00],
        )?;
        this.command(
            cmd::GMCTRN1,
            &[0x00, 0x0E, 0x14, 0x03, 0x11, 0x07, 0x31, 0xC1, 0x48, 0x08, 0x0F, 0x0C, 0x31, 0x36, 0x0F],
        )?;

        // Sleep out + settle
        this.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(120);

        this.command(cmd::DISPON, &[])?;

        // Requested orientation
        this.command(cmd::MADCTL, &[rotation.madctl()])?;

        this.iface.deselect()?;

        info!("ili9341 ready: {}x{} {:?}", this.w, this.h, rotation);
        Ok(this)
    }

    // Logical width in pixels (current rotation).
    #[inline]
    pub fn width(&self) -> u16 { self.w }

    // Logical height in pixels (current rotation).
    #[inline]
    pub fn height(&self) -> u16 { self.h }

    #[inline]
    pub fn rotation(&self) -> Rotation { self.rotation }

    /// Rotate the panel. Width and height swap only when moving between a
    /// vertical and a horizontal rotation.
    pub fn set_orientation(&mut self, rotation: Rotation) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.command(cmd::MADCTL, &[rotation.madctl()]))?;

        if self.rotation.swaps_axes(rotation) {
            core::mem::swap(&mut self.w, &mut self.h);
        }
        self.rotation = rotation;

        debug!("ili9341 orientation {:?}: {}x{}", rotation, self.w, self.h);
        Ok(())
    }

    /// Backlight PWM duty (WRDISBV), 0 = off, 255 = full.
    pub fn set_brightness(&mut self, value: u8) -> Result<(), Error<SPI::Error, PinE>> {
        self.transaction(|d| d.command(cmd::WRDISBV, &[value]))
    }

    pub fn invert_colors(&mut self, invert: bool) -> Result<(), Error<SPI::Error, PinE>> {
        let c = if invert { cmd::INVON } else { cmd::INVOFF };
        self.transaction(|d| d.command(c, &[]))
    }

    /// Run `f` with the panel selected and deselect afterwards, also when `f`
    /// fails. Everything drawn inside shares one CS assertion.
    pub fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error<SPI::Error, PinE>>,
    ) -> Result<R, Error<SPI::Error, PinE>> {
        self.iface.select()?;
        let result = f(self);
        let released = self.iface.deselect();
        let value = result?;
        released?;
        Ok(value)
    }

    /// Program the inclusive window `[x0, x1] x [y0, y1]` and start a RAM
    /// write. The panel must be selected (see [`Self::transaction`]).
    pub fn set_address_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Error<SPI::Error, PinE>> {
        trace!("window ({}, {})..=({}, {})", x0, y0, x1, y1);

        let ca = [(x0 >> 8) as u8, (x0 & 0xFF) as u8, (x1 >> 8) as u8, (x1 & 0xFF) as u8];
        let ra = [(y0 >> 8) as u8, (y0 & 0xFF) as u8, (y1 >> 8) as u8, (y1 & 0xFF) as u8];

        self.command(cmd::CASET, &ca)?;
        self.command(cmd::RASET, &ra)?;
        self.command(cmd::RAMWR, &[])
    }

    /// Stream raw big-endian RGB565 bytes into the current window.
    pub fn write_pixels(&mut self, data: &[u8]) -> Result<(), Error<SPI::Error, PinE>> {
        self.iface.write_data(data)
    }

    /// Hand the peripherals back: `(spi, cs, dc, rst)`.
    pub fn release(self) -> (SPI, CS, DC, RST) {
        let (spi, cs, dc) = self.iface.release();
        (spi, cs, dc, self.rst)
    }

    // ---- Low-level helpers ----

    pub(crate) fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Error<SPI::Error, PinE>> {
        self.iface.write_command(cmd)?;
        if !params.is_empty() {
            self.iface.write_data(params)?;
        }
        Ok(())
    }
}

fn clamp_dimension(v: i32) -> u16 {
    v.unsigned_abs().min(u16::MAX as u32) as u16
}
