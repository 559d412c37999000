// Four-wire SPI transport for command/data panels.
//
// The panel is addressed with a chip-select line and a data/command line next
// to a plain `SpiBus`. CS is driven here rather than through an `SpiDevice`
// so one selection can span many commands (address window + pixel stream,
// or a whole compound shape).
//
// `SpiBus` writes may return before the bytes are on the wire, so the bus is
// flushed before either control line changes level.

use embedded_hal::{digital::OutputPin, spi::SpiBus};

use crate::ili9341::Error;

/// Largest single bus transfer. Longer data writes are split into chunks of
/// this size, sent back to back in order.
pub const MAX_TRANSFER: usize = 32768;

/// Bus handle plus the CS and D/C lines of one panel.
pub struct SpiInterface<SPI, CS, DC> {
    spi: SPI,
    cs: CS,
    dc: DC,
}

impl<SPI, CS, DC, PinE> SpiInterface<SPI, CS, DC>
where
    SPI: SpiBus<u8>,
    CS: OutputPin<Error = PinE>,
    DC: OutputPin<Error = PinE>,
{
    pub fn new(spi: SPI, cs: CS, dc: DC) -> Self {
        Self { spi, cs, dc }
    }

    /// Assert chip-select (active low).
    pub fn select(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.cs.set_low().map_err(Error::Pin)
    }

    /// Wait for the bus to drain, then release chip-select.
    pub fn deselect(&mut self) -> Result<(), Error<SPI::Error, PinE>> {
        self.spi.flush().map_err(Error::Spi)?;
        self.cs.set_high().map_err(Error::Pin)
    }

    /// Send one command byte with D/C low.
    pub fn write_command(&mut self, cmd: u8) -> Result<(), Error<SPI::Error, PinE>> {
        self.spi.flush().map_err(Error::Spi)?;
        self.dc.set_low().map_err(Error::Pin)?;
        self.spi.write(&[cmd]).map_err(Error::Spi)
    }

    /// Send a data buffer with D/C high, chunked to [`MAX_TRANSFER`].
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), Error<SPI::Error, PinE>> {
        self.spi.flush().map_err(Error::Spi)?;
        self.dc.set_high().map_err(Error::Pin)?;
        for chunk in data.chunks(MAX_TRANSFER) {
            self.spi.write(chunk).map_err(Error::Spi)?;
        }
        Ok(())
    }

    /// Give the bus and both lines back.
    pub fn release(self) -> (SPI, CS, DC) {
        (self.spi, self.cs, self.dc)
    }
}
