//! SPI interface implementation built on top of `embedded-hal` `SpiDevice`.

use embedded_hal::spi::{MODE_0, MODE_1, Mode, SpiDevice};

use super::BusInterface;

/// SPI mode required by the ADS1248 (CPOL = 0, CPHA = 1).
pub const ADS1248_SPI_MODE: Mode = MODE_1;
/// SPI mode required by the RM3100 (CPOL = 0, CPHA = 0).
pub const RM3100_SPI_MODE: Mode = MODE_0;
/// Bus clock used for both devices.
pub const SPI_CLOCK_HZ: u32 = 1_000_000;

/// SPI-based transport for the drivers.
///
/// The wrapped [`SpiDevice`] owns chip select and must already be configured with the
/// device's mode and clock rate.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Creates a new interface from the provided SPI device abstraction.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Provides mutable access to the wrapped SPI device.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the owned SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> BusInterface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn exchange(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.spi.transfer_in_place(buf)
    }
}
