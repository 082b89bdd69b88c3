//! Bus transport abstraction for the drivers.

pub mod spi;

/// Abstraction over the full-duplex byte exchange required by the drivers.
///
/// Each call is one atomic transaction: chip select is asserted for the whole exchange.
pub trait BusInterface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Shifts `buf` out and replaces it, byte for byte, with the bytes shifted in.
    fn exchange(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error>;
}

impl<T: BusInterface + ?Sized> BusInterface for &mut T {
    type Error = T::Error;

    fn exchange(&mut self, buf: &mut [u8]) -> core::result::Result<(), Self::Error> {
        (**self).exchange(buf)
    }
}
