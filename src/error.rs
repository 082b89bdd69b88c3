//! Error handling primitives for the ADS1248/RM3100 drivers.

use embedded_hal::digital::ErrorKind;

use crate::lines::Line;

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Any error reported by the underlying bus transport, passed through unmodified.
    Interface(E),
    /// A control line was missing or its pin reported an error.
    Line(LineError),
    /// A request was rejected before anything was sent on the bus.
    Protocol(ProtocolError),
    /// The data-ready wait exceeded its bound.
    Timeout,
    /// The data-ready wait was cancelled by the caller.
    Cancelled,
}

/// Validation failures raised by the pure protocol layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// A value or byte length lies outside its numeric domain.
    Range,
    /// A register sub-field value lies outside its declared range.
    InvalidField,
    /// A register sub-field name is not part of the register.
    UnknownField,
    /// A multi-register count is outside `1..=15` or disagrees with the payload.
    CountRange,
    /// The operation is not permitted in the current device mode.
    IllegalState,
}

/// Control-line failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// The operation needs a line the deployment did not wire up.
    Missing(Line),
    /// The pin implementation reported an error.
    Pin(ErrorKind),
}

impl<E> From<ProtocolError> for Error<E> {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl<E> From<LineError> for Error<E> {
    fn from(err: LineError) -> Self {
        Self::Line(err)
    }
}
