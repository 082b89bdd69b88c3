//! High-level device drivers.
//!
//! Both drivers share the same shape: a register map, a [`TransactionBuilder`] for the
//! device's framing and a [`DeviceState`] gating register access. The common capability is
//! captured by [`RegisterAddressableDevice`].
//!
//! [`TransactionBuilder`]: crate::transaction::TransactionBuilder
//! [`DeviceState`]: crate::state::DeviceState

pub mod ads1248;
pub mod rm3100;

use crate::error::{Error, ProtocolError, Result};
use crate::interface::BusInterface;
use crate::registers::{field_pack, lookup, RegisterAccess, RegisterDef};
use crate::state::DeviceState;
use crate::transaction::{Reply, TransactionRequest};

/// Largest register read back by [`RegisterAddressableDevice::update_fields`].
const MAX_REGISTER_BYTES: usize = 4;

/// Register-level access shared by every supported device family.
pub trait RegisterAddressableDevice {
    /// Error type of the underlying bus.
    type Error;
    /// Bare commands understood by the device.
    type Command: Copy;

    /// Reads `buf.len()` consecutive registers starting at `address`.
    fn read_registers(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `data` to consecutive registers starting at `address`.
    fn write_registers(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Issues a bare command.
    fn command(&mut self, command: Self::Command) -> Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.read_registers(address, &mut value)?;
        Ok(value[0])
    }

    /// Writes a single register.
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.write_registers(address, &[value])
    }

    /// Read-modify-write of named fields. Every update is validated before the bus is touched,
    /// and the write is skipped when the register already holds the packed value.
    fn update_fields(&mut self, register: &RegisterDef, updates: &[(&str, u32)]) -> Result<(), Self::Error> {
        register.check_updates(updates)?;

        let width = register.width_bytes as usize;
        if width > MAX_REGISTER_BYTES {
            return Err(Error::Protocol(ProtocolError::Range));
        }
        let mut raw = [0u8; MAX_REGISTER_BYTES];
        self.read_registers(register.address, &mut raw[..width])?;

        let current = register.decode(&raw[..width])?;
        let updated = field_pack(register, current, updates)?;
        if updated != current {
            register.encode(updated, &mut raw[..width])?;
            self.write_registers(register.address, &raw[..width])?;
        }
        Ok(())
    }
}

/// Checks every register touched by a transfer of `count` bytes at `address`.
///
/// Addresses outside `table` are rejected, as are writes to read-only registers and any
/// access the current mode forbids.
pub(crate) fn check_span(
    table: &'static [RegisterDef],
    state: &DeviceState,
    address: u8,
    count: usize,
    write: bool,
) -> core::result::Result<(), ProtocolError> {
    for offset in 0..count {
        let target = u8::try_from(address as usize + offset).map_err(|_| ProtocolError::Range)?;
        let register = lookup(table, target).ok_or(ProtocolError::Range)?;
        if write && register.access == RegisterAccess::ReadOnly {
            return Err(ProtocolError::InvalidField);
        }
        state.check_access([register])?;
    }
    Ok(())
}

/// Runs one exchange, passing transport errors through unmodified.
pub(crate) fn execute<B>(bus: &mut B, request: &TransactionRequest) -> Result<Reply, B::Error>
where
    B: BusInterface + ?Sized,
{
    request.execute(bus).map_err(Error::Interface)
}
