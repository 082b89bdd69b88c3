//! Static register descriptions shared by both device families.
//!
//! Every register is described once, as immutable process-wide data, by a [`RegisterDef`]
//! listing its address, byte width and named sub-fields. [`field_pack`] applies
//! read-modify-write updates against those descriptions.

/// Implements byte conversions and [`Register`] for a single-byte bitfield view.
macro_rules! byte_register {
    ($view:ty, $def:expr) => {
        impl From<u8> for $view {
            fn from(value: u8) -> Self {
                Self::from_bytes([value])
            }
        }

        impl From<$view> for u8 {
            fn from(value: $view) -> Self {
                value.into_bytes()[0]
            }
        }

        impl Register for $view {
            const DEF: &'static RegisterDef = &$def;
        }
    };
}

pub mod ads1248;
pub mod rm3100;

use crate::error::ProtocolError;

/// Access permissions encoded for each register or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterAccess {
    /// Read-only register.
    ReadOnly,
    /// Write-only register.
    WriteOnly,
    /// Read/write register.
    ReadWrite,
}

/// A named bit span inside a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Datasheet field name.
    pub name: &'static str,
    /// Position of the least significant bit.
    pub offset: u8,
    /// Number of bits.
    pub width: u8,
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value.
    pub max: u32,
    /// Whether the field may be written.
    pub access: RegisterAccess,
}

impl FieldDef {
    /// Read/write field accepting every value its bit span can hold.
    pub const fn new(name: &'static str, offset: u8, width: u8) -> Self {
        Self {
            name,
            offset,
            width,
            min: 0,
            max: (1u32 << width) - 1,
            access: RegisterAccess::ReadWrite,
        }
    }

    /// Narrows the accepted value range.
    pub const fn range(mut self, min: u32, max: u32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Marks the field as read-only.
    pub const fn read_only(mut self) -> Self {
        self.access = RegisterAccess::ReadOnly;
        self
    }

    /// Mask covering the field's bits in register position.
    pub const fn mask(&self) -> u32 {
        (((1u64 << self.width) - 1) as u32) << self.offset
    }

    fn check(&self, value: u32) -> Result<(), ProtocolError> {
        if matches!(self.access, RegisterAccess::ReadOnly) {
            return Err(ProtocolError::InvalidField);
        }
        if value < self.min || value > self.max || value > self.mask() >> self.offset {
            return Err(ProtocolError::InvalidField);
        }
        Ok(())
    }
}

/// Static description of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDef {
    /// Datasheet register name.
    pub name: &'static str,
    /// Register address.
    pub address: u8,
    /// Width in bytes; multi-byte registers are transferred MSB first.
    pub width_bytes: u8,
    /// Access permission classification.
    pub access: RegisterAccess,
    /// Named sub-fields, non-overlapping.
    pub fields: &'static [FieldDef],
    /// Bits that must always be written as zero.
    pub reserved_mask: u32,
    /// Whether the register may be accessed while a conversion is active.
    pub converting_access: bool,
}

impl RegisterDef {
    /// Single-byte read/write register that is locked during conversions.
    pub const fn new(name: &'static str, address: u8, fields: &'static [FieldDef]) -> Self {
        Self {
            name,
            address,
            width_bytes: 1,
            access: RegisterAccess::ReadWrite,
            fields,
            reserved_mask: 0,
            converting_access: false,
        }
    }

    /// Overrides the byte width.
    pub const fn width(mut self, width_bytes: u8) -> Self {
        self.width_bytes = width_bytes;
        self
    }

    /// Overrides the access classification.
    pub const fn access(mut self, access: RegisterAccess) -> Self {
        self.access = access;
        self
    }

    /// Declares bits that must be written as zero.
    pub const fn reserved(mut self, mask: u32) -> Self {
        self.reserved_mask = mask;
        self
    }

    /// Allows access while a conversion is active.
    pub const fn accessible_while_converting(mut self) -> Self {
        self.converting_access = true;
        self
    }

    /// Mask covering every bit of the register.
    pub const fn value_mask(&self) -> u32 {
        ((1u64 << (self.width_bytes as u32 * 8)) - 1) as u32
    }

    /// Returns `true` when `address` falls inside this register's byte span.
    pub const fn covers(&self, address: u8) -> bool {
        address >= self.address && (address as u16) < self.address as u16 + self.width_bytes as u16
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&'static FieldDef, ProtocolError> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or(ProtocolError::UnknownField)
    }

    /// Validates a set of field updates without touching any value.
    pub fn check_updates(&self, updates: &[(&str, u32)]) -> Result<(), ProtocolError> {
        for &(name, value) in updates {
            self.field(name)?.check(value)?;
        }
        Ok(())
    }

    /// Checks that fields neither overlap each other nor the reserved bits, and fit the width.
    pub fn layout_is_valid(&self) -> bool {
        let mut used = self.reserved_mask;
        for field in self.fields {
            let mask = field.mask();
            if field.width == 0 || mask & !self.value_mask() != 0 || used & mask != 0 {
                return false;
            }
            if field.min > field.max || field.max > mask >> field.offset {
                return false;
            }
            used |= mask;
        }
        used & !self.value_mask() == 0
    }

    /// Serializes `value` MSB first into `out`, which must be `width_bytes` long.
    pub fn encode(&self, value: u32, out: &mut [u8]) -> Result<(), ProtocolError> {
        if out.len() != self.width_bytes as usize || value & !self.value_mask() != 0 {
            return Err(ProtocolError::Range);
        }
        let mut raw = value;
        for byte in out.iter_mut().rev() {
            *byte = (raw & 0xFF) as u8;
            raw >>= 8;
        }
        Ok(())
    }

    /// Parses an MSB-first byte sequence of `width_bytes` length.
    pub fn decode(&self, bytes: &[u8]) -> Result<u32, ProtocolError> {
        if bytes.len() != self.width_bytes as usize {
            return Err(ProtocolError::Range);
        }
        Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
    }
}

/// Typed view over a register description.
pub trait Register {
    /// Register description backing this view.
    const DEF: &'static RegisterDef;
}

/// Applies `updates` to `current`, leaving every other bit untouched.
///
/// All updates are validated before any bit is changed. Reserved bits are cleared.
pub fn field_pack(
    register: &RegisterDef,
    current: u32,
    updates: &[(&str, u32)],
) -> Result<u32, ProtocolError> {
    register.check_updates(updates)?;
    if current & !register.value_mask() != 0 {
        return Err(ProtocolError::Range);
    }

    let mut value = current;
    for &(name, field_value) in updates {
        let field = register.field(name)?;
        value = (value & !field.mask()) | (field_value << field.offset);
    }
    Ok(value & !register.reserved_mask)
}

/// Extracts a named field from a register value.
pub fn field_unpack(register: &RegisterDef, value: u32, name: &str) -> Result<u32, ProtocolError> {
    let field = register.field(name)?;
    Ok((value & field.mask()) >> field.offset)
}

/// Finds the register whose byte span contains `address`.
pub fn lookup(table: &'static [RegisterDef], address: u8) -> Option<&'static RegisterDef> {
    table.iter().find(|register| register.covers(address))
}
