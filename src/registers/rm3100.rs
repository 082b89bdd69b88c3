//! Register map and typed views for the RM3100 magnetometer.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use super::{FieldDef, Register, RegisterAccess, RegisterDef};

/// Register address of `POLL` (single measurement request).
pub const REG_POLL: u8 = 0x00;
/// Register address of `CMM` (continuous measurement mode).
pub const REG_CMM: u8 = 0x01;
/// Register address of `CCX` (X cycle count, MSB).
pub const REG_CCX: u8 = 0x04;
/// Register address of `CCY`.
pub const REG_CCY: u8 = 0x06;
/// Register address of `CCZ`.
pub const REG_CCZ: u8 = 0x08;
/// Register address of `TMRC` (continuous-mode update rate).
pub const REG_TMRC: u8 = 0x0B;
/// Register address of `MX` (X measurement, MSB).
pub const REG_MX: u8 = 0x24;
/// Register address of `MY`.
pub const REG_MY: u8 = 0x27;
/// Register address of `MZ`.
pub const REG_MZ: u8 = 0x2A;
/// Register address of `STATUS`.
pub const REG_STATUS: u8 = 0x34;
/// Register address of `REVID`.
pub const REG_REVID: u8 = 0x36;

/// Expected content of `REVID`.
pub const EXPECTED_REVID: u8 = 0x22;

/// Bit set on a register address to request a read.
pub const READ_BIT: u8 = 0x80;
/// Bit set on a register address to request a write.
pub const WRITE_BIT: u8 = 0x00;

/// Lowest recommended cycle count.
pub const CYCLE_COUNT_MIN: u16 = 30;
/// Highest recommended cycle count.
pub const CYCLE_COUNT_MAX: u16 = 400;

const CC_FIELD: [FieldDef; 1] =
    [FieldDef::new("CC", 0, 16).range(CYCLE_COUNT_MIN as u32, CYCLE_COUNT_MAX as u32)];
const MEASUREMENT_FIELD: [FieldDef; 1] = [FieldDef::new("M", 0, 24).read_only()];

/// `POLL`: request one measurement on the selected axes.
pub const POLL: RegisterDef = RegisterDef::new(
    "POLL",
    REG_POLL,
    &[FieldDef::new("PMX", 4, 1), FieldDef::new("PMY", 5, 1), FieldDef::new("PMZ", 6, 1)],
)
.reserved(0x8F)
.accessible_while_converting();

/// `CMM`: continuous measurement control.
pub const CMM: RegisterDef = RegisterDef::new(
    "CMM",
    REG_CMM,
    &[
        FieldDef::new("START", 0, 1),
        FieldDef::new("DRDM", 2, 2),
        FieldDef::new("CMX", 4, 1),
        FieldDef::new("CMY", 5, 1),
        FieldDef::new("CMZ", 6, 1),
    ],
)
.reserved(0x82)
.accessible_while_converting();

/// `CCX`: X-axis cycle count. Changing cycle counts mid-conversion corrupts the result.
pub const CCX: RegisterDef = RegisterDef::new("CCX", REG_CCX, &CC_FIELD).width(2);
/// `CCY`: Y-axis cycle count.
pub const CCY: RegisterDef = RegisterDef::new("CCY", REG_CCY, &CC_FIELD).width(2);
/// `CCZ`: Z-axis cycle count.
pub const CCZ: RegisterDef = RegisterDef::new("CCZ", REG_CCZ, &CC_FIELD).width(2);

/// `TMRC`: continuous-mode update rate.
pub const TMRC: RegisterDef =
    RegisterDef::new("TMRC", REG_TMRC, &[FieldDef::new("TMRC", 0, 8).range(0x92, 0x9F)])
        .accessible_while_converting();

/// `MX`: X-axis result.
pub const MX: RegisterDef = RegisterDef::new("MX", REG_MX, &MEASUREMENT_FIELD)
    .width(3)
    .access(RegisterAccess::ReadOnly)
    .accessible_while_converting();
/// `MY`: Y-axis result.
pub const MY: RegisterDef = RegisterDef::new("MY", REG_MY, &MEASUREMENT_FIELD)
    .width(3)
    .access(RegisterAccess::ReadOnly)
    .accessible_while_converting();
/// `MZ`: Z-axis result.
pub const MZ: RegisterDef = RegisterDef::new("MZ", REG_MZ, &MEASUREMENT_FIELD)
    .width(3)
    .access(RegisterAccess::ReadOnly)
    .accessible_while_converting();

/// `STATUS`: data-ready flag.
pub const STATUS: RegisterDef =
    RegisterDef::new("STATUS", REG_STATUS, &[FieldDef::new("DRDY", 7, 1).read_only()])
        .reserved(0x7F)
        .access(RegisterAccess::ReadOnly)
        .accessible_while_converting();

/// `REVID`: silicon revision.
pub const REVID: RegisterDef =
    RegisterDef::new("REVID", REG_REVID, &[FieldDef::new("REVID", 0, 8).read_only()])
        .access(RegisterAccess::ReadOnly)
        .accessible_while_converting();

/// Complete register map, ordered by address.
pub const REGISTERS: &[RegisterDef] = &[POLL, CMM, CCX, CCY, CCZ, TMRC, MX, MY, MZ, STATUS, REVID];

/// Bitfield representation of the `POLL` register (address `0x00`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    #[skip]
    __: B4,
    // Measure X (bit 4).
    pub pmx: bool,
    // Measure Y (bit 5).
    pub pmy: bool,
    // Measure Z (bit 6).
    pub pmz: bool,
    #[skip]
    __: B1,
}

/// Bitfield representation of the `CMM` register (address `0x01`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cmm {
    // Continuous mode running (bit 0).
    pub start: bool,
    #[skip]
    __: B1,
    // DRDY pin behaviour (bits 3:2).
    pub drdm: B2,
    // Include X (bit 4).
    pub cmx: bool,
    // Include Y (bit 5).
    pub cmy: bool,
    // Include Z (bit 6).
    pub cmz: bool,
    #[skip]
    __: B1,
}

/// Bitfield representation of the `STATUS` register (address `0x34`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    #[skip]
    __: B7,
    // Measurement available (bit 7).
    pub drdy: bool,
}

byte_register!(Poll, POLL);
byte_register!(Cmm, CMM);
byte_register!(Status, STATUS);
