//! Register map and typed views for the ADS1248 delta-sigma ADC.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use super::{FieldDef, Register, RegisterDef};
use crate::params::{BurnoutCurrent, IdacMagnitude, PgaGain, ReferenceSelect, SystemMonitor};

/// Register address of `MUX0`.
pub const REG_MUX0: u8 = 0x00;
/// Register address of `VBIAS`.
pub const REG_VBIAS: u8 = 0x01;
/// Register address of `MUX1`.
pub const REG_MUX1: u8 = 0x02;
/// Register address of `SYS0`.
pub const REG_SYS0: u8 = 0x03;
/// Register address of `OFC0` (offset calibration, least significant byte).
pub const REG_OFC0: u8 = 0x04;
/// Register address of `OFC1`.
pub const REG_OFC1: u8 = 0x05;
/// Register address of `OFC2`.
pub const REG_OFC2: u8 = 0x06;
/// Register address of `FSC0` (gain calibration, least significant byte).
pub const REG_FSC0: u8 = 0x07;
/// Register address of `FSC1`.
pub const REG_FSC1: u8 = 0x08;
/// Register address of `FSC2`.
pub const REG_FSC2: u8 = 0x09;
/// Register address of `IDAC0`.
pub const REG_IDAC0: u8 = 0x0A;
/// Register address of `IDAC1`.
pub const REG_IDAC1: u8 = 0x0B;
/// Register address of `GPIOCFG`.
pub const REG_GPIOCFG: u8 = 0x0C;
/// Register address of `GPIODIR`.
pub const REG_GPIODIR: u8 = 0x0D;
/// Register address of `GPIODAT`.
pub const REG_GPIODAT: u8 = 0x0E;

/// Command opcodes (datasheet table 19).
pub mod cmd {
    /// Exit power-down mode.
    pub const WAKEUP: u8 = 0x00;
    /// Enter power-down mode.
    pub const SLEEP: u8 = 0x02;
    /// Synchronize conversions; sent twice.
    pub const SYNC: [u8; 2] = [0x04, 0x04];
    /// Reset to power-up values.
    pub const RESET: u8 = 0x06;
    /// No operation; also the filler byte used to clock out data.
    pub const NOP: u8 = 0xFF;
    /// Read data once.
    pub const RDATA: u8 = 0x12;
    /// Enter read-data-continuous mode.
    pub const RDATAC: u8 = 0x14;
    /// Leave read-data-continuous mode.
    pub const SDATAC: u8 = 0x16;
    /// Read registers; OR with the start address.
    pub const RREG: u8 = 0x20;
    /// Write registers; OR with the start address.
    pub const WREG: u8 = 0x40;
    /// System offset calibration.
    pub const SYSOCAL: u8 = 0x60;
    /// System gain calibration.
    pub const SYSGCAL: u8 = 0x61;
    /// Self offset calibration.
    pub const SELFOCAL: u8 = 0x62;

    /// Second opcode byte of a register access, `0000 nnnn` with `nnnn = count - 1`.
    pub const fn count_byte(count: u8) -> u8 {
        count.wrapping_sub(1) & 0x0F
    }
}

/// `MUX0`: burnout current and input multiplexer.
pub const MUX0: RegisterDef = RegisterDef::new(
    "MUX0",
    REG_MUX0,
    &[
        FieldDef::new("MUX_SN", 0, 3),
        FieldDef::new("MUX_SP", 3, 3),
        FieldDef::new("BCS", 6, 2),
    ],
);

/// `VBIAS`: bias voltage enable per analog input.
pub const VBIAS: RegisterDef = RegisterDef::new("VBIAS", REG_VBIAS, &[FieldDef::new("VBIAS", 0, 8)]);

/// `MUX1`: clock status, reference control and system monitor.
pub const MUX1: RegisterDef = RegisterDef::new(
    "MUX1",
    REG_MUX1,
    &[
        FieldDef::new("MUXCAL", 0, 3),
        FieldDef::new("REFSELT", 3, 2),
        FieldDef::new("VREFCON", 5, 2),
        FieldDef::new("CLKSTAT", 7, 1).read_only(),
    ],
);

/// `SYS0`: PGA gain and data rate. Bit 7 must be written as zero.
pub const SYS0: RegisterDef = RegisterDef::new(
    "SYS0",
    REG_SYS0,
    &[FieldDef::new("DR", 0, 4).range(0, 0b1001), FieldDef::new("PGA", 4, 3)],
)
.reserved(0x80);

/// `OFC0..OFC2` byte registers.
pub const OFC0: RegisterDef = RegisterDef::new("OFC0", REG_OFC0, &[FieldDef::new("OFC", 0, 8)]);
/// Middle offset calibration byte.
pub const OFC1: RegisterDef = RegisterDef::new("OFC1", REG_OFC1, &[FieldDef::new("OFC", 0, 8)]);
/// Most significant offset calibration byte.
pub const OFC2: RegisterDef = RegisterDef::new("OFC2", REG_OFC2, &[FieldDef::new("OFC", 0, 8)]);
/// `FSC0..FSC2` byte registers.
pub const FSC0: RegisterDef = RegisterDef::new("FSC0", REG_FSC0, &[FieldDef::new("FSC", 0, 8)]);
/// Middle gain calibration byte.
pub const FSC1: RegisterDef = RegisterDef::new("FSC1", REG_FSC1, &[FieldDef::new("FSC", 0, 8)]);
/// Most significant gain calibration byte.
pub const FSC2: RegisterDef = RegisterDef::new("FSC2", REG_FSC2, &[FieldDef::new("FSC", 0, 8)]);

/// `IDAC0`: revision ID, DRDY mode and excitation current magnitude.
pub const IDAC0: RegisterDef = RegisterDef::new(
    "IDAC0",
    REG_IDAC0,
    &[
        FieldDef::new("IMAG", 0, 3),
        FieldDef::new("DRDY_MODE", 3, 1),
        FieldDef::new("ID", 4, 4).read_only(),
    ],
);

/// `IDAC1`: excitation current output routing.
pub const IDAC1: RegisterDef = RegisterDef::new(
    "IDAC1",
    REG_IDAC1,
    &[FieldDef::new("I2DIR", 0, 4), FieldDef::new("I1DIR", 4, 4)],
);

/// `GPIOCFG`: GPIO enable. The upper nibble must be written as zero.
pub const GPIOCFG: RegisterDef =
    RegisterDef::new("GPIOCFG", REG_GPIOCFG, &[FieldDef::new("IOCFG", 0, 4)]).reserved(0xF0);

/// `GPIODIR`: GPIO direction.
pub const GPIODIR: RegisterDef = RegisterDef::new("GPIODIR", REG_GPIODIR, &[FieldDef::new("IODIR", 0, 8)]);

/// `GPIODAT`: GPIO data.
pub const GPIODAT: RegisterDef = RegisterDef::new("GPIODAT", REG_GPIODAT, &[FieldDef::new("IODAT", 0, 8)]);

/// Complete register map, ordered by address.
///
/// Every ADS1248 register is locked while a conversion is active: writes restart the
/// digital filter, and the device ignores register commands in read-data-continuous mode.
pub const REGISTERS: &[RegisterDef] = &[
    MUX0, VBIAS, MUX1, SYS0, OFC0, OFC1, OFC2, FSC0, FSC1, FSC2, IDAC0, IDAC1, GPIOCFG, GPIODIR,
    GPIODAT,
];

/// Bitfield representation of the `MUX0` register (address `0x00`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mux0 {
    // Negative input channel (bits 2:0).
    pub mux_sn: B3,
    // Positive input channel (bits 5:3).
    pub mux_sp: B3,
    // Burnout current source (bits 7:6).
    pub bcs: BurnoutCurrent,
}

/// Bitfield representation of the `MUX1` register (address `0x02`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mux1 {
    // System monitor selection (bits 2:0).
    pub muxcal: SystemMonitor,
    // Reference input selection (bits 4:3).
    pub refselt: ReferenceSelect,
    // Internal reference control (bits 6:5), see `VrefControl::from_bits`.
    pub vrefcon: B2,
    // External clock in use (bit 7).
    pub clkstat: bool,
}

/// Bitfield representation of the `SYS0` register (address `0x03`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sys0 {
    // Data rate code (bits 3:0), see `DataRate::from_bits`.
    pub dr: B4,
    // PGA gain (bits 6:4).
    pub pga: PgaGain,
    #[skip]
    __: B1,
}

/// Bitfield representation of the `IDAC0` register (address `0x0A`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Idac0 {
    // Excitation current magnitude (bits 2:0).
    pub imag: IdacMagnitude,
    // DOUT/DRDY pin mode (bit 3).
    pub drdy_mode: bool,
    // Silicon revision (bits 7:4).
    pub id: B4,
}

/// Bitfield representation of the `IDAC1` register (address `0x0B`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Idac1 {
    // IDAC2 output pin (bits 3:0).
    pub i2dir: B4,
    // IDAC1 output pin (bits 7:4).
    pub i1dir: B4,
}

byte_register!(Mux0, MUX0);
byte_register!(Mux1, MUX1);
byte_register!(Sys0, SYS0);
byte_register!(Idac0, IDAC0);
byte_register!(Idac1, IDAC1);
