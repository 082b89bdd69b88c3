//! Strongly typed parameter enumerations for the ADS1248 and RM3100 drivers.
//!
//! These enums map directly to datasheet field encodings and are used by the typed register
//! views in [`registers`](crate::registers) and by the high-level driver setters. Prefer
//! these types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use ads1248_rm3100::params::{DataRate, PgaGain, UpdateRate};
//!
//! let gain = PgaGain::X16;
//! let rate = DataRate::Sps20;
//! let cmm = UpdateRate::Hz37;
//! assert_eq!(gain.factor(), 16);
//! assert_eq!(rate as u8, 0b0010);
//! assert_eq!(cmm as u8, 0x96);
//! ```

use modular_bitfield::prelude::Specifier;

/// Sensor burnout current source (`MUX0.BCS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum BurnoutCurrent {
    /// Burnout current source off.
    Off = 0b00,
    /// 0.5 µA.
    Ua0_5 = 0b01,
    /// 2 µA.
    Ua2 = 0b10,
    /// 10 µA.
    Ua10 = 0b11,
}

/// Internal reference control (`MUX1.VREFCON`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum VrefControl {
    /// Internal reference always off.
    Off = 0b00,
    /// Internal reference always on.
    On = 0b01,
    /// Internal reference on only while converting.
    Conversion = 0b10,
}

impl VrefControl {
    /// Decodes the two-bit field; `0b11` aliases [`VrefControl::Conversion`].
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Self::Off),
            0b01 => Some(Self::On),
            0b10 | 0b11 => Some(Self::Conversion),
            _ => None,
        }
    }
}

/// Reference input selection (`MUX1.REFSELT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum ReferenceSelect {
    /// REFP0/REFN0 pair.
    Ref0 = 0b00,
    /// REFP1/REFN1 pair.
    Ref1 = 0b01,
    /// Internal reference.
    Internal = 0b10,
    /// Internal reference, also driven onto REFP0/REFN0.
    InternalOnRef0 = 0b11,
}

/// System monitor selection (`MUX1.MUXCAL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum SystemMonitor {
    /// Normal operation.
    Normal = 0b000,
    /// Offset calibration: inputs shorted to mid-supply.
    Offset = 0b001,
    /// Gain calibration: inputs connected to the reference.
    Gain = 0b010,
    /// Temperature diode.
    Temperature = 0b011,
    /// REF1 monitor.
    Ref1 = 0b100,
    /// REF0 monitor.
    Ref0 = 0b101,
    /// Analog supply monitor.
    Avdd = 0b110,
    /// Digital supply monitor.
    Dvdd = 0b111,
}

/// Programmable gain amplifier setting (`SYS0.PGA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum PgaGain {
    /// Gain 1.
    X1 = 0b000,
    /// Gain 2.
    X2 = 0b001,
    /// Gain 4.
    X4 = 0b010,
    /// Gain 8.
    X8 = 0b011,
    /// Gain 16.
    X16 = 0b100,
    /// Gain 32.
    X32 = 0b101,
    /// Gain 64.
    X64 = 0b110,
    /// Gain 128.
    X128 = 0b111,
}

impl PgaGain {
    /// Returns the amplification factor.
    pub const fn factor(self) -> u16 {
        1 << (self as u16)
    }
}

/// Output data rate (`SYS0.DR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    /// 5 samples per second.
    Sps5 = 0b0000,
    /// 10 samples per second.
    Sps10 = 0b0001,
    /// 20 samples per second.
    Sps20 = 0b0010,
    /// 40 samples per second.
    Sps40 = 0b0011,
    /// 80 samples per second.
    Sps80 = 0b0100,
    /// 160 samples per second.
    Sps160 = 0b0101,
    /// 320 samples per second.
    Sps320 = 0b0110,
    /// 640 samples per second.
    Sps640 = 0b0111,
    /// 1000 samples per second.
    Sps1000 = 0b1000,
    /// 2000 samples per second.
    Sps2000 = 0b1001,
}

impl DataRate {
    /// Returns the nominal rate in samples per second.
    pub const fn sps(self) -> u16 {
        match self {
            Self::Sps5 => 5,
            Self::Sps10 => 10,
            Self::Sps20 => 20,
            Self::Sps40 => 40,
            Self::Sps80 => 80,
            Self::Sps160 => 160,
            Self::Sps320 => 320,
            Self::Sps640 => 640,
            Self::Sps1000 => 1_000,
            Self::Sps2000 => 2_000,
        }
    }

    /// Decodes the four-bit field. Codes above `0b1001` also select 2000 SPS.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0b0000 => Self::Sps5,
            0b0001 => Self::Sps10,
            0b0010 => Self::Sps20,
            0b0011 => Self::Sps40,
            0b0100 => Self::Sps80,
            0b0101 => Self::Sps160,
            0b0110 => Self::Sps320,
            0b0111 => Self::Sps640,
            0b1000 => Self::Sps1000,
            0b1001..=0b1111 => Self::Sps2000,
            _ => return None,
        })
    }
}

/// Excitation current magnitude (`IDAC0.IMAG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum IdacMagnitude {
    /// Current sources off.
    Off = 0b000,
    /// 50 µA.
    Ua50 = 0b001,
    /// 100 µA.
    Ua100 = 0b010,
    /// 250 µA.
    Ua250 = 0b011,
    /// 500 µA.
    Ua500 = 0b100,
    /// 750 µA.
    Ua750 = 0b101,
    /// 1000 µA.
    Ua1000 = 0b110,
    /// 1500 µA.
    Ua1500 = 0b111,
}

/// DOUT/DRDY pin behaviour (`IDAC0.DRDY_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DrdyMode {
    /// DOUT only carries data.
    DataOut = 0,
    /// DOUT also signals data ready.
    DataOutReady = 1,
}

/// RM3100 continuous-mode update rate (`TMRC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UpdateRate {
    /// ~600 Hz.
    Hz600 = 0x92,
    /// ~300 Hz.
    Hz300 = 0x93,
    /// ~150 Hz.
    Hz150 = 0x94,
    /// ~75 Hz.
    Hz75 = 0x95,
    /// ~37 Hz.
    Hz37 = 0x96,
    /// ~18 Hz.
    Hz18 = 0x97,
    /// ~9 Hz.
    Hz9 = 0x98,
    /// ~4.5 Hz.
    Hz4_5 = 0x99,
    /// ~2.3 Hz.
    Hz2_3 = 0x9A,
    /// ~1.2 Hz.
    Hz1_2 = 0x9B,
    /// ~0.6 Hz.
    Hz0_6 = 0x9C,
    /// ~0.3 Hz.
    Hz0_3 = 0x9D,
    /// ~0.15 Hz.
    Hz0_15 = 0x9E,
    /// ~0.075 Hz.
    Hz0_075 = 0x9F,
}

impl UpdateRate {
    /// Returns the nominal update interval in microseconds.
    pub const fn interval_us(self) -> u32 {
        // Each step halves the rate, starting at ~1.7 ms.
        1_700 << (self as u32 - 0x92)
    }
}
