#![cfg_attr(not(test), no_std)]
//! Register-transaction drivers for the TI ADS1248 24-bit ADC and the PNI RM3100 magnetometer.
//!
//! Both drivers build byte-exact transactions from static register maps, track the device's
//! conversion mode, and refuse any request that would be invalid before a byte reaches the bus.

mod error;
mod log;

pub mod codec;
pub mod config;
pub mod device;
pub mod interface;
pub mod lines;
pub mod params;
pub mod registers;
pub mod state;
pub mod transaction;
pub mod wait;

pub use crate::config::{MagConfig, MagConfigBuilder};
pub use crate::device::ads1248::Ads1248;
pub use crate::device::rm3100::{MagneticField, Rm3100};
pub use crate::device::RegisterAddressableDevice;
pub use crate::error::{Error, LineError, ProtocolError, Result};
pub use crate::lines::{ControlLines, Line, NoLine, Polarity};
pub use crate::state::DeviceMode;
