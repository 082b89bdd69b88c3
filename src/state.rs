//! Conversion-mode state machine.
//!
//! ```text
//! Idle --start_single--> ConversionPending --read_result--> Idle
//! Idle --start_continuous--> Continuous --stop--> Idle
//! ConversionPending --stop--> Idle
//! ```

use crate::error::ProtocolError;
use crate::log::{debug, warning};
use crate::registers::RegisterDef;

/// Conversion mode of one physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// No conversion in progress.
    #[default]
    Idle,
    /// A single conversion was started and its result has not been read.
    ConversionPending,
    /// Conversions repeat until explicitly stopped.
    Continuous,
}

/// Mode tracking for one device. Owned by exactly one driver; intentionally not `Clone`.
#[derive(Debug, Default)]
pub struct DeviceState {
    mode: DeviceMode,
}

impl DeviceState {
    /// Starts in [`DeviceMode::Idle`].
    pub const fn new() -> Self {
        Self { mode: DeviceMode::Idle }
    }

    /// Current mode.
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    fn transition(&mut self, to: DeviceMode) {
        debug!("mode {} -> {}", self.mode, to);
        self.mode = to;
    }

    fn reject(&self) -> ProtocolError {
        warning!("operation not permitted in {}", self.mode);
        ProtocolError::IllegalState
    }

    /// Checks that a single conversion may start.
    pub fn can_start(&self) -> Result<(), ProtocolError> {
        match self.mode {
            DeviceMode::Idle => Ok(()),
            _ => Err(self.reject()),
        }
    }

    /// `Idle -> ConversionPending`.
    pub fn start_single(&mut self) -> Result<(), ProtocolError> {
        self.can_start()?;
        self.transition(DeviceMode::ConversionPending);
        Ok(())
    }

    /// `Idle -> Continuous`.
    pub fn start_continuous(&mut self) -> Result<(), ProtocolError> {
        self.can_start()?;
        self.transition(DeviceMode::Continuous);
        Ok(())
    }

    /// Checks that a result may be read, returning the mode it will be read in.
    pub fn can_read(&self) -> Result<DeviceMode, ProtocolError> {
        match self.mode {
            DeviceMode::Idle => Err(self.reject()),
            mode => Ok(mode),
        }
    }

    /// Records a completed result read: `ConversionPending -> Idle`, `Continuous` unchanged.
    pub fn read_result(&mut self) -> Result<(), ProtocolError> {
        if self.can_read()? == DeviceMode::ConversionPending {
            self.transition(DeviceMode::Idle);
        }
        Ok(())
    }

    /// Checks that the device is converting and may be stopped.
    pub fn can_stop(&self) -> Result<(), ProtocolError> {
        match self.mode {
            DeviceMode::Idle => Err(self.reject()),
            _ => Ok(()),
        }
    }

    /// Any non-idle mode `-> Idle`.
    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        self.can_stop()?;
        self.transition(DeviceMode::Idle);
        Ok(())
    }

    /// Forces `Idle`, e.g. after a device reset.
    pub fn force_idle(&mut self) {
        if self.mode != DeviceMode::Idle {
            self.transition(DeviceMode::Idle);
        }
    }

    /// Checks that every register in `registers` may be accessed in the current mode.
    pub fn check_access<'a, I>(&self, registers: I) -> Result<(), ProtocolError>
    where
        I: IntoIterator<Item = &'a RegisterDef>,
    {
        if self.mode == DeviceMode::Idle {
            return Ok(());
        }
        for register in registers {
            if !register.converting_access {
                warning!("register {} locked in {}", register.name, self.mode);
                return Err(ProtocolError::IllegalState);
            }
        }
        Ok(())
    }
}
