//! High-level RM3100 magnetometer driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use super::{check_span, execute, RegisterAddressableDevice};
use crate::codec::{self, WORD_BITS, WORD_BYTES};
use crate::config::MagConfig;
use crate::error::{Error, ProtocolError, Result};
use crate::interface::spi::SpiInterface;
use crate::interface::BusInterface;
use crate::log::{debug, trace, warning};
use crate::params::UpdateRate;
use crate::registers::rm3100::{
    self as regs, Cmm, Poll, Status, CCX, EXPECTED_REVID, REG_CCX, REG_CMM, REG_MX, REG_POLL,
    REG_REVID, REG_STATUS, REG_TMRC, TMRC,
};
use crate::state::{DeviceMode, DeviceState};
use crate::transaction::{Rm3100Protocol, TransactionBuilder};
use crate::wait::{poll_until, Cancellation, NeverCancel};

type Builder = TransactionBuilder<Rm3100Protocol>;

// X, Y and Z cycle-count registers, two bytes each.
const CYCLE_COUNT_BYTES: usize = 6;

/// One magnetometer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagneticField {
    /// Output X axis in microtesla.
    pub x: f32,
    /// Output Y axis in microtesla.
    pub y: f32,
    /// Output Z axis in microtesla.
    pub z: f32,
    /// Raw counts in the device frame (X, Y, Z), before remapping.
    pub raw: [i32; 3],
    /// High bit of the status byte shifted out ahead of the data.
    pub ready: bool,
}

/// Measurement-control writes accepted by [`Rm3100::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Single measurement on all three axes (`POLL = 0x70`).
    SingleMeasurement,
    /// Continuous measurement on all three axes (`CMM = 0x71`).
    StartContinuous,
    /// Halt continuous measurement (`CMM = 0x00`).
    StopContinuous,
}

impl Command {
    /// Register and value written for this command.
    pub fn register_write(self) -> (u8, u8) {
        match self {
            Self::SingleMeasurement => (
                REG_POLL,
                Poll::new().with_pmx(true).with_pmy(true).with_pmz(true).into(),
            ),
            Self::StartContinuous => (
                REG_CMM,
                Cmm::new()
                    .with_start(true)
                    .with_cmx(true)
                    .with_cmy(true)
                    .with_cmz(true)
                    .into(),
            ),
            Self::StopContinuous => (REG_CMM, Cmm::new().into()),
        }
    }
}

/// High-level synchronous driver for the RM3100.
pub struct Rm3100<IFACE> {
    interface: IFACE,
    config: MagConfig,
    state: DeviceState,
}

impl<IFACE> Rm3100<IFACE> {
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: MagConfig) -> Self {
        Self {
            interface,
            config,
            state: DeviceState::new(),
        }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, MagConfig) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MagConfig {
        &self.config
    }

    /// Current conversion mode.
    pub fn mode(&self) -> DeviceMode {
        self.state.mode()
    }
}

impl<SPI> Rm3100<SpiInterface<SPI>>
where
    SPI: SpiDevice,
{
    /// Convenience constructor for SPI transports.
    pub fn new_spi(spi: SPI, config: MagConfig) -> Self {
        Self::new(SpiInterface::new(spi), config)
    }

    /// Releases the driver, returning the SPI device and configuration.
    pub fn release_spi(self) -> (SPI, MagConfig) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> Rm3100<IFACE>
where
    IFACE: BusInterface<Error = CommE>,
{
    // ==================================================================
    // == Initialization ================================================
    // ==================================================================
    /// Validates the configuration and programs its cycle counts.
    pub fn init(&mut self) -> Result<(), CommE> {
        self.configure(self.config)
    }

    /// Applies a new configuration.
    pub fn configure(&mut self, config: MagConfig) -> Result<(), CommE> {
        config
            .validate()
            .map_err(|_| Error::Protocol(ProtocolError::InvalidField))?;

        let [x, y, z] = config.cycle_counts;
        self.set_cycle_counts(x, y, z)?;
        self.config = config;
        Ok(())
    }

    // ==================================================================
    // == Register Access ===============================================
    // ==================================================================
    /// Reads consecutive registers; addresses auto-increment.
    pub fn read_registers(&mut self, address: u8, buf: &mut [u8]) -> Result<(), CommE> {
        let request = Builder::read(address, buf.len())?;
        check_span(regs::REGISTERS, &self.state, address, buf.len(), false)?;

        let reply = execute(&mut self.interface, &request)?;
        buf.copy_from_slice(reply.response());
        Ok(())
    }

    /// Writes consecutive registers; addresses auto-increment.
    pub fn write_registers(&mut self, address: u8, data: &[u8]) -> Result<(), CommE> {
        let request = Builder::write(address, data.len(), data)?;
        check_span(regs::REGISTERS, &self.state, address, data.len(), true)?;

        execute(&mut self.interface, &request)?;
        Ok(())
    }

    /// Issues a measurement-control write and tracks the resulting mode.
    pub fn command(&mut self, command: Command) -> Result<(), CommE> {
        match command {
            Command::SingleMeasurement | Command::StartContinuous => self.state.can_start()?,
            Command::StopContinuous => self.state.can_stop()?,
        }

        debug!("command {}", command);
        let (address, value) = command.register_write();
        self.write_register(address, value)?;

        match command {
            Command::SingleMeasurement => self.state.start_single()?,
            Command::StartContinuous => self.state.start_continuous()?,
            Command::StopContinuous => self.state.stop()?,
        }
        Ok(())
    }

    // ==================================================================
    // == Configuration =================================================
    // ==================================================================
    /// Programs all three cycle counts with one transaction. Only legal while idle.
    pub fn set_cycle_counts(&mut self, x: u16, y: u16, z: u16) -> Result<(), CommE> {
        let counts = [x, y, z];
        let mut data = [0u8; CYCLE_COUNT_BYTES];
        for (bytes, count) in data.chunks_exact_mut(2).zip(counts) {
            CCX.check_updates(&[("CC", count.into())])?;
            bytes.copy_from_slice(&count.to_be_bytes());
        }

        self.write_registers(REG_CCX, &data)?;
        self.config.cycle_counts = counts;
        Ok(())
    }

    /// Reads back the X, Y and Z cycle counts.
    pub fn cycle_counts(&mut self) -> Result<[u16; 3], CommE> {
        let mut data = [0u8; CYCLE_COUNT_BYTES];
        self.read_registers(REG_CCX, &mut data)?;

        let mut counts = [0u16; 3];
        for (count, bytes) in counts.iter_mut().zip(data.chunks_exact(2)) {
            *count = u16::from_be_bytes([bytes[0], bytes[1]]);
        }
        Ok(counts)
    }

    /// Sets the continuous-mode update rate.
    pub fn set_update_rate(&mut self, rate: UpdateRate) -> Result<(), CommE> {
        self.set_tmrc(rate as u8)
    }

    /// Writes a raw `TMRC` value, `0x92..=0x9F`.
    pub fn set_tmrc(&mut self, value: u8) -> Result<(), CommE> {
        TMRC.check_updates(&[("TMRC", value.into())])?;
        self.write_register(REG_TMRC, value)
    }

    // ==================================================================
    // == Identification & Status =======================================
    // ==================================================================
    /// Reads the silicon revision.
    pub fn revision_id(&mut self) -> Result<u8, CommE> {
        self.read_register(REG_REVID)
    }

    /// Returns `true` when the revision register holds the expected value.
    pub fn revision_matches(&mut self) -> Result<bool, CommE> {
        let revision = self.revision_id()?;
        if revision != EXPECTED_REVID {
            warning!("unexpected revision {=u8:#x}", revision);
        }
        Ok(revision == EXPECTED_REVID)
    }

    /// Reads the `STATUS` register.
    pub fn read_status(&mut self) -> Result<Status, CommE> {
        self.read_register(REG_STATUS).map(Status::from)
    }

    /// Returns `true` once a measurement is available.
    pub fn data_ready(&mut self) -> Result<bool, CommE> {
        Ok(self.read_status()?.drdy())
    }

    /// Polls `STATUS` until data is ready, bounded by `timeout_us` and abandoned once `cancel`
    /// fires.
    pub fn wait_data_ready<D, C>(&mut self, delay: &mut D, timeout_us: u32, cancel: &C) -> Result<(), CommE>
    where
        D: DelayNs + ?Sized,
        C: Cancellation + ?Sized,
    {
        poll_until(delay, timeout_us, cancel, || self.data_ready())
    }

    // ==================================================================
    // == Measurement ===================================================
    // ==================================================================
    /// Starts a single measurement.
    pub fn start_single(&mut self) -> Result<(), CommE> {
        self.command(Command::SingleMeasurement)
    }

    /// Starts continuous measurement on all axes.
    pub fn start_continuous(&mut self) -> Result<(), CommE> {
        self.command(Command::StartContinuous)
    }

    /// Halts any measurement in progress.
    pub fn stop(&mut self) -> Result<(), CommE> {
        self.command(Command::StopContinuous)
    }

    /// Reads the latest measurement.
    ///
    /// Legal while idle (latched result) or in continuous mode. A pending single measurement
    /// must be collected with [`Self::measure_single`] or abandoned with [`Self::stop`].
    pub fn measure(&mut self) -> Result<MagneticField, CommE> {
        if self.state.mode() == DeviceMode::ConversionPending {
            return Err(Error::Protocol(ProtocolError::IllegalState));
        }
        self.read_field()
    }

    /// Starts a single measurement, waits for it and reads it back.
    pub fn measure_single<D>(&mut self, delay: &mut D, timeout_us: u32) -> Result<MagneticField, CommE>
    where
        D: DelayNs + ?Sized,
    {
        self.measure_single_with_cancel(delay, timeout_us, &NeverCancel)
    }

    /// As [`Self::measure_single`], abandoning the wait with [`Error::Cancelled`] once `cancel`
    /// fires. The measurement stays pending after a timeout or cancellation.
    pub fn measure_single_with_cancel<D, C>(
        &mut self,
        delay: &mut D,
        timeout_us: u32,
        cancel: &C,
    ) -> Result<MagneticField, CommE>
    where
        D: DelayNs + ?Sized,
        C: Cancellation + ?Sized,
    {
        self.start_single()?;
        self.wait_data_ready(delay, timeout_us, cancel)?;

        let field = self.read_field()?;
        self.state.read_result()?;
        Ok(field)
    }

    fn read_field(&mut self) -> Result<MagneticField, CommE> {
        let request = Builder::streaming_poll();
        check_span(regs::REGISTERS, &self.state, REG_MX, request.response_len(), false)?;
        let reply = execute(&mut self.interface, &request)?;

        let mut raw = [0i32; 3];
        for (value, bytes) in raw.iter_mut().zip(reply.response().chunks_exact(WORD_BYTES)) {
            *value = codec::decode_signed(bytes, WORD_BITS)?;
        }
        let ready = reply
            .echo()
            .first()
            .is_some_and(|&status| Status::from(status).drdy());

        let [x, y, z] = self.config.remap(raw);
        let scale = self.config.counts_per_ut;
        trace!("raw field {} {} {}", raw[0], raw[1], raw[2]);

        Ok(MagneticField {
            x: x as f32 / scale,
            y: y as f32 / scale,
            z: z as f32 / scale,
            raw,
            ready,
        })
    }
}

impl<IFACE> RegisterAddressableDevice for Rm3100<IFACE>
where
    IFACE: BusInterface,
{
    type Error = IFACE::Error;
    type Command = Command;

    fn read_registers(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        Self::read_registers(self, address, buf)
    }

    fn write_registers(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        Self::write_registers(self, address, data)
    }

    fn command(&mut self, command: Command) -> Result<(), Self::Error> {
        Self::command(self, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicBool;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn frame(mosi: &[u8], miso: &[u8]) -> [SpiTransaction<u8>; 3] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(mosi.to_vec(), miso.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn spi(frames: &[[SpiTransaction<u8>; 3]]) -> SpiMock<u8> {
        SpiMock::new(frames.iter().flatten())
    }

    const POLL_FRAME: [u8; 10] = [0xA4, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    #[test]
    fn cycle_counts_then_measure_applies_board_mapping() {
        let mut bus = spi(&[
            frame(&[0x04, 0, 200, 0, 200, 0, 200], &[0; 7]),
            frame(&POLL_FRAME, &[0x00, 0, 0, 1, 0, 0, 2, 0, 0, 3]),
        ]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        mag.set_cycle_counts(200, 200, 200).unwrap();
        let field = mag.measure().unwrap();

        assert_eq!(field.x, 2.0 / 75.0);
        assert_eq!(field.y, 1.0 / 75.0);
        assert_eq!(field.z, -3.0 / 75.0);
        assert_eq!(field.raw, [1, 2, 3]);
        assert!(!field.ready);
        bus.done();
    }

    #[test]
    fn continuous_mode_locks_only_cycle_counts() {
        let mut bus = spi(&[
            frame(&[0x01, 0x71], &[0x00, 0x00]),
            frame(&[0x0B, 0x96], &[0x00, 0x00]),
            frame(&POLL_FRAME, &[0x80, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0x80, 0, 0]),
            frame(&[0x01, 0x00], &[0x00, 0x00]),
        ]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        mag.start_continuous().unwrap();
        assert_eq!(
            mag.set_cycle_counts(100, 100, 100),
            Err(Error::Protocol(ProtocolError::IllegalState))
        );
        mag.set_update_rate(UpdateRate::Hz37).unwrap();

        let field = mag.measure().unwrap();
        assert!(field.ready);
        assert_eq!(field.raw, [-1, 0, -0x80_0000]);
        assert_eq!(mag.mode(), DeviceMode::Continuous);

        mag.stop().unwrap();
        assert_eq!(mag.mode(), DeviceMode::Idle);
        bus.done();
    }

    #[test]
    fn single_measurement_polls_status_until_ready() {
        let mut bus = spi(&[
            frame(&[0x00, 0x70], &[0x00, 0x00]),
            frame(&[0xB4, 0x00], &[0x00, 0x00]),
            frame(&[0xB4, 0x00], &[0x00, 0x80]),
            frame(&POLL_FRAME, &[0x80, 0, 0, 75, 0, 0, 150, 0, 0, 0]),
        ]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        let field = mag.measure_single(&mut NoopDelay::new(), 10_000).unwrap();
        assert_eq!(field.x, 2.0);
        assert_eq!(field.y, 1.0);
        assert_eq!(field.z, 0.0);
        assert_eq!(mag.mode(), DeviceMode::Idle);
        bus.done();
    }

    #[test]
    fn status_wait_times_out_and_leaves_the_measurement_pending() {
        let mut bus = spi(&[
            frame(&[0x00, 0x70], &[0x00, 0x00]),
            frame(&[0xB4, 0x00], &[0x00, 0x00]),
            frame(&[0xB4, 0x00], &[0x00, 0x00]),
            frame(&[0xB4, 0x00], &[0x00, 0x00]),
        ]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        assert_eq!(mag.measure_single(&mut NoopDelay::new(), 200), Err(Error::Timeout));
        assert_eq!(mag.mode(), DeviceMode::ConversionPending);
        assert_eq!(mag.measure(), Err(Error::Protocol(ProtocolError::IllegalState)));
        bus.done();
    }

    #[test]
    fn cancelled_wait_is_reported_distinctly() {
        let mut bus = spi(&[frame(&[0x00, 0x70], &[0x00, 0x00])]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());
        let cancel = AtomicBool::new(true);

        assert_eq!(
            mag.measure_single_with_cancel(&mut NoopDelay::new(), 10_000, &cancel),
            Err(Error::Cancelled)
        );
        bus.done();
    }

    #[test]
    fn out_of_range_settings_never_reach_the_bus() {
        let mut bus = spi(&[]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        assert_eq!(
            mag.set_cycle_counts(200, 401, 200),
            Err(Error::Protocol(ProtocolError::InvalidField))
        );
        assert_eq!(mag.set_tmrc(0x91), Err(Error::Protocol(ProtocolError::InvalidField)));
        assert_eq!(
            mag.write_registers(REG_MX, &[0, 0, 0]),
            Err(Error::Protocol(ProtocolError::InvalidField))
        );
        assert_eq!(mag.stop(), Err(Error::Protocol(ProtocolError::IllegalState)));

        let config = MagConfig::new().counts_per_ut(-1.0).build();
        assert_eq!(mag.configure(config), Err(Error::Protocol(ProtocolError::InvalidField)));
        bus.done();
    }

    fn read_revision<D: RegisterAddressableDevice>(device: &mut D) -> Result<u8, D::Error> {
        device.read_register(REG_REVID)
    }

    #[test]
    fn registers_are_reachable_through_the_shared_capability() {
        let mut bus = spi(&[
            frame(&[0xB6, 0x00], &[0x00, 0x22]),
            frame(&[0xB6, 0x00], &[0x00, 0x22]),
            frame(&[0x84, 0, 0, 0, 0, 0, 0], &[0, 0, 200, 0, 150, 1, 0x90]),
        ]);
        let mut mag = Rm3100::new_spi(bus.clone(), MagConfig::default());

        assert_eq!(read_revision(&mut mag), Ok(0x22));
        assert_eq!(mag.revision_matches(), Ok(true));
        assert_eq!(mag.cycle_counts(), Ok([200, 150, 400]));
        bus.done();
    }
}
