//! High-level ADS1248 24-bit ADC driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::{check_span, execute, RegisterAddressableDevice};
use crate::codec::{self, decode_i24, encode_i24, WORD_BITS, WORD_BYTES};
use crate::error::{Error, LineError, ProtocolError, Result};
use crate::interface::spi::SpiInterface;
use crate::interface::BusInterface;
use crate::lines::{ControlLines, Line, NoLine};
use crate::log::{debug, trace};
use crate::params::{
    BurnoutCurrent,
    DataRate,
    DrdyMode,
    IdacMagnitude,
    PgaGain,
    ReferenceSelect,
    SystemMonitor,
    VrefControl,
};
use crate::registers::ads1248::{self as regs, cmd, Idac0, Mux1, Sys0};
use crate::registers::Register;
use crate::state::{DeviceMode, DeviceState};
use crate::transaction::{Ads1248Protocol, TransactionBuilder};
use crate::wait::{Cancellation, NeverCancel};

type Builder = TransactionBuilder<Ads1248Protocol>;

// START must stay high for at least 3 tOSC; 1 ms is comfortably above that.
const START_PULSE_US: u32 = 1_000;
// RESET low time.
const RESET_PULSE_US: u32 = 1_000;
// Datasheet wait after reset before the first SPI command is 0.6 ms.
const RESET_SETTLE_US: u32 = 1_000;
/// FSC code corresponding to a gain correction of exactly 1.0.
pub const GAIN_SCALE: i32 = 0x40_0000;

/// Bare commands accepted by [`Ads1248::command`].
///
/// Data and register commands (`RDATA`, `RDATAC`, `RREG`, `WREG`) have dedicated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Exit power-down mode.
    Wakeup,
    /// Enter power-down mode.
    Sleep,
    /// Restart the conversion in progress.
    Sync,
    /// Software reset.
    Reset,
    /// No operation.
    Nop,
    /// Leave read-data-continuous mode.
    StopReadContinuous,
    /// System offset calibration.
    SystemOffsetCal,
    /// System gain calibration.
    SystemGainCal,
    /// Self offset calibration.
    SelfOffsetCal,
}

impl Command {
    /// Bytes shifted out for this command.
    pub const fn opcode(self) -> &'static [u8] {
        match self {
            Self::Wakeup => &[cmd::WAKEUP],
            Self::Sleep => &[cmd::SLEEP],
            Self::Sync => &cmd::SYNC,
            Self::Reset => &[cmd::RESET],
            Self::Nop => &[cmd::NOP],
            Self::StopReadContinuous => &[cmd::SDATAC],
            Self::SystemOffsetCal => &[cmd::SYSOCAL],
            Self::SystemGainCal => &[cmd::SYSGCAL],
            Self::SelfOffsetCal => &[cmd::SELFOCAL],
        }
    }

    // Calibrations run a conversion of their own.
    const fn needs_idle(self) -> bool {
        matches!(self, Self::SystemOffsetCal | Self::SystemGainCal | Self::SelfOffsetCal)
    }
}

/// High-level synchronous driver for the ADS1248.
pub struct Ads1248<IFACE, START = NoLine, RESET = NoLine, READY = NoLine> {
    interface: IFACE,
    lines: ControlLines<START, RESET, READY>,
    state: DeviceState,
}

impl<IFACE, START, RESET, READY> Ads1248<IFACE, START, RESET, READY> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver from a bus interface and the wired control lines.
    pub fn new(interface: IFACE, lines: ControlLines<START, RESET, READY>) -> Self {
        Self {
            interface,
            lines,
            state: DeviceState::new(),
        }
    }

    /// Consumes the driver and returns the interface and control lines.
    pub fn release(self) -> (IFACE, ControlLines<START, RESET, READY>) {
        (self.interface, self.lines)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Current conversion mode.
    pub fn mode(&self) -> DeviceMode {
        self.state.mode()
    }
}

impl<SPI, START, RESET, READY> Ads1248<SpiInterface<SPI>, START, RESET, READY>
where
    SPI: SpiDevice,
{
    /// Convenience constructor for SPI transports.
    pub fn new_spi(spi: SPI, lines: ControlLines<START, RESET, READY>) -> Self {
        Self::new(SpiInterface::new(spi), lines)
    }

    /// Releases the driver, returning the SPI device and control lines.
    pub fn release_spi(self) -> (SPI, ControlLines<START, RESET, READY>) {
        let (iface, lines) = self.release();
        (iface.release(), lines)
    }
}

impl<IFACE, START, RESET, READY, CommE> Ads1248<IFACE, START, RESET, READY>
where
    IFACE: BusInterface<Error = CommE>,
    START: OutputPin,
    RESET: OutputPin,
    READY: InputPin,
{
    // ==================================================================
    // == Register Access ===============================================
    // ==================================================================
    /// Reads consecutive registers with one `RREG` transaction.
    pub fn read_registers(&mut self, address: u8, buf: &mut [u8]) -> Result<(), CommE> {
        let request = Builder::read(address, buf.len())?;
        check_span(regs::REGISTERS, &self.state, address, buf.len(), false)?;

        let reply = execute(&mut self.interface, &request)?;
        buf.copy_from_slice(reply.response());
        Ok(())
    }

    /// Writes consecutive registers with one `WREG` transaction.
    pub fn write_registers(&mut self, address: u8, data: &[u8]) -> Result<(), CommE> {
        let request = Builder::write(address, data.len(), data)?;
        check_span(regs::REGISTERS, &self.state, address, data.len(), true)?;

        execute(&mut self.interface, &request)?;
        Ok(())
    }

    /// Issues a bare command.
    ///
    /// Calibration commands require [`DeviceMode::Idle`]. `Reset` returns the driver to it and
    /// deasserts START.
    pub fn command(&mut self, command: Command) -> Result<(), CommE> {
        if command.needs_idle() {
            self.state.can_start()?;
        }
        debug!("command {}", command);
        self.send(command.opcode())?;

        if command == Command::Reset {
            self.release_start()?;
            self.state.force_idle();
        }
        Ok(())
    }

    fn release_start(&mut self) -> Result<(), CommE> {
        if self.lines.has(Line::Start) {
            self.lines.set_level(Line::Start, false)?;
        }
        Ok(())
    }

    fn send(&mut self, opcode: &[u8]) -> Result<(), CommE> {
        let request = Builder::command(opcode)?;
        execute(&mut self.interface, &request)?;
        Ok(())
    }

    /// Reads a register through its typed bitfield view.
    pub fn read_view<R>(&mut self) -> Result<R, CommE>
    where
        R: Register + From<u8>,
    {
        self.read_register(R::DEF.address).map(R::from)
    }

    // ==================================================================
    // == Input Multiplexer & Bias ======================================
    // ==================================================================
    /// Selects the positive and negative inputs, each `0..=7`.
    pub fn set_inputs(&mut self, positive: u8, negative: u8) -> Result<(), CommE> {
        self.update_fields(
            &regs::MUX0,
            &[("MUX_SP", positive.into()), ("MUX_SN", negative.into())],
        )
    }

    /// Programs the sensor burnout current source.
    pub fn set_burnout_current(&mut self, current: BurnoutCurrent) -> Result<(), CommE> {
        self.update_fields(&regs::MUX0, &[("BCS", current as u32)])
    }

    /// Writes the bias-voltage enable mask, one bit per analog input.
    pub fn set_vbias(&mut self, mask: u8) -> Result<(), CommE> {
        self.write_register(regs::REG_VBIAS, mask)
    }

    /// Enables the bias voltage on input `pin`.
    pub fn vbias_on(&mut self, pin: u8) -> Result<(), CommE> {
        self.set_vbias_pin(pin, true)
    }

    /// Disables the bias voltage on input `pin`.
    pub fn vbias_off(&mut self, pin: u8) -> Result<(), CommE> {
        self.set_vbias_pin(pin, false)
    }

    fn set_vbias_pin(&mut self, pin: u8, enabled: bool) -> Result<(), CommE> {
        if pin > 7 {
            return Err(Error::Protocol(ProtocolError::InvalidField));
        }

        let current = self.read_register(regs::REG_VBIAS)?;
        let updated = if enabled {
            current | (1 << pin)
        } else {
            current & !(1 << pin)
        };
        if updated != current {
            self.write_register(regs::REG_VBIAS, updated)?;
        }
        Ok(())
    }

    // ==================================================================
    // == Reference & System Monitor ====================================
    // ==================================================================
    /// Controls the internal reference.
    pub fn set_vref_control(&mut self, control: VrefControl) -> Result<(), CommE> {
        self.update_fields(&regs::MUX1, &[("VREFCON", control as u32)])
    }

    /// Selects the reference input.
    pub fn set_reference(&mut self, reference: ReferenceSelect) -> Result<(), CommE> {
        self.update_fields(&regs::MUX1, &[("REFSELT", reference as u32)])
    }

    /// Routes a system monitor to the converter.
    pub fn set_system_monitor(&mut self, monitor: SystemMonitor) -> Result<(), CommE> {
        self.update_fields(&regs::MUX1, &[("MUXCAL", monitor as u32)])
    }

    /// Returns `true` while the external clock is in use.
    pub fn clock_status(&mut self) -> Result<bool, CommE> {
        Ok(self.read_view::<Mux1>()?.clkstat())
    }

    // ==================================================================
    // == Gain & Data Rate ==============================================
    // ==================================================================
    /// Programs the PGA gain.
    pub fn set_pga(&mut self, gain: PgaGain) -> Result<(), CommE> {
        self.update_fields(&regs::SYS0, &[("PGA", gain as u32)])
    }

    /// Reads back the PGA gain.
    pub fn pga(&mut self) -> Result<PgaGain, CommE> {
        Ok(self.read_view::<Sys0>()?.pga())
    }

    /// Programs the output data rate.
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), CommE> {
        self.update_fields(&regs::SYS0, &[("DR", rate as u32)])
    }

    /// Reads back the output data rate.
    pub fn data_rate(&mut self) -> Result<DataRate, CommE> {
        let sys0 = self.read_view::<Sys0>()?;
        DataRate::from_bits(sys0.dr()).ok_or(Error::Protocol(ProtocolError::Range))
    }

    // ==================================================================
    // == Excitation Currents & DRDY ====================================
    // ==================================================================
    /// Selects whether DOUT also signals data ready.
    pub fn set_drdy_mode(&mut self, mode: DrdyMode) -> Result<(), CommE> {
        self.update_fields(&regs::IDAC0, &[("DRDY_MODE", mode as u32)])
    }

    /// Programs the excitation current magnitude.
    pub fn set_idac_magnitude(&mut self, magnitude: IdacMagnitude) -> Result<(), CommE> {
        self.update_fields(&regs::IDAC0, &[("IMAG", magnitude as u32)])
    }

    /// Routes the two excitation current sources, each a 4-bit pin code.
    pub fn set_idac_routing(&mut self, idac1: u8, idac2: u8) -> Result<(), CommE> {
        self.update_fields(
            &regs::IDAC1,
            &[("I1DIR", idac1.into()), ("I2DIR", idac2.into())],
        )
    }

    /// Silicon revision from `IDAC0.ID`.
    pub fn revision_id(&mut self) -> Result<u8, CommE> {
        Ok(self.read_view::<Idac0>()?.id())
    }

    // ==================================================================
    // == GPIO ==========================================================
    // ==================================================================
    /// Enables GPIO function on the shared analog pins (4-bit mask).
    pub fn set_gpio_config(&mut self, mask: u8) -> Result<(), CommE> {
        self.update_fields(&regs::GPIOCFG, &[("IOCFG", mask.into())])
    }

    /// Sets GPIO directions; a set bit makes the pin an input.
    pub fn set_gpio_direction(&mut self, mask: u8) -> Result<(), CommE> {
        self.write_register(regs::REG_GPIODIR, mask)
    }

    /// Drives the GPIO outputs.
    pub fn set_gpio_data(&mut self, data: u8) -> Result<(), CommE> {
        self.write_register(regs::REG_GPIODAT, data)
    }

    /// Samples the GPIO pins.
    pub fn gpio_data(&mut self) -> Result<u8, CommE> {
        self.read_register(regs::REG_GPIODAT)
    }

    // ==================================================================
    // == Calibration ===================================================
    // ==================================================================
    // OFC and FSC are stored LSB register first.
    fn read_word(&mut self, address: u8) -> Result<i32, CommE> {
        let mut raw = [0u8; WORD_BYTES];
        self.read_registers(address, &mut raw)?;
        raw.reverse();
        Ok(decode_i24(raw))
    }

    fn write_word(&mut self, address: u8, value: i32) -> Result<(), CommE> {
        let mut raw = encode_i24(value)?;
        raw.reverse();
        self.write_registers(address, &raw)
    }

    /// Reads the offset calibration word.
    pub fn offset(&mut self) -> Result<i32, CommE> {
        self.read_word(regs::REG_OFC0)
    }

    /// Writes the offset calibration word in one transaction.
    pub fn set_offset(&mut self, offset: i32) -> Result<(), CommE> {
        self.write_word(regs::REG_OFC0, offset)
    }

    /// Reads the raw full-scale calibration word.
    pub fn gain_code(&mut self) -> Result<i32, CommE> {
        self.read_word(regs::REG_FSC0)
    }

    /// Writes the raw full-scale calibration word in one transaction.
    pub fn set_gain_code(&mut self, code: i32) -> Result<(), CommE> {
        self.write_word(regs::REG_FSC0, code)
    }

    /// Reads the gain correction as a factor, where `1.0` is the factory trim point.
    pub fn gain(&mut self) -> Result<f32, CommE> {
        let code = self.gain_code()?;
        Ok(codec::decode_fraction(code, WORD_BITS, GAIN_SCALE)?)
    }

    /// Writes a gain correction factor.
    pub fn set_gain(&mut self, gain: f32) -> Result<(), CommE> {
        let code = codec::encode_fraction(gain, WORD_BITS, GAIN_SCALE)?;
        self.set_gain_code(code)
    }

    // ==================================================================
    // == Reset & Conversion Control ====================================
    // ==================================================================
    /// Resets the device through the reset line, or with the `RESET` command when the line is
    /// not wired up, then waits for the device to settle.
    pub fn reset<D>(&mut self, delay: &mut D) -> Result<(), CommE>
    where
        D: DelayNs + ?Sized,
    {
        if self.lines.has(Line::Reset) {
            self.lines.pulse(Line::Reset, RESET_PULSE_US, delay)?;
        } else {
            self.send(Command::Reset.opcode())?;
        }
        delay.delay_us(RESET_SETTLE_US);

        self.release_start()?;
        self.state.force_idle();
        Ok(())
    }

    /// Pulses START to begin one conversion.
    pub fn start_single<D>(&mut self, delay: &mut D) -> Result<(), CommE>
    where
        D: DelayNs + ?Sized,
    {
        self.state.can_start()?;
        self.lines.pulse(Line::Start, START_PULSE_US, delay)?;
        self.state.start_single()?;
        Ok(())
    }

    /// Enters read-data-continuous mode and holds START active.
    pub fn start_continuous(&mut self) -> Result<(), CommE> {
        self.state.can_start()?;
        if !self.lines.has(Line::Start) {
            return Err(Error::Line(LineError::Missing(Line::Start)));
        }

        self.lines.set_level(Line::Start, true)?;
        if let Err(err) = self.send(&[cmd::RDATAC]) {
            // The device never entered RDATAC; put START back before reporting.
            self.lines.set_level(Line::Start, false)?;
            return Err(err);
        }
        self.state.start_continuous()?;
        Ok(())
    }

    /// Leaves read-data-continuous mode if active and deasserts START.
    pub fn stop(&mut self) -> Result<(), CommE> {
        let mode = self.state.mode();
        self.state.can_stop()?;

        if mode == DeviceMode::Continuous {
            self.send(&[cmd::SDATAC])?;
        }
        self.release_start()?;
        self.state.stop()?;
        Ok(())
    }

    /// Waits for DRDY, bounded by `timeout_us`, and reads one conversion result.
    pub fn read_result<D>(&mut self, delay: &mut D, timeout_us: u32) -> Result<i32, CommE>
    where
        D: DelayNs + ?Sized,
    {
        self.read_result_with_cancel(delay, timeout_us, &NeverCancel)
    }

    /// As [`Self::read_result`], abandoning the wait with [`Error::Cancelled`] once `cancel`
    /// fires.
    pub fn read_result_with_cancel<D, C>(
        &mut self,
        delay: &mut D,
        timeout_us: u32,
        cancel: &C,
    ) -> Result<i32, CommE>
    where
        D: DelayNs + ?Sized,
        C: Cancellation + ?Sized,
    {
        let mode = self.state.can_read()?;
        self.lines.wait_until_active::<CommE, _, _>(timeout_us, delay, cancel)?;

        let request = match mode {
            DeviceMode::Continuous => Builder::streaming_poll(),
            _ => Builder::data_command(cmd::RDATA, WORD_BYTES)?,
        };
        let reply = execute(&mut self.interface, &request)?;
        let code = codec::decode_signed(reply.response(), WORD_BITS)?;

        self.state.read_result()?;
        trace!("conversion result {}", code);
        Ok(code)
    }

    /// Reads one result, starting a single conversion first when idle.
    pub fn measure<D>(&mut self, delay: &mut D, timeout_us: u32) -> Result<i32, CommE>
    where
        D: DelayNs + ?Sized,
    {
        if self.state.mode() == DeviceMode::Idle {
            self.start_single(delay)?;
        }
        self.read_result(delay, timeout_us)
    }
}

impl<IFACE, START, RESET, READY> RegisterAddressableDevice for Ads1248<IFACE, START, RESET, READY>
where
    IFACE: BusInterface,
    START: OutputPin,
    RESET: OutputPin,
    READY: InputPin,
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
    use crate::registers::ads1248::Mux0;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
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

    #[test]
    fn set_inputs_is_read_modify_write() {
        let mut bus = spi(&[
            frame(&[0x20, 0x00, 0xFF], &[0x00, 0x00, 0x41]),
            frame(&[0x40, 0x00, 0x53], &[0x00, 0x00, 0x00]),
        ]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        adc.set_inputs(2, 3).unwrap();
        bus.done();
    }

    #[test]
    fn invalid_field_values_never_reach_the_bus() {
        let mut bus = spi(&[]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        assert_eq!(adc.set_inputs(8, 0), Err(Error::Protocol(ProtocolError::InvalidField)));
        assert_eq!(adc.set_idac_routing(0, 16), Err(Error::Protocol(ProtocolError::InvalidField)));
        assert_eq!(adc.vbias_on(8), Err(Error::Protocol(ProtocolError::InvalidField)));
        assert_eq!(adc.set_gain(2.0), Err(Error::Protocol(ProtocolError::Range)));
        assert_eq!(adc.set_offset(0x80_0000), Err(Error::Protocol(ProtocolError::Range)));
        assert_eq!(adc.write_registers(0x00, &[]), Err(Error::Protocol(ProtocolError::CountRange)));
        bus.done();
    }

    #[test]
    fn unchanged_fields_skip_the_write() {
        let mut bus = spi(&[frame(&[0x23, 0x00, 0xFF], &[0x00, 0x00, 0x32])]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        adc.set_pga(PgaGain::X8).unwrap();
        bus.done();
    }

    #[test]
    fn vbias_pin_toggles_one_bit() {
        let mut bus = spi(&[
            frame(&[0x21, 0x00, 0xFF], &[0x00, 0x00, 0b0000_0001]),
            frame(&[0x41, 0x00, 0b0000_1001], &[0x00, 0x00, 0x00]),
        ]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        adc.vbias_on(3).unwrap();
        bus.done();
    }

    #[test]
    fn offset_and_gain_move_as_one_transaction() {
        let mut bus = spi(&[
            frame(&[0x44, 0x02, 0xFE, 0xFF, 0xFF], &[0x00; 5]),
            frame(&[0x24, 0x02, 0xFF, 0xFF, 0xFF], &[0x00, 0x00, 0x56, 0x34, 0x12]),
            frame(&[0x47, 0x02, 0x00, 0x00, 0x40], &[0x00; 5]),
            frame(&[0x27, 0x02, 0xFF, 0xFF, 0xFF], &[0x00, 0x00, 0x00, 0x00, 0x40]),
        ]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        adc.set_offset(-2).unwrap();
        assert_eq!(adc.offset(), Ok(0x12_3456));
        adc.set_gain(1.0).unwrap();
        assert_eq!(adc.gain(), Ok(1.0));
        bus.done();
    }

    #[test]
    fn typed_views_decode_readback() {
        let mut bus = spi(&[
            frame(&[0x20, 0x00, 0xFF], &[0x00, 0x00, 0b10_101_011]),
            frame(&[0x22, 0x00, 0xFF], &[0x00, 0x00, 0x80]),
            frame(&[0x2A, 0x00, 0xFF], &[0x00, 0x00, 0x90]),
            frame(&[0x23, 0x00, 0xFF], &[0x00, 0x00, 0x22]),
        ]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        let mux0: Mux0 = adc.read_view().unwrap();
        assert_eq!(mux0.bcs(), BurnoutCurrent::Ua2);
        assert_eq!(mux0.mux_sp(), 5);
        assert_eq!(adc.clock_status(), Ok(true));
        assert_eq!(adc.revision_id(), Ok(0x9));
        assert_eq!(adc.data_rate(), Ok(DataRate::Sps20));
        bus.done();
    }

    #[test]
    fn single_shot_conversion_waits_for_drdy_then_reads() {
        let mut bus = spi(&[frame(&[0x12, 0xFF, 0xFF, 0xFF], &[0x00, 0xFF, 0xFF, 0xFE])]);
        let start_expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&start_expectations);
        let ready_expectations = [PinTransaction::get(PinState::High), PinTransaction::get(PinState::Low)];
        let mut ready = PinMock::new(&ready_expectations);

        let lines = ControlLines::new().with_start(start.clone()).with_ready(ready.clone());
        let mut adc = Ads1248::new_spi(bus.clone(), lines);
        let mut delay = NoopDelay::new();

        assert_eq!(adc.measure(&mut delay, 10_000), Ok(-2));
        assert_eq!(adc.mode(), DeviceMode::Idle);

        bus.done();
        start.done();
        ready.done();
    }

    #[test]
    fn drdy_timeout_leaves_the_conversion_pending() {
        let mut bus = spi(&[]);
        let start_expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&start_expectations);
        let ready_expectations = [
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::High),
            PinTransaction::get(PinState::High),
        ];
        let mut ready = PinMock::new(&ready_expectations);

        let lines = ControlLines::new().with_start(start.clone()).with_ready(ready.clone());
        let mut adc = Ads1248::new_spi(bus.clone(), lines);
        let mut delay = NoopDelay::new();

        adc.start_single(&mut delay).unwrap();
        assert_eq!(adc.read_result(&mut delay, 300), Err(Error::Timeout));
        assert_eq!(adc.mode(), DeviceMode::ConversionPending);
        assert_eq!(
            adc.start_single(&mut delay),
            Err(Error::Protocol(ProtocolError::IllegalState))
        );

        bus.done();
        start.done();
        ready.done();
    }

    #[test]
    fn continuous_mode_locks_registers_until_stopped() {
        let mut bus = spi(&[
            frame(&[0x14], &[0x00]),
            frame(&[0xFF, 0xFF, 0xFF], &[0x00, 0x00, 0x03]),
            frame(&[0x16], &[0x00]),
            frame(&[0x23, 0x00, 0xFF], &[0x00, 0x00, 0x00]),
            frame(&[0x43, 0x00, 0x40], &[0x00, 0x00, 0x00]),
        ]);
        let start_expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&start_expectations);
        let ready_expectations = [PinTransaction::get(PinState::Low)];
        let mut ready = PinMock::new(&ready_expectations);

        let lines = ControlLines::new().with_start(start.clone()).with_ready(ready.clone());
        let mut adc = Ads1248::new_spi(bus.clone(), lines);
        let mut delay = NoopDelay::new();

        adc.start_continuous().unwrap();
        assert_eq!(adc.read_result(&mut delay, 1_000), Ok(3));
        assert_eq!(adc.mode(), DeviceMode::Continuous);
        assert_eq!(adc.set_pga(PgaGain::X16), Err(Error::Protocol(ProtocolError::IllegalState)));
        assert_eq!(
            adc.command(Command::SelfOffsetCal),
            Err(Error::Protocol(ProtocolError::IllegalState))
        );

        adc.stop().unwrap();
        adc.set_pga(PgaGain::X16).unwrap();

        bus.done();
        start.done();
        ready.done();
    }

    #[test]
    fn reset_command_releases_start_in_continuous_mode() {
        let mut bus = spi(&[frame(&[0x14], &[0x00]), frame(&[0x06], &[0x00])]);
        let start_expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&start_expectations);

        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new().with_start(start.clone()));

        adc.start_continuous().unwrap();
        adc.command(Command::Reset).unwrap();
        assert_eq!(adc.mode(), DeviceMode::Idle);

        bus.done();
        start.done();
    }

    struct StuckPin;

    impl embedded_hal::digital::ErrorType for StuckPin {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl OutputPin for StuckPin {
        fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    #[test]
    fn start_line_failure_keeps_device_out_of_rdatac() {
        let mut bus = spi(&[]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new().with_start(StuckPin));

        assert_eq!(
            adc.start_continuous(),
            Err(Error::Line(LineError::Pin(embedded_hal::digital::ErrorKind::Other)))
        );
        assert_eq!(adc.mode(), DeviceMode::Idle);
        bus.done();
    }

    #[test]
    fn failed_rdatac_puts_start_back() {
        let start_expectations = [PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)];
        let mut start = PinMock::new(&start_expectations);
        let mut adc = Ads1248::new(FailingBus, ControlLines::new().with_start(start.clone()));

        assert_eq!(adc.start_continuous(), Err(Error::Interface(7)));
        assert_eq!(adc.mode(), DeviceMode::Idle);
        start.done();
    }

    #[test]
    fn read_and_stop_from_idle_are_illegal() {
        let mut bus = spi(&[]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());
        let mut delay = NoopDelay::new();

        assert_eq!(adc.read_result(&mut delay, 1_000), Err(Error::Protocol(ProtocolError::IllegalState)));
        assert_eq!(adc.stop(), Err(Error::Protocol(ProtocolError::IllegalState)));
        assert_eq!(
            adc.start_continuous(),
            Err(Error::Line(LineError::Missing(Line::Start)))
        );
        bus.done();
    }

    #[test]
    fn reset_prefers_the_reset_line() {
        let mut bus = spi(&[]);
        let reset_expectations = [PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)];
        let mut reset = PinMock::new(&reset_expectations);

        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new().with_reset(reset.clone()));
        adc.reset(&mut NoopDelay::new()).unwrap();

        bus.done();
        reset.done();
    }

    #[test]
    fn bare_commands_use_their_opcodes() {
        let mut bus = spi(&[
            frame(&[0x06], &[0x00]),
            frame(&[0x04, 0x04], &[0x00, 0x00]),
            frame(&[0x62], &[0x00]),
        ]);
        let mut adc = Ads1248::new_spi(bus.clone(), ControlLines::new());

        adc.reset(&mut NoopDelay::new()).unwrap();
        adc.command(Command::Sync).unwrap();
        adc.command(Command::SelfOffsetCal).unwrap();
        bus.done();
    }

    struct FailingBus;

    impl BusInterface for FailingBus {
        type Error = u8;

        fn exchange(&mut self, _buf: &mut [u8]) -> core::result::Result<(), u8> {
            Err(7)
        }
    }

    #[test]
    fn transport_errors_pass_through() {
        let mut adc = Ads1248::new(FailingBus, ControlLines::new());
        assert_eq!(adc.command(Command::Wakeup), Err(Error::Interface(7)));
        assert_eq!(adc.offset(), Err(Error::Interface(7)));
    }
}
