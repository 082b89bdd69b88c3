//! Byte-exact transaction framing for register reads, register writes and bare commands.
//!
//! A [`TransactionRequest`] is the complete byte sequence shifted out in one bus exchange:
//! opcode bytes, then payload (write data or filler). The last `response_len` bytes of the
//! reply carry the data of interest; everything before them is echo and is discarded.
//! Requests are fully validated when built, so nothing reaches the bus for a bad parameter.

use core::marker::PhantomData;

use crate::error::ProtocolError;
use crate::interface::BusInterface;
use crate::registers::{ads1248, rm3100};

/// Largest register count addressable in one transaction (4-bit `count - 1` field).
pub const MAX_COUNT: usize = 15;
/// Largest opcode prefix.
pub const MAX_OPCODE: usize = 2;
/// Largest frame shifted out in one exchange.
pub const MAX_FRAME: usize = MAX_OPCODE + MAX_COUNT;

/// Opcode bytes prefixing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    bytes: [u8; MAX_OPCODE],
    len: usize,
}

impl Opcode {
    /// Single opcode byte.
    pub const fn one(byte: u8) -> Self {
        Self { bytes: [byte, 0], len: 1 }
    }

    /// Two opcode bytes.
    pub const fn two(first: u8, second: u8) -> Self {
        Self { bytes: [first, second], len: 2 }
    }

    /// No opcode; the frame consists of payload only.
    pub const fn none() -> Self {
        Self { bytes: [0; MAX_OPCODE], len: 0 }
    }

    /// Returns the opcode bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Framing rules of one device family.
pub trait RegisterProtocol {
    /// Highest addressable register.
    const MAX_ADDRESS: u8;
    /// Byte shifted out when only clocking data in.
    const FILLER: u8;
    /// Opcode prefixing a streaming poll.
    const STREAM_OPCODE: Opcode;
    /// Filler bytes in a streaming poll; equals the bytes of one sample frame after the opcode.
    const STREAM_LEN: usize;

    /// Opcode for reading `count` registers starting at `address`.
    fn read_opcode(address: u8, count: usize) -> Opcode;

    /// Opcode for writing `count` registers starting at `address`.
    fn write_opcode(address: u8, count: usize) -> Opcode;
}

/// ADS1248 framing: `RREG|addr, count-1` / `WREG|addr, count-1`, `NOP` filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ads1248Protocol;

impl RegisterProtocol for Ads1248Protocol {
    const MAX_ADDRESS: u8 = 0x0F;
    const FILLER: u8 = ads1248::cmd::NOP;
    // Read-data-continuous mode clocks a bare 24-bit word out.
    const STREAM_OPCODE: Opcode = Opcode::none();
    const STREAM_LEN: usize = 3;

    fn read_opcode(address: u8, count: usize) -> Opcode {
        Opcode::two(ads1248::cmd::RREG | address, ads1248::cmd::count_byte(count as u8))
    }

    fn write_opcode(address: u8, count: usize) -> Opcode {
        Opcode::two(ads1248::cmd::WREG | address, ads1248::cmd::count_byte(count as u8))
    }
}

/// RM3100 framing: a single `R/W|addr` byte with auto-incrementing addresses, zero filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rm3100Protocol;

impl RegisterProtocol for Rm3100Protocol {
    const MAX_ADDRESS: u8 = 0x7F;
    const FILLER: u8 = 0x00;
    // The status byte is shifted out while the address byte is shifted in.
    const STREAM_OPCODE: Opcode = Opcode::one(rm3100::READ_BIT | rm3100::REG_MX);
    const STREAM_LEN: usize = 9;

    fn read_opcode(address: u8, _count: usize) -> Opcode {
        Opcode::one(rm3100::READ_BIT | address)
    }

    fn write_opcode(address: u8, _count: usize) -> Opcode {
        Opcode::one(rm3100::WRITE_BIT | address)
    }
}

/// Complete byte sequence for one bus exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRequest {
    frame: [u8; MAX_FRAME],
    opcode_len: usize,
    payload_len: usize,
    response_len: usize,
}

impl TransactionRequest {
    fn new(opcode: Opcode, payload: &[u8], response_len: usize) -> Self {
        let mut frame = [0u8; MAX_FRAME];
        frame[..opcode.len].copy_from_slice(opcode.as_bytes());
        frame[opcode.len..opcode.len + payload.len()].copy_from_slice(payload);
        Self {
            frame,
            opcode_len: opcode.len,
            payload_len: payload.len(),
            response_len,
        }
    }

    fn filled(opcode: Opcode, filler: u8, count: usize) -> Self {
        let fill = [filler; MAX_COUNT];
        Self::new(opcode, &fill[..count], count)
    }

    /// Opcode bytes.
    pub fn opcode(&self) -> &[u8] {
        &self.frame[..self.opcode_len]
    }

    /// Write data or filler bytes following the opcode.
    pub fn payload(&self) -> &[u8] {
        &self.frame[self.opcode_len..self.len()]
    }

    /// Full frame as shifted out.
    pub fn as_bytes(&self) -> &[u8] {
        &self.frame[..self.len()]
    }

    /// Total frame length.
    pub fn len(&self) -> usize {
        self.opcode_len + self.payload_len
    }

    /// Returns `true` for an empty frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of trailing reply bytes carrying data.
    pub fn response_len(&self) -> usize {
        self.response_len
    }

    /// Number of leading reply bytes to discard.
    pub fn echo_len(&self) -> usize {
        self.len() - self.response_len
    }

    /// Splits a raw reply into its echo and response parts.
    pub fn split_reply<'a>(&self, reply: &'a [u8]) -> Result<(&'a [u8], &'a [u8]), ProtocolError> {
        if reply.len() != self.len() {
            return Err(ProtocolError::Range);
        }
        Ok(reply.split_at(self.echo_len()))
    }

    /// Performs the exchange on `bus`.
    pub fn execute<B>(&self, bus: &mut B) -> core::result::Result<Reply, B::Error>
    where
        B: BusInterface + ?Sized,
    {
        let mut frame = self.frame;
        bus.exchange(&mut frame[..self.len()])?;
        Ok(Reply {
            frame,
            len: self.len(),
            echo_len: self.echo_len(),
        })
    }
}

/// Bytes received during one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    frame: [u8; MAX_FRAME],
    len: usize,
    echo_len: usize,
}

impl Reply {
    /// Bytes received while the opcode and leading payload were shifted out.
    pub fn echo(&self) -> &[u8] {
        &self.frame[..self.echo_len]
    }

    /// Bytes carrying data.
    pub fn response(&self) -> &[u8] {
        &self.frame[self.echo_len..self.len]
    }
}

/// Builds validated requests for one device family.
#[derive(Debug, Clone, Copy)]
pub struct TransactionBuilder<P> {
    _protocol: PhantomData<P>,
}

impl<P: RegisterProtocol> TransactionBuilder<P> {
    fn check_span(address: u8, count: usize) -> Result<(), ProtocolError> {
        if count == 0 || count > MAX_COUNT {
            return Err(ProtocolError::CountRange);
        }
        if address as usize + count - 1 > P::MAX_ADDRESS as usize {
            return Err(ProtocolError::Range);
        }
        Ok(())
    }

    /// Reads `count` consecutive registers starting at `address`.
    pub fn read(address: u8, count: usize) -> Result<TransactionRequest, ProtocolError> {
        Self::check_span(address, count)?;
        Ok(TransactionRequest::filled(
            P::read_opcode(address, count),
            P::FILLER,
            count,
        ))
    }

    /// Writes `data` to `count` consecutive registers starting at `address`.
    pub fn write(address: u8, count: usize, data: &[u8]) -> Result<TransactionRequest, ProtocolError> {
        if data.len() != count {
            return Err(ProtocolError::CountRange);
        }
        Self::check_span(address, count)?;
        Ok(TransactionRequest::new(P::write_opcode(address, count), data, 0))
    }

    /// Bare command without return data.
    pub fn command(opcode: &[u8]) -> Result<TransactionRequest, ProtocolError> {
        if opcode.is_empty() || opcode.len() > MAX_FRAME {
            return Err(ProtocolError::Range);
        }
        Ok(TransactionRequest::new(Opcode::none(), opcode, 0))
    }

    /// Data-producing command: the opcode followed by `len` filler bytes, whose replies are
    /// returned.
    pub fn data_command(opcode: u8, len: usize) -> Result<TransactionRequest, ProtocolError> {
        if len == 0 || len > MAX_COUNT {
            return Err(ProtocolError::CountRange);
        }
        Ok(TransactionRequest::filled(Opcode::one(opcode), P::FILLER, len))
    }

    /// Fixed-size poll retrieving one sample frame.
    pub fn streaming_poll() -> TransactionRequest {
        TransactionRequest::filled(P::STREAM_OPCODE, P::FILLER, P::STREAM_LEN)
    }
}
