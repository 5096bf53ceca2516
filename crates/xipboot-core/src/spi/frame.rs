//! Command frame descriptor and construction

use crate::error::{Error, Result};
use crate::spi::LineWidth;

/// Address width of the target bus in bytes
///
/// The quad controller is configured for 24-bit addressing; this is a design
/// constant of the target bus, not negotiable per call.
pub const ADDRESS_BYTES: usize = 3;

/// Transaction direction after the command/address/dummy header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Header followed by an outgoing data phase (possibly empty)
    Send,
    /// Header followed by an incoming data phase
    Receive,
}

/// Read command configuration supplied by the external flash driver
///
/// Raw line counts are carried as-is and validated when a frame is built
/// from the format; any value outside {0, 1, 2, 4, 8} is rejected there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadCommandFormat {
    /// Instruction byte
    pub instruction: u8,
    /// Lines for the instruction phase
    pub instruction_lines: u8,
    /// Lines for the address phase
    pub address_lines: u8,
    /// Lines for the data phase
    pub data_lines: u8,
    /// Dummy clock cycles between address and data phases
    pub dummy_cycles: u8,
}

impl ReadCommandFormat {
    /// Create a format with explicit per-phase line counts
    pub const fn new(
        instruction: u8,
        instruction_lines: u8,
        address_lines: u8,
        data_lines: u8,
        dummy_cycles: u8,
    ) -> Self {
        Self {
            instruction,
            instruction_lines,
            address_lines,
            data_lines,
            dummy_cycles,
        }
    }

    /// 1-1-4 fast read (instruction and address serial, data on 4 lines)
    pub const fn quad_output(instruction: u8, dummy_cycles: u8) -> Self {
        Self::new(instruction, 1, 1, 4, dummy_cycles)
    }
}

/// A single transport-specific command frame
///
/// Built from either a flat driver byte stream ([`CommandFrame::parse`]) or
/// a [`ReadCommandFormat`], and consumed within one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandFrame {
    /// Instruction byte
    pub instruction: u8,
    /// Instruction phase width
    pub instruction_width: LineWidth,
    /// 24-bit address, present only when `address_width` is not `None`
    pub address: Option<u32>,
    /// Address phase width
    pub address_width: LineWidth,
    /// Data phase width
    pub data_width: LineWidth,
    /// Dummy cycles between header and data phase
    ///
    /// Wider than the format's field: the generic path derives this from the
    /// stream length (8 per trailing header byte) and must never wrap.
    pub dummy_cycles: u32,
    /// Data phase length in bytes
    pub data_len: usize,
    /// Data phase direction
    pub direction: Direction,
}

impl CommandFrame {
    /// Parse a flat "instruction [+ address] [+ payload]" byte stream
    ///
    /// Byte 0 is the instruction, driven on a single line by convention for
    /// the generic path. A stream longer than one byte must be at least four
    /// bytes long; bytes 1..=3 decode to a 24-bit big-endian address.
    /// Streams of length 2 or 3 are mis-framed commands and are rejected
    /// rather than decoded as a partial address.
    ///
    /// When `read_len` is non-zero the transaction is a receive: every
    /// stream byte past the instruction+address header contributes 8 dummy
    /// cycles. Otherwise the trailing bytes are the outgoing payload,
    /// returned as the second element.
    pub fn parse(stream: &[u8], read_len: usize) -> Result<(Self, &[u8])> {
        let (&instruction, rest) = stream.split_first().ok_or(Error::ReadError)?;

        let (address, address_width, rest) = if rest.is_empty() {
            (None, LineWidth::None, rest)
        } else if rest.len() < ADDRESS_BYTES {
            // 2- or 3-byte streams cannot carry a full address
            return Err(Error::ReadError);
        } else {
            let (addr_bytes, rest) = rest.split_at(ADDRESS_BYTES);
            let address = (addr_bytes[0] as u32) << 16
                | (addr_bytes[1] as u32) << 8
                | addr_bytes[2] as u32;
            (Some(address), LineWidth::Single, rest)
        };

        let frame = if read_len > 0 {
            Self {
                instruction,
                instruction_width: LineWidth::Single,
                address,
                address_width,
                data_width: LineWidth::Single,
                dummy_cycles: rest.len() as u32 * 8,
                data_len: read_len,
                direction: Direction::Receive,
            }
        } else {
            Self {
                instruction,
                instruction_width: LineWidth::Single,
                address,
                address_width,
                data_width: if rest.is_empty() {
                    LineWidth::None
                } else {
                    LineWidth::Single
                },
                dummy_cycles: 0,
                data_len: rest.len(),
                direction: Direction::Send,
            }
        };

        Ok((frame, rest))
    }

    /// Build a fast-read frame from a driver-supplied format
    ///
    /// Every phase width comes from the format and is validated; the address
    /// must fit the 24-bit bus.
    pub fn fast_read(address: u32, format: &ReadCommandFormat, read_len: usize) -> Result<Self> {
        if address >> (ADDRESS_BYTES * 8) != 0 {
            return Err(Error::ReadError);
        }
        Ok(Self {
            instruction: format.instruction,
            instruction_width: LineWidth::from_lines(format.instruction_lines)?,
            address: Some(address),
            address_width: LineWidth::from_lines(format.address_lines)?,
            data_width: LineWidth::from_lines(format.data_lines)?,
            dummy_cycles: format.dummy_cycles as u32,
            data_len: read_len,
            direction: Direction::Receive,
        })
    }

    /// Build the zero-payload configuration frame used to program the quad
    /// controller for direct-mapped mode
    pub fn memory_map_entry(format: &ReadCommandFormat) -> Result<Self> {
        Self::fast_read(0, format, 0)
    }

    /// Returns true if this frame carries an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }
}
