//! Transaction engine
//!
//! Executes command frames (or plain write/read buffer pairs, for the serial
//! binding) against a device's physical bus. The engine owns chip-select
//! assertion and holds the critical-section lock across the full
//! transaction; it never retries.

use heapless::Vec;

use crate::bus::{check_frame_widths, BusLock, ChipSelect, QuadBus, SerialBus};
use crate::device::{FlashDevice, TransportBinding};
use crate::error::{Error, Result};
use crate::spi::{CommandFrame, Direction, ReadCommandFormat};

/// Byte clocked out for padding positions of the serial scratch buffer
pub const DUMMY_DATA: u8 = 0xFF;

/// Capacity of the serial transport's combined send/receive scratch
///
/// Sized for a page program plus command header with room to spare. A
/// transaction that does not fit fails with [`Error::WriteError`] before any
/// bus activity, the equivalent of the allocation failure on the original
/// target.
pub const SERIAL_SCRATCH_BYTES: usize = 512;

impl<Q, S, C, L> FlashDevice<Q, S, C, L>
where
    Q: QuadBus,
    S: SerialBus,
    C: ChipSelect,
    L: BusLock,
{
    /// Execute one transaction: send `write_buf`, then receive into
    /// `read_buf`
    ///
    /// Both non-empty is send-then-receive, only `write_buf` non-empty is a
    /// fire-and-forget send, and a transaction with no command phase is an
    /// invalid call. On the quad binding the write buffer is parsed as an
    /// "instruction [+ address] [+ payload]" stream; on the serial binding
    /// it is clocked out verbatim.
    pub fn write_read(&mut self, write_buf: &[u8], read_buf: &mut [u8]) -> Result<()> {
        if write_buf.is_empty() {
            log::error!("{}: transaction has no command phase", self.role());
            return Err(Error::WriteError);
        }

        self.lock.enter();
        let result = self.write_read_locked(write_buf, read_buf);
        self.lock.exit();
        result
    }

    fn write_read_locked(&mut self, write_buf: &[u8], read_buf: &mut [u8]) -> Result<()> {
        let role = self.role();
        match &mut self.binding {
            TransportBinding::Quad { bus, .. } => {
                if bus.is_memory_mapped() {
                    log::error!("{}: refusing to write while memory mapped", role);
                    return Err(Error::WriteError);
                }

                if let Some(cs) = self.cs.as_mut() {
                    cs.assert();
                }
                let result = quad_transaction(bus, write_buf, read_buf);
                if let Some(cs) = self.cs.as_mut() {
                    cs.deassert();
                }
                result
            }
            TransportBinding::Serial { bus } => {
                let total = write_buf.len() + read_buf.len();
                let mut tx: Vec<u8, SERIAL_SCRATCH_BYTES> = Vec::new();
                let mut rx: Vec<u8, SERIAL_SCRATCH_BYTES> = Vec::new();
                if tx.resize(total, DUMMY_DATA).is_err() || rx.resize(total, 0).is_err() {
                    log::error!("{}: {} byte transfer exceeds scratch capacity", role, total);
                    return Err(Error::WriteError);
                }
                tx[..write_buf.len()].copy_from_slice(write_buf);

                if let Some(cs) = self.cs.as_mut() {
                    cs.assert();
                }
                let result = bus.transfer(&tx, &mut rx).map_err(|_| Error::Timeout);
                if let Some(cs) = self.cs.as_mut() {
                    cs.deassert();
                }
                result?;

                read_buf.copy_from_slice(&rx[write_buf.len()..]);
                Ok(())
            }
        }
    }

    /// Fast read at a 24-bit flash address using the caller's command format
    ///
    /// While the quad transport is memory mapped this is a bulk copy from
    /// the mapped window with no bus transaction; otherwise it is a one-shot
    /// locked command+receive. Not available on the serial binding.
    pub fn fast_read(
        &mut self,
        addr: u32,
        format: &ReadCommandFormat,
        read_buf: &mut [u8],
    ) -> Result<()> {
        let role = self.role();
        match &mut self.binding {
            TransportBinding::Quad { bus, mapped_base } => {
                if bus.is_memory_mapped() {
                    return bus.mapped_read(*mapped_base + addr, read_buf);
                }

                let frame = CommandFrame::fast_read(addr, format, read_buf.len())?;
                check_frame_widths(&frame, bus.widths())?;

                self.lock.enter();
                let result = (|| {
                    bus.command(&frame).map_err(|_| Error::ReadError)?;
                    if !read_buf.is_empty() {
                        bus.receive(read_buf).map_err(|_| Error::ReadError)?;
                    }
                    Ok(())
                })();
                self.lock.exit();
                result
            }
            TransportBinding::Serial { .. } => {
                log::error!("{}: fast read is not available on the serial transport", role);
                Err(Error::WriteError)
            }
        }
    }

    /// Bulk copy from the mapped window at `offset` from the mapped base
    ///
    /// Requires the quad transport to already be in memory-mapped mode; no
    /// bus transaction is issued.
    pub fn mapped_read(&self, offset: u32, buf: &mut [u8]) -> Result<()> {
        match &self.binding {
            TransportBinding::Quad { bus, mapped_base } => {
                if !bus.is_memory_mapped() {
                    log::error!("{}: mapped read outside memory-mapped mode", self.role());
                    return Err(Error::ReadError);
                }
                bus.mapped_read(*mapped_base + offset, buf)
            }
            TransportBinding::Serial { .. } => {
                log::error!("{}: no mapped window", self.role());
                Err(Error::ReadError)
            }
        }
    }
}

/// Issue one parsed frame: command phase, then the data phase its direction
/// calls for
fn quad_transaction<Q: QuadBus>(bus: &mut Q, write_buf: &[u8], read_buf: &mut [u8]) -> Result<()> {
    let (frame, payload) = CommandFrame::parse(write_buf, read_buf.len())?;
    check_frame_widths(&frame, bus.widths())?;

    bus.command(&frame).map_err(|_| Error::ReadError)?;

    match frame.direction {
        Direction::Receive => {
            if !read_buf.is_empty() {
                bus.receive(read_buf).map_err(|_| Error::ReadError)?;
            }
        }
        Direction::Send => {
            if !payload.is_empty() {
                bus.transmit(payload).map_err(|_| Error::WriteError)?;
            }
        }
    }
    Ok(())
}
