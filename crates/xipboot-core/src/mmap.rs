//! Memory-mapped mode control
//!
//! The quad transport is in exactly one of two modes: command mode (frames
//! issued explicitly) or memory-mapped mode (the mapped window is serviced
//! directly in hardware). The current mode is always read from live
//! controller state, never cached here, so the mode controller and the
//! transaction engine cannot disagree.

use crate::bus::{check_frame_widths, BusLock, ChipSelect, QuadBus, SerialBus};
use crate::device::{FlashDevice, TransportBinding};
use crate::error::{Error, Result};
use crate::spi::CommandFrame;

impl<Q, S, C, L> FlashDevice<Q, S, C, L>
where
    Q: QuadBus,
    S: SerialBus,
    C: ChipSelect,
    L: BusLock,
{
    /// Switch the quad transport into memory-mapped (execute-in-place) mode
    ///
    /// Issues a zero-payload configuration frame built from the installed
    /// read command format, then programs the controller into direct-mapped
    /// mode with the inactivity timeout disabled. If either step fails the
    /// transport remains in command mode. Invalid on the serial binding.
    pub fn enter_memory_mapped(&mut self) -> Result<()> {
        let role = self.role();
        let format = match self.read_format() {
            Some(format) => *format,
            None => {
                log::error!("{}: no read command format installed", role);
                return Err(Error::ReadError);
            }
        };

        match &mut self.binding {
            TransportBinding::Quad { bus, .. } => {
                let frame = CommandFrame::memory_map_entry(&format)?;
                check_frame_widths(&frame, bus.widths())?;

                if bus.command(&frame).is_err() {
                    log::error!("{}: memory map configuration command failed", role);
                    return Err(Error::ReadError);
                }
                if bus.memory_map().is_err() {
                    log::error!("{}: switch to memory-mapped mode failed", role);
                    return Err(Error::ReadError);
                }
                log::debug!("{}: memory-mapped mode entered", role);
                Ok(())
            }
            TransportBinding::Serial { .. } => {
                log::error!("{}: no memory-mapped mode on the serial transport", role);
                Err(Error::WriteError)
            }
        }
    }

    /// Leave memory-mapped mode unconditionally
    ///
    /// Aborts any in-flight mapped transfer and restores command mode; this
    /// operation does not fail. The transport then stays in command mode
    /// until the caller explicitly re-enters; there is no automatic
    /// re-entry. Invalid on the serial binding.
    pub fn exit_memory_mapped(&mut self) -> Result<()> {
        let role = self.role();
        match &mut self.binding {
            TransportBinding::Quad { bus, .. } => {
                bus.abort();
                log::debug!("{}: memory-mapped mode exited", role);
                Ok(())
            }
            TransportBinding::Serial { .. } => {
                log::error!("{}: no memory-mapped mode on the serial transport", role);
                Err(Error::WriteError)
            }
        }
    }

    /// Live controller state: true while the quad transport is memory
    /// mapped
    pub fn is_memory_mapped(&self) -> bool {
        match &self.binding {
            TransportBinding::Quad { bus, .. } => bus.is_memory_mapped(),
            TransportBinding::Serial { .. } => false,
        }
    }
}
