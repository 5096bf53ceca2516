//! Physical bus trait seams
//!
//! These traits are the boundary between the transport engine and the bus
//! hardware (or the in-memory fakes used in tests). A quad controller backs
//! the primary flash device; a plain full-duplex serial controller backs the
//! auxiliary one.

use crate::error::{Error, Result};
use crate::spi::{CommandFrame, LineWidth};
use bitflags::bitflags;

bitflags! {
    /// Line widths a quad controller can drive
    ///
    /// Single-line operation is always available; the wider modes are
    /// reported by the controller and checked before a frame is issued.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusWidths: u8 {
        /// 1-line phases
        const SINGLE = 1 << 0;
        /// 2-line phases
        const DUAL = 1 << 1;
        /// 4-line phases
        const QUAD = 1 << 2;
        /// 8-line phases
        const OCTAL = 1 << 3;
    }
}

impl Default for BusWidths {
    fn default() -> Self {
        BusWidths::SINGLE
    }
}

fn width_supported(width: LineWidth, widths: BusWidths) -> bool {
    match width {
        LineWidth::None => true,
        LineWidth::Single => widths.contains(BusWidths::SINGLE),
        LineWidth::Dual => widths.contains(BusWidths::DUAL),
        LineWidth::Quad => widths.contains(BusWidths::QUAD),
        LineWidth::Octal => widths.contains(BusWidths::OCTAL),
    }
}

/// Check that every phase of a frame fits the controller's line widths
///
/// Returns `Err(ReadError)` if any present phase requests a width the
/// controller cannot drive.
pub fn check_frame_widths(frame: &CommandFrame, widths: BusWidths) -> Result<()> {
    for phase in [
        frame.instruction_width,
        frame.address_width,
        frame.data_width,
    ] {
        if !width_supported(phase, widths) {
            return Err(Error::ReadError);
        }
    }
    Ok(())
}

/// Quad-I/O memory-map-capable bus controller
///
/// The controller is in exactly one of two operating modes at any time:
/// command mode (frames are issued explicitly) or memory-mapped mode (reads
/// against the mapped window are serviced directly in hardware). The mode is
/// never cached by callers; [`QuadBus::is_memory_mapped`] inspects live
/// controller state so the engine and the mode controller cannot disagree.
pub trait QuadBus {
    /// Line widths this controller can drive
    fn widths(&self) -> BusWidths;

    /// Issue the command/address/dummy header of a frame
    ///
    /// For a zero-payload frame this is the whole transaction (or, before
    /// [`QuadBus::memory_map`], the mapped-mode configuration command).
    fn command(&mut self, frame: &CommandFrame) -> Result<()>;

    /// Data phase, outgoing
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Data phase, incoming
    fn receive(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Program the controller into direct-mapped mode
    ///
    /// Uses the command most recently configured via [`QuadBus::command`];
    /// the inactivity timeout counter is left disabled.
    fn memory_map(&mut self) -> Result<()>;

    /// Abort any in-flight mapped transfer and restore command mode
    ///
    /// Unconditional; not expected to fail.
    fn abort(&mut self);

    /// Live controller state: true while in memory-mapped mode
    fn is_memory_mapped(&self) -> bool;

    /// Bulk copy out of the mapped window at an absolute mapped address
    ///
    /// Only meaningful while memory mapped; no bus transaction is issued.
    fn mapped_read(&self, addr: u32, buf: &mut [u8]) -> Result<()>;
}

/// Plain full-duplex serial bus controller
pub trait SerialBus {
    /// One full-duplex transfer; `tx` and `rx` have equal length
    ///
    /// Blocking with a bounded hardware timeout; exceeding it surfaces as
    /// [`Error::Timeout`].
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;
}

/// Discrete chip-select line
///
/// Absent on devices whose controller manages chip select in hardware.
pub trait ChipSelect {
    /// Drive the line active, granting the device the bus
    fn assert(&mut self);
    /// Drive the line inactive
    fn deassert(&mut self);
}

/// Critical section held around one bus transaction
///
/// On hardware this masks interrupt delivery for the duration. It guards
/// against interrupt-handler reentrancy into the same bus controller only;
/// there are no threads in this system and this is not a mutex.
pub trait BusLock {
    /// Enter the critical section
    fn enter(&mut self);
    /// Leave the critical section
    fn exit(&mut self);
}

/// Placeholder bus type for the binding variant a device does not use
///
/// Uninhabited, so the unused variant can never be constructed.
#[derive(Debug)]
pub enum NoBus {}

impl QuadBus for NoBus {
    fn widths(&self) -> BusWidths {
        match *self {}
    }

    fn command(&mut self, _frame: &CommandFrame) -> Result<()> {
        match *self {}
    }

    fn transmit(&mut self, _data: &[u8]) -> Result<()> {
        match *self {}
    }

    fn receive(&mut self, _buf: &mut [u8]) -> Result<()> {
        match *self {}
    }

    fn memory_map(&mut self) -> Result<()> {
        match *self {}
    }

    fn abort(&mut self) {
        match *self {}
    }

    fn is_memory_mapped(&self) -> bool {
        match *self {}
    }

    fn mapped_read(&self, _addr: u32, _buf: &mut [u8]) -> Result<()> {
        match *self {}
    }
}

impl SerialBus for NoBus {
    fn transfer(&mut self, _tx: &[u8], _rx: &mut [u8]) -> Result<()> {
        match *self {}
    }
}

/// Placeholder chip-select type for hardware-managed chip select
///
/// Uninhabited; used as `Option::<NoCs>::None`.
#[derive(Debug)]
pub enum NoCs {}

impl ChipSelect for NoCs {
    fn assert(&mut self) {
        match *self {}
    }

    fn deassert(&mut self) {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::ReadCommandFormat;

    #[test]
    fn width_check_rejects_unsupported_phases() {
        let format = ReadCommandFormat::quad_output(0x6B, 8);
        let frame = CommandFrame::fast_read(0, &format, 4).unwrap();

        assert!(check_frame_widths(&frame, BusWidths::SINGLE | BusWidths::QUAD).is_ok());
        assert_eq!(
            check_frame_widths(&frame, BusWidths::SINGLE),
            Err(Error::ReadError)
        );
    }

    #[test]
    fn absent_phases_always_pass_the_width_check() {
        let (frame, _) = CommandFrame::parse(&[0x06], 0).unwrap();
        assert!(check_frame_widths(&frame, BusWidths::SINGLE).is_ok());
    }
}
