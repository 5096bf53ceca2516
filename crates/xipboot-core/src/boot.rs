//! Boot hand-off sequencer
//!
//! Reads the application's vector table out of the mapped flash window and
//! performs the irreversible transfer of CPU control. Everything past the
//! header read is an unconditional register write through the
//! [`MachineControl`] seam: once hardware quiescing begins there is no error
//! channel and no rollback.

use core::convert::Infallible;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::bus::{BusLock, ChipSelect, QuadBus, SerialBus};
use crate::device::FlashDevice;
use crate::error::Result;

/// Size of the boot image header in bytes
pub const HEADER_BYTES: usize = 8;

// The hand-off values must not live on the call stack once the stack
// pointer is rewritten; they are parked here and re-read after the switch
// is staged.
static HANDOFF_STACK_TOP: AtomicU32 = AtomicU32::new(0);
static HANDOFF_VECTOR_BASE: AtomicU32 = AtomicU32::new(0);
static HANDOFF_ENTRY: AtomicU32 = AtomicU32::new(0);

/// The two words at the base of the application image
///
/// Word 0 is the initial stack-pointer value, word 1 the reset/entry
/// address, in native word order. The mapped base address itself doubles as
/// the vector-table base; this is the standard vector-table-at-image-start
/// layout and is preserved bit-exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootImageHeader {
    /// Initial stack-pointer value
    pub stack_top: u32,
    /// Reset/entry address
    pub entry: u32,
}

impl BootImageHeader {
    /// Read the header from the base of the device's mapped window
    ///
    /// A bulk copy, not a bus transaction; the quad transport must already
    /// be in memory-mapped mode.
    pub fn read_mapped<Q, S, C, L>(device: &FlashDevice<Q, S, C, L>) -> Result<Self>
    where
        Q: QuadBus,
        S: SerialBus,
        C: ChipSelect,
        L: BusLock,
    {
        let mut raw = [0u8; HEADER_BYTES];
        device.mapped_read(0, &mut raw)?;

        Ok(Self {
            stack_top: u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]),
            entry: u32::from_ne_bytes([raw[4], raw[5], raw[6], raw[7]]),
        })
    }
}

/// Machine-control seam for the hand-off sequence
///
/// The hardware implementation writes the MPU, cache, SysTick, interrupt
/// controller and core registers; tests substitute an observable fake. The
/// final [`MachineControl::jump`] never returns: the bootloader's execution
/// context ceases to exist.
pub trait MachineControl {
    /// Disable the memory protection configuration
    ///
    /// Runs before the caches go down so protection state never references
    /// cache-resident mappings.
    fn disable_protection(&mut self);

    /// Disable data and instruction caching
    fn disable_caches(&mut self);

    /// Suspend interrupt delivery globally
    fn disable_interrupts(&mut self);

    /// Resume interrupt delivery globally
    fn enable_interrupts(&mut self);

    /// Stop the system tick timer and zero its control, reload and
    /// current-value registers
    fn stop_sys_tick(&mut self);

    /// Mask and clear every pending line across all interrupt-controller
    /// register banks
    fn quiesce_interrupt_controller(&mut self);

    /// Program the main stack pointer
    fn set_stack_pointer(&mut self, stack_top: u32);

    /// Select the main stack as active, privileged
    fn select_main_stack(&mut self);

    /// Program the vector-table base register
    fn set_vector_table(&mut self, base: u32);

    /// Transfer control to the application entry point; never returns
    fn jump(&mut self, entry: u32) -> !;
}

/// Hand CPU control to the application image in the mapped window
///
/// The primary device must already be in memory-mapped mode. The header
/// read can fail and aborts the hand-off with the bootloader state intact;
/// once the machine-control sequence starts there is no return path, by
/// design. On success this function diverges.
pub fn boot_application<M, Q, S, C, L>(
    machine: &mut M,
    device: &FlashDevice<Q, S, C, L>,
) -> Result<Infallible>
where
    M: MachineControl,
    Q: QuadBus,
    S: SerialBus,
    C: ChipSelect,
    L: BusLock,
{
    let vector_base = match device.mapped_base() {
        Some(base) => base,
        None => {
            log::error!("{}: cannot boot from an unmapped device", device.role());
            return Err(crate::error::Error::ReadError);
        }
    };
    let header = BootImageHeader::read_mapped(device)?;

    HANDOFF_STACK_TOP.store(header.stack_top, Ordering::SeqCst);
    HANDOFF_VECTOR_BASE.store(vector_base, Ordering::SeqCst);
    HANDOFF_ENTRY.store(header.entry, Ordering::SeqCst);

    log::info!("stack_top: {:#010x}", HANDOFF_STACK_TOP.load(Ordering::SeqCst));
    log::info!(
        "vector_addr: {:#010x}",
        HANDOFF_VECTOR_BASE.load(Ordering::SeqCst)
    );
    log::info!("entry_addr: {:#010x}", HANDOFF_ENTRY.load(Ordering::SeqCst));

    machine.disable_protection();
    machine.disable_caches();

    machine.disable_interrupts();

    machine.stop_sys_tick();
    machine.quiesce_interrupt_controller();

    // Transient re-enable so the mask-and-clear takes effect before the
    // application starts.
    machine.enable_interrupts();

    machine.set_stack_pointer(HANDOFF_STACK_TOP.load(Ordering::SeqCst));
    machine.select_main_stack();
    machine.set_vector_table(HANDOFF_VECTOR_BASE.load(Ordering::SeqCst));

    machine.jump(HANDOFF_ENTRY.load(Ordering::SeqCst))
}
