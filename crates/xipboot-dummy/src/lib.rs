//! xipboot-dummy - In-memory fakes for the bootloader core
//!
//! This crate provides image-backed fake bus controllers, a recording chip
//! select, a counting transaction lock and an observable machine-control
//! fake. They stand in for the quad/serial controllers and the Cortex-M core
//! during development and testing, without real hardware.
//!
//! Every fake hands out a shared state handle so tests can keep inspecting
//! it after the fake has been moved into a `FlashDevice`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod fakes {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use xipboot_core::boot::MachineControl;
    use xipboot_core::bus::{BusLock, BusWidths, ChipSelect, QuadBus, SerialBus};
    use xipboot_core::error::{Error, Result};
    use xipboot_core::spi::CommandFrame;

    /// Observable state of a [`FakeQuadBus`]
    pub struct QuadBusState {
        /// Backing flash image served by reads
        pub image: Vec<u8>,
        /// Base address of the mapped window
        pub mapped_base: u32,
        /// Live operating mode
        pub mapped: bool,
        /// Every command frame issued, in order
        pub commands: Vec<CommandFrame>,
        /// Every transmitted data phase, in order
        pub transmitted: Vec<Vec<u8>>,
        /// Counts every bus operation (command, transmit, receive, map)
        pub bus_activity: u32,
        /// Fail the next command phases
        pub fail_command: bool,
        /// Fail the next receive phases
        pub fail_receive: bool,
        /// Fail the next transmit phases
        pub fail_transmit: bool,
        /// Fail the switch into memory-mapped mode
        pub fail_memory_map: bool,
        /// Line widths the fake controller claims to drive
        pub widths: BusWidths,
    }

    /// Image-backed fake quad controller
    pub struct FakeQuadBus {
        state: Rc<RefCell<QuadBusState>>,
    }

    impl FakeQuadBus {
        /// Create a fake controller over a copy of `image`
        pub fn new(mapped_base: u32, image: &[u8]) -> Self {
            Self {
                state: Rc::new(RefCell::new(QuadBusState {
                    image: image.to_vec(),
                    mapped_base,
                    mapped: false,
                    commands: Vec::new(),
                    transmitted: Vec::new(),
                    bus_activity: 0,
                    fail_command: false,
                    fail_receive: false,
                    fail_transmit: false,
                    fail_memory_map: false,
                    widths: BusWidths::SINGLE | BusWidths::DUAL | BusWidths::QUAD,
                })),
            }
        }

        /// Shared handle to the observable state
        pub fn state(&self) -> Rc<RefCell<QuadBusState>> {
            Rc::clone(&self.state)
        }
    }

    impl QuadBus for FakeQuadBus {
        fn widths(&self) -> BusWidths {
            self.state.borrow().widths
        }

        fn command(&mut self, frame: &CommandFrame) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.bus_activity += 1;
            if state.fail_command {
                return Err(Error::ReadError);
            }
            state.commands.push(*frame);
            Ok(())
        }

        fn transmit(&mut self, data: &[u8]) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.bus_activity += 1;
            if state.fail_transmit {
                return Err(Error::WriteError);
            }
            state.transmitted.push(data.to_vec());
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.bus_activity += 1;
            if state.fail_receive {
                return Err(Error::ReadError);
            }
            // Serve data at the address of the last issued command frame
            let addr = state
                .commands
                .last()
                .and_then(|frame| frame.address)
                .unwrap_or(0) as usize;
            let end = addr.checked_add(buf.len()).ok_or(Error::ReadError)?;
            let data = state.image.get(addr..end).ok_or(Error::ReadError)?;
            buf.copy_from_slice(data);
            Ok(())
        }

        fn memory_map(&mut self) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.bus_activity += 1;
            if state.fail_memory_map {
                return Err(Error::ReadError);
            }
            state.mapped = true;
            log::debug!("fake quad bus: memory-mapped mode");
            Ok(())
        }

        fn abort(&mut self) {
            self.state.borrow_mut().mapped = false;
            log::debug!("fake quad bus: command mode");
        }

        fn is_memory_mapped(&self) -> bool {
            self.state.borrow().mapped
        }

        fn mapped_read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
            let state = self.state.borrow();
            if !state.mapped {
                return Err(Error::ReadError);
            }
            let offset = addr.checked_sub(state.mapped_base).ok_or(Error::ReadError)? as usize;
            let end = offset.checked_add(buf.len()).ok_or(Error::ReadError)?;
            let data = state.image.get(offset..end).ok_or(Error::ReadError)?;
            buf.copy_from_slice(data);
            Ok(())
        }
    }

    /// Observable state of a [`FakeSerialBus`]
    pub struct SerialBusState {
        /// Bytes clocked back during transfers, position for position
        pub response: Vec<u8>,
        /// Every transmitted buffer, in order
        pub transfers: Vec<Vec<u8>>,
        /// Counts every full-duplex transfer
        pub bus_activity: u32,
        /// Fail the next transfers with a timeout
        pub fail: bool,
    }

    /// Fake full-duplex serial controller
    pub struct FakeSerialBus {
        state: Rc<RefCell<SerialBusState>>,
    }

    impl FakeSerialBus {
        /// Create a fake controller that clocks back `response`
        pub fn new(response: &[u8]) -> Self {
            Self {
                state: Rc::new(RefCell::new(SerialBusState {
                    response: response.to_vec(),
                    transfers: Vec::new(),
                    bus_activity: 0,
                    fail: false,
                })),
            }
        }

        /// Shared handle to the observable state
        pub fn state(&self) -> Rc<RefCell<SerialBusState>> {
            Rc::clone(&self.state)
        }
    }

    impl SerialBus for FakeSerialBus {
        fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.bus_activity += 1;
            if state.fail {
                return Err(Error::Timeout);
            }
            state.transfers.push(tx.to_vec());
            for (i, byte) in rx.iter_mut().enumerate() {
                *byte = state.response.get(i).copied().unwrap_or(0xFF);
            }
            Ok(())
        }
    }

    /// Chip-select edge as observed by [`RecordingChipSelect`]
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CsEvent {
        /// Line driven active
        Assert,
        /// Line driven inactive
        Deassert,
    }

    /// Discrete chip-select line that records every edge
    pub struct RecordingChipSelect {
        events: Rc<RefCell<Vec<CsEvent>>>,
    }

    impl RecordingChipSelect {
        /// Create a recording line
        pub fn new() -> Self {
            Self {
                events: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Shared handle to the recorded edges
        pub fn events(&self) -> Rc<RefCell<Vec<CsEvent>>> {
            Rc::clone(&self.events)
        }
    }

    impl Default for RecordingChipSelect {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ChipSelect for RecordingChipSelect {
        fn assert(&mut self) {
            self.events.borrow_mut().push(CsEvent::Assert);
        }

        fn deassert(&mut self) {
            self.events.borrow_mut().push(CsEvent::Deassert);
        }
    }

    /// Enter/exit counters of a [`CountingLock`]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LockCounters {
        /// Critical-section entries
        pub enters: u32,
        /// Critical-section exits
        pub exits: u32,
    }

    /// Transaction lock that only counts
    pub struct CountingLock {
        counters: Rc<RefCell<LockCounters>>,
    }

    impl CountingLock {
        /// Create a counting lock
        pub fn new() -> Self {
            Self {
                counters: Rc::new(RefCell::new(LockCounters::default())),
            }
        }

        /// Shared handle to the counters
        pub fn counters(&self) -> Rc<RefCell<LockCounters>> {
            Rc::clone(&self.counters)
        }
    }

    impl Default for CountingLock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BusLock for CountingLock {
        fn enter(&mut self) {
            self.counters.borrow_mut().enters += 1;
        }

        fn exit(&mut self) {
            self.counters.borrow_mut().exits += 1;
        }
    }

    /// One machine-control operation as observed by [`FakeMachine`]
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MachineOp {
        /// Memory protection disabled
        ProtectionDisabled,
        /// Data and instruction caches disabled
        CachesDisabled,
        /// Interrupt delivery suspended
        InterruptsDisabled,
        /// Interrupt delivery resumed
        InterruptsEnabled,
        /// System tick stopped and zeroed
        SysTickStopped,
        /// All interrupt-controller banks masked and cleared
        InterruptControllerQuiesced,
        /// Main stack pointer programmed
        StackPointer(u32),
        /// Main stack selected, privileged
        MainStackSelected,
        /// Vector-table base programmed
        VectorTable(u32),
        /// Control transferred to the application
        Jump(u32),
    }

    /// Machine control that records every operation
    ///
    /// The non-returning jump is modeled as a marker panic so tests can
    /// observe that control was transferred exactly once.
    pub struct FakeMachine {
        ops: Rc<RefCell<Vec<MachineOp>>>,
    }

    /// Panic payload used by [`FakeMachine::jump`]
    pub const CONTROL_TRANSFERRED: &str = "control transferred";

    impl FakeMachine {
        /// Create a recording machine
        pub fn new() -> Self {
            Self {
                ops: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Shared handle to the operation transcript
        pub fn ops(&self) -> Rc<RefCell<Vec<MachineOp>>> {
            Rc::clone(&self.ops)
        }
    }

    impl Default for FakeMachine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MachineControl for FakeMachine {
        fn disable_protection(&mut self) {
            self.ops.borrow_mut().push(MachineOp::ProtectionDisabled);
        }

        fn disable_caches(&mut self) {
            self.ops.borrow_mut().push(MachineOp::CachesDisabled);
        }

        fn disable_interrupts(&mut self) {
            self.ops.borrow_mut().push(MachineOp::InterruptsDisabled);
        }

        fn enable_interrupts(&mut self) {
            self.ops.borrow_mut().push(MachineOp::InterruptsEnabled);
        }

        fn stop_sys_tick(&mut self) {
            self.ops.borrow_mut().push(MachineOp::SysTickStopped);
        }

        fn quiesce_interrupt_controller(&mut self) {
            self.ops
                .borrow_mut()
                .push(MachineOp::InterruptControllerQuiesced);
        }

        fn set_stack_pointer(&mut self, stack_top: u32) {
            self.ops.borrow_mut().push(MachineOp::StackPointer(stack_top));
        }

        fn select_main_stack(&mut self) {
            self.ops.borrow_mut().push(MachineOp::MainStackSelected);
        }

        fn set_vector_table(&mut self, base: u32) {
            self.ops.borrow_mut().push(MachineOp::VectorTable(base));
        }

        fn jump(&mut self, entry: u32) -> ! {
            self.ops.borrow_mut().push(MachineOp::Jump(entry));
            panic!("{}", CONTROL_TRANSFERRED);
        }
    }
}

#[cfg(feature = "alloc")]
pub use fakes::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use xipboot_core::boot::{boot_application, BootImageHeader};
    use xipboot_core::bus::{BusWidths, NoCs};
    use xipboot_core::device::{
        AuxiliaryDevice, DeviceRegistry, FlashDevice, FlashRole, PrimaryDevice, RetryPolicy,
    };
    use xipboot_core::error::Error;
    use xipboot_core::spi::ReadCommandFormat;

    const MAPPED_BASE: u32 = 0x9000_0000;

    fn primary_with_image(
        image: &[u8],
    ) -> (
        PrimaryDevice<FakeQuadBus, RecordingChipSelect, CountingLock>,
        std::rc::Rc<std::cell::RefCell<QuadBusState>>,
        std::rc::Rc<std::cell::RefCell<Vec<CsEvent>>>,
        std::rc::Rc<std::cell::RefCell<LockCounters>>,
    ) {
        let bus = FakeQuadBus::new(MAPPED_BASE, image);
        let cs = RecordingChipSelect::new();
        let lock = CountingLock::new();
        let bus_state = bus.state();
        let cs_events = cs.events();
        let counters = lock.counters();
        let mut device =
            FlashDevice::primary(bus, MAPPED_BASE, lock, RetryPolicy::default()).with_chip_select(cs);
        device.set_read_format(ReadCommandFormat::quad_output(0x6B, 8));
        (device, bus_state, cs_events, counters)
    }

    fn auxiliary_with_response(
        response: &[u8],
    ) -> (
        AuxiliaryDevice<FakeSerialBus, RecordingChipSelect, CountingLock>,
        std::rc::Rc<std::cell::RefCell<SerialBusState>>,
        std::rc::Rc<std::cell::RefCell<Vec<CsEvent>>>,
    ) {
        let bus = FakeSerialBus::new(response);
        let cs = RecordingChipSelect::new();
        let bus_state = bus.state();
        let cs_events = cs.events();
        let device = FlashDevice::auxiliary(bus, CountingLock::new(), RetryPolicy::default())
            .with_chip_select(cs);
        (device, bus_state, cs_events)
    }

    #[test]
    fn writes_are_refused_while_memory_mapped() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);
        device.enter_memory_mapped().unwrap();
        assert!(device.is_memory_mapped());

        let activity = bus_state.borrow().bus_activity;
        assert_eq!(device.write_read(&[0x06], &mut []), Err(Error::WriteError));
        // refusal happens before any bus activity
        assert_eq!(bus_state.borrow().bus_activity, activity);
    }

    #[test]
    fn writes_resume_after_leaving_memory_mapped_mode() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);
        device.enter_memory_mapped().unwrap();
        device.exit_memory_mapped().unwrap();
        assert!(!device.is_memory_mapped());

        let activity = bus_state.borrow().bus_activity;
        device.write_read(&[0x06], &mut []).unwrap();

        let state = bus_state.borrow();
        assert_eq!(state.bus_activity, activity + 1);
        assert_eq!(state.commands.last().unwrap().instruction, 0x06);
    }

    #[test]
    fn memory_map_entry_failure_leaves_command_mode() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);
        bus_state.borrow_mut().fail_memory_map = true;

        assert_eq!(device.enter_memory_mapped(), Err(Error::ReadError));
        assert!(!device.is_memory_mapped());
    }

    #[test]
    fn memory_map_entry_requires_a_read_format() {
        let bus = FakeQuadBus::new(MAPPED_BASE, &[0u8; 16]);
        let mut device: PrimaryDevice<FakeQuadBus, NoCs, CountingLock> =
            FlashDevice::primary(bus, MAPPED_BASE, CountingLock::new(), RetryPolicy::default());
        assert_eq!(device.enter_memory_mapped(), Err(Error::ReadError));
    }

    #[test]
    fn chip_select_ends_deasserted_on_success_and_failure() {
        let (mut device, bus_state, cs_events, _) = primary_with_image(&[0u8; 64]);

        device.write_read(&[0x06], &mut []).unwrap();
        assert_eq!(&*cs_events.borrow(), &[CsEvent::Assert, CsEvent::Deassert]);

        bus_state.borrow_mut().fail_command = true;
        assert_eq!(device.write_read(&[0x06], &mut []), Err(Error::ReadError));
        assert_eq!(cs_events.borrow().last(), Some(&CsEvent::Deassert));
        assert_eq!(cs_events.borrow().len(), 4);
    }

    #[test]
    fn quad_receive_decodes_address_and_dummy_cycles() {
        let mut image = vec![0u8; 0x20];
        image[0x10..0x14].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let (mut device, bus_state, _, _) = primary_with_image(&image);

        // instruction + 3 address bytes + 1 latency byte, then 4 data bytes
        let mut buf = [0u8; 4];
        device
            .write_read(&[0x0B, 0x00, 0x00, 0x10, 0xFF], &mut buf)
            .unwrap();

        assert_eq!(buf, [0xDE, 0xAD, 0xBE, 0xEF]);
        let state = bus_state.borrow();
        let frame = state.commands.last().unwrap();
        assert_eq!(frame.address, Some(0x000010));
        assert_eq!(frame.dummy_cycles, 8);
        assert_eq!(frame.data_len, 4);
    }

    #[test]
    fn quad_send_transmits_the_trailing_payload() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);

        device
            .write_read(&[0x02, 0x00, 0x00, 0x20, 0xAA, 0xBB], &mut [])
            .unwrap();

        let state = bus_state.borrow();
        assert_eq!(state.transmitted.last().unwrap(), &[0xAA, 0xBB]);
        assert_eq!(state.commands.last().unwrap().address, Some(0x000020));
    }

    #[test]
    fn misframed_streams_are_rejected_without_bus_activity() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);

        let mut buf = [0u8; 4];
        assert_eq!(
            device.write_read(&[0x03, 0x12], &mut buf),
            Err(Error::ReadError)
        );
        assert_eq!(
            device.write_read(&[0x03, 0x12, 0x34], &mut buf),
            Err(Error::ReadError)
        );
        assert_eq!(bus_state.borrow().bus_activity, 0);
    }

    #[test]
    fn empty_transactions_are_invalid_calls() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 64]);
        let mut buf = [0u8; 4];
        assert_eq!(device.write_read(&[], &mut []), Err(Error::WriteError));
        assert_eq!(device.write_read(&[], &mut buf), Err(Error::WriteError));
        assert_eq!(bus_state.borrow().bus_activity, 0);
    }

    #[test]
    fn lock_is_balanced_across_success_and_failure() {
        let (mut device, bus_state, _, counters) = primary_with_image(&[0u8; 64]);

        device.write_read(&[0x06], &mut []).unwrap();
        bus_state.borrow_mut().fail_command = true;
        let _ = device.write_read(&[0x06], &mut []);

        let counters = counters.borrow();
        assert_eq!(counters.enters, 2);
        assert_eq!(counters.exits, 2);
    }

    #[test]
    fn serial_round_trip_pads_and_splits_the_scratch() {
        let response: Vec<u8> = (0u8..16).collect();
        let (mut device, bus_state, cs_events) = auxiliary_with_response(&response);

        let mut buf = [0u8; 8];
        device.write_read(&[0x03, 0x00, 0x10, 0x00], &mut buf).unwrap();

        // read data is the trailing read_size bytes of the full-duplex clock
        assert_eq!(buf, response[4..12]);

        let state = bus_state.borrow();
        assert_eq!(state.bus_activity, 1);
        let tx = state.transfers.last().unwrap();
        assert_eq!(tx.len(), 12);
        assert_eq!(&tx[..4], &[0x03, 0x00, 0x10, 0x00]);
        // unused send positions are padded with the dummy byte
        assert!(tx[4..].iter().all(|&byte| byte == 0xFF));

        assert_eq!(&*cs_events.borrow(), &[CsEvent::Assert, CsEvent::Deassert]);
    }

    #[test]
    fn serial_scratch_exhaustion_fails_before_chip_select() {
        let (mut device, bus_state, cs_events) = auxiliary_with_response(&[]);

        let big = vec![0u8; 600];
        assert_eq!(device.write_read(&big, &mut []), Err(Error::WriteError));

        assert_eq!(bus_state.borrow().bus_activity, 0);
        assert!(cs_events.borrow().is_empty());
    }

    #[test]
    fn serial_transfer_failure_surfaces_as_timeout() {
        let (mut device, bus_state, cs_events) = auxiliary_with_response(&[]);
        bus_state.borrow_mut().fail = true;

        let mut buf = [0u8; 4];
        assert_eq!(
            device.write_read(&[0x9F], &mut buf),
            Err(Error::Timeout)
        );
        assert_eq!(cs_events.borrow().last(), Some(&CsEvent::Deassert));
    }

    #[test]
    fn fast_read_in_mapped_mode_is_a_pure_copy() {
        let mut image = vec![0u8; 0x40];
        image[0x08..0x0C].copy_from_slice(&[1, 2, 3, 4]);
        let (mut device, bus_state, _, _) = primary_with_image(&image);
        device.enter_memory_mapped().unwrap();

        let activity = bus_state.borrow().bus_activity;
        let format = ReadCommandFormat::quad_output(0x6B, 8);
        let mut buf = [0u8; 4];
        device.fast_read(0x08, &format, &mut buf).unwrap();

        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(bus_state.borrow().bus_activity, activity);
    }

    #[test]
    fn fast_read_in_command_mode_issues_one_shot_frame() {
        let mut image = vec![0u8; 0x40];
        image[0x04..0x08].copy_from_slice(&[9, 8, 7, 6]);
        let (mut device, bus_state, _, _) = primary_with_image(&image);

        let format = ReadCommandFormat::quad_output(0x6B, 8);
        let mut buf = [0u8; 4];
        device.fast_read(0x04, &format, &mut buf).unwrap();

        assert_eq!(buf, [9, 8, 7, 6]);
        let state = bus_state.borrow();
        let frame = state.commands.last().unwrap();
        assert_eq!(frame.instruction, 0x6B);
        assert_eq!(frame.dummy_cycles, 8);
        assert_eq!(frame.address, Some(0x04));
    }

    #[test]
    fn fast_read_checks_controller_line_widths() {
        let (mut device, bus_state, _, _) = primary_with_image(&[0u8; 16]);
        bus_state.borrow_mut().widths = BusWidths::SINGLE;

        let format = ReadCommandFormat::quad_output(0x6B, 8);
        let mut buf = [0u8; 4];
        assert_eq!(
            device.fast_read(0, &format, &mut buf),
            Err(Error::ReadError)
        );
        assert_eq!(bus_state.borrow().bus_activity, 0);
    }

    #[test]
    fn fast_read_is_not_available_on_the_serial_transport() {
        let (mut device, _, _) = auxiliary_with_response(&[]);
        let format = ReadCommandFormat::quad_output(0x6B, 8);
        let mut buf = [0u8; 4];
        assert_eq!(
            device.fast_read(0, &format, &mut buf),
            Err(Error::WriteError)
        );
    }

    #[test]
    fn boot_header_is_the_first_two_mapped_words() {
        let mut image = vec![0u8; 16];
        image[0..4].copy_from_slice(&0x2001_0000u32.to_ne_bytes());
        image[4..8].copy_from_slice(&0x9000_0411u32.to_ne_bytes());
        let (mut device, _, _, _) = primary_with_image(&image);
        device.enter_memory_mapped().unwrap();

        let header = BootImageHeader::read_mapped(&device).unwrap();
        assert_eq!(header.stack_top, 0x2001_0000);
        assert_eq!(header.entry, 0x9000_0411);
    }

    #[test]
    fn hand_off_programs_exactly_the_header_values() {
        let mut image = vec![0u8; 16];
        image[0..4].copy_from_slice(&0x0000_AAAAu32.to_ne_bytes());
        image[4..8].copy_from_slice(&0x0000_BBBBu32.to_ne_bytes());
        let (mut device, _, _, _) = primary_with_image(&image);
        device.enter_memory_mapped().unwrap();

        let mut machine = FakeMachine::new();
        let ops = machine.ops();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = boot_application(&mut machine, &device);
        }));
        assert!(result.is_err(), "hand-off must not return");

        let ops = ops.borrow();
        assert_eq!(
            &*ops,
            &[
                MachineOp::ProtectionDisabled,
                MachineOp::CachesDisabled,
                MachineOp::InterruptsDisabled,
                MachineOp::SysTickStopped,
                MachineOp::InterruptControllerQuiesced,
                MachineOp::InterruptsEnabled,
                MachineOp::StackPointer(0x0000_AAAA),
                MachineOp::MainStackSelected,
                MachineOp::VectorTable(MAPPED_BASE),
                MachineOp::Jump(0x0000_BBBB),
            ]
        );
        let jumps = ops
            .iter()
            .filter(|op| matches!(op, MachineOp::Jump(_)))
            .count();
        assert_eq!(jumps, 1);
    }

    #[test]
    fn hand_off_aborts_when_the_header_cannot_be_read() {
        // never entered memory-mapped mode, so the header read fails
        let (device, _, _, _) = primary_with_image(&[0u8; 16]);

        let mut machine = FakeMachine::new();
        let ops = machine.ops();

        let result = boot_application(&mut machine, &device);
        assert_eq!(result.unwrap_err(), Error::ReadError);
        assert!(ops.borrow().is_empty(), "no machine state may be touched");
    }

    #[test]
    fn registry_owns_both_roles() {
        let (primary, _, _, _) = primary_with_image(&[0u8; 16]);
        let (auxiliary, _, _) = auxiliary_with_response(&[]);

        let registry = DeviceRegistry::new(primary, auxiliary);
        assert_eq!(registry.primary.role(), FlashRole::Primary);
        assert_eq!(registry.auxiliary.role(), FlashRole::Auxiliary);
        assert_eq!(registry.primary.mapped_base(), Some(MAPPED_BASE));
        assert_eq!(registry.auxiliary.mapped_base(), None);
        assert_eq!(registry.primary.retry().times, 600_000);
        assert!(registry.primary.retry().delay.is_none());
    }
}
