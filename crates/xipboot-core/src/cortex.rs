//! Cortex-M hardware backing for the machine-control and lock seams
//!
//! Only compiled with the `cortex-m` feature. [`CortexMachine`] stages the
//! stack-pointer and stack-select writes and applies them inside the final
//! jump, since Rust code cannot keep running on the old stack after the MSP
//! is rewritten.

use crate::boot::MachineControl;
use crate::bus::BusLock;
use crate::device::RetryPolicy;

/// SHCSR bit enabling the memory-management fault handler
const SHCSR_MEMFAULTENA: u32 = 1 << 16;

/// Number of interrupt-controller register banks to mask and clear
const NVIC_BANKS: usize = 8;

/// Machine control backed by the Cortex-M core peripherals
pub struct CortexMachine {
    peripherals: cortex_m::Peripherals,
    staged_stack_top: u32,
    staged_control: u32,
}

impl CortexMachine {
    /// Take ownership of the core peripherals
    pub fn new(peripherals: cortex_m::Peripherals) -> Self {
        Self {
            peripherals,
            staged_stack_top: 0,
            staged_control: 0,
        }
    }
}

impl MachineControl for CortexMachine {
    fn disable_protection(&mut self) {
        cortex_m::asm::dmb();
        unsafe {
            let shcsr = self.peripherals.SCB.shcsr.read();
            self.peripherals.SCB.shcsr.write(shcsr & !SHCSR_MEMFAULTENA);
            self.peripherals.MPU.ctrl.write(0);
        }
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    fn disable_caches(&mut self) {
        self.peripherals.SCB.disable_dcache(&mut self.peripherals.CPUID);
        self.peripherals.SCB.disable_icache();
    }

    fn disable_interrupts(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn enable_interrupts(&mut self) {
        unsafe { cortex_m::interrupt::enable() }
    }

    fn stop_sys_tick(&mut self) {
        unsafe {
            self.peripherals.SYST.csr.write(0);
            self.peripherals.SYST.rvr.write(0);
            self.peripherals.SYST.cvr.write(0);
        }
    }

    fn quiesce_interrupt_controller(&mut self) {
        for bank in 0..NVIC_BANKS {
            unsafe {
                self.peripherals.NVIC.icer[bank].write(0xFFFF_FFFF);
                self.peripherals.NVIC.icpr[bank].write(0xFFFF_FFFF);
            }
        }
    }

    fn set_stack_pointer(&mut self, stack_top: u32) {
        self.staged_stack_top = stack_top;
    }

    fn select_main_stack(&mut self) {
        // CONTROL = 0: main stack, privileged
        self.staged_control = 0;
    }

    fn set_vector_table(&mut self, base: u32) {
        unsafe { self.peripherals.SCB.vtor.write(base) }
    }

    #[cfg(target_arch = "arm")]
    fn jump(&mut self, entry: u32) -> ! {
        unsafe {
            core::arch::asm!(
                "msr CONTROL, {control}",
                "isb",
                "msr MSP, {stack_top}",
                "bx {entry}",
                control = in(reg) self.staged_control,
                stack_top = in(reg) self.staged_stack_top,
                entry = in(reg) entry,
                options(noreturn),
            )
        }
    }

    #[cfg(not(target_arch = "arm"))]
    fn jump(&mut self, _entry: u32) -> ! {
        unreachable!("application jump requires the Cortex-M target")
    }
}

/// Transaction lock that masks interrupt delivery
///
/// Guards against interrupt-handler reentrancy into the bus controller;
/// there are no threads in this system. Matches the exclusion the original
/// target used around every flash transaction.
pub struct IrqMaskLock;

impl BusLock for IrqMaskLock {
    fn enter(&mut self) {
        cortex_m::interrupt::disable();
    }

    fn exit(&mut self) {
        unsafe { cortex_m::interrupt::enable() }
    }
}

/// Blocking delay of roughly 100 microseconds for [`RetryPolicy`]
pub fn retry_delay_100us() {
    cortex_m::asm::delay(2400);
}

/// Retry budget matching the reference target: ~60 seconds of ~100 us polls
pub fn default_retry_policy() -> RetryPolicy {
    RetryPolicy::new(retry_delay_100us, 600_000)
}
