//! Flash device model and registry
//!
//! Exactly two devices exist in this system: the primary flash on the quad
//! memory-map-capable controller (the one the application executes from) and
//! the auxiliary flash on the plain serial controller. Both are created once
//! at system init and live for the life of the bootloader.

use core::fmt;

use crate::bus::{BusLock, ChipSelect, NoBus, QuadBus, SerialBus};
use crate::spi::ReadCommandFormat;

/// Role of a flash device in the boot process
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashRole {
    /// Quad-bound device holding the application image
    Primary,
    /// Serial-bound data flash
    Auxiliary,
}

impl fmt::Display for FlashRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary flash"),
            Self::Auxiliary => write!(f, "auxiliary flash"),
        }
    }
}

/// Retry budget consumed by the external flash driver
///
/// The core never retries; it only carries this record for the driver, which
/// polls busy flags `times` times with `delay` between polls.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Zero-argument blocking delay of a fixed small duration (about 100 us
    /// on the reference target); `None` means poll back-to-back
    pub delay: Option<fn()>,
    /// Maximum retry count
    pub times: u32,
}

impl RetryPolicy {
    /// Create a policy with an explicit delay and count
    pub const fn new(delay: fn(), times: u32) -> Self {
        Self {
            delay: Some(delay),
            times,
        }
    }
}

impl Default for RetryPolicy {
    /// 600 000 polls, back-to-back; install a ~100 us delay to stretch the
    /// budget to about 60 seconds
    fn default() -> Self {
        Self {
            delay: None,
            times: 600_000,
        }
    }
}

/// The physical bus a device is bound to
///
/// A tagged variant rather than a shared-field union: the quad binding
/// carries the base address of the mapped window alongside its controller,
/// the serial binding carries only its controller.
pub enum TransportBinding<Q, S> {
    /// Quad memory-map-capable controller
    Quad {
        /// Bus controller handle
        bus: Q,
        /// Base address of the memory-mapped window
        mapped_base: u32,
    },
    /// Plain full-duplex serial controller
    Serial {
        /// Bus controller handle
        bus: S,
    },
}

/// One flash device: a binding, an optional discrete chip select, the
/// transaction lock, and the driver-facing configuration records
///
/// Immutable after init except for the bus controller's own mode state.
pub struct FlashDevice<Q, S, C, L> {
    role: FlashRole,
    pub(crate) binding: TransportBinding<Q, S>,
    pub(crate) cs: Option<C>,
    pub(crate) lock: L,
    read_format: Option<ReadCommandFormat>,
    retry: RetryPolicy,
}

impl<Q: QuadBus, C: ChipSelect, L: BusLock> FlashDevice<Q, NoBus, C, L> {
    /// Create the primary device on a quad controller
    ///
    /// `mapped_base` is both the base of the memory-mapped window and, at
    /// hand-off time, the application's vector-table base.
    pub fn primary(bus: Q, mapped_base: u32, lock: L, retry: RetryPolicy) -> Self {
        Self {
            role: FlashRole::Primary,
            binding: TransportBinding::Quad { bus, mapped_base },
            cs: None,
            lock,
            read_format: None,
            retry,
        }
    }
}

impl<S: SerialBus, C: ChipSelect, L: BusLock> FlashDevice<NoBus, S, C, L> {
    /// Create the auxiliary device on a serial controller
    pub fn auxiliary(bus: S, lock: L, retry: RetryPolicy) -> Self {
        Self {
            role: FlashRole::Auxiliary,
            binding: TransportBinding::Serial { bus },
            cs: None,
            lock,
            read_format: None,
            retry,
        }
    }
}

impl<Q, S, C, L> FlashDevice<Q, S, C, L> {
    /// Attach a discrete chip-select line
    ///
    /// Without one, chip select is assumed to be managed by the controller
    /// hardware.
    pub fn with_chip_select(mut self, cs: C) -> Self {
        self.cs = Some(cs);
        self
    }

    /// Install the fast-read command format
    ///
    /// Chosen by the external driver once it knows the chip (for example a
    /// 1-1-4 fast read). Memory-mapped entry requires it.
    pub fn set_read_format(&mut self, format: ReadCommandFormat) {
        self.read_format = Some(format);
    }

    /// The installed fast-read command format, if any
    pub fn read_format(&self) -> Option<&ReadCommandFormat> {
        self.read_format.as_ref()
    }

    /// Role of this device
    pub fn role(&self) -> FlashRole {
        self.role
    }

    /// Retry budget for the external driver
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Base address of the memory-mapped window (quad binding only)
    pub fn mapped_base(&self) -> Option<u32> {
        match &self.binding {
            TransportBinding::Quad { mapped_base, .. } => Some(*mapped_base),
            TransportBinding::Serial { .. } => None,
        }
    }

    /// The transport binding
    pub fn binding(&self) -> &TransportBinding<Q, S> {
        &self.binding
    }
}

/// Primary device shorthand: quad binding, no serial side
pub type PrimaryDevice<Q, C, L> = FlashDevice<Q, NoBus, C, L>;

/// Auxiliary device shorthand: serial binding, no quad side
pub type AuxiliaryDevice<S, C, L> = FlashDevice<NoBus, S, C, L>;

/// The system's flash devices, built once at init and owned by the boot
/// process
///
/// An explicit registry instead of module-level device tables; there is no
/// hidden global state.
pub struct DeviceRegistry<P, A> {
    /// Primary (quad, execute-in-place) device
    pub primary: P,
    /// Auxiliary (serial) device
    pub auxiliary: A,
}

impl<P, A> DeviceRegistry<P, A> {
    /// Build the registry from the two initialized devices
    pub fn new(primary: P, auxiliary: A) -> Self {
        Self { primary, auxiliary }
    }
}
