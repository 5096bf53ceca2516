//! xipboot-core - Flash transport and boot hand-off core
//!
//! This crate implements the stage-1 bootloader core for a microcontroller
//! that executes its application out of external serial NOR flash via
//! memory-mapped (execute-in-place) access. It provides:
//!
//! - A vendor-agnostic flash command model ([`spi::CommandFrame`]) and its
//!   translation onto a quad-I/O memory-map-capable bus or a plain serial bus
//! - The transaction engine owning chip select and the critical-section lock
//! - The mutually exclusive command / memory-mapped mode switch for the quad
//!   transport
//! - The non-returning hand-off of CPU control to the application image
//!   resident in mapped flash
//!
//! Erase/program algorithms and chip detection belong to the external flash
//! driver; this crate only exposes the transaction entry points and the
//! [`device::RetryPolicy`] budget that driver consumes.
//!
//! # Example
//!
//! ```ignore
//! use xipboot_core::device::{FlashDevice, RetryPolicy};
//! use xipboot_core::spi::ReadCommandFormat;
//!
//! let mut primary = FlashDevice::primary(quad_bus, 0x9000_0000, lock, RetryPolicy::default());
//! primary.set_read_format(ReadCommandFormat::quad_output(0x6B, 8));
//! primary.enter_memory_mapped()?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod boot;
pub mod bus;
#[cfg(feature = "cortex-m")]
pub mod cortex;
pub mod device;
pub mod error;
mod mmap;
pub mod spi;
mod transport;

pub use error::{Error, Result};
pub use transport::{DUMMY_DATA, SERIAL_SCRATCH_BYTES};
