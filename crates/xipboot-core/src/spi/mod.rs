//! Flash command frame model
//!
//! This module provides the vendor-agnostic command descriptor and the
//! per-phase line-width type used to translate driver requests into
//! transport-specific bus transactions.

mod frame;
mod line_width;

pub use frame::{CommandFrame, Direction, ReadCommandFormat, ADDRESS_BYTES};
pub use line_width::LineWidth;
