//! Per-phase bus line widths

use crate::error::{Error, Result};

/// Number of bus lines a single transaction phase is driven on
///
/// Each of the instruction, address and data phases carries its own width.
/// `None` means the phase is absent from the transaction entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineWidth {
    /// Phase is not present on the bus
    #[default]
    None,
    /// 1 line (classic serial)
    Single,
    /// 2 lines
    Dual,
    /// 4 lines
    Quad,
    /// 8 lines
    Octal,
}

impl LineWidth {
    /// Map a raw line count to a width
    ///
    /// The mapping is total over {0, 1, 2, 4, 8}; every other value is an
    /// input-validation failure, never a silent default.
    pub const fn from_lines(lines: u8) -> Result<Self> {
        match lines {
            0 => Ok(Self::None),
            1 => Ok(Self::Single),
            2 => Ok(Self::Dual),
            4 => Ok(Self::Quad),
            8 => Ok(Self::Octal),
            _ => Err(Error::ReadError),
        }
    }

    /// Returns the number of bus lines
    pub const fn lines(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Dual => 2,
            Self::Quad => 4,
            Self::Octal => 8,
        }
    }

    /// Returns true if the phase is present on the bus
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_total_over_valid_line_counts() {
        assert_eq!(LineWidth::from_lines(0), Ok(LineWidth::None));
        assert_eq!(LineWidth::from_lines(1), Ok(LineWidth::Single));
        assert_eq!(LineWidth::from_lines(2), Ok(LineWidth::Dual));
        assert_eq!(LineWidth::from_lines(4), Ok(LineWidth::Quad));
        assert_eq!(LineWidth::from_lines(8), Ok(LineWidth::Octal));
    }

    #[test]
    fn mapping_is_injective() {
        let widths = [0u8, 1, 2, 4, 8].map(|n| LineWidth::from_lines(n).unwrap());
        for (i, a) in widths.iter().enumerate() {
            for b in &widths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn invalid_line_counts_are_rejected() {
        for lines in [3u8, 5, 6, 7, 9, 16, 255] {
            assert_eq!(LineWidth::from_lines(lines), Err(Error::ReadError));
        }
    }

    #[test]
    fn round_trips_through_lines() {
        for lines in [0u8, 1, 2, 4, 8] {
            assert_eq!(LineWidth::from_lines(lines).unwrap().lines(), lines);
        }
    }
}
