//! Machine modes: the width and representation of a value as seen by the backend.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Bytes in a machine word (`word_mode`).
pub const UNITS_PER_WORD: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineMode {
    /// No value. Used for `void` returns and mode-less constants.
    Void,
    /// Block of memory with no fixed register representation.
    Blk,
    /// 8-bit integer.
    QI,
    /// 16-bit integer.
    HI,
    /// 32-bit integer.
    SI,
    /// 64-bit integer.
    DI,
    /// 32-bit float.
    SF,
    /// 64-bit float.
    DF,
    /// Condition code.
    CC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeClass {
    Int,
    Float,
    Cc,
    Random,
}

impl MachineMode {
    /// Mode used for pointers and addresses.
    pub const POINTER: Self = Self::SI;
    /// Mode of one machine word.
    pub const WORD: Self = Self::SI;

    pub const ALL: [Self; 9] = [
        Self::Void,
        Self::Blk,
        Self::QI,
        Self::HI,
        Self::SI,
        Self::DI,
        Self::SF,
        Self::DF,
        Self::CC,
    ];

    /// Size in bytes. `Blk` has no fixed size and reports 0, like `Void`.
    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            Self::Void | Self::Blk => 0,
            Self::QI => 1,
            Self::HI => 2,
            Self::SI | Self::SF | Self::CC => 4,
            Self::DI | Self::DF => 8,
        }
    }

    #[must_use]
    pub const fn class(self) -> ModeClass {
        match self {
            Self::QI | Self::HI | Self::SI | Self::DI => ModeClass::Int,
            Self::SF | Self::DF => ModeClass::Float,
            Self::CC => ModeClass::Cc,
            Self::Void | Self::Blk => ModeClass::Random,
        }
    }

    /// Number of consecutive hard registers a value of this mode occupies.
    #[must_use]
    pub const fn nregs(self) -> u32 {
        if self.size() == 0 {
            1
        } else {
            self.size().div_ceil(UNITS_PER_WORD)
        }
    }

    /// Integer mode with exactly `bytes` bytes, if any.
    #[must_use]
    pub const fn int_for_size(bytes: u32) -> Option<Self> {
        match bytes {
            1 => Some(Self::QI),
            2 => Some(Self::HI),
            4 => Some(Self::SI),
            8 => Some(Self::DI),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "VOID",
            Self::Blk => "BLK",
            Self::QI => "QI",
            Self::HI => "HI",
            Self::SI => "SI",
            Self::DI => "DI",
            Self::SF => "SF",
            Self::DF => "DF",
            Self::CC => "CC",
        }
    }
}

impl fmt::Display for MachineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MachineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().trim_end_matches("mode").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == upper)
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_nregs() {
        assert_eq!(MachineMode::QI.size(), 1);
        assert_eq!(MachineMode::DI.size(), 8);
        assert_eq!(MachineMode::QI.nregs(), 1);
        assert_eq!(MachineMode::SI.nregs(), 1);
        assert_eq!(MachineMode::DF.nregs(), 2);
        assert_eq!(MachineMode::Void.nregs(), 1);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("si".parse::<MachineMode>(), Ok(MachineMode::SI));
        assert_eq!("DImode".parse::<MachineMode>(), Ok(MachineMode::DI));
        assert!(matches!(
            "XF".parse::<MachineMode>(),
            Err(Error::UnknownMode(_))
        ));
    }

    #[test]
    fn test_int_for_size() {
        assert_eq!(MachineMode::int_for_size(2), Some(MachineMode::HI));
        assert_eq!(MachineMode::int_for_size(3), None);
    }
}
