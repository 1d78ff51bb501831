//! Register numbers, names and classes.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::abi::{
    ARG_POINTER_REG, FIRST_CALLEE_SAVED_REG, FIRST_PSEUDO_REGISTER, FRAME_POINTER_REG,
    LAST_CALLEE_SAVED_REG, LINK_REG, SCRATCH_REG, STACK_POINTER_REG,
};

/// A register number as used by the middle-end.
///
/// Numbers below [`FIRST_PSEUDO_REGISTER`] name hard registers; anything
/// above is a pseudo created during lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegNo(pub u32);

/// Assembler names of the hard registers, indexed by register number.
pub const REG_NAMES: [&str; FIRST_PSEUDO_REGISTER as usize] = [
    "a0", "a1", "a2", "a3", // r0-r3
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", // r4-r11
    "ip", "fp", "lr", "sp", // r12-r15
    "sfp", "ap", // virtual
];

impl RegNo {
    #[must_use]
    pub const fn is_hard(self) -> bool {
        self.0 < FIRST_PSEUDO_REGISTER
    }

    #[must_use]
    pub const fn is_pseudo(self) -> bool {
        !self.is_hard()
    }

    /// The soft frame pointer and argument pointer, which never survive register allocation.
    #[must_use]
    pub const fn is_virtual_frame(self) -> bool {
        self.0 == FRAME_POINTER_REG.0 || self.0 == ARG_POINTER_REG.0
    }

    /// Registers a callee must preserve (s0-s7).
    #[must_use]
    pub const fn is_callee_saved(self) -> bool {
        self.0 >= FIRST_CALLEE_SAVED_REG.0 && self.0 <= LAST_CALLEE_SAVED_REG.0
    }

    /// Hard registers a call may clobber: a0-a3, ip and lr.
    #[must_use]
    pub const fn is_call_clobbered(self) -> bool {
        self.0 < FIRST_CALLEE_SAVED_REG.0 || self.0 == SCRATCH_REG.0 || self.0 == LINK_REG.0
    }

    /// Registers never handed out by the allocator.
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        self.0 == STACK_POINTER_REG.0 || self.is_virtual_frame()
    }

    /// Assembler name for hard registers, `None` for pseudos.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        REG_NAMES.get(self.0 as usize).copied()
    }

    /// Look a register up by assembler name (`sp`), number (`r15`) or pseudo (`%20`).
    pub fn from_name(name: &str) -> crate::Result<Self> {
        let name = name.trim();
        if let Some(idx) = REG_NAMES.iter().position(|n| *n == name) {
            return Ok(Self(idx as u32));
        }
        if let Some(num) = name.strip_prefix('r')
            && let Ok(n) = num.parse::<u32>()
            && n < FIRST_PSEUDO_REGISTER
        {
            return Ok(Self(n));
        }
        if let Some(num) = name.strip_prefix('%')
            && let Ok(n) = num.parse::<u32>()
        {
            return Ok(Self(n));
        }
        Err(Error::UnknownRegister(name.to_string()))
    }
}

impl fmt::Display for RegNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "%{}", self.0),
        }
    }
}

impl FromStr for RegNo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Register classes, ordered from smallest to largest.
///
/// Each class contains every class before it: `NoRegs ⊂ ArgRegs ⊂ GeneralRegs ⊂ AllRegs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegisterClass {
    NoRegs,
    /// Registers that carry arguments under the configured calling convention.
    ArgRegs,
    /// Registers usable for any integer or floating value.
    GeneralRegs,
    /// General registers plus the virtual frame registers.
    AllRegs,
}

impl RegisterClass {
    pub const ALL: [Self; 4] = [Self::NoRegs, Self::ArgRegs, Self::GeneralRegs, Self::AllRegs];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoRegs => "NO_REGS",
            Self::ArgRegs => "ARG_REGS",
            Self::GeneralRegs => "GENERAL_REGS",
            Self::AllRegs => "ALL_REGS",
        }
    }

    #[must_use]
    pub fn is_subset_of(self, other: Self) -> bool {
        self <= other
    }
}

impl fmt::Display for RegisterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_from_name() {
        assert_eq!(RegNo::from_name("sp"), Ok(STACK_POINTER_REG));
        assert_eq!(RegNo::from_name("r14"), Ok(LINK_REG));
        assert_eq!(RegNo::from_name("ap"), Ok(ARG_POINTER_REG));
        assert_eq!(RegNo::from_name("%42"), Ok(RegNo(42)));
        assert!(RegNo::from_name("r18").is_err());
        assert!(RegNo::from_name("x0").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RegNo(0).to_string(), "a0");
        assert_eq!(RegNo(16).to_string(), "sfp");
        assert_eq!(RegNo(18).to_string(), "%18");
    }

    #[test]
    fn test_pseudo_boundary() {
        assert!(RegNo(17).is_hard());
        assert!(RegNo(18).is_pseudo());
        assert!(FRAME_POINTER_REG.is_virtual_frame());
        assert!(!STACK_POINTER_REG.is_virtual_frame());
    }

    #[test]
    fn test_save_sets_are_disjoint() {
        for n in 0..FIRST_PSEUDO_REGISTER {
            let reg = RegNo(n);
            assert!(
                !(reg.is_callee_saved() && reg.is_call_clobbered()),
                "{reg} is both callee-saved and call-clobbered"
            );
        }
        assert!(RegNo(4).is_callee_saved());
        assert!(RegNo(11).is_callee_saved());
        assert!(SCRATCH_REG.is_call_clobbered());
        assert!(LINK_REG.is_call_clobbered());
        assert!(!STACK_POINTER_REG.is_call_clobbered());
        assert!(STACK_POINTER_REG.is_fixed());
    }

    #[test]
    fn test_class_nesting() {
        assert!(RegisterClass::NoRegs.is_subset_of(RegisterClass::ArgRegs));
        assert!(RegisterClass::GeneralRegs.is_subset_of(RegisterClass::AllRegs));
        assert!(!RegisterClass::AllRegs.is_subset_of(RegisterClass::GeneralRegs));
    }
}
