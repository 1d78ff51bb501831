//! Test harness for bonjour-target unit tests
//!
//! This module provides builders for targets, signatures and address
//! expressions, plus pattern assertions over argument locations.
//!
//! # Example
//!
//! ```rust
//! use bonjour_target::TargetHooks;
//! use bonjour_target::test_harness::*;
//!
//! let target = target_with_arg_regs(2);
//! let layout = target.assign_arguments(&int_signature(3), &[], false);
//!
//! assert_arg_locations(&layout.args, &[
//!     LocPattern::Reg(Pat::Exact(0)),
//!     LocPattern::Reg(Pat::Exact(1)),
//!     LocPattern::Stack(Pat::Exact(0)),
//! ]);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::manual_assert,
    clippy::missing_panics_doc
)]

use crate::abi::FIRST_PSEUDO_REGISTER;
use crate::{
    ArgLocation, Attribute, BonjourTarget, FunctionDecl, FunctionType, RegNo, Rtx, TargetConfig,
    Type,
};

/// The standard bonjour target.
pub fn bonjour() -> BonjourTarget {
    BonjourTarget::new(TargetConfig::bonjour()).expect("bonjour preset is valid")
}

/// A bonjour target passing the first `count` argument words in registers.
pub fn target_with_arg_regs(count: u8) -> BonjourTarget {
    BonjourTarget::new(TargetConfig::bonjour().with_arg_regs(count))
        .expect("argument register count out of range")
}

/// A bonjour target generating position-independent code.
pub fn pic_target() -> BonjourTarget {
    BonjourTarget::new(TargetConfig::bonjour().with_pic(true)).expect("pic config is valid")
}

/// A function taking `count` `int` parameters and returning `int`.
pub fn int_signature(count: usize) -> FunctionType {
    FunctionType::new(vec![Type::I32; count], Type::I32)
}

/// A `void name(void)` declaration carrying the interrupt attribute.
pub fn interrupt_handler(name: &str) -> FunctionDecl {
    FunctionDecl::new(name, FunctionType::new(Vec::new(), Type::Void))
        .with_attribute(Attribute::new("interrupt"))
}

/// Every hard register followed by a handful of pseudos.
pub fn sample_registers() -> impl Iterator<Item = RegNo> {
    (0..FIRST_PSEUDO_REGISTER + 4).map(RegNo)
}

pub fn reg(n: u32) -> Rtx {
    Rtx::reg(RegNo(n))
}

/// `base + offset`
pub fn reg_offset(base: u32, offset: i64) -> Rtx {
    Rtx::plus(reg(base), Rtx::ConstInt(offset))
}

/// `const(symbol + offset)`
pub fn symbol_offset(name: &str, offset: i64) -> Rtx {
    Rtx::constant(Rtx::plus(Rtx::symbol(name), Rtx::ConstInt(offset)))
}

/// Pattern for matching a field value.
#[derive(Debug, Clone, Copy)]
pub enum Pat<T> {
    Any,
    Exact(T),
}

impl<T: PartialEq> Pat<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Pat::Any => true,
            Pat::Exact(expected) => expected == value,
        }
    }
}

/// Pattern for matching one argument location.
#[derive(Debug, Clone, Copy)]
pub enum LocPattern {
    /// Register location starting at the given register number.
    Reg(Pat<u32>),
    /// Stack location at the given offset.
    Stack(Pat<u32>),
    Empty,
}

impl LocPattern {
    pub fn matches(&self, location: &ArgLocation) -> bool {
        match (self, location) {
            (LocPattern::Reg(p), ArgLocation::Register { reg, .. }) => p.matches(&reg.0),
            (LocPattern::Stack(p), ArgLocation::Stack { offset, .. }) => p.matches(offset),
            (LocPattern::Empty, ArgLocation::Empty) => true,
            _ => false,
        }
    }
}

/// Assert that `locations` match `patterns` one for one.
pub fn assert_arg_locations(locations: &[ArgLocation], patterns: &[LocPattern]) {
    if locations.len() != patterns.len() {
        panic!(
            "Expected {} argument locations, got {}:\n{locations:#?}",
            patterns.len(),
            locations.len()
        );
    }
    for (i, (location, pattern)) in locations.iter().zip(patterns).enumerate() {
        if !pattern.matches(location) {
            panic!("Argument {i}: expected {pattern:?}, got {location:?}");
        }
    }
}
