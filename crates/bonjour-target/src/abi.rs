//! Bonjour ABI constants (Registers, Frame Layout, Addressing).
//!
//! This module centralizes the register file and frame conventions so that
//! the hooks, the frame layout and the tests agree on one definition.

use crate::regs::RegNo;

// ── Register Assignments ──

/// First argument register (a0).
/// Also holds the return value, or the low word of a double-word return.
pub const FIRST_ARG_REG: RegNo = RegNo(0);

/// Maximum number of registers the ABI can dedicate to argument passing (a0-a3).
pub const MAX_ARG_REGS: u8 = 4;

/// Return value register (a0).
pub const RETURN_VALUE_REG: RegNo = RegNo(0);

/// First callee-saved register (s0).
pub const FIRST_CALLEE_SAVED_REG: RegNo = RegNo(4);

/// Last callee-saved register (s7).
pub const LAST_CALLEE_SAVED_REG: RegNo = RegNo(11);

/// Intra-procedure scratch register (ip).
/// Call-clobbered and never used for arguments.
pub const SCRATCH_REG: RegNo = RegNo(12);

/// Hard frame pointer (fp).
pub const HARD_FRAME_POINTER_REG: RegNo = RegNo(13);

/// Link register (lr).
/// Holds the return address after a call.
pub const LINK_REG: RegNo = RegNo(14);

/// Stack pointer (sp).
/// Points to the lowest allocated byte of the stack (grows downwards).
pub const STACK_POINTER_REG: RegNo = RegNo(15);

/// Soft frame pointer (sfp).
/// Virtual register addressing locals; always eliminated to fp or sp.
pub const FRAME_POINTER_REG: RegNo = RegNo(16);

/// Argument pointer (ap).
/// Virtual register addressing incoming stack arguments; always eliminated.
pub const ARG_POINTER_REG: RegNo = RegNo(17);

/// Number of hard registers; every higher number is a pseudo.
pub const FIRST_PSEUDO_REGISTER: u32 = 18;

/// Last register that may start a double-word value.
/// r10:r11 is the highest pair that stays inside the allocatable registers.
pub const LAST_PAIR_START_REG: RegNo = RegNo(10);

/// Registers that may be eliminated, with the registers they may be eliminated to,
/// in order of preference.
pub const ELIMINABLE_REGS: [(RegNo, RegNo); 4] = [
    (ARG_POINTER_REG, STACK_POINTER_REG),
    (ARG_POINTER_REG, HARD_FRAME_POINTER_REG),
    (FRAME_POINTER_REG, STACK_POINTER_REG),
    (FRAME_POINTER_REG, HARD_FRAME_POINTER_REG),
];

// ── Stack Frame Layout ──

/// Bytes per saved register slot.
pub const SAVE_SLOT_SIZE: u32 = 4;

/// Default stack alignment at call boundaries, in bytes.
pub const DEFAULT_STACK_ALIGNMENT: u32 = 8;

// ── Addressing ──

/// Smallest displacement encodable in a `reg + const` address.
pub const MIN_DISPLACEMENT: i64 = -2048;

/// Largest displacement encodable in a `reg + const` address.
pub const MAX_DISPLACEMENT: i64 = 2047;

/// Largest absolute address reachable without a base register.
pub const MAX_ABSOLUTE_ADDRESS: i64 = 4095;

/// Name of the declaration attribute that marks interrupt handlers.
pub const INTERRUPT_ATTRIBUTE: &str = "interrupt";

/// Aggregates larger than this many bytes are passed by reference
/// and returned in memory.
pub const MAX_REGISTER_AGGREGATE: u32 = 8;
