//! Argument passing: the per-call-site accumulator and the locations it assigns.
//!
//! Rules:
//! - Named arguments take the next argument registers (a0 upwards) when all their
//!   words fit. Double-word arguments start on an even register; a skipped odd
//!   register is not back-filled.
//! - The first argument that does not fit goes to the stack, and every later
//!   argument follows it there.
//! - Unnamed (variadic) arguments always go on the stack.
//! - Aggregates larger than [`MAX_REGISTER_AGGREGATE`] bytes are passed as a pointer.

use crate::abi::{FIRST_ARG_REG, MAX_REGISTER_AGGREGATE};
use crate::config::TargetConfig;
use crate::mode::{MachineMode, UNITS_PER_WORD};
use crate::regs::RegNo;
use crate::tree::{FunctionType, Type};

/// One argument as seen at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgInfo {
    pub ty: Type,
    /// `false` for arguments matched by `...`.
    pub named: bool,
}

impl ArgInfo {
    #[must_use]
    pub fn named(ty: Type) -> Self {
        Self { ty, named: true }
    }

    #[must_use]
    pub fn unnamed(ty: Type) -> Self {
        Self { ty, named: false }
    }
}

/// Where an argument lives at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgLocation {
    /// Held in `reg` (and `reg + 1` for double-word modes).
    Register {
        reg: RegNo,
        mode: MachineMode,
        by_reference: bool,
    },
    /// Stored at `offset` bytes above the stack pointer at the call.
    Stack {
        offset: u32,
        size: u32,
        by_reference: bool,
    },
    /// Zero-sized; occupies nothing.
    Empty,
}

impl ArgLocation {
    #[must_use]
    pub fn register(&self) -> Option<RegNo> {
        match self {
            Self::Register { reg, .. } => Some(*reg),
            _ => None,
        }
    }

    /// Every hard register the argument occupies.
    #[must_use]
    pub fn registers(&self) -> Vec<RegNo> {
        match *self {
            Self::Register { reg, mode, .. } => (0..mode.nregs()).map(|i| RegNo(reg.0 + i)).collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_stack(&self) -> bool {
        matches!(self, Self::Stack { .. })
    }
}

/// Calling convention state threaded through the arguments of one call.
///
/// Created by `init_cumulative_args`, advanced once per argument in order, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeArgs {
    /// Argument registers the convention provides.
    available_regs: u8,
    /// Argument registers consumed so far, including alignment padding.
    regs_used: u8,
    /// Bytes of outgoing stack arguments consumed so far.
    stack_bytes: u32,
    /// Arguments classified so far.
    args_seen: usize,
    libcall: bool,
    /// Number of named parameters when the callee is variadic.
    named_params: Option<usize>,
}

impl CumulativeArgs {
    /// Starting point for a call: no registers and no stack consumed.
    #[must_use]
    pub fn new(config: &TargetConfig, fntype: Option<&FunctionType>, libcall: bool) -> Self {
        Self {
            available_regs: config.arg_regs(),
            regs_used: 0,
            stack_bytes: 0,
            args_seen: 0,
            libcall,
            named_params: fntype.filter(|f| f.variadic).map(|f| f.params.len()),
        }
    }

    #[must_use]
    pub fn regs_used(&self) -> u8 {
        self.regs_used
    }

    #[must_use]
    pub fn stack_bytes(&self) -> u32 {
        self.stack_bytes
    }

    #[must_use]
    pub fn args_seen(&self) -> usize {
        self.args_seen
    }

    #[must_use]
    pub fn is_libcall(&self) -> bool {
        self.libcall
    }

    /// Whether the next argument falls into the variadic part of a known prototype.
    #[must_use]
    pub fn next_is_unnamed(&self) -> bool {
        self.named_params.is_some_and(|n| self.args_seen >= n)
    }

    /// Location of `arg` if it were the next argument. Does not consume anything.
    #[must_use]
    pub fn peek(&self, arg: &ArgInfo, stack_alignment: u32) -> ArgLocation {
        self.place(arg, stack_alignment).0
    }

    /// Assign `arg` to its location and move past it.
    pub fn advance(&mut self, arg: &ArgInfo, stack_alignment: u32) -> ArgLocation {
        let (location, next) = self.place(arg, stack_alignment);
        self.regs_used = next.regs_used;
        self.stack_bytes = next.stack_bytes;
        self.args_seen += 1;
        tracing::debug!(
            arg = self.args_seen - 1,
            ty = ?arg.ty,
            ?location,
            "assigned argument"
        );
        location
    }

    fn place(&self, arg: &ArgInfo, stack_alignment: u32) -> (ArgLocation, Cursor) {
        let cursor = Cursor {
            regs_used: self.regs_used,
            stack_bytes: self.stack_bytes,
        };

        let by_reference = pass_by_reference(&arg.ty);
        let (size, align) = if by_reference {
            (MachineMode::POINTER.size(), MachineMode::POINTER.size())
        } else {
            (arg.ty.size(), arg.ty.align())
        };
        if size == 0 {
            return (ArgLocation::Empty, cursor);
        }

        let words = size.div_ceil(UNITS_PER_WORD);
        let named = arg.named && !self.next_is_unnamed();

        if named && words <= 2 {
            let mut start = u32::from(cursor.regs_used);
            if words == 2 && start % 2 == 1 {
                start += 1;
            }
            if start + words <= u32::from(self.available_regs) {
                let location = ArgLocation::Register {
                    reg: RegNo(FIRST_ARG_REG.0 + start),
                    mode: register_mode(&arg.ty, by_reference, words),
                    by_reference,
                };
                let next = Cursor {
                    regs_used: (start + words) as u8,
                    stack_bytes: cursor.stack_bytes,
                };
                return (location, next);
            }
        }

        let slot_align = if align >= 8 { stack_alignment.min(8) } else { UNITS_PER_WORD };
        let offset = cursor.stack_bytes.next_multiple_of(slot_align);
        let location = ArgLocation::Stack {
            offset,
            size,
            by_reference,
        };
        // No back-fill: once an argument is on the stack, the rest follow.
        let next = Cursor {
            regs_used: self.available_regs,
            stack_bytes: offset + size.next_multiple_of(UNITS_PER_WORD),
        };
        (location, next)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    regs_used: u8,
    stack_bytes: u32,
}

/// Aggregates too large for a register pair are passed as a pointer to a copy.
#[must_use]
pub fn pass_by_reference(ty: &Type) -> bool {
    ty.is_aggregate() && ty.size() > MAX_REGISTER_AGGREGATE
}

/// Mode an argument takes inside its register(s).
fn register_mode(ty: &Type, by_reference: bool, words: u32) -> MachineMode {
    if by_reference {
        return MachineMode::POINTER;
    }
    match ty.mode() {
        // Sub-word integers are widened to a full register.
        MachineMode::QI | MachineMode::HI => MachineMode::WORD,
        MachineMode::Blk | MachineMode::Void | MachineMode::CC => {
            if words == 2 {
                MachineMode::DI
            } else {
                MachineMode::WORD
            }
        }
        mode => mode,
    }
}

/// Locations for every argument of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLayout {
    pub args: Vec<ArgLocation>,
    /// Outgoing stack argument bytes, rounded to the stack alignment.
    pub stack_bytes: u32,
    pub regs_used: u8,
}
