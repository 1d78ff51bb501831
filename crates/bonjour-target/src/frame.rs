//! Stack frame layout and the offsets used to eliminate the virtual frame registers.
//!
//! ```text
//!   higher addresses
//!   | incoming stack arguments |  <- ap (= sp on entry)
//!   | saved registers          |
//!   +--------------------------+  <- fp, sfp
//!   | locals (+ padding)       |
//!   | outgoing arguments       |
//!   +--------------------------+  <- sp
//!   lower addresses
//! ```
//!
//! Only the registers a function actually needs are saved: the callee-saved
//! registers it uses, `lr` when it makes calls, `fp` when it keeps a frame
//! pointer or allocates it as an ordinary register. Interrupt handlers
//! additionally preserve the call-clobbered registers, since the interrupted
//! code never expected them to change.

use crate::abi::{
    ARG_POINTER_REG, FRAME_POINTER_REG, HARD_FRAME_POINTER_REG, LINK_REG, SAVE_SLOT_SIZE,
    STACK_POINTER_REG,
};
use crate::regs::RegNo;

/// Facts about one function that decide its frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionInfo {
    pub is_interrupt: bool,
    /// Contains no calls.
    pub is_leaf: bool,
    pub frame_pointer_needed: bool,
    /// Hard registers written by the function body.
    pub used_regs: Vec<RegNo>,
    /// Bytes of local variables and spill slots.
    pub locals_size: u32,
    /// Bytes reserved for arguments of calls made by the function.
    pub outgoing_args_size: u32,
}

impl FunctionInfo {
    #[must_use]
    pub fn leaf() -> Self {
        Self {
            is_leaf: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_used_regs(mut self, regs: impl IntoIterator<Item = RegNo>) -> Self {
        self.used_regs.extend(regs);
        self
    }

    #[must_use]
    pub fn with_locals(mut self, bytes: u32) -> Self {
        self.locals_size = bytes;
        self
    }

    #[must_use]
    pub fn with_outgoing_args(mut self, bytes: u32) -> Self {
        self.outgoing_args_size = bytes;
        self
    }

    #[must_use]
    pub fn with_frame_pointer(mut self) -> Self {
        self.frame_pointer_needed = true;
        self
    }

    #[must_use]
    pub fn interrupt(mut self) -> Self {
        self.is_interrupt = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    /// Registers saved by the prologue, in ascending order.
    pub saved_regs: Vec<RegNo>,
    /// Size of the save area, rounded to the stack alignment.
    pub saved_size: u32,
    /// Locals plus the padding that aligns the whole frame.
    pub locals_size: u32,
    pub outgoing_args_size: u32,
    pub frame_pointer_needed: bool,
}

impl FrameLayout {
    /// Lay out the frame of a function.
    ///
    /// # Panics
    ///
    /// Panics if `stack_alignment` is not a power of two. Alignments taken from a
    /// validated [`TargetConfig`](crate::TargetConfig) always are.
    #[must_use]
    pub fn compute(info: &FunctionInfo, stack_alignment: u32) -> Self {
        assert!(
            stack_alignment.is_power_of_two(),
            "stack alignment {stack_alignment} is not a power of two"
        );
        // The caller's fp must survive the call even when this function uses it as a scratch value.
        let mut saved_regs: Vec<RegNo> = info
            .used_regs
            .iter()
            .copied()
            .filter(|r| {
                r.is_callee_saved()
                    || *r == HARD_FRAME_POINTER_REG
                    || (info.is_interrupt && r.is_call_clobbered())
            })
            .collect();

        if info.is_interrupt && !info.is_leaf {
            // Callees may clobber anything the ABI lets them.
            saved_regs.extend((0..STACK_POINTER_REG.0).map(RegNo).filter(|r| r.is_call_clobbered()));
        }
        if info.frame_pointer_needed {
            saved_regs.push(HARD_FRAME_POINTER_REG);
        }
        if !info.is_leaf {
            saved_regs.push(LINK_REG);
        }
        saved_regs.sort_unstable();
        saved_regs.dedup();

        let saved_size = (saved_regs.len() as u32 * SAVE_SLOT_SIZE).next_multiple_of(stack_alignment);
        let outgoing_args_size = info.outgoing_args_size.next_multiple_of(SAVE_SLOT_SIZE);
        let body = (info.locals_size.next_multiple_of(SAVE_SLOT_SIZE) + outgoing_args_size)
            .next_multiple_of(stack_alignment);
        let locals_size = body - outgoing_args_size;

        let layout = Self {
            saved_regs,
            saved_size,
            locals_size,
            outgoing_args_size,
            frame_pointer_needed: info.frame_pointer_needed,
        };
        tracing::debug!(
            saved = layout.saved_regs.len(),
            saved_size = layout.saved_size,
            locals = layout.locals_size,
            outgoing = layout.outgoing_args_size,
            "computed frame layout"
        );
        layout
    }

    /// Bytes between `ap` and `sp` once the prologue has run.
    #[must_use]
    pub fn total_size(&self) -> u32 {
        self.saved_size + self.locals_size + self.outgoing_args_size
    }

    /// Offset such that `from = to + offset`, for any pair of frame registers.
    ///
    /// Returns `None` for registers that are not frame registers.
    #[must_use]
    pub fn offset_between(&self, from: RegNo, to: RegNo) -> Option<i64> {
        Some(self.height_of(from)? - self.height_of(to)?)
    }

    /// Height of a frame register above `sp`.
    fn height_of(&self, reg: RegNo) -> Option<i64> {
        let height = match reg {
            r if r == ARG_POINTER_REG => self.total_size(),
            r if r == HARD_FRAME_POINTER_REG || r == FRAME_POINTER_REG => {
                self.locals_size + self.outgoing_args_size
            }
            r if r == STACK_POINTER_REG => 0,
            _ => return None,
        };
        Some(i64::from(height))
    }

    /// Byte offset of a saved register's slot below `ap`.
    #[must_use]
    pub fn save_slot(&self, reg: RegNo) -> Option<u32> {
        self.saved_regs
            .iter()
            .position(|r| *r == reg)
            .map(|idx| (idx as u32 + 1) * SAVE_SLOT_SIZE)
    }
}
