//! The target hook interface the middle-end lowers against.
//!
//! A backend is selected once with [`target_by_name`] and then shared by
//! reference; every hook takes `&self`, so one descriptor can serve any
//! number of lowering contexts.

use crate::bonjour::BonjourTarget;
use crate::callconv::{ArgInfo, ArgLocation, CallLayout, CumulativeArgs};
use crate::config::TargetConfig;
use crate::frame::{FrameLayout, FunctionInfo};
use crate::mode::MachineMode;
use crate::regs::{RegNo, RegisterClass};
use crate::rtx::Rtx;
use crate::tree::{FunctionDecl, FunctionType, Type};
use crate::{Error, Result};

/// Architectures this crate can describe.
pub const TARGET_NAMES: [&str; 1] = ["bonjour"];

/// Where a function's return value is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLocation {
    pub reg: RegNo,
    /// Mode of the value in `reg`, after promotion.
    pub mode: MachineMode,
    /// The value itself lives in memory and `reg` holds its address.
    pub in_memory: bool,
}

/// Machine-specific answers consulted while lowering and allocating registers.
pub trait TargetHooks: Send + Sync {
    fn name(&self) -> &'static str;

    fn config(&self) -> &TargetConfig;

    /// Whether `decl` uses the interrupt-handler entry and return sequence.
    fn is_interrupt_function(&self, decl: &FunctionDecl) -> bool;

    /// Offset between `from` and `to` once `from` is eliminated: `from = to + offset`.
    ///
    /// Fails with [`Error::UnsupportedElimination`] for pairs the backend does not eliminate.
    fn elimination_offset(&self, frame: &FrameLayout, from: RegNo, to: RegNo) -> Result<i64>;

    /// Whether eliminating `from` into `to` is allowed in the current function.
    fn can_eliminate(&self, from: RegNo, to: RegNo, frame_pointer_needed: bool) -> bool;

    /// Fresh argument state for one call. `fntype` is `None` when the prototype is unknown.
    fn init_cumulative_args(&self, fntype: Option<&FunctionType>, libcall: bool) -> CumulativeArgs;

    /// Location of the next argument. Does not advance `cum`.
    fn function_arg(&self, cum: &CumulativeArgs, arg: &ArgInfo) -> ArgLocation;

    /// Consume `arg` from `cum`.
    fn function_arg_advance(&self, cum: &mut CumulativeArgs, arg: &ArgInfo);

    /// Whether `regno` can ever carry an argument.
    fn is_arg_register(&self, regno: RegNo) -> bool;

    /// Whether a value of `mode` may live in `regno` (and the registers after it).
    fn reg_mode_ok(&self, regno: RegNo, mode: MachineMode) -> bool;

    /// Smallest class containing `regno`; `NoRegs` for anything the backend does not know.
    fn reg_class_of(&self, regno: RegNo) -> RegisterClass;

    /// Location of a value of type `ret` returned by a call.
    ///
    /// `outgoing` is true when asking from inside the callee.
    fn function_value(&self, ret: &Type, callee: Option<&FunctionType>, outgoing: bool) -> ValueLocation;

    fn return_in_memory(&self, ty: &Type) -> bool;

    fn pass_by_reference(&self, ty: &Type) -> bool;

    /// Whether `x` can be used as-is in position-independent code.
    fn is_legitimate_pic_operand(&self, x: &Rtx) -> bool;

    /// Whether `x` is a valid memory address for an access of `mode`.
    ///
    /// `strict` is set after register allocation, when only hard registers may appear.
    fn is_legitimate_address(&self, mode: MachineMode, x: &Rtx, strict: bool) -> bool;

    fn frame_layout(&self, info: &FunctionInfo) -> FrameLayout {
        FrameLayout::compute(info, self.config().stack_alignment())
    }

    /// Classify every argument of a call in order.
    ///
    /// `extra` are the arguments passed through `...` of a variadic `fntype`.
    fn assign_arguments(&self, fntype: &FunctionType, extra: &[Type], libcall: bool) -> CallLayout {
        let mut cum = self.init_cumulative_args(Some(fntype), libcall);
        let args = fntype
            .params
            .iter()
            .cloned()
            .map(ArgInfo::named)
            .chain(extra.iter().cloned().map(ArgInfo::unnamed))
            .map(|arg| {
                let location = self.function_arg(&cum, &arg);
                self.function_arg_advance(&mut cum, &arg);
                location
            })
            .collect();
        CallLayout {
            args,
            stack_bytes: cum.stack_bytes().next_multiple_of(self.config().stack_alignment()),
            regs_used: cum.regs_used(),
        }
    }
}

/// Build the hooks for the architecture called `name`.
pub fn target_by_name(name: &str, config: TargetConfig) -> Result<Box<dyn TargetHooks>> {
    match name {
        "bonjour" => Ok(Box::new(BonjourTarget::new(config)?)),
        _ => Err(Error::UnknownTarget(name.to_string())),
    }
}
