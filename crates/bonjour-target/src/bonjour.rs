//! Hooks for the bonjour processor.

use crate::abi::{
    ARG_POINTER_REG, ELIMINABLE_REGS, FIRST_ARG_REG, FRAME_POINTER_REG, LAST_PAIR_START_REG,
    MAX_ABSOLUTE_ADDRESS, MAX_DISPLACEMENT, MAX_REGISTER_AGGREGATE, MIN_DISPLACEMENT,
    RETURN_VALUE_REG, STACK_POINTER_REG,
};
use crate::callconv::{self, ArgInfo, ArgLocation, CumulativeArgs};
use crate::config::TargetConfig;
use crate::frame::FrameLayout;
use crate::mode::{MachineMode, ModeClass, UNITS_PER_WORD};
use crate::regs::{RegNo, RegisterClass};
use crate::rtx::Rtx;
use crate::target::{TargetHooks, ValueLocation};
use crate::tree::{FunctionDecl, FunctionType, Type};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct BonjourTarget {
    config: TargetConfig,
}

impl BonjourTarget {
    /// Build the hooks, rejecting configurations the backend cannot honour.
    pub fn new(config: TargetConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(?config, "initialized bonjour target");
        Ok(Self { config })
    }

    /// Whether `regno` may serve as a base or index register.
    fn regno_ok_for_base(&self, regno: RegNo, strict: bool) -> bool {
        match self.reg_class_of(regno) {
            RegisterClass::ArgRegs | RegisterClass::GeneralRegs => true,
            // Virtual frame registers are rewritten to sp or fp before strict checking.
            RegisterClass::AllRegs => !strict,
            RegisterClass::NoRegs => !strict && regno.is_pseudo(),
        }
    }

    fn base_ok(&self, x: &Rtx, strict: bool) -> bool {
        matches!(x, Rtx::Reg(r) if self.regno_ok_for_base(*r, strict))
    }

    /// Every byte of the access must be reachable with a 12-bit signed displacement,
    /// and the displacement must keep word-or-smaller accesses naturally aligned.
    fn displacement_ok(offset: i64, size: u32) -> bool {
        let size = i64::from(size);
        let align = size.min(i64::from(UNITS_PER_WORD));
        offset >= MIN_DISPLACEMENT
            && offset.saturating_add(size - 1) <= MAX_DISPLACEMENT
            && offset % align == 0
    }

    /// Mode a return value of type `ty` is widened to in its register.
    fn promoted_return_mode(ty: &Type) -> MachineMode {
        match ty.mode() {
            MachineMode::QI | MachineMode::HI if ty.is_integral() => MachineMode::WORD,
            mode => mode,
        }
    }
}

impl TargetHooks for BonjourTarget {
    fn name(&self) -> &'static str {
        "bonjour"
    }

    fn config(&self) -> &TargetConfig {
        &self.config
    }

    fn is_interrupt_function(&self, decl: &FunctionDecl) -> bool {
        decl.is_interrupt()
    }

    fn elimination_offset(&self, frame: &FrameLayout, from: RegNo, to: RegNo) -> Result<i64> {
        if !ELIMINABLE_REGS.contains(&(from, to)) {
            return Err(Error::UnsupportedElimination { from, to });
        }
        let offset = frame
            .offset_between(from, to)
            .ok_or(Error::UnsupportedElimination { from, to })?;
        tracing::trace!(%from, %to, offset, "elimination offset");
        Ok(offset)
    }

    fn can_eliminate(&self, from: RegNo, to: RegNo, frame_pointer_needed: bool) -> bool {
        if !ELIMINABLE_REGS.contains(&(from, to)) {
            return false;
        }
        // With a frame pointer, frame-relative addresses must stay fixed while sp moves.
        !(frame_pointer_needed
            && to == STACK_POINTER_REG
            && (from == FRAME_POINTER_REG || from == ARG_POINTER_REG))
    }

    fn init_cumulative_args(&self, fntype: Option<&FunctionType>, libcall: bool) -> CumulativeArgs {
        CumulativeArgs::new(&self.config, fntype, libcall)
    }

    fn function_arg(&self, cum: &CumulativeArgs, arg: &ArgInfo) -> ArgLocation {
        cum.peek(arg, self.config.stack_alignment())
    }

    fn function_arg_advance(&self, cum: &mut CumulativeArgs, arg: &ArgInfo) {
        cum.advance(arg, self.config.stack_alignment());
    }

    fn is_arg_register(&self, regno: RegNo) -> bool {
        regno.0 >= FIRST_ARG_REG.0
            && regno.0 < FIRST_ARG_REG.0 + u32::from(self.config.arg_regs())
    }

    fn reg_mode_ok(&self, regno: RegNo, mode: MachineMode) -> bool {
        match self.reg_class_of(regno) {
            RegisterClass::NoRegs => false,
            RegisterClass::AllRegs => mode == MachineMode::POINTER,
            RegisterClass::ArgRegs | RegisterClass::GeneralRegs => match mode.class() {
                ModeClass::Int | ModeClass::Float => match mode.nregs() {
                    1 => true,
                    2 => regno.0 % 2 == 0 && regno <= LAST_PAIR_START_REG,
                    _ => false,
                },
                ModeClass::Random => mode == MachineMode::Void,
                ModeClass::Cc => false,
            },
        }
    }

    fn reg_class_of(&self, regno: RegNo) -> RegisterClass {
        if regno.is_pseudo() {
            RegisterClass::NoRegs
        } else if self.is_arg_register(regno) {
            RegisterClass::ArgRegs
        } else if regno.is_virtual_frame() {
            RegisterClass::AllRegs
        } else {
            RegisterClass::GeneralRegs
        }
    }

    fn function_value(
        &self,
        ret: &Type,
        _callee: Option<&FunctionType>,
        _outgoing: bool,
    ) -> ValueLocation {
        if self.return_in_memory(ret) {
            return ValueLocation {
                reg: RETURN_VALUE_REG,
                mode: MachineMode::POINTER,
                in_memory: true,
            };
        }
        ValueLocation {
            reg: RETURN_VALUE_REG,
            mode: Self::promoted_return_mode(ret),
            in_memory: false,
        }
    }

    fn return_in_memory(&self, ty: &Type) -> bool {
        ty.size() > MAX_REGISTER_AGGREGATE || ty.mode() == MachineMode::Blk
    }

    fn pass_by_reference(&self, ty: &Type) -> bool {
        callconv::pass_by_reference(ty)
    }

    fn is_legitimate_pic_operand(&self, x: &Rtx) -> bool {
        if x.mentions_unspec() {
            return false;
        }
        if !self.config.pic() {
            return true;
        }
        match x {
            Rtx::Reg(_) | Rtx::ConstInt(_) => true,
            // Only a register offset by a plain integer; other sums are addresses.
            Rtx::Plus(base, offset) => {
                matches!((base.as_ref(), offset.as_ref()), (Rtx::Reg(_), Rtx::ConstInt(_)))
            }
            _ => false,
        }
    }

    fn is_legitimate_address(&self, mode: MachineMode, x: &Rtx, strict: bool) -> bool {
        if x.mentions_unspec() {
            return false;
        }
        // Block moves address memory one byte at a time.
        let size = mode.size().max(1);
        let word_or_less = size <= UNITS_PER_WORD;

        match x {
            Rtx::Reg(r) => self.regno_ok_for_base(*r, strict),
            Rtx::Plus(base, offset) => match offset.as_ref() {
                Rtx::ConstInt(off) => {
                    self.base_ok(base, strict) && Self::displacement_ok(*off, size)
                }
                Rtx::Reg(_) => {
                    word_or_less && self.base_ok(base, strict) && self.base_ok(offset, strict)
                }
                _ => false,
            },
            Rtx::PostInc(base) | Rtx::PreDec(base) => word_or_less && self.base_ok(base, strict),
            Rtx::ConstInt(addr) => {
                *addr >= 0 && addr.saturating_add(i64::from(size) - 1) <= MAX_ABSOLUTE_ADDRESS
            }
            Rtx::SymbolRef { .. } | Rtx::LabelRef(_) | Rtx::Const(_) => {
                !self.config.pic() && x.is_constant()
            }
            Rtx::Unspec(_) => false,
        }
    }
}
