//! Frame layout, register elimination and interrupt handlers.

use bonjour_target::abi::{
    ARG_POINTER_REG, ELIMINABLE_REGS, FRAME_POINTER_REG, HARD_FRAME_POINTER_REG, LINK_REG,
    STACK_POINTER_REG,
};
use bonjour_target::test_harness::*;
use bonjour_target::{Attribute, Error, FunctionDecl, FunctionInfo, FunctionType, RegNo, TargetHooks, Type};

fn sample_frame_info() -> FunctionInfo {
    // Non-leaf, saves s0, s1 and lr; 20 bytes of locals; 8 bytes of outgoing args.
    FunctionInfo::default()
        .with_used_regs([RegNo(0), RegNo(4), RegNo(5)])
        .with_locals(20)
        .with_outgoing_args(8)
}

#[test]
fn test_elimination_offsets_match_layout() {
    let target = bonjour();
    let frame = target.frame_layout(&sample_frame_info());

    // saved: s0, s1, lr = 12 -> 16; locals 20 + outgoing 8 = 28 -> 32.
    assert_eq!(frame.saved_size, 16);
    assert_eq!(frame.locals_size, 24);
    assert_eq!(frame.total_size(), 48);

    let offset = |from, to| target.elimination_offset(&frame, from, to);
    assert_eq!(offset(ARG_POINTER_REG, STACK_POINTER_REG), Ok(48));
    assert_eq!(offset(ARG_POINTER_REG, HARD_FRAME_POINTER_REG), Ok(16));
    assert_eq!(offset(FRAME_POINTER_REG, STACK_POINTER_REG), Ok(32));
    assert_eq!(offset(FRAME_POINTER_REG, HARD_FRAME_POINTER_REG), Ok(0));
}

/// Offsets compose: eliminating ap via fp and then fp via sp lands where ap -> sp does.
#[test]
fn test_elimination_offsets_compose() {
    let target = bonjour();
    let frame = target.frame_layout(&sample_frame_info().with_frame_pointer());
    let ap_fp = target
        .elimination_offset(&frame, ARG_POINTER_REG, HARD_FRAME_POINTER_REG)
        .expect("configured");
    let ap_sp = target
        .elimination_offset(&frame, ARG_POINTER_REG, STACK_POINTER_REG)
        .expect("configured");
    let sfp_sp = target
        .elimination_offset(&frame, FRAME_POINTER_REG, STACK_POINTER_REG)
        .expect("configured");
    let sfp_fp = target
        .elimination_offset(&frame, FRAME_POINTER_REG, HARD_FRAME_POINTER_REG)
        .expect("configured");
    assert_eq!(ap_fp + sfp_sp - sfp_fp, ap_sp);
}

/// Unconfigured pairs are configuration errors, never a silent zero.
#[test]
fn test_unconfigured_elimination_is_an_error() {
    let target = bonjour();
    let frame = target.frame_layout(&FunctionInfo::leaf());

    for (from, to) in [
        (STACK_POINTER_REG, FRAME_POINTER_REG),
        (HARD_FRAME_POINTER_REG, STACK_POINTER_REG),
        (LINK_REG, STACK_POINTER_REG),
        (ARG_POINTER_REG, FRAME_POINTER_REG),
        (RegNo(99), STACK_POINTER_REG),
    ] {
        assert_eq!(
            target.elimination_offset(&frame, from, to),
            Err(Error::UnsupportedElimination { from, to }),
            "{from} -> {to}"
        );
        assert!(!target.can_eliminate(from, to, false));
    }
}

#[test]
fn test_every_eliminable_pair_has_an_offset() {
    let target = bonjour();
    let frame = target.frame_layout(&sample_frame_info());
    for (from, to) in ELIMINABLE_REGS {
        let offset = target
            .elimination_offset(&frame, from, to)
            .unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
        assert!(offset >= 0, "{from} sits below {to}");
    }
}

#[test]
fn test_frame_pointer_blocks_elimination_to_sp() {
    let target = bonjour();
    assert!(target.can_eliminate(FRAME_POINTER_REG, STACK_POINTER_REG, false));
    assert!(target.can_eliminate(ARG_POINTER_REG, STACK_POINTER_REG, false));
    assert!(!target.can_eliminate(FRAME_POINTER_REG, STACK_POINTER_REG, true));
    assert!(!target.can_eliminate(ARG_POINTER_REG, STACK_POINTER_REG, true));
    assert!(target.can_eliminate(ARG_POINTER_REG, HARD_FRAME_POINTER_REG, true));
}

// ── Interrupt handlers ──

#[test]
fn test_interrupt_attribute_detection() {
    let target = bonjour();
    let plain = FunctionDecl::new("main", FunctionType::new(vec![], Type::I32));
    assert!(!target.is_interrupt_function(&plain));

    let isr = interrupt_handler("timer_isr");
    assert!(target.is_interrupt_function(&isr));
    // Repeated queries agree.
    assert!(target.is_interrupt_function(&isr));

    let spelled = FunctionDecl::new("uart_isr", FunctionType::new(vec![], Type::Void))
        .with_attribute(Attribute::new("__interrupt__"));
    assert!(target.is_interrupt_function(&spelled));

    let other = plain.with_attribute(Attribute::new("noinline"));
    assert!(!target.is_interrupt_function(&other));
}

#[test]
fn test_interrupt_handler_preserves_clobbered_registers() {
    let target = bonjour();
    let isr = interrupt_handler("timer_isr");
    let info = FunctionInfo {
        is_interrupt: target.is_interrupt_function(&isr),
        ..FunctionInfo::leaf()
    }
    .with_used_regs([RegNo(2), RegNo(7)]);

    let isr_frame = target.frame_layout(&info);
    assert_eq!(isr_frame.saved_regs, vec![RegNo(2), RegNo(7)]);

    let normal_frame = target.frame_layout(&FunctionInfo {
        is_interrupt: false,
        ..info
    });
    assert_eq!(normal_frame.saved_regs, vec![RegNo(7)]);
}
