//! Memory address and PIC operand legitimacy.

use bonjour_target::abi::{ARG_POINTER_REG, FRAME_POINTER_REG};
use bonjour_target::test_harness::*;
use bonjour_target::{MachineMode, Rtx, TargetHooks};

const SI: MachineMode = MachineMode::SI;

#[test]
fn test_base_plus_displacement_range() {
    let target = bonjour();
    assert!(target.is_legitimate_address(SI, &reg_offset(15, 0), true));
    assert!(target.is_legitimate_address(SI, &reg_offset(15, -2048), true));
    assert!(target.is_legitimate_address(SI, &reg_offset(15, 2044), true));
    assert!(!target.is_legitimate_address(SI, &reg_offset(15, 2048), true));
    assert!(!target.is_legitimate_address(SI, &reg_offset(15, -2052), true));
    assert!(!target.is_legitimate_address(SI, &reg_offset(15, i64::MAX), false));
}

#[test]
fn test_displacement_alignment_follows_access_size() {
    let target = bonjour();
    assert!(target.is_legitimate_address(MachineMode::QI, &reg_offset(4, 3), true));
    assert!(target.is_legitimate_address(MachineMode::HI, &reg_offset(4, 2), true));
    assert!(!target.is_legitimate_address(MachineMode::HI, &reg_offset(4, 3), true));
    assert!(!target.is_legitimate_address(SI, &reg_offset(4, 6), true));
    // Double words only need word alignment.
    assert!(target.is_legitimate_address(MachineMode::DI, &reg_offset(4, 4), true));
}

#[test]
fn test_indexed_and_autoinc_are_word_only() {
    let target = bonjour();
    let indexed = Rtx::plus(reg(4), reg(5));
    let push = Rtx::PreDec(Box::new(reg(15)));
    let pop = Rtx::PostInc(Box::new(reg(15)));
    for mode in [MachineMode::QI, MachineMode::HI, MachineMode::SI, MachineMode::SF] {
        assert!(target.is_legitimate_address(mode, &indexed, true), "{mode}");
        assert!(target.is_legitimate_address(mode, &push, true), "{mode}");
        assert!(target.is_legitimate_address(mode, &pop, true), "{mode}");
    }
    for mode in [MachineMode::DI, MachineMode::DF] {
        assert!(!target.is_legitimate_address(mode, &indexed, false), "{mode}");
        assert!(!target.is_legitimate_address(mode, &push, false), "{mode}");
    }
}

#[test]
fn test_strictness_on_virtual_and_pseudo_registers() {
    let target = bonjour();
    for base in [FRAME_POINTER_REG.0, ARG_POINTER_REG.0, 18, 1000] {
        assert!(!target.is_legitimate_address(SI, &reg(base), true), "r{base} strict");
        assert!(target.is_legitimate_address(SI, &reg(base), false), "r{base} non-strict");
    }
    let mixed = Rtx::plus(reg(4), reg(40));
    assert!(!target.is_legitimate_address(SI, &mixed, true));
    assert!(target.is_legitimate_address(SI, &mixed, false));
}

#[test]
fn test_absolute_and_symbolic_addresses() {
    let target = bonjour();
    assert!(target.is_legitimate_address(SI, &Rtx::ConstInt(0x100), true));
    assert!(!target.is_legitimate_address(SI, &Rtx::ConstInt(0x1_0000), true));
    assert!(target.is_legitimate_address(SI, &Rtx::symbol("errno"), true));
    assert!(target.is_legitimate_address(SI, &symbol_offset("table", 8), true));
    assert!(target.is_legitimate_address(SI, &Rtx::LabelRef(4), true));

    let pic = pic_target();
    assert!(!pic.is_legitimate_address(SI, &Rtx::symbol("errno"), false));
    assert!(!pic.is_legitimate_address(SI, &symbol_offset("table", 8), false));
    assert!(pic.is_legitimate_address(SI, &reg_offset(4, 8), true));
}

#[test]
fn test_opaque_expressions_rejected() {
    let target = bonjour();
    let opaque = Rtx::plus(reg(4), Rtx::Unspec(7));
    assert!(!target.is_legitimate_address(SI, &opaque, false));
    assert!(!target.is_legitimate_address(SI, &Rtx::Unspec(7), false));
    assert!(!target.is_legitimate_pic_operand(&opaque));
    // Non-canonical operand order is not recognised.
    assert!(!target.is_legitimate_address(SI, &Rtx::plus(Rtx::ConstInt(4), reg(4)), false));
}

#[test]
fn test_pic_operands() {
    let target = pic_target();
    assert!(target.is_legitimate_pic_operand(&Rtx::ConstInt(-1)));
    assert!(target.is_legitimate_pic_operand(&reg(3)));
    assert!(target.is_legitimate_pic_operand(&reg_offset(3, 16)));
    assert!(!target.is_legitimate_pic_operand(&Rtx::symbol("printf")));
    assert!(!target.is_legitimate_pic_operand(&Rtx::local_symbol("counter")));
    assert!(!target.is_legitimate_pic_operand(&symbol_offset("table", 4)));
    assert!(!target.is_legitimate_pic_operand(&Rtx::LabelRef(1)));
    assert!(!target.is_legitimate_pic_operand(&Rtx::plus(reg(3), Rtx::symbol("x"))));
    // Register sums are addresses, not operands.
    assert!(!target.is_legitimate_pic_operand(&Rtx::plus(reg(1), reg(2))));
    assert!(!target.is_legitimate_pic_operand(&"a1+a2".parse().expect("valid syntax")));
    assert!(target.is_legitimate_pic_operand(&"sp+8".parse().expect("valid syntax")));

    let absolute = bonjour();
    assert!(absolute.is_legitimate_pic_operand(&Rtx::symbol("printf")));
}

#[test]
fn test_parsed_addresses() {
    let target = bonjour();
    let cases = [
        ("sp+8", true),
        ("fp-12", true),
        ("a1+a2", true),
        ("post_inc s0", true),
        ("@table+4", true),
        ("sfp+4", false),
        ("sp+3", false),
    ];
    for (text, strict_ok) in cases {
        let addr: Rtx = text.parse().expect("valid address syntax");
        assert_eq!(target.is_legitimate_address(SI, &addr, true), strict_ok, "{text}");
    }
}
