//! Instruction carrier tests: decoding, execution semantics, the dump
//! format, and the misprediction predicate.

use mips_core::common::error::SimError;
use mips_core::core::instr::FuncInstr;

use crate::common::encode::*;

fn decoded(raw: u32, pc: u32) -> FuncInstr {
    FuncInstr::new(raw, pc, false, pc.wrapping_add(4))
}

// ══════════════════════════════════════════════════════════
// 1. Dump format
// ══════════════════════════════════════════════════════════

#[test]
fn lui_dump_matches_the_reference_format() {
    let mut instr = decoded(lui(AT, 0x41), 0x4000F0);
    instr.execute();
    assert_eq!(
        instr.dump(),
        "0x4000f0: lui $at, 0x41\t [ $at = 0x410000]"
    );
}

#[test]
fn dump_has_no_value_before_execution() {
    let instr = decoded(lui(AT, 0x41), 0x4000F0);
    assert_eq!(instr.dump(), "0x4000f0: lui $at, 0x41");
}

#[test]
fn store_dump_has_no_destination_value() {
    let mut instr = decoded(sw(T0, 0x10, T1), 0x400000);
    instr.execute();
    assert_eq!(instr.dump(), "0x400000: sw $t0, 0x10($t1)");
}

#[test]
fn mult_dump_reports_lo_and_hi() {
    let mut instr = decoded(mult(T1, T2), 0x400000);
    instr.set_v_src1(6);
    instr.set_v_src2(7);
    instr.execute();
    assert_eq!(instr.dump(), "0x400000: mult $t1, $t2\t [ $lo = 0x2a, $hi = 0x0]");
}

#[test]
fn three_register_disasm() {
    let instr = decoded(addu(T0, T1, T2), 0x400000);
    assert_eq!(instr.dump(), "0x400000: addu $t0, $t1, $t2");
}

#[test]
fn branch_disasm_shows_the_target_address() {
    let instr = decoded(beq(T1, T2, 3), 0x400000);
    assert_eq!(instr.dump(), "0x400000: beq $t1, $t2, 0x400010");
}

// ══════════════════════════════════════════════════════════
// 2. Execution semantics
// ══════════════════════════════════════════════════════════

#[test]
fn sequential_instruction_advances_pc_by_four() {
    let mut instr = decoded(addiu(T0, ZERO, 1), 0x400000);
    instr.execute();
    assert_eq!(instr.new_pc(), 0x400004);
    assert!(!instr.is_jump());
}

#[test]
fn taken_branch_computes_the_relative_target() {
    let mut instr = decoded(beq(T1, T2, 3), 0x400000);
    instr.set_v_src1(5);
    instr.set_v_src2(5);
    instr.execute();
    assert!(instr.is_jump() && instr.is_jump_taken());
    assert_eq!(instr.new_pc(), 0x400010);
}

#[test]
fn not_taken_branch_falls_through() {
    let mut instr = decoded(beq(T1, T2, 3), 0x400000);
    instr.set_v_src1(5);
    instr.set_v_src2(6);
    instr.execute();
    assert!(instr.is_jump() && !instr.is_jump_taken());
    assert_eq!(instr.new_pc(), 0x400004);
}

#[test]
fn backward_branch_offset_is_sign_extended() {
    let mut instr = decoded(bne(T0, ZERO, -3), 0x400010);
    instr.set_v_src1(1);
    instr.execute();
    assert_eq!(instr.new_pc(), 0x400008);
}

#[test]
fn jal_links_the_return_address() {
    let mut instr = decoded(jal(0x400100), 0x400000);
    instr.execute();
    assert!(instr.is_jump_taken());
    assert_eq!(instr.new_pc(), 0x400100);
    assert_eq!(instr.dump(), "0x400000: jal 0x400100\t [ $ra = 0x400004]");
}

#[test]
fn jr_jumps_to_the_register_value() {
    let mut instr = decoded(jr(RA), 0x400100);
    instr.set_v_src1(0x400004);
    instr.execute();
    assert!(instr.is_jump_taken());
    assert_eq!(instr.new_pc(), 0x400004);
}

#[test]
fn subu_wraps_on_underflow() {
    let mut instr = decoded(subu(T0, T1, T2), 0x400000);
    instr.set_v_src1(1);
    instr.set_v_src2(3);
    instr.execute();
    assert_eq!(instr.v_dst(), u32::MAX - 1);
}

// ══════════════════════════════════════════════════════════
// 3. Traps
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_encoding_records_a_trap() {
    let instr = decoded(0xFFFF_FFFF, 0x400000);
    assert!(matches!(
        instr.check_trap(),
        Err(SimError::Trap { pc: 0x400000, .. })
    ));
}

#[test]
fn break_records_a_trap() {
    let instr = decoded(break_(), 0x400000);
    assert!(instr.check_trap().is_err());
}

#[test]
fn ordinary_instructions_do_not_trap() {
    let instr = decoded(addu(T0, T1, T2), 0x400000);
    assert!(instr.check_trap().is_ok());
}

// ══════════════════════════════════════════════════════════
// 4. Misprediction predicate
// ══════════════════════════════════════════════════════════

#[test]
fn predicted_not_taken_but_taken_mispredicts() {
    let mut instr = FuncInstr::new(beq(ZERO, ZERO, 3), 0x400000, false, 0x400004);
    instr.execute();
    assert!(instr.is_misprediction());
}

#[test]
fn correct_taken_prediction_is_clean() {
    let mut instr = FuncInstr::new(beq(ZERO, ZERO, 3), 0x400000, true, 0x400010);
    instr.execute();
    assert!(!instr.is_misprediction());
}

#[test]
fn right_direction_wrong_target_mispredicts() {
    let mut instr = FuncInstr::new(beq(ZERO, ZERO, 3), 0x400000, true, 0x400020);
    instr.execute();
    assert!(instr.is_misprediction());
}

#[test]
fn correct_not_taken_prediction_is_clean() {
    let mut instr = FuncInstr::new(bne(ZERO, ZERO, 3), 0x400000, false, 0x400004);
    instr.execute();
    assert!(!instr.is_misprediction());
}
