//! Functional simulator tests, against generated ELF traces.

use std::path::Path;

use mips_core::common::error::SimError;
use mips_core::FuncSim;

use crate::common::elf::ElfBuilder;
use crate::common::encode::*;

// ══════════════════════════════════════════════════════════
// 1. Initialization
// ══════════════════════════════════════════════════════════

#[test]
fn missing_trace_is_fatal() {
    let result = FuncSim::new(Path::new("./1234567890/qwertyuop"));
    assert!(matches!(result, Err(SimError::BadTrace { .. })));
}

#[test]
fn garbage_file_is_fatal() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"not an elf").unwrap();
    let result = FuncSim::new(file.path());
    assert!(matches!(result, Err(SimError::BadTrace { .. })));
}

#[test]
fn execution_starts_at_the_elf_entry() {
    let trace = ElfBuilder::new(0x4000F0).instr(lui(AT, 0x41)).write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    let instr = sim.step();
    assert_eq!(instr.pc(), 0x4000F0);
}

// ══════════════════════════════════════════════════════════
// 2. Single step
// ══════════════════════════════════════════════════════════

#[test]
fn first_step_dump_of_the_reference_trace() {
    let trace = ElfBuilder::new(0x4000F0).instr(lui(AT, 0x41)).write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    assert_eq!(
        sim.step().dump(),
        "0x4000f0: lui $at, 0x41\t [ $at = 0x410000]"
    );
    assert_eq!(sim.read_reg(1), 0x410000);
}

// ══════════════════════════════════════════════════════════
// 3. Programs
// ══════════════════════════════════════════════════════════

#[test]
fn arithmetic_chain_produces_architectural_state() {
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[
            addiu(T0, ZERO, 5),
            addiu(T1, ZERO, 7),
            addu(T2, T0, T1),
            sll(T3, T2, 4),
        ])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    sim.run(4).unwrap();
    assert_eq!(sim.read_reg(10), 12);
    assert_eq!(sim.read_reg(11), 12 << 4);
}

#[test]
fn store_then_load_round_trips_through_memory() {
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[
            lui(T0, 0x1000),        // scratch base 0x10000000
            addiu(T1, ZERO, -2),    // 0xfffffffe
            sw(T1, 0x20, T0),
            lw(T2, 0x20, T0),
        ])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    sim.run(4).unwrap();
    assert_eq!(sim.read_reg(10), 0xFFFF_FFFE);
}

#[test]
fn counted_loop_runs_to_completion() {
    // t0 counts 5 down to 0; t1 accumulates the iteration count.
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[
            addiu(T0, ZERO, 5),
            addiu(T1, T1, 1),      // loop body
            addiu(T0, T0, -1),
            bne(T0, ZERO, -3),
            addu(V0, T1, ZERO),
        ])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    // 1 init + 5 * 3 loop instructions + 1 tail
    sim.run(17).unwrap();
    assert_eq!(sim.read_reg(2), 5);
}

#[test]
fn mult_result_reads_back_through_mflo() {
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[
            addiu(T0, ZERO, 6),
            addiu(T1, ZERO, 7),
            mult(T0, T1),
            mflo(V0),
        ])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    sim.run(4).unwrap();
    assert_eq!(sim.read_reg(2), 42);
}

#[test]
fn unconditional_jump_skips_the_fall_through() {
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[
            j(0x40000C),
            addiu(V0, ZERO, 1), // skipped
            addiu(V0, ZERO, 2), // skipped
            addiu(V1, ZERO, 9), // 0x40000c: jump target
        ])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    sim.run(2).unwrap();
    assert_eq!(sim.read_reg(2), 0);
    assert_eq!(sim.read_reg(3), 9);
}

#[test]
fn run_stops_at_a_trap() {
    let trace = ElfBuilder::new(0x400000)
        .instrs(&[addiu(T0, ZERO, 1), break_()])
        .write();
    let mut sim = FuncSim::new(trace.path()).unwrap();
    let result = sim.run(2);
    assert!(matches!(result, Err(SimError::Trap { pc: 0x400004, .. })));
}
