//! MIPS ABI register numbering and names.

/// Hardwired zero register.
pub const REG_ZERO: usize = 0;
/// Assembler temporary.
pub const REG_AT: usize = 1;
/// Return address register.
pub const REG_RA: usize = 31;
/// Multiply/divide high result, tracked like a GPR for hazard purposes.
pub const REG_HI: usize = 32;
/// Multiply/divide low result, tracked like a GPR for hazard purposes.
pub const REG_LO: usize = 33;

/// Total architectural registers tracked by the register file (32 GPRs + HI/LO).
pub const REG_COUNT: usize = 34;

const NAMES: [&str; REG_COUNT] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra", "$hi", "$lo",
];

/// Conventional assembler name of a register, `$`-prefixed.
pub fn reg_name(reg: usize) -> &'static str {
    NAMES[reg]
}
