//! MIPS-I instruction set support.
//!
//! Decoding of raw 32-bit words into operation kind, operand register
//! numbers, and disassembly text. Execution semantics live on the
//! instruction carrier in `core::instr`; this module only classifies.

use crate::common::Addr;

/// ABI register numbering and names.
pub mod abi;

use self::abi::{REG_HI, REG_LO, REG_RA, REG_ZERO};

/// Architectural traps recognized by the functional model.
///
/// Any of these reaching writeback is fatal to the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    /// A `syscall` instruction.
    Syscall,
    /// A `break` instruction.
    Breakpoint,
    /// An encoding outside the supported MIPS-I subset.
    UnknownInstruction,
}

impl std::fmt::Display for Trap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trap::Syscall => write!(f, "syscall"),
            Trap::Breakpoint => write!(f, "breakpoint"),
            Trap::UnknownInstruction => write!(f, "unknown instruction"),
        }
    }
}

/// Operation kind, the result of opcode/funct dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    // Shifts
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,
    // Register jumps
    Jr,
    Jalr,
    // Traps
    Syscall,
    Break,
    // HI/LO moves
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    // Multiply/divide
    Mult,
    Multu,
    Div,
    Divu,
    // Three-register ALU
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    // Conditional branches
    Bltz,
    Bgez,
    Beq,
    Bne,
    Blez,
    Bgtz,
    // Immediate ALU
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    // Loads and stores
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    // Absolute jumps
    J,
    Jal,
    // Unsupported encoding
    Unknown,
}

impl Op {
    /// True for every control-flow instruction, conditional or not.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Op::Bltz
                | Op::Bgez
                | Op::Beq
                | Op::Bne
                | Op::Blez
                | Op::Bgtz
                | Op::J
                | Op::Jal
                | Op::Jr
                | Op::Jalr
        )
    }

    pub fn is_load(self) -> bool {
        matches!(self, Op::Lb | Op::Lh | Op::Lw | Op::Lbu | Op::Lhu)
    }

    pub fn is_store(self) -> bool {
        matches!(self, Op::Sb | Op::Sh | Op::Sw)
    }
}

/// A decoded instruction: operation, operand registers, raw immediate, and
/// disassembly text. Register slots hold `$zero` when unused.
#[derive(Clone, Debug)]
pub struct Decoded {
    pub op: Op,
    pub src1: usize,
    pub src2: usize,
    pub dst: usize,
    pub dst2: usize,
    /// 16-bit immediate, shift amount, or 26-bit jump index, depending on `op`.
    pub imm: u32,
    pub trap: Option<Trap>,
    pub disasm: String,
}

/// Sign-extends a 16-bit immediate field.
pub fn sext16(imm: u32) -> i32 {
    imm as u16 as i16 as i32
}

/// Branch target of a conditional branch at `pc` with immediate `imm`.
pub fn branch_target(pc: Addr, imm: u32) -> Addr {
    pc.wrapping_add(4).wrapping_add((sext16(imm) << 2) as u32)
}

/// Jump target of a J-type instruction at `pc` with index `idx`.
pub fn jump_target(pc: Addr, idx: u32) -> Addr {
    (pc.wrapping_add(4) & 0xF000_0000) | (idx << 2)
}

/// Decodes one raw instruction word fetched at `pc`.
pub fn decode(raw: u32, pc: Addr) -> Decoded {
    let opcode = raw >> 26;
    let rs = ((raw >> 21) & 0x1F) as usize;
    let rt = ((raw >> 16) & 0x1F) as usize;
    let rd = ((raw >> 11) & 0x1F) as usize;
    let shamt = (raw >> 6) & 0x1F;
    let imm16 = raw & 0xFFFF;
    let idx26 = raw & 0x03FF_FFFF;

    let r = abi::reg_name;

    // Default shape; each arm overrides what it uses.
    let mut d = Decoded {
        op: Op::Unknown,
        src1: REG_ZERO,
        src2: REG_ZERO,
        dst: REG_ZERO,
        dst2: REG_ZERO,
        imm: imm16,
        trap: None,
        disasm: String::new(),
    };

    match opcode {
        0x00 => match raw & 0x3F {
            funct @ (0x00 | 0x02 | 0x03) => {
                let (op, name) = match funct {
                    0x00 => (Op::Sll, "sll"),
                    0x02 => (Op::Srl, "srl"),
                    _ => (Op::Sra, "sra"),
                };
                d.op = op;
                d.src1 = rt;
                d.dst = rd;
                d.imm = shamt;
                d.disasm = format!("{name} {}, {}, {shamt:#x}", r(rd), r(rt));
            }
            funct @ (0x04 | 0x06 | 0x07) => {
                let (op, name) = match funct {
                    0x04 => (Op::Sllv, "sllv"),
                    0x06 => (Op::Srlv, "srlv"),
                    _ => (Op::Srav, "srav"),
                };
                d.op = op;
                d.src1 = rs;
                d.src2 = rt;
                d.dst = rd;
                d.disasm = format!("{name} {}, {}, {}", r(rd), r(rt), r(rs));
            }
            0x08 => {
                d.op = Op::Jr;
                d.src1 = rs;
                d.disasm = format!("jr {}", r(rs));
            }
            0x09 => {
                d.op = Op::Jalr;
                d.src1 = rs;
                d.dst = rd;
                d.disasm = format!("jalr {}, {}", r(rd), r(rs));
            }
            0x0C => {
                d.op = Op::Syscall;
                d.trap = Some(Trap::Syscall);
                d.disasm = "syscall".to_string();
            }
            0x0D => {
                d.op = Op::Break;
                d.trap = Some(Trap::Breakpoint);
                d.disasm = "break".to_string();
            }
            0x10 => {
                d.op = Op::Mfhi;
                d.src1 = REG_HI;
                d.dst = rd;
                d.disasm = format!("mfhi {}", r(rd));
            }
            0x11 => {
                d.op = Op::Mthi;
                d.src1 = rs;
                d.dst = REG_HI;
                d.disasm = format!("mthi {}", r(rs));
            }
            0x12 => {
                d.op = Op::Mflo;
                d.src1 = REG_LO;
                d.dst = rd;
                d.disasm = format!("mflo {}", r(rd));
            }
            0x13 => {
                d.op = Op::Mtlo;
                d.src1 = rs;
                d.dst = REG_LO;
                d.disasm = format!("mtlo {}", r(rs));
            }
            funct @ (0x18 | 0x19 | 0x1A | 0x1B) => {
                let (op, name) = match funct {
                    0x18 => (Op::Mult, "mult"),
                    0x19 => (Op::Multu, "multu"),
                    0x1A => (Op::Div, "div"),
                    _ => (Op::Divu, "divu"),
                };
                d.op = op;
                d.src1 = rs;
                d.src2 = rt;
                d.dst = REG_LO;
                d.dst2 = REG_HI;
                d.disasm = format!("{name} {}, {}", r(rs), r(rt));
            }
            funct @ (0x20..=0x27 | 0x2A | 0x2B) => {
                let (op, name) = match funct {
                    0x20 => (Op::Add, "add"),
                    0x21 => (Op::Addu, "addu"),
                    0x22 => (Op::Sub, "sub"),
                    0x23 => (Op::Subu, "subu"),
                    0x24 => (Op::And, "and"),
                    0x25 => (Op::Or, "or"),
                    0x26 => (Op::Xor, "xor"),
                    0x27 => (Op::Nor, "nor"),
                    0x2A => (Op::Slt, "slt"),
                    _ => (Op::Sltu, "sltu"),
                };
                d.op = op;
                d.src1 = rs;
                d.src2 = rt;
                d.dst = rd;
                d.disasm = format!("{name} {}, {}, {}", r(rd), r(rs), r(rt));
            }
            _ => unknown(&mut d, raw),
        },
        0x01 => match rt {
            0x00 => {
                d.op = Op::Bltz;
                d.src1 = rs;
                d.disasm = format!("bltz {}, {:#x}", r(rs), branch_target(pc, imm16));
            }
            0x01 => {
                d.op = Op::Bgez;
                d.src1 = rs;
                d.disasm = format!("bgez {}, {:#x}", r(rs), branch_target(pc, imm16));
            }
            _ => unknown(&mut d, raw),
        },
        0x02 => {
            d.op = Op::J;
            d.imm = idx26;
            d.disasm = format!("j {:#x}", jump_target(pc, idx26));
        }
        0x03 => {
            d.op = Op::Jal;
            d.dst = REG_RA;
            d.imm = idx26;
            d.disasm = format!("jal {:#x}", jump_target(pc, idx26));
        }
        0x04 => {
            d.op = Op::Beq;
            d.src1 = rs;
            d.src2 = rt;
            d.disasm = format!("beq {}, {}, {:#x}", r(rs), r(rt), branch_target(pc, imm16));
        }
        0x05 => {
            d.op = Op::Bne;
            d.src1 = rs;
            d.src2 = rt;
            d.disasm = format!("bne {}, {}, {:#x}", r(rs), r(rt), branch_target(pc, imm16));
        }
        0x06 => {
            d.op = Op::Blez;
            d.src1 = rs;
            d.disasm = format!("blez {}, {:#x}", r(rs), branch_target(pc, imm16));
        }
        0x07 => {
            d.op = Op::Bgtz;
            d.src1 = rs;
            d.disasm = format!("bgtz {}, {:#x}", r(rs), branch_target(pc, imm16));
        }
        opcode @ (0x08..=0x0E) => {
            let (op, name) = match opcode {
                0x08 => (Op::Addi, "addi"),
                0x09 => (Op::Addiu, "addiu"),
                0x0A => (Op::Slti, "slti"),
                0x0B => (Op::Sltiu, "sltiu"),
                0x0C => (Op::Andi, "andi"),
                0x0D => (Op::Ori, "ori"),
                _ => (Op::Xori, "xori"),
            };
            d.op = op;
            d.src1 = rs;
            d.dst = rt;
            d.disasm = format!("{name} {}, {}, {imm16:#x}", r(rt), r(rs));
        }
        0x0F => {
            d.op = Op::Lui;
            d.dst = rt;
            d.disasm = format!("lui {}, {imm16:#x}", r(rt));
        }
        opcode @ (0x20 | 0x21 | 0x23 | 0x24 | 0x25) => {
            let (op, name) = match opcode {
                0x20 => (Op::Lb, "lb"),
                0x21 => (Op::Lh, "lh"),
                0x23 => (Op::Lw, "lw"),
                0x24 => (Op::Lbu, "lbu"),
                _ => (Op::Lhu, "lhu"),
            };
            d.op = op;
            d.src1 = rs;
            d.dst = rt;
            d.disasm = format!("{name} {}, {imm16:#x}({})", r(rt), r(rs));
        }
        opcode @ (0x28 | 0x29 | 0x2B) => {
            let (op, name) = match opcode {
                0x28 => (Op::Sb, "sb"),
                0x29 => (Op::Sh, "sh"),
                _ => (Op::Sw, "sw"),
            };
            d.op = op;
            d.src1 = rs;
            d.src2 = rt;
            d.disasm = format!("{name} {}, {imm16:#x}({})", r(rt), r(rs));
        }
        _ => unknown(&mut d, raw),
    }

    d
}

fn unknown(d: &mut Decoded, raw: u32) {
    d.op = Op::Unknown;
    d.src1 = REG_ZERO;
    d.src2 = REG_ZERO;
    d.dst = REG_ZERO;
    d.dst2 = REG_ZERO;
    d.trap = Some(Trap::UnknownInstruction);
    d.disasm = format!("unknown ({raw:#010x})");
}
