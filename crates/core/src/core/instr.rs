//! The instruction carrier.
//!
//! `FuncInstr` is the value that flows through the pipeline's port latches:
//! one decoded instruction together with its operand values, its branch
//! prediction annotations, and (after `execute`/`load_store`) its results.
//! It is freely clonable and deliberately compact; its size is reported in
//! the end-of-run summary.

use std::fmt;

use crate::common::error::SimError;
use crate::common::Addr;
use crate::isa::{self, abi, Op, Trap};
use crate::memory::MipsMemory;

/// One in-flight instruction.
#[derive(Clone, Debug)]
pub struct FuncInstr {
    op: Op,
    pc: Addr,
    new_pc: Addr,
    src1: usize,
    src2: usize,
    dst: usize,
    dst2: usize,
    imm: u32,
    v_src1: u32,
    v_src2: u32,
    v_dst: u32,
    v_dst2: u32,
    mem_addr: Addr,
    jump_taken: bool,
    predicted_taken: bool,
    predicted_target: Addr,
    has_dst_value: bool,
    trap: Option<Trap>,
    disasm: String,
}

impl FuncInstr {
    /// Decodes `raw`, fetched at `pc`, carrying the fetch stage's prediction.
    pub fn new(raw: u32, pc: Addr, predicted_taken: bool, predicted_target: Addr) -> Self {
        let d = isa::decode(raw, pc);
        Self {
            op: d.op,
            pc,
            new_pc: pc.wrapping_add(4),
            src1: d.src1,
            src2: d.src2,
            dst: d.dst,
            dst2: d.dst2,
            imm: d.imm,
            v_src1: 0,
            v_src2: 0,
            v_dst: 0,
            v_dst2: 0,
            mem_addr: 0,
            jump_taken: false,
            predicted_taken,
            predicted_target,
            has_dst_value: false,
            trap: d.trap,
            disasm: d.disasm,
        }
    }

    pub fn pc(&self) -> Addr {
        self.pc
    }

    /// The architecturally correct next PC. Valid after `execute`.
    pub fn new_pc(&self) -> Addr {
        self.new_pc
    }

    pub fn src1(&self) -> usize {
        self.src1
    }

    pub fn src2(&self) -> usize {
        self.src2
    }

    pub fn dst(&self) -> usize {
        self.dst
    }

    /// Second destination (HI for multiply/divide), `$zero` when unused.
    pub fn dst2(&self) -> usize {
        self.dst2
    }

    pub fn v_dst(&self) -> u32 {
        self.v_dst
    }

    pub fn v_dst2(&self) -> u32 {
        self.v_dst2
    }

    pub fn set_v_src1(&mut self, value: u32) {
        self.v_src1 = value;
    }

    pub fn set_v_src2(&mut self, value: u32) {
        self.v_src2 = value;
    }

    /// True for every control-flow instruction.
    pub fn is_jump(&self) -> bool {
        self.op.is_jump()
    }

    /// Whether the jump actually redirected control. Valid after `execute`.
    pub fn is_jump_taken(&self) -> bool {
        self.jump_taken
    }

    pub fn predicted_taken(&self) -> bool {
        self.predicted_taken
    }

    pub fn predicted_target(&self) -> Addr {
        self.predicted_target
    }

    /// The fetched path diverges from the resolved one: wrong direction, or
    /// right direction to the wrong target.
    pub fn is_misprediction(&self) -> bool {
        self.predicted_taken != self.jump_taken
            || (self.predicted_taken && self.predicted_target != self.new_pc)
    }

    /// Fatal if the functional model recorded a trap on this instruction.
    pub fn check_trap(&self) -> Result<(), SimError> {
        match self.trap {
            Some(trap) => Err(SimError::Trap { pc: self.pc, trap }),
            None => Ok(()),
        }
    }

    /// Computes the result and the architectural next PC.
    ///
    /// Sources must have been populated by `RegisterFile::read_sources`.
    /// Loads get their destination value later, in `load_store`.
    pub fn execute(&mut self) {
        let a = self.v_src1;
        let b = self.v_src2;
        let mut next = self.pc.wrapping_add(4);

        match self.op {
            Op::Sll => self.set_dst(a.wrapping_shl(self.imm)),
            Op::Srl => self.set_dst(a.wrapping_shr(self.imm)),
            Op::Sra => self.set_dst(((a as i32) >> self.imm) as u32),
            Op::Sllv => self.set_dst(b.wrapping_shl(a & 0x1F)),
            Op::Srlv => self.set_dst(b.wrapping_shr(a & 0x1F)),
            Op::Srav => self.set_dst(((b as i32) >> (a & 0x1F)) as u32),
            Op::Jr => {
                next = a;
                self.jump_taken = true;
            }
            Op::Jalr => {
                self.set_dst(self.pc.wrapping_add(4));
                next = a;
                self.jump_taken = true;
            }
            Op::Syscall | Op::Break | Op::Unknown => {}
            Op::Mfhi | Op::Mthi | Op::Mflo | Op::Mtlo => self.set_dst(a),
            Op::Mult => {
                let product = (a as i32 as i64).wrapping_mul(b as i32 as i64);
                self.set_hi_lo(product as u64);
            }
            Op::Multu => {
                let product = (a as u64).wrapping_mul(b as u64);
                self.set_hi_lo(product);
            }
            Op::Div => {
                if b != 0 {
                    let quot = (a as i32).wrapping_div(b as i32) as u32;
                    let rem = (a as i32).wrapping_rem(b as i32) as u32;
                    self.set_hi_lo((rem as u64) << 32 | quot as u64);
                } else {
                    self.set_hi_lo(0);
                }
            }
            Op::Divu => {
                if b != 0 {
                    self.set_hi_lo(((a % b) as u64) << 32 | (a / b) as u64);
                } else {
                    self.set_hi_lo(0);
                }
            }
            Op::Add | Op::Addu => self.set_dst(a.wrapping_add(b)),
            Op::Sub | Op::Subu => self.set_dst(a.wrapping_sub(b)),
            Op::And => self.set_dst(a & b),
            Op::Or => self.set_dst(a | b),
            Op::Xor => self.set_dst(a ^ b),
            Op::Nor => self.set_dst(!(a | b)),
            Op::Slt => self.set_dst(((a as i32) < (b as i32)) as u32),
            Op::Sltu => self.set_dst((a < b) as u32),
            Op::Bltz => next = self.branch((a as i32) < 0),
            Op::Bgez => next = self.branch((a as i32) >= 0),
            Op::Beq => next = self.branch(a == b),
            Op::Bne => next = self.branch(a != b),
            Op::Blez => next = self.branch((a as i32) <= 0),
            Op::Bgtz => next = self.branch((a as i32) > 0),
            Op::Addi | Op::Addiu => self.set_dst(a.wrapping_add(isa::sext16(self.imm) as u32)),
            Op::Slti => self.set_dst(((a as i32) < isa::sext16(self.imm)) as u32),
            Op::Sltiu => self.set_dst((a < isa::sext16(self.imm) as u32) as u32),
            Op::Andi => self.set_dst(a & self.imm),
            Op::Ori => self.set_dst(a | self.imm),
            Op::Xori => self.set_dst(a ^ self.imm),
            Op::Lui => self.set_dst(self.imm << 16),
            Op::Lb | Op::Lh | Op::Lw | Op::Lbu | Op::Lhu | Op::Sb | Op::Sh | Op::Sw => {
                self.mem_addr = a.wrapping_add(isa::sext16(self.imm) as u32);
            }
            Op::J => {
                next = isa::jump_target(self.pc, self.imm);
                self.jump_taken = true;
            }
            Op::Jal => {
                self.set_dst(self.pc.wrapping_add(4));
                next = isa::jump_target(self.pc, self.imm);
                self.jump_taken = true;
            }
        }

        self.new_pc = next;
    }

    /// Performs the load or store side effect, if any. Valid after `execute`.
    pub fn load_store(&mut self, mem: &mut MipsMemory) {
        match self.op {
            Op::Lb => self.set_loaded(mem.read(self.mem_addr, 1, true)),
            Op::Lh => self.set_loaded(mem.read(self.mem_addr, 2, true)),
            Op::Lw => self.set_loaded(mem.read(self.mem_addr, 4, false)),
            Op::Lbu => self.set_loaded(mem.read(self.mem_addr, 1, false)),
            Op::Lhu => self.set_loaded(mem.read(self.mem_addr, 2, false)),
            Op::Sb => mem.write(self.mem_addr, self.v_src2, 1),
            Op::Sh => mem.write(self.mem_addr, self.v_src2, 2),
            Op::Sw => mem.write(self.mem_addr, self.v_src2, 4),
            _ => {}
        }
    }

    /// The deterministic textual dump, compared verbatim against the checker.
    pub fn dump(&self) -> String {
        let mut s = format!("{:#x}: {}", self.pc, self.disasm);
        if self.has_dst_value && self.dst != abi::REG_ZERO {
            s.push_str(&format!(
                "\t [ {} = {:#x}",
                abi::reg_name(self.dst),
                self.v_dst
            ));
            if self.dst2 != abi::REG_ZERO {
                s.push_str(&format!(
                    ", {} = {:#x}",
                    abi::reg_name(self.dst2),
                    self.v_dst2
                ));
            }
            s.push(']');
        }
        s
    }

    fn set_dst(&mut self, value: u32) {
        self.v_dst = value;
        self.has_dst_value = true;
    }

    fn set_loaded(&mut self, value: u32) {
        self.v_dst = value;
        self.has_dst_value = true;
    }

    /// LO in the low word, HI in the high word.
    fn set_hi_lo(&mut self, value: u64) {
        self.v_dst = value as u32;
        self.v_dst2 = (value >> 32) as u32;
        self.has_dst_value = true;
    }

    fn branch(&mut self, condition: bool) -> Addr {
        self.jump_taken = condition;
        if condition {
            isa::branch_target(self.pc, self.imm)
        } else {
            self.pc.wrapping_add(4)
        }
    }
}

impl fmt::Display for FuncInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}
