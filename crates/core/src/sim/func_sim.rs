//! Functional simulator.
//!
//! One instruction per step, fully architectural: fetch, decode, read
//! sources, execute, load/store, write back, advance the PC. `PerfSim` runs
//! one of these in lockstep as its retirement checker; the CLI exposes it
//! directly as the functional-only mode.

use std::path::Path;

use crate::common::error::SimError;
use crate::common::Addr;
use crate::core::instr::FuncInstr;
use crate::core::rf::RegisterFile;
use crate::memory::MipsMemory;

pub struct FuncSim {
    mem: MipsMemory,
    rf: RegisterFile,
    pc: Addr,
    log: bool,
}

impl FuncSim {
    /// Loads the trace and points the PC at its entry. Fatal on a missing or
    /// unloadable trace.
    pub fn new(trace: &Path) -> Result<Self, SimError> {
        let mem = MipsMemory::new(trace)?;
        let pc = mem.start_pc();
        Ok(Self {
            mem,
            rf: RegisterFile::new(),
            pc,
            log: false,
        })
    }

    /// Enables per-instruction dump printing in `run`.
    pub fn set_log(&mut self, log: bool) {
        self.log = log;
    }

    /// Executes the next architectural instruction and returns it completed.
    pub fn step(&mut self) -> FuncInstr {
        let raw = self.mem.fetch(self.pc);
        let mut instr = FuncInstr::new(raw, self.pc, false, self.pc.wrapping_add(4));
        self.rf.read_sources(&mut instr);
        instr.execute();
        self.mem.load_store(&mut instr);
        self.rf.write_dst(&instr);
        self.pc = instr.new_pc();
        instr
    }

    /// Runs `instrs_to_run` instructions, failing on the first trap.
    pub fn run(&mut self, instrs_to_run: u64) -> Result<(), SimError> {
        for _ in 0..instrs_to_run {
            let instr = self.step();
            if self.log {
                println!("{instr}");
            }
            instr.check_trap()?;
        }
        Ok(())
    }

    /// Architectural register read, for inspection after a run.
    pub fn read_reg(&self, reg: usize) -> u32 {
        self.rf.read(reg)
    }
}
