//! Five-stage in-order performance simulator.
//!
//! The pipeline controller: it owns the port fabric, the register file, the
//! branch predictor, and the speculative PC, and drives the five stage
//! routines once per cycle in reverse pipeline order (writeback, fetch,
//! decode, execute, memory). Because every port carries at least one cycle of
//! latency, a stage invoked later in the cycle can never observe a value
//! written earlier in the same cycle, so the fixed order is free of
//! intra-cycle hazards.
//!
//! Stall and flush are ordinary port traffic: decode stalls fetch through
//! `DECODE_2_FETCH_STALL` while recirculating the blocked instruction on its
//! self-loop, and memory broadcasts `MEMORY_2_ALL_FLUSH` (fanout 4) plus the
//! corrected fetch target when it detects a misprediction.

use std::path::Path;

use crate::common::error::SimError;
use crate::common::timing::{Cycle, Latency};
use crate::common::Addr;
use crate::config::SimConfig;
use crate::core::bpu::{BranchPredictor, Bpu};
use crate::core::instr::FuncInstr;
use crate::core::rf::RegisterFile;
use crate::memory::MipsMemory;
use crate::ports::{PortMap, ReadPort, WritePort};
use crate::sim::func_sim::FuncSim;
use crate::stats::RunStats;

const PORT_LATENCY: Latency = Latency::new(1);
const PORT_FANOUT: u32 = 1;
const PORT_BW: u32 = 1;
/// Stages drained by one flush broadcast: fetch, decode, execute, memory.
const FLUSHED_STAGES_NUM: u32 = 4;
/// Cycles without a retirement after which the model is declared wedged.
const DEADLOCK_WINDOW: Latency = Latency::new(10);

/// Contents of the fetch→decode latch.
#[derive(Clone, Copy, Debug)]
pub struct IfIdData {
    pub raw: u32,
    pub pc: Addr,
    pub predicted_taken: bool,
    pub predicted_target: Addr,
}

/// The pipeline controller.
pub struct PerfSim {
    ports: PortMap,
    /// Architectural register file; mutated by decode (reserve/read),
    /// execute/memory (cancel on flush), and writeback (commit).
    pub rf: RegisterFile,
    bp: Bpu,
    /// PC of the instruction fetch is presenting this cycle.
    pc: Addr,
    /// Speculative next PC, maintained by fetch.
    new_pc: Addr,
    executed_instrs: u64,
    last_writeback_cycle: Cycle,
    log: bool,

    wp_fetch_2_decode: WritePort<IfIdData>,
    rp_fetch_2_decode: ReadPort<IfIdData>,
    wp_decode_2_fetch_stall: WritePort<bool>,
    rp_decode_2_fetch_stall: ReadPort<bool>,
    wp_decode_2_decode: WritePort<FuncInstr>,
    rp_decode_2_decode: ReadPort<FuncInstr>,
    wp_decode_2_execute: WritePort<FuncInstr>,
    rp_decode_2_execute: ReadPort<FuncInstr>,
    wp_execute_2_memory: WritePort<FuncInstr>,
    rp_execute_2_memory: ReadPort<FuncInstr>,
    wp_memory_2_writeback: WritePort<FuncInstr>,
    rp_memory_2_writeback: ReadPort<FuncInstr>,

    wp_memory_2_all_flush: WritePort<bool>,
    rp_fetch_flush: ReadPort<bool>,
    rp_decode_flush: ReadPort<bool>,
    rp_execute_flush: ReadPort<bool>,
    rp_memory_flush: ReadPort<bool>,
    wp_memory_2_fetch_target: WritePort<Addr>,
    rp_memory_2_fetch_target: ReadPort<Addr>,
}

impl PerfSim {
    /// Wires the ports, builds the configured predictor, and seals the
    /// topology. Fatal on bad predictor configuration.
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        let mut ports = PortMap::new();

        let wp_fetch_2_decode = ports.make_write_port("FETCH_2_DECODE", PORT_BW, PORT_FANOUT)?;
        let rp_fetch_2_decode = ports.make_read_port("FETCH_2_DECODE", PORT_LATENCY)?;
        let wp_decode_2_fetch_stall =
            ports.make_write_port("DECODE_2_FETCH_STALL", PORT_BW, PORT_FANOUT)?;
        let rp_decode_2_fetch_stall = ports.make_read_port("DECODE_2_FETCH_STALL", PORT_LATENCY)?;

        let wp_decode_2_decode = ports.make_write_port("DECODE_2_DECODE", PORT_BW, PORT_FANOUT)?;
        let rp_decode_2_decode = ports.make_read_port("DECODE_2_DECODE", PORT_LATENCY)?;

        let wp_decode_2_execute =
            ports.make_write_port("DECODE_2_EXECUTE", PORT_BW, PORT_FANOUT)?;
        let rp_decode_2_execute = ports.make_read_port("DECODE_2_EXECUTE", PORT_LATENCY)?;

        let wp_execute_2_memory =
            ports.make_write_port("EXECUTE_2_MEMORY", PORT_BW, PORT_FANOUT)?;
        let rp_execute_2_memory = ports.make_read_port("EXECUTE_2_MEMORY", PORT_LATENCY)?;

        let wp_memory_2_writeback =
            ports.make_write_port("MEMORY_2_WRITEBACK", PORT_BW, PORT_FANOUT)?;
        let rp_memory_2_writeback = ports.make_read_port("MEMORY_2_WRITEBACK", PORT_LATENCY)?;

        // Branch misprediction unit ports: one flush broadcast, four readers.
        let wp_memory_2_all_flush =
            ports.make_write_port("MEMORY_2_ALL_FLUSH", PORT_BW, FLUSHED_STAGES_NUM)?;
        let rp_fetch_flush = ports.make_read_port("MEMORY_2_ALL_FLUSH", PORT_LATENCY)?;
        let rp_decode_flush = ports.make_read_port("MEMORY_2_ALL_FLUSH", PORT_LATENCY)?;
        let rp_execute_flush = ports.make_read_port("MEMORY_2_ALL_FLUSH", PORT_LATENCY)?;
        let rp_memory_flush = ports.make_read_port("MEMORY_2_ALL_FLUSH", PORT_LATENCY)?;

        let wp_memory_2_fetch_target =
            ports.make_write_port("MEMORY_2_FETCH_TARGET", PORT_BW, PORT_FANOUT)?;
        let rp_memory_2_fetch_target = ports.make_read_port("MEMORY_2_FETCH_TARGET", PORT_LATENCY)?;

        let bp = Bpu::create(&config.bp)?;

        ports.init_ports()?;

        Ok(Self {
            ports,
            rf: RegisterFile::new(),
            bp,
            pc: 0,
            new_pc: 0,
            executed_instrs: 0,
            last_writeback_cycle: Cycle::ZERO,
            log: config.log,
            wp_fetch_2_decode,
            rp_fetch_2_decode,
            wp_decode_2_fetch_stall,
            rp_decode_2_fetch_stall,
            wp_decode_2_decode,
            rp_decode_2_decode,
            wp_decode_2_execute,
            rp_decode_2_execute,
            wp_execute_2_memory,
            rp_execute_2_memory,
            wp_memory_2_writeback,
            rp_memory_2_writeback,
            wp_memory_2_all_flush,
            rp_fetch_flush,
            rp_decode_flush,
            rp_execute_flush,
            rp_memory_flush,
            wp_memory_2_fetch_target,
            rp_memory_2_fetch_target,
        })
    }

    /// Simulates until `instrs_to_run` instructions retire.
    ///
    /// Returns the run's counters after printing the summary block.
    /// Terminates with an error on trap, checker mismatch, deadlock, or port
    /// protocol violation.
    pub fn run(&mut self, trace: &Path, instrs_to_run: u64) -> Result<RunStats, SimError> {
        if instrs_to_run >= 1 << 32 {
            return Err(SimError::Config(format!(
                "cannot run {instrs_to_run} instructions, the limit is 2^32"
            )));
        }

        let mut memory = MipsMemory::new(trace)?;
        let mut checker = FuncSim::new(trace)?;
        self.new_pc = memory.start_pc();

        let mut stats = RunStats::new();
        let mut cycle = Cycle::ZERO;

        while self.executed_instrs < instrs_to_run {
            self.clock_writeback(cycle, &mut checker)?;
            self.clock_fetch(cycle, &memory)?;
            self.clock_decode(cycle)?;
            self.clock_execute(cycle)?;
            self.clock_memory(cycle, &mut memory)?;
            cycle.inc();

            if self.log {
                println!("Executed instructions: {}\n", self.executed_instrs);
            }

            self.ports.check_ports(cycle)?;
        }

        stats.cycles = cycle;
        stats.executed_instrs = self.executed_instrs;
        stats.print();
        Ok(stats)
    }

    /// Fetch: pick this cycle's PC (flush target wins over stall, stall
    /// holds, otherwise the speculative next PC), fetch the raw word, consult
    /// the predictor, and advance the speculative PC along the predicted
    /// path.
    fn clock_fetch(&mut self, cycle: Cycle, memory: &MipsMemory) -> Result<(), SimError> {
        let is_flush = if self.rp_fetch_flush.is_ready(cycle) {
            self.rp_fetch_flush.read(cycle)?
        } else {
            false
        };
        let is_stall = if self.rp_decode_2_fetch_stall.is_ready(cycle) {
            self.rp_decode_2_fetch_stall.read(cycle)?
        } else {
            false
        };

        if is_flush {
            // Memory resolved a misprediction: redirect unconditionally.
            self.pc = self.rp_memory_2_fetch_target.read(cycle)?;
        } else if !is_stall {
            self.pc = self.new_pc;
        }

        let raw = memory.fetch(self.pc);
        let data = IfIdData {
            raw,
            pc: self.pc,
            predicted_taken: self.bp.is_taken(self.pc),
            predicted_target: self.bp.get_target(self.pc),
        };
        self.new_pc = data.predicted_target;

        self.wp_fetch_2_decode.write(data, cycle)?;

        if self.log {
            println!("fetch   cycle {cycle}: {:#x}: {raw:#x}", self.pc);
        }
        Ok(())
    }

    /// Decode: resolve the instruction source (self-loop beats fresh fetch
    /// under stall), then either dispatch to execute or stall fetch and
    /// recirculate on a data hazard.
    fn clock_decode(&mut self, cycle: Cycle) -> Result<(), SimError> {
        let is_flush = if self.rp_decode_flush.is_ready(cycle) {
            self.rp_decode_flush.read(cycle)?
        } else {
            false
        };

        if is_flush {
            // Whatever is latched belongs to the wrong path.
            self.rp_fetch_2_decode.ignore(cycle);
            self.rp_decode_2_decode.ignore(cycle);
            if self.log {
                println!("decode  cycle {cycle}: flush");
            }
            return Ok(());
        }

        if !self.rp_fetch_2_decode.is_ready(cycle) && !self.rp_decode_2_decode.is_ready(cycle) {
            if self.log {
                println!("decode  cycle {cycle}: bubble");
            }
            return Ok(());
        }

        let mut instr = self.read_instr(cycle)?;

        if self.rf.check_sources(&instr) {
            self.rf.read_sources(&mut instr);
            if self.log {
                println!("decode  cycle {cycle}: {instr}");
            }
            self.wp_decode_2_execute.write(instr, cycle)?;
        } else {
            // Data hazard: hold fetch and retry this instruction next cycle.
            self.wp_decode_2_fetch_stall.write(true, cycle)?;
            if self.log {
                println!("decode  cycle {cycle}: {instr} (data hazard)");
            }
            self.wp_decode_2_decode.write(instr, cycle)?;
        }
        Ok(())
    }

    /// The stalled instruction recirculating on the self-loop takes priority;
    /// the fetch stage was told to stall last cycle and is re-presenting the
    /// same PC, so the fresh latch is dropped.
    fn read_instr(&mut self, cycle: Cycle) -> Result<FuncInstr, SimError> {
        if self.rp_decode_2_decode.is_ready(cycle) {
            self.rp_fetch_2_decode.ignore(cycle);
            return Ok(self.rp_decode_2_decode.read(cycle)?);
        }
        let data = self.rp_fetch_2_decode.read(cycle)?;
        Ok(FuncInstr::new(
            data.raw,
            data.pc,
            data.predicted_taken,
            data.predicted_target,
        ))
    }

    /// Execute: run the functional model's compute step and forward.
    fn clock_execute(&mut self, cycle: Cycle) -> Result<(), SimError> {
        let is_flush = if self.rp_execute_flush.is_ready(cycle) {
            self.rp_execute_flush.read(cycle)?
        } else {
            false
        };

        if is_flush {
            if self.rp_decode_2_execute.is_ready(cycle) {
                let instr = self.rp_decode_2_execute.read(cycle)?;
                self.rf.cancel(&instr);
            }
            if self.log {
                println!("execute cycle {cycle}: flush");
            }
            return Ok(());
        }

        if !self.rp_decode_2_execute.is_ready(cycle) {
            if self.log {
                println!("execute cycle {cycle}: bubble");
            }
            return Ok(());
        }

        let mut instr = self.rp_decode_2_execute.read(cycle)?;
        instr.execute();

        if self.log {
            println!("execute cycle {cycle}: {instr}");
        }
        self.wp_execute_2_memory.write(instr, cycle)?;
        Ok(())
    }

    /// Memory: resolve jumps against their predictions (training the
    /// predictor, flushing on misprediction), perform loads and stores, and
    /// forward to writeback.
    fn clock_memory(&mut self, cycle: Cycle, memory: &mut MipsMemory) -> Result<(), SimError> {
        let is_flush = if self.rp_memory_flush.is_ready(cycle) {
            self.rp_memory_flush.read(cycle)?
        } else {
            false
        };

        if is_flush {
            if self.rp_execute_2_memory.is_ready(cycle) {
                let instr = self.rp_execute_2_memory.read(cycle)?;
                self.rf.cancel(&instr);
            }
            if self.log {
                println!("memory  cycle {cycle}: flush");
            }
            return Ok(());
        }

        if !self.rp_execute_2_memory.is_ready(cycle) {
            if self.log {
                println!("memory  cycle {cycle}: bubble");
            }
            return Ok(());
        }

        let mut instr = self.rp_execute_2_memory.read(cycle)?;
        let mut mispredicted = false;

        if instr.is_jump() {
            let actually_taken = instr.is_jump_taken();
            let real_target = instr.new_pc();
            self.bp.update(actually_taken, instr.pc(), real_target);

            if instr.is_misprediction() {
                // Flush every earlier stage and hand fetch the real target.
                self.wp_memory_2_all_flush.write(true, cycle)?;
                self.wp_memory_2_fetch_target.write(real_target, cycle)?;
                mispredicted = true;
            }
        }

        memory.load_store(&mut instr);

        if self.log {
            let prefix = if mispredicted { "misprediction on " } else { "" };
            println!("memory  cycle {cycle}: {prefix}{instr}");
        }
        self.wp_memory_2_writeback.write(instr, cycle)?;
        Ok(())
    }

    /// Writeback: commit to the register file, check for traps, co-simulate
    /// against the checker, and count the retirement. A long enough stretch
    /// of bubbles here is a deadlock.
    fn clock_writeback(&mut self, cycle: Cycle, checker: &mut FuncSim) -> Result<(), SimError> {
        if !self.rp_memory_2_writeback.is_ready(cycle) {
            if self.log {
                println!("wb      cycle {cycle}: bubble");
            }
            if cycle >= self.last_writeback_cycle + DEADLOCK_WINDOW {
                return Err(SimError::Deadlock {
                    cycle,
                    last_retired: self.last_writeback_cycle,
                });
            }
            return Ok(());
        }

        let instr = self.rp_memory_2_writeback.read(cycle)?;

        self.rf.write_dst(&instr);
        instr.check_trap()?;

        if self.log {
            println!("wb      cycle {cycle}: {instr}");
        }

        self.check(checker, &instr)?;

        self.executed_instrs += 1;
        self.last_writeback_cycle = cycle;
        Ok(())
    }

    /// Lockstep co-simulation: the retiring instruction's dump must match the
    /// reference model's, byte for byte.
    fn check(&self, checker: &mut FuncSim, instr: &FuncInstr) -> Result<(), SimError> {
        let reference = checker.step();
        if reference.dump() != instr.dump() {
            return Err(SimError::CheckerMismatch {
                checker: reference.dump(),
                perf: instr.dump(),
            });
        }
        Ok(())
    }
}
