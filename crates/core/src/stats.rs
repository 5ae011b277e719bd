//! Run statistics and the end-of-run summary.

use std::time::Instant;

use crate::common::timing::Cycle;
use crate::core::instr::FuncInstr;

/// Counters for one performance-simulator run.
///
/// Created when `run` starts (capturing the wall clock) and filled in as the
/// run ends; `print` emits the summary block.
#[derive(Debug)]
pub struct RunStats {
    start_time: Instant,
    /// Total simulated cycles.
    pub cycles: Cycle,
    /// Instructions retired by writeback.
    pub executed_instrs: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: Cycle::ZERO,
            executed_instrs: 0,
        }
    }

    /// Retired instructions per simulated cycle.
    pub fn ipc(&self) -> f64 {
        self.executed_instrs as f64 / (self.cycles.val().max(1)) as f64
    }

    /// Prints the summary block to stdout.
    pub fn print(&self) {
        let millis = self.start_time.elapsed().as_secs_f64() * 1e3;
        let millis = millis.max(1e-9);
        let freq_khz = self.cycles.val() as f64 / millis;
        let kips = self.executed_instrs as f64 / millis;

        println!();
        println!("****************************");
        println!("instrs:     {}", self.executed_instrs);
        println!("cycles:     {}", self.cycles);
        println!("IPC:        {:.4}", self.ipc());
        println!("sim freq:   {freq_khz:.2} kHz");
        println!("sim IPS:    {kips:.2} kips");
        println!("instr size: {} bytes", std::mem::size_of::<FuncInstr>());
        println!("****************************");
    }
}
