//! MIPS simulator CLI.
//!
//! Single entry point for both simulation modes:
//! 1. **Performance run (default):** the cycle-accurate five-stage pipeline,
//!    co-simulated against the functional checker.
//! 2. **Functional run (`-f`):** the reference functional simulator alone.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use mips_core::common::error::SimError;
use mips_core::config::{BpConfig, BpMode, SimConfig};
use mips_core::{FuncSim, PerfSim};

#[derive(Parser, Debug)]
#[command(
    name = "mips-sim",
    version,
    about = "Functional and performance simulators for MIPS-based CPU"
)]
struct Cli {
    /// ELF binary to simulate
    #[arg(short = 'b', long = "binary")]
    binary: PathBuf,

    /// Number of instructions to run
    #[arg(short = 'n', long = "numsteps")]
    numsteps: u64,

    /// Branch prediction mode (dynamic_two_bit, always_taken,
    /// always_not_taken, static_backward_taken)
    #[arg(long = "bp-mode", default_value = "dynamic_two_bit")]
    bp_mode: String,

    /// BTB size in entries
    #[arg(long = "bp-size", default_value_t = BpConfig::default_size())]
    bp_size: u32,

    /// Number of ways in BTB
    #[arg(long = "bp-ways", default_value_t = BpConfig::default_ways())]
    bp_ways: u32,

    /// Run the functional simulator only
    #[arg(short = 'f', long = "functional-only")]
    functional_only: bool,

    /// Print the per-stage disassembly log
    #[arg(short = 'd', long = "disassembly")]
    disassembly: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), SimError> {
    if cli.functional_only {
        let mut sim = FuncSim::new(&cli.binary)?;
        sim.set_log(cli.disassembly);
        return sim.run(cli.numsteps);
    }

    let mode: BpMode = cli.bp_mode.parse().map_err(SimError::Config)?;
    let config = SimConfig {
        bp: BpConfig {
            mode,
            size: cli.bp_size,
            ways: cli.bp_ways,
        },
        log: cli.disassembly,
    };

    let mut sim = PerfSim::new(&config)?;
    sim.run(&cli.binary, cli.numsteps)?;
    Ok(())
}
