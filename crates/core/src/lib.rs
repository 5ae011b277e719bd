//! Cycle-accurate MIPS pipeline simulator library.
//!
//! This crate implements a performance simulator for a classic five-stage
//! in-order MIPS pipeline, together with the functional reference model it is
//! checked against. It provides:
//! 1. **Common:** address alias, timing primitives (`Cycle`, `Latency`), and error types.
//! 2. **Ports:** the latency-carrying inter-stage communication fabric.
//! 3. **ISA:** MIPS-I decoding, disassembly, and ABI register names.
//! 4. **Core:** the instruction carrier, register file, and branch prediction unit.
//! 5. **Memory:** ELF loading and the flat byte-addressed instruction/data memory.
//! 6. **Simulation:** the functional simulator (also the lockstep checker) and
//!    the five-stage performance simulator.

/// Common types: addresses, timing primitives, and errors.
pub mod common;
/// Simulator configuration (defaults, branch predictor options).
pub mod config;
/// Architectural components: instruction carrier, register file, branch prediction.
pub mod core;
/// MIPS-I instruction set: decoding, disassembly, ABI names, traps.
pub mod isa;
/// ELF loading and flat memory.
pub mod memory;
/// Inter-stage port fabric.
pub mod ports;
/// Functional and performance simulators.
pub mod sim;
/// Run statistics and the end-of-run summary.
pub mod stats;

/// Root configuration type; use `SimConfig::default()` or build from CLI options.
pub use crate::config::SimConfig;
/// Reference functional simulator; also drives the lockstep checker.
pub use crate::sim::func_sim::FuncSim;
/// Five-stage performance simulator; construct with `PerfSim::new`.
pub use crate::sim::perf_sim::PerfSim;
