//! Architectural components of the modeled processor.

/// Branch prediction unit (BTB, direction policies, factory).
pub mod bpu;
/// The by-value instruction carrier.
pub mod instr;
/// Register file with in-flight hazard tracking.
pub mod rf;
