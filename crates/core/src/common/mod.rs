//! Common types shared across the simulator.

/// Fatal error kinds and the port protocol diagnostics.
pub mod error;
/// Cycle and latency arithmetic.
pub mod timing;

/// A 32-bit instruction or data address.
///
/// The modeled machine is a 32-bit MIPS; addresses wrap at the 4 GiB
/// boundary and are used directly as indices into the sparse memory.
pub type Addr = u32;
