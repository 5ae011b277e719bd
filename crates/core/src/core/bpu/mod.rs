//! Branch prediction unit.
//!
//! Every predictor answers the same three questions: will the instruction at
//! this PC redirect control (`is_taken`), where to (`get_target`), and how
//! should a resolved outcome train it (`update`). The concrete policies live
//! behind the `Bpu` enum for static dispatch; `Bpu::create` is the
//! config-driven factory and the single place predictor geometry is
//! validated.

pub use self::btb::{Btb, BtbHit};

/// Branch Target Buffer shared by the direction policies.
pub mod btb;
/// Always-taken, always-not-taken, and backward-taken policies.
pub mod static_bp;
/// The default dynamic 2-bit policy.
pub mod two_bit;

use self::static_bp::{AlwaysNotTaken, AlwaysTaken, BackwardTaken};
use self::two_bit::TwoBitPredictor;
use crate::common::error::SimError;
use crate::common::Addr;
use crate::config::{BpConfig, BpMode};

/// Capability set of a branch predictor.
pub trait BranchPredictor {
    /// Direction prediction for the instruction at `pc`.
    fn is_taken(&self, pc: Addr) -> bool;

    /// Target prediction for the instruction at `pc`: the stored target when
    /// predicting taken, the sequential `pc + 4` otherwise.
    fn get_target(&self, pc: Addr) -> Addr;

    /// Trains the predictor with a resolved outcome.
    fn update(&mut self, taken: bool, pc: Addr, target: Addr);
}

/// Enum dispatch over the closed set of predictor variants.
pub enum Bpu {
    DynamicTwoBit(TwoBitPredictor),
    AlwaysTaken(AlwaysTaken),
    AlwaysNotTaken(AlwaysNotTaken),
    StaticBackwardTaken(BackwardTaken),
}

impl Bpu {
    /// Builds the configured predictor, validating BTB geometry: `size` must
    /// be a nonzero power of two and `ways` must divide it.
    pub fn create(config: &BpConfig) -> Result<Self, SimError> {
        let (size, ways) = (config.size, config.ways);
        if size == 0 || !size.is_power_of_two() {
            return Err(SimError::Config(format!(
                "bp-size must be a nonzero power of two, got {size}"
            )));
        }
        if ways == 0 || size % ways != 0 {
            return Err(SimError::Config(format!(
                "bp-ways must divide bp-size, got {ways} ways for {size} entries"
            )));
        }

        Ok(match config.mode {
            BpMode::DynamicTwoBit => Self::DynamicTwoBit(TwoBitPredictor::new(size, ways)),
            BpMode::AlwaysTaken => Self::AlwaysTaken(AlwaysTaken::new(size, ways)),
            BpMode::AlwaysNotTaken => Self::AlwaysNotTaken(AlwaysNotTaken),
            BpMode::StaticBackwardTaken => {
                Self::StaticBackwardTaken(BackwardTaken::new(size, ways))
            }
        })
    }
}

impl BranchPredictor for Bpu {
    fn is_taken(&self, pc: Addr) -> bool {
        match self {
            Self::DynamicTwoBit(bp) => bp.is_taken(pc),
            Self::AlwaysTaken(bp) => bp.is_taken(pc),
            Self::AlwaysNotTaken(bp) => bp.is_taken(pc),
            Self::StaticBackwardTaken(bp) => bp.is_taken(pc),
        }
    }

    fn get_target(&self, pc: Addr) -> Addr {
        match self {
            Self::DynamicTwoBit(bp) => bp.get_target(pc),
            Self::AlwaysTaken(bp) => bp.get_target(pc),
            Self::AlwaysNotTaken(bp) => bp.get_target(pc),
            Self::StaticBackwardTaken(bp) => bp.get_target(pc),
        }
    }

    fn update(&mut self, taken: bool, pc: Addr, target: Addr) {
        match self {
            Self::DynamicTwoBit(bp) => bp.update(taken, pc, target),
            Self::AlwaysTaken(bp) => bp.update(taken, pc, target),
            Self::AlwaysNotTaken(bp) => bp.update(taken, pc, target),
            Self::StaticBackwardTaken(bp) => bp.update(taken, pc, target),
        }
    }
}
