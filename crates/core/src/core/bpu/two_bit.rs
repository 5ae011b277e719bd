//! Dynamic 2-bit direction policy.
//!
//! The default predictor: a BTB hit whose saturating counter has reached the
//! taken threshold predicts taken to the stored target. Two consecutive
//! observations are needed to flip a strongly-held direction, which filters
//! out one-off deviations in loop exits.

use super::btb::{Btb, TAKEN_THRESHOLD};
use super::BranchPredictor;
use crate::common::Addr;

pub struct TwoBitPredictor {
    btb: Btb,
}

impl TwoBitPredictor {
    pub fn new(size: u32, ways: u32) -> Self {
        Self {
            btb: Btb::new(size, ways),
        }
    }
}

impl BranchPredictor for TwoBitPredictor {
    fn is_taken(&self, pc: Addr) -> bool {
        self.btb
            .lookup(pc)
            .is_some_and(|hit| hit.counter >= TAKEN_THRESHOLD)
    }

    fn get_target(&self, pc: Addr) -> Addr {
        match self.btb.lookup(pc) {
            Some(hit) if hit.counter >= TAKEN_THRESHOLD => hit.target,
            _ => pc.wrapping_add(4),
        }
    }

    fn update(&mut self, taken: bool, pc: Addr, target: Addr) {
        self.btb.update(taken, pc, target);
    }
}
