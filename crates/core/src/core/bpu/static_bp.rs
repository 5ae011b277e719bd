//! Static direction policies.
//!
//! Three predictors with no direction state of their own. The direction is
//! fixed by the policy; the BTB only supplies targets, which a static policy
//! cannot know until it has seen them resolve. Until then a taken prediction
//! falls through to the sequential `PC + 4`.

use super::btb::Btb;
use super::BranchPredictor;
use crate::common::Addr;

/// Predicts taken for every PC.
pub struct AlwaysTaken {
    btb: Btb,
}

impl AlwaysTaken {
    pub fn new(size: u32, ways: u32) -> Self {
        Self {
            btb: Btb::new(size, ways),
        }
    }
}

impl BranchPredictor for AlwaysTaken {
    fn is_taken(&self, _pc: Addr) -> bool {
        true
    }

    fn get_target(&self, pc: Addr) -> Addr {
        match self.btb.lookup(pc) {
            Some(hit) => hit.target,
            None => pc.wrapping_add(4),
        }
    }

    fn update(&mut self, taken: bool, pc: Addr, target: Addr) {
        self.btb.update(taken, pc, target);
    }
}

/// Predicts not-taken for every PC. Keeps no state at all.
#[derive(Default)]
pub struct AlwaysNotTaken;

impl BranchPredictor for AlwaysNotTaken {
    fn is_taken(&self, _pc: Addr) -> bool {
        false
    }

    fn get_target(&self, pc: Addr) -> Addr {
        pc.wrapping_add(4)
    }

    fn update(&mut self, _taken: bool, _pc: Addr, _target: Addr) {}
}

/// Predicts taken only for backward branches (loop closers): a BTB hit whose
/// stored target lies before the branch itself.
pub struct BackwardTaken {
    btb: Btb,
}

impl BackwardTaken {
    pub fn new(size: u32, ways: u32) -> Self {
        Self {
            btb: Btb::new(size, ways),
        }
    }
}

impl BranchPredictor for BackwardTaken {
    fn is_taken(&self, pc: Addr) -> bool {
        self.btb.lookup(pc).is_some_and(|hit| hit.target < pc)
    }

    fn get_target(&self, pc: Addr) -> Addr {
        match self.btb.lookup(pc) {
            Some(hit) if hit.target < pc => hit.target,
            _ => pc.wrapping_add(4),
        }
    }

    fn update(&mut self, taken: bool, pc: Addr, target: Addr) {
        self.btb.update(taken, pc, target);
    }
}
