//! Cycle and latency primitives.
//!
//! Strong numeric types for points on the simulated clock (`Cycle`) and
//! distances between them (`Latency`). A `Latency` added to a `Cycle` yields
//! the cycle at which a value becomes observable; all arithmetic saturates so
//! that overflow can never wrap a timestamp backwards.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A point on the simulated clock. Starts at zero and only moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycle(u64);

/// A non-negative distance in cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Latency(u64);

impl Cycle {
    /// Cycle zero, the first cycle of a run.
    pub const ZERO: Cycle = Cycle(0);

    /// Wraps a raw cycle number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw cycle number.
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Advances the clock by one cycle.
    pub fn inc(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

impl Latency {
    /// Wraps a raw cycle delta.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw cycle delta.
    pub const fn val(self) -> u64 {
        self.0
    }
}

impl Add<Latency> for Cycle {
    type Output = Cycle;

    fn add(self, rhs: Latency) -> Cycle {
        Cycle(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign<Latency> for Cycle {
    fn add_assign(&mut self, rhs: Latency) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Cycle {
    type Output = Latency;

    /// Distance between two cycles, clamped at zero.
    fn sub(self, rhs: Cycle) -> Latency {
        Latency(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
