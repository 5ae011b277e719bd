//! Branch Target Buffer.
//!
//! A set-associative, tag-checked cache of branch outcomes keyed by
//! instruction address. Each entry holds the last observed target and a 2-bit
//! saturating direction counter; replacement is LRU within a set. The
//! direction policies in the sibling modules interpret the entry differently,
//! but they all share this storage.

use crate::common::Addr;

/// Counter value at and above which the dynamic policy predicts taken.
pub const TAKEN_THRESHOLD: u8 = 2;

const COUNTER_MAX: u8 = 3;

#[derive(Clone, Copy, Default)]
struct BtbEntry {
    tag: Addr,
    target: Addr,
    counter: u8,
    stamp: u64,
    valid: bool,
}

/// A successful lookup: the entry's direction counter and stored target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BtbHit {
    pub counter: u8,
    pub target: Addr,
}

/// The buffer itself. Geometry is validated by the predictor factory:
/// `size` is a power of two and `ways` divides it.
pub struct Btb {
    entries: Vec<BtbEntry>,
    ways: usize,
    set_count: usize,
    tick: u64,
}

impl Btb {
    pub fn new(size: u32, ways: u32) -> Self {
        Self {
            entries: vec![BtbEntry::default(); size as usize],
            ways: ways as usize,
            set_count: (size / ways) as usize,
            tick: 0,
        }
    }

    fn set_range(&self, pc: Addr) -> std::ops::Range<usize> {
        let set = ((pc >> 2) as usize) & (self.set_count - 1);
        set * self.ways..(set + 1) * self.ways
    }

    /// Tag-checked lookup.
    pub fn lookup(&self, pc: Addr) -> Option<BtbHit> {
        self.entries[self.set_range(pc)]
            .iter()
            .find(|e| e.valid && e.tag == pc)
            .map(|e| BtbHit {
                counter: e.counter,
                target: e.target,
            })
    }

    /// Trains the entry for `pc` with a resolved outcome.
    ///
    /// A hit moves the counter toward the outcome and, when taken, refreshes
    /// the stored target. A miss allocates over the set's LRU victim, seeding
    /// the counter in the weak state on the observed side.
    pub fn update(&mut self, taken: bool, pc: Addr, target: Addr) {
        self.tick += 1;
        let tick = self.tick;
        let range = self.set_range(pc);
        let set = &mut self.entries[range];

        if let Some(entry) = set.iter_mut().find(|e| e.valid && e.tag == pc) {
            if taken {
                entry.counter = (entry.counter + 1).min(COUNTER_MAX);
                entry.target = target;
            } else {
                entry.counter = entry.counter.saturating_sub(1);
            }
            entry.stamp = tick;
            return;
        }

        if let Some(victim) = set.iter_mut().min_by_key(|e| (e.valid, e.stamp)) {
            *victim = BtbEntry {
                tag: pc,
                target,
                counter: if taken {
                    TAKEN_THRESHOLD
                } else {
                    TAKEN_THRESHOLD - 1
                },
                stamp: tick,
                valid: true,
            };
        }
    }
}
