//! Inter-stage port fabric.
//!
//! Pipeline stages never call each other; they communicate through named,
//! typed, latency-carrying ports. Each name binds exactly one `WritePort` to
//! a fixed number of `ReadPort`s: a value written at cycle `C` on a port whose
//! reader declares latency `L` becomes observable on that reader at `C + L`
//! and only then. The fabric provides:
//! 1. **`PortMap`:** the registry that owns the topology; ports are declared
//!    at construction, sealed once by `init_ports`, and consumed during the run.
//! 2. **`WritePort<T>` / `ReadPort<T>`:** the stage-facing handles.
//! 3. **`check_ports`:** the end-of-cycle sweep that turns any unconsumed,
//!    out-of-date latch value into a fatal diagnostic.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::common::error::PortError;
use crate::common::timing::{Cycle, Latency};

/// One reader's latch: a FIFO of values stamped with the cycle at which they
/// become observable.
struct Latch<T> {
    queue: VecDeque<(Cycle, T)>,
    latency: Latency,
}

/// Shared state of one named channel: the writer's declaration plus every
/// bound reader latch.
struct Channel<T> {
    name: &'static str,
    bandwidth: u32,
    fanout: u32,
    writer_claimed: bool,
    latches: Vec<Rc<RefCell<Latch<T>>>>,
    last_write: Option<Cycle>,
    writes_this_cycle: u32,
}

/// Type-erased view of a channel used by `init_ports` and `check_ports`.
trait ChannelProbe {
    fn name(&self) -> &'static str;
    fn writer_claimed(&self) -> bool;
    fn fanout(&self) -> u32;
    fn reader_count(&self) -> usize;
    fn check_stale(&self, cycle: Cycle) -> Result<(), PortError>;
}

impl<T: 'static> ChannelProbe for Channel<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn writer_claimed(&self) -> bool {
        self.writer_claimed
    }

    fn fanout(&self) -> u32 {
        self.fanout
    }

    fn reader_count(&self) -> usize {
        self.latches.len()
    }

    fn check_stale(&self, cycle: Cycle) -> Result<(), PortError> {
        for latch in &self.latches {
            if let Some((ready_at, _)) = latch.borrow().queue.front() {
                if *ready_at < cycle {
                    return Err(PortError::StaleValue {
                        port: self.name,
                        ready_at: *ready_at,
                        cycle,
                    });
                }
            }
        }
        Ok(())
    }
}

/// One registry slot: the concrete channel plus its type-erased probe.
struct Slot {
    type_id: TypeId,
    type_name: &'static str,
    concrete: Rc<dyn Any>,
    probe: Rc<RefCell<dyn ChannelProbe>>,
}

/// The port registry.
///
/// Owned by the pipeline controller and threaded through construction; there
/// is no global state, so independent simulator instances never interfere.
#[derive(Default)]
pub struct PortMap {
    slots: HashMap<&'static str, Slot>,
    finalized: bool,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the single writer of `name`.
    ///
    /// `bandwidth` is the number of writes permitted per cycle and `fanout`
    /// the exact number of read ports that must bind to this name before
    /// `init_ports`.
    pub fn make_write_port<T: Clone + 'static>(
        &mut self,
        name: &'static str,
        bandwidth: u32,
        fanout: u32,
    ) -> Result<WritePort<T>, PortError> {
        let channel = self.channel::<T>(name)?;
        {
            let mut chan = channel.borrow_mut();
            if chan.writer_claimed {
                return Err(PortError::DuplicateWriter { port: name });
            }
            chan.writer_claimed = true;
            chan.bandwidth = bandwidth;
            chan.fanout = fanout;
        }
        Ok(WritePort { channel })
    }

    /// Registers another consumer of `name` observing values `latency` cycles
    /// after they are written.
    pub fn make_read_port<T: Clone + 'static>(
        &mut self,
        name: &'static str,
        latency: Latency,
    ) -> Result<ReadPort<T>, PortError> {
        let channel = self.channel::<T>(name)?;
        let latch = Rc::new(RefCell::new(Latch {
            queue: VecDeque::new(),
            latency,
        }));
        {
            let mut chan = channel.borrow_mut();
            if chan.writer_claimed && chan.latches.len() as u32 >= chan.fanout {
                return Err(PortError::FanoutMismatch {
                    port: name,
                    declared: chan.fanout,
                    bound: chan.latches.len() + 1,
                });
            }
            chan.latches.push(Rc::clone(&latch));
        }
        Ok(ReadPort { name, latch })
    }

    /// Seals the topology. Called exactly once, after every port is built.
    ///
    /// Verifies that each name has a writer, at least one reader, and exactly
    /// as many readers as the writer's declared fanout.
    pub fn init_ports(&mut self) -> Result<(), PortError> {
        if self.finalized {
            return Err(PortError::DoubleInit);
        }
        for slot in self.slots.values() {
            let probe = slot.probe.borrow();
            if !probe.writer_claimed() {
                return Err(PortError::NoWriter { port: probe.name() });
            }
            if probe.reader_count() == 0 {
                return Err(PortError::NoReaders { port: probe.name() });
            }
            if probe.reader_count() != probe.fanout() as usize {
                return Err(PortError::FanoutMismatch {
                    port: probe.name(),
                    declared: probe.fanout(),
                    bound: probe.reader_count(),
                });
            }
        }
        self.finalized = true;
        Ok(())
    }

    /// End-of-cycle sweep: any latch value that became observable before
    /// `cycle` and was neither read nor ignored is a protocol violation.
    pub fn check_ports(&self, cycle: Cycle) -> Result<(), PortError> {
        for slot in self.slots.values() {
            slot.probe.borrow().check_stale(cycle)?;
        }
        Ok(())
    }

    /// Looks up (or lazily creates) the channel for `name`, checking that its
    /// payload type matches every earlier binding of the same name.
    fn channel<T: Clone + 'static>(
        &mut self,
        name: &'static str,
    ) -> Result<Rc<RefCell<Channel<T>>>, PortError> {
        if self.finalized {
            return Err(PortError::AlreadyFinalized { port: name });
        }
        if let Some(slot) = self.slots.get(name) {
            if slot.type_id != TypeId::of::<T>() {
                return Err(PortError::TypeMismatch {
                    port: name,
                    bound: slot.type_name,
                    requested: type_name::<T>(),
                });
            }
            return Rc::clone(&slot.concrete)
                .downcast::<RefCell<Channel<T>>>()
                .map_err(|_| PortError::TypeMismatch {
                    port: name,
                    bound: slot.type_name,
                    requested: type_name::<T>(),
                });
        }

        let channel = Rc::new(RefCell::new(Channel::<T> {
            name,
            bandwidth: 0,
            fanout: 0,
            writer_claimed: false,
            latches: Vec::new(),
            last_write: None,
            writes_this_cycle: 0,
        }));
        self.slots.insert(
            name,
            Slot {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                concrete: Rc::clone(&channel) as Rc<dyn Any>,
                probe: Rc::clone(&channel) as Rc<RefCell<dyn ChannelProbe>>,
            },
        );
        Ok(channel)
    }
}

/// The writing end of a named channel.
pub struct WritePort<T> {
    channel: Rc<RefCell<Channel<T>>>,
}

impl<T: Clone + 'static> WritePort<T> {
    /// Broadcasts `value` to every bound reader, stamped to become observable
    /// `latency` cycles from `cycle` on each.
    ///
    /// Writing more than `bandwidth` times in one cycle is a protocol
    /// violation.
    pub fn write(&self, value: T, cycle: Cycle) -> Result<(), PortError> {
        let mut chan = self.channel.borrow_mut();
        if chan.last_write == Some(cycle) {
            if chan.writes_this_cycle >= chan.bandwidth {
                return Err(PortError::BandwidthExceeded {
                    port: chan.name,
                    cycle,
                    bandwidth: chan.bandwidth,
                });
            }
            chan.writes_this_cycle += 1;
        } else {
            chan.last_write = Some(cycle);
            chan.writes_this_cycle = 1;
        }

        if let Some((last, rest)) = chan.latches.split_last() {
            for latch in rest {
                let mut latch = latch.borrow_mut();
                let ready_at = cycle + latch.latency;
                latch.queue.push_back((ready_at, value.clone()));
            }
            let mut latch = last.borrow_mut();
            let ready_at = cycle + latch.latency;
            latch.queue.push_back((ready_at, value));
        }
        Ok(())
    }
}

/// The reading end of a named channel.
pub struct ReadPort<T> {
    name: &'static str,
    latch: Rc<RefCell<Latch<T>>>,
}

impl<T: Clone + 'static> ReadPort<T> {
    /// True iff a value is observable at `cycle`.
    pub fn is_ready(&self, cycle: Cycle) -> bool {
        self.latch
            .borrow()
            .queue
            .front()
            .is_some_and(|(ready_at, _)| *ready_at <= cycle)
    }

    /// Consumes and returns the observable head value.
    ///
    /// Calling this with nothing ready is a protocol violation; stages must
    /// guard with `is_ready` unless readiness is implied by another signal.
    pub fn read(&self, cycle: Cycle) -> Result<T, PortError> {
        if !self.is_ready(cycle) {
            return Err(PortError::ReadNotReady {
                port: self.name,
                cycle,
            });
        }
        let (_, value) = self
            .latch
            .borrow_mut()
            .queue
            .pop_front()
            .ok_or(PortError::ReadNotReady {
                port: self.name,
                cycle,
            })?;
        Ok(value)
    }

    /// Drops the observable head value, if any.
    pub fn ignore(&self, cycle: Cycle) {
        if self.is_ready(cycle) {
            self.latch.borrow_mut().queue.pop_front();
        }
    }
}
