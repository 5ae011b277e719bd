//! Port fabric tests.
//!
//! Verifies the latency contract (a value written at C with read latency L
//! is observable exactly from C+L), topology validation at `init_ports`,
//! bandwidth enforcement, and the stale-value sweep.

use mips_core::common::error::PortError;
use mips_core::common::timing::{Cycle, Latency};
use mips_core::ports::PortMap;

fn c(n: u64) -> Cycle {
    Cycle::new(n)
}

fn l(n: u64) -> Latency {
    Latency::new(n)
}

// ══════════════════════════════════════════════════════════
// 1. Latency contract
// ══════════════════════════════════════════════════════════

#[test]
fn value_becomes_visible_exactly_at_write_plus_latency() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let rp = ports.make_read_port::<u32>("DATA", l(3)).unwrap();
    ports.init_ports().unwrap();

    wp.write(7, c(5)).unwrap();
    assert!(!rp.is_ready(c(5)));
    assert!(!rp.is_ready(c(6)));
    assert!(!rp.is_ready(c(7)));
    assert!(rp.is_ready(c(8)), "write at 5 with latency 3 is ready at 8");
    assert_eq!(rp.read(c(8)).unwrap(), 7);
    assert!(!rp.is_ready(c(8)), "read consumes the value");
}

#[test]
fn values_are_delivered_in_order() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    wp.write(1, c(0)).unwrap();
    wp.write(2, c(1)).unwrap();
    assert_eq!(rp.read(c(1)).unwrap(), 1);
    assert_eq!(rp.read(c(2)).unwrap(), 2);
}

#[test]
fn read_with_nothing_ready_is_a_violation() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    assert!(matches!(
        rp.read(c(0)),
        Err(PortError::ReadNotReady { port: "DATA", .. })
    ));

    // Not yet observable counts as not ready.
    wp.write(9, c(0)).unwrap();
    assert!(matches!(rp.read(c(0)), Err(PortError::ReadNotReady { .. })));
}

#[test]
fn ignore_drops_ready_value_and_is_noop_otherwise() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    rp.ignore(c(0)); // nothing there, no effect

    wp.write(3, c(0)).unwrap();
    rp.ignore(c(0)); // not observable yet, must stay queued
    assert!(rp.is_ready(c(1)));
    rp.ignore(c(1));
    assert!(!rp.is_ready(c(1)));
}

// ══════════════════════════════════════════════════════════
// 2. Topology validation
// ══════════════════════════════════════════════════════════

#[test]
fn second_writer_is_rejected() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    assert!(matches!(
        ports.make_write_port::<u32>("DATA", 1, 1),
        Err(PortError::DuplicateWriter { port: "DATA" })
    ));
}

#[test]
fn payload_type_must_match_across_bindings() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    assert!(matches!(
        ports.make_read_port::<u64>("DATA", l(1)),
        Err(PortError::TypeMismatch { port: "DATA", .. })
    ));
}

#[test]
fn reader_without_writer_fails_init() {
    let mut ports = PortMap::new();
    let _rp = ports.make_read_port::<u32>("ORPHAN", l(1)).unwrap();
    assert!(matches!(
        ports.init_ports(),
        Err(PortError::NoWriter { port: "ORPHAN" })
    ));
}

#[test]
fn writer_without_reader_fails_init() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("ORPHAN", 1, 1).unwrap();
    assert!(matches!(
        ports.init_ports(),
        Err(PortError::NoReaders { port: "ORPHAN" })
    ));
}

#[test]
fn fanout_must_match_reader_count() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("FLUSH", 1, 2).unwrap();
    let _rp = ports.make_read_port::<u32>("FLUSH", l(1)).unwrap();
    assert!(matches!(
        ports.init_ports(),
        Err(PortError::FanoutMismatch {
            port: "FLUSH",
            declared: 2,
            bound: 1
        })
    ));
}

#[test]
fn binding_past_declared_fanout_is_rejected() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("FLUSH", 1, 1).unwrap();
    let _rp = ports.make_read_port::<u32>("FLUSH", l(1)).unwrap();
    assert!(matches!(
        ports.make_read_port::<u32>("FLUSH", l(1)),
        Err(PortError::FanoutMismatch { port: "FLUSH", .. })
    ));
}

#[test]
fn ports_cannot_be_added_after_init() {
    let mut ports = PortMap::new();
    let _wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let _rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();
    assert!(matches!(
        ports.make_read_port::<u32>("LATE", l(1)),
        Err(PortError::AlreadyFinalized { port: "LATE" })
    ));
    assert!(matches!(ports.init_ports(), Err(PortError::DoubleInit)));
}

// ══════════════════════════════════════════════════════════
// 3. Bandwidth
// ══════════════════════════════════════════════════════════

#[test]
fn writes_beyond_bandwidth_in_one_cycle_are_rejected() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let _rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    wp.write(1, c(0)).unwrap();
    assert!(matches!(
        wp.write(2, c(0)),
        Err(PortError::BandwidthExceeded {
            port: "DATA",
            bandwidth: 1,
            ..
        })
    ));
    // A later cycle resets the budget.
    wp.write(3, c(1)).unwrap();
}

// ══════════════════════════════════════════════════════════
// 4. Fanout broadcast
// ══════════════════════════════════════════════════════════

#[test]
fn broadcast_delivers_an_independent_copy_per_reader() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("FLUSH", 1, 3).unwrap();
    let rp_a = ports.make_read_port::<u32>("FLUSH", l(1)).unwrap();
    let rp_b = ports.make_read_port::<u32>("FLUSH", l(1)).unwrap();
    let rp_c = ports.make_read_port::<u32>("FLUSH", l(2)).unwrap();
    ports.init_ports().unwrap();

    wp.write(42, c(0)).unwrap();

    assert_eq!(rp_a.read(c(1)).unwrap(), 42);
    assert!(rp_b.is_ready(c(1)), "consuming one copy leaves the others");
    assert_eq!(rp_b.read(c(1)).unwrap(), 42);
    assert!(!rp_c.is_ready(c(1)), "readers keep their own latency");
    assert_eq!(rp_c.read(c(2)).unwrap(), 42);
}

// ══════════════════════════════════════════════════════════
// 5. Staleness sweep
// ══════════════════════════════════════════════════════════

#[test]
fn unconsumed_value_older_than_its_cycle_is_stale() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let _rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    wp.write(1, c(0)).unwrap(); // observable at cycle 1

    assert!(ports.check_ports(c(1)).is_ok(), "still consumable at cycle 1");
    assert!(matches!(
        ports.check_ports(c(2)),
        Err(PortError::StaleValue { port: "DATA", .. })
    ));
}

#[test]
fn consumed_values_never_go_stale() {
    let mut ports = PortMap::new();
    let wp = ports.make_write_port::<u32>("DATA", 1, 1).unwrap();
    let rp = ports.make_read_port::<u32>("DATA", l(1)).unwrap();
    ports.init_ports().unwrap();

    for cycle in 0..20 {
        wp.write(cycle as u32, c(cycle)).unwrap();
        rp.ignore(c(cycle)); // consumes the previous cycle's value
        ports.check_ports(c(cycle + 1)).unwrap();
    }
}
