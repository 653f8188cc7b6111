//! Quantity Buffer Tests
//!
//! Critical invariants tested:
//! - Capacity: quantity never exceeds capacity
//! - FIFO: material leaves in arrival order
//! - Atomicity: failed pushes and pops leave the buffer untouched

use facility_sim_core::buffer::{BufferError, ResBuf};
use facility_sim_core::models::{Composition, Resource};
use std::collections::BTreeMap;

fn recipe(name: &str) -> Composition {
    let mut fractions = BTreeMap::new();
    fractions.insert(name.to_string(), 1.0);
    Composition::new(name, fractions)
}

#[test]
fn test_push_respects_capacity() {
    let mut buf = ResBuf::with_capacity(10.0);
    buf.push(Resource::blank(6.0)).unwrap();

    let err = buf.push(Resource::blank(5.0)).unwrap_err();
    assert!(matches!(err, BufferError::CapacityExceeded { .. }));
    assert_eq!(buf.quantity(), 6.0);
    assert_eq!(buf.space(), 4.0);
}

#[test]
fn test_push_within_tolerance_is_accepted() {
    let mut buf = ResBuf::with_capacity(10.0);
    buf.push(Resource::blank(10.0 + 1e-9)).unwrap();
    assert_eq!(buf.count(), 1);
    assert_eq!(buf.space(), 0.0);
}

#[test]
fn test_pop_is_fifo_across_lots() {
    let mut buf = ResBuf::new();
    buf.push(Resource::new(3.0, recipe("a"))).unwrap();
    buf.push(Resource::new(3.0, recipe("b"))).unwrap();

    let first = buf.pop(3.0).unwrap();
    assert_eq!(first.composition().name(), "a");

    let second = buf.pop(3.0).unwrap();
    assert_eq!(second.composition().name(), "b");
    assert!(buf.is_empty());
}

#[test]
fn test_partial_pop_splits_front_lot() {
    let mut buf = ResBuf::new();
    let lot = Resource::blank(5.0);
    let original_id = lot.id().to_string();
    buf.push(lot).unwrap();

    let taken = buf.pop(2.0).unwrap();
    assert_eq!(taken.quantity(), 2.0);
    assert_ne!(taken.id(), original_id);

    // Remainder keeps the original identity at the front
    let front = buf.peek().unwrap();
    assert_eq!(front.id(), original_id);
    assert_eq!(front.quantity(), 3.0);
}

#[test]
fn test_pop_spanning_lots_mixes_compositions() {
    let mut buf = ResBuf::new();
    buf.push(Resource::new(1.0, recipe("a"))).unwrap();
    buf.push(Resource::new(3.0, recipe("b"))).unwrap();

    let mixed = buf.pop(4.0).unwrap();
    assert_eq!(mixed.quantity(), 4.0);
    assert_eq!(mixed.composition().fractions()["a"], 0.25);
    assert_eq!(mixed.composition().fractions()["b"], 0.75);
}

#[test]
fn test_overdraw_fails_without_side_effects() {
    let mut buf = ResBuf::new();
    buf.push(Resource::blank(2.0)).unwrap();

    let err = buf.pop(5.0).unwrap_err();
    assert_eq!(
        err,
        BufferError::InsufficientQuantity {
            requested: 5.0,
            available: 2.0
        }
    );
    assert_eq!(buf.quantity(), 2.0);
    assert_eq!(buf.count(), 1);
}

#[test]
fn test_zero_pop_returns_empty_resource() {
    let mut buf = ResBuf::new();
    buf.push(Resource::blank(2.0)).unwrap();
    let empty = buf.pop(0.0).unwrap();
    assert_eq!(empty.quantity(), 0.0);
    assert_eq!(buf.quantity(), 2.0);
}

#[test]
fn test_push_all_is_atomic() {
    let mut buf = ResBuf::with_capacity(5.0);
    let err = buf
        .push_all(vec![Resource::blank(3.0), Resource::blank(3.0)])
        .unwrap_err();
    assert!(matches!(err, BufferError::CapacityExceeded { .. }));
    assert!(buf.is_empty());
}

#[test]
fn test_pop_whole_lots_never_splits() {
    let mut buf = ResBuf::new();
    for qty in [1.0, 2.0, 4.0] {
        buf.push(Resource::blank(qty)).unwrap();
    }

    // 1 + 2 fits under 5, adding 4 would not
    let whole = buf.pop_whole_lots(5.0);
    assert_eq!(whole.len(), 2);
    assert_eq!(buf.quantity(), 4.0);
    assert_eq!(buf.count(), 1);

    assert!(buf.pop_whole_lots(3.0).is_empty());
    assert_eq!(buf.pop_whole_lots(4.0)[0].quantity(), 4.0);
    assert!(buf.is_empty());
}

#[test]
fn test_zero_pop_carries_front_composition() {
    let mut buf = ResBuf::new();
    buf.push(Resource::new(3.0, recipe("ore"))).unwrap();

    let popped = buf.pop(0.0).unwrap();
    assert_eq!(popped.quantity(), 0.0);
    assert_eq!(popped.composition().name(), "ore");
    assert_eq!(buf.quantity(), 3.0);
}
