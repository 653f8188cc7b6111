//! Residence-Staged Buffer Tests
//!
//! Critical invariants tested:
//! - Residence: nothing leaves processing before `residence_time` timesteps
//! - Ordering: entries are released oldest first, exactly once
//! - Entry log: logged quantities always equal the processing contents
//! - Total cap: all four stages together never exceed `max_inv_size`

use facility_sim_core::buffer::{BufferError, ResidenceBuffer};
use facility_sim_core::models::Resource;

#[test]
fn test_material_waits_out_residence_time() {
    let mut staged = ResidenceBuffer::new(2, 100.0, false);
    staged.admit(Resource::blank(10.0), 5).unwrap();

    assert!(staged.promote(5).unwrap().is_empty());
    assert!(staged.promote(6).unwrap().is_empty());
    assert_eq!(staged.processing().quantity(), 10.0);

    let released = staged.promote(7).unwrap();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].tick, 5);
    assert_eq!(staged.ready().quantity(), 10.0);
    assert_eq!(staged.processing().quantity(), 0.0);
    assert_eq!(staged.entry_log().count(), 0);
}

#[test]
fn test_zero_residence_promotes_same_timestep() {
    let mut staged = ResidenceBuffer::new(0, 100.0, false);
    staged.admit(Resource::blank(4.0), 3).unwrap();
    assert_eq!(staged.promote(3).unwrap().len(), 1);
    assert_eq!(staged.ready().quantity(), 4.0);
}

#[test]
fn test_entries_release_in_admission_order() {
    let mut staged = ResidenceBuffer::new(1, 100.0, false);
    staged.admit(Resource::blank(1.0), 0).unwrap();
    staged.admit(Resource::blank(2.0), 1).unwrap();
    staged.admit(Resource::blank(3.0), 2).unwrap();

    let first = staged.promote(2).unwrap();
    assert_eq!(
        first.iter().map(|e| e.quantity).collect::<Vec<_>>(),
        vec![1.0, 2.0]
    );
    assert!(staged.entry_log_consistent());
    assert_eq!(staged.processing().quantity(), 3.0);

    // Already-released entries are never released again
    let second = staged.promote(3).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].tick, 2);
    assert!(staged.promote(10).unwrap().is_empty());
}

#[test]
fn test_begin_processing_admits_all_inbound() {
    let mut staged = ResidenceBuffer::new(1, 100.0, false);
    staged.receive(Resource::blank(2.0)).unwrap();
    staged.receive(Resource::blank(3.0)).unwrap();

    let admitted = staged.begin_processing(4).unwrap();
    assert_eq!(admitted.len(), 2);
    assert!(admitted.iter().all(|e| e.tick == 4));
    assert!(staged.inventory().is_empty());
    assert_eq!(staged.processing().quantity(), 5.0);
    assert!(staged.entry_log_consistent());
}

#[test]
fn test_admitting_nothing_logs_nothing() {
    let mut staged = ResidenceBuffer::new(1, 100.0, false);
    staged.admit(Resource::blank(0.0), 0).unwrap();
    assert_eq!(staged.entry_log().count(), 0);
}

#[test]
fn test_total_cap_spans_every_stage() {
    let mut staged = ResidenceBuffer::new(0, 10.0, false);
    staged.admit(Resource::blank(4.0), 0).unwrap();
    staged.promote(0).unwrap();
    staged.draw_ready(2.0).unwrap();
    staged.receive(Resource::blank(3.0)).unwrap();

    // 3 inbound + 2 ready + 2 stocks = 7
    assert_eq!(staged.total_quantity(), 7.0);
    assert_eq!(staged.space(), 3.0);
    assert!(matches!(
        staged.receive(Resource::blank(4.0)),
        Err(BufferError::CapacityExceeded { .. })
    ));
    assert!(matches!(
        staged.admit(Resource::blank(4.0), 0),
        Err(BufferError::CapacityExceeded { .. })
    ));
    assert!(staged.entry_log_consistent());
}

#[test]
fn test_continuous_draw_splits_lots() {
    let mut staged = ResidenceBuffer::new(0, 100.0, false);
    staged.admit(Resource::blank(6.0), 0).unwrap();
    staged.promote(0).unwrap();

    assert_eq!(staged.draw_ready(4.0).unwrap(), 4.0);
    assert_eq!(staged.stocks().quantity(), 4.0);
    assert_eq!(staged.ready().quantity(), 2.0);
}

#[test]
fn test_discrete_draw_moves_whole_lots_only() {
    let mut staged = ResidenceBuffer::new(0, 100.0, true);
    staged.admit(Resource::blank(3.0), 0).unwrap();
    staged.admit(Resource::blank(3.0), 0).unwrap();
    staged.promote(0).unwrap();

    // 4 only fits one 3 kg lot
    assert_eq!(staged.draw_ready(4.0).unwrap(), 3.0);
    assert_eq!(staged.stocks().count(), 1);
    assert_eq!(staged.ready().quantity(), 3.0);

    // A lot bigger than the draw never moves
    assert_eq!(staged.draw_ready(2.0).unwrap(), 0.0);
}

#[test]
fn test_from_parts_rejects_inconsistent_log() {
    use facility_sim_core::buffer::{EntryRecord, ResBuf};

    let mut processing = ResBuf::new();
    processing.push(Resource::blank(5.0)).unwrap();
    let log = vec![EntryRecord {
        tick: 0,
        quantity: 4.0,
    }];

    let rebuilt = ResidenceBuffer::from_parts(
        1,
        100.0,
        false,
        ResBuf::new(),
        processing,
        ResBuf::new(),
        ResBuf::new(),
        log,
    );
    assert!(rebuilt.is_none());
}
