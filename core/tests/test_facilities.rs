//! Facility Integration Tests
//!
//! Drives a supplier, a Conversion facility and a Storage facility through
//! complete timesteps with the greedy test matcher.
//!
//! Critical invariants tested:
//! - Conservation: everything supplied sits in exactly one facility buffer
//! - Residence: storage never offers material before its residence time
//! - Telemetry: demand and supply are reported every timestep

mod common;

use common::{assert_close, run_timestep, Source};
use facility_sim_core::catalog::{LinearCost, StaticCatalog};
use facility_sim_core::config::{ConfigError, ConversionConfig, StorageConfig};
use facility_sim_core::facility::{Conversion, Facility, PositionTagged, Requester, Storage};
use facility_sim_core::market::{Bid, Request, Trade, TradeResponse};
use facility_sim_core::models::{Event, Resource};
use facility_sim_core::TimeManager;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn mill() -> Conversion {
    let mut config = ConversionConfig::new(vec!["ore".into()], "yellowcake");
    config.throughput = 10.0;
    Conversion::new(
        "mill",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .expect("valid mill config")
}

fn depot() -> Storage {
    let mut config = StorageConfig::new(vec!["yellowcake".into()], "stored_yellowcake");
    config.residence_time = 2;
    config.throughput = 4.0;
    config.max_inv_size = 20.0;
    Storage::new(
        "depot",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .expect("valid depot config")
}

fn run(
    steps: usize,
    mine: &mut Source,
    mill: &mut Conversion,
    depot: &mut Storage,
) -> TimeManager {
    let mut time = TimeManager::new();
    mill.enter_notify(time.current_tick());
    depot.enter_notify(time.current_tick());
    for _ in 0..steps {
        let mut facilities: [&mut dyn Facility; 3] = [&mut *mine, &mut *mill, &mut *depot];
        run_timestep(&time, &mut facilities);
        time.advance_tick();
    }
    time
}

/// A delivery of `qty` blank material priced at preference 0.5
fn delivery(requester: &str, commodity: &str, qty: f64) -> TradeResponse {
    let request = Request::new(requester, commodity, Resource::blank(qty), 1.0);
    let bid = Bid::new(&request, "mine", Resource::blank(qty), 0.5);
    TradeResponse {
        trade: Trade::new(request, bid, qty),
        resource: Resource::blank(qty),
    }
}

// ============================================================================
// Supply chain
// ============================================================================

#[test]
fn test_material_conserved_through_supply_chain() {
    let mut mine = Source::new("mine", "ore");
    let mut mill = mill();
    let mut depot = depot();

    run(6, &mut mine, &mut mill, &mut depot);

    assert!(mine.shipped > 0.0);
    assert_close(
        mill.inventory().quantity() + depot.staged().total_quantity(),
        mine.shipped,
    );
    assert!(mill.inventory().quantity() <= 10.0 + 1e-6);
    assert!(depot.staged().total_quantity() <= 20.0 + 1e-6);
}

#[test]
fn test_storage_holds_material_for_residence_time() {
    let mut mine = Source::new("mine", "ore");
    let mut mill = mill();
    let mut depot = depot();

    // t0 mill fills, t1 depot receives its first 4 kg
    run(3, &mut mine, &mut mill, &mut depot);
    assert_eq!(depot.staged().ready().quantity(), 0.0);
    assert_eq!(depot.staged().stocks().quantity(), 0.0);
    assert!(depot.events().events_of_type("Promoted").is_empty());

    let time = TimeManager::starting_at(3);
    let mut facilities: [&mut dyn Facility; 3] = [&mut mine, &mut mill, &mut depot];
    run_timestep(&time, &mut facilities);

    let promoted = depot.events().events_of_type("Promoted");
    assert_eq!(promoted.len(), 1);
    match promoted[0] {
        Event::Promoted {
            tick,
            admitted_at,
            quantity,
            ..
        } => {
            assert_eq!(*tick, 3);
            assert_eq!(*admitted_at, 1);
            assert_eq!(*quantity, 4.0);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(depot.staged().stocks().quantity(), 4.0);
    assert!(depot.staged().entry_log_consistent());
}

#[test]
fn test_conversion_requests_only_free_space() {
    let mut mine = Source::new("mine", "ore");
    let mut mill = mill();
    let mut depot = depot();

    run(1, &mut mine, &mut mill, &mut depot);
    assert_eq!(mill.inventory().quantity(), 10.0);

    // Full inventory: nothing to ask for
    assert!(mill.request_phase(1).is_empty());
}

#[test]
fn test_cost_basis_updated_on_receipt() {
    let mut mine = Source::new("mine", "ore");
    let mut mill = mill();
    let mut depot = depot();

    run(1, &mut mine, &mut mill, &mut depot);

    // Source bids at preference 1.0
    assert_eq!(mill.cost_basis().avg_per_unit_cost(), 1.0);
    assert_eq!(mill.events().events_of_type("CostBasisUpdated").len(), 1);
}

// ============================================================================
// Receipt atomicity
// ============================================================================

#[test]
fn test_conversion_rejects_overfull_receipt_whole() {
    let mut mill = mill();
    let responses = [delivery("mill", "ore", 6.0), delivery("mill", "ore", 6.0)];

    assert!(mill.accept_trades(0, &responses).is_err());
    assert_eq!(mill.inventory().quantity(), 0.0);
    assert_eq!(mill.cost_basis().avg_per_unit_cost(), 0.0);
    assert!(mill.events().events_of_type("Received").is_empty());
    assert!(mill.events().events_of_type("CostBasisUpdated").is_empty());
}

#[test]
fn test_storage_rejects_overfull_receipt_whole() {
    let mut depot = depot();
    let responses = [
        delivery("depot", "yellowcake", 12.0),
        delivery("depot", "yellowcake", 12.0),
    ];

    assert!(depot.accept_trades(0, &responses).is_err());
    assert_eq!(depot.staged().total_quantity(), 0.0);
    assert_eq!(depot.cost_basis().avg_per_unit_cost(), 0.0);
    assert!(depot.events().events_of_type("Received").is_empty());

    // A batch that fits is taken in full
    depot.accept_trades(0, &responses[..1]).unwrap();
    assert_eq!(depot.staged().inventory().quantity(), 12.0);
    assert_eq!(depot.cost_basis().avg_per_unit_cost(), 2.0);
}

// ============================================================================
// Telemetry and diagnostics
// ============================================================================

#[test]
fn test_demand_and_supply_reported_each_timestep() {
    let mut mine = Source::new("mine", "ore");
    let mut mill = mill();
    let mut depot = depot();

    run(3, &mut mine, &mut mill, &mut depot);

    let demand = mill.events().telemetry("Demand", "ore");
    assert_eq!(demand.len(), 3);
    assert_eq!(demand[0], (0, 10.0));

    let supply = mill.events().telemetry("Supply", "yellowcake");
    assert_eq!(supply.len(), 3);
    assert_eq!(supply[0], (0, 10.0));

    let depot_demand = depot.events().telemetry("Demand", "yellowcake");
    assert_eq!(depot_demand[0], (0, 4.0));
}

#[test]
fn test_position_recorded_on_entry() {
    let mut config = ConversionConfig::new(vec!["ore".into()], "yellowcake");
    config.latitude = 45.0;
    config.longitude = -93.0;
    let mut conv = Conversion::new(
        "mill",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .unwrap();

    conv.enter_notify(0);
    assert_eq!(conv.position().latitude, 45.0);
    assert!(matches!(
        conv.events().events()[0],
        Event::PositionRecorded { longitude, .. } if longitude == -93.0
    ));
}

#[test]
fn test_status_strings() {
    let mill = mill();
    assert_eq!(
        mill.status(),
        "mill accepts commodities {ore} until its inventory is full at 10 kg."
    );

    let mut config = StorageConfig::new(vec!["a".into(), "b".into()], "c");
    config.max_inv_size = 50.0;
    let store = Storage::new(
        "store",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .unwrap();
    assert_eq!(
        store.status(),
        "store accepts commodities {a, b} until its inventory is full at 50 kg."
    );
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_preference_count_mismatch_rejected() {
    let mut config = ConversionConfig::new(vec!["a".into(), "b".into()], "c");
    config.in_commod_prefs = vec![1.0];
    let err = Conversion::new(
        "bad",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::ConfigurationMismatch {
            commodities: 2,
            preferences: 1
        }
    );
}

#[test]
fn test_unknown_names_fail_fast() {
    let mut config = StorageConfig::new(vec!["a".into()], "b");
    config.in_recipe = "missing".into();
    let err = Storage::new(
        "bad",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::UnknownRecipe("missing".into()));

    let mut config = ConversionConfig::new(vec!["a".into()], "b");
    config.package = "drum".into();
    let err = Conversion::new(
        "bad",
        config,
        &StaticCatalog::new(),
        Arc::new(LinearCost::default()),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::UnknownPackage("drum".into()));
}
