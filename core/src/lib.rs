//! Facility Simulator Core - Rust Engine
//!
//! Facility agents for a discrete-time material-flow simulation. Each
//! timestep a facility requests feedstock, bids its output against other
//! facilities' requests, ships matched trades and takes delivery of its own.
//!
//! # Architecture
//!
//! - **core**: Time management and shared tolerances
//! - **models**: Domain types (Resource, Composition, Package, TransportUnit, Event)
//! - **buffer**: Quantity buffer and residence-staged buffer
//! - **market**: Requests, bids, portfolios and trades
//! - **catalog**: Recipe/package/transport-unit lookup and cost models
//! - **config**: Facility parameters and their validation
//! - **facility**: Request/bid/trade builders and the Conversion and Storage agents
//! - **checkpoint**: Facility state snapshots
//!
//! # Critical Invariants
//!
//! 1. A buffer never holds more than its capacity (within `EPS`)
//! 2. Material is conserved: every quantity that leaves a buffer arrives in another or in a trade response
//! 3. Residence-staged material is never released before its residence time
//! 4. All execution is deterministic (no wall clock, no randomness)

// Module declarations
pub mod buffer;
pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod facility;
pub mod market;
pub mod models;

// Re-exports for convenience
pub use crate::core::time::TimeManager;
pub use crate::core::EPS;
pub use buffer::{BufferError, EntryRecord, ResBuf, ResidenceBuffer};
pub use catalog::{Catalog, CostModel, LinearCost, StaticCatalog};
pub use checkpoint::{BufferSnapshot, CheckpointError, FacilitySnapshot};
pub use config::{CommodityPreferences, ConfigError, ConversionConfig, StorageConfig};
pub use facility::{
    Bidder, Conversion, CostBasis, Facility, FacilityError, Position, PositionTagged, Requester,
    Storage, Trader,
};
pub use market::{
    Bid, BidPortfolio, CapacityConstraint, CommodityRequests, Request, RequestPortfolio, Trade,
    TradeResponse,
};
pub use models::{
    event::{Event, EventLog},
    packaging::{FillStrategy, Package, ShippingStrategy, TransportUnit},
    resource::{Composition, Resource},
};
