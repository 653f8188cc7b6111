//! Facility agents
//!
//! A facility is a thin struct wiring together small capability traits rather
//! than one deep base type:
//!
//! - [`Requester`]: asks for input material and takes delivery of it
//! - [`Bidder`]: offers output material against outstanding requests
//! - [`Trader`]: ships material for matched trades
//! - [`PositionTagged`]: carries a geographic position
//!
//! # Phase order within one timestep
//!
//! ```text
//! tick ─▶ request_phase ─▶ (matcher) ─▶ bid_phase ─▶ (matcher)
//!      ─▶ trade_phase (seller) ─▶ accept_trades (buyer) ─▶ tock
//! ```
//!
//! The kernel drives every call synchronously; no two phases of one facility
//! ever overlap.

pub mod bid;
pub mod conversion;
pub mod request;
pub mod storage;
pub mod trade;

pub use bid::{BidBuilder, DEFAULT_BID_PREFERENCE};
pub use conversion::Conversion;
pub use request::RequestBuilder;
pub use storage::Storage;
pub use trade::{CostBasis, TradeExecutor};

use crate::buffer::BufferError;
use crate::config::ConfigError;
use crate::market::{BidPortfolio, CommodityRequests, RequestPortfolio, Trade, TradeResponse};
use crate::models::event::{Event, EventLog};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a facility phase
#[derive(Debug, Error, PartialEq)]
pub enum FacilityError {
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Validate and build a position
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::facility::Position;
    ///
    /// assert!(Position::new(45.0, -93.0).is_ok());
    /// assert!(Position::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ConfigError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::InvalidParameter(format!(
                "latitude must be within [-90, 90], got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::InvalidParameter(format!(
                "longitude must be within [-180, 180], got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Asks for input material and takes delivery of it
pub trait Requester {
    /// Build this timestep's request portfolios (empty when nothing is wanted)
    fn request_phase(&mut self, tick: usize) -> Vec<RequestPortfolio>;

    /// Take delivery of accepted trades and update the cost basis
    fn accept_trades(&mut self, tick: usize, responses: &[TradeResponse])
        -> Result<(), FacilityError>;
}

/// Offers output material against outstanding requests
pub trait Bidder {
    fn bid_phase(&mut self, tick: usize, requests: &CommodityRequests) -> Vec<BidPortfolio>;
}

/// Ships material for matched trades
pub trait Trader {
    fn trade_phase(&mut self, tick: usize, trades: &[Trade])
        -> Result<Vec<TradeResponse>, FacilityError>;
}

pub trait PositionTagged {
    fn position(&self) -> Position;
}

/// A complete facility driven by the simulation kernel
pub trait Facility: Requester + Bidder + Trader + PositionTagged {
    fn id(&self) -> &str;

    /// Called once when the facility enters the simulation
    fn enter_notify(&mut self, tick: usize);

    fn tick(&mut self, tick: usize);

    fn tock(&mut self, tick: usize) -> Result<(), FacilityError>;

    /// Diagnostic summary of accepted commodities and capacity
    fn status(&self) -> String;

    fn events(&self) -> &EventLog;
}

fn position_event(tick: usize, agent_id: &str, position: Position) -> Event {
    Event::PositionRecorded {
        tick,
        agent_id: agent_id.to_string(),
        latitude: position.latitude,
        longitude: position.longitude,
    }
}

fn status_line(agent_id: &str, commodities: &[String], capacity: f64) -> String {
    format!(
        "{} accepts commodities {{{}}} until its inventory is full at {} kg.",
        agent_id,
        commodities.join(", "),
        capacity
    )
}

/// Log one `RequestIssued` per request in the portfolios
fn log_requests(events: &mut EventLog, tick: usize, agent_id: &str, ports: &[RequestPortfolio]) {
    for request in ports.iter().flat_map(|p| p.requests()) {
        events.log(Event::RequestIssued {
            tick,
            agent_id: agent_id.to_string(),
            commodity: request.commodity().to_string(),
            quantity: request.quantity(),
            preference: request.preference(),
        });
    }
}

fn log_bids(events: &mut EventLog, tick: usize, agent_id: &str, ports: &[BidPortfolio]) {
    for bid in ports.iter().flat_map(|p| p.bids()) {
        events.log(Event::BidOffered {
            tick,
            agent_id: agent_id.to_string(),
            commodity: bid.commodity().to_string(),
            quantity: bid.quantity(),
            preference: bid.preference(),
        });
    }
}

fn log_shipments(events: &mut EventLog, tick: usize, agent_id: &str, responses: &[TradeResponse]) {
    for response in responses {
        events.log(Event::Shipped {
            tick,
            agent_id: agent_id.to_string(),
            commodity: response.trade.bid.commodity().to_string(),
            quantity: response.resource.quantity(),
        });
    }
}

fn log_receipts(events: &mut EventLog, tick: usize, agent_id: &str, responses: &[TradeResponse]) {
    for response in responses {
        events.log(Event::Received {
            tick,
            agent_id: agent_id.to_string(),
            commodity: response.trade.request.commodity().to_string(),
            quantity: response.resource.quantity(),
        });
    }
}
