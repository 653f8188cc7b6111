//! Market data structures exchanged with the external matcher
//!
//! The facility core never clears the market itself. It produces
//! [`RequestPortfolio`]s and [`BidPortfolio`]s and consumes the
//! [`Trade`]s the matcher hands back.
//!
//! # Constraints encoded here, enforced by the matcher
//!
//! - **Mutual groups**: at most one request of a mutual group may be awarded
//! - **Capacity constraints**: the total awarded across a bid portfolio never
//!   exceeds the constraint's capacity

use crate::models::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Requests grouped by the commodity they ask for
pub type CommodityRequests = BTreeMap<String, Vec<Request>>;

/// A request for material on one commodity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier (UUID)
    id: String,

    /// Facility asking for the material
    requester: String,

    /// Commodity requested
    commodity: String,

    /// Desired quantity and composition
    target: Resource,

    /// Priority for the matcher (higher is preferred)
    preference: f64,
}

impl Request {
    pub fn new(
        requester: impl Into<String>,
        commodity: impl Into<String>,
        target: Resource,
        preference: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            requester: requester.into(),
            commodity: commodity.into(),
            target,
            preference,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn commodity(&self) -> &str {
        &self.commodity
    }

    pub fn target(&self) -> &Resource {
        &self.target
    }

    pub fn quantity(&self) -> f64 {
        self.target.quantity()
    }

    pub fn preference(&self) -> f64 {
        self.preference
    }
}

/// All requests a facility issues in one timestep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPortfolio {
    requester: String,
    requests: Vec<Request>,
    /// Groups of request ids of which at most one may be awarded
    mutual_groups: Vec<Vec<String>>,
}

impl RequestPortfolio {
    pub fn new(requester: impl Into<String>) -> Self {
        Self {
            requester: requester.into(),
            requests: Vec::new(),
            mutual_groups: Vec::new(),
        }
    }

    /// Add a request, returning its id
    pub fn add_request(&mut self, request: Request) -> String {
        let id = request.id().to_string();
        self.requests.push(request);
        id
    }

    /// Mark requests as mutually exclusive
    pub fn add_mutual_group(&mut self, request_ids: Vec<String>) {
        self.mutual_groups.push(request_ids);
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn mutual_groups(&self) -> &[Vec<String>] {
        &self.mutual_groups
    }

    /// Mutual group containing the given request, if any
    pub fn group_of(&self, request_id: &str) -> Option<&[String]> {
        self.mutual_groups
            .iter()
            .find(|group| group.iter().any(|id| id == request_id))
            .map(Vec::as_slice)
    }
}

/// Collect every request across portfolios, keyed by commodity
pub fn group_by_commodity(portfolios: &[RequestPortfolio]) -> CommodityRequests {
    let mut grouped = CommodityRequests::new();
    for portfolio in portfolios {
        for request in portfolio.requests() {
            grouped
                .entry(request.commodity().to_string())
                .or_default()
                .push(request.clone());
        }
    }
    grouped
}

/// An offer of material against one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Unique bid identifier (UUID)
    id: String,

    /// Request this bid answers
    request_id: String,

    /// Facility making the offer
    bidder: String,

    /// Commodity offered
    commodity: String,

    /// Offered quantity and composition
    offer: Resource,

    /// Cost-adjusted preference (higher is cheaper)
    preference: f64,
}

impl Bid {
    pub fn new(
        request: &Request,
        bidder: impl Into<String>,
        offer: Resource,
        preference: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request_id: request.id().to_string(),
            bidder: bidder.into(),
            commodity: request.commodity().to_string(),
            offer,
            preference,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn bidder(&self) -> &str {
        &self.bidder
    }

    pub fn commodity(&self) -> &str {
        &self.commodity
    }

    pub fn offer(&self) -> &Resource {
        &self.offer
    }

    pub fn quantity(&self) -> f64 {
        self.offer.quantity()
    }

    pub fn preference(&self) -> f64 {
        self.preference
    }
}

/// Upper bound on the total quantity awarded across a portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityConstraint {
    pub capacity: f64,
}

/// All bids a facility makes in one timestep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidPortfolio {
    bidder: String,
    bids: Vec<Bid>,
    constraints: Vec<CapacityConstraint>,
}

impl BidPortfolio {
    pub fn new(bidder: impl Into<String>) -> Self {
        Self {
            bidder: bidder.into(),
            bids: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_bid(&mut self, bid: Bid) {
        self.bids.push(bid);
    }

    pub fn add_constraint(&mut self, constraint: CapacityConstraint) {
        self.constraints.push(constraint);
    }

    pub fn bidder(&self) -> &str {
        &self.bidder
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn constraints(&self) -> &[CapacityConstraint] {
        &self.constraints
    }

    /// Sum of all offered quantities
    pub fn offered_quantity(&self) -> f64 {
        self.bids.iter().map(Bid::quantity).sum()
    }
}

/// A matched request/bid pair with the awarded quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub request: Request,
    pub bid: Bid,
    pub amt: f64,
}

impl Trade {
    pub fn new(request: Request, bid: Bid, amt: f64) -> Self {
        Self { request, bid, amt }
    }
}

/// The material a supplier sends for a trade
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResponse {
    pub trade: Trade,
    pub resource: Resource,
}
