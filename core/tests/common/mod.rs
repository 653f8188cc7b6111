//! Shared test harness: a greedy matcher and a single-timestep driver
//!
//! The matcher is deliberately simple. It walks request portfolios in order
//! and awards each request from the bids made against it, respecting mutual
//! groups and every bidder's capacity constraints.

#![allow(dead_code)]

use facility_sim_core::market::{
    group_by_commodity, Bid, BidPortfolio, CommodityRequests, RequestPortfolio,
};
use facility_sim_core::{
    Bidder, EventLog, Facility, FacilityError, Position, PositionTagged, Requester, Resource,
    TimeManager, Trade, TradeResponse, Trader, EPS,
};
use std::collections::HashMap;

/// Award requests from bids, first bid first
pub fn match_market(requests: &[RequestPortfolio], bids: &[BidPortfolio]) -> Vec<Trade> {
    let mut capacity_left: HashMap<&str, f64> = bids
        .iter()
        .map(|p| {
            let cap = p
                .constraints()
                .iter()
                .map(|c| c.capacity)
                .fold(f64::MAX, f64::min);
            (p.bidder(), cap)
        })
        .collect();

    let mut trades = Vec::new();
    for portfolio in requests {
        let mut group_wanted: HashMap<usize, f64> = HashMap::new();

        for request in portfolio.requests() {
            let group_index = portfolio
                .mutual_groups()
                .iter()
                .position(|g| g.iter().any(|id| id == request.id()));
            let mut wanted = match group_index {
                Some(index) => *group_wanted.entry(index).or_insert(request.quantity()),
                None => request.quantity(),
            };

            for bid_portfolio in bids {
                for bid in bid_portfolio
                    .bids()
                    .iter()
                    .filter(|b| b.request_id() == request.id())
                {
                    let cap = capacity_left.entry(bid_portfolio.bidder()).or_insert(0.0);
                    let amt = bid.quantity().min(wanted).min(*cap);
                    if amt <= EPS {
                        continue;
                    }
                    *cap -= amt;
                    wanted -= amt;
                    trades.push(Trade::new(request.clone(), bid.clone(), amt));
                }
            }

            if let Some(index) = group_index {
                group_wanted.insert(index, wanted);
            }
        }
    }
    trades
}

/// Drive every facility through one complete timestep
///
/// Returns every trade response shipped during the timestep.
pub fn run_timestep(time: &TimeManager, facilities: &mut [&mut dyn Facility]) -> Vec<TradeResponse> {
    let tick = time.current_tick();

    for facility in facilities.iter_mut() {
        facility.tick(tick);
    }

    let mut request_ports = Vec::new();
    for facility in facilities.iter_mut() {
        request_ports.extend(facility.request_phase(tick));
    }
    let requests = group_by_commodity(&request_ports);

    let mut bid_ports = Vec::new();
    for facility in facilities.iter_mut() {
        bid_ports.extend(facility.bid_phase(tick, &requests));
    }

    let trades = match_market(&request_ports, &bid_ports);

    let mut responses = Vec::new();
    for facility in facilities.iter_mut() {
        let mine: Vec<Trade> = trades
            .iter()
            .filter(|t| t.bid.bidder() == facility.id())
            .cloned()
            .collect();
        if !mine.is_empty() {
            responses.extend(facility.trade_phase(tick, &mine).expect("trade phase failed"));
        }
    }

    for facility in facilities.iter_mut() {
        let mine: Vec<TradeResponse> = responses
            .iter()
            .filter(|r| r.trade.request.requester() == facility.id())
            .cloned()
            .collect();
        if !mine.is_empty() {
            facility
                .accept_trades(tick, &mine)
                .expect("accept_trades failed");
        }
    }

    for facility in facilities.iter_mut() {
        facility.tock(tick).expect("tock failed");
    }

    responses
}

/// Unlimited supplier of one commodity, shipping exactly what was asked for
#[derive(Debug)]
pub struct Source {
    pub id: String,
    pub commodity: String,
    pub shipped: f64,
    events: EventLog,
}

impl Source {
    pub fn new(id: &str, commodity: &str) -> Self {
        Self {
            id: id.to_string(),
            commodity: commodity.to_string(),
            shipped: 0.0,
            events: EventLog::new(),
        }
    }
}

impl Requester for Source {
    fn request_phase(&mut self, _tick: usize) -> Vec<RequestPortfolio> {
        Vec::new()
    }

    fn accept_trades(&mut self, _tick: usize, _responses: &[TradeResponse]) -> Result<(), FacilityError> {
        Ok(())
    }
}

impl Bidder for Source {
    fn bid_phase(&mut self, _tick: usize, requests: &CommodityRequests) -> Vec<BidPortfolio> {
        let Some(requests) = requests.get(&self.commodity) else {
            return Vec::new();
        };
        let mut portfolio = BidPortfolio::new(self.id.as_str());
        for request in requests {
            let offer = Resource::new(request.quantity(), request.target().composition().clone());
            portfolio.add_bid(Bid::new(request, self.id.as_str(), offer, 1.0));
        }
        vec![portfolio]
    }
}

impl Trader for Source {
    fn trade_phase(&mut self, _tick: usize, trades: &[Trade]) -> Result<Vec<TradeResponse>, FacilityError> {
        Ok(trades
            .iter()
            .map(|t| {
                self.shipped += t.amt;
                TradeResponse {
                    trade: t.clone(),
                    resource: Resource::new(t.amt, t.request.target().composition().clone()),
                }
            })
            .collect())
    }
}

impl PositionTagged for Source {
    fn position(&self) -> Position {
        Position::default()
    }
}

impl Facility for Source {
    fn id(&self) -> &str {
        &self.id
    }

    fn enter_notify(&mut self, _tick: usize) {}

    fn tick(&mut self, _tick: usize) {}

    fn tock(&mut self, _tick: usize) -> Result<(), FacilityError> {
        Ok(())
    }

    fn status(&self) -> String {
        format!("{} supplies {}", self.id, self.commodity)
    }

    fn events(&self) -> &EventLog {
        &self.events
    }
}

/// Float comparison at the simulation tolerance
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}
