//! Conversion facility
//!
//! Accepts any of its input commodities into a single inventory whose
//! capacity equals its throughput, and offers that inventory on its output
//! commodity. The conversion itself is a pass-through: material leaves with
//! the requester's composition (or the output recipe, when one is set).

use super::{
    log_bids, log_receipts, log_requests, log_shipments, position_event, status_line, Bidder,
    Facility, FacilityError, Position, PositionTagged, Requester, Trader,
};
use crate::buffer::ResBuf;
use crate::catalog::{Catalog, CostModel};
use crate::checkpoint::{BufferSnapshot, CheckpointError, FacilitySnapshot};
use crate::config::{CommodityPreferences, ConfigError, ConversionConfig};
use crate::facility::bid::BidBuilder;
use crate::facility::request::RequestBuilder;
use crate::facility::trade::{CostBasis, TradeExecutor};
use crate::market::{BidPortfolio, CommodityRequests, RequestPortfolio, Trade, TradeResponse};
use crate::models::event::{Event, EventLog};
use crate::models::packaging::{Packager, ShippingLimit};
use crate::models::resource::Composition;
use std::sync::Arc;
use tracing::info;

const INVENTORY: &str = "inventory";

/// Simple intake facility
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use facility_sim_core::catalog::{LinearCost, StaticCatalog};
/// use facility_sim_core::config::ConversionConfig;
/// use facility_sim_core::facility::{Conversion, Facility, Requester};
///
/// let mut config = ConversionConfig::new(vec!["ore".into()], "yellowcake");
/// config.throughput = 10.0;
/// let mut conv = Conversion::new(
///     "mill",
///     config,
///     &StaticCatalog::new(),
///     Arc::new(LinearCost::default()),
/// )
/// .unwrap();
///
/// let requests = conv.request_phase(0);
/// assert_eq!(requests[0].requests()[0].quantity(), 10.0);
/// assert_eq!(
///     conv.status(),
///     "mill accepts commodities {ore} until its inventory is full at 10 kg."
/// );
/// ```
#[derive(Debug)]
pub struct Conversion {
    id: String,
    config: ConversionConfig,
    preferences: CommodityPreferences,
    in_recipe: Option<Composition>,
    out_recipe: Option<Composition>,
    packager: Arc<dyn Packager>,
    shipping: Arc<dyn ShippingLimit>,
    cost_model: Arc<dyn CostModel>,
    position: Position,

    /// Received material, capacity = throughput
    inventory: ResBuf,

    cost_basis: CostBasis,
    events: EventLog,
}

impl Conversion {
    /// Build a facility, resolving every configured name through `catalog`
    pub fn new(
        id: impl Into<String>,
        config: ConversionConfig,
        catalog: &dyn Catalog,
        cost_model: Arc<dyn CostModel>,
    ) -> Result<Self, ConfigError> {
        let resolved = config.resolve(catalog)?;
        let position = Position::new(config.latitude, config.longitude)?;
        let inventory = ResBuf::with_capacity(config.throughput);

        Ok(Self {
            id: id.into(),
            preferences: resolved.preferences,
            in_recipe: resolved.in_recipe,
            out_recipe: resolved.out_recipe,
            packager: resolved.packager,
            shipping: resolved.shipping,
            cost_model,
            position,
            inventory,
            cost_basis: CostBasis::default(),
            events: EventLog::new(),
            config,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn inventory(&self) -> &ResBuf {
        &self.inventory
    }

    pub fn cost_basis(&self) -> CostBasis {
        self.cost_basis
    }

    /// Quantity the facility would request right now
    pub fn space_available(&self) -> f64 {
        self.request_builder().request_amount(self.inventory.space())
    }

    fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(
            &self.id,
            &self.preferences,
            self.in_recipe.as_ref(),
            self.config.throughput,
        )
    }

    fn bid_builder(&self) -> BidBuilder<'_> {
        BidBuilder::new(
            &self.id,
            &self.config.outcommod,
            self.out_recipe.as_ref(),
            self.packager.as_ref(),
            self.shipping.as_ref(),
            self.cost_model.as_ref(),
            self.config.throughput,
            self.cost_basis.avg_per_unit_cost(),
        )
    }

    /// Capture every lot and the cost basis
    pub fn snapshot(&self, tick: usize) -> FacilitySnapshot {
        let mut snapshot = FacilitySnapshot::new(&self.id, tick, self.config.config_hash());
        snapshot
            .buffers
            .insert(INVENTORY.to_string(), BufferSnapshot::from(&self.inventory));
        snapshot.cost_basis = self.cost_basis;
        snapshot
    }

    /// Replace buffer contents and cost basis from a snapshot
    pub fn restore(&mut self, mut snapshot: FacilitySnapshot) -> Result<(), CheckpointError> {
        snapshot.validate_against(&self.id, &self.config.config_hash())?;
        let inventory = snapshot.take_buffer(INVENTORY)?.into_buffer()?;
        self.inventory = inventory;
        self.cost_basis = snapshot.cost_basis;
        Ok(())
    }
}

impl Requester for Conversion {
    fn request_phase(&mut self, tick: usize) -> Vec<RequestPortfolio> {
        let ports: Vec<RequestPortfolio> = self
            .request_builder()
            .build(self.inventory.space())
            .into_iter()
            .collect();
        log_requests(&mut self.events, tick, &self.id, &ports);
        ports
    }

    fn accept_trades(
        &mut self,
        tick: usize,
        responses: &[TradeResponse],
    ) -> Result<(), FacilityError> {
        self.inventory
            .push_all(responses.iter().map(|r| r.resource.clone()).collect())?;
        log_receipts(&mut self.events, tick, &self.id, responses);

        if let Some(avg) = self.cost_basis.recompute(responses) {
            self.events.log(Event::CostBasisUpdated {
                tick,
                agent_id: self.id.clone(),
                avg_per_unit_cost: avg,
            });
        }
        Ok(())
    }
}

impl Bidder for Conversion {
    fn bid_phase(&mut self, tick: usize, requests: &CommodityRequests) -> Vec<BidPortfolio> {
        let ports: Vec<BidPortfolio> = self
            .bid_builder()
            .build(self.inventory.quantity(), requests)
            .into_iter()
            .collect();
        log_bids(&mut self.events, tick, &self.id, &ports);
        ports
    }
}

impl Trader for Conversion {
    fn trade_phase(
        &mut self,
        tick: usize,
        trades: &[Trade],
    ) -> Result<Vec<TradeResponse>, FacilityError> {
        let executor = TradeExecutor::new(
            &self.id,
            &self.config.outcommod,
            self.out_recipe.as_ref(),
            self.packager.as_ref(),
            self.shipping.as_ref(),
        );
        let responses = executor.execute(&mut self.inventory, trades)?;
        log_shipments(&mut self.events, tick, &self.id, &responses);
        Ok(responses)
    }
}

impl PositionTagged for Conversion {
    fn position(&self) -> Position {
        self.position
    }
}

impl Facility for Conversion {
    fn id(&self) -> &str {
        &self.id
    }

    fn enter_notify(&mut self, tick: usize) {
        self.events
            .log(position_event(tick, &self.id, self.position));
        info!(agent = %self.id, status = %self.status(), "conversion facility entered");
    }

    fn tick(&mut self, tick: usize) {
        let demand = self.space_available();
        for commodity in self.preferences.commodities() {
            self.events.log(Event::Demand {
                tick,
                agent_id: self.id.clone(),
                commodity: commodity.clone(),
                value: demand,
            });
        }
    }

    fn tock(&mut self, tick: usize) -> Result<(), FacilityError> {
        let supply = self
            .bid_builder()
            .max_quantity(self.inventory.quantity());
        self.events.log(Event::Supply {
            tick,
            agent_id: self.id.clone(),
            commodity: self.config.outcommod.clone(),
            value: supply,
        });
        Ok(())
    }

    fn status(&self) -> String {
        status_line(
            &self.id,
            self.preferences.commodities(),
            self.inventory.capacity(),
        )
    }

    fn events(&self) -> &EventLog {
        &self.events
    }
}
