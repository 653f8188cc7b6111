//! Storage facility
//!
//! Holds received material for a minimum residence time before offering it.
//!
//! # Tock
//!
//! 1. Every lot received this timestep is admitted to processing
//! 2. Lots that have waited `residence_time` timesteps move to ready
//! 3. Up to `throughput` of ready material is drawn into stocks
//!
//! Stocks are what the facility bids and trades from on the next timestep.
//! With `discrete_handling` lots are never split while staging.

use super::{
    log_bids, log_receipts, log_requests, log_shipments, position_event, status_line, Bidder,
    Facility, FacilityError, Position, PositionTagged, Requester, Trader,
};
use crate::buffer::ResidenceBuffer;
use crate::catalog::{Catalog, CostModel};
use crate::checkpoint::{BufferSnapshot, CheckpointError, FacilitySnapshot};
use crate::config::{CommodityPreferences, ConfigError, StorageConfig};
use crate::facility::bid::BidBuilder;
use crate::facility::request::RequestBuilder;
use crate::facility::trade::{CostBasis, TradeExecutor};
use crate::market::{BidPortfolio, CommodityRequests, RequestPortfolio, Trade, TradeResponse};
use crate::models::event::{Event, EventLog};
use crate::models::packaging::{Packager, ShippingLimit};
use crate::models::resource::Composition;
use std::sync::Arc;
use tracing::{info, trace};

const INVENTORY: &str = "inventory";
const PROCESSING: &str = "processing";
const READY: &str = "ready";
const STOCKS: &str = "stocks";

/// Residence-staged storage facility
#[derive(Debug)]
pub struct Storage {
    id: String,
    config: StorageConfig,
    preferences: CommodityPreferences,
    in_recipe: Option<Composition>,
    packager: Arc<dyn Packager>,
    shipping: Arc<dyn ShippingLimit>,
    cost_model: Arc<dyn CostModel>,
    position: Position,
    staged: ResidenceBuffer,
    cost_basis: CostBasis,
    events: EventLog,
}

impl Storage {
    /// Build a facility, resolving every configured name through `catalog`
    pub fn new(
        id: impl Into<String>,
        config: StorageConfig,
        catalog: &dyn Catalog,
        cost_model: Arc<dyn CostModel>,
    ) -> Result<Self, ConfigError> {
        let resolved = config.resolve(catalog)?;
        let position = Position::new(config.latitude, config.longitude)?;
        let staged = ResidenceBuffer::new(
            config.residence_time,
            config.max_inv_size,
            config.discrete_handling,
        );

        Ok(Self {
            id: id.into(),
            preferences: resolved.preferences,
            in_recipe: resolved.in_recipe,
            packager: resolved.packager,
            shipping: resolved.shipping,
            cost_model,
            position,
            staged,
            cost_basis: CostBasis::default(),
            events: EventLog::new(),
            config,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// All four staging buffers and the entry log
    pub fn staged(&self) -> &ResidenceBuffer {
        &self.staged
    }

    pub fn cost_basis(&self) -> CostBasis {
        self.cost_basis
    }

    /// The single output commodity every input is lumped into
    pub fn outcommod(&self) -> &str {
        // resolve() guarantees at least one entry
        self.config.out_commods.first().map_or("", String::as_str)
    }

    /// Quantity the facility would request right now
    pub fn current_capacity(&self) -> f64 {
        self.request_builder().request_amount(self.staged.space())
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
            self.outcommod(),
            None,
            self.packager.as_ref(),
            self.shipping.as_ref(),
            self.cost_model.as_ref(),
            self.config.throughput,
            self.cost_basis.avg_per_unit_cost(),
        )
    }

    /// Capture every lot of every stage, the entry log and the cost basis
    pub fn snapshot(&self, tick: usize) -> FacilitySnapshot {
        let mut snapshot = FacilitySnapshot::new(&self.id, tick, self.config.config_hash());
        let stages = [
            (INVENTORY, self.staged.inventory()),
            (PROCESSING, self.staged.processing()),
            (READY, self.staged.ready()),
            (STOCKS, self.staged.stocks()),
        ];
        for (name, buf) in stages {
            snapshot
                .buffers
                .insert(name.to_string(), BufferSnapshot::from(buf));
        }
        snapshot.entry_log = self.staged.entry_log().copied().collect();
        snapshot.cost_basis = self.cost_basis;
        snapshot
    }

    /// Replace staging contents and cost basis from a snapshot
    pub fn restore(&mut self, mut snapshot: FacilitySnapshot) -> Result<(), CheckpointError> {
        snapshot.validate_against(&self.id, &self.config.config_hash())?;
        if snapshot.total_quantity() > self.config.max_inv_size + crate::core::EPS {
            return Err(CheckpointError::InvariantViolation(format!(
                "snapshot holds {} but max_inv_size is {}",
                snapshot.total_quantity(),
                self.config.max_inv_size
            )));
        }

        let inventory = snapshot.take_buffer(INVENTORY)?.into_buffer()?;
        let processing = snapshot.take_buffer(PROCESSING)?.into_buffer()?;
        let ready = snapshot.take_buffer(READY)?.into_buffer()?;
        let stocks = snapshot.take_buffer(STOCKS)?.into_buffer()?;

        let staged = ResidenceBuffer::from_parts(
            self.config.residence_time,
            self.config.max_inv_size,
            self.config.discrete_handling,
            inventory,
            processing,
            ready,
            stocks,
            snapshot.entry_log,
        )
        .ok_or_else(|| {
            CheckpointError::InvariantViolation(
                "entry log is out of order or does not match processing quantity".to_string(),
            )
        })?;

        self.staged = staged;
        self.cost_basis = snapshot.cost_basis;
        Ok(())
    }
}

impl Requester for Storage {
    fn request_phase(&mut self, tick: usize) -> Vec<RequestPortfolio> {
        let ports: Vec<RequestPortfolio> = self
            .request_builder()
            .build(self.staged.space())
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
        self.staged
            .receive_all(responses.iter().map(|r| r.resource.clone()).collect())?;
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

impl Bidder for Storage {
    fn bid_phase(&mut self, tick: usize, requests: &CommodityRequests) -> Vec<BidPortfolio> {
        let ports: Vec<BidPortfolio> = self
            .bid_builder()
            .build(self.staged.stocks().quantity(), requests)
            .into_iter()
            .collect();
        log_bids(&mut self.events, tick, &self.id, &ports);
        ports
    }
}

impl Trader for Storage {
    fn trade_phase(
        &mut self,
        tick: usize,
        trades: &[Trade],
    ) -> Result<Vec<TradeResponse>, FacilityError> {
        let outcommod = self.outcommod().to_string();
        let executor = TradeExecutor::new(
            &self.id,
            &outcommod,
            None,
            self.packager.as_ref(),
            self.shipping.as_ref(),
        );
        let responses = executor.execute(self.staged.stocks_mut(), trades)?;
        log_shipments(&mut self.events, tick, &self.id, &responses);
        Ok(responses)
    }
}

impl PositionTagged for Storage {
    fn position(&self) -> Position {
        self.position
    }
}

impl Facility for Storage {
    fn id(&self) -> &str {
        &self.id
    }

    fn enter_notify(&mut self, tick: usize) {
        self.events
            .log(position_event(tick, &self.id, self.position));
        info!(agent = %self.id, status = %self.status(), "storage facility entered");
    }

    fn tick(&mut self, tick: usize) {
        let demand = self.current_capacity();
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
        for entry in self.staged.begin_processing(tick)? {
            self.events.log(Event::Admitted {
                tick,
                agent_id: self.id.clone(),
                quantity: entry.quantity,
            });
        }

        for entry in self.staged.promote(tick)? {
            self.events.log(Event::Promoted {
                tick,
                agent_id: self.id.clone(),
                admitted_at: entry.tick,
                quantity: entry.quantity,
            });
        }

        let drawn = self.staged.draw_ready(self.config.throughput)?;
        if drawn > crate::core::EPS {
            self.events.log(Event::Drawn {
                tick,
                agent_id: self.id.clone(),
                quantity: drawn,
            });
        }
        trace!(
            agent = %self.id,
            processing = self.staged.processing().quantity(),
            ready = self.staged.ready().quantity(),
            stocks = self.staged.stocks().quantity(),
            "storage tock"
        );

        let supply = self
            .bid_builder()
            .max_quantity(self.staged.stocks().quantity());
        self.events.log(Event::Supply {
            tick,
            agent_id: self.id.clone(),
            commodity: self.outcommod().to_string(),
            value: supply,
        });
        Ok(())
    }

    fn status(&self) -> String {
        status_line(
            &self.id,
            self.preferences.commodities(),
            self.staged.max_inv_size(),
        )
    }

    fn events(&self) -> &EventLog {
        &self.events
    }
}
