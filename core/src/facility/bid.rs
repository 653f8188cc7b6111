//! Bid Builder
//!
//! Turns outstanding requests on the facility's output commodity into
//! quantized, shipping-constrained offers.
//!
//! # Algorithm
//!
//! 1. `max_qty = min(throughput, available)`; nothing is offered below `EPS`
//!    or when nobody asked for the output commodity
//! 2. Per request: `qty = min(requested, max_qty)`, packaged into chunks,
//!    truncated to `max_shippable(chunk_count)` chunks
//! 3. One bid per surviving chunk, priced from the cost basis
//! 4. A single capacity constraint of `max_qty` over the whole portfolio
//!
//! # Pricing
//!
//! ```text
//! per_unit   = cost(throughput, requested, requested × avg_per_unit_cost) / requested
//! preference = 1 / per_unit
//! ```
//!
//! Cheaper accumulated feedstock therefore yields a higher preference.

use crate::catalog::CostModel;
use crate::core::EPS;
use crate::market::{Bid, BidPortfolio, CapacityConstraint, CommodityRequests, Request};
use crate::models::packaging::{Packager, ShippingLimit};
use crate::models::resource::{Composition, Resource};

/// Preference used when the cost model reports a free (or undefined) unit cost
pub const DEFAULT_BID_PREFERENCE: f64 = 1.0;

/// Builds the per-timestep bid portfolio
#[derive(Debug, Clone, Copy)]
pub struct BidBuilder<'a> {
    bidder: &'a str,
    outcommod: &'a str,
    out_recipe: Option<&'a Composition>,
    packager: &'a dyn Packager,
    shipping: &'a dyn ShippingLimit,
    cost_model: &'a dyn CostModel,
    throughput: f64,
    avg_per_unit_cost: f64,
}

impl<'a> BidBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bidder: &'a str,
        outcommod: &'a str,
        out_recipe: Option<&'a Composition>,
        packager: &'a dyn Packager,
        shipping: &'a dyn ShippingLimit,
        cost_model: &'a dyn CostModel,
        throughput: f64,
        avg_per_unit_cost: f64,
    ) -> Self {
        Self {
            bidder,
            outcommod,
            out_recipe,
            packager,
            shipping,
            cost_model,
            throughput,
            avg_per_unit_cost,
        }
    }

    /// Most that can be offered this timestep
    pub fn max_quantity(&self, available: f64) -> f64 {
        self.throughput.min(available)
    }

    /// Cost-adjusted preference for a request of `requested` kg
    pub fn preference(&self, requested: f64) -> f64 {
        if requested <= EPS {
            return DEFAULT_BID_PREFERENCE;
        }
        let fixed_cost = requested * self.avg_per_unit_cost;
        let per_unit = self.cost_model.cost(self.throughput, requested, fixed_cost) / requested;
        if !per_unit.is_finite() || per_unit <= EPS {
            DEFAULT_BID_PREFERENCE
        } else {
            1.0 / per_unit
        }
    }

    /// Package-sized chunks offered against one request
    pub fn chunks(&self, requested: f64, max_qty: f64) -> Vec<f64> {
        let qty = requested.min(max_qty);
        let mut fills = self.packager.fill_mass(qty);
        let shippable = self.shipping.max_shippable(fills.len());
        fills.truncate(shippable);
        fills
    }

    fn offer(&self, request: &Request, quantity: f64) -> Resource {
        let composition = match self.out_recipe {
            Some(recipe) => recipe.clone(),
            None => request.target().composition().clone(),
        };
        Resource::new(quantity, composition)
    }

    /// Build the portfolio from `available` ready stock, or `None` when
    /// nothing can be offered
    pub fn build(&self, available: f64, requests: &CommodityRequests) -> Option<BidPortfolio> {
        let max_qty = self.max_quantity(available);
        if max_qty < EPS {
            return None;
        }
        let requests = requests.get(self.outcommod)?;

        let mut portfolio = BidPortfolio::new(self.bidder);
        for request in requests {
            let requested = request.quantity();
            let preference = self.preference(requested);
            for fill in self.chunks(requested, max_qty) {
                let offer = self.offer(request, fill);
                portfolio.add_bid(Bid::new(request, self.bidder, offer, preference));
            }
        }

        portfolio.add_constraint(CapacityConstraint { capacity: max_qty });
        Some(portfolio)
    }
}
