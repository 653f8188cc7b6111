//! Trade Executor and cost basis
//!
//! # Selling side
//!
//! For each matched trade, in order, while the transport unit still allows:
//! 1. Pop the traded quantity from the ready buffer
//! 2. Package it; anything packaging did not consume goes straight back
//! 3. Respond with the package, or with an empty lot if packaging failed
//! 4. Without an output recipe, transmute the response to the requester's
//!    target composition
//!
//! Trades beyond `max_shippable(trade_count)` get empty responses. Shortfalls
//! are ordinary market outcomes, never errors.
//!
//! # Buying side
//!
//! [`CostBasis::recompute`] derives a fresh quantity-weighted average
//! acquisition cost from exactly the trades accepted in one call:
//!
//! ```text
//! avg_per_unit_cost = Σ(amt_i / bid_preference_i) / Σ(amt_i)
//! ```

use crate::buffer::res_buf::{BufferError, ResBuf};
use crate::core::EPS;
use crate::market::{Trade, TradeResponse};
use crate::models::packaging::{Packager, ShippingLimit};
use crate::models::resource::{Composition, Resource};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Executes matched trades against a ready buffer
#[derive(Debug, Clone, Copy)]
pub struct TradeExecutor<'a> {
    agent_id: &'a str,
    outcommod: &'a str,
    out_recipe: Option<&'a Composition>,
    packager: &'a dyn Packager,
    shipping: &'a dyn ShippingLimit,
}

impl<'a> TradeExecutor<'a> {
    pub fn new(
        agent_id: &'a str,
        outcommod: &'a str,
        out_recipe: Option<&'a Composition>,
        packager: &'a dyn Packager,
        shipping: &'a dyn ShippingLimit,
    ) -> Self {
        Self {
            agent_id,
            outcommod,
            out_recipe,
            packager,
            shipping,
        }
    }

    /// Respond to every trade, drawing material from `source`
    ///
    /// Returns one response per trade, in the order given. Fails only when a
    /// trade asks for more than `source` holds, which means the matcher broke
    /// the bid's capacity constraint. On failure `source` is left exactly as
    /// it was before the call.
    pub fn execute(
        &self,
        source: &mut ResBuf,
        trades: &[Trade],
    ) -> Result<Vec<TradeResponse>, BufferError> {
        let untouched = source.clone();
        match self.respond_all(source, trades) {
            Ok(responses) => Ok(responses),
            Err(err) => {
                warn!(agent = %self.agent_id, error = %err, "trade execution rolled back");
                *source = untouched;
                Err(err)
            }
        }
    }

    fn respond_all(
        &self,
        source: &mut ResBuf,
        trades: &[Trade],
    ) -> Result<Vec<TradeResponse>, BufferError> {
        let mut shippable_trades = self.shipping.max_shippable(trades.len());
        let mut responses = Vec::with_capacity(trades.len());

        for trade in trades {
            let target = trade.request.target().composition();
            if shippable_trades == 0 {
                responses.push(TradeResponse {
                    trade: trade.clone(),
                    resource: Resource::new(0.0, target.clone()),
                });
                continue;
            }

            let popped = source.pop(trade.amt)?;
            let composition = popped.composition().clone();
            let packaged = popped.package(self.packager);

            let mut packages = packaged.packages.into_iter();
            let shipped = packages.next();

            // Extra packages and the unpackaged remainder both go back
            let mut returned: Vec<Resource> = packages.collect();
            returned.push(packaged.remainder);
            source.push_all(returned)?;

            let mut response = match shipped {
                Some(package) => {
                    shippable_trades -= 1;
                    package
                }
                None => {
                    warn!(
                        agent = %self.agent_id,
                        amt = trade.amt,
                        package = %self.packager.name(),
                        "packaging failed, responding with an empty shipment"
                    );
                    Resource::new(0.0, composition)
                }
            };

            if self.out_recipe.is_none() && response.composition() != target {
                response = response.transmute(target.clone());
            }

            debug!(
                agent = %self.agent_id,
                commodity = %self.outcommod,
                quantity = response.quantity(),
                "sent an order"
            );
            responses.push(TradeResponse {
                trade: trade.clone(),
                resource: response,
            });
        }

        Ok(responses)
    }
}

/// Running average acquisition cost of received feedstock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    avg_per_unit_cost: f64,
}

impl CostBasis {
    pub fn new(avg_per_unit_cost: f64) -> Self {
        Self { avg_per_unit_cost }
    }

    pub fn avg_per_unit_cost(&self) -> f64 {
        self.avg_per_unit_cost
    }

    /// Recompute from the trades accepted in one call
    ///
    /// Trades whose bid preference is not positive carry no price and are
    /// skipped. When nothing priced was accepted the basis is left as is and
    /// `None` is returned.
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::facility::CostBasis;
    ///
    /// let mut basis = CostBasis::default();
    /// let updated = basis.recompute_from([(3.0, 0.5), (1.0, 1.0)]);
    /// assert_eq!(updated, Some(1.75));
    /// ```
    pub fn recompute_from(
        &mut self,
        accepted: impl IntoIterator<Item = (f64, f64)>,
    ) -> Option<f64> {
        let mut weighted_cost = 0.0;
        let mut total_amt = 0.0;
        for (amt, preference) in accepted {
            if preference <= EPS || amt <= 0.0 {
                continue;
            }
            weighted_cost += amt / preference;
            total_amt += amt;
        }
        if total_amt <= EPS {
            return None;
        }
        self.avg_per_unit_cost = weighted_cost / total_amt;
        Some(self.avg_per_unit_cost)
    }

    /// Recompute from accepted trade responses
    pub fn recompute(&mut self, responses: &[TradeResponse]) -> Option<f64> {
        self.recompute_from(
            responses
                .iter()
                .map(|r| (r.trade.amt, r.trade.bid.preference())),
        )
    }
}
