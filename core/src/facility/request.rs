//! Request Builder
//!
//! Decides how much input material to ask for this timestep and on which
//! commodities.
//!
//! # Algorithm
//!
//! 1. `amount = min(throughput, max(0, space_available))`; below `EPS`, no request
//! 2. One target resource of `amount`, built from the input recipe if set,
//!    otherwise the blank "accept anything" composition
//! 3. One request per input commodity, in declared order, each for the
//!    full `amount` and tagged with that commodity's preference
//! 4. All of them form one mutual group: the facility wants `amount` in total,
//!    not `amount` per commodity

use crate::config::CommodityPreferences;
use crate::core::EPS;
use crate::market::{Request, RequestPortfolio};
use crate::models::resource::{Composition, Resource};

/// Builds the per-timestep request portfolio
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    requester: &'a str,
    preferences: &'a CommodityPreferences,
    recipe: Option<&'a Composition>,
    throughput: f64,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(
        requester: &'a str,
        preferences: &'a CommodityPreferences,
        recipe: Option<&'a Composition>,
        throughput: f64,
    ) -> Self {
        Self {
            requester,
            preferences,
            recipe,
            throughput,
        }
    }

    /// Quantity to request given the space left in the receiving buffer
    ///
    /// Returns 0.0 whenever the result would fall below `EPS`.
    pub fn request_amount(&self, space_available: f64) -> f64 {
        let amount = self.throughput.min(space_available.max(0.0));
        if amount < EPS {
            0.0
        } else {
            amount
        }
    }

    /// Build the portfolio, or `None` when nothing is wanted
    pub fn build(&self, space_available: f64) -> Option<RequestPortfolio> {
        let amount = self.request_amount(space_available);
        if amount < EPS {
            return None;
        }

        let composition = self.recipe.cloned().unwrap_or_else(Composition::blank);
        let target = Resource::new(amount, composition);

        let mut portfolio = RequestPortfolio::new(self.requester);
        let mut mutuals = Vec::with_capacity(self.preferences.len());
        for (commodity, preference) in self.preferences.iter() {
            let request = Request::new(self.requester, commodity, target.clone(), preference);
            mutuals.push(portfolio.add_request(request));
        }
        portfolio.add_mutual_group(mutuals);
        Some(portfolio)
    }
}
