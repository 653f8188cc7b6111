//! Injected lookups: recipes, packages, transport units and pricing
//!
//! Facilities never reach into an ambient simulation context. Everything they
//! need to resolve by name comes through a [`Catalog`] handed to their
//! constructor, and pricing comes through a [`CostModel`]. Names are resolved
//! once at construction, so a misspelled recipe fails fast instead of at
//! trade time.
//!
//! # Example
//!
//! ```rust
//! use facility_sim_core::catalog::{Catalog, StaticCatalog};
//! use facility_sim_core::models::Composition;
//!
//! let catalog = StaticCatalog::new().with_recipe("natu", Composition::blank());
//! assert!(catalog.recipe("natu").is_some());
//! assert!(catalog.package("unpackaged").is_some());
//! assert!(catalog.transport_unit("unrestricted").is_some());
//! ```

use crate::models::packaging::{Package, Packager, ShippingLimit, TransportUnit};
use crate::models::resource::Composition;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Name-based lookups supplied by the simulation kernel
pub trait Catalog {
    fn recipe(&self, name: &str) -> Option<Composition>;

    fn package(&self, name: &str) -> Option<Arc<dyn Packager>>;

    fn transport_unit(&self, name: &str) -> Option<Arc<dyn ShippingLimit>>;
}

/// In-memory catalog
///
/// Always knows the `unpackaged` package and the `unrestricted` transport unit.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    recipes: HashMap<String, Composition>,
    packages: HashMap<String, Arc<dyn Packager>>,
    transport_units: HashMap<String, Arc<dyn ShippingLimit>>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticCatalog {
    pub fn new() -> Self {
        let unpackaged = Package::unpackaged();
        let unrestricted = TransportUnit::unrestricted();

        let mut packages: HashMap<String, Arc<dyn Packager>> = HashMap::new();
        packages.insert(unpackaged.name().to_string(), Arc::new(unpackaged));

        let mut transport_units: HashMap<String, Arc<dyn ShippingLimit>> = HashMap::new();
        transport_units.insert(unrestricted.name().to_string(), Arc::new(unrestricted));

        Self {
            recipes: HashMap::new(),
            packages,
            transport_units,
        }
    }

    pub fn with_recipe(mut self, name: impl Into<String>, composition: Composition) -> Self {
        self.recipes.insert(name.into(), composition);
        self
    }

    pub fn with_package(mut self, package: impl Packager + 'static) -> Self {
        self.packages
            .insert(package.name().to_string(), Arc::new(package));
        self
    }

    pub fn with_transport_unit(mut self, unit: impl ShippingLimit + 'static) -> Self {
        self.transport_units
            .insert(unit.name().to_string(), Arc::new(unit));
        self
    }
}

impl Catalog for StaticCatalog {
    fn recipe(&self, name: &str) -> Option<Composition> {
        self.recipes.get(name).cloned()
    }

    fn package(&self, name: &str) -> Option<Arc<dyn Packager>> {
        self.packages.get(name).cloned()
    }

    fn transport_unit(&self, name: &str) -> Option<Arc<dyn ShippingLimit>> {
        self.transport_units.get(name).cloned()
    }
}

/// Pricing function used to turn a cost basis into a bid preference
pub trait CostModel: Debug {
    /// Total cost of supplying `quantity` at the given `throughput`,
    /// including `fixed_cost`
    fn cost(&self, throughput: f64, quantity: f64, fixed_cost: f64) -> f64;
}

/// Constant per-unit operating cost on top of the fixed cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCost {
    pub per_unit: f64,
}

impl Default for LinearCost {
    fn default() -> Self {
        Self { per_unit: 1.0 }
    }
}

impl CostModel for LinearCost {
    fn cost(&self, _throughput: f64, quantity: f64, fixed_cost: f64) -> f64 {
        self.per_unit * quantity + fixed_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packaging::FillStrategy;

    #[test]
    fn test_registered_package_is_found() {
        let drum = Package::new("drum", 0.0, 2.0, FillStrategy::First).unwrap();
        let catalog = StaticCatalog::new().with_package(drum);
        let found = catalog.package("drum").unwrap();
        assert_eq!(found.fill_mass(4.0), vec![2.0, 2.0]);
        assert!(catalog.package("crate").is_none());
    }

    #[test]
    fn test_linear_cost() {
        let model = LinearCost { per_unit: 2.0 };
        assert_eq!(model.cost(100.0, 5.0, 3.0), 13.0);
    }
}
