//! Packaging and transport-unit quantization
//!
//! Two pure rules shape every shipment:
//!
//! - a [`Packager`] turns a continuous quantity into an ordered list of
//!   package fill masses, each between the package's minimum and maximum fill;
//! - a [`ShippingLimit`] caps how many packages can travel together.
//!
//! Facilities receive both as injected trait objects, so tests can swap in
//! any rule they like. [`Package`] and [`TransportUnit`] are the stock
//! implementations, including the distinguished `unpackaged` and
//! `unrestricted` instances that impose no quantization at all.

use crate::core::EPS;
use crate::models::resource::UNPACKAGED;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Name of the transport unit that ships any number of packages
pub const UNRESTRICTED: &str = "unrestricted";

/// Errors raised when a packaging rule is declared with impossible bounds
#[derive(Debug, Error, PartialEq)]
pub enum PackagingError {
    #[error("Invalid fill bounds for {name}: min {fill_min}, max {fill_max}")]
    InvalidFillBounds {
        name: String,
        fill_min: f64,
        fill_max: f64,
    },
}

/// Splits a quantity into package fill masses
pub trait Packager: Debug {
    /// Package type name stamped onto packaged lots
    fn name(&self) -> &str;

    /// Ordered chunk sizes summing to at most `qty`
    fn fill_mass(&self, qty: f64) -> Vec<f64>;
}

/// Caps the number of packages shipped together
pub trait ShippingLimit: Debug {
    fn name(&self) -> &str;

    /// Largest number of the given packages that can actually ship
    fn max_shippable(&self, packages: usize) -> usize;
}

/// How a package fill mass is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStrategy {
    /// Fill each package to its maximum; a final partial package ships if it
    /// reaches the minimum fill
    First,
    /// Use the fewest packages possible and fill them all equally
    Equal,
}

/// A package type with fill bounds in kg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    name: String,
    fill_min: f64,
    fill_max: f64,
    strategy: FillStrategy,
}

impl Package {
    /// Declare a package type
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::models::packaging::{FillStrategy, Package, Packager};
    ///
    /// let drum = Package::new("drum", 0.0, 2.5, FillStrategy::First).unwrap();
    /// assert_eq!(drum.fill_mass(10.0), vec![2.5, 2.5, 2.5, 2.5]);
    /// ```
    pub fn new(
        name: impl Into<String>,
        fill_min: f64,
        fill_max: f64,
        strategy: FillStrategy,
    ) -> Result<Self, PackagingError> {
        let name = name.into();
        if !(fill_min >= 0.0 && fill_max > 0.0 && fill_min <= fill_max) {
            return Err(PackagingError::InvalidFillBounds {
                name,
                fill_min,
                fill_max,
            });
        }
        Ok(Self {
            name,
            fill_min,
            fill_max,
            strategy,
        })
    }

    /// The package that leaves quantities untouched
    pub fn unpackaged() -> Self {
        Self {
            name: UNPACKAGED.to_string(),
            fill_min: 0.0,
            fill_max: f64::INFINITY,
            strategy: FillStrategy::First,
        }
    }

    pub fn fill_min(&self) -> f64 {
        self.fill_min
    }

    pub fn fill_max(&self) -> f64 {
        self.fill_max
    }

    pub fn strategy(&self) -> FillStrategy {
        self.strategy
    }
}

impl Packager for Package {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill_mass(&self, qty: f64) -> Vec<f64> {
        if qty <= EPS || qty < self.fill_min - EPS {
            return Vec::new();
        }
        if self.name == UNPACKAGED || self.fill_max.is_infinite() {
            return vec![qty];
        }

        let fill = match self.strategy {
            FillStrategy::First => self.fill_max,
            FillStrategy::Equal => {
                let num_max_fill = (qty / self.fill_max).ceil();
                let num_min_fill = if self.fill_min > 0.0 {
                    (qty / self.fill_min).floor()
                } else {
                    f64::INFINITY
                };
                if num_min_fill >= num_max_fill {
                    qty / num_max_fill
                } else {
                    self.fill_max
                }
            }
        };

        let full = ((qty + EPS) / fill).floor() as usize;
        let mut fills = vec![fill; full];

        let leftover = qty - fill * full as f64;
        if self.strategy == FillStrategy::First
            && leftover > EPS
            && leftover >= self.fill_min - EPS
        {
            fills.push(leftover);
        }
        fills
    }
}

/// How packages are loaded into transport units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingStrategy {
    /// Only completely full units ship
    First,
    /// Spread packages equally over the fewest units
    Equal,
    /// Full units first, then one partial unit if it reaches the minimum
    Hybrid,
}

/// A transport unit holding between `fill_min` and `fill_max` packages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportUnit {
    name: String,
    fill_min: usize,
    fill_max: usize,
    strategy: ShippingStrategy,
}

impl TransportUnit {
    /// Declare a transport unit
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::models::packaging::{ShippingLimit, ShippingStrategy, TransportUnit};
    ///
    /// let truck = TransportUnit::new("truck", 3, 3, ShippingStrategy::First).unwrap();
    /// assert_eq!(truck.max_shippable(4), 3);
    /// ```
    pub fn new(
        name: impl Into<String>,
        fill_min: usize,
        fill_max: usize,
        strategy: ShippingStrategy,
    ) -> Result<Self, PackagingError> {
        let name = name.into();
        if fill_max == 0 || fill_min > fill_max {
            return Err(PackagingError::InvalidFillBounds {
                name,
                fill_min: fill_min as f64,
                fill_max: fill_max as f64,
            });
        }
        Ok(Self {
            name,
            fill_min,
            fill_max,
            strategy,
        })
    }

    /// The unit that ships every package
    pub fn unrestricted() -> Self {
        Self {
            name: UNRESTRICTED.to_string(),
            fill_min: 0,
            fill_max: usize::MAX,
            strategy: ShippingStrategy::First,
        }
    }
}

impl ShippingLimit for TransportUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_shippable(&self, packages: usize) -> usize {
        if packages == 0 {
            return 0;
        }
        if self.name == UNRESTRICTED {
            return packages;
        }
        if packages < self.fill_min {
            return 0;
        }

        let full_units = packages / self.fill_max;
        let leftover = packages % self.fill_max;
        match self.strategy {
            ShippingStrategy::First => full_units * self.fill_max,
            ShippingStrategy::Hybrid => {
                let partial = if leftover >= self.fill_min && leftover > 0 {
                    leftover
                } else {
                    0
                };
                full_units * self.fill_max + partial
            }
            ShippingStrategy::Equal => {
                let units = packages.div_ceil(self.fill_max);
                let per_unit = packages / units;
                if per_unit >= self.fill_min {
                    per_unit * units
                } else {
                    0
                }
            }
        }
    }
}
