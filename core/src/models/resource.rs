//! Resource lot model
//!
//! A `Resource` is one lot of divisible material: a quantity plus an opaque
//! composition handle. Lots are immutable values. Splitting, transmuting,
//! combining and packaging all consume the input lot and hand back new values,
//! so no two owners ever alias the same mutable lot.
//!
//! # Example
//!
//! ```rust
//! use facility_sim_core::models::{Composition, Resource};
//!
//! let lot = Resource::new(10.0, Composition::blank());
//! let (taken, rest) = lot.split(4.0);
//! assert_eq!(taken.quantity(), 4.0);
//! assert_eq!(rest.quantity(), 6.0);
//! ```

use crate::core::EPS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name carried by lots that have not been packaged
pub const UNPACKAGED: &str = "unpackaged";

/// Opaque composition handle
///
/// Compositions compare by value. The blank composition (no name, no
/// fractions) stands in for "accept anything" on requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Recipe name this composition was built from ("" for untagged mixtures)
    name: String,

    /// Mass fraction per constituent
    fractions: BTreeMap<String, f64>,
}

impl Composition {
    /// Create a named composition from constituent mass fractions
    pub fn new(name: impl Into<String>, fractions: BTreeMap<String, f64>) -> Self {
        Self {
            name: name.into(),
            fractions,
        }
    }

    /// The unconstrained placeholder composition
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            fractions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fractions(&self) -> &BTreeMap<String, f64> {
        &self.fractions
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.fractions.is_empty()
    }

    /// Mass-weighted mixture of two compositions
    ///
    /// Identical compositions mix to themselves. Anything else yields an
    /// untagged mixture whose fractions are the normalized weighted sum.
    pub fn mix(&self, own_qty: f64, other: &Composition, other_qty: f64) -> Composition {
        if self == other {
            return self.clone();
        }
        if other_qty <= EPS {
            return self.clone();
        }
        if own_qty <= EPS {
            return other.clone();
        }

        let mut fractions: BTreeMap<String, f64> = BTreeMap::new();
        for (part, frac) in &self.fractions {
            *fractions.entry(part.clone()).or_insert(0.0) += frac * own_qty;
        }
        for (part, frac) in &other.fractions {
            *fractions.entry(part.clone()).or_insert(0.0) += frac * other_qty;
        }
        let total: f64 = fractions.values().sum();
        if total > 0.0 {
            for value in fractions.values_mut() {
                *value /= total;
            }
        }

        Composition {
            name: String::new(),
            fractions,
        }
    }
}

/// One lot of material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique lot identifier (UUID)
    id: String,

    /// Quantity in kg, never negative
    quantity: f64,

    /// Composition handle
    composition: Composition,

    /// Package type this lot was filled into
    package_name: String,
}

/// Result of packaging a lot
#[derive(Debug, Clone, PartialEq)]
pub struct Packaged {
    /// Package-sized lots, in fill order
    pub packages: Vec<Resource>,

    /// Material that did not fit into any package (possibly zero)
    pub remainder: Resource,
}

impl Resource {
    /// Create a fresh unpackaged lot
    ///
    /// # Panics
    /// Panics if quantity is negative or not finite
    pub fn new(quantity: f64, composition: Composition) -> Self {
        assert!(
            quantity.is_finite() && quantity >= 0.0,
            "quantity must be finite and non-negative"
        );
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            quantity,
            composition,
            package_name: UNPACKAGED.to_string(),
        }
    }

    /// Lot with the placeholder composition
    pub fn blank(quantity: f64) -> Self {
        Self::new(quantity, Composition::blank())
    }

    /// Restore a lot with every field preserved (checkpoint restore)
    pub fn from_snapshot(
        id: String,
        quantity: f64,
        composition: Composition,
        package_name: String,
    ) -> Self {
        Self {
            id,
            quantity: quantity.max(0.0),
            composition,
            package_name,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Split `qty` off this lot, returning `(taken, remainder)`
    ///
    /// `qty` is clamped into `[0, quantity]`. When it covers the whole lot
    /// (within `EPS`) the lot itself is returned as `taken` and the remainder
    /// is an empty lot of the same composition. Otherwise `taken` is a new lot
    /// and the remainder keeps this lot's identity.
    pub fn split(self, qty: f64) -> (Resource, Resource) {
        let qty = qty.clamp(0.0, self.quantity);
        if qty >= self.quantity - EPS {
            let empty = Resource {
                id: uuid::Uuid::new_v4().to_string(),
                quantity: 0.0,
                composition: self.composition.clone(),
                package_name: self.package_name.clone(),
            };
            return (self, empty);
        }

        let taken = Resource {
            id: uuid::Uuid::new_v4().to_string(),
            quantity: qty,
            composition: self.composition.clone(),
            package_name: self.package_name.clone(),
        };
        let remainder = Resource {
            quantity: self.quantity - qty,
            ..self
        };
        (taken, remainder)
    }

    /// Replace the composition, keeping quantity and identity
    pub fn transmute(self, composition: Composition) -> Resource {
        Resource {
            composition,
            ..self
        }
    }

    /// Merge lots into one, oldest first
    ///
    /// The first lot's identity survives; compositions are mass-weighted.
    /// Returns `None` for an empty input.
    pub fn combine(lots: Vec<Resource>) -> Option<Resource> {
        let mut iter = lots.into_iter();
        let mut merged = iter.next()?;
        for lot in iter {
            let composition = merged
                .composition
                .mix(merged.quantity, &lot.composition, lot.quantity);
            merged = Resource {
                quantity: merged.quantity + lot.quantity,
                composition,
                ..merged
            };
        }
        Some(merged)
    }

    /// Fill this lot into packages
    ///
    /// The packager decides the chunk sizes; every chunk is split off in
    /// order and tagged with the package name. Whatever is left over is
    /// returned as the remainder so the caller can put it back.
    pub fn package(self, packager: &dyn crate::models::packaging::Packager) -> Packaged {
        let fills = packager.fill_mass(self.quantity);
        let mut packages = Vec::with_capacity(fills.len());
        let mut rest = self;

        for fill in fills {
            if fill > rest.quantity + EPS {
                break;
            }
            let (chunk, remaining) = rest.split(fill);
            packages.push(Resource {
                package_name: packager.name().to_string(),
                ..chunk
            });
            rest = remaining;
        }

        Packaged {
            packages,
            remainder: rest,
        }
    }
}
