//! Quantity Buffer
//!
//! A capacity-bounded FIFO of resource lots.
//!
//! # Critical Invariants
//!
//! - **Capacity**: `quantity() <= capacity() + EPS` after every push
//! - **No overdraw**: popping more than `quantity() + EPS` fails and changes nothing
//! - **Lazy merging**: lots are only combined at the moment of popping, never on push
//!
//! # Example
//!
//! ```rust
//! use facility_sim_core::buffer::ResBuf;
//! use facility_sim_core::models::Resource;
//!
//! let mut buf = ResBuf::with_capacity(10.0);
//! buf.push(Resource::blank(4.0)).unwrap();
//! buf.push(Resource::blank(4.0)).unwrap();
//! assert!(buf.push(Resource::blank(4.0)).is_err());
//!
//! let popped = buf.pop(5.0).unwrap();
//! assert_eq!(popped.quantity(), 5.0);
//! assert_eq!(buf.quantity(), 3.0);
//! ```

use crate::core::EPS;
use crate::models::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors that can occur during buffer operations
#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("Capacity exceeded: requested {requested}, space {space}")]
    CapacityExceeded { requested: f64, space: f64 },

    #[error("Insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity { requested: f64, available: f64 },
}

/// Capacity-bounded container of resource lots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResBuf {
    /// Upper bound on total quantity
    capacity: f64,

    /// Owned lots, oldest first
    lots: VecDeque<Resource>,
}

impl Default for ResBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl ResBuf {
    /// Create an unbounded buffer
    pub fn new() -> Self {
        Self::with_capacity(f64::MAX)
    }

    /// Create an empty buffer with the given capacity
    ///
    /// # Panics
    /// Panics if capacity is negative or NaN
    pub fn with_capacity(capacity: f64) -> Self {
        assert!(capacity >= 0.0, "capacity must be non-negative");
        Self {
            capacity,
            lots: VecDeque::new(),
        }
    }

    /// Rebuild a buffer from its lots (checkpoint restore)
    pub fn from_lots(capacity: f64, lots: Vec<Resource>) -> Result<Self, BufferError> {
        let mut buf = Self::with_capacity(capacity);
        buf.push_all(lots)?;
        Ok(buf)
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Total quantity of all owned lots
    pub fn quantity(&self) -> f64 {
        self.lots.iter().map(Resource::quantity).sum()
    }

    /// Remaining room before capacity is reached (never negative)
    pub fn space(&self) -> f64 {
        (self.capacity - self.quantity()).max(0.0)
    }

    /// Number of lots held
    pub fn count(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Every lot, oldest first
    pub fn lots(&self) -> impl Iterator<Item = &Resource> {
        self.lots.iter()
    }

    /// Oldest lot, if any
    pub fn peek(&self) -> Option<&Resource> {
        self.lots.front()
    }

    /// Add a lot at the back
    ///
    /// Lots at or below `EPS` carry no material and are dropped rather than stored.
    pub fn push(&mut self, lot: Resource) -> Result<(), BufferError> {
        if lot.quantity() <= EPS {
            return Ok(());
        }
        let space = self.space();
        if lot.quantity() > space + EPS {
            return Err(BufferError::CapacityExceeded {
                requested: lot.quantity(),
                space,
            });
        }
        self.lots.push_back(lot);
        Ok(())
    }

    /// Add several lots; either all fit or none are pushed
    pub fn push_all(&mut self, lots: Vec<Resource>) -> Result<(), BufferError> {
        let incoming: f64 = lots.iter().map(Resource::quantity).sum();
        let space = self.space();
        if incoming > space + EPS {
            return Err(BufferError::CapacityExceeded {
                requested: incoming,
                space,
            });
        }
        self.lots
            .extend(lots.into_iter().filter(|lot| lot.quantity() > EPS));
        Ok(())
    }

    /// Remove exactly `qty`, oldest lots first
    ///
    /// The front lot is split when only part of it is needed; the remainder
    /// stays at the front. Lots drained together are combined into the single
    /// returned resource. A pop that exactly matches the front lot returns
    /// that lot unchanged.
    pub fn pop(&mut self, qty: f64) -> Result<Resource, BufferError> {
        let available = self.quantity();
        if qty > available + EPS {
            return Err(BufferError::InsufficientQuantity {
                requested: qty,
                available,
            });
        }

        let mut remaining = qty;
        let mut taken = Vec::new();
        while remaining > EPS {
            let Some(front) = self.lots.pop_front() else {
                break;
            };
            if front.quantity() <= remaining + EPS {
                remaining -= front.quantity();
                taken.push(front);
            } else {
                let (part, rest) = front.split(remaining);
                self.lots.push_front(rest);
                taken.push(part);
                remaining = 0.0;
            }
        }

        match Resource::combine(taken) {
            Some(resource) => Ok(resource),
            None => {
                let composition = self
                    .peek()
                    .map(|lot| lot.composition().clone())
                    .unwrap_or_else(crate::models::Composition::blank);
                Ok(Resource::new(0.0, composition))
            }
        }
    }

    /// Remove whole lots from the front while their running total stays within `cap`
    ///
    /// Never splits a lot; stops at the first lot that would overshoot.
    pub fn pop_whole_lots(&mut self, cap: f64) -> Vec<Resource> {
        let mut total = 0.0;
        let mut count = 0;
        for lot in &self.lots {
            if total + lot.quantity() > cap + EPS {
                break;
            }
            total += lot.quantity();
            count += 1;
        }
        self.lots.drain(..count).collect()
    }

    /// Remove every lot
    pub fn pop_all(&mut self) -> Vec<Resource> {
        self.lots.drain(..).collect()
    }
}
