//! Residence-Staged Buffer
//!
//! Implements minimum-holding-time staging across four quantity buffers:
//!
//! ```text
//! inbound ──admit──▶ processing ──promote──▶ ready ──draw──▶ stocks ──▶ trades
//!                         │
//!                    entry log: (admitted_at, quantity), oldest first
//! ```
//!
//! # Critical Invariants
//!
//! - **Entry log**: `sum(entry log quantities) == processing.quantity()` (within `EPS`)
//! - **Residence**: `promote(t)` releases an entry iff `t - admitted_at >= residence_time`,
//!   in admission order, exactly once
//! - **Total inventory**: inbound + processing + ready + stocks never exceeds `max_inv_size`
//!
//! # Ordering
//!
//! Within one timestep the caller must admit, then promote, then draw. Material
//! admitted at `t` is only promoted at `t` when `residence_time == 0`.

use crate::buffer::res_buf::{BufferError, ResBuf};
use crate::core::EPS;
use crate::models::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One admission to processing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Timestep the lot was admitted
    pub tick: usize,
    /// Quantity admitted
    pub quantity: f64,
}

/// Staging pipeline enforcing a minimum residence time
///
/// # Example
/// ```
/// use facility_sim_core::buffer::ResidenceBuffer;
/// use facility_sim_core::models::Resource;
///
/// let mut staged = ResidenceBuffer::new(2, f64::MAX, false);
/// staged.admit(Resource::blank(10.0), 0).unwrap();
///
/// assert!(staged.promote(0).unwrap().is_empty());
/// assert!(staged.promote(1).unwrap().is_empty());
/// assert_eq!(staged.promote(2).unwrap().len(), 1);
/// assert_eq!(staged.ready().quantity(), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ResidenceBuffer {
    /// Minimum timesteps between admission and promotion
    residence_time: usize,

    /// Cap on the combined quantity of all four stages
    max_inv_size: f64,

    /// Draw whole lots only (never split or combine during staging)
    discrete_handling: bool,

    /// Received material not yet admitted
    inventory: ResBuf,

    /// Material waiting out its residence time
    processing: ResBuf,

    /// Material eligible for sale
    ready: ResBuf,

    /// Material drawn for offering this timestep
    stocks: ResBuf,

    /// Admission records, oldest first
    entry_log: VecDeque<EntryRecord>,
}

impl ResidenceBuffer {
    /// Create an empty staging pipeline
    pub fn new(residence_time: usize, max_inv_size: f64, discrete_handling: bool) -> Self {
        Self {
            residence_time,
            max_inv_size,
            discrete_handling,
            inventory: ResBuf::new(),
            processing: ResBuf::new(),
            ready: ResBuf::new(),
            stocks: ResBuf::new(),
            entry_log: VecDeque::new(),
        }
    }

    /// Rebuild a pipeline from its parts (checkpoint restore)
    ///
    /// Returns `None` when the entry log disagrees with the processing buffer
    /// or is out of admission order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        residence_time: usize,
        max_inv_size: f64,
        discrete_handling: bool,
        inventory: ResBuf,
        processing: ResBuf,
        ready: ResBuf,
        stocks: ResBuf,
        entry_log: Vec<EntryRecord>,
    ) -> Option<Self> {
        let staged = Self {
            residence_time,
            max_inv_size,
            discrete_handling,
            inventory,
            processing,
            ready,
            stocks,
            entry_log: entry_log.into(),
        };
        let admission_ordered = staged
            .entry_log
            .iter()
            .zip(staged.entry_log.iter().skip(1))
            .all(|(earlier, later)| earlier.tick <= later.tick);
        if admission_ordered && staged.entry_log_consistent() {
            Some(staged)
        } else {
            None
        }
    }

    pub fn residence_time(&self) -> usize {
        self.residence_time
    }

    pub fn max_inv_size(&self) -> f64 {
        self.max_inv_size
    }

    pub fn discrete_handling(&self) -> bool {
        self.discrete_handling
    }

    pub fn inventory(&self) -> &ResBuf {
        &self.inventory
    }

    pub fn processing(&self) -> &ResBuf {
        &self.processing
    }

    pub fn ready(&self) -> &ResBuf {
        &self.ready
    }

    pub fn stocks(&self) -> &ResBuf {
        &self.stocks
    }

    /// Stocks are the only stage trades draw from
    pub fn stocks_mut(&mut self) -> &mut ResBuf {
        &mut self.stocks
    }

    /// Admission records, oldest first
    pub fn entry_log(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entry_log.iter()
    }

    /// Combined quantity across every stage
    pub fn total_quantity(&self) -> f64 {
        self.inventory.quantity()
            + self.processing.quantity()
            + self.ready.quantity()
            + self.stocks.quantity()
    }

    /// Room left under the total inventory cap
    pub fn space(&self) -> f64 {
        (self.max_inv_size - self.total_quantity()).max(0.0)
    }

    /// Whether the entry log still accounts for exactly the processing contents
    pub fn entry_log_consistent(&self) -> bool {
        let logged: f64 = self.entry_log.iter().map(|e| e.quantity).sum();
        (logged - self.processing.quantity()).abs() <= EPS * (1 + self.entry_log.len()) as f64
    }

    fn check_total_cap(&self, incoming: f64) -> Result<(), BufferError> {
        let space = self.space();
        if incoming > space + EPS {
            return Err(BufferError::CapacityExceeded {
                requested: incoming,
                space,
            });
        }
        Ok(())
    }

    /// Accept received material into the inbound stage
    pub fn receive(&mut self, resource: Resource) -> Result<(), BufferError> {
        self.check_total_cap(resource.quantity())?;
        self.inventory.push(resource)
    }

    /// Accept a batch of received lots, all or none
    pub fn receive_all(&mut self, lots: Vec<Resource>) -> Result<(), BufferError> {
        let incoming: f64 = lots.iter().map(Resource::quantity).sum();
        self.check_total_cap(incoming)?;
        self.inventory.push_all(lots)
    }

    /// Push a lot straight into processing and log its admission time
    pub fn admit(&mut self, resource: Resource, tick: usize) -> Result<(), BufferError> {
        let quantity = resource.quantity();
        if quantity <= EPS {
            return Ok(());
        }
        self.check_total_cap(quantity)?;
        self.processing.push(resource)?;
        self.entry_log.push_back(EntryRecord { tick, quantity });
        Ok(())
    }

    /// Admit every inbound lot at `tick`, returning the admitted records
    pub fn begin_processing(&mut self, tick: usize) -> Result<Vec<EntryRecord>, BufferError> {
        let mut admitted = Vec::new();
        for lot in self.inventory.pop_all() {
            let quantity = lot.quantity();
            self.admit(lot, tick)?;
            admitted.push(EntryRecord { tick, quantity });
        }
        Ok(admitted)
    }

    /// Move every entry that has waited out its residence time into ready
    ///
    /// Returns the released records in admission order.
    pub fn promote(&mut self, tick: usize) -> Result<Vec<EntryRecord>, BufferError> {
        let mut released = Vec::new();
        while let Some(entry) = self.entry_log.front().copied() {
            if tick < entry.tick || tick - entry.tick < self.residence_time {
                break;
            }
            let lot = self.processing.pop(entry.quantity)?;
            self.ready.push(lot)?;
            self.entry_log.pop_front();
            released.push(entry);
        }
        Ok(released)
    }

    /// Move up to `cap` of ready material into stocks
    ///
    /// With discrete handling only whole lots move, so less than `cap` may be
    /// drawn even when ready holds more. Returns the quantity moved.
    pub fn draw_ready(&mut self, cap: f64) -> Result<f64, BufferError> {
        if cap <= EPS || self.ready.is_empty() {
            return Ok(0.0);
        }

        if self.discrete_handling {
            let lots = self.ready.pop_whole_lots(cap);
            let moved: f64 = lots.iter().map(Resource::quantity).sum();
            self.stocks.push_all(lots)?;
            Ok(moved)
        } else {
            let amount = cap.min(self.ready.quantity());
            if amount <= EPS {
                return Ok(0.0);
            }
            let lot = self.ready.pop(amount)?;
            let moved = lot.quantity();
            self.stocks.push(lot)?;
            Ok(moved)
        }
    }
}
