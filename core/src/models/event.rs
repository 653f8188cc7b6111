//! Event logging for facility activity and telemetry.
//!
//! Every facility records the significant things it does during a timestep
//! into its own [`EventLog`]. Events enable:
//! - Debugging (what moved where, and when)
//! - Auditing (material conservation across buffers)
//! - Analysis (per-commodity demand and supply time series)
//!
//! # Event Types
//!
//! - **Position**: geographic tag recorded on entry into the simulation
//! - **Market**: requests issued, bids offered, shipments sent and received
//! - **Staging**: admissions to processing, promotions to ready, draws to stocks
//! - **Cost**: cost-basis recomputation
//! - **Telemetry**: `Demand` and `Supply` values keyed by commodity
//!
//! # Example
//!
//! ```rust
//! use facility_sim_core::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Demand {
//!     tick: 3,
//!     agent_id: "store_1".to_string(),
//!     commodity: "spent_fuel".to_string(),
//!     value: 25.0,
//! });
//!
//! assert_eq!(log.telemetry("Demand", "spent_fuel"), vec![(3, 25.0)]);
//! ```

use serde::{Deserialize, Serialize};

/// Facility event capturing a state change or a telemetry sample.
///
/// All events include a tick number for temporal ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Facility position recorded when it entered the simulation
    PositionRecorded {
        tick: usize,
        agent_id: String,
        latitude: f64,
        longitude: f64,
    },

    /// A request was placed on an input commodity
    RequestIssued {
        tick: usize,
        agent_id: String,
        commodity: String,
        quantity: f64,
        preference: f64,
    },

    /// An offer was made against a request
    BidOffered {
        tick: usize,
        agent_id: String,
        commodity: String,
        quantity: f64,
        preference: f64,
    },

    /// Material left the facility in response to a trade
    Shipped {
        tick: usize,
        agent_id: String,
        commodity: String,
        quantity: f64,
    },

    /// Material arrived at the facility from an accepted trade
    Received {
        tick: usize,
        agent_id: String,
        commodity: String,
        quantity: f64,
    },

    /// A lot entered the processing buffer
    Admitted {
        tick: usize,
        agent_id: String,
        quantity: f64,
    },

    /// A lot finished its residence time and moved to ready
    Promoted {
        tick: usize,
        agent_id: String,
        admitted_at: usize,
        quantity: f64,
    },

    /// Ready material moved into stocks for sale
    Drawn {
        tick: usize,
        agent_id: String,
        quantity: f64,
    },

    /// The facility recomputed its average acquisition cost
    CostBasisUpdated {
        tick: usize,
        agent_id: String,
        avg_per_unit_cost: f64,
    },

    /// Quantity the facility wants of an input commodity this tick
    Demand {
        tick: usize,
        agent_id: String,
        commodity: String,
        value: f64,
    },

    /// Quantity the facility can offer of its output commodity this tock
    Supply {
        tick: usize,
        agent_id: String,
        commodity: String,
        value: f64,
    },
}

impl Event {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            Event::PositionRecorded { tick, .. } => *tick,
            Event::RequestIssued { tick, .. } => *tick,
            Event::BidOffered { tick, .. } => *tick,
            Event::Shipped { tick, .. } => *tick,
            Event::Received { tick, .. } => *tick,
            Event::Admitted { tick, .. } => *tick,
            Event::Promoted { tick, .. } => *tick,
            Event::Drawn { tick, .. } => *tick,
            Event::CostBasisUpdated { tick, .. } => *tick,
            Event::Demand { tick, .. } => *tick,
            Event::Supply { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PositionRecorded { .. } => "PositionRecorded",
            Event::RequestIssued { .. } => "RequestIssued",
            Event::BidOffered { .. } => "BidOffered",
            Event::Shipped { .. } => "Shipped",
            Event::Received { .. } => "Received",
            Event::Admitted { .. } => "Admitted",
            Event::Promoted { .. } => "Promoted",
            Event::Drawn { .. } => "Drawn",
            Event::CostBasisUpdated { .. } => "CostBasisUpdated",
            Event::Demand { .. } => "Demand",
            Event::Supply { .. } => "Supply",
        }
    }

    /// Get the facility that produced the event
    pub fn agent_id(&self) -> &str {
        match self {
            Event::PositionRecorded { agent_id, .. }
            | Event::RequestIssued { agent_id, .. }
            | Event::BidOffered { agent_id, .. }
            | Event::Shipped { agent_id, .. }
            | Event::Received { agent_id, .. }
            | Event::Admitted { agent_id, .. }
            | Event::Promoted { agent_id, .. }
            | Event::Drawn { agent_id, .. }
            | Event::CostBasisUpdated { agent_id, .. }
            | Event::Demand { agent_id, .. }
            | Event::Supply { agent_id, .. } => agent_id,
        }
    }

    /// Get the commodity if the event relates to one
    pub fn commodity(&self) -> Option<&str> {
        match self {
            Event::RequestIssued { commodity, .. }
            | Event::BidOffered { commodity, .. }
            | Event::Shipped { commodity, .. }
            | Event::Received { commodity, .. }
            | Event::Demand { commodity, .. }
            | Event::Supply { commodity, .. } => Some(commodity),
            _ => None,
        }
    }
}

/// Event log for storing and querying facility events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Time series of a telemetry kind (`"Demand"` or `"Supply"`) for one commodity
    pub fn telemetry(&self, kind: &str, commodity: &str) -> Vec<(usize, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Demand {
                    tick,
                    commodity: c,
                    value,
                    ..
                } if kind == "Demand" && c == commodity => Some((*tick, *value)),
                Event::Supply {
                    tick,
                    commodity: c,
                    value,
                    ..
                } if kind == "Supply" && c == commodity => Some((*tick, *value)),
                _ => None,
            })
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
