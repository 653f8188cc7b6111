//! Checkpoint - Save/Load Facility State
//!
//! Snapshots enumerate every lot of every buffer, every entry-log record and
//! the cost basis, so an external persistence layer can store and restore a
//! facility across a save/restore boundary.
//!
//! # Critical Invariants
//!
//! - **Config Matching**: a snapshot only restores into a facility with the same config hash
//! - **Entry Log Integrity**: restored entry logs must account for exactly the processing contents
//! - **Capacity**: restored buffers must respect their capacities

use crate::buffer::{BufferError, EntryRecord, ResBuf};
use crate::facility::CostBasis;
use crate::models::resource::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while saving or restoring a snapshot
#[derive(Debug, Error, PartialEq)]
pub enum CheckpointError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config mismatch: expected {expected}, found {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("Facility mismatch: expected {expected}, found {actual}")]
    FacilityMismatch { expected: String, actual: String },

    #[error("Snapshot has no buffer named {0}")]
    MissingBuffer(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

/// Contents of one quantity buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferSnapshot {
    pub capacity: f64,
    /// Lots, oldest first
    pub lots: Vec<Resource>,
}

impl From<&ResBuf> for BufferSnapshot {
    fn from(buf: &ResBuf) -> Self {
        BufferSnapshot {
            capacity: buf.capacity(),
            lots: buf.lots().cloned().collect(),
        }
    }
}

impl BufferSnapshot {
    /// Rebuild the buffer, re-checking its capacity
    pub fn into_buffer(self) -> Result<ResBuf, CheckpointError> {
        if self.capacity.is_nan() || self.capacity < 0.0 {
            return Err(CheckpointError::InvariantViolation(format!(
                "buffer capacity must be non-negative, got {}",
                self.capacity
            )));
        }
        Ok(ResBuf::from_lots(self.capacity, self.lots)?)
    }

    pub fn quantity(&self) -> f64 {
        self.lots.iter().map(Resource::quantity).sum()
    }
}

/// Complete facility state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    pub facility_id: String,

    /// Timestep the snapshot was taken at
    pub current_tick: usize,

    /// SHA256 hash of the facility config (for validation)
    pub config_hash: String,

    /// Buffers keyed by stage name
    pub buffers: BTreeMap<String, BufferSnapshot>,

    /// Processing admissions, oldest first (empty for facilities without staging)
    pub entry_log: Vec<EntryRecord>,

    pub cost_basis: CostBasis,
}

impl FacilitySnapshot {
    pub fn new(facility_id: &str, current_tick: usize, config_hash: String) -> Self {
        Self {
            facility_id: facility_id.to_string(),
            current_tick,
            config_hash,
            buffers: BTreeMap::new(),
            entry_log: Vec::new(),
            cost_basis: CostBasis::default(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    /// Total quantity across every buffer
    pub fn total_quantity(&self) -> f64 {
        self.buffers.values().map(BufferSnapshot::quantity).sum()
    }

    /// Check the snapshot belongs to this facility and configuration
    pub fn validate_against(&self, facility_id: &str, config_hash: &str) -> Result<(), CheckpointError> {
        if self.facility_id != facility_id {
            return Err(CheckpointError::FacilityMismatch {
                expected: facility_id.to_string(),
                actual: self.facility_id.clone(),
            });
        }
        if self.config_hash != config_hash {
            return Err(CheckpointError::ConfigMismatch {
                expected: config_hash.to_string(),
                actual: self.config_hash.clone(),
            });
        }
        Ok(())
    }

    /// Remove and return a named buffer
    pub fn take_buffer(&mut self, name: &str) -> Result<BufferSnapshot, CheckpointError> {
        self.buffers
            .remove(name)
            .ok_or_else(|| CheckpointError::MissingBuffer(name.to_string()))
    }
}
