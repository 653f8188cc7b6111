//! Time management for the simulation
//!
//! The simulation advances in discrete, monotonically increasing timesteps.
//! Facilities never own the clock; the driving kernel reads `current_tick()`
//! and passes it into every phase callback.

use serde::{Deserialize, Serialize};

/// Manages simulation time in discrete timesteps
///
/// # Example
/// ```
/// use facility_sim_core::TimeManager;
///
/// let mut time = TimeManager::new();
/// assert_eq!(time.current_tick(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeManager {
    /// Timesteps elapsed since simulation start
    current_tick: usize,
}

impl TimeManager {
    /// Create a clock positioned at timestep 0
    pub fn new() -> Self {
        Self { current_tick: 0 }
    }

    /// Create a clock positioned at an arbitrary timestep (checkpoint restore)
    ///
    /// # Example
    /// ```
    /// use facility_sim_core::TimeManager;
    ///
    /// let time = TimeManager::starting_at(42);
    /// assert_eq!(time.current_tick(), 42);
    /// ```
    pub fn starting_at(tick: usize) -> Self {
        Self { current_tick: tick }
    }

    /// Advance time by one timestep
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current timestep
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }
}
