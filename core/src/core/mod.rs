//! Core simulation primitives: time and numeric tolerance

pub mod time;

/// Tolerance used for every capacity and zero comparison on material quantities.
///
/// Quantities within `EPS` of a bound are treated as being on the bound, which
/// suppresses floating-point chatter when buffers are nearly empty or full.
pub const EPS: f64 = 1e-6;
