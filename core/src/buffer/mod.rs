//! Material buffers
//!
//! - **res_buf**: the capacity-bounded Quantity Buffer every stage is built from
//! - **staged**: the Residence-Staged Buffer (inbound, processing, ready, stocks)

pub mod res_buf;
pub mod staged;

pub use res_buf::{BufferError, ResBuf};
pub use staged::{EntryRecord, ResidenceBuffer};
