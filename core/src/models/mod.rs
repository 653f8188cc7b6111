//! Domain models for the facility simulator

pub mod event;
pub mod packaging;
pub mod resource;

// Re-exports
pub use event::{Event, EventLog};
pub use packaging::{
    FillStrategy, Package, Packager, PackagingError, ShippingLimit, ShippingStrategy,
    TransportUnit, UNRESTRICTED,
};
pub use resource::{Composition, Packaged, Resource, UNPACKAGED};
