//! Domain types for the journey planning core.
//!
//! Validated vocabulary shared by the search engine, the graph model, and
//! the fare engine. Types here enforce their invariants at construction
//! time, so downstream code can trust their validity.

mod mode;
mod money;
mod pricing;
mod transit;
mod vehicle;

pub use mode::{StreetPermission, TraverseMode};
pub use money::Money;
pub use pricing::PricingPackage;
pub use transit::{FeedScopedId, Route, Stop};
pub use vehicle::{FuelType, Gearbox, Provider, VehicleDescription, VehicleType};
