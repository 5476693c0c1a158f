//! The transit fare engine.
//!
//! Given the stage sequence a finished path passes through, selects the
//! minimum-cost combination of tickets under pattern-matching eligibility
//! rules. Stage sequences are produced from a state chain by
//! [`transit_stages`]; tickets come from the graph's available-ticket set.

pub mod pattern;

mod calculator;
mod ticket;
mod trip;

pub use calculator::{TransitFare, TransitPriceCalculator};
pub use pattern::{RouteAttribute, RoutePattern, StopAttribute, StopPattern, TextOperator};
pub use ticket::{AgencyPatterns, TransitTicket, TransitTicketBuilder};
pub use trip::{FareSpan, TripDescription, TripError, TripStage, transit_stages};
