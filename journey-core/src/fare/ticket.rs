//! Transit tickets.

use super::pattern::{RoutePattern, StopPattern};
use super::trip::TripStage;
use crate::domain::Money;
use std::collections::BTreeMap;

/// Eligibility patterns of one ticket for one agency.
#[derive(Debug, Clone, Default)]
pub struct AgencyPatterns {
    pub route_pattern: RoutePattern,
    pub stop_pattern: StopPattern,
}

/// A purchasable ticket.
///
/// A ticket is valid on a whitelisted set of agencies and, per agency,
/// under a conjunction of route/stop pattern constraints. Its coverage is
/// bounded by a time limit in minutes, a fare count limit, or — with
/// neither — the whole remaining trip.
///
/// # Examples
///
/// ```
/// use journey_core::domain::Money;
/// use journey_core::fare::TransitTicket;
///
/// let mut ticket = TransitTicket::builder(0, "75-minute", Money::from_cents(440))
///     .time_limit(75)
///     .build();
/// ticket.add_allowed_agency("ZTM");
/// assert_eq!(ticket.max_minutes(), Some(75));
/// ```
#[derive(Debug, Clone)]
pub struct TransitTicket {
    id: u32,
    name: String,
    price: Money,
    max_minutes: Option<u32>,
    max_fares: Option<u32>,
    agencies: BTreeMap<String, AgencyPatterns>,
}

impl TransitTicket {
    pub fn builder(id: u32, name: impl Into<String>, price: Money) -> TransitTicketBuilder {
        TransitTicketBuilder {
            id,
            name: name.into(),
            price,
            max_minutes: None,
            max_fares: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn max_minutes(&self) -> Option<u32> {
        self.max_minutes
    }

    pub fn max_fares(&self) -> Option<u32> {
        self.max_fares
    }

    /// Allow this ticket on an agency's services (with no pattern
    /// constraints yet).
    pub fn add_allowed_agency(&mut self, agency_id: impl Into<String>) {
        self.agencies.entry(agency_id.into()).or_default();
    }

    /// The route pattern for an allowed agency, for adding constraints.
    /// Adds the agency if it was not allowed yet.
    pub fn route_pattern_mut(&mut self, agency_id: impl Into<String>) -> &mut RoutePattern {
        &mut self
            .agencies
            .entry(agency_id.into())
            .or_default()
            .route_pattern
    }

    /// The stop pattern for an allowed agency, for adding constraints.
    /// Adds the agency if it was not allowed yet.
    pub fn stop_pattern_mut(&mut self, agency_id: impl Into<String>) -> &mut StopPattern {
        &mut self
            .agencies
            .entry(agency_id.into())
            .or_default()
            .stop_pattern
    }

    /// Whether this ticket is valid for one trip stage: the stage's agency
    /// must be allowed and the agency's patterns must accept the stage's
    /// route and stop.
    pub fn is_valid_for_stage(&self, stage: &TripStage) -> bool {
        match self.agencies.get(&stage.route.agency_id) {
            Some(patterns) => {
                patterns.route_pattern.matches(&stage.route)
                    && patterns.stop_pattern.matches(&stage.stop)
            }
            None => false,
        }
    }
}

/// Builder for [`TransitTicket`].
pub struct TransitTicketBuilder {
    id: u32,
    name: String,
    price: Money,
    max_minutes: Option<u32>,
    max_fares: Option<u32>,
}

impl TransitTicketBuilder {
    /// Limit the ticket's validity to `minutes` from activation.
    pub fn time_limit(mut self, minutes: u32) -> Self {
        self.max_minutes = Some(minutes);
        self
    }

    /// Limit the ticket to a number of fares (continuous boardings).
    pub fn fares_limit(mut self, fares: u32) -> Self {
        self.max_fares = Some(fares);
        self
    }

    pub fn build(self) -> TransitTicket {
        TransitTicket {
            id: self.id,
            name: self.name,
            price: self.price,
            max_minutes: self.max_minutes,
            max_fares: self.max_fares,
            agencies: BTreeMap::new(),
        }
    }
}
