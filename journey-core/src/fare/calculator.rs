//! Minimum-cost ticket selection.

use super::ticket::TransitTicket;
use super::trip::TripDescription;
use crate::domain::Money;
use std::collections::HashMap;
use tracing::debug;

/// The priced result of a trip.
///
/// When no ticket combination covers every stage, the price is the
/// sentinel `-1.00` — distinguishable from a genuine zero-cost fare —
/// and [`covers_whole_trip`](Self::covers_whole_trip) is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitFare {
    pub price: Money,
    /// Ids of the selected tickets, in activation order.
    pub ticket_ids: Vec<u32>,
}

impl TransitFare {
    /// The sentinel price reported when no ticket combination covers the
    /// trip.
    pub const NO_FARE_PRICE: Money = Money::from_major(-1);

    pub fn no_fare_available() -> Self {
        TransitFare {
            price: Self::NO_FARE_PRICE,
            ticket_ids: Vec::new(),
        }
    }

    pub fn free() -> Self {
        TransitFare {
            price: Money::ZERO,
            ticket_ids: Vec::new(),
        }
    }

    pub fn covers_whole_trip(&self) -> bool {
        !self.price.is_negative()
    }
}

/// Selects the cheapest combination of tickets that covers a trip.
///
/// Coverage is reckoned in *travel minutes*: every minute the rider is on
/// board a transit vehicle must fall inside some selected ticket's
/// coverage. A candidate ticket is activated at the first uncovered travel
/// minute; its coverage then extends to its time limit, to the end of the
/// fares its fare-count limit admits, or — with neither limit — to the end
/// of the trip. A ticket may only be used if its agency and pattern
/// constraints hold for every stage inside the covered window.
///
/// Ties between equal-price combinations are broken deterministically:
/// fewest tickets first, then the lexicographically smallest ticket-id
/// sequence.
#[derive(Debug, Default)]
pub struct TransitPriceCalculator {
    tickets: Vec<TransitTicket>,
}

/// A partial covering: its total price and the tickets used.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Covering {
    price: Money,
    ticket_ids: Vec<u32>,
}

impl Covering {
    fn empty() -> Self {
        Covering {
            price: Money::ZERO,
            ticket_ids: Vec::new(),
        }
    }

    /// Tie-break ordering: price, then ticket count, then id sequence.
    fn better_than(&self, other: &Covering) -> bool {
        (self.price, self.ticket_ids.len(), &self.ticket_ids)
            < (other.price, other.ticket_ids.len(), &other.ticket_ids)
    }
}

impl TransitPriceCalculator {
    pub fn new(tickets: Vec<TransitTicket>) -> Self {
        TransitPriceCalculator { tickets }
    }

    pub fn tickets(&self) -> &[TransitTicket] {
        &self.tickets
    }

    pub fn add_ticket(&mut self, ticket: TransitTicket) {
        self.tickets.push(ticket);
    }

    /// Price a trip. An empty trip (no transit ridden) is free; a trip no
    /// ticket combination covers yields [`TransitFare::no_fare_available`].
    pub fn compute_price(&self, trip: &TripDescription) -> TransitFare {
        if trip.is_empty() {
            return TransitFare::free();
        }
        let mut memo = HashMap::new();
        match self.cover_from(trip, 1, &mut memo) {
            Some(covering) => TransitFare {
                price: covering.price,
                ticket_ids: covering.ticket_ids,
            },
            None => {
                debug!(
                    stages = trip.stages().len(),
                    "no ticket combination covers the trip"
                );
                TransitFare::no_fare_available()
            }
        }
    }

    /// Cheapest covering of all travel minutes at or after `minute`.
    fn cover_from(
        &self,
        trip: &TripDescription,
        minute: u32,
        memo: &mut HashMap<u32, Option<Covering>>,
    ) -> Option<Covering> {
        // Nothing left on board to cover.
        let Some(start) = trip.next_travel_minute(minute) else {
            return Some(Covering::empty());
        };
        if let Some(cached) = memo.get(&start) {
            return cached.clone();
        }

        let mut best: Option<Covering> = None;
        for ticket in &self.tickets {
            let Some(covered_until) = self.coverage_end(trip, ticket, start) else {
                continue;
            };
            if !trip
                .stages_in_window(start, covered_until)
                .all(|stage| ticket.is_valid_for_stage(stage))
            {
                continue;
            }
            let Some(rest) = (match covered_until.checked_add(1) {
                Some(next) => self.cover_from(trip, next, memo),
                None => Some(Covering::empty()),
            }) else {
                continue;
            };
            let mut ticket_ids = Vec::with_capacity(rest.ticket_ids.len() + 1);
            ticket_ids.push(ticket.id());
            ticket_ids.extend(rest.ticket_ids);
            let candidate = Covering {
                price: ticket.price() + rest.price,
                ticket_ids,
            };
            if best.as_ref().is_none_or(|b| candidate.better_than(b)) {
                best = Some(candidate);
            }
        }

        memo.insert(start, best.clone());
        best
    }

    /// The last minute `ticket` covers when activated at `start`, or
    /// `None` if its limits cannot apply here.
    fn coverage_end(&self, trip: &TripDescription, ticket: &TransitTicket, start: u32) -> Option<u32> {
        let by_time = ticket.max_minutes().map(|limit| start + limit - 1);
        let by_fares = match ticket.max_fares() {
            Some(count) => {
                let first = trip.fare_containing(start)?;
                let last = (first + count as usize - 1).min(trip.fares().len() - 1);
                Some(trip.fares()[last].end_minute)
            }
            None => None,
        };
        let end = match (by_time, by_fares) {
            (Some(t), Some(f)) => t.min(f),
            (Some(t), None) => t,
            (None, Some(f)) => f,
            // No limits: the ticket covers the rest of the trip.
            (None, None) => u32::MAX,
        };
        // A ticket must cover at least its activation minute; a
        // zero-length window would make no progress.
        (end >= start).then_some(end)
    }
}
