//! Transit timetables.
//!
//! A [`TripPattern`] is the unit the search rides on: one ordered stop
//! sequence served by a set of trips, all on the same route. Trip times are
//! stored relative to a [`ServiceDay`] so one pattern can be reused across
//! days.

use crate::domain::{FeedScopedId, Route, Stop};
use std::sync::Arc;

/// The day a trip's relative times are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDay {
    /// Epoch seconds of the service day's start (local midnight, resolved
    /// by the graph builder).
    pub start_epoch_seconds: i64,
}

impl ServiceDay {
    pub fn new(start_epoch_seconds: i64) -> Self {
        ServiceDay { start_epoch_seconds }
    }

    /// Absolute time of a time-of-day offset on this service day.
    pub fn resolve(&self, seconds_since_midnight: i64) -> i64 {
        self.start_epoch_seconds + seconds_since_midnight
    }
}

/// Stop times of a single trip along its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripTimes {
    pub trip_id: FeedScopedId,
    /// Departure time at each stop, seconds since the service day start.
    pub departures: Vec<i64>,
    /// Arrival time at each stop, seconds since the service day start.
    pub arrivals: Vec<i64>,
}

/// Errors raised while assembling a timetable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TimetableError {
    #[error("trip {trip} has {got} stop times but the pattern has {expected} stops")]
    StopCountMismatch {
        trip: FeedScopedId,
        expected: usize,
        got: usize,
    },

    #[error("trip {trip} has arrival before departure at stop {stop_index}")]
    NonMonotoneTrip {
        trip: FeedScopedId,
        stop_index: usize,
    },

    #[error("pattern needs one hop distance per stop pair: {stops} stops, {hops} hops")]
    HopCountMismatch { stops: usize, hops: usize },
}

/// An ordered stop sequence on one route, served by one or more trips.
#[derive(Debug, Clone)]
pub struct TripPattern {
    pub route: Arc<Route>,
    pub stops: Vec<Arc<Stop>>,
    pub trips: Vec<TripTimes>,
    /// Distance in meters between consecutive stops; `hop_distances_m[i]`
    /// is the hop leaving stop `i`.
    pub hop_distances_m: Vec<f64>,
}

impl TripPattern {
    /// Assemble a pattern, validating that every trip covers every stop
    /// and that times run forward along each trip.
    pub fn new(
        route: Arc<Route>,
        stops: Vec<Arc<Stop>>,
        trips: Vec<TripTimes>,
        hop_distances_m: Vec<f64>,
    ) -> Result<Self, TimetableError> {
        if hop_distances_m.len() + 1 != stops.len() {
            return Err(TimetableError::HopCountMismatch {
                stops: stops.len(),
                hops: hop_distances_m.len(),
            });
        }
        for trip in &trips {
            if trip.departures.len() != stops.len() || trip.arrivals.len() != stops.len() {
                return Err(TimetableError::StopCountMismatch {
                    trip: trip.trip_id.clone(),
                    expected: stops.len(),
                    got: trip.departures.len().min(trip.arrivals.len()),
                });
            }
            let mut previous = i64::MIN;
            for (index, (&arrival, &departure)) in
                trip.arrivals.iter().zip(&trip.departures).enumerate()
            {
                if arrival < previous || departure < arrival {
                    return Err(TimetableError::NonMonotoneTrip {
                        trip: trip.trip_id.clone(),
                        stop_index: index,
                    });
                }
                previous = departure;
            }
        }
        Ok(TripPattern {
            route,
            stops,
            trips,
            hop_distances_m,
        })
    }

    /// The earliest trip departing `stop_index` at or after `earliest`,
    /// as `(trip_index, absolute departure)`.
    pub fn next_departure(
        &self,
        stop_index: usize,
        earliest: i64,
        day: ServiceDay,
    ) -> Option<(usize, i64)> {
        self.trips
            .iter()
            .enumerate()
            .filter_map(|(index, trip)| {
                let departure = day.resolve(trip.departures[stop_index]);
                (departure >= earliest).then_some((index, departure))
            })
            .min_by_key(|&(_, departure)| departure)
    }

    /// The latest trip arriving at `stop_index` at or before `latest`,
    /// as `(trip_index, absolute arrival)`.
    pub fn previous_arrival(
        &self,
        stop_index: usize,
        latest: i64,
        day: ServiceDay,
    ) -> Option<(usize, i64)> {
        self.trips
            .iter()
            .enumerate()
            .filter_map(|(index, trip)| {
                let arrival = day.resolve(trip.arrivals[stop_index]);
                (arrival <= latest).then_some((index, arrival))
            })
            .max_by_key(|&(_, arrival)| arrival)
    }

    /// Absolute arrival at `stop_index` of the first trip arriving strictly
    /// after `trip_index`'s arrival there. `None` when no later trip runs.
    pub fn next_arrival_after(
        &self,
        stop_index: usize,
        trip_index: usize,
        day: ServiceDay,
    ) -> Option<i64> {
        let reference = day.resolve(self.trips[trip_index].arrivals[stop_index]);
        self.trips
            .iter()
            .map(|trip| day.resolve(trip.arrivals[stop_index]))
            .filter(|&arrival| arrival > reference)
            .min()
    }
}
