//! The slowly-changing attribute block of a search state.

use crate::domain::{FeedScopedId, Stop, TraverseMode, VehicleDescription};
use crate::graph::{ServiceDay, TripPattern};
use crate::search::RoutingConfig;
use std::sync::Arc;

/// The trip a state is currently riding.
#[derive(Debug, Clone)]
pub struct ActiveTrip {
    pub pattern: Arc<TripPattern>,
    pub trip_index: usize,
}

/// State attributes that change at only a few traversals (boardings,
/// rentals, parking), kept apart from [`State`](crate::search::State) so
/// long unbranching chains can share one allocation.
///
/// A state holds this block behind an `Arc`; the editor clones it the
/// first time a traversal actually changes a field (copy-on-write), so
/// ancestors never observe a descendant's changes.
#[derive(Debug, Clone)]
pub struct StateData {
    pub config: Arc<RoutingConfig>,
    /// Epoch seconds the search nominally started at.
    pub start_time: i64,
    /// Wait before the very first boarding, recorded so it can be clamped
    /// out of active-time comparisons.
    pub initial_wait_time: i64,
    /// The non-transit mode the rider is currently in (walking, on their
    /// bike, in the rented car, …).
    pub current_mode: TraverseMode,
    /// Mode of the traversal that produced this state.
    pub back_mode: Option<TraverseMode>,
    /// Boardings so far; vehicle rentals count as boardings for the
    /// transfer limit.
    pub num_boardings: u32,
    /// Whether this path has ever boarded (or, in a reverse search,
    /// alighted from) a transit vehicle.
    pub ever_boarded: bool,
    pub car_parked: bool,
    pub bike_parked: bool,
    /// The rented vehicle presently in use, if any.
    pub current_vehicle: Option<Arc<VehicleDescription>>,
    /// The trip currently ridden; `None` off board.
    pub trip: Option<ActiveTrip>,
    /// Route of the current or most recent transit leg.
    pub route: Option<FeedScopedId>,
    /// Every route boarded along this path, in order.
    pub route_sequence: Vec<FeedScopedId>,
    /// Fare zone of the last alighted stop.
    pub zone: Option<String>,
    pub service_day: Option<ServiceDay>,
    pub previous_stop: Option<Arc<Stop>>,
    pub last_alighted_time: i64,
    pub last_pattern: Option<Arc<TripPattern>>,
    /// Total traverse distance at the last alighting, for
    /// walk-since-last-transit accounting.
    pub last_transit_walk: f64,
    /// Gap between the used trip's arrival and the following trip's, set
    /// at alighting; -1 when no following trip ran.
    pub last_next_arrival_delta: i64,
}

impl StateData {
    /// Fresh data for a root state.
    ///
    /// Park-and-ride searches start "unparked" in the driving mode (or,
    /// for arrive-by searches which run backward, already parked and
    /// walking).
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        let mut current_mode = TraverseMode::Walk;
        let mut car_parked = false;
        let mut bike_parked = false;
        if config.park_and_ride {
            car_parked = config.arrive_by;
            current_mode = if car_parked {
                TraverseMode::Walk
            } else {
                TraverseMode::Car
            };
        } else if config.bike_park_and_ride {
            bike_parked = config.arrive_by;
            current_mode = if bike_parked {
                TraverseMode::Walk
            } else {
                TraverseMode::Bicycle
            };
        }
        let start_time = config.time_seconds();
        StateData {
            config,
            start_time,
            initial_wait_time: 0,
            current_mode,
            back_mode: None,
            num_boardings: 0,
            ever_boarded: false,
            car_parked,
            bike_parked,
            current_vehicle: None,
            trip: None,
            route: None,
            route_sequence: Vec::new(),
            zone: None,
            service_day: None,
            previous_stop: None,
            last_alighted_time: 0,
            last_pattern: None,
            last_transit_walk: 0.0,
            last_next_arrival_delta: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_search_starts_walking() {
        let data = StateData::new(Arc::new(RoutingConfig::default()));
        assert_eq!(data.current_mode, TraverseMode::Walk);
        assert!(!data.car_parked);
        assert_eq!(data.num_boardings, 0);
    }

    #[test]
    fn park_and_ride_starts_driving_forward() {
        let config = RoutingConfig {
            park_and_ride: true,
            ..RoutingConfig::default()
        };
        let data = StateData::new(Arc::new(config));
        assert_eq!(data.current_mode, TraverseMode::Car);
        assert!(!data.car_parked);
    }

    #[test]
    fn park_and_ride_starts_parked_in_arrive_by() {
        let config = RoutingConfig {
            park_and_ride: true,
            arrive_by: true,
            ..RoutingConfig::default()
        };
        let data = StateData::new(Arc::new(config));
        assert_eq!(data.current_mode, TraverseMode::Walk);
        assert!(data.car_parked);
    }
}
