//! Immutable search states and the arena that owns them.

use crate::domain::{Money, TraverseMode, VehicleDescription};
use crate::graph::{Edge, EdgeId, VertexId};
use crate::search::editor::StateEditor;
use crate::search::state_data::StateData;
use crate::search::statistics::TraversalStatistics;
use crate::search::RoutingConfig;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::warn;

/// Index of a state in its [`StateArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub u32);

/// Running sub-prices of one pricing package of the current rental.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackagePrices {
    pub start: Money,
    pub time: Money,
    pub distance: Money,
}

impl PackagePrices {
    pub fn total(&self) -> Money {
        self.start + self.time + self.distance
    }
}

/// One node of a search path: "having arrived at `vertex`, at `time`,
/// having paid `weight`, via `back_edge`."
///
/// States are immutable once committed and form a tree, each state owning
/// a parent link back toward an origin state. They live in a
/// [`StateArena`] and reference their parent by [`StateId`] rather than by
/// language reference, which makes prefix sharing explicit and keeps the
/// hot path free of reference-count traffic. All mutation happens through
/// a [`StateEditor`] before commit.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) vertex: VertexId,
    /// Absolute time at this state, epoch seconds. Runs backward along
    /// the chain in arrive-by searches.
    pub(crate) time: i64,
    /// Accumulated search cost; never decreases from parent to child.
    pub(crate) weight: f64,
    pub(crate) back_state: Option<StateId>,
    pub(crate) back_edge: Option<EdgeId>,
    pub(crate) data: Arc<StateData>,
    pub(crate) stats: TraversalStatistics,
    /// Total distance covered so far, all modes.
    pub(crate) traverse_distance_meters: f64,
    /// Time spent driving before the first boarding (park-and-ride cap).
    pub(crate) pre_transit_time: i64,
    pub(crate) distance_in_vehicle_meters: f64,
    pub(crate) time_in_vehicle_seconds: i64,
    /// Running sub-prices per pricing package of the current rental;
    /// empty when not renting.
    pub(crate) package_prices: SmallVec<[PackagePrices; 4]>,
    /// Index of the currently cheapest package.
    pub(crate) active_package: usize,
    /// Sticky: once any traversal used a not-recommended street, the whole
    /// itinerary is flagged.
    pub(crate) used_not_recommended_route: bool,
}

impl State {
    /// A parent-less state at the beginning of a search.
    pub(crate) fn new_root(vertex: VertexId, time: i64, config: Arc<RoutingConfig>) -> State {
        let mut data = StateData::new(config);
        data.start_time = time;
        State {
            vertex,
            time,
            weight: 0.0,
            back_state: None,
            back_edge: None,
            data: Arc::new(data),
            stats: TraversalStatistics::new(),
            traverse_distance_meters: 0.0,
            pre_transit_time: 0,
            distance_in_vehicle_meters: 0.0,
            time_in_vehicle_seconds: 0,
            package_prices: SmallVec::new(),
            active_package: 0,
            used_not_recommended_route: false,
        }
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Epoch seconds at this state.
    pub fn time_seconds(&self) -> i64 {
        self.time
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn back_state(&self) -> Option<StateId> {
        self.back_state
    }

    pub fn back_edge(&self) -> Option<EdgeId> {
        self.back_edge
    }

    pub fn back_mode(&self) -> Option<TraverseMode> {
        self.data.back_mode
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn stats(&self) -> &TraversalStatistics {
        &self.stats
    }

    pub fn config(&self) -> &Arc<RoutingConfig> {
        &self.data.config
    }

    /// Length of the trip so far in seconds, regardless of direction.
    pub fn elapsed_time_seconds(&self) -> i64 {
        (self.time - self.data.start_time).abs()
    }

    /// Elapsed time minus the initial wait, the wait clamped to the
    /// configured bound. Negative clamp: no clamping; zero clamp: nothing
    /// subtracted.
    pub fn active_time_seconds(&self) -> i64 {
        let clamp = self.data.config.clamp_initial_wait_seconds;
        let mut initial_wait = self.data.initial_wait_time;
        if clamp >= 0 && initial_wait > clamp {
            initial_wait = clamp;
        }
        let active = self.elapsed_time_seconds() - initial_wait;
        if active < 0 {
            warn!("initial wait was greater than elapsed time");
            return self.elapsed_time_seconds();
        }
        active
    }

    pub fn traverse_distance_meters(&self) -> f64 {
        self.traverse_distance_meters
    }

    pub fn pre_transit_time_seconds(&self) -> i64 {
        self.pre_transit_time
    }

    pub fn num_boardings(&self) -> u32 {
        self.data.num_boardings
    }

    pub fn is_ever_boarded(&self) -> bool {
        self.data.ever_boarded
    }

    pub fn is_car_parked(&self) -> bool {
        self.data.car_parked
    }

    pub fn is_bike_parked(&self) -> bool {
        self.data.bike_parked
    }

    pub fn is_renting_vehicle(&self) -> bool {
        self.data.current_vehicle.is_some()
    }

    pub fn current_vehicle(&self) -> Option<&Arc<VehicleDescription>> {
        self.data.current_vehicle.as_ref()
    }

    /// The mode the rider moves in when not on transit; reflects a rented
    /// vehicle when one is held.
    pub fn non_transit_mode(&self) -> TraverseMode {
        self.data.current_mode
    }

    pub fn used_not_recommended_route(&self) -> bool {
        self.used_not_recommended_route
    }

    /// Real money spent so far.
    pub fn traversal_price(&self) -> Money {
        self.stats.price()
    }

    /// Whether the path may end here: no rental in progress, park-and-ride
    /// obligations settled for the search direction, and transit ridden if
    /// the request demands it.
    pub fn is_final(&self) -> bool {
        let config = &self.data.config;
        let car_ok = if config.arrive_by {
            !config.park_and_ride || !self.is_car_parked()
        } else {
            !config.park_and_ride || self.is_car_parked()
        };
        let bike_ok = if config.arrive_by {
            !config.bike_park_and_ride || !self.is_bike_parked()
        } else {
            !config.bike_park_and_ride || self.is_bike_parked()
        };
        let transit_ok = !config.force_transit || self.is_ever_boarded();
        car_ok && bike_ok && transit_ok && !self.is_renting_vehicle()
    }

    /// Whether the current rental can still cover `distance_meters` more.
    pub fn vehicle_has_enough_range(&self, distance_meters: f64) -> bool {
        match &self.data.current_vehicle {
            Some(vehicle) => {
                self.distance_in_vehicle_meters + distance_meters <= vehicle.range_meters()
            }
            None => true,
        }
    }

    pub fn distance_in_vehicle_meters(&self) -> f64 {
        self.distance_in_vehicle_meters
    }

    pub fn time_in_vehicle_seconds(&self) -> i64 {
        self.time_in_vehicle_seconds
    }

    pub fn active_package_index(&self) -> usize {
        self.active_package
    }

    /// Running total under one pricing package of the current rental.
    pub fn package_total(&self, package_index: usize) -> Money {
        self.package_prices
            .get(package_index)
            .map_or(Money::ZERO, PackagePrices::total)
    }

    pub fn package_prices(&self) -> &[PackagePrices] {
        &self.package_prices
    }

    /// Time difference to the parent state, signed in traversal direction.
    pub fn time_delta_seconds(&self, arena: &StateArena) -> i64 {
        match self.back_state {
            Some(back) => self.time - arena.get(back).time,
            None => 0,
        }
    }

    pub fn abs_time_delta_seconds(&self, arena: &StateArena) -> i64 {
        self.time_delta_seconds(arena).abs()
    }

    pub fn walk_distance_delta(&self, arena: &StateArena) -> f64 {
        match self.back_state {
            Some(back) => {
                (self.traverse_distance_meters - arena.get(back).traverse_distance_meters).abs()
            }
            None => 0.0,
        }
    }

    pub fn pre_transit_time_delta(&self, arena: &StateArena) -> i64 {
        match self.back_state {
            Some(back) => (self.pre_transit_time - arena.get(back).pre_transit_time).abs(),
            None => 0,
        }
    }

    pub fn weight_delta(&self, arena: &StateArena) -> f64 {
        match self.back_state {
            Some(back) => self.weight - arena.get(back).weight,
            None => 0.0,
        }
    }

    /// Symmetric prefix check over accumulated route sequences.
    pub fn route_sequence_prefix(&self, other: &State) -> bool {
        let a = &self.data.route_sequence;
        let b = &other.data.route_sequence;
        let n = a.len().min(b.len());
        a[..n] == b[..n]
    }

    /// Subset check: every route this path used appears in `other`'s
    /// sequence.
    pub fn route_sequence_subset(&self, other: &State) -> bool {
        let a = &self.data.route_sequence;
        let b = &other.data.route_sequence;
        if a.len() > b.len() {
            return false;
        }
        a.iter().all(|route| b.contains(route))
    }

    /// Symmetric subset check: the shorter sequence is contained in the
    /// longer one.
    pub fn route_sequence_subset_symmetric(&self, other: &State) -> bool {
        if self.data.route_sequence.len() <= other.data.route_sequence.len() {
            self.route_sequence_subset(other)
        } else {
            other.route_sequence_subset(self)
        }
    }

    /// Distance walked since the last alighting.
    pub fn walk_since_last_transit(&self) -> f64 {
        self.traverse_distance_meters - self.data.last_transit_walk
    }
}

/// Owns every state of one search, indexed by [`StateId`].
///
/// The arena is request-scoped: concurrent searches each hold their own,
/// so states never need synchronization, and abandoning a search drops
/// every state at once.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<State>,
}

impl StateArena {
    pub fn new() -> Self {
        StateArena::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, id: StateId) -> &State {
        &self.states[id.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0 as usize]
    }

    pub(crate) fn alloc(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(state);
        id
    }

    /// Create a parent-less origin state for a search.
    pub fn new_origin(&mut self, vertex: VertexId, config: Arc<RoutingConfig>) -> StateId {
        let time = config.time_seconds();
        self.alloc(State::new_root(vertex, time, config))
    }

    /// Create an origin state at an explicit time (used when seeding the
    /// reversal replay at a path's arrival instant).
    pub fn new_origin_at(
        &mut self,
        vertex: VertexId,
        time: i64,
        config: Arc<RoutingConfig>,
    ) -> StateId {
        self.alloc(State::new_root(vertex, time, config))
    }

    /// Open an editor that derives a child of `parent` across `edge`.
    pub fn edit<'a>(&'a mut self, parent: StateId, edge: &Edge) -> StateEditor<'a> {
        StateEditor::new(self, parent, edge)
    }

    /// Whether the path ending at `state` consists solely of no-op
    /// leg-switch traversals — a zero-content path that must not be
    /// returned as an itinerary.
    pub fn path_is_trivial(&self, state: StateId) -> bool {
        let mut cursor = Some(state);
        while let Some(id) = cursor {
            let current = self.get(id);
            if current.back_state.is_some()
                && current.back_mode() != Some(TraverseMode::LegSwitch)
            {
                return false;
            }
            cursor = current.back_state;
        }
        true
    }
}
