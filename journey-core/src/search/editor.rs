//! The single-use builder that derives a child state from a parent.
//!
//! All state mutation funnels through a [`StateEditor`]: edges open one,
//! apply increments and attribute changes, and [`commit`](StateEditor::commit)
//! either yields the committed child or nothing. `commit` consumes the
//! editor, so reusing one — which would corrupt an already-committed state
//! somewhere in the search tree — is a compile-time error rather than a
//! runtime check.
//!
//! Ordinary domain failures (blocked mode, zone forbids parking, walk
//! limit) are signaled by edges declining to commit, not by errors: the
//! editor marks itself *defective* on negative or NaN increments and on
//! edges not connected to the parent, and a defective editor commits to
//! nothing while the rest of the search continues.

use crate::domain::{FeedScopedId, Money, Stop, TraverseMode, VehicleDescription};
use crate::graph::{Edge, ServiceDay, VertexId};
use crate::search::config::CostCategory;
use crate::search::state::{PackagePrices, State, StateArena, StateId};
use crate::search::state_data::{ActiveTrip, StateData};
use crate::search::RoutingConfig;
use std::sync::Arc;
use tracing::{error, trace, warn};

pub struct StateEditor<'a> {
    arena: &'a mut StateArena,
    child: State,
    defective: bool,
    traversing_backward: bool,
    /// Whether the child lands on a request-private temporary vertex.
    child_vertex_request_private: bool,
    /// Mode attributed to this traversal's time/distance in the per-mode
    /// statistics; falls back to the current non-transit mode until
    /// [`set_back_mode`](Self::set_back_mode) is called.
    stats_mode: Option<TraverseMode>,
}

impl<'a> StateEditor<'a> {
    /// Editor for a parent-less state at the beginning of a search.
    pub fn initial(
        arena: &'a mut StateArena,
        vertex: VertexId,
        config: Arc<RoutingConfig>,
    ) -> StateEditor<'a> {
        let time = config.time_seconds();
        let backward = config.arrive_by;
        StateEditor {
            arena,
            child: State::new_root(vertex, time, config),
            defective: false,
            traversing_backward: backward,
            child_vertex_request_private: false,
            stats_mode: None,
        }
    }

    /// Editor for the child of `parent` across `edge`.
    ///
    /// Which endpoint of the edge matches the parent's vertex decides the
    /// traversal direction; an edge not connected to the parent, or a
    /// direction inconsistent with the search's, flags the editor
    /// defective (the branch is pruned at commit, not a hard failure).
    pub(crate) fn new(arena: &'a mut StateArena, parent: StateId, edge: &Edge) -> StateEditor<'a> {
        let parent_state = arena.get(parent).clone();
        let arrive_by = parent_state.data.config.arrive_by;

        let mut child = parent_state;
        child.back_state = Some(parent);
        child.back_edge = Some(edge.id);

        let mut defective = false;
        let mut traversing_backward = false;
        let mut child_private = false;

        if edge.from == edge.to && child.vertex == edge.from {
            // Loop edge (vehicle rental pickup/drop-off on one vertex).
            traversing_backward = arrive_by;
            child.vertex = edge.to;
            child_private = edge.to_request_private;
        } else if child.vertex == edge.from {
            traversing_backward = false;
            child.vertex = edge.to;
            child_private = edge.to_request_private;
        } else if child.vertex == edge.to {
            traversing_backward = true;
            child.vertex = edge.from;
            child_private = edge.from_request_private;
        } else {
            warn!(
                edge = ?edge.id,
                from = ?edge.from,
                to = ?edge.to,
                parent = ?child.vertex,
                "edge is not connected to parent state"
            );
            defective = true;
        }

        if !defective && traversing_backward != arrive_by {
            error!(
                edge = ?edge.id,
                "actual traversal direction does not match the search direction"
            );
            defective = true;
        }

        StateEditor {
            arena,
            child,
            defective,
            traversing_backward,
            child_vertex_request_private: child_private,
            stats_mode: None,
        }
    }

    /// Commit the child state, or nothing if the traversal was flagged
    /// defective, exceeded the transfer limit, strayed onto another
    /// request's temporary vertex, or moved time against the search
    /// direction.
    ///
    /// # Panics
    ///
    /// Panics when the child's weight is lower than its parent's. Weight
    /// decreases cannot arise from the increment API and indicate a
    /// cost-function bug; unlike a pruned branch this must not be
    /// silently survivable.
    pub fn commit(self) -> Option<StateId> {
        if self.defective {
            error!(edge = ?self.child.back_edge, "defective traversal flagged on edge");
            return None;
        }

        let config = &self.child.data.config;
        if self.child.num_boardings() > config.max_transfers + 1 {
            return None;
        }

        if self.child_vertex_request_private
            && !config.temporary_vertices.contains(&self.child.vertex)
        {
            return None;
        }

        if let Some(back) = self.child.back_state {
            let parent = self.arena.get(back);
            let weight_delta = self.child.weight - parent.weight;
            if weight_delta < 0.0 {
                panic!(
                    "negative weight delta {weight_delta} on edge {:?}",
                    self.child.back_edge
                );
            }

            let time_delta = self.child.time - parent.time;
            let wrong_direction = if self.traversing_backward {
                time_delta > 0
            } else {
                time_delta < 0
            };
            if wrong_direction {
                trace!(
                    edge = ?self.child.back_edge,
                    "time was incremented against the traversal direction"
                );
                return None;
            }
        }

        Some(self.arena.alloc(self.child))
    }

    /// Force `commit` to yield nothing regardless of other editing.
    pub fn block_traversal(&mut self) {
        self.defective = true;
    }

    fn data_mut(&mut self) -> &mut StateData {
        // Clone-on-first-write: the block is shared with the parent chain
        // until a field actually changes.
        Arc::make_mut(&mut self.child.data)
    }

    fn stats_mode(&self) -> TraverseMode {
        self.stats_mode.unwrap_or(self.child.data.current_mode)
    }

    /* Incrementors. Only non-negative increments are legal; a negative or
     * NaN amount marks the editor defective. */

    pub fn increment_weight(&mut self, weight: f64) {
        self.increment_weight_in_category(CostCategory::Original, weight);
    }

    pub fn increment_weight_in_category(&mut self, category: CostCategory, weight: f64) {
        let weight = weight * self.child.data.config.cost_weight(category);
        if weight.is_nan() {
            warn!(edge = ?self.child.back_edge, "weight incremented by NaN");
            self.defective = true;
            return;
        }
        if weight < 0.0 {
            warn!(edge = ?self.child.back_edge, "weight incremented by a negative amount");
            self.defective = true;
            return;
        }
        self.child.weight += weight;
    }

    /// Advance (or, traversing backward, rewind) the child's time. This is
    /// the only element of state that runs backward in arrive-by searches.
    pub fn increment_time_seconds(&mut self, seconds: i64) {
        self.increment_time_impl(seconds, false);
    }

    fn increment_time_impl(&mut self, seconds: i64, beginning_rental: bool) {
        if seconds < 0 {
            warn!(edge = ?self.child.back_edge, "time incremented by a negative amount");
            self.defective = true;
            return;
        }
        self.child.time += if self.traversing_backward {
            -seconds
        } else {
            seconds
        };
        self.child.stats.add_time(self.stats_mode(), seconds);

        if !self.child.data.config.reverse_optimizing {
            if !beginning_rental && self.child.data.current_vehicle.is_some() {
                self.update_time_prices(seconds);
            } else if self.child.data.current_vehicle.is_none() {
                // Started minutes of walking carry a configurable price.
                let minutes = (seconds + 59) / 60;
                let walk_price = self.child.data.config.walk_price_per_minute * minutes;
                self.increment_weight_in_category(CostCategory::Price, walk_price.as_major_f64());
            }
        }
    }

    /// Add to the total distance covered, the per-mode distance, and —
    /// while renting — the current vehicle's metered distance and prices.
    pub fn increment_walk_distance_meters(&mut self, meters: f64) {
        if meters < 0.0 {
            warn!(edge = ?self.child.back_edge, "walk distance incremented by a negative amount");
            self.defective = true;
            return;
        }
        self.update_distance_prices(meters);
        self.child.stats.add_distance(self.stats_mode(), meters);
        self.child.traverse_distance_meters += meters;
    }

    pub fn increment_pre_transit_time(&mut self, seconds: i64) {
        if seconds < 0 {
            warn!(edge = ?self.child.back_edge, "pre-transit time incremented by a negative amount");
            self.defective = true;
            return;
        }
        self.child.pre_transit_time += seconds;
    }

    pub fn increment_num_boardings(&mut self) {
        let data = self.data_mut();
        data.num_boardings += 1;
        data.ever_boarded = true;
    }

    /* Vehicle rental lifecycle. */

    /// Begin renting `vehicle`: switches the current mode to the
    /// vehicle's, counts the rental as a boarding, charges the rental
    /// setup delay, and opens the running price table with every
    /// package's start price — the cheapest becomes active.
    pub fn begin_vehicle_renting(&mut self, vehicle: Arc<VehicleDescription>) {
        let renting_time = self.child.data.config.delays.renting_time(&vehicle);
        let renting_weight = renting_time as f64 * self.child.data.config.reluctances.renting
            + self.child.data.config.penalties.renting_vehicle;

        let package_count = vehicle.pricing_packages.len();
        {
            let data = self.data_mut();
            data.num_boardings += 1;
            data.current_mode = vehicle.traverse_mode();
            data.current_vehicle = Some(vehicle.clone());
        }
        self.child.distance_in_vehicle_meters = 0.0;
        self.child.time_in_vehicle_seconds = 0;

        self.increment_weight(renting_weight);
        self.increment_time_impl(renting_time, true);

        self.child.package_prices.clear();
        self.child
            .package_prices
            .resize(package_count, PackagePrices::default());
        let mut best_index = 0;
        let mut best_total = Money::ZERO;
        for index in 0..package_count {
            let start = vehicle.pricing_package(index).compute_start_price();
            self.child.package_prices[index].start = start;
            let total = self.child.package_total(index);
            if index == 0 || total < best_total {
                best_index = index;
                best_total = total;
            }
        }
        self.assign_best_package(Money::ZERO, best_total, best_index);
    }

    /// End the current rental: charges the drop-off delay, settles the
    /// cheapest package's final price into the traversal price, and
    /// returns the rider to walking.
    pub fn done_vehicle_renting(&mut self) {
        let Some(vehicle) = self.child.data.current_vehicle.clone() else {
            warn!(edge = ?self.child.back_edge, "drop-off without a rented vehicle");
            self.defective = true;
            return;
        };
        let dropping_time = self.child.data.config.delays.dropoff_time(&vehicle);
        self.increment_time_seconds(dropping_time);
        let dropping_weight =
            dropping_time as f64 * self.child.data.config.reluctances.renting;
        self.increment_weight(dropping_weight);

        let previous_index = self.child.active_package;
        let previous_total = self.child.package_total(previous_index);

        let mut best_index = previous_index;
        let mut best_final = vehicle
            .pricing_package(previous_index)
            .compute_final_price(previous_total);
        for index in 0..vehicle.pricing_packages.len() {
            if index == previous_index {
                continue;
            }
            let candidate = vehicle
                .pricing_package(index)
                .compute_final_price(self.child.package_total(index));
            if candidate < best_final {
                best_final = candidate;
                best_index = index;
            }
        }

        self.assign_best_package(previous_total, best_final, best_index);
        self.child.stats.add_price(best_final);

        let data = self.data_mut();
        data.current_mode = TraverseMode::Walk;
        data.current_vehicle = None;
        self.child.package_prices.clear();
        self.child.active_package = 0;
        self.child.time_in_vehicle_seconds = 0;
        self.child.distance_in_vehicle_meters = 0.0;
    }

    /// Replay a drop-off in the reversed temporal direction: the rental
    /// resumes, and the drop-off delay is re-applied on this side.
    pub fn reversed_done_vehicle_renting(&mut self, vehicle: Arc<VehicleDescription>) {
        let dropping_time = self.child.data.config.delays.dropoff_time(&vehicle);
        {
            let data = self.data_mut();
            data.current_mode = vehicle.traverse_mode();
            data.current_vehicle = Some(vehicle);
        }
        self.child.distance_in_vehicle_meters = 0.0;
        self.child.time_in_vehicle_seconds = 0;
        self.increment_time_seconds(dropping_time);
    }

    /// Replay a rental start in the reversed temporal direction: the
    /// rental ends here, going backward.
    pub fn reversed_begin_vehicle_renting(&mut self) {
        if let Some(vehicle) = self.child.data.current_vehicle.clone() {
            let renting_time = self.child.data.config.delays.renting_time(&vehicle);
            self.increment_time_seconds(renting_time);
        }
        let data = self.data_mut();
        data.current_mode = TraverseMode::Walk;
        data.current_vehicle = None;
    }

    /// Recompute every package's time price from cumulative riding time
    /// and keep the cheapest active (ties keep the current package).
    fn update_time_prices(&mut self, seconds: i64) {
        let Some(vehicle) = self.child.data.current_vehicle.clone() else {
            return;
        };
        self.ensure_package_table(vehicle.pricing_packages.len());
        self.child.time_in_vehicle_seconds += seconds;
        let ridden = self.child.time_in_vehicle_seconds;

        let previous_index = self.child.active_package;
        let previous_total = self.child.package_total(previous_index);

        self.child.package_prices[previous_index].time = vehicle
            .pricing_package(previous_index)
            .compute_time_price(ridden);
        let mut best_index = previous_index;
        let mut best_total = self.child.package_total(previous_index);
        for index in 0..vehicle.pricing_packages.len() {
            if index == previous_index {
                continue;
            }
            self.child.package_prices[index].time =
                vehicle.pricing_package(index).compute_time_price(ridden);
            let total = self.child.package_total(index);
            if total < best_total {
                best_index = index;
                best_total = total;
            }
        }
        self.assign_best_package(previous_total, best_total, best_index);
    }

    /// Recompute every package's distance price from cumulative metered
    /// distance and keep the cheapest active (ties keep the current
    /// package).
    fn update_distance_prices(&mut self, meters: f64) {
        let Some(vehicle) = self.child.data.current_vehicle.clone() else {
            return;
        };
        self.ensure_package_table(vehicle.pricing_packages.len());
        self.child.distance_in_vehicle_meters += meters;
        let ridden = self.child.distance_in_vehicle_meters;

        let previous_index = self.child.active_package;
        let previous_total = self.child.package_total(previous_index);

        self.child.package_prices[previous_index].distance = vehicle
            .pricing_package(previous_index)
            .compute_distance_price(ridden);
        let mut best_index = previous_index;
        let mut best_total = self.child.package_total(previous_index);
        for index in 0..vehicle.pricing_packages.len() {
            if index == previous_index {
                continue;
            }
            self.child.package_prices[index].distance = vehicle
                .pricing_package(index)
                .compute_distance_price(ridden);
            let total = self.child.package_total(index);
            if total < best_total {
                best_index = index;
                best_total = total;
            }
        }
        self.assign_best_package(previous_total, best_total, best_index);
    }

    fn ensure_package_table(&mut self, package_count: usize) {
        if self.child.package_prices.len() < package_count {
            self.child
                .package_prices
                .resize(package_count, PackagePrices::default());
        }
    }

    /// Make the cheapest package active and charge the price growth into
    /// the `Price` cost category. Running totals are monotone per package,
    /// so a total below the previous one signals a pricing-model bug; it
    /// is logged and the assignment proceeds.
    fn assign_best_package(&mut self, old_total: Money, new_total: Money, new_active: usize) {
        if old_total > new_total {
            error!(
                %old_total,
                %new_total,
                "package switch decreased the running rental price"
            );
        }
        self.child.active_package = new_active;
        self.increment_weight_in_category(
            CostCategory::Price,
            (new_total - old_total).as_major_f64(),
        );
    }

    /* Setters for the copy-on-write attribute block. */

    pub fn set_back_mode(&mut self, mode: TraverseMode) {
        self.stats_mode = Some(mode);
        if self.child.data.back_mode == Some(mode) {
            return;
        }
        self.data_mut().back_mode = Some(mode);
    }

    pub fn set_current_mode(&mut self, mode: TraverseMode) {
        if self.child.data.current_mode == mode {
            return;
        }
        self.data_mut().current_mode = mode;
    }

    /// Mark the car parked (or picked back up) and switch the current
    /// mode accordingly. Parking matters for co-dominance of walking and
    /// driving states in park-and-ride searches.
    pub fn set_car_parked(&mut self, parked: bool) {
        let data = self.data_mut();
        data.car_parked = parked;
        data.current_mode = if parked {
            TraverseMode::Walk
        } else {
            TraverseMode::Car
        };
    }

    pub fn set_bike_parked(&mut self, parked: bool) {
        let data = self.data_mut();
        data.bike_parked = parked;
        data.current_mode = if parked {
            TraverseMode::Walk
        } else {
            TraverseMode::Bicycle
        };
    }

    pub fn set_trip(&mut self, trip: Option<ActiveTrip>) {
        self.data_mut().trip = trip;
    }

    /// Set the current route; a new route is also appended to the route
    /// sequence.
    pub fn set_route(&mut self, route: Option<FeedScopedId>) {
        let data = self.data_mut();
        if let Some(route_id) = &route {
            data.route_sequence.push(route_id.clone());
        }
        data.route = route;
    }

    pub fn set_zone(&mut self, zone: Option<String>) {
        if self.child.data.zone == zone {
            return;
        }
        self.data_mut().zone = zone;
    }

    pub fn set_service_day(&mut self, day: ServiceDay) {
        self.data_mut().service_day = Some(day);
    }

    pub fn set_previous_stop(&mut self, stop: Arc<Stop>) {
        self.data_mut().previous_stop = Some(stop);
    }

    pub fn set_last_alighted_time(&mut self, seconds: i64) {
        self.data_mut().last_alighted_time = seconds;
    }

    pub fn set_last_pattern(&mut self, pattern: Option<Arc<crate::graph::TripPattern>>) {
        self.data_mut().last_pattern = pattern;
    }

    /// Record the gap to the next trip's arrival, set at alighting.
    pub fn set_last_next_arrival_delta(&mut self, delta: i64) {
        self.data_mut().last_next_arrival_delta = delta;
    }

    /// Record the walk distance at which transit was left, so
    /// walk-since-last-transit stays computable.
    pub fn alight_transit(&mut self) {
        let total = self.child.traverse_distance_meters;
        self.data_mut().last_transit_walk = total;
    }

    pub fn set_num_boardings(&mut self, num_boardings: u32) {
        self.data_mut().num_boardings = num_boardings;
    }

    pub fn set_ever_boarded(&mut self) {
        self.data_mut().ever_boarded = true;
    }

    /// Record the wait before the very first boarding so active-time
    /// comparisons can clamp it out.
    pub fn set_initial_wait_time(&mut self, seconds: i64) {
        self.data_mut().initial_wait_time = seconds;
    }

    pub fn set_start_time(&mut self, seconds: i64) {
        self.data_mut().start_time = seconds;
    }

    pub fn set_time_seconds(&mut self, seconds: i64) {
        self.child.time = seconds;
    }

    pub fn set_used_not_recommended_route(&mut self) {
        self.child.used_not_recommended_route = true;
    }

    /// Copy the non-incremental attributes (trip context, zone, parking
    /// flags) from an existing state, used by the structural reversal
    /// replay. Incremental values (boardings, accumulators) are not
    /// copied.
    pub fn set_from_state(&mut self, state: &State) {
        let source = state.data.clone();
        let data = self.data_mut();
        data.route = source.route.clone();
        data.trip = source.trip.clone();
        data.service_day = source.service_day;
        data.previous_stop = source.previous_stop.clone();
        data.zone = source.zone.clone();
        data.car_parked = source.car_parked;
        data.bike_parked = source.bike_parked;
    }

    /* Queries on the state under construction. */

    pub fn vertex(&self) -> VertexId {
        self.child.vertex
    }

    pub fn time_seconds(&self) -> i64 {
        self.child.time
    }

    pub fn num_boardings(&self) -> u32 {
        self.child.num_boardings()
    }

    pub fn is_ever_boarded(&self) -> bool {
        self.child.is_ever_boarded()
    }

    pub fn current_vehicle(&self) -> Option<&Arc<VehicleDescription>> {
        self.child.data.current_vehicle.as_ref()
    }

    pub fn walked_too_far(&self) -> bool {
        self.child.stats.walk_distance() >= self.child.data.config.max_walk_distance_meters
    }

    pub fn pre_transit_time_exceeded(&self) -> bool {
        self.child.pre_transit_time > self.child.data.config.max_pre_transit_time_seconds
    }
}
