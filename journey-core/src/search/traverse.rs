//! Edge traversal: deriving child states from edges.
//!
//! Every edge kind implements the same contract: consume a state, produce
//! a child state or nothing. `None` means "this edge is not traversable
//! from this state" — a pruned branch, expected and frequent, never an
//! error. Eligibility checks run before an editor is opened, so a refusal
//! has no side effects.

use crate::domain::TraverseMode;
use crate::graph::{
    BoardAlightData, DropoffVehicleData, Edge, EdgeKind, ElevatorHopData, PatternHopData,
    RentVehicleData, StreetEdgeData,
};
use crate::search::state::{StateArena, StateId};
use crate::search::state_data::ActiveTrip;

impl Edge {
    /// Traverse this edge from `state`, committing a child state into the
    /// arena. `None` when the edge declines (permission, range, zone,
    /// walk limit, no connecting trip).
    pub fn traverse(&self, arena: &mut StateArena, state: StateId) -> Option<StateId> {
        match &self.kind {
            EdgeKind::Street(street) => self.traverse_street(arena, state, street),
            EdgeKind::Board(board) => self.traverse_board_alight(arena, state, board, true, None),
            EdgeKind::Alight(alight) => {
                self.traverse_board_alight(arena, state, alight, false, None)
            }
            EdgeKind::PatternHop(hop) => self.traverse_hop(arena, state, hop),
            EdgeKind::ElevatorHop(elevator) => self.traverse_elevator(arena, state, elevator),
            EdgeKind::TimedTransfer => self.traverse_timed_transfer(arena, state),
            EdgeKind::LegSwitch => self.traverse_leg_switch(arena, state),
            EdgeKind::RentVehicle(rent) => self.traverse_rent(arena, state, rent),
            EdgeKind::DropoffVehicle(dropoff) => self.traverse_dropoff(arena, state, dropoff),
        }
    }

    /// Traverse a boarding (or alighting) edge with the re-optimization
    /// hint: after the trip is chosen, the wait between `hint_time` and
    /// the chosen trip is re-inserted as *initial* wait, weighted by the
    /// cheaper wait-at-beginning factor. Used on the first boarding of a
    /// path during reverse optimization so the slack moves to the start
    /// of the trip instead of disappearing from the total duration.
    pub fn traverse_board_with_hint(
        &self,
        arena: &mut StateArena,
        state: StateId,
        hint_time: i64,
    ) -> Option<StateId> {
        match &self.kind {
            EdgeKind::Board(board) => {
                self.traverse_board_alight(arena, state, board, true, Some(hint_time))
            }
            EdgeKind::Alight(alight) => {
                self.traverse_board_alight(arena, state, alight, false, Some(hint_time))
            }
            _ => None,
        }
    }

    fn traverse_street(
        &self,
        arena: &mut StateArena,
        state: StateId,
        street: &StreetEdgeData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();
        let mode = parent.non_transit_mode();
        let vehicle = parent.current_vehicle().cloned();

        if config.wheelchair_accessible && !street.wheelchair_accessible {
            return None;
        }
        if !street.permission.allows(mode) {
            return None;
        }
        if !parent.vehicle_has_enough_range(street.length_meters) {
            return None;
        }

        let speed = match &vehicle {
            Some(vehicle) => vehicle.max_speed_mps(),
            None => config.speed_for(mode),
        };
        let seconds = (street.length_meters / speed).ceil() as i64;
        let weight = seconds as f64 * config.reluctances.for_mode(mode);
        let count_pre_transit = mode.is_driving() && !parent.is_ever_boarded();

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(mode);
        editor.increment_weight(weight);
        editor.increment_time_seconds(seconds);
        editor.increment_walk_distance_meters(street.length_meters);
        if mode == TraverseMode::Walk && editor.walked_too_far() {
            return None;
        }
        if count_pre_transit {
            editor.increment_pre_transit_time(seconds);
            if editor.pre_transit_time_exceeded() {
                return None;
            }
        }
        if street.not_recommended {
            editor.set_used_not_recommended_route();
        }
        editor.commit()
    }

    fn traverse_board_alight(
        &self,
        arena: &mut StateArena,
        state: StateId,
        data: &BoardAlightData,
        boarding: bool,
        hint_time: Option<i64>,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();

        // In a forward search the boarding edge is where the trip is
        // chosen and the wait accrues; in a backward search that happens
        // on the alighting edge. The other edge of the pair is the
        // off-vehicle transition.
        if boarding == !config.arrive_by {
            self.traverse_onto_transit(arena, state, data)
        } else {
            self.traverse_off_transit(arena, state, data, boarding, hint_time)
        }
    }

    /// Choose a trip and get on board. Forward searches pick the earliest
    /// departure at or after the current time; backward searches pick the
    /// latest arrival at or before it. The schedule slack between the
    /// current time and the chosen trip accrues as waiting.
    fn traverse_onto_transit(
        &self,
        arena: &mut StateArena,
        state: StateId,
        data: &BoardAlightData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();
        let now = parent.time_seconds();
        let first_board = !parent.is_ever_boarded();

        let (trip_index, vehicle_time) = if !config.arrive_by {
            data.pattern.next_departure(data.stop_index, now, data.service_day)?
        } else {
            data.pattern.previous_arrival(data.stop_index, now, data.service_day)?
        };
        let wait = (vehicle_time - now).abs();

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Transit);
        editor.set_service_day(data.service_day);
        editor.set_trip(Some(ActiveTrip {
            pattern: data.pattern.clone(),
            trip_index,
        }));
        editor.set_route(Some(data.pattern.route.id.clone()));
        editor.increment_num_boardings();
        if first_board {
            editor.set_initial_wait_time(wait);
        }
        editor.increment_time_seconds(wait);
        editor.increment_weight(
            wait as f64 * config.reluctances.wait + config.penalties.board_cost,
        );
        editor.commit()
    }

    /// Leave the vehicle: record the alighting context and clear the trip.
    /// With the re-optimization hint, the wait to the hinted time is
    /// re-inserted here as initial wait at the cheaper beginning factor.
    fn traverse_off_transit(
        &self,
        arena: &mut StateArena,
        state: StateId,
        data: &BoardAlightData,
        boarding: bool,
        hint_time: Option<i64>,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();
        let trip = parent.data().trip.clone();
        let stop = data.pattern.stops.get(data.stop_index)?.clone();
        let now = parent.time_seconds();

        let next_arrival_delta = trip
            .as_ref()
            .filter(|_| !boarding)
            .and_then(|active| {
                data.pattern
                    .next_arrival_after(data.stop_index, active.trip_index, data.service_day)
            })
            .map(|next| next - now);

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Transit);
        editor.set_trip(None);
        editor.set_last_pattern(Some(data.pattern.clone()));
        editor.set_previous_stop(stop.clone());
        editor.set_zone(stop.zone.clone());
        editor.set_last_alighted_time(now);
        editor.set_last_next_arrival_delta(next_arrival_delta.unwrap_or(-1));
        editor.alight_transit();
        // Each board/alight pair charges the board cost exactly once: on
        // the trip-choosing edge. A boarding edge reached here is being
        // traversed backward, so the pair's cost lands on this side.
        if boarding {
            editor.increment_weight(config.penalties.board_cost);
        }
        if let Some(hint) = hint_time {
            let wait = (editor.time_seconds() - hint).abs();
            editor.set_initial_wait_time(wait);
            editor.increment_time_seconds(wait);
            editor.increment_weight(wait as f64 * config.reluctances.wait_at_beginning);
        }
        editor.commit()
    }

    /// Ride the current trip to the next stop of its pattern.
    fn traverse_hop(
        &self,
        arena: &mut StateArena,
        state: StateId,
        hop: &PatternHopData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();
        let trip = parent.data().trip.clone()?;
        let day = parent.data().service_day?;
        if !std::sync::Arc::ptr_eq(&trip.pattern, &hop.pattern) {
            return None;
        }
        let trip_times = &hop.pattern.trips[trip.trip_index];
        let now = parent.time_seconds();

        let seconds = if !config.arrive_by {
            let arrival = day.resolve(trip_times.arrivals[hop.from_stop_index + 1]);
            arrival - now
        } else {
            let departure = day.resolve(trip_times.departures[hop.from_stop_index]);
            now - departure
        };
        if seconds < 0 {
            return None;
        }
        let distance = hop.pattern.hop_distances_m[hop.from_stop_index];

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Transit);
        editor.increment_time_seconds(seconds);
        editor.increment_weight(seconds as f64 * config.reluctances.transit);
        editor.increment_walk_distance_meters(distance);
        editor.commit()
    }

    /// A relatively low cost edge for travelling one level in an elevator.
    fn traverse_elevator(
        &self,
        arena: &mut StateArena,
        state: StateId,
        elevator: &ElevatorHopData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();
        let mode = parent.non_transit_mode();

        if config.wheelchair_accessible && !elevator.wheelchair_accessible {
            return None;
        }
        if !elevator.permission.allows(mode) {
            return None;
        }

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Walk);
        editor.increment_weight(config.elevator_hop_cost);
        editor.increment_time_seconds(config.elevator_hop_time_seconds);
        editor.commit()
    }

    /// A synchronized transfer: the receiving vehicle waits, so the
    /// transfer itself is instantaneous and nearly free.
    fn traverse_timed_transfer(&self, arena: &mut StateArena, state: StateId) -> Option<StateId> {
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Walk);
        editor.increment_weight(1.0);
        editor.commit()
    }

    fn traverse_leg_switch(&self, arena: &mut StateArena, state: StateId) -> Option<StateId> {
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::LegSwitch);
        editor.commit()
    }

    /// Begin renting the edge's vehicle. Renting while already holding a
    /// vehicle is an illegal transition (the current one must be dropped
    /// off first), and rentals are only modeled in forward searches — the
    /// reversal pass replays them through the dedicated reversed helpers.
    fn traverse_rent(
        &self,
        arena: &mut StateArena,
        state: StateId,
        rent: &RentVehicleData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();

        if config.arrive_by && !config.reverse_optimizing {
            return None;
        }
        if parent.is_renting_vehicle() {
            return None;
        }
        if !config.vehicle_type_allowed(rent.vehicle.vehicle_type) {
            return None;
        }

        let mode = rent.vehicle.traverse_mode();
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(mode);
        editor.begin_vehicle_renting(rent.vehicle.clone());
        editor.commit()
    }

    /// Drop the rented vehicle off, if the parking-zone rules for its
    /// provider and type allow it here.
    fn traverse_dropoff(
        &self,
        arena: &mut StateArena,
        state: StateId,
        dropoff: &DropoffVehicleData,
    ) -> Option<StateId> {
        let parent = arena.get(state);
        let config = parent.config().clone();

        if config.arrive_by && !config.reverse_optimizing {
            return None;
        }
        let vehicle = parent.current_vehicle()?.clone();
        if !dropoff.parking_zones.can_dropoff_here(&vehicle) {
            return None;
        }

        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Walk);
        editor.done_vehicle_renting();
        editor.commit()
    }

    /// Replay a rental start in the reversed temporal direction: going
    /// backward, this is where the rental ends.
    pub fn reversed_traverse_begin_renting(
        &self,
        arena: &mut StateArena,
        state: StateId,
    ) -> Option<StateId> {
        if !self.is_rent_vehicle() {
            return None;
        }
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(TraverseMode::Walk);
        editor.reversed_begin_vehicle_renting();
        editor.commit()
    }

    /// Replay a vehicle switch in the reversed temporal direction: the
    /// replayed rental ends here and `previous_vehicle` (which the
    /// original path held before this point) resumes.
    pub fn reversed_traverse_switch_vehicles(
        &self,
        arena: &mut StateArena,
        state: StateId,
        previous_vehicle: std::sync::Arc<crate::domain::VehicleDescription>,
    ) -> Option<StateId> {
        if !self.is_rent_vehicle() {
            return None;
        }
        let mode = previous_vehicle.traverse_mode();
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(mode);
        editor.reversed_begin_vehicle_renting();
        editor.reversed_done_vehicle_renting(previous_vehicle);
        editor.commit()
    }

    /// Replay a drop-off in the reversed temporal direction: going
    /// backward, this is where `vehicle` is picked up again.
    pub fn reversed_traverse_done_renting(
        &self,
        arena: &mut StateArena,
        state: StateId,
        vehicle: std::sync::Arc<crate::domain::VehicleDescription>,
    ) -> Option<StateId> {
        if !self.is_dropoff_vehicle() {
            return None;
        }
        let mode = vehicle.traverse_mode();
        let mut editor = arena.edit(state, self);
        editor.set_back_mode(mode);
        editor.reversed_done_vehicle_renting(vehicle);
        editor.commit()
    }
}
