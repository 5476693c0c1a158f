//! Per-request routing configuration.

use crate::domain::{Money, TraverseMode, VehicleDescription, VehicleType};
use crate::graph::{RequestId, VertexId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

/// Which kind of cost a weight increment represents. The active
/// [`CostProfile`] maps categories to multipliers, so one search can run
/// purely on travel impedance while another also prices money into the
/// weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostCategory {
    Original,
    Price,
}

/// Multipliers applied to weight increments per cost category.
///
/// The default profile reproduces the classic cost function: impedance
/// counts, money does not.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostProfile {
    pub original_weight: f64,
    pub price_weight: f64,
}

impl Default for CostProfile {
    fn default() -> Self {
        CostProfile {
            original_weight: 1.0,
            price_weight: 0.0,
        }
    }
}

impl CostProfile {
    pub fn weight_for(&self, category: CostCategory) -> f64 {
        match category {
            CostCategory::Original => self.original_weight,
            CostCategory::Price => self.price_weight,
        }
    }
}

/// How long rental actions take, per vehicle type, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingDelays {
    pub kick_scooter_renting_time: i64,
    pub kick_scooter_dropoff_time: i64,
    pub motorbike_renting_time: i64,
    pub motorbike_dropoff_time: i64,
    pub car_renting_time: i64,
    pub car_dropoff_time: i64,
    pub bike_renting_time: i64,
    pub bike_dropoff_time: i64,
}

impl Default for RoutingDelays {
    fn default() -> Self {
        RoutingDelays {
            kick_scooter_renting_time: 30,
            kick_scooter_dropoff_time: 30,
            motorbike_renting_time: 60,
            motorbike_dropoff_time: 60,
            car_renting_time: 90,
            car_dropoff_time: 240,
            bike_renting_time: 30,
            bike_dropoff_time: 30,
        }
    }
}

impl RoutingDelays {
    pub fn renting_time(&self, vehicle: &VehicleDescription) -> i64 {
        match vehicle.vehicle_type {
            VehicleType::Car => self.car_renting_time,
            VehicleType::Motorbike => self.motorbike_renting_time,
            VehicleType::KickScooter => self.kick_scooter_renting_time,
            VehicleType::Bike => self.bike_renting_time,
        }
    }

    pub fn dropoff_time(&self, vehicle: &VehicleDescription) -> i64 {
        match vehicle.vehicle_type {
            VehicleType::Car => self.car_dropoff_time,
            VehicleType::Motorbike => self.motorbike_dropoff_time,
            VehicleType::KickScooter => self.kick_scooter_dropoff_time,
            VehicleType::Bike => self.bike_dropoff_time,
        }
    }
}

/// Multipliers that make a second of one activity weigh more than a
/// second of another.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingReluctances {
    pub walk: f64,
    pub bicycle: f64,
    pub car: f64,
    pub motorbike: f64,
    pub kick_scooter: f64,
    pub transit: f64,
    pub wait: f64,
    /// Waiting before the very first boarding is cheaper than waiting
    /// mid-journey: the rider can spend it elsewhere.
    pub wait_at_beginning: f64,
    pub renting: f64,
}

impl Default for RoutingReluctances {
    fn default() -> Self {
        RoutingReluctances {
            walk: 2.0,
            bicycle: 2.0,
            car: 1.0,
            motorbike: 1.0,
            kick_scooter: 1.5,
            transit: 1.0,
            wait: 1.0,
            wait_at_beginning: 0.4,
            renting: 2.0,
        }
    }
}

impl RoutingReluctances {
    pub fn for_mode(&self, mode: TraverseMode) -> f64 {
        match mode {
            TraverseMode::Walk => self.walk,
            TraverseMode::Bicycle => self.bicycle,
            TraverseMode::Car => self.car,
            TraverseMode::Motorbike => self.motorbike,
            TraverseMode::KickScooter => self.kick_scooter,
            TraverseMode::Transit => self.transit,
            TraverseMode::LegSwitch => 0.0,
        }
    }
}

/// One-off weight penalties.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingPenalties {
    pub renting_vehicle: f64,
    pub board_cost: f64,
}

impl Default for RoutingPenalties {
    fn default() -> Self {
        RoutingPenalties {
            renting_vehicle: 60.0,
            board_cost: 60.0,
        }
    }
}

/// Everything one trip planning request tells the search core.
///
/// A config is shared by every state of one search through its
/// [`StateData`](crate::search::StateData); the reversal pass clones it
/// with the direction flipped.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub request_id: RequestId,
    /// False: depart-at search running forward in time. True: arrive-by
    /// search running backward.
    pub arrive_by: bool,
    /// Set on configs cloned for the reverse-optimization replay; rental
    /// pricing is not re-accumulated under it.
    pub reverse_optimizing: bool,
    /// Requested departure (or arrival, for arrive-by) instant.
    pub time: DateTime<Utc>,
    /// Boarding count above `max_transfers + 1` prunes the branch.
    pub max_transfers: u32,
    pub max_walk_distance_meters: f64,
    /// Cap on driving time before transit in park-and-ride searches.
    pub max_pre_transit_time_seconds: i64,
    /// Clamp for the initial wait subtracted in
    /// [`active_time`](crate::search::State::active_time): negative
    /// disables clamping, zero disables the subtraction.
    pub clamp_initial_wait_seconds: i64,
    pub park_and_ride: bool,
    pub bike_park_and_ride: bool,
    /// Only accept itineraries that ride transit at least once.
    pub force_transit: bool,
    pub wheelchair_accessible: bool,
    pub walk_speed_mps: f64,
    pub bicycle_speed_mps: f64,
    pub car_speed_mps: f64,
    pub elevator_hop_time_seconds: i64,
    pub elevator_hop_cost: f64,
    /// Price of a walked minute, accrued into the `Price` cost category.
    pub walk_price_per_minute: Money,
    /// Vehicle types this request is willing to rent; empty means all.
    pub allowed_vehicle_types: Vec<VehicleType>,
    pub reluctances: RoutingReluctances,
    pub penalties: RoutingPenalties,
    pub delays: RoutingDelays,
    pub profile: CostProfile,
    /// Temporary vertices created for this request; a committed state may
    /// not sit on a request-private vertex outside this set.
    pub temporary_vertices: HashSet<VertexId>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            request_id: RequestId(0),
            arrive_by: false,
            reverse_optimizing: false,
            time: DateTime::<Utc>::UNIX_EPOCH,
            max_transfers: 2,
            max_walk_distance_meters: 5_000.0,
            max_pre_transit_time_seconds: 1_800,
            clamp_initial_wait_seconds: -1,
            park_and_ride: false,
            bike_park_and_ride: false,
            force_transit: false,
            wheelchair_accessible: false,
            walk_speed_mps: 1.33,
            bicycle_speed_mps: 5.0,
            car_speed_mps: 11.2,
            elevator_hop_time_seconds: 20,
            elevator_hop_cost: 20.0,
            walk_price_per_minute: Money::ZERO,
            allowed_vehicle_types: Vec::new(),
            reluctances: RoutingReluctances::default(),
            penalties: RoutingPenalties::default(),
            delays: RoutingDelays::default(),
            profile: CostProfile::default(),
            temporary_vertices: HashSet::new(),
        }
    }
}

impl RoutingConfig {
    /// Epoch seconds of the requested instant.
    pub fn time_seconds(&self) -> i64 {
        self.time.timestamp()
    }

    /// Travel speed for a self-propelled mode, in meters per second.
    pub fn speed_for(&self, mode: TraverseMode) -> f64 {
        match mode {
            TraverseMode::Bicycle => self.bicycle_speed_mps,
            TraverseMode::Car => self.car_speed_mps,
            _ => self.walk_speed_mps,
        }
    }

    pub fn cost_weight(&self, category: CostCategory) -> f64 {
        self.profile.weight_for(category)
    }

    pub fn vehicle_type_allowed(&self, vehicle_type: VehicleType) -> bool {
        self.allowed_vehicle_types.is_empty()
            || self.allowed_vehicle_types.contains(&vehicle_type)
    }

    /// The same request with the search direction flipped, used to seed
    /// the reverse-optimization replay.
    pub fn reversed_clone(&self) -> RoutingConfig {
        RoutingConfig {
            arrive_by: !self.arrive_by,
            reverse_optimizing: true,
            ..self.clone()
        }
    }
}
