//! Parking-zone rules for rented vehicles.
//!
//! Operators and cities publish geometries inside which vehicles of a
//! given provider and type may (or may not) be left. The feed updater
//! evaluates those geometries against each drop-off location and attaches
//! the resulting [`ParkingZoneInfo`] to the rental edges there; traversal
//! then only consults the precomputed verdicts.

use crate::domain::{VehicleDescription, VehicleType};
use geo::Contains;
use geo_types::{Point, Polygon};

/// One provider's verdict at one location: vehicles of `vehicle_type`
/// operated by `provider_id` are concerned by a parking rule here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleParkingZone {
    pub provider_id: i32,
    pub vehicle_type: VehicleType,
}

impl SingleParkingZone {
    pub fn new(provider_id: i32, vehicle_type: VehicleType) -> Self {
        SingleParkingZone {
            provider_id,
            vehicle_type,
        }
    }

    fn applies_to(&self, vehicle: &VehicleDescription) -> bool {
        self.provider_id == vehicle.provider.provider_id
            && self.vehicle_type == vehicle.vehicle_type
    }
}

/// The parking verdicts attached to a drop-off capable edge.
///
/// `zones_enabled` lists every provider/type combination that has *any*
/// parking rule in force; `zones_allowing` lists those whose rules allow
/// parking at this specific location. A vehicle whose provider/type has
/// no rule at all may park anywhere.
#[derive(Debug, Clone, Default)]
pub struct ParkingZoneInfo {
    zones_enabled: Vec<SingleParkingZone>,
    zones_allowing: Vec<SingleParkingZone>,
}

impl ParkingZoneInfo {
    pub fn new(
        zones_enabled: Vec<SingleParkingZone>,
        zones_allowing: Vec<SingleParkingZone>,
    ) -> Self {
        ParkingZoneInfo {
            zones_enabled,
            zones_allowing,
        }
    }

    /// Whether `vehicle` may be dropped off at this edge's location.
    pub fn can_dropoff_here(&self, vehicle: &VehicleDescription) -> bool {
        !self.zones_enabled.iter().any(|z| z.applies_to(vehicle))
            || self.zones_allowing.iter().any(|z| z.applies_to(vehicle))
    }
}

/// An operator's or city's parking rule: geometries in which vehicles of
/// one provider and type may or may not be left. Deny geometries override
/// allow geometries where they overlap.
#[derive(Debug, Clone)]
pub struct GeometryParkingZone {
    pub provider_id: i32,
    pub vehicle_type: VehicleType,
    pub areas_allowed: Vec<Polygon<f64>>,
    pub areas_disallowed: Vec<Polygon<f64>>,
}

impl GeometryParkingZone {
    /// Whether this rule allows parking at `location`.
    fn allows_at(&self, location: Point<f64>) -> bool {
        if self
            .areas_disallowed
            .iter()
            .any(|area| area.contains(&location))
        {
            return false;
        }
        self.areas_allowed
            .iter()
            .any(|area| area.contains(&location))
    }
}

/// Evaluate every geometry rule against a location, producing the
/// [`ParkingZoneInfo`] to attach to the drop-off edges there.
pub fn parking_zones_at(location: Point<f64>, rules: &[GeometryParkingZone]) -> ParkingZoneInfo {
    let mut enabled = Vec::new();
    let mut allowing = Vec::new();
    for rule in rules {
        let zone = SingleParkingZone::new(rule.provider_id, rule.vehicle_type);
        if !enabled.contains(&zone) {
            enabled.push(zone);
        }
        if rule.allows_at(location) && !allowing.contains(&zone) {
            allowing.push(zone);
        }
    }
    ParkingZoneInfo::new(enabled, allowing)
}
