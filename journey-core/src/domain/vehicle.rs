//! Rentable vehicle snapshots from provider feeds.
//!
//! A [`VehicleDescription`] is a point-in-time record of one rentable
//! vehicle: where it stands, who operates it, how far it can still go, and
//! under which [pricing packages](crate::domain::PricingPackage) it can be
//! billed. The feed updater (outside this crate) deserializes these and
//! links them into the graph as temporary rent-vehicle vertices.

use super::{PricingPackage, TraverseMode};
use serde::{Deserialize, Serialize};

/// The kind of a rentable vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Motorbike,
    KickScooter,
    Bike,
}

impl VehicleType {
    /// The name the provider database uses for this vehicle type.
    pub fn feed_name(self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Bike => "bike",
            VehicleType::Motorbike => "scooter",
            VehicleType::KickScooter => "un-pedal-scooter",
        }
    }

    /// Parse the provider database name; `None` for unknown names.
    pub fn from_feed_name(name: &str) -> Option<VehicleType> {
        match name {
            "car" => Some(VehicleType::Car),
            "bike" => Some(VehicleType::Bike),
            "scooter" => Some(VehicleType::Motorbike),
            "un-pedal-scooter" => Some(VehicleType::KickScooter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Fossil,
    Electric,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gearbox {
    Manual,
    Automatic,
}

/// A vehicle sharing operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub provider_id: i32,
    pub provider_name: String,
}

impl Provider {
    pub fn new(provider_id: i32, provider_name: impl Into<String>) -> Self {
        Provider {
            provider_id,
            provider_name: provider_name.into(),
        }
    }
}

/// A point-in-time snapshot of one rentable vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDescription {
    pub provider_vehicle_id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub fuel_type: Option<FuelType>,
    #[serde(default)]
    pub gearbox: Option<Gearbox>,
    pub provider: Provider,
    /// Remaining range reported by the feed; absent means "assume the
    /// type's default".
    #[serde(default)]
    pub range_in_meters: Option<f64>,
    /// Billing schemes this vehicle can be rented under. All of them are
    /// tracked simultaneously while riding so the cheapest can be chosen
    /// retroactively; an empty list deserializes to one free package.
    #[serde(default = "default_packages")]
    pub pricing_packages: Vec<PricingPackage>,
}

fn default_packages() -> Vec<PricingPackage> {
    vec![PricingPackage::default()]
}

impl VehicleDescription {
    pub fn new(
        provider_vehicle_id: impl Into<String>,
        longitude: f64,
        latitude: f64,
        vehicle_type: VehicleType,
        provider: Provider,
    ) -> Self {
        VehicleDescription {
            provider_vehicle_id: provider_vehicle_id.into(),
            longitude,
            latitude,
            vehicle_type,
            fuel_type: None,
            gearbox: None,
            provider,
            range_in_meters: None,
            pricing_packages: default_packages(),
        }
    }

    /// The travel mode a rider is in while using this vehicle.
    pub fn traverse_mode(&self) -> TraverseMode {
        match self.vehicle_type {
            VehicleType::Car => TraverseMode::Car,
            VehicleType::Motorbike => TraverseMode::Motorbike,
            VehicleType::KickScooter => TraverseMode::KickScooter,
            VehicleType::Bike => TraverseMode::Bicycle,
        }
    }

    /// Remaining range, falling back to the type default when the feed did
    /// not report one.
    pub fn range_meters(&self) -> f64 {
        self.range_in_meters
            .unwrap_or_else(|| self.default_range_meters())
    }

    fn default_range_meters(&self) -> f64 {
        match self.vehicle_type {
            VehicleType::Car => 200_000.0,
            VehicleType::Motorbike => 60_000.0,
            VehicleType::KickScooter => 15_000.0,
            VehicleType::Bike => f64::MAX,
        }
    }

    /// Maximum speed of the vehicle, in meters per second.
    pub fn max_speed_mps(&self) -> f64 {
        match self.vehicle_type {
            VehicleType::Car => 40.0,
            VehicleType::Motorbike => 25.0,
            VehicleType::KickScooter => 6.0,
            VehicleType::Bike => 6.5,
        }
    }

    pub fn pricing_package(&self, index: usize) -> &PricingPackage {
        &self.pricing_packages[index]
    }
}
