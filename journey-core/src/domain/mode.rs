//! Travel modes and street traversal permissions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The mode of travel associated with a state or an edge traversal.
///
/// This is a closed set: the traversal and reversal logic reasons
/// exhaustively about modes, and per-mode accumulators are stored in
/// fixed-size tables indexed by [`TraverseMode::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraverseMode {
    Walk,
    Bicycle,
    Car,
    Motorbike,
    KickScooter,
    Transit,
    /// No-op separator between itinerary legs. A path consisting solely of
    /// leg-switch traversals carries no actual travel and is rejected.
    LegSwitch,
}

impl TraverseMode {
    /// Number of distinct modes; the size of per-mode accumulator tables.
    pub const COUNT: usize = 7;

    /// All modes, in index order.
    pub const ALL: [TraverseMode; Self::COUNT] = [
        TraverseMode::Walk,
        TraverseMode::Bicycle,
        TraverseMode::Car,
        TraverseMode::Motorbike,
        TraverseMode::KickScooter,
        TraverseMode::Transit,
        TraverseMode::LegSwitch,
    ];

    /// Stable index of this mode into per-mode tables.
    pub fn index(self) -> usize {
        match self {
            TraverseMode::Walk => 0,
            TraverseMode::Bicycle => 1,
            TraverseMode::Car => 2,
            TraverseMode::Motorbike => 3,
            TraverseMode::KickScooter => 4,
            TraverseMode::Transit => 5,
            TraverseMode::LegSwitch => 6,
        }
    }

    /// True for modes that drive on the roadway (relevant for pre-transit
    /// time accounting in park-and-ride searches).
    pub fn is_driving(self) -> bool {
        matches!(self, TraverseMode::Car | TraverseMode::Motorbike)
    }
}

impl fmt::Display for TraverseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraverseMode::Walk => "WALK",
            TraverseMode::Bicycle => "BICYCLE",
            TraverseMode::Car => "CAR",
            TraverseMode::Motorbike => "MOTORBIKE",
            TraverseMode::KickScooter => "KICKSCOOTER",
            TraverseMode::Transit => "TRANSIT",
            TraverseMode::LegSwitch => "LEG_SWITCH",
        };
        write!(f, "{name}")
    }
}

/// Which modes may traverse a street segment, as a bitmask.
///
/// # Examples
///
/// ```
/// use journey_core::domain::{StreetPermission, TraverseMode};
///
/// let p = StreetPermission::PEDESTRIAN | StreetPermission::BICYCLE;
/// assert!(p.allows(TraverseMode::Walk));
/// assert!(p.allows(TraverseMode::Bicycle));
/// assert!(!p.allows(TraverseMode::Car));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetPermission(u8);

impl StreetPermission {
    pub const NONE: StreetPermission = StreetPermission(0);
    pub const PEDESTRIAN: StreetPermission = StreetPermission(1);
    pub const BICYCLE: StreetPermission = StreetPermission(2);
    pub const CAR: StreetPermission = StreetPermission(4);
    pub const ALL: StreetPermission = StreetPermission(7);

    /// Whether this permission set contains every bit of `other`.
    pub fn contains(self, other: StreetPermission) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the given travel mode may use the street.
    ///
    /// Rented kick scooters and motorbikes follow the bicycle and car
    /// permission classes respectively; transit and leg switches never
    /// use street segments.
    pub fn allows(self, mode: TraverseMode) -> bool {
        match mode {
            TraverseMode::Walk => self.contains(Self::PEDESTRIAN),
            TraverseMode::Bicycle | TraverseMode::KickScooter => self.contains(Self::BICYCLE),
            TraverseMode::Car | TraverseMode::Motorbike => self.contains(Self::CAR),
            TraverseMode::Transit | TraverseMode::LegSwitch => false,
        }
    }
}

impl std::ops::BitOr for StreetPermission {
    type Output = StreetPermission;

    fn bitor(self, rhs: StreetPermission) -> StreetPermission {
        StreetPermission(self.0 | rhs.0)
    }
}
