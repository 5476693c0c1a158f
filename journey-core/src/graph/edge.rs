//! Graph edges.
//!
//! Edges are immutable, shared, read-mostly graph structure: a connection
//! between two vertices plus the data its traversal needs. The set of edge
//! kinds is closed on purpose — the reversal logic has to reason
//! exhaustively about kinds (e.g. "is this a rental-begin edge"), which an
//! open trait object would not allow. The traversal functions themselves
//! live in [`crate::search`].

use crate::domain::{StreetPermission, VehicleDescription};
use crate::graph::{EdgeId, ParkingZoneInfo, ServiceDay, TripPattern, VertexId};
use std::sync::Arc;

/// A street segment (or a street-to-stop link, with zero length).
#[derive(Debug, Clone)]
pub struct StreetEdgeData {
    pub length_meters: f64,
    pub permission: StreetPermission,
    pub wheelchair_accessible: bool,
    /// Streets flagged by the operator as unsuitable; traversing one marks
    /// the whole itinerary.
    pub not_recommended: bool,
}

impl StreetEdgeData {
    pub fn walkable(length_meters: f64) -> Self {
        StreetEdgeData {
            length_meters,
            permission: StreetPermission::ALL,
            wheelchair_accessible: true,
            not_recommended: false,
        }
    }
}

/// Boarding or alighting: the connection between a stop's platform side
/// and a position on board a pattern.
#[derive(Debug, Clone)]
pub struct BoardAlightData {
    pub pattern: Arc<TripPattern>,
    pub stop_index: usize,
    pub service_day: ServiceDay,
}

/// Riding between two consecutive stops of a pattern.
#[derive(Debug, Clone)]
pub struct PatternHopData {
    pub pattern: Arc<TripPattern>,
    /// Index of the stop this hop departs from; it arrives at `+ 1`.
    pub from_stop_index: usize,
}

/// Travelling one level in an elevator.
#[derive(Debug, Clone)]
pub struct ElevatorHopData {
    pub permission: StreetPermission,
    pub wheelchair_accessible: bool,
}

/// Picking up a specific rentable vehicle. A loop edge on the vehicle's
/// temporary vertex; carries parking verdicts because in a reversed replay
/// renting becomes dropping off.
#[derive(Debug, Clone)]
pub struct RentVehicleData {
    pub vehicle: Arc<VehicleDescription>,
    pub parking_zones: ParkingZoneInfo,
}

/// Dropping off the currently rented vehicle, gated by parking zones.
#[derive(Debug, Clone)]
pub struct DropoffVehicleData {
    pub parking_zones: ParkingZoneInfo,
}

/// The closed set of edge kinds.
#[derive(Debug, Clone)]
pub enum EdgeKind {
    Street(StreetEdgeData),
    /// Stop-depart vertex to pattern-depart vertex.
    Board(BoardAlightData),
    /// Pattern-arrive vertex to stop-arrive vertex.
    Alight(BoardAlightData),
    PatternHop(PatternHopData),
    ElevatorHop(ElevatorHopData),
    /// A synchronized transfer: the receiving vehicle waits, so there is
    /// no walking or schedule slack to model.
    TimedTransfer,
    /// No-op separator between itinerary legs.
    LegSwitch,
    RentVehicle(RentVehicleData),
    DropoffVehicle(DropoffVehicleData),
}

/// A directed connection between two vertices.
///
/// The request-privacy of the endpoints is denormalized onto the edge so
/// that state commits can police cross-request temporary vertices without
/// a graph lookup.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
    /// Whether `from` is a request-private temporary vertex.
    pub from_request_private: bool,
    /// Whether `to` is a request-private temporary vertex.
    pub to_request_private: bool,
    pub kind: EdgeKind,
}

impl Edge {
    /// Physical length of the edge, for edges that have one.
    pub fn distance_meters(&self) -> f64 {
        match &self.kind {
            EdgeKind::Street(street) => street.length_meters,
            EdgeKind::PatternHop(hop) => hop.pattern.hop_distances_m[hop.from_stop_index],
            _ => 0.0,
        }
    }

    pub fn is_board(&self) -> bool {
        matches!(self.kind, EdgeKind::Board(_))
    }

    pub fn is_alight(&self) -> bool {
        matches!(self.kind, EdgeKind::Alight(_))
    }

    pub fn is_rent_vehicle(&self) -> bool {
        matches!(self.kind, EdgeKind::RentVehicle(_))
    }

    pub fn is_dropoff_vehicle(&self) -> bool {
        matches!(self.kind, EdgeKind::DropoffVehicle(_))
    }
}
