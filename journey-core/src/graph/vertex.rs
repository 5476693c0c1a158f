//! Graph vertices.

use crate::domain::{Stop, VehicleDescription};
use crate::graph::TripPattern;
use std::fmt;
use std::sync::Arc;

/// Index of a vertex in its [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Index of an edge in its [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Identifies one in-flight trip planning request.
///
/// The permanent graph is shared between concurrent requests; vertices
/// injected for a single request (origin/destination split points) are
/// tagged with the request they belong to so that one search can never
/// wander onto another request's temporary structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// What a vertex is, and the data the traversal logic needs from it.
#[derive(Debug, Clone)]
pub enum VertexKind {
    /// A point on the street network.
    Street,
    /// A transit stop as a place in the world.
    TransitStop { stop: Arc<Stop> },
    /// The "about to board" side of a stop; boarding edges leave from here.
    StopDepart { stop: Arc<Stop> },
    /// The "just alighted" side of a stop.
    StopArrive { stop: Arc<Stop> },
    /// On board a vehicle of `pattern`, about to depart its `stop_index`-th stop.
    PatternDepart {
        pattern: Arc<TripPattern>,
        stop_index: usize,
    },
    /// On board a vehicle of `pattern`, arriving at its `stop_index`-th stop.
    PatternArrive {
        pattern: Arc<TripPattern>,
        stop_index: usize,
    },
    /// Request-scoped endpoint injected by origin/destination linking.
    TemporaryEndpoint { request: RequestId },
    /// A rentable vehicle's position, linked in by the vehicle updater.
    /// Shared between requests even though its lifetime is tied to feed
    /// updates rather than to the permanent graph.
    TemporaryRentVehicle { vehicle: Arc<VehicleDescription> },
    /// Street split point created when linking a rentable vehicle.
    TemporaryRentSplitter,
}

/// A node of the street/transit network.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub label: String,
    pub kind: VertexKind,
}

impl Vertex {
    /// The stop this vertex belongs to, for stop-attached vertex kinds.
    pub fn stop(&self) -> Option<&Arc<Stop>> {
        match &self.kind {
            VertexKind::TransitStop { stop }
            | VertexKind::StopDepart { stop }
            | VertexKind::StopArrive { stop } => Some(stop),
            VertexKind::PatternDepart {
                pattern,
                stop_index,
            }
            | VertexKind::PatternArrive {
                pattern,
                stop_index,
            } => pattern.stops.get(*stop_index),
            _ => None,
        }
    }

    /// Whether this vertex exists only for the duration of one request.
    ///
    /// Rent-vehicle vertices and their splitters are excluded: they are
    /// created by feed updates and legitimately shared between requests.
    pub fn is_request_private(&self) -> bool {
        matches!(self.kind, VertexKind::TemporaryEndpoint { .. })
    }

    pub fn is_stop_depart(&self) -> bool {
        matches!(self.kind, VertexKind::StopDepart { .. })
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id.0)
    }
}
