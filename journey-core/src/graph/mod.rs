//! The street/transit network the search walks.
//!
//! The graph is read-mostly and shared between concurrent requests: the
//! search core never mutates it, and all request-scoped structure lives in
//! vertices tagged with the owning request. Construction from geographic
//! source data happens outside this crate; tests and callers assemble
//! graphs directly through [`Graph::add_vertex`] / [`Graph::add_edge`].

mod edge;
mod parking;
mod timetable;
mod vertex;

pub use edge::{
    BoardAlightData, DropoffVehicleData, Edge, EdgeKind, ElevatorHopData, PatternHopData,
    RentVehicleData, StreetEdgeData,
};
pub use parking::{GeometryParkingZone, ParkingZoneInfo, SingleParkingZone, parking_zones_at};
pub use timetable::{ServiceDay, TimetableError, TripPattern, TripTimes};
pub use vertex::{EdgeId, RequestId, Vertex, VertexId, VertexKind};

use crate::fare::TransitTicket;

/// The assembled network: vertices, edges, adjacency, and the ticket set
/// the fare engine prices against.
#[derive(Debug, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    tickets: Vec<TransitTicket>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn add_vertex(&mut self, label: impl Into<String>, kind: VertexKind) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            id,
            label: label.into(),
            kind,
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, kind: EdgeKind) -> EdgeId {
        assert!(
            (from.0 as usize) < self.vertices.len() && (to.0 as usize) < self.vertices.len(),
            "edge endpoints must be added to the graph first"
        );
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            from,
            to,
            from_request_private: self.vertex(from).is_request_private(),
            to_request_private: self.vertex(to).is_request_private(),
            kind,
        });
        self.outgoing[from.0 as usize].push(id);
        self.incoming[to.0 as usize].push(id);
        id
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0 as usize]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.outgoing[vertex.0 as usize]
            .iter()
            .map(|&id| self.edge(id))
    }

    pub fn incoming(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.incoming[vertex.0 as usize]
            .iter()
            .map(|&id| self.edge(id))
    }

    /// Tickets purchasable on this network, consumed by the fare engine.
    pub fn available_tickets(&self) -> &[TransitTicket] {
        &self.tickets
    }

    pub fn add_ticket(&mut self, ticket: TransitTicket) {
        self.tickets.push(ticket);
    }
}
