//! Integration tests for the state engine: editor invariants, edge
//! traversal, rental pricing, and path reversal over small hand-built
//! graphs.

use crate::domain::{
    FeedScopedId, Money, PricingPackage, Provider, Route, Stop, StreetPermission, TraverseMode,
    VehicleDescription, VehicleType,
};
use crate::fare::{transit_stages, TransitPriceCalculator, TransitTicket, TripDescription};
use crate::graph::{
    BoardAlightData, DropoffVehicleData, EdgeId, EdgeKind, ElevatorHopData, Graph,
    ParkingZoneInfo, PatternHopData, RentVehicleData, RequestId, ServiceDay, SingleParkingZone,
    StreetEdgeData, TripPattern, TripTimes, VertexId, VertexKind,
};
use crate::search::{
    reverse, reverse_and_optimize, RoutingConfig, StateArena, StateEditor, StateId,
};
use std::sync::Arc;

fn walk_config() -> Arc<RoutingConfig> {
    Arc::new(RoutingConfig {
        walk_speed_mps: 1.0,
        ..RoutingConfig::default()
    })
}

fn street(length: f64) -> EdgeKind {
    EdgeKind::Street(StreetEdgeData::walkable(length))
}

fn chain_of(arena: &StateArena, goal: StateId) -> Vec<(VertexId, i64)> {
    let mut chain = Vec::new();
    let mut cursor = Some(goal);
    while let Some(id) = cursor {
        let state = arena.get(id);
        chain.push((state.vertex(), state.time_seconds()));
        cursor = state.back_state();
    }
    chain.reverse();
    chain
}

/* Street traversal and editor invariants. */

#[test]
fn street_traversal_accumulates() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(100.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let child = graph.edge(ab).traverse(&mut arena, origin).unwrap();

    let state = arena.get(child);
    assert_eq!(state.vertex(), b);
    assert_eq!(state.time_seconds(), 100);
    assert_eq!(state.weight(), 200.0); // 100 s at walk reluctance 2.0
    assert_eq!(state.traverse_distance_meters(), 100.0);
    assert_eq!(state.stats().walk_distance(), 100.0);
    assert_eq!(state.stats().time_in(TraverseMode::Walk), 100);
    assert_eq!(state.back_state(), Some(origin));
    assert_eq!(state.back_edge(), Some(ab));
    assert_eq!(state.back_mode(), Some(TraverseMode::Walk));
    assert!(state.weight() >= arena.get(origin).weight());
}

#[test]
fn walk_limit_prunes() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(100.0));

    let config = Arc::new(RoutingConfig {
        walk_speed_mps: 1.0,
        max_walk_distance_meters: 50.0,
        ..RoutingConfig::default()
    });
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, config);

    assert!(graph.edge(ab).traverse(&mut arena, origin).is_none());
}

#[test]
fn street_permission_prunes() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(
        a,
        b,
        EdgeKind::Street(StreetEdgeData {
            length_meters: 100.0,
            permission: StreetPermission::CAR,
            wheelchair_accessible: true,
            not_recommended: false,
        }),
    );

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());

    assert!(graph.edge(ab).traverse(&mut arena, origin).is_none());
}

#[test]
fn wheelchair_requirement_prunes() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(
        a,
        b,
        EdgeKind::Street(StreetEdgeData {
            length_meters: 10.0,
            permission: StreetPermission::ALL,
            wheelchair_accessible: false,
            not_recommended: false,
        }),
    );

    let config = Arc::new(RoutingConfig {
        wheelchair_accessible: true,
        walk_speed_mps: 1.0,
        ..RoutingConfig::default()
    });
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, config);

    assert!(graph.edge(ab).traverse(&mut arena, origin).is_none());
}

#[test]
fn not_recommended_street_marks_itinerary() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(
        a,
        b,
        EdgeKind::Street(StreetEdgeData {
            length_meters: 10.0,
            permission: StreetPermission::ALL,
            wheelchair_accessible: true,
            not_recommended: true,
        }),
    );

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let child = graph.edge(ab).traverse(&mut arena, origin).unwrap();

    assert!(!arena.get(origin).used_not_recommended_route());
    assert!(arena.get(child).used_not_recommended_route());
}

#[test]
fn disconnected_edge_yields_no_state() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let _b = graph.add_vertex("b", VertexKind::Street);
    let c = graph.add_vertex("c", VertexKind::Street);
    let d = graph.add_vertex("d", VertexKind::Street);
    let cd = graph.add_edge(c, d, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());

    assert!(graph.edge(cd).traverse(&mut arena, origin).is_none());
}

#[test]
fn negative_time_increment_marks_editor_defective() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(ab).clone();

    let mut editor = arena.edit(origin, &edge);
    editor.increment_time_seconds(-5);
    assert!(editor.commit().is_none());
}

#[test]
fn nan_weight_marks_editor_defective() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(ab).clone();

    let mut editor = arena.edit(origin, &edge);
    editor.increment_weight(f64::NAN);
    assert!(editor.commit().is_none());
}

#[test]
fn negative_weight_increment_marks_editor_defective() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(ab).clone();

    let mut editor = arena.edit(origin, &edge);
    editor.increment_weight(-1.0);
    assert!(editor.commit().is_none());
}

#[test]
fn negative_distance_increment_marks_editor_defective() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(ab).clone();

    let mut editor = arena.edit(origin, &edge);
    editor.increment_walk_distance_meters(-1.0);
    assert!(editor.commit().is_none());
}

#[test]
fn time_against_search_direction_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(ab).clone();

    // Forward search, but the child lands earlier than its parent.
    let mut editor = arena.edit(origin, &edge);
    editor.set_time_seconds(-50);
    assert!(editor.commit().is_none());
}

#[test]
fn transfer_limit_rejects_commit() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));

    let config = Arc::new(RoutingConfig {
        max_transfers: 0,
        walk_speed_mps: 1.0,
        ..RoutingConfig::default()
    });
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, config);
    let edge = graph.edge(ab).clone();

    let mut editor = arena.edit(origin, &edge);
    editor.set_num_boardings(2); // limit is max_transfers + 1 = 1
    assert!(editor.commit().is_none());
}

#[test]
fn cross_request_temporary_vertex_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let t = graph.add_vertex(
        "origin-split",
        VertexKind::TemporaryEndpoint {
            request: RequestId(42),
        },
    );
    let at = graph.add_edge(a, t, street(10.0));

    // This request never registered the temporary vertex: some other
    // in-flight request owns it.
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    assert!(graph.edge(at).traverse(&mut arena, origin).is_none());

    // The owning request lists it and may traverse onto it.
    let mut owning = RoutingConfig {
        walk_speed_mps: 1.0,
        ..RoutingConfig::default()
    };
    owning.temporary_vertices.insert(t);
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, Arc::new(owning));
    assert!(graph.edge(at).traverse(&mut arena, origin).is_some());
}

#[test]
fn state_data_is_shared_until_written() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let c = graph.add_vertex("c", VertexKind::Street);
    let d = graph.add_vertex("d", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));
    let bc = graph.add_edge(b, c, street(10.0));
    let cd = graph.add_edge(c, d, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let s1 = graph.edge(ab).traverse(&mut arena, origin).unwrap();
    let s2 = graph.edge(bc).traverse(&mut arena, s1).unwrap();

    // The second street traversal changes no data field, so the block is
    // still the first child's allocation.
    assert!(Arc::ptr_eq(&arena.get(s1).data, &arena.get(s2).data));

    // Writing a field clones the block; ancestors keep their view.
    let edge = graph.edge(cd).clone();
    let mut editor = arena.edit(s2, &edge);
    editor.set_zone(Some("9".into()));
    editor.increment_time_seconds(10);
    let s3 = editor.commit().unwrap();

    assert!(!Arc::ptr_eq(&arena.get(s2).data, &arena.get(s3).data));
    assert_eq!(arena.get(s3).data().zone.as_deref(), Some("9"));
    assert_eq!(arena.get(s2).data().zone, None);
    assert_eq!(arena.get(s1).data().zone, None);
    assert_eq!(arena.get(origin).data().zone, None);
}

#[test]
fn initial_editor_produces_root_state() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let _ = graph;

    let mut arena = StateArena::new();
    let editor = StateEditor::initial(&mut arena, a, walk_config());
    let root = editor.commit().unwrap();

    let state = arena.get(root);
    assert_eq!(state.vertex(), a);
    assert_eq!(state.time_seconds(), 0);
    assert_eq!(state.weight(), 0.0);
    assert!(state.back_state().is_none());
}

/* Elevator, timed transfer, leg switch. */

#[test]
fn elevator_hop_costs_fixed_time_and_weight() {
    let mut graph = Graph::new();
    let lower = graph.add_vertex("elevator-0", VertexKind::Street);
    let upper = graph.add_vertex("elevator-1", VertexKind::Street);
    let hop = graph.add_edge(
        lower,
        upper,
        EdgeKind::ElevatorHop(ElevatorHopData {
            permission: StreetPermission::PEDESTRIAN,
            wheelchair_accessible: true,
        }),
    );

    let mut arena = StateArena::new();
    let origin = arena.new_origin(lower, walk_config());
    let child = graph.edge(hop).traverse(&mut arena, origin).unwrap();

    let state = arena.get(child);
    assert_eq!(state.time_seconds(), 20);
    assert_eq!(state.weight(), 20.0);
    assert_eq!(state.back_mode(), Some(TraverseMode::Walk));
}

#[test]
fn elevator_hop_respects_permission() {
    let mut graph = Graph::new();
    let lower = graph.add_vertex("elevator-0", VertexKind::Street);
    let upper = graph.add_vertex("elevator-1", VertexKind::Street);
    let hop = graph.add_edge(
        lower,
        upper,
        EdgeKind::ElevatorHop(ElevatorHopData {
            permission: StreetPermission::NONE,
            wheelchair_accessible: true,
        }),
    );

    let mut arena = StateArena::new();
    let origin = arena.new_origin(lower, walk_config());
    assert!(graph.edge(hop).traverse(&mut arena, origin).is_none());
}

#[test]
fn timed_transfer_is_nearly_free() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("arrive", VertexKind::Street);
    let b = graph.add_vertex("depart", VertexKind::Street);
    let transfer = graph.add_edge(a, b, EdgeKind::TimedTransfer);

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let child = graph.edge(transfer).traverse(&mut arena, origin).unwrap();

    let state = arena.get(child);
    assert_eq!(state.time_seconds(), 0);
    assert_eq!(state.weight(), 1.0);
}

#[test]
fn leg_switch_only_path_is_trivial() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let c = graph.add_vertex("c", VertexKind::Street);
    let ab = graph.add_edge(a, b, EdgeKind::LegSwitch);
    let bc = graph.add_edge(b, c, EdgeKind::LegSwitch);
    let cb_street = graph.add_edge(c, b, street(10.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    assert!(arena.path_is_trivial(origin));

    let s1 = graph.edge(ab).traverse(&mut arena, origin).unwrap();
    let s2 = graph.edge(bc).traverse(&mut arena, s1).unwrap();
    assert!(arena.path_is_trivial(s2));

    let s3 = graph.edge(cb_street).traverse(&mut arena, s2).unwrap();
    assert!(!arena.path_is_trivial(s3));
}

/* Vehicle rental. */

fn scooter(provider_id: i32) -> Arc<VehicleDescription> {
    let mut vehicle = VehicleDescription::new(
        "sc-1",
        21.0,
        52.2,
        VehicleType::KickScooter,
        Provider::new(provider_id, "blinkee"),
    );
    vehicle.pricing_packages = vec![
        // Pay per started minute.
        PricingPackage {
            price_per_minute: Money::from_cents(300),
            ..PricingPackage::default()
        },
        // Flat bundle.
        PricingPackage {
            start_price: Money::from_cents(300),
            ..PricingPackage::default()
        },
    ];
    Arc::new(vehicle)
}

struct RentalFixture {
    graph: Graph,
    v: VertexId,
    rent: EdgeId,
    rent_other: EdgeId,
    ride_vw: EdgeId,
    ride_wx: EdgeId,
    dropoff: EdgeId,
    dropoff_gated: EdgeId,
}

fn rental_fixture() -> RentalFixture {
    let vehicle = scooter(1);
    let mut graph = Graph::new();
    let v = graph.add_vertex(
        "vehicle",
        VertexKind::TemporaryRentVehicle {
            vehicle: vehicle.clone(),
        },
    );
    let w = graph.add_vertex("w", VertexKind::Street);
    let x = graph.add_vertex("x", VertexKind::Street);

    let rent = graph.add_edge(
        v,
        v,
        EdgeKind::RentVehicle(RentVehicleData {
            vehicle: vehicle.clone(),
            parking_zones: ParkingZoneInfo::default(),
        }),
    );
    let rent_other = graph.add_edge(
        v,
        v,
        EdgeKind::RentVehicle(RentVehicleData {
            vehicle: scooter(2),
            parking_zones: ParkingZoneInfo::default(),
        }),
    );
    let ride_vw = graph.add_edge(v, w, street(600.0));
    let ride_wx = graph.add_edge(w, x, street(600.0));
    let dropoff = graph.add_edge(
        x,
        x,
        EdgeKind::DropoffVehicle(DropoffVehicleData {
            parking_zones: ParkingZoneInfo::default(),
        }),
    );
    // A provider rule is in force here and nothing allows this spot.
    let dropoff_gated = graph.add_edge(
        x,
        x,
        EdgeKind::DropoffVehicle(DropoffVehicleData {
            parking_zones: ParkingZoneInfo::new(
                vec![SingleParkingZone::new(1, VehicleType::KickScooter)],
                vec![],
            ),
        }),
    );

    RentalFixture {
        graph,
        v,
        rent,
        rent_other,
        ride_vw,
        ride_wx,
        dropoff,
        dropoff_gated,
    }
}

fn assert_active_package_is_cheapest(arena: &StateArena, state: StateId) {
    let state = arena.get(state);
    let cheapest = (0..state.package_prices().len())
        .map(|index| state.package_total(index))
        .min();
    assert_eq!(Some(state.package_total(state.active_package_index())), cheapest);
}

#[test]
fn rental_tracks_cheapest_package() {
    let fixture = rental_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, walk_config());

    // Rent: 30 s setup, boarding counted, per-minute package starts free.
    let rented = fixture
        .graph
        .edge(fixture.rent)
        .traverse(&mut arena, origin)
        .unwrap();
    {
        let state = arena.get(rented);
        assert!(state.is_renting_vehicle());
        assert_eq!(state.num_boardings(), 1);
        assert_eq!(state.time_seconds(), 30);
        assert_eq!(state.weight(), 120.0); // 30 s * renting 2.0 + penalty 60
        assert_eq!(state.active_package_index(), 0);
        assert_eq!(state.package_total(0), Money::ZERO);
        assert_eq!(state.package_total(1), Money::from_cents(300));
        assert_eq!(state.non_transit_mode(), TraverseMode::KickScooter);
    }
    assert_active_package_is_cheapest(&arena, rented);

    // Ride 600 m at 6 m/s: 100 s in the vehicle makes the per-minute
    // package cost 2 started minutes (6.00) while the bundle stays at
    // 3.00 — the active package flips retroactively.
    let ridden = fixture
        .graph
        .edge(fixture.ride_vw)
        .traverse(&mut arena, rented)
        .unwrap();
    {
        let state = arena.get(ridden);
        assert_eq!(state.time_in_vehicle_seconds(), 100);
        assert_eq!(state.package_total(0), Money::from_cents(600));
        assert_eq!(state.package_total(1), Money::from_cents(300));
        assert_eq!(state.active_package_index(), 1);
    }
    assert_active_package_is_cheapest(&arena, ridden);

    let ridden_far = fixture
        .graph
        .edge(fixture.ride_wx)
        .traverse(&mut arena, ridden)
        .unwrap();
    assert_active_package_is_cheapest(&arena, ridden_far);

    // Drop off: the cheapest package's final price lands in the
    // traversal price and the rental context clears.
    let dropped = fixture
        .graph
        .edge(fixture.dropoff)
        .traverse(&mut arena, ridden_far)
        .unwrap();
    let state = arena.get(dropped);
    assert!(!state.is_renting_vehicle());
    assert_eq!(state.traversal_price(), Money::from_cents(300));
    assert!(state.package_prices().is_empty());
    assert_eq!(state.non_transit_mode(), TraverseMode::Walk);
}

#[test]
fn renting_while_renting_is_illegal() {
    let fixture = rental_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, walk_config());
    let rented = fixture
        .graph
        .edge(fixture.rent)
        .traverse(&mut arena, origin)
        .unwrap();

    assert!(fixture
        .graph
        .edge(fixture.rent_other)
        .traverse(&mut arena, rented)
        .is_none());
}

#[test]
fn dropoff_is_gated_by_parking_zones() {
    let fixture = rental_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, walk_config());
    let rented = fixture
        .graph
        .edge(fixture.rent)
        .traverse(&mut arena, origin)
        .unwrap();
    let ridden = fixture
        .graph
        .edge(fixture.ride_vw)
        .traverse(&mut arena, rented)
        .unwrap();
    let at_x = fixture
        .graph
        .edge(fixture.ride_wx)
        .traverse(&mut arena, ridden)
        .unwrap();

    assert!(fixture
        .graph
        .edge(fixture.dropoff_gated)
        .traverse(&mut arena, at_x)
        .is_none());
    assert!(fixture
        .graph
        .edge(fixture.dropoff)
        .traverse(&mut arena, at_x)
        .is_some());
}

#[test]
fn dropoff_without_vehicle_is_not_traversable() {
    let fixture = rental_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, walk_config());
    let walked = fixture
        .graph
        .edge(fixture.ride_vw)
        .traverse(&mut arena, origin)
        .unwrap();
    let at_x = fixture
        .graph
        .edge(fixture.ride_wx)
        .traverse(&mut arena, walked)
        .unwrap();

    assert!(fixture
        .graph
        .edge(fixture.dropoff)
        .traverse(&mut arena, at_x)
        .is_none());
}

#[test]
fn vehicle_range_prunes_streets() {
    let mut vehicle = (*scooter(1)).clone();
    vehicle.range_in_meters = Some(500.0);
    let vehicle = Arc::new(vehicle);

    let mut graph = Graph::new();
    let v = graph.add_vertex(
        "vehicle",
        VertexKind::TemporaryRentVehicle {
            vehicle: vehicle.clone(),
        },
    );
    let w = graph.add_vertex("w", VertexKind::Street);
    let rent = graph.add_edge(
        v,
        v,
        EdgeKind::RentVehicle(RentVehicleData {
            vehicle,
            parking_zones: ParkingZoneInfo::default(),
        }),
    );
    let ride = graph.add_edge(v, w, street(600.0));

    let mut arena = StateArena::new();
    let origin = arena.new_origin(v, walk_config());
    let rented = graph.edge(rent).traverse(&mut arena, origin).unwrap();

    assert!(graph.edge(ride).traverse(&mut arena, rented).is_none());
}

#[test]
fn final_state_conditions() {
    let fixture = rental_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, walk_config());
    assert!(arena.get(origin).is_final());

    let rented = fixture
        .graph
        .edge(fixture.rent)
        .traverse(&mut arena, origin)
        .unwrap();
    assert!(!arena.get(rented).is_final());

    let force_transit = Arc::new(RoutingConfig {
        force_transit: true,
        ..RoutingConfig::default()
    });
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.v, force_transit);
    assert!(!arena.get(origin).is_final());
}

/* Transit journeys and reversal. */

fn ztm_route(name: &str) -> Arc<Route> {
    Arc::new(Route::new(FeedScopedId::new("ZTM", name), "ZTM", name, ""))
}

fn ztm_stop(name: &str, zone: &str) -> Arc<Stop> {
    Arc::new(Stop::new(
        FeedScopedId::new("ZTM", name),
        name,
        Some(zone.into()),
    ))
}

struct TransitFixture {
    graph: Graph,
    a: VertexId,
    b: VertexId,
    pd1: VertexId,
    street_a: EdgeId,
    board1: EdgeId,
    hop1: EdgeId,
    alight1: EdgeId,
    transfer: EdgeId,
    board2: EdgeId,
    hop2: EdgeId,
    alight2: EdgeId,
    street_b: EdgeId,
}

/// Walk 300 s to a stop, ride line 105 (departures at 600 and 840,
/// 300 s ride), walk 60 s to another platform, ride line 13 (one
/// departure at 1260, 300 s ride), walk 10 s to the goal.
///
/// A forward search from t = 0 boards the 600 departure and then waits
/// 300 s at the transfer; reverse optimization can take the 840 departure
/// instead and move the slack to the start of the trip.
fn transit_fixture() -> TransitFixture {
    let stop_x = ztm_stop("x", "2");
    let stop_y = ztm_stop("y", "1");
    let stop_z = ztm_stop("z", "1");
    let day = ServiceDay::new(0);

    let pattern1 = Arc::new(
        TripPattern::new(
            ztm_route("105"),
            vec![stop_x.clone(), stop_y.clone()],
            vec![
                TripTimes {
                    trip_id: FeedScopedId::new("ZTM", "105-a"),
                    arrivals: vec![600, 900],
                    departures: vec![600, 900],
                },
                TripTimes {
                    trip_id: FeedScopedId::new("ZTM", "105-b"),
                    arrivals: vec![840, 1140],
                    departures: vec![840, 1140],
                },
            ],
            vec![2_000.0],
        )
        .unwrap(),
    );
    let pattern2 = Arc::new(
        TripPattern::new(
            ztm_route("13"),
            vec![stop_y.clone(), stop_z.clone()],
            vec![TripTimes {
                trip_id: FeedScopedId::new("ZTM", "13-a"),
                arrivals: vec![1260, 1560],
                departures: vec![1260, 1560],
            }],
            vec![3_000.0],
        )
        .unwrap(),
    );

    let mut graph = Graph::new();
    let a = graph.add_vertex("origin", VertexKind::Street);
    let sd1 = graph.add_vertex("x-depart", VertexKind::StopDepart { stop: stop_x });
    let pd1 = graph.add_vertex(
        "105-at-x",
        VertexKind::PatternDepart {
            pattern: pattern1.clone(),
            stop_index: 0,
        },
    );
    let pa1 = graph.add_vertex(
        "105-at-y",
        VertexKind::PatternArrive {
            pattern: pattern1.clone(),
            stop_index: 1,
        },
    );
    let sa1 = graph.add_vertex("y-arrive", VertexKind::StopArrive { stop: stop_y.clone() });
    let sd2 = graph.add_vertex("y-depart", VertexKind::StopDepart { stop: stop_y });
    let pd2 = graph.add_vertex(
        "13-at-y",
        VertexKind::PatternDepart {
            pattern: pattern2.clone(),
            stop_index: 0,
        },
    );
    let pa2 = graph.add_vertex(
        "13-at-z",
        VertexKind::PatternArrive {
            pattern: pattern2.clone(),
            stop_index: 1,
        },
    );
    let sa2 = graph.add_vertex("z-arrive", VertexKind::StopArrive { stop: stop_z });
    let b = graph.add_vertex("goal", VertexKind::Street);

    let street_a = graph.add_edge(a, sd1, street(300.0));
    let board1 = graph.add_edge(
        sd1,
        pd1,
        EdgeKind::Board(BoardAlightData {
            pattern: pattern1.clone(),
            stop_index: 0,
            service_day: day,
        }),
    );
    let hop1 = graph.add_edge(
        pd1,
        pa1,
        EdgeKind::PatternHop(PatternHopData {
            pattern: pattern1.clone(),
            from_stop_index: 0,
        }),
    );
    let alight1 = graph.add_edge(
        pa1,
        sa1,
        EdgeKind::Alight(BoardAlightData {
            pattern: pattern1,
            stop_index: 1,
            service_day: day,
        }),
    );
    let transfer = graph.add_edge(sa1, sd2, street(60.0));
    let board2 = graph.add_edge(
        sd2,
        pd2,
        EdgeKind::Board(BoardAlightData {
            pattern: pattern2.clone(),
            stop_index: 0,
            service_day: day,
        }),
    );
    let hop2 = graph.add_edge(
        pd2,
        pa2,
        EdgeKind::PatternHop(PatternHopData {
            pattern: pattern2.clone(),
            from_stop_index: 0,
        }),
    );
    let alight2 = graph.add_edge(
        pa2,
        sa2,
        EdgeKind::Alight(BoardAlightData {
            pattern: pattern2,
            stop_index: 1,
            service_day: day,
        }),
    );
    let street_b = graph.add_edge(sa2, b, street(10.0));

    TransitFixture {
        graph,
        a,
        b,
        pd1,
        street_a,
        board1,
        hop1,
        alight1,
        transfer,
        board2,
        hop2,
        alight2,
        street_b,
    }
}

fn forward_journey(fixture: &TransitFixture, arena: &mut StateArena) -> StateId {
    let origin = arena.new_origin(fixture.a, walk_config());
    let edges = [
        fixture.street_a,
        fixture.board1,
        fixture.hop1,
        fixture.alight1,
        fixture.transfer,
        fixture.board2,
        fixture.hop2,
        fixture.alight2,
        fixture.street_b,
    ];
    let mut state = origin;
    for edge in edges {
        state = fixture
            .graph
            .edge(edge)
            .traverse(arena, state)
            .unwrap_or_else(|| panic!("edge {edge:?} must be traversable"));
    }
    state
}

#[test]
fn transit_journey_accumulates() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let goal = forward_journey(&fixture, &mut arena);

    let state = arena.get(goal);
    assert_eq!(state.vertex(), fixture.b);
    assert_eq!(state.time_seconds(), 1_570);
    assert_eq!(state.elapsed_time_seconds(), 1_570);
    assert_eq!(state.weight(), 2_060.0);
    assert_eq!(state.num_boardings(), 2);
    assert!(state.is_ever_boarded());
    assert_eq!(state.data().initial_wait_time, 300);
    assert_eq!(state.stats().walk_distance(), 370.0);
    assert_eq!(state.stats().distance_in(TraverseMode::Transit), 5_000.0);
    assert_eq!(state.data().zone.as_deref(), Some("1"));
    assert_eq!(
        state.data().route_sequence,
        vec![FeedScopedId::new("ZTM", "105"), FeedScopedId::new("ZTM", "13")]
    );
    // 300 s active, next trip arrives 240 s after the one used.
    assert!(state.is_final());
}

#[test]
fn alighting_records_next_arrival_delta() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.a, walk_config());
    let s1 = fixture
        .graph
        .edge(fixture.street_a)
        .traverse(&mut arena, origin)
        .unwrap();
    let s2 = fixture
        .graph
        .edge(fixture.board1)
        .traverse(&mut arena, s1)
        .unwrap();
    let s3 = fixture
        .graph
        .edge(fixture.hop1)
        .traverse(&mut arena, s2)
        .unwrap();
    let s4 = fixture
        .graph
        .edge(fixture.alight1)
        .traverse(&mut arena, s3)
        .unwrap();

    // The used trip arrives at 900; the next at 1140.
    assert_eq!(arena.get(s4).data().last_next_arrival_delta, 240);
    assert_eq!(arena.get(s4).data().last_alighted_time, 900);
    assert!(arena.get(s4).data().trip.is_none());
}

#[test]
fn boarding_without_a_connecting_trip_prunes() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let config = Arc::new(RoutingConfig {
        walk_speed_mps: 1.0,
        time: chrono::DateTime::from_timestamp(2_000, 0).unwrap(),
        ..RoutingConfig::default()
    });
    let origin = arena.new_origin(fixture.a, config);
    let s1 = fixture
        .graph
        .edge(fixture.street_a)
        .traverse(&mut arena, origin)
        .unwrap();

    // Last departure of line 105 left at 840.
    assert!(fixture
        .graph
        .edge(fixture.board1)
        .traverse(&mut arena, s1)
        .is_none());
}

#[test]
fn fare_stages_project_from_path() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let goal = forward_journey(&fixture, &mut arena);

    let stages = transit_stages(&arena, &fixture.graph, goal);
    assert_eq!(stages.len(), 4);

    assert_eq!(stages[0].route.short_name, "105");
    assert_eq!(stages[0].minute, 1);
    assert_eq!(stages[0].distance_meters, 0.0);
    assert_eq!(stages[0].stop.name, "x");

    assert_eq!(stages[1].minute, 6);
    assert_eq!(stages[1].distance_meters, 2_000.0);
    assert_eq!(stages[1].stop.name, "y");

    assert_eq!(stages[2].route.short_name, "13");
    assert_eq!(stages[2].minute, 12);
    assert_eq!(stages[2].distance_meters, 0.0);

    assert_eq!(stages[3].minute, 17);
    assert_eq!(stages[3].distance_meters, 3_000.0);
    assert_eq!(stages[3].stop.name, "z");

    // End to end: the projected stages price as one 20-minute ticket.
    let trip = TripDescription::new(stages).unwrap();
    assert_eq!(trip.fares().len(), 2);
    let mut ticket = TransitTicket::builder(0, "20-minute", Money::from_cents(340))
        .time_limit(20)
        .build();
    ticket.add_allowed_agency("ZTM");
    let calculator = TransitPriceCalculator::new(vec![ticket]);
    assert_eq!(
        calculator.compute_price(&trip).price,
        Money::from_cents(340)
    );
}

#[test]
fn structural_reverse_preserves_duration_and_weight() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let goal = forward_journey(&fixture, &mut arena);

    let reversed = reverse(&mut arena, &fixture.graph, goal);
    let state = arena.get(reversed);

    assert_eq!(state.vertex(), fixture.a);
    assert_eq!(state.time_seconds(), 0);
    assert_eq!(state.elapsed_time_seconds(), 1_570);
    assert!((state.weight() - 2_060.0).abs() < 1e-9);
    assert_eq!(state.num_boardings(), 2);
}

#[test]
fn reversing_twice_round_trips() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let goal = forward_journey(&fixture, &mut arena);

    let once = reverse(&mut arena, &fixture.graph, goal);
    assert!(arena.get(once).weight() <= arena.get(goal).weight() + 1e-9);

    let twice = reverse(&mut arena, &fixture.graph, once);
    let state = arena.get(twice);
    assert_eq!(state.vertex(), fixture.b);
    assert_eq!(state.time_seconds(), 1_570);
    assert_eq!(state.elapsed_time_seconds(), 1_570);
    assert!((state.weight() - arena.get(goal).weight()).abs() < 1e-9);
}

#[test]
fn reverse_optimization_moves_slack_to_initial_wait() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let goal = forward_journey(&fixture, &mut arena);
    let original_weight = arena.get(goal).weight();

    let optimized = reverse_and_optimize(&mut arena, &fixture.graph, goal, true);
    let state = arena.get(optimized);

    // Same endpoints and total duration.
    assert_eq!(state.vertex(), fixture.b);
    assert_eq!(state.time_seconds(), 1_570);
    assert_eq!(state.elapsed_time_seconds(), 1_570);

    // The transfer slack moved into the initial wait: the later 840
    // departure of line 105 is used, and the 540 s wait before it is
    // billed at the cheaper beginning factor.
    assert!(state.weight() < original_weight);
    assert_eq!(state.data().initial_wait_time, 540);
    assert_eq!(state.active_time_seconds(), 1_030);
    assert_eq!(state.num_boardings(), 2);

    let chain = chain_of(&arena, optimized);
    assert!(
        chain.contains(&(fixture.pd1, 840)),
        "optimized path should board the 840 departure, chain: {chain:?}"
    );
}

#[test]
fn reverse_optimization_falls_back_when_replay_fails() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let blocked = graph.add_edge(
        a,
        b,
        EdgeKind::Street(StreetEdgeData {
            length_meters: 100.0,
            permission: StreetPermission::NONE,
            wheelchair_accessible: true,
            not_recommended: false,
        }),
    );

    // Build the original chain through the editor directly; the replay
    // will consult the street's permission and decline.
    let mut arena = StateArena::new();
    let origin = arena.new_origin(a, walk_config());
    let edge = graph.edge(blocked).clone();
    let mut editor = arena.edit(origin, &edge);
    editor.set_back_mode(TraverseMode::Walk);
    editor.increment_weight(100.0);
    editor.increment_time_seconds(100);
    let goal = editor.commit().unwrap();

    // Optimizing falls back to the unoptimized original...
    let optimized = reverse_and_optimize(&mut arena, &graph, goal, true);
    assert_eq!(optimized, goal);

    // ...and the non-forward variant falls back to the structural
    // reversal, which never re-decides the edge.
    let reversed = reverse_and_optimize(&mut arena, &graph, goal, false);
    let state = arena.get(reversed);
    assert_eq!(state.vertex(), a);
    assert_eq!(state.elapsed_time_seconds(), 100);
}

#[test]
fn active_time_clamps_initial_wait() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("a", VertexKind::Street);
    let b = graph.add_vertex("b", VertexKind::Street);
    let ab = graph.add_edge(a, b, street(10.0));
    let edge = graph.edge(ab).clone();

    for (clamp, expected) in [(-1, 700), (0, 1_000), (60, 940)] {
        let config = Arc::new(RoutingConfig {
            clamp_initial_wait_seconds: clamp,
            walk_speed_mps: 1.0,
            ..RoutingConfig::default()
        });
        let mut arena = StateArena::new();
        let origin = arena.new_origin(a, config);
        let mut editor = arena.edit(origin, &edge);
        editor.set_back_mode(TraverseMode::Walk);
        editor.set_initial_wait_time(300);
        editor.increment_time_seconds(1_000);
        let state = editor.commit().unwrap();

        assert_eq!(arena.get(state).active_time_seconds(), expected, "clamp {clamp}");
    }
}

#[test]
fn route_sequence_checks() {
    let fixture = transit_fixture();
    let mut arena = StateArena::new();
    let origin = arena.new_origin(fixture.a, walk_config());
    let s1 = fixture
        .graph
        .edge(fixture.street_a)
        .traverse(&mut arena, origin)
        .unwrap();
    let s2 = fixture
        .graph
        .edge(fixture.board1)
        .traverse(&mut arena, s1)
        .unwrap();
    let goal = {
        let edges = [
            fixture.hop1,
            fixture.alight1,
            fixture.transfer,
            fixture.board2,
            fixture.hop2,
            fixture.alight2,
            fixture.street_b,
        ];
        let mut state = s2;
        for edge in edges {
            state = fixture.graph.edge(edge).traverse(&mut arena, state).unwrap();
        }
        state
    };

    let one_route = arena.get(s2).clone();
    let two_routes = arena.get(goal).clone();

    assert!(one_route.route_sequence_prefix(&two_routes));
    assert!(one_route.route_sequence_subset(&two_routes));
    assert!(!two_routes.route_sequence_subset(&one_route));
    assert!(two_routes.route_sequence_subset_symmetric(&one_route));
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Weight and elapsed time never decrease along a chain of street
        /// traversals, whatever the segment lengths.
        #[test]
        fn street_chains_are_monotone(lengths in prop::collection::vec(1.0f64..500.0, 1..8)) {
            let mut graph = Graph::new();
            let mut previous = graph.add_vertex("v0", VertexKind::Street);
            let mut edges = Vec::new();
            for (index, length) in lengths.iter().enumerate() {
                let next = graph.add_vertex(format!("v{}", index + 1), VertexKind::Street);
                edges.push(graph.add_edge(previous, next, street(*length)));
                previous = next;
            }

            let mut arena = StateArena::new();
            let mut state = arena.new_origin(VertexId(0), walk_config());
            for edge in edges {
                let child = graph.edge(edge).traverse(&mut arena, state).unwrap();
                prop_assert!(arena.get(child).weight() >= arena.get(state).weight());
                prop_assert!(arena.get(child).time_seconds() >= arena.get(state).time_seconds());
                state = child;
            }
        }

        /// Structurally reversing twice restores the original endpoint,
        /// duration, and weight.
        #[test]
        fn structural_reversal_round_trips(lengths in prop::collection::vec(1.0f64..500.0, 1..8)) {
            let mut graph = Graph::new();
            let mut previous = graph.add_vertex("v0", VertexKind::Street);
            let mut edges = Vec::new();
            for (index, length) in lengths.iter().enumerate() {
                let next = graph.add_vertex(format!("v{}", index + 1), VertexKind::Street);
                edges.push(graph.add_edge(previous, next, street(*length)));
                previous = next;
            }

            let mut arena = StateArena::new();
            let mut state = arena.new_origin(VertexId(0), walk_config());
            for edge in edges {
                state = graph.edge(edge).traverse(&mut arena, state).unwrap();
            }
            let goal = state;

            let once = reverse(&mut arena, &graph, goal);
            prop_assert_eq!(
                arena.get(once).elapsed_time_seconds(),
                arena.get(goal).elapsed_time_seconds()
            );

            let twice = reverse(&mut arena, &graph, once);
            prop_assert_eq!(arena.get(twice).vertex(), arena.get(goal).vertex());
            prop_assert_eq!(
                arena.get(twice).time_seconds(),
                arena.get(goal).time_seconds()
            );
            prop_assert!((arena.get(twice).weight() - arena.get(goal).weight()).abs() < 1e-9);
        }
    }
}
