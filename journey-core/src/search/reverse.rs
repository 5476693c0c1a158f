//! Path reversal and reverse optimization.
//!
//! A time-dependent forward search boards the first connecting trip it
//! finds, accumulating scheduling slack at every boarding. Re-traversing
//! the finished edge sequence from the arrival time backward lets every
//! boarding pick the *latest* trip that still connects, shrinking that
//! slack — the total wall-clock duration is preserved and the unavoidable
//! remainder of the wait moves to the very beginning of the trip, where it
//! is cheapest.
//!
//! When any edge of the replay declines to re-traverse (interline dwells,
//! time-dependent restrictions), the optimization falls back to a purely
//! structural reversal that transposes the original deltas without
//! re-deciding anything. That fallback is always defined and is a
//! recoverable outcome, not an error.

use crate::graph::Graph;
use crate::search::state::{StateArena, StateId};
use std::sync::Arc;
use tracing::{info, warn};

/// Reverse the path ending at `state`, re-traversing all edges in the
/// opposite temporal direction so as to remove unnecessary waiting.
///
/// With `forward` set (the usual case: optimizing a completed search
/// result), the reversed path is reversed again so the returned state sits
/// at the same temporal end as `state`, and consistency checks compare it
/// against the original — their violations are known limitations of the
/// heuristic and are logged as warnings, never raised.
///
/// Without `forward`, the state at the other temporal end of the
/// optimized path is returned.
pub fn reverse_and_optimize(
    arena: &mut StateArena,
    graph: &Graph,
    state: StateId,
    forward: bool,
) -> StateId {
    let original = state;
    let mut new_initial_wait = arena.get(state).data().initial_wait_time;
    let mut ret = reversed_clone(arena, state);
    let mut orig = state;

    while let Some(back) = arena.get(orig).back_state() {
        let edge_id = arena
            .get(orig)
            .back_edge()
            .expect("non-root state has a back edge");
        let edge = graph.edge(edge_id);
        let replaying_optimized = arena.get(ret).config().reverse_optimizing;

        let result = if forward && first_board_or_last_alight(arena, orig, graph) {
            // First boarding (or last alighting of a reverse search): give
            // the boarding edge the original pre-board time so it may pick
            // a different trip and re-seat the initial wait.
            let hint = arena.get(back).time_seconds();
            let result = edge.traverse_board_with_hint(arena, ret, hint);
            if let Some(next) = result {
                new_initial_wait = arena.get(next).data().initial_wait_time;
            }
            result
        } else if edge.is_dropoff_vehicle() && replaying_optimized {
            let vehicle = arena
                .get(back)
                .current_vehicle()
                .cloned()
                .expect("state before a drop-off rents a vehicle");
            edge.reversed_traverse_done_renting(arena, ret, vehicle)
        } else if edge.is_rent_vehicle() && replaying_optimized {
            match arena.get(back).current_vehicle().cloned() {
                Some(previous) => edge.reversed_traverse_switch_vehicles(arena, ret, previous),
                None => edge.reversed_traverse_begin_renting(arena, ret),
            }
        } else {
            edge.traverse(arena, ret)
        };

        match result {
            Some(next) => ret = next,
            None => {
                info!(
                    edge = ?edge_id,
                    "cannot reverse path at edge, returning unoptimized path"
                );
                return if forward {
                    original
                } else {
                    reverse(arena, graph, original)
                };
            }
        }
        orig = back;
    }

    if forward {
        forward_checked(arena, graph, original, ret, new_initial_wait)
    } else {
        ret
    }
}

/// Reverse the path ending at `state` without re-deciding any edge
/// choice: replay the recorded per-state deltas (time, weight, distances,
/// boardings) across the same edges in the opposite order. The reversed
/// path has the same total duration as the original. This is a pure data
/// transposition and is always defined.
pub fn reverse(arena: &mut StateArena, graph: &Graph, state: StateId) -> StateId {
    let total_boardings = arena.get(state).num_boardings();
    let mut ret = reversed_clone(arena, state);
    let mut orig = state;

    while let Some(back) = arena.get(orig).back_state() {
        let edge_id = arena
            .get(orig)
            .back_edge()
            .expect("non-root state has a back edge");
        let edge = graph.edge(edge_id);

        let orig_state = arena.get(orig).clone();
        let time_delta = orig_state.abs_time_delta_seconds(arena);
        let weight_delta = orig_state.weight_delta(arena);
        let walk_delta = orig_state.walk_distance_delta(arena);
        let pre_transit_delta = orig_state.pre_transit_time_delta(arena);
        let back_parked = (
            arena.get(back).is_car_parked(),
            arena.get(back).is_bike_parked(),
        );

        let mut editor = arena.edit(ret, edge);
        if let Some(mode) = orig_state.back_mode() {
            editor.set_back_mode(mode);
        }
        editor.set_from_state(&orig_state);
        editor.increment_time_seconds(time_delta);
        editor.increment_weight(weight_delta);
        editor.increment_walk_distance_meters(walk_delta);
        editor.increment_pre_transit_time(pre_transit_delta);

        if orig_state.is_car_parked() != back_parked.0 {
            editor.set_car_parked(!orig_state.is_car_parked());
        }
        if orig_state.is_bike_parked() != back_parked.1 {
            editor.set_bike_parked(!orig_state.is_bike_parked());
        }
        editor.set_num_boardings(total_boardings - orig_state.num_boardings());

        ret = editor
            .commit()
            .expect("structural reversal is always defined");
        orig = back;
    }

    ret
}

/// Seed state for a reversed replay: the same vertex and instant as
/// `state`, under the request cloned with its direction flipped. Trip
/// context, the recorded initial wait, and parking flags carry over.
fn reversed_clone(arena: &mut StateArena, state: StateId) -> StateId {
    let source = arena.get(state);
    let vertex = source.vertex();
    let time = source.time_seconds();
    let config = Arc::new(source.config().reversed_clone());
    let trip = source.data().trip.clone();
    let initial_wait = source.data().initial_wait_time;
    let car_parked = source.is_car_parked();
    let bike_parked = source.is_bike_parked();

    let id = arena.new_origin_at(vertex, time, config);
    let root = arena.get_mut(id);
    let data = Arc::make_mut(&mut root.data);
    data.trip = trip;
    data.initial_wait_time = initial_wait;
    data.car_parked = car_parked;
    data.bike_parked = bike_parked;
    id
}

/// Whether `state`'s back edge is the path's first boarding in a forward
/// search (or its last alighting in a reverse search) — the one place the
/// initial wait can be re-seated during optimization.
fn first_board_or_last_alight(arena: &StateArena, state: StateId, graph: &Graph) -> bool {
    let current = arena.get(state);
    if current.num_boardings() != 1 {
        return false;
    }
    let Some(edge_id) = current.back_edge() else {
        return false;
    };
    let edge = graph.edge(edge_id);
    let arrive_by = current.config().arrive_by;
    (edge.is_board() && !arrive_by) || (edge.is_alight() && arrive_by)
}

/// Re-reverse an optimized backward replay so it runs in the original
/// direction again, compare it against the original path, and restore the
/// non-incremental fields optimization cannot reconstruct.
///
/// The comparisons are warning-only: an optimization that fails to
/// improve weight or active time can legitimately happen when slack is
/// pinned between rarely-running lines, and the optimized result is still
/// returned.
fn forward_checked(
    arena: &mut StateArena,
    graph: &Graph,
    original: StateId,
    optimized_tail: StateId,
    new_initial_wait: i64,
) -> StateId {
    let reversed = reverse(arena, graph, optimized_tail);

    let orig = arena.get(original).clone();
    let result = arena.get(reversed).clone();

    if orig.weight() <= result.weight() {
        warn!(
            before = orig.weight(),
            after = result.weight(),
            "optimization did not decrease weight"
        );
    }
    if orig.elapsed_time_seconds() != result.elapsed_time_seconds() {
        warn!(
            before = orig.elapsed_time_seconds(),
            after = result.elapsed_time_seconds(),
            "optimization changed elapsed time"
        );
    }
    if orig.active_time_seconds() <= result.active_time_seconds() {
        // This can legitimately happen: when a middle leg runs frequently
        // between two rare lines, its slack moves toward the beginning but
        // cannot move past the first rare line.
        warn!(
            before = orig.active_time_seconds(),
            after = result.active_time_seconds(),
            boardings = orig.num_boardings(),
            "optimization did not decrease active time"
        );
    }
    if let Some(back) = orig.back_state() {
        if result.weight() < arena.get(back).weight() {
            // Also possible: moving slack across several transfers can
            // shift most of the waiting to the start of the trip, pricing
            // the optimized path below the original's second-to-last state.
            warn!(
                optimized = result.weight(),
                back_state = arena.get(back).weight(),
                "weight was reduced enough to run backwards"
            );
        }
    }
    if orig.time_seconds() != result.time_seconds() {
        warn!("times do not match after reverse optimization");
    }
    if (orig.weight() - result.weight()).abs() > 1.0
        && new_initial_wait == orig.data().initial_wait_time
    {
        warn!(
            before = orig.weight(),
            after = result.weight(),
            initial_wait = new_initial_wait,
            "weight changed while initial wait times stayed constant"
        );
    }
    if new_initial_wait != result.data().initial_wait_time {
        warn!(
            is = result.data().initial_wait_time,
            should_be = new_initial_wait,
            "initial wait time not propagated"
        );
    }

    // After reverse-optimizing, many attributes are not set; restore them
    // from the unoptimized state, keeping the optimized initial wait.
    let optimized_wait = result.data().initial_wait_time;
    let mut data = orig.data().clone();
    data.initial_wait_time = optimized_wait;
    data.last_next_arrival_delta = -1;
    arena.get_mut(reversed).data = Arc::new(data);

    reversed
}
