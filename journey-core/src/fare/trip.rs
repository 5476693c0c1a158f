//! The fare engine's view of a finished path.
//!
//! A [`TripStage`] is the minimal projection of one transit stop passage:
//! route, stop, arrival minute offset from the first fare's start, and the
//! distance ridden since the previous stop of the same fare. A **fare** is
//! a maximal run of stages ridden on one continuous boarding; tickets with
//! a fare-count limit are consumed per fare rather than per minute.

use crate::domain::{Route, Stop};
use crate::graph::{EdgeKind, Graph, VertexKind};
use crate::search::{StateArena, StateId};
use std::sync::Arc;

/// One transit stop passage of a finished path.
#[derive(Debug, Clone)]
pub struct TripStage {
    pub route: Arc<Route>,
    /// The stop at which this stage begins.
    pub stop: Arc<Stop>,
    /// Arrival minute at the stop, counted from the first fare's start
    /// (the first stage of a trip is at minute 1).
    pub minute: u32,
    /// Distance from the previously visited stop of the same fare;
    /// 0 for the first stop of each fare.
    pub distance_meters: f64,
}

/// Errors raised while assembling a trip description.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TripError {
    #[error("trip stages must be ordered by arrival minute (stage {index} goes backwards)")]
    UnorderedStages { index: usize },

    #[error("trip stage minutes start at 1, found {minute}")]
    MinuteOutOfRange { minute: u32 },
}

/// One fare: a contiguous range of stages ridden on a single boarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareSpan {
    /// Index of the fare's first stage.
    pub first_stage: usize,
    /// Index of the fare's last stage (inclusive).
    pub last_stage: usize,
    pub start_minute: u32,
    pub end_minute: u32,
}

/// The ordered stage sequence of a trip, partitioned into fares.
///
/// A new fare starts at the first stage and at every route change; the
/// path projection emits stages consistent with this rule.
#[derive(Debug, Clone, Default)]
pub struct TripDescription {
    stages: Vec<TripStage>,
    fares: Vec<FareSpan>,
}

impl TripDescription {
    pub fn new(stages: Vec<TripStage>) -> Result<Self, TripError> {
        let mut fares: Vec<FareSpan> = Vec::new();
        for (index, stage) in stages.iter().enumerate() {
            if stage.minute == 0 {
                return Err(TripError::MinuteOutOfRange {
                    minute: stage.minute,
                });
            }
            if index > 0 && stage.minute < stages[index - 1].minute {
                return Err(TripError::UnorderedStages { index });
            }
            let same_fare = fares
                .last()
                .is_some_and(|fare| stages[fare.last_stage].route.id == stage.route.id);
            if same_fare {
                let fare = fares.last_mut().expect("just checked");
                fare.last_stage = index;
                fare.end_minute = stage.minute;
            } else {
                fares.push(FareSpan {
                    first_stage: index,
                    last_stage: index,
                    start_minute: stage.minute,
                    end_minute: stage.minute,
                });
            }
        }
        Ok(TripDescription { stages, fares })
    }

    pub fn stages(&self) -> &[TripStage] {
        &self.stages
    }

    pub fn fares(&self) -> &[FareSpan] {
        &self.fares
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The last stage's arrival minute; 0 for an empty trip.
    pub fn last_minute(&self) -> u32 {
        self.stages.last().map_or(0, |stage| stage.minute)
    }

    /// Whether the rider is on a transit vehicle during `minute`.
    pub fn is_travel_minute(&self, minute: u32) -> bool {
        self.fares
            .iter()
            .any(|fare| fare.start_minute <= minute && minute <= fare.end_minute)
    }

    /// The first minute at or after `minute` spent on a transit vehicle.
    pub fn next_travel_minute(&self, minute: u32) -> Option<u32> {
        self.fares
            .iter()
            .filter(|fare| fare.end_minute >= minute)
            .map(|fare| fare.start_minute.max(minute))
            .min()
    }

    /// Index of the fare whose span contains `minute`.
    pub fn fare_containing(&self, minute: u32) -> Option<usize> {
        self.fares
            .iter()
            .position(|fare| fare.start_minute <= minute && minute <= fare.end_minute)
    }

    /// Stages whose arrival minute lies in `[from, to]` (inclusive).
    pub fn stages_in_window(&self, from: u32, to: u32) -> impl Iterator<Item = &TripStage> {
        self.stages
            .iter()
            .filter(move |stage| from <= stage.minute && stage.minute <= to)
    }
}

/// Project a finished path onto its transit trip stages.
///
/// Walks the state chain from the root forward. A stage is emitted for
/// every on-board vertex passage: a pattern-depart state whose parent sits
/// on a stop-departure vertex opens a new fare (distance 0), and every
/// pattern-arrive state contributes an intermediate or final stage with
/// the distance of the hop that reached it. Arrival minutes are offset
/// from the first fare's start so that the first stage is at minute 1.
pub fn transit_stages(arena: &StateArena, graph: &Graph, goal: StateId) -> Vec<TripStage> {
    let mut chain = Vec::new();
    let mut cursor = Some(goal);
    while let Some(id) = cursor {
        chain.push(id);
        cursor = arena.get(id).back_state();
    }
    chain.reverse();

    let mut stages = Vec::new();
    let mut first_fare_start: Option<i64> = None;

    for &id in &chain {
        let state = arena.get(id);
        let vertex = graph.vertex(state.vertex());
        match &vertex.kind {
            VertexKind::PatternDepart {
                pattern,
                stop_index,
            } => {
                let boarded_from_platform = state
                    .back_state()
                    .is_some_and(|back| graph.vertex(arena.get(back).vertex()).is_stop_depart());
                if !boarded_from_platform {
                    continue;
                }
                let minutes_now = state.time_seconds() / 60;
                let minute = match first_fare_start {
                    None => {
                        first_fare_start = Some(minutes_now);
                        1
                    }
                    Some(start) => (minutes_now - start + 1) as u32,
                };
                stages.push(TripStage {
                    route: pattern.route.clone(),
                    stop: pattern.stops[*stop_index].clone(),
                    minute,
                    distance_meters: 0.0,
                });
            }
            VertexKind::PatternArrive {
                pattern,
                stop_index,
            } => {
                let Some(start) = first_fare_start else {
                    continue;
                };
                let minute = (state.time_seconds() / 60 - start + 1) as u32;
                let distance = state
                    .back_edge()
                    .map(|edge| match &graph.edge(edge).kind {
                        EdgeKind::PatternHop(hop) => {
                            hop.pattern.hop_distances_m[hop.from_stop_index]
                        }
                        _ => 0.0,
                    })
                    .unwrap_or(0.0);
                stages.push(TripStage {
                    route: pattern.route.clone(),
                    stop: pattern.stops[*stop_index].clone(),
                    minute,
                    distance_meters: distance,
                });
            }
            _ => {}
        }
    }

    stages
}
