//! Per-mode traversal accumulators.

use crate::domain::{Money, TraverseMode};
use std::collections::HashMap;
use tracing::warn;

/// Cumulative time, distance, and money spent per travel mode along one
/// state chain. Attached to every state; increments are non-negative, so
/// every accumulator is monotone from parent to child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalStatistics {
    time_seconds: [i64; TraverseMode::COUNT],
    distance_meters: [f64; TraverseMode::COUNT],
    price: Money,
}

impl TraversalStatistics {
    pub fn new() -> Self {
        TraversalStatistics::default()
    }

    /// Add time spent in a mode. Negative amounts are ignored with a
    /// warning — the caller has a bug, but the accumulators stay monotone.
    pub fn add_time(&mut self, mode: TraverseMode, seconds: i64) {
        if seconds < 0 {
            warn!(%mode, seconds, "ignoring negative time increment");
            return;
        }
        self.time_seconds[mode.index()] += seconds;
    }

    /// Add distance covered in a mode; negative amounts are ignored with
    /// a warning.
    pub fn add_distance(&mut self, mode: TraverseMode, meters: f64) {
        if meters < 0.0 {
            warn!(%mode, meters, "ignoring negative distance increment");
            return;
        }
        self.distance_meters[mode.index()] += meters;
    }

    pub fn time_in(&self, mode: TraverseMode) -> i64 {
        self.time_seconds[mode.index()]
    }

    pub fn distance_in(&self, mode: TraverseMode) -> f64 {
        self.distance_meters[mode.index()]
    }

    pub fn walk_distance(&self) -> f64 {
        self.distance_in(TraverseMode::Walk)
    }

    /// Real money spent so far (finished rentals; transit fares are priced
    /// after the search).
    pub fn price(&self) -> Money {
        self.price
    }

    pub fn add_price(&mut self, amount: Money) {
        self.price += amount;
    }

    /// Nonzero per-mode distances, for itinerary summaries.
    pub fn distance_by_mode(&self) -> HashMap<TraverseMode, f64> {
        TraverseMode::ALL
            .iter()
            .filter(|mode| self.distance_in(**mode) > 0.0)
            .map(|&mode| (mode, self.distance_in(mode)))
            .collect()
    }

    /// Nonzero per-mode times, for itinerary summaries.
    pub fn time_by_mode(&self) -> HashMap<TraverseMode, i64> {
        TraverseMode::ALL
            .iter()
            .filter(|mode| self.time_in(**mode) > 0)
            .map(|&mode| (mode, self.time_in(mode)))
            .collect()
    }
}
