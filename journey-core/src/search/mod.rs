//! The path-search state engine.
//!
//! A search grows a tree of immutable [`State`]s over the graph: each edge
//! kind consumes a state and commits zero or one child through a
//! single-use [`StateEditor`]. Once a goal state is found,
//! [`reverse_and_optimize`] removes the artificial waiting a
//! time-dependent search accumulates, and the final chain is handed to the
//! itinerary builder and the fare engine.
//!
//! The search driver itself (queue discipline, goal conditions, time and
//! state budgets) lives outside this crate; everything here is synchronous
//! CPU-bound work that never blocks and never mutates the shared graph.

mod config;
mod editor;
mod reverse;
mod state;
mod state_data;
mod statistics;
mod traverse;

#[cfg(test)]
mod traversal_tests;

pub use config::{
    CostCategory, CostProfile, RoutingConfig, RoutingDelays, RoutingPenalties, RoutingReluctances,
};
pub use editor::StateEditor;
pub use reverse::{reverse, reverse_and_optimize};
pub use state::{PackagePrices, State, StateArena, StateId};
pub use state_data::{ActiveTrip, StateData};
pub use statistics::TraversalStatistics;
