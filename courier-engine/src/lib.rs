//! Reference routing engine for the Courier planner.
//!
//! [`InsertionEngine`] implements the
//! [`RoutingEngine`](courier_core::engine::RoutingEngine) port with a
//! deterministic insertion heuristic. It needs no native libraries, which
//! makes it the default backend and the one tests run against.

#![forbid(unsafe_code)]

mod engine;
mod schedule;
mod search;
mod solution;

pub use engine::InsertionEngine;
pub use solution::InsertionSolution;
