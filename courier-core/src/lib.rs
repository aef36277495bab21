//! Core domain types for the Courier route planner.
//!
//! The crate models a day of deliveries: a [`LocationGraph`] of stops around
//! a depot, a [`VehicleRegistry`] holding the fleet and its breaks, and the
//! [`PenaltyStrategy`] used to price stops that are left out. Planning itself
//! goes through the [`engine`] port; whatever engine sits behind it, the
//! [`SolutionVerifier`] re-checks the routes it produces.
//!
//! Constructors return `Result` so inconsistent requests are rejected before
//! any engine is configured.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod engine;
mod graph;
mod location;
mod penalty;
mod planner;
mod registry;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod request;
mod solution;
mod vehicle;
mod verify;

pub use graph::{
    DAY_END, DAY_START, ForbiddenWindows, GraphError, INFINITY, LocationGraph, forbidden_windows,
};
pub use location::{DistanceMap, Location, Tags, TimeWindow, tags_intersect};
pub use penalty::{PenaltyError, PenaltyStrategy};
pub use planner::{DEFAULT_SEARCH_TIME_LIMIT, PlanError, PlanRequest, Planner};
pub use registry::{Break, BreakId, BreakKind, BreakLedger, RegistryError, VehicleRegistry};
pub use solution::{
    BreakSolution, PlanReport, RouteStep, RoutingSolution, SolutionReport, SolutionStatus,
    StepReport, VehiclePlan,
};
pub use vehicle::{DEFAULT_JOURNEY, LunchWindow, ShortBreakPolicy, Vehicle};
pub use verify::{SolutionVerifier, Violation};

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
