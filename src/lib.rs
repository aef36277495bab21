//! Facade crate for the Courier route planner.
//!
//! This crate re-exports the core domain types and the constraint-model
//! planner, and exposes the bundled routing engine behind a feature flag.

#![forbid(unsafe_code)]

pub use courier_core::{
    LocationGraph, PenaltyStrategy, PlanError, PlanRequest, Planner, RoutingSolution,
    SolutionReport, SolutionStatus, SolutionVerifier, Vehicle, VehicleRegistry, engine,
};

#[cfg(feature = "serde")]
pub use courier_core::request;

pub use courier_solver::{CpPlanner, ModelBuilder, PlannerConfig, SolutionExtractor};

#[cfg(feature = "engine-insertion")]
pub use courier_engine::InsertionEngine;

/// Planner backed by the bundled [`InsertionEngine`].
#[cfg(feature = "engine-insertion")]
pub type DefaultPlanner = CpPlanner<InsertionEngine>;
