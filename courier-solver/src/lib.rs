//! Constraint-model planner for Courier.
//!
//! This crate turns a [`PlanRequest`](courier_core::PlanRequest) into
//! constraints for any [`RoutingEngine`](courier_core::engine::RoutingEngine),
//! runs the engine and reads its assignment back into routes:
//!
//! - [`ModelBuilder`] declares travel, time, breaks, forbidden windows, load
//!   and drop penalties in a fixed order;
//! - [`SolutionExtractor`] walks the assignment into per-vehicle steps and
//!   recomputes loads;
//! - [`CpPlanner`] runs the whole pipeline and hands the result to the
//!   [`SolutionVerifier`](courier_core::SolutionVerifier).
//!
//! The crate never assumes a particular search algorithm. Engines are plain
//! type parameters, so tests can swap in the recording engine from
//! `test_support`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod extract;
mod model;
mod planner;

pub use extract::SolutionExtractor;
pub use model::{ModelBuilder, ModelConfig, RoutingModel};
pub use planner::{CpPlanner, PlannerConfig};

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
