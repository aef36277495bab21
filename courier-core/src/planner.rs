use std::time::Duration;

use thiserror::Error;

use crate::engine::EngineError;
use crate::graph::GraphError;
use crate::location::Location;
use crate::penalty::PenaltyStrategy;
use crate::registry::RegistryError;
use crate::solution::RoutingSolution;
use crate::vehicle::Vehicle;

/// Default search budget for a planning run.
pub const DEFAULT_SEARCH_TIME_LIMIT: Duration = Duration::from_secs(3);

/// Everything needed to plan one day of deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Depot and stops.
    pub locations: Vec<Location>,
    /// Available fleet.
    pub vehicles: Vec<Vehicle>,
    /// How dropped stops are priced.
    pub penalty: PenaltyStrategy,
    /// Number of extra depot visits available for reloading.
    pub max_reload: usize,
    /// Wall-clock budget for the engine.
    pub search_time_limit: Duration,
}

impl PlanRequest {
    /// A request with the default penalty, no reloads and the default budget.
    #[must_use]
    pub fn new(locations: Vec<Location>, vehicles: Vec<Vehicle>) -> Self {
        Self {
            locations,
            vehicles,
            penalty: PenaltyStrategy::default(),
            max_reload: 0,
            search_time_limit: DEFAULT_SEARCH_TIME_LIMIT,
        }
    }
}

/// Errors returned by [`Planner::plan`].
///
/// An engine that finds no solution is not an error; it yields a
/// [`RoutingSolution`] with a failed status instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The locations are inconsistent.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The fleet is inconsistent.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The engine rejected the model.
    #[error("routing engine rejected the model: {0}")]
    Engine(#[from] EngineError),
    /// A penalty strategy priced a location below zero.
    #[error("drop penalty for `{location}` is negative ({penalty})")]
    NegativePenalty {
        /// Location being priced.
        location: String,
        /// Offending penalty.
        penalty: i64,
    },
}

/// Plan routes for a request.
///
/// Planners must be `Send + Sync` so one instance can serve several threads.
pub trait Planner: Send + Sync {
    /// Plan `request`, returning routes or a configuration error.
    ///
    /// # Errors
    /// Returns [`PlanError`] when the request cannot be turned into a model.
    fn plan(&self, request: &PlanRequest) -> Result<RoutingSolution, PlanError>;
}
