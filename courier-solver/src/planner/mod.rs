//! `CpPlanner`, the end-to-end planning pipeline.

use std::marker::PhantomData;
use std::sync::Arc;

use courier_core::engine::{RoutingEngine, SearchParameters};
use courier_core::{
    LocationGraph, PenaltyStrategy, PlanError, PlanRequest, Planner, RoutingSolution,
    SolutionStatus, SolutionVerifier, VehicleRegistry,
};

use crate::extract::SolutionExtractor;
use crate::model::{ModelBuilder, ModelConfig};

/// Configuration for [`CpPlanner`].
///
/// Request values are used unless the planner overrides them here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Constraint model tunables.
    pub model: ModelConfig,
    /// Drop-penalty strategy replacing the request's.
    pub penalty: Option<PenaltyStrategy>,
    /// Reload count replacing the request's.
    pub max_reload: Option<usize>,
    /// Search settings. The time limit is taken from the request.
    pub search: SearchParameters,
}

/// Planner that builds a constraint model for `E` and solves it.
///
/// Each call owns its graph, registry and engine, so one planner can serve
/// many threads.
pub struct CpPlanner<E> {
    config: PlannerConfig,
    engine: PhantomData<fn() -> E>,
}

impl<E: RoutingEngine> CpPlanner<E> {
    /// Construct a planner using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    /// Construct a planner with explicit configuration.
    #[must_use]
    pub const fn with_config(config: PlannerConfig) -> Self {
        Self {
            config,
            engine: PhantomData,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn graph(&self, request: &PlanRequest) -> Result<LocationGraph, PlanError> {
        let penalty = self.config.penalty.unwrap_or(request.penalty);
        let mut graph = LocationGraph::new(request.locations.clone(), penalty)?;
        graph.add_depot_clones(self.config.max_reload.unwrap_or(request.max_reload));
        Ok(graph)
    }
}

impl<E: RoutingEngine> Default for CpPlanner<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RoutingEngine> Planner for CpPlanner<E> {
    fn plan(&self, request: &PlanRequest) -> Result<RoutingSolution, PlanError> {
        let mut graph = self.graph(request)?;
        let registry = VehicleRegistry::new(request.vehicles.clone())?;
        graph.set_reload_demand(registry.fleet_max_load());
        let shared = Arc::new(graph);

        let builder =
            ModelBuilder::with_config(Arc::clone(&shared), registry, self.config.model.clone());
        let mut model = builder.build::<E>()?;
        let parameters = SearchParameters {
            time_limit: request.search_time_limit,
            ..self.config.search
        };
        log::info!(
            "solving {} location(s) with {} vehicle(s), limit {:?}",
            shared.len(),
            model.registry().len(),
            parameters.time_limit
        );
        let assignment = model.solve(&parameters);
        let mut solution = SolutionExtractor::new(&model).extract(assignment.as_ref())?;

        if solution.status == SolutionStatus::Success {
            log::info!("solution found with cost {:?}", solution.objective_cost);
            let dropped = solution.dropped_locations();
            if !dropped.is_empty() {
                log::warn!("dropped location(s): {}", dropped.join(", "));
            }
        } else {
            log::info!("no solution found");
        }

        SolutionVerifier::new(&shared).verify(&mut solution);
        Ok(solution)
    }
}

#[cfg(test)]
mod tests;
