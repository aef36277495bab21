//! Translation of a planning problem into engine constraints.
//!
//! [`ModelBuilder::build`] declares everything in one fixed order: travel
//! transits, the time dimension, journey spans, breaks, forbidden windows,
//! depot anchoring, the load dimension and finally drop penalties. Engines
//! rely on that order; a dimension must exist before anything constrains it.

use std::sync::Arc;

use courier_core::engine::{
    DimensionHandle, DimensionSpec, EngineError, IndexSpace, IntervalHandle, IntervalSpec,
    RoutingEngine, SearchParameters, TransitCallback, TransitHandle, UnaryTransitCallback,
};
use courier_core::{
    BreakKind, DAY_END, DAY_START, GraphError, INFINITY, LocationGraph, PlanError,
    ShortBreakPolicy, Tags, VehicleRegistry, forbidden_windows,
};

/// Tunables of the constraint model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Longest wait allowed at a node, in minutes.
    pub time_slack: i64,
    /// Ceiling of every vehicle's time cumul.
    pub time_ceiling: i64,
    /// Half-width of the window in which each short break may start.
    pub break_half_window: i64,
    /// Closing minute assumed for a depot without windows.
    pub day_length: i64,
    /// Name of the time dimension.
    pub time_dimension: String,
    /// Name of the load dimension.
    pub load_dimension: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            time_slack: 90,
            time_ceiling: 10_000,
            break_half_window: 30,
            day_length: DAY_END,
            time_dimension: "time".to_owned(),
            load_dimension: "load".to_owned(),
        }
    }
}

/// A configured engine together with the data it was built from.
pub struct RoutingModel<E> {
    engine: E,
    graph: Arc<LocationGraph>,
    registry: VehicleRegistry,
    time: DimensionHandle,
    load: DimensionHandle,
}

impl<E: RoutingEngine> RoutingModel<E> {
    /// The configured engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the engine, for extra constraints before solving.
    pub const fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Graph the model was built over, depot copies included.
    #[must_use]
    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    /// Fleet and the breaks recorded while building.
    #[must_use]
    pub const fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    /// Handle of the time dimension.
    #[must_use]
    pub const fn time_dimension(&self) -> DimensionHandle {
        self.time
    }

    /// Handle of the load dimension.
    #[must_use]
    pub const fn load_dimension(&self) -> DimensionHandle {
        self.load
    }

    /// Run the engine.
    pub fn solve(&mut self, parameters: &SearchParameters) -> Option<E::Solution> {
        self.engine.solve(parameters)
    }
}

/// Builds a [`RoutingModel`] from a graph and a fleet.
///
/// The builder owns the registry so break identifiers minted while building
/// end up in the model, where the extractor looks them up.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    graph: Arc<LocationGraph>,
    registry: VehicleRegistry,
    config: ModelConfig,
}

impl ModelBuilder {
    /// Builder using the default [`ModelConfig`].
    #[must_use]
    pub fn new(graph: Arc<LocationGraph>, registry: VehicleRegistry) -> Self {
        Self::with_config(graph, registry, ModelConfig::default())
    }

    /// Builder with explicit configuration.
    #[must_use]
    pub const fn with_config(
        graph: Arc<LocationGraph>,
        registry: VehicleRegistry,
        config: ModelConfig,
    ) -> Self {
        Self {
            graph,
            registry,
            config,
        }
    }

    /// Declare the whole model on a fresh engine.
    ///
    /// # Errors
    /// Returns [`PlanError::Engine`] when the engine rejects a declaration,
    /// [`PlanError::NegativePenalty`] when the penalty strategy prices a
    /// stop below zero and graph or registry errors for inconsistent input.
    pub fn build<E: RoutingEngine>(mut self) -> Result<RoutingModel<E>, PlanError> {
        let space = IndexSpace::new(
            self.graph.len(),
            self.registry.len(),
            self.graph.depot_index(),
        )?;
        let mut engine = E::create(space)?;

        let transits = self.register_travel(&mut engine)?;
        let time = engine.add_dimension(DimensionSpec {
            name: self.config.time_dimension.clone(),
            transits,
            slack: self.config.time_slack,
            capacities: vec![self.config.time_ceiling],
            start_at_zero: false,
        })?;
        log::debug!("declared time dimension `{}`", self.config.time_dimension);

        self.bound_spans(&mut engine, time)?;
        self.declare_breaks(&mut engine, time)?;
        self.exclude_forbidden_windows(&mut engine, time)?;
        self.anchor_at_depot(&mut engine, time)?;
        let load = self.declare_load(&mut engine)?;
        self.declare_disjunctions(&mut engine)?;

        Ok(RoutingModel {
            engine,
            graph: self.graph,
            registry: self.registry,
            time,
            load,
        })
    }

    fn register_travel<E: RoutingEngine>(
        &self,
        engine: &mut E,
    ) -> Result<Vec<TransitHandle>, PlanError> {
        let space = *engine.index_space();
        let mut handles = Vec::with_capacity(self.registry.len());
        for (vehicle, spec) in self.registry.vehicles().iter().enumerate() {
            let callback =
                travel_callback(Arc::clone(&self.graph), space, spec.capabilities.clone());
            handles.push(engine.register_vehicle_transit(vehicle, callback)?);
        }
        log::debug!("registered {} travel transits", handles.len());
        Ok(handles)
    }

    fn bound_spans<E: RoutingEngine>(
        &self,
        engine: &mut E,
        time: DimensionHandle,
    ) -> Result<(), PlanError> {
        for (vehicle, spec) in self.registry.vehicles().iter().enumerate() {
            engine.set_span_upper_bound(time, vehicle, spec.journey)?;
        }
        Ok(())
    }

    fn declare_breaks<E: RoutingEngine>(
        &mut self,
        engine: &mut E,
        time: DimensionHandle,
    ) -> Result<(), PlanError> {
        let space = *engine.index_space();
        let (open, close) = self.depot_hours()?;
        let service = service_durations(&self.graph, &space)?;
        for vehicle in 0..self.registry.len() {
            let (lunch, short) = {
                let spec = self.registry.vehicle(vehicle)?;
                (spec.lunch, spec.short_break)
            };
            let mut intervals = Vec::new();
            if let Some(window) = lunch {
                intervals.push(self.declare_break(
                    engine,
                    vehicle,
                    BreakKind::Lunch,
                    (window.minimum_start, window.maximum_start),
                    window.duration,
                )?);
            }
            if let Some(policy) = short {
                let half_window = self.config.break_half_window;
                for bounds in short_break_windows(open, close, policy, half_window) {
                    intervals.push(self.declare_break(
                        engine,
                        vehicle,
                        BreakKind::Short,
                        bounds,
                        policy.duration,
                    )?);
                }
            }
            if intervals.is_empty() {
                continue;
            }
            log::debug!("vehicle {vehicle} takes {} break(s)", intervals.len());
            engine.attach_breaks(time, vehicle, &intervals, service.clone())?;
        }
        Ok(())
    }

    fn declare_break<E: RoutingEngine>(
        &mut self,
        engine: &mut E,
        vehicle: usize,
        kind: BreakKind,
        (min_start, max_start): (i64, i64),
        duration: i64,
    ) -> Result<IntervalHandle, PlanError> {
        let id = self
            .registry
            .add_break(vehicle, kind, min_start, max_start, duration)?;
        Ok(engine.create_interval(IntervalSpec {
            min_start,
            max_start,
            duration,
            optional: false,
            name: id.to_string(),
        })?)
    }

    fn exclude_forbidden_windows<E: RoutingEngine>(
        &self,
        engine: &mut E,
        time: DimensionHandle,
    ) -> Result<(), PlanError> {
        let space = *engine.index_space();
        for (node, location) in self.graph.locations().iter().enumerate() {
            if location.is_depot {
                continue;
            }
            let windows = forbidden_windows(&location.time_windows);
            if windows.is_empty() {
                continue;
            }
            let index = space
                .node_to_index(node)
                .ok_or(EngineError::UnknownIndex(node))?;
            engine.add_exclusion(time, index, &windows)?;
        }
        Ok(())
    }

    fn anchor_at_depot<E: RoutingEngine>(
        &self,
        engine: &mut E,
        time: DimensionHandle,
    ) -> Result<(), PlanError> {
        let space = *engine.index_space();
        let depot = self.graph.depot()?;
        let (lower, upper) = depot
            .time_windows
            .first()
            .map_or((DAY_START, self.config.day_length), |w| (w.start, w.end));
        for vehicle in 0..space.num_vehicles() {
            for index in [space.start(vehicle), space.end(vehicle)] {
                let bound = index.ok_or(EngineError::UnknownVehicle(vehicle))?;
                engine.set_cumul_range(time, bound, lower, upper)?;
                engine.minimize_cumul(time, bound)?;
            }
        }
        Ok(())
    }

    fn declare_load<E: RoutingEngine>(&self, engine: &mut E) -> Result<DimensionHandle, PlanError> {
        let space = *engine.index_space();
        let callback = demand_callback(Arc::clone(&self.graph), space);
        let demand = engine.register_unary_transit(callback)?;
        let load = engine.add_dimension(DimensionSpec {
            name: self.config.load_dimension.clone(),
            transits: vec![demand],
            slack: self.registry.fleet_max_load(),
            capacities: self.registry.max_loads(),
            start_at_zero: true,
        })?;
        log::debug!("declared load dimension `{}`", self.config.load_dimension);
        Ok(load)
    }

    fn declare_disjunctions<E: RoutingEngine>(&self, engine: &mut E) -> Result<(), PlanError> {
        let space = *engine.index_space();
        let mut declared = 0_usize;
        for (node, location) in self.graph.locations().iter().enumerate() {
            if !LocationGraph::has_penalty(location) || location.high_priority {
                continue;
            }
            let penalty = self.graph.drop_penalty(location);
            if penalty < 0 {
                return Err(PlanError::NegativePenalty {
                    location: location.name.clone(),
                    penalty,
                });
            }
            let index = space
                .node_to_index(node)
                .ok_or(EngineError::UnknownIndex(node))?;
            engine.add_disjunction(&[index], penalty)?;
            declared += 1;
        }
        log::debug!("declared {declared} droppable node(s)");
        Ok(())
    }

    fn depot_hours(&self) -> Result<(i64, i64), PlanError> {
        let depot = self.graph.depot()?;
        let open = depot
            .time_windows
            .iter()
            .map(|w| w.start)
            .min()
            .unwrap_or(DAY_START);
        let close = depot
            .time_windows
            .iter()
            .map(|w| w.end)
            .max()
            .unwrap_or(self.config.day_length);
        Ok((open, close))
    }
}

/// Start windows of the short breaks fitting between `open` and `close`.
///
/// Break `k` is centred on `open + k * frequency` and may start up to
/// `half_window` minutes either side of it.
fn short_break_windows(
    open: i64,
    close: i64,
    policy: ShortBreakPolicy,
    half_window: i64,
) -> Vec<(i64, i64)> {
    let Some(count) = close.saturating_sub(open).checked_div(policy.frequency) else {
        return Vec::new();
    };
    (1..=count)
        .map(|k| {
            let centre = open.saturating_add(k.saturating_mul(policy.frequency));
            (
                centre.saturating_sub(half_window),
                centre.saturating_add(half_window),
            )
        })
        .collect()
}

fn node_of(space: &IndexSpace, index: usize) -> Result<usize, GraphError> {
    space
        .index_to_node(index)
        .ok_or(GraphError::IndexOutOfRange {
            index,
            len: space.total(),
        })
}

fn service_durations(graph: &LocationGraph, space: &IndexSpace) -> Result<Vec<i64>, GraphError> {
    (0..space.total())
        .map(|index| graph.service_time(node_of(space, index)?))
        .collect()
}

/// Minutes from leaving one index to being ready at the next: gated travel
/// plus service at the origin.
fn travel_time(
    graph: &LocationGraph,
    space: &IndexSpace,
    capabilities: &Tags,
    from: usize,
    to: usize,
) -> Result<i64, GraphError> {
    let origin = node_of(space, from)?;
    let target = node_of(space, to)?;
    let distance = graph.distance(capabilities, origin, target)?;
    Ok(distance.saturating_add(graph.service_time(origin)?))
}

fn travel_callback(
    graph: Arc<LocationGraph>,
    space: IndexSpace,
    capabilities: Tags,
) -> TransitCallback {
    Box::new(move |from, to| {
        travel_time(&graph, &space, &capabilities, from, to).unwrap_or_else(|err| {
            log::error!("travel lookup {from} -> {to} failed: {err}");
            INFINITY
        })
    })
}

fn demand_callback(graph: Arc<LocationGraph>, space: IndexSpace) -> UnaryTransitCallback {
    Box::new(move |index| {
        node_of(&space, index)
            .and_then(|node| graph.demand(node))
            .unwrap_or_else(|err| {
                log::error!("demand lookup at {index} failed: {err}");
                0
            })
    })
}
