//! Port to a constraint-programming routing engine.
//!
//! The model builder speaks only to [`RoutingEngine`]; any engine able to
//! express dimensions, disjunctions, intervals and forbidden periods can sit
//! behind it. Engines hand back an [`Assignment`] that the extractor reads.
//!
//! Handles returned by the engine are plain indices into its own tables.
//! They are only meaningful for the engine that issued them.

mod error;
mod index;

use std::time::Duration;

pub use error::EngineError;
pub use index::IndexSpace;

use crate::graph::ForbiddenWindows;

/// Prices the move between two solver indices.
pub type TransitCallback = Box<dyn Fn(usize, usize) -> i64 + Send + Sync>;

/// Quantity picked up or dropped at a single solver index.
pub type UnaryTransitCallback = Box<dyn Fn(usize) -> i64 + Send + Sync>;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Wrap a raw table index.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Raw table index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// A registered transit callback.
    TransitHandle
);
handle!(
    /// A cumulative dimension.
    DimensionHandle
);
handle!(
    /// A break interval.
    IntervalHandle
);

/// Definition of a cumulative dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSpec {
    /// Dimension name, used in logs.
    pub name: String,
    /// One transit per vehicle, or a single shared transit.
    pub transits: Vec<TransitHandle>,
    /// Largest idle amount allowed at a node.
    pub slack: i64,
    /// Per-vehicle ceiling for cumul values, or a single shared ceiling.
    pub capacities: Vec<i64>,
    /// Whether every route starts with a cumul of zero.
    pub start_at_zero: bool,
}

impl DimensionSpec {
    /// Transit used by `vehicle`.
    #[must_use]
    pub fn transit_for(&self, vehicle: usize) -> Option<TransitHandle> {
        per_vehicle(&self.transits, vehicle)
    }

    /// Capacity applying to `vehicle`.
    #[must_use]
    pub fn capacity_for(&self, vehicle: usize) -> Option<i64> {
        per_vehicle(&self.capacities, vehicle)
    }
}

fn per_vehicle<T: Copy>(values: &[T], vehicle: usize) -> Option<T> {
    match values {
        [shared] => Some(*shared),
        _ => values.get(vehicle).copied(),
    }
}

/// Definition of a fixed-duration break interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSpec {
    /// Earliest start.
    pub min_start: i64,
    /// Latest start.
    pub max_start: i64,
    /// Fixed duration.
    pub duration: i64,
    /// Whether the engine may skip the interval.
    pub optional: bool,
    /// Identifier reported back in [`IntervalValue::name`].
    pub name: String,
}

/// How the engine builds its first solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstSolutionStrategy {
    /// Extend routes with the cheapest arc from their last node.
    #[default]
    LocalCheapestArc,
    /// Insert nodes where they increase cost the least.
    CheapestInsertion,
    /// Follow the order in which nodes were declared.
    Sequential,
}

/// Improvement phase run after the first solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metaheuristic {
    /// Penalise features of local optima to escape them.
    #[default]
    GuidedLocalSearch,
    /// Accept improving moves only.
    GreedyDescent,
    /// Keep the first solution.
    Disabled,
}

/// Search settings passed to [`RoutingEngine::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParameters {
    /// Wall-clock limit for the search.
    pub time_limit: Duration,
    /// Construction heuristic.
    pub first_solution: FirstSolutionStrategy,
    /// Improvement heuristic.
    pub metaheuristic: Metaheuristic,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(3),
            first_solution: FirstSolutionStrategy::default(),
            metaheuristic: Metaheuristic::default(),
        }
    }
}

/// Value of one interval in a solved assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalValue {
    /// Name supplied in [`IntervalSpec::name`].
    pub name: String,
    /// Whether the interval is part of the solution.
    pub performed: bool,
    /// Start time.
    pub start: i64,
    /// Duration.
    pub duration: i64,
}

/// A solution found by an engine.
pub trait Assignment {
    /// Total cost, arc costs plus penalties of dropped nodes.
    fn objective(&self) -> i64;

    /// Successor of `index`. Dropped nodes are their own successor; end
    /// indices have none.
    fn next(&self, index: usize) -> Option<usize>;

    /// Lower bound of the dimension's cumul at `index`.
    fn cumul_min(&self, dimension: DimensionHandle, index: usize) -> Option<i64>;

    /// Upper bound of the dimension's cumul at `index`.
    fn cumul_max(&self, dimension: DimensionHandle, index: usize) -> Option<i64>;

    /// Every break interval of the model.
    fn intervals(&self) -> &[IntervalValue];
}

/// A routing engine that can be configured and solved.
///
/// Calls must follow the model builder's order: transits before the
/// dimensions that use them and dimensions before anything that constrains
/// them. Engines report misuse through [`EngineError`].
pub trait RoutingEngine: Sized {
    /// Solution type produced by [`RoutingEngine::solve`].
    type Solution: Assignment;

    /// Start an empty model over `space`.
    ///
    /// # Errors
    /// Engines may reject index spaces they cannot represent.
    fn create(space: IndexSpace) -> Result<Self, EngineError>;

    /// Index layout of the model.
    fn index_space(&self) -> &IndexSpace;

    /// Register `callback` for `vehicle` and make it the vehicle's arc cost.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownVehicle`] for vehicles outside the fleet.
    fn register_vehicle_transit(
        &mut self,
        vehicle: usize,
        callback: TransitCallback,
    ) -> Result<TransitHandle, EngineError>;

    /// Register a callback depending only on the origin index.
    ///
    /// # Errors
    /// Engines may refuse further callbacks once solved.
    fn register_unary_transit(
        &mut self,
        callback: UnaryTransitCallback,
    ) -> Result<TransitHandle, EngineError>;

    /// Add a cumulative dimension.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownTransit`] or
    /// [`EngineError::VehicleArity`] for malformed specs.
    fn add_dimension(&mut self, spec: DimensionSpec) -> Result<DimensionHandle, EngineError>;

    /// Restrict the dimension's cumul at `index` to `[lower, upper]`.
    ///
    /// # Errors
    /// Returns an error for unknown dimensions or indices.
    fn set_cumul_range(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        lower: i64,
        upper: i64,
    ) -> Result<(), EngineError>;

    /// Ask the engine to minimise the cumul at `index` once a route is fixed.
    ///
    /// # Errors
    /// Returns an error for unknown dimensions or indices.
    fn minimize_cumul(&mut self, dimension: DimensionHandle, index: usize)
    -> Result<(), EngineError>;

    /// Bound the difference between a vehicle's end and start cumuls.
    ///
    /// # Errors
    /// Returns an error for unknown dimensions or vehicles.
    fn set_span_upper_bound(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        bound: i64,
    ) -> Result<(), EngineError>;

    /// Create a fixed-duration interval.
    ///
    /// # Errors
    /// Engines may refuse further intervals once solved.
    fn create_interval(&mut self, spec: IntervalSpec) -> Result<IntervalHandle, EngineError>;

    /// Make `intervals` breaks of `vehicle` on `dimension`.
    ///
    /// `service_durations[i]` is the time spent at index `i` before the
    /// vehicle may leave; breaks cannot overlap it.
    ///
    /// # Errors
    /// Returns an error for unknown handles, vehicles or a mis-sized
    /// `service_durations`.
    fn attach_breaks(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        intervals: &[IntervalHandle],
        service_durations: Vec<i64>,
    ) -> Result<(), EngineError>;

    /// Forbid the dimension's cumul at `index` from falling in any of
    /// `windows`.
    ///
    /// # Errors
    /// Returns an error for unknown dimensions or indices.
    fn add_exclusion(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        windows: &ForbiddenWindows,
    ) -> Result<(), EngineError>;

    /// Let the engine skip all of `indices` at a cost of `penalty`.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownIndex`] for indices outside the model.
    fn add_disjunction(&mut self, indices: &[usize], penalty: i64) -> Result<(), EngineError>;

    /// Search for a solution. `None` means nothing feasible was found within
    /// the limits.
    fn solve(&mut self, parameters: &SearchParameters) -> Option<Self::Solution>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn single_entries_are_shared_by_every_vehicle() {
        let spec = DimensionSpec {
            name: "load".into(),
            transits: vec![TransitHandle::new(3)],
            slack: 0,
            capacities: vec![7, 9],
            start_at_zero: true,
        };
        assert_eq!(spec.transit_for(5), Some(TransitHandle::new(3)));
        assert_eq!(spec.capacity_for(1), Some(9));
        assert_eq!(spec.capacity_for(2), None);
    }
}
