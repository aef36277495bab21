//! Test-only utilities for `courier-solver`.
//!
//! [`RecordingEngine`] accepts every declaration, remembers it in order and
//! answers `solve` with whatever [`ScriptedAssignment`] the test queued. It
//! lets tests assert on the exact model a builder produces without running a
//! search. The helpers are gated behind the `test-support` feature (and
//! `cfg(test)`).

use std::collections::HashMap;

use courier_core::engine::{
    Assignment, DimensionHandle, DimensionSpec, EngineError, IndexSpace, IntervalHandle,
    IntervalSpec, IntervalValue, RoutingEngine, SearchParameters, TransitCallback, TransitHandle,
    UnaryTransitCallback,
};
use courier_core::ForbiddenWindows;

/// One declaration received by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// A per-vehicle transit was registered.
    VehicleTransit {
        /// Vehicle the transit prices.
        vehicle: usize,
    },
    /// A unary transit was registered.
    UnaryTransit,
    /// A dimension was added.
    Dimension(DimensionSpec),
    /// A cumul was bounded.
    CumulRange {
        /// Target dimension.
        dimension: DimensionHandle,
        /// Solver index.
        index: usize,
        /// Lower bound.
        lower: i64,
        /// Upper bound.
        upper: i64,
    },
    /// A cumul was marked for minimisation.
    MinimizeCumul {
        /// Target dimension.
        dimension: DimensionHandle,
        /// Solver index.
        index: usize,
    },
    /// A vehicle's span was bounded.
    SpanUpperBound {
        /// Target dimension.
        dimension: DimensionHandle,
        /// Vehicle.
        vehicle: usize,
        /// Longest span.
        bound: i64,
    },
    /// An interval was created.
    Interval(IntervalSpec),
    /// Breaks were attached to a vehicle.
    Breaks {
        /// Target dimension.
        dimension: DimensionHandle,
        /// Vehicle taking the breaks.
        vehicle: usize,
        /// Attached intervals.
        intervals: Vec<IntervalHandle>,
        /// Service time per solver index.
        service_durations: Vec<i64>,
    },
    /// Forbidden periods were placed on a cumul.
    Exclusion {
        /// Target dimension.
        dimension: DimensionHandle,
        /// Solver index.
        index: usize,
        /// Forbidden `(start, end)` pairs.
        windows: Vec<(i64, i64)>,
    },
    /// A disjunction was declared.
    Disjunction {
        /// Indices sharing the disjunction.
        indices: Vec<usize>,
        /// Cost of skipping them.
        penalty: i64,
    },
    /// The engine was asked to solve.
    Solve,
}

enum Transit {
    Binary(TransitCallback),
    Unary(UnaryTransitCallback),
}

/// An engine that records declarations instead of solving.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use courier_core::VehicleRegistry;
/// use courier_core::test_support::{sample_fleet, sample_graph};
/// use courier_solver::ModelBuilder;
/// use courier_solver::test_support::RecordingEngine;
///
/// let registry = VehicleRegistry::new(sample_fleet())?;
/// let model = ModelBuilder::new(Arc::new(sample_graph()), registry)
///     .build::<RecordingEngine>()?;
/// assert_eq!(model.engine().index_space().num_vehicles(), 2);
/// assert!(!model.engine().calls().is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RecordingEngine {
    space: IndexSpace,
    calls: Vec<Call>,
    transits: Vec<Transit>,
    dimensions: usize,
    intervals: usize,
    scripted: Option<ScriptedAssignment>,
}

impl RecordingEngine {
    /// Every declaration received so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Queue the assignment returned by the next `solve`.
    pub fn script(&mut self, assignment: ScriptedAssignment) {
        self.scripted = Some(assignment);
    }

    /// Evaluate a registered per-vehicle transit.
    #[must_use]
    pub fn transit(&self, handle: TransitHandle, from: usize, to: usize) -> Option<i64> {
        match self.transits.get(handle.index())? {
            Transit::Binary(callback) => Some(callback(from, to)),
            Transit::Unary(_) => None,
        }
    }

    /// Evaluate a registered unary transit.
    #[must_use]
    pub fn unary_transit(&self, handle: TransitHandle, index: usize) -> Option<i64> {
        match self.transits.get(handle.index())? {
            Transit::Unary(callback) => Some(callback(index)),
            Transit::Binary(_) => None,
        }
    }

    fn check_vehicle(&self, vehicle: usize) -> Result<(), EngineError> {
        if vehicle < self.space.num_vehicles() {
            Ok(())
        } else {
            Err(EngineError::UnknownVehicle(vehicle))
        }
    }

    fn check_dimension(&self, dimension: DimensionHandle) -> Result<(), EngineError> {
        if dimension.index() < self.dimensions {
            Ok(())
        } else {
            Err(EngineError::UnknownDimension(dimension.index()))
        }
    }

    fn check_index(&self, index: usize) -> Result<(), EngineError> {
        if index < self.space.total() {
            Ok(())
        } else {
            Err(EngineError::UnknownIndex(index))
        }
    }
}

impl RoutingEngine for RecordingEngine {
    type Solution = ScriptedAssignment;

    fn create(space: IndexSpace) -> Result<Self, EngineError> {
        Ok(Self {
            space,
            calls: Vec::new(),
            transits: Vec::new(),
            dimensions: 0,
            intervals: 0,
            scripted: None,
        })
    }

    fn index_space(&self) -> &IndexSpace {
        &self.space
    }

    fn register_vehicle_transit(
        &mut self,
        vehicle: usize,
        callback: TransitCallback,
    ) -> Result<TransitHandle, EngineError> {
        self.check_vehicle(vehicle)?;
        self.transits.push(Transit::Binary(callback));
        self.calls.push(Call::VehicleTransit { vehicle });
        Ok(TransitHandle::new(self.transits.len() - 1))
    }

    fn register_unary_transit(
        &mut self,
        callback: UnaryTransitCallback,
    ) -> Result<TransitHandle, EngineError> {
        self.transits.push(Transit::Unary(callback));
        self.calls.push(Call::UnaryTransit);
        Ok(TransitHandle::new(self.transits.len() - 1))
    }

    fn add_dimension(&mut self, spec: DimensionSpec) -> Result<DimensionHandle, EngineError> {
        if let Some(unknown) = spec
            .transits
            .iter()
            .find(|t| t.index() >= self.transits.len())
        {
            return Err(EngineError::UnknownTransit(unknown.index()));
        }
        self.calls.push(Call::Dimension(spec));
        self.dimensions += 1;
        Ok(DimensionHandle::new(self.dimensions - 1))
    }

    fn set_cumul_range(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        lower: i64,
        upper: i64,
    ) -> Result<(), EngineError> {
        self.check_dimension(dimension)?;
        self.check_index(index)?;
        self.calls.push(Call::CumulRange {
            dimension,
            index,
            lower,
            upper,
        });
        Ok(())
    }

    fn minimize_cumul(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
    ) -> Result<(), EngineError> {
        self.check_dimension(dimension)?;
        self.check_index(index)?;
        self.calls.push(Call::MinimizeCumul { dimension, index });
        Ok(())
    }

    fn set_span_upper_bound(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        bound: i64,
    ) -> Result<(), EngineError> {
        self.check_dimension(dimension)?;
        self.check_vehicle(vehicle)?;
        self.calls.push(Call::SpanUpperBound {
            dimension,
            vehicle,
            bound,
        });
        Ok(())
    }

    fn create_interval(&mut self, spec: IntervalSpec) -> Result<IntervalHandle, EngineError> {
        self.calls.push(Call::Interval(spec));
        self.intervals += 1;
        Ok(IntervalHandle::new(self.intervals - 1))
    }

    fn attach_breaks(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        intervals: &[IntervalHandle],
        service_durations: Vec<i64>,
    ) -> Result<(), EngineError> {
        self.check_dimension(dimension)?;
        self.check_vehicle(vehicle)?;
        if let Some(unknown) = intervals.iter().find(|i| i.index() >= self.intervals) {
            return Err(EngineError::UnknownInterval(unknown.index()));
        }
        if service_durations.len() != self.space.total() {
            return Err(EngineError::IndexArity {
                what: "service durations",
                expected: self.space.total(),
                actual: service_durations.len(),
            });
        }
        self.calls.push(Call::Breaks {
            dimension,
            vehicle,
            intervals: intervals.to_vec(),
            service_durations,
        });
        Ok(())
    }

    fn add_exclusion(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        windows: &ForbiddenWindows,
    ) -> Result<(), EngineError> {
        self.check_dimension(dimension)?;
        self.check_index(index)?;
        self.calls.push(Call::Exclusion {
            dimension,
            index,
            windows: windows.iter().collect(),
        });
        Ok(())
    }

    fn add_disjunction(&mut self, indices: &[usize], penalty: i64) -> Result<(), EngineError> {
        for index in indices {
            self.check_index(*index)?;
        }
        self.calls.push(Call::Disjunction {
            indices: indices.to_vec(),
            penalty,
        });
        Ok(())
    }

    fn solve(&mut self, _parameters: &SearchParameters) -> Option<Self::Solution> {
        self.calls.push(Call::Solve);
        self.scripted.take()
    }
}

/// A hand-written assignment.
///
/// Indices without a successor are treated as dropped and answer `next`
/// with themselves, like a real engine would.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedAssignment {
    objective: i64,
    successors: HashMap<usize, usize>,
    cumuls: HashMap<(DimensionHandle, usize), (i64, i64)>,
    intervals: Vec<IntervalValue>,
}

impl ScriptedAssignment {
    /// An empty assignment with the given objective.
    #[must_use]
    pub fn new(objective: i64) -> Self {
        Self {
            objective,
            ..Self::default()
        }
    }

    /// Chain `route` with successor links; the last index gets none.
    #[must_use]
    pub fn with_route(mut self, route: &[usize]) -> Self {
        for pair in route.windows(2) {
            if let [from, to] = pair {
                self.successors.insert(*from, *to);
            }
        }
        self
    }

    /// Fix the cumul of `dimension` at `index` to `value`.
    #[must_use]
    pub fn with_cumul(self, dimension: DimensionHandle, index: usize, value: i64) -> Self {
        self.with_cumul_range(dimension, index, value, value)
    }

    /// Give the cumul of `dimension` at `index` the bounds `[min, max]`.
    #[must_use]
    pub fn with_cumul_range(
        mut self,
        dimension: DimensionHandle,
        index: usize,
        min: i64,
        max: i64,
    ) -> Self {
        self.cumuls.insert((dimension, index), (min, max));
        self
    }

    /// Add an interval value.
    #[must_use]
    pub fn with_interval(mut self, value: IntervalValue) -> Self {
        self.intervals.push(value);
        self
    }
}

impl Assignment for ScriptedAssignment {
    fn objective(&self) -> i64 {
        self.objective
    }

    fn next(&self, index: usize) -> Option<usize> {
        Some(self.successors.get(&index).copied().unwrap_or(index))
    }

    fn cumul_min(&self, dimension: DimensionHandle, index: usize) -> Option<i64> {
        self.cumuls.get(&(dimension, index)).map(|(min, _)| *min)
    }

    fn cumul_max(&self, dimension: DimensionHandle, index: usize) -> Option<i64> {
        self.cumuls.get(&(dimension, index)).map(|(_, max)| *max)
    }

    fn intervals(&self) -> &[IntervalValue] {
        &self.intervals
    }
}
