//! `InsertionEngine` and its model tables.

use courier_core::ForbiddenWindows;
use courier_core::engine::{
    DimensionHandle, DimensionSpec, EngineError, IndexSpace, IntervalHandle, IntervalSpec,
    RoutingEngine, SearchParameters, TransitCallback, TransitHandle, UnaryTransitCallback,
};

use crate::schedule::{Dimension, VehicleBreaks};
use crate::search::Search;
use crate::solution::InsertionSolution;

enum Transit {
    Binary(TransitCallback),
    Unary(UnaryTransitCallback),
}

impl Transit {
    fn evaluate(&self, from: usize, to: usize) -> i64 {
        match self {
            Self::Binary(callback) => callback(from, to),
            Self::Unary(callback) => callback(from),
        }
    }
}

/// Indices that may be skipped together at a cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Disjunction {
    pub(crate) indices: Vec<usize>,
    pub(crate) penalty: i64,
}

/// Deterministic cheapest-insertion routing engine.
///
/// The engine builds one solution with the configured
/// [`FirstSolutionStrategy`](courier_core::engine::FirstSolutionStrategy)
/// and stops. Improvement settings are accepted but not acted on. Every
/// candidate route is re-timed against all dimensions, so the solution
/// honours ranges, forbidden periods, spans, breaks and capacities exactly.
///
/// Nodes outside any disjunction are mandatory; failing to place one makes
/// `solve` return `None`. Optional nodes are inserted only when doing so costs
/// less than their penalty. Zero-penalty nodes, such as depot reload copies,
/// are only ever inserted alongside a stop that cannot be placed on its own.
///
/// # Examples
/// ```
/// use courier_core::engine::{
///     Assignment, DimensionSpec, IndexSpace, RoutingEngine, SearchParameters,
/// };
/// use courier_engine::InsertionEngine;
///
/// // Depot plus two stops, one vehicle, every move costs 10.
/// let space = IndexSpace::new(3, 1, 0)?;
/// let mut engine = InsertionEngine::create(space)?;
/// let travel = engine.register_vehicle_transit(0, Box::new(|_, _| 10))?;
/// engine.add_dimension(DimensionSpec {
///     name: "time".into(),
///     transits: vec![travel],
///     slack: 0,
///     capacities: vec![100],
///     start_at_zero: true,
/// })?;
/// let solution = engine.solve(&SearchParameters::default()).expect("feasible");
/// assert_eq!(solution.objective(), 30);
/// # Ok::<(), courier_core::engine::EngineError>(())
/// ```
pub struct InsertionEngine {
    space: IndexSpace,
    transits: Vec<Transit>,
    arc_costs: Vec<Option<TransitHandle>>,
    dimensions: Vec<Dimension>,
    intervals: Vec<IntervalSpec>,
    disjunctions: Vec<Disjunction>,
}

impl InsertionEngine {
    pub(crate) const fn space(&self) -> &IndexSpace {
        &self.space
    }

    pub(crate) fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub(crate) fn intervals(&self) -> &[IntervalSpec] {
        &self.intervals
    }

    pub(crate) fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    /// Value of a registered transit. Unary transits ignore `to`.
    pub(crate) fn transit(&self, handle: TransitHandle, from: usize, to: usize) -> Option<i64> {
        self.transits
            .get(handle.index())
            .map(|t| t.evaluate(from, to))
    }

    /// Cost of driving `from -> to` with `vehicle`; free when the vehicle
    /// has no arc cost.
    pub(crate) fn arc_cost(&self, vehicle: usize, from: usize, to: usize) -> i64 {
        self.arc_costs
            .get(vehicle)
            .copied()
            .flatten()
            .and_then(|handle| self.transit(handle, from, to))
            .unwrap_or(0)
    }

    fn check_vehicle(&self, vehicle: usize) -> Result<(), EngineError> {
        if vehicle < self.space.num_vehicles() {
            Ok(())
        } else {
            Err(EngineError::UnknownVehicle(vehicle))
        }
    }

    fn check_index(&self, index: usize) -> Result<(), EngineError> {
        if index < self.space.total() {
            Ok(())
        } else {
            Err(EngineError::UnknownIndex(index))
        }
    }

    fn check_per_vehicle(&self, what: &'static str, len: usize) -> Result<(), EngineError> {
        let expected = self.space.num_vehicles();
        if len == 1 || len == expected {
            Ok(())
        } else {
            Err(EngineError::VehicleArity {
                what,
                expected,
                actual: len,
            })
        }
    }

    fn dimension_mut(&mut self, handle: DimensionHandle) -> Result<&mut Dimension, EngineError> {
        self.dimensions
            .get_mut(handle.index())
            .ok_or(EngineError::UnknownDimension(handle.index()))
    }

    fn push_transit(&mut self, transit: Transit) -> TransitHandle {
        self.transits.push(transit);
        TransitHandle::new(self.transits.len().saturating_sub(1))
    }
}

impl RoutingEngine for InsertionEngine {
    type Solution = InsertionSolution;

    fn create(space: IndexSpace) -> Result<Self, EngineError> {
        Ok(Self {
            space,
            transits: Vec::new(),
            arc_costs: vec![None; space.num_vehicles()],
            dimensions: Vec::new(),
            intervals: Vec::new(),
            disjunctions: Vec::new(),
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
        let handle = self.push_transit(Transit::Binary(callback));
        if let Some(slot) = self.arc_costs.get_mut(vehicle) {
            *slot = Some(handle);
        }
        Ok(handle)
    }

    fn register_unary_transit(
        &mut self,
        callback: UnaryTransitCallback,
    ) -> Result<TransitHandle, EngineError> {
        Ok(self.push_transit(Transit::Unary(callback)))
    }

    fn add_dimension(&mut self, spec: DimensionSpec) -> Result<DimensionHandle, EngineError> {
        if let Some(unknown) = spec
            .transits
            .iter()
            .find(|t| t.index() >= self.transits.len())
        {
            return Err(EngineError::UnknownTransit(unknown.index()));
        }
        self.check_per_vehicle("transits", spec.transits.len())?;
        self.check_per_vehicle("capacities", spec.capacities.len())?;
        log::debug!("adding dimension `{}`", spec.name);
        self.dimensions.push(Dimension::new(spec));
        Ok(DimensionHandle::new(self.dimensions.len().saturating_sub(1)))
    }

    fn set_cumul_range(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        lower: i64,
        upper: i64,
    ) -> Result<(), EngineError> {
        self.check_index(index)?;
        self.dimension_mut(dimension)?.restrict(index, lower, upper);
        Ok(())
    }

    fn minimize_cumul(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
    ) -> Result<(), EngineError> {
        self.check_index(index)?;
        let target = self.dimension_mut(dimension)?;
        log::trace!("`{}` at {index} is already scheduled earliest", target.name());
        Ok(())
    }

    fn set_span_upper_bound(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        bound: i64,
    ) -> Result<(), EngineError> {
        self.check_vehicle(vehicle)?;
        self.dimension_mut(dimension)?.bound_span(vehicle, bound);
        Ok(())
    }

    fn create_interval(&mut self, spec: IntervalSpec) -> Result<IntervalHandle, EngineError> {
        self.intervals.push(spec);
        Ok(IntervalHandle::new(self.intervals.len().saturating_sub(1)))
    }

    fn attach_breaks(
        &mut self,
        dimension: DimensionHandle,
        vehicle: usize,
        intervals: &[IntervalHandle],
        service_durations: Vec<i64>,
    ) -> Result<(), EngineError> {
        self.check_vehicle(vehicle)?;
        if let Some(unknown) = intervals.iter().find(|i| i.index() >= self.intervals.len()) {
            return Err(EngineError::UnknownInterval(unknown.index()));
        }
        let expected = self.space.total();
        if service_durations.len() != expected {
            return Err(EngineError::IndexArity {
                what: "service durations",
                expected,
                actual: service_durations.len(),
            });
        }
        self.dimension_mut(dimension)?.attach_breaks(
            vehicle,
            VehicleBreaks {
                intervals: intervals.to_vec(),
                service: service_durations,
            },
        );
        Ok(())
    }

    fn add_exclusion(
        &mut self,
        dimension: DimensionHandle,
        index: usize,
        windows: &ForbiddenWindows,
    ) -> Result<(), EngineError> {
        self.check_index(index)?;
        self.dimension_mut(dimension)?
            .exclude(index, windows.clone());
        Ok(())
    }

    fn add_disjunction(&mut self, indices: &[usize], penalty: i64) -> Result<(), EngineError> {
        let first_start = self.space.num_nodes().saturating_sub(1);
        if let Some(unknown) = indices.iter().find(|i| **i >= first_start) {
            return Err(EngineError::UnknownIndex(*unknown));
        }
        self.disjunctions.push(Disjunction {
            indices: indices.to_vec(),
            penalty,
        });
        Ok(())
    }

    fn solve(&mut self, parameters: &SearchParameters) -> Option<Self::Solution> {
        Search::new(self, parameters).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::engine::{Assignment, FirstSolutionStrategy};
    use rstest::rstest;

    const LEG: i64 = 10;

    /// One vehicle, depot node 0 and `demands.len()` stops. Every move
    /// takes `LEG` minutes.
    fn engine(demands: &'static [i64], capacity: i64) -> (InsertionEngine, DimensionHandle) {
        let space = IndexSpace::new(demands.len() + 1, 1, 0).expect("space");
        let mut engine = InsertionEngine::create(space).expect("engine");
        let travel = engine
            .register_vehicle_transit(0, Box::new(|_, _| LEG))
            .expect("travel");
        let time = engine
            .add_dimension(DimensionSpec {
                name: "time".into(),
                transits: vec![travel],
                slack: 1000,
                capacities: vec![10_000],
                start_at_zero: false,
            })
            .expect("time");
        let demand = engine
            .register_unary_transit(Box::new(move |index| {
                demands.get(index).copied().unwrap_or(0)
            }))
            .expect("demand");
        engine
            .add_dimension(DimensionSpec {
                name: "load".into(),
                transits: vec![demand],
                slack: capacity,
                capacities: vec![capacity],
                start_at_zero: true,
            })
            .expect("load");
        (engine, time)
    }

    fn route(solution: &InsertionSolution, space: &IndexSpace) -> Vec<usize> {
        let mut visited = Vec::new();
        let mut current = space.start(0).expect("start");
        while let Some(next) = solution.next(current) {
            visited.push(next);
            current = next;
        }
        visited
    }

    #[rstest]
    fn transits_need_a_known_vehicle() {
        let (mut engine, _) = engine(&[0], 10);
        let err = engine
            .register_vehicle_transit(3, Box::new(|_, _| 0))
            .expect_err("vehicle 3 does not exist");
        assert_eq!(err, EngineError::UnknownVehicle(3));
    }

    #[rstest]
    fn dimensions_check_their_transits() {
        let (mut engine, _) = engine(&[0], 10);
        let spec = DimensionSpec {
            name: "bad".into(),
            transits: vec![TransitHandle::new(7)],
            slack: 0,
            capacities: vec![1],
            start_at_zero: true,
        };
        assert_eq!(
            engine.add_dimension(spec).expect_err("unknown transit"),
            EngineError::UnknownTransit(7)
        );
    }

    #[rstest]
    fn per_vehicle_tables_must_match_the_fleet() {
        let space = IndexSpace::new(2, 2, 0).expect("space");
        let mut engine = InsertionEngine::create(space).expect("engine");
        let shared = engine
            .register_unary_transit(Box::new(|_| 0))
            .expect("transit");
        let err = engine
            .add_dimension(DimensionSpec {
                name: "load".into(),
                transits: vec![shared],
                slack: 0,
                capacities: vec![1, 2, 3],
                start_at_zero: true,
            })
            .expect_err("three capacities for two vehicles");
        assert_eq!(
            err,
            EngineError::VehicleArity {
                what: "capacities",
                expected: 2,
                actual: 3,
            }
        );
    }

    #[rstest]
    fn constraints_reject_unknown_targets() {
        let (mut engine, time) = engine(&[0], 10);
        assert_eq!(
            engine.set_cumul_range(time, 9, 0, 1),
            Err(EngineError::UnknownIndex(9))
        );
        assert_eq!(
            engine.minimize_cumul(DimensionHandle::new(5), 0),
            Err(EngineError::UnknownDimension(5))
        );
        assert_eq!(
            engine.attach_breaks(time, 0, &[IntervalHandle::new(0)], vec![0; 3]),
            Err(EngineError::UnknownInterval(0))
        );
    }

    #[rstest]
    fn break_service_covers_every_index() {
        let (mut engine, time) = engine(&[0], 10);
        let lunch = engine
            .create_interval(IntervalSpec {
                min_start: 0,
                max_start: 10,
                duration: 5,
                optional: false,
                name: "lunch".into(),
            })
            .expect("interval");
        assert_eq!(
            engine.attach_breaks(time, 0, &[lunch], vec![0; 2]),
            Err(EngineError::IndexArity {
                what: "service durations",
                expected: 3,
                actual: 2,
            })
        );
    }

    #[rstest]
    fn starts_and_ends_cannot_be_dropped() {
        let (mut engine, _) = engine(&[0], 10);
        assert_eq!(
            engine.add_disjunction(&[1], 0),
            Err(EngineError::UnknownIndex(1))
        );
    }

    #[rstest]
    #[case::local_cheapest_arc(FirstSolutionStrategy::LocalCheapestArc)]
    #[case::cheapest_insertion(FirstSolutionStrategy::CheapestInsertion)]
    #[case::sequential(FirstSolutionStrategy::Sequential)]
    fn every_strategy_routes_all_mandatory_stops(#[case] strategy: FirstSolutionStrategy) {
        let (mut engine, _) = engine(&[1, 1, 1], 10);
        let parameters = SearchParameters {
            first_solution: strategy,
            ..SearchParameters::default()
        };
        let solution = engine.solve(&parameters).expect("solution");
        let mut visited = route(&solution, engine.index_space());
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2, 4]);
        assert_eq!(solution.objective(), 4 * LEG);
    }

    #[rstest]
    #[case::worth_visiting(15, true, 2 * LEG)]
    #[case::cheaper_to_drop(5, false, LEG + 5)]
    fn optional_stops_are_visited_only_when_cheaper_than_their_penalty(
        #[case] penalty: i64,
        #[case] visited: bool,
        #[case] objective: i64,
    ) {
        let (mut engine, _) = engine(&[0], 10);
        engine.add_disjunction(&[0], penalty).expect("disjunction");
        let solution = engine.solve(&SearchParameters::default()).expect("solution");
        assert_eq!(solution.next(0) != Some(0), visited);
        assert_eq!(solution.objective(), objective);
    }

    #[rstest]
    fn overloaded_mandatory_stops_have_no_solution() {
        let (mut engine, _) = engine(&[5, 5], 5);
        assert!(engine.solve(&SearchParameters::default()).is_none());
    }

    #[rstest]
    fn free_reloads_are_inserted_alongside_blocked_stops() {
        let (mut engine, _) = engine(&[5, 5, -5], 5);
        engine.add_disjunction(&[2], 0).expect("reload");
        let solution = engine.solve(&SearchParameters::default()).expect("solution");
        let mut visited = route(&solution, engine.index_space());
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2, 4]);
    }

    #[rstest]
    fn unused_reloads_stay_off_the_route() {
        let (mut engine, _) = engine(&[5, -5], 5);
        engine.add_disjunction(&[1], 0).expect("reload");
        let solution = engine.solve(&SearchParameters::default()).expect("solution");
        assert_eq!(route(&solution, engine.index_space()), vec![0, 3]);
        assert_eq!(solution.next(1), Some(1));
        assert_eq!(solution.cumul_min(DimensionHandle::new(0), 1), None);
    }

    #[rstest]
    #[case::within_slack(1000, 0, 100)]
    #[case::departure_delayed(50, 40, 100)]
    fn ranges_are_reached_by_waiting(
        #[case] slack: i64,
        #[case] departure: i64,
        #[case] arrival: i64,
    ) {
        let space = IndexSpace::new(2, 1, 0).expect("space");
        let mut engine = InsertionEngine::create(space).expect("engine");
        let travel = engine
            .register_vehicle_transit(0, Box::new(|_, _| LEG))
            .expect("travel");
        let time = engine
            .add_dimension(DimensionSpec {
                name: "time".into(),
                transits: vec![travel],
                slack,
                capacities: vec![10_000],
                start_at_zero: false,
            })
            .expect("time");
        engine.set_cumul_range(time, 0, 100, 200).expect("range");
        let solution = engine.solve(&SearchParameters::default()).expect("solution");
        assert_eq!(solution.cumul_min(time, 1), Some(departure));
        assert_eq!(solution.cumul_max(time, 0), Some(arrival));
    }

    #[rstest]
    fn attached_breaks_are_reported_where_they_were_taken() {
        let (mut engine, time) = engine(&[0], 10);
        let lunch = engine
            .create_interval(IntervalSpec {
                min_start: 15,
                max_start: 40,
                duration: 5,
                optional: false,
                name: "lunch".into(),
            })
            .expect("interval");
        engine
            .create_interval(IntervalSpec {
                min_start: 100,
                max_start: 200,
                duration: 5,
                optional: true,
                name: "unused".into(),
            })
            .expect("interval");
        engine
            .attach_breaks(time, 0, &[lunch], vec![0; 3])
            .expect("breaks");
        let solution = engine.solve(&SearchParameters::default()).expect("solution");
        let values: Vec<(&str, bool, i64)> = solution
            .intervals()
            .iter()
            .map(|i| (i.name.as_str(), i.performed, i.start))
            .collect();
        assert_eq!(values, vec![("lunch", true, 15), ("unused", false, 100)]);
        assert_eq!(solution.cumul_min(time, 2), Some(25));
    }
}
