//! Reading an engine assignment back into routes.

use courier_core::engine::{Assignment, DimensionHandle, EngineError, IndexSpace, RoutingEngine};
use courier_core::{
    BreakKind, BreakSolution, GraphError, LocationGraph, PlanError, RouteStep, RoutingSolution,
    SolutionStatus, Tags, VehiclePlan, VehicleRegistry,
};

use crate::model::RoutingModel;

/// Turns an [`Assignment`] into a [`RoutingSolution`].
///
/// Each step is read at a hop `(current, next)`: arrival is the time cumul at
/// `current`, departure is the time cumul at `next` minus the travel between
/// them, and the cumulative demand is the load cumul at `next`. The final
/// depot step pairs with itself.
#[derive(Debug, Clone, Copy)]
pub struct SolutionExtractor<'a> {
    graph: &'a LocationGraph,
    registry: &'a VehicleRegistry,
    space: IndexSpace,
    time: DimensionHandle,
    load: DimensionHandle,
}

impl<'a> SolutionExtractor<'a> {
    /// Extractor for assignments of `model`.
    #[must_use]
    pub fn new<E: RoutingEngine>(model: &'a RoutingModel<E>) -> Self {
        Self {
            graph: model.graph(),
            registry: model.registry(),
            space: *model.engine().index_space(),
            time: model.time_dimension(),
            load: model.load_dimension(),
        }
    }

    /// Build the solution for `assignment`, or a failed one when the engine
    /// found nothing.
    ///
    /// # Errors
    /// Returns [`PlanError::Engine`] when the assignment is missing values
    /// for indices on a route.
    pub fn extract<A: Assignment>(
        &self,
        assignment: Option<&A>,
    ) -> Result<RoutingSolution, PlanError> {
        let names = self.graph.locations().iter().map(|l| l.name.clone());
        let Some(solved) = assignment else {
            return Ok(RoutingSolution::new(
                SolutionStatus::Failed,
                "Solution not found",
                names,
            ));
        };
        let mut solution = RoutingSolution::new(SolutionStatus::Success, "Solution found", names);
        solution.objective_cost = Some(solved.objective());
        for (vehicle, spec) in self.registry.vehicles().iter().enumerate() {
            let mut plan = VehiclePlan::new(spec.clone());
            plan.steps = self.route(solved, vehicle, &spec.capabilities)?;
            assign_loads(&mut plan.steps);
            let (lunch, shorts) = self.breaks(solved, vehicle)?;
            plan.lunch_break = lunch;
            plan.short_breaks = shorts;
            solution.plans.push(plan);
        }
        Ok(solution)
    }

    fn route<A: Assignment>(
        &self,
        assignment: &A,
        vehicle: usize,
        capabilities: &Tags,
    ) -> Result<Vec<RouteStep>, PlanError> {
        let mut current = self
            .space
            .start(vehicle)
            .ok_or(EngineError::UnknownVehicle(vehicle))?;
        let mut steps = Vec::new();
        for _ in 0..self.space.total() {
            let at_end = self.space.is_end(current);
            let next = if at_end {
                current
            } else {
                assignment
                    .next(current)
                    .ok_or(EngineError::UnknownIndex(current))?
            };
            steps.push(self.step(assignment, capabilities, current, next)?);
            if at_end {
                return Ok(steps);
            }
            current = next;
        }
        Err(EngineError::UnknownIndex(current).into())
    }

    fn step<A: Assignment>(
        &self,
        assignment: &A,
        capabilities: &Tags,
        current: usize,
        next: usize,
    ) -> Result<RouteStep, PlanError> {
        let from = self.node(current)?;
        let to = self.node(next)?;
        let arrival = cumul(assignment.cumul_min(self.time, current), current)?;
        let ready_next = cumul(assignment.cumul_min(self.time, next), next)?;
        let travel = self.graph.distance(capabilities, from, to)?;
        let demand = cumul(assignment.cumul_max(self.load, next), next)?;
        let location = self.graph.location(from)?.clone();
        Ok(RouteStep::new(
            location,
            arrival,
            ready_next.saturating_sub(travel),
            demand,
        ))
    }

    fn breaks<A: Assignment>(
        &self,
        assignment: &A,
        vehicle: usize,
    ) -> Result<(Option<BreakSolution>, Vec<BreakSolution>), PlanError> {
        let ledger = self.registry.breaks(vehicle)?;
        let start = self.vehicle_time(assignment, self.space.start(vehicle), vehicle)?;
        let end = self.vehicle_time(assignment, self.space.end(vehicle), vehicle)?;
        let mut lunch = None;
        let mut shorts = Vec::new();
        for interval in assignment.intervals().iter().filter(|i| i.performed) {
            let Some(kind) = ledger.kind_of(&interval.name) else {
                continue;
            };
            if interval.start < start || interval.start >= end {
                continue;
            }
            let taken = BreakSolution {
                kind,
                start: interval.start,
                duration: interval.duration,
            };
            match kind {
                BreakKind::Lunch => {
                    lunch.get_or_insert(taken);
                }
                BreakKind::Short => shorts.push(taken),
            }
        }
        shorts.sort_by_key(|b| b.start);
        Ok((lunch, shorts))
    }

    fn vehicle_time<A: Assignment>(
        &self,
        assignment: &A,
        index: Option<usize>,
        vehicle: usize,
    ) -> Result<i64, PlanError> {
        let bound = index.ok_or(EngineError::UnknownVehicle(vehicle))?;
        cumul(assignment.cumul_min(self.time, bound), bound)
    }

    fn node(&self, index: usize) -> Result<usize, GraphError> {
        self.space
            .index_to_node(index)
            .ok_or(GraphError::IndexOutOfRange {
                index,
                len: self.space.total(),
            })
    }
}

fn cumul(value: Option<i64>, index: usize) -> Result<i64, PlanError> {
    value.ok_or_else(|| EngineError::UnknownIndex(index).into())
}

/// Recompute loads from cumulative demand.
///
/// The vehicle leaves the depot with the whole route's demand; at each step
/// it leaves with the total minus what has been delivered so far and arrives
/// with whatever it left the previous step with.
fn assign_loads(steps: &mut [RouteStep]) {
    let total = steps.last().map_or(0, |s| s.demand);
    let mut carried = 0;
    for step in steps {
        step.arrival_load = carried;
        step.departure_load = total.saturating_sub(step.demand);
        carried = step.departure_load;
    }
}
