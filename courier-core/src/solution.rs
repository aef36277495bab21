//! Planned routes as handed back to callers.

use std::collections::BTreeSet;
use std::fmt;

use crate::location::Location;
use crate::registry::BreakKind;
use crate::vehicle::Vehicle;

/// Outcome of a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SolutionStatus {
    /// The engine found routes and they passed verification.
    Success,
    /// The engine found nothing feasible.
    Failed,
    /// The engine's routes broke at least one business rule.
    VerificationFailed,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
        })
    }
}

/// One visit on a vehicle's route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    /// Location visited.
    pub location: Location,
    /// Minute the vehicle arrives.
    pub arrival_time: i64,
    /// Minute the vehicle leaves.
    pub departure_time: i64,
    /// Load accumulated up to and including this visit.
    pub demand: i64,
    /// Load on board when arriving.
    pub arrival_load: i64,
    /// Load on board when leaving.
    pub departure_load: i64,
}

impl RouteStep {
    /// A step with loads still to be filled in.
    #[must_use]
    pub const fn new(location: Location, arrival_time: i64, departure_time: i64, demand: i64) -> Self {
        Self {
            location,
            arrival_time,
            departure_time,
            demand,
            arrival_load: 0,
            departure_load: 0,
        }
    }
}

/// A break as scheduled in a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakSolution {
    /// Lunch or short break.
    #[cfg_attr(feature = "serde", serde(rename = "break_type"))]
    pub kind: BreakKind,
    /// Start minute.
    #[cfg_attr(feature = "serde", serde(rename = "break_start"))]
    pub start: i64,
    /// Length in minutes.
    #[cfg_attr(feature = "serde", serde(rename = "break_duration"))]
    pub duration: i64,
}

/// The route and breaks of one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePlan {
    /// Vehicle driving the route.
    pub vehicle: Vehicle,
    /// Visits from depot to depot.
    pub steps: Vec<RouteStep>,
    /// Scheduled lunch break.
    pub lunch_break: Option<BreakSolution>,
    /// Scheduled short breaks, in start order.
    pub short_breaks: Vec<BreakSolution>,
}

impl VehiclePlan {
    /// An empty plan for `vehicle`.
    #[must_use]
    pub const fn new(vehicle: Vehicle) -> Self {
        Self {
            vehicle,
            steps: Vec::new(),
            lunch_break: None,
            short_breaks: Vec::new(),
        }
    }

    /// Minutes between the first arrival and the last departure.
    #[must_use]
    pub fn route_duration(&self) -> i64 {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => last.departure_time.saturating_sub(first.arrival_time),
            _ => 0,
        }
    }

    /// Whether the vehicle visits anything besides the depot.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.steps.iter().any(|s| !s.location.is_depot)
    }
}

/// The result of planning one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSolution {
    /// Outcome of the run.
    pub status: SolutionStatus,
    /// Human-readable outcome, or the verifier's findings.
    pub message: String,
    /// Engine objective, when a solution was found.
    pub objective_cost: Option<i64>,
    /// One plan per vehicle, in fleet order.
    pub plans: Vec<VehiclePlan>,
    location_names: BTreeSet<String>,
}

impl RoutingSolution {
    /// A solution over the locations named in `location_names`.
    #[must_use]
    pub fn new<I>(status: SolutionStatus, message: impl Into<String>, location_names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            status,
            message: message.into(),
            objective_cost: None,
            plans: Vec::new(),
            location_names: location_names.into_iter().collect(),
        }
    }

    /// Every step of every plan, in fleet then route order.
    pub fn steps(&self) -> impl Iterator<Item = &RouteStep> + '_ {
        self.plans.iter().flat_map(|p| p.steps.iter())
    }

    /// Names visited by at least one vehicle.
    #[must_use]
    pub fn visited_locations(&self) -> BTreeSet<&str> {
        self.steps().map(|s| s.location.name.as_str()).collect()
    }

    /// Names of locations no vehicle visits, sorted.
    #[must_use]
    pub fn dropped_locations(&self) -> Vec<String> {
        let visited = self.visited_locations();
        self.location_names
            .iter()
            .filter(|name| !visited.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Serialisable view of the solution.
    #[must_use]
    pub fn report(&self) -> SolutionReport {
        SolutionReport::from(self)
    }
}

/// A visit as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepReport {
    /// Location name.
    pub location: String,
    /// Accumulated load.
    pub demand: i64,
    /// Arrival minute.
    pub arrival_time: i64,
    /// Departure minute.
    pub departure_time: i64,
}

/// A vehicle plan as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanReport {
    /// Vehicle name.
    pub vehicle: String,
    /// Minutes between the first arrival and the last departure.
    pub route_distance: i64,
    /// Scheduled lunch break.
    pub lunch_break: Option<BreakSolution>,
    /// Scheduled short breaks.
    pub short_breaks: Vec<BreakSolution>,
    /// Visits in route order.
    pub vehicle_route: Vec<StepReport>,
}

/// A [`RoutingSolution`] flattened for serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionReport {
    /// Outcome of the run.
    pub status: SolutionStatus,
    /// Human-readable outcome.
    pub message: String,
    /// Engine objective, if any.
    pub objective_cost: Option<i64>,
    /// Locations no vehicle visits.
    pub dropped_locations: Vec<String>,
    /// One entry per vehicle.
    pub solution: Vec<PlanReport>,
}

impl From<&RoutingSolution> for SolutionReport {
    fn from(solution: &RoutingSolution) -> Self {
        Self {
            status: solution.status,
            message: solution.message.clone(),
            objective_cost: solution.objective_cost,
            dropped_locations: solution.dropped_locations(),
            solution: solution.plans.iter().map(PlanReport::from).collect(),
        }
    }
}

impl From<&VehiclePlan> for PlanReport {
    fn from(plan: &VehiclePlan) -> Self {
        Self {
            vehicle: plan.vehicle.name.clone(),
            route_distance: plan.route_duration(),
            lunch_break: plan.lunch_break,
            short_breaks: plan.short_breaks.clone(),
            vehicle_route: plan
                .steps
                .iter()
                .map(|step| StepReport {
                    location: step.location.name.clone(),
                    demand: step.demand,
                    arrival_time: step.arrival_time,
                    departure_time: step.departure_time,
                })
                .collect(),
        }
    }
}
