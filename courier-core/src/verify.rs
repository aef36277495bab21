//! Independent re-check of extracted routes.
//!
//! The verifier trusts nothing the engine reported and re-derives every
//! business rule from the routes themselves. It never edits a route; it only
//! downgrades the solution's status and replaces its message.

use std::collections::HashSet;

use thiserror::Error;

use crate::graph::LocationGraph;
use crate::location::Tags;
use crate::solution::{RoutingSolution, SolutionStatus, VehiclePlan};

/// A business rule broken by a solution.
///
/// The display text is what ends up in the solution message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A high-priority location was not visited.
    #[error("Priority location {0} not delivered.")]
    PriorityNotDelivered(String),
    /// Some non-depot location appears more than once.
    #[error("Solution has double visit.")]
    DoubleVisit,
    /// A vehicle leaves the depot with more than it can carry.
    #[error("Vehicle {0} departure load is above maximum.")]
    Overloaded(String),
    /// A vehicle visits a location it cannot access.
    #[error("Vehicle {vehicle} types {types} has no accessibility to location {location}.")]
    Inaccessible {
        /// Vehicle name.
        vehicle: String,
        /// Vehicle capabilities, formatted as a list.
        types: String,
        /// Location name.
        location: String,
    },
    /// A location is reached outside its allowed windows.
    #[error("Invalid timing at {0}.")]
    InvalidTiming(String),
    /// The load dropped at a location differs from its demand.
    #[error("Invalid unload at {0}.")]
    InvalidUnload(String),
}

fn format_tags(tags: &Tags) -> String {
    let joined: Vec<&str> = tags.iter().map(String::as_str).collect();
    format!("[{}]", joined.join(", "))
}

/// Checks a [`RoutingSolution`] against the graph it was planned over.
#[derive(Debug, Clone, Copy)]
pub struct SolutionVerifier<'a> {
    graph: &'a LocationGraph,
}

impl<'a> SolutionVerifier<'a> {
    /// Verifier for solutions planned over `graph`.
    #[must_use]
    pub const fn new(graph: &'a LocationGraph) -> Self {
        Self { graph }
    }

    /// Every violation in `solution`, in a stable order.
    ///
    /// Priorities come first, then double visits, then per-vehicle load and
    /// accessibility, then per-step timing and unload checks.
    #[must_use]
    pub fn violations(&self, solution: &RoutingSolution) -> Vec<Violation> {
        let mut found = self.priority_violations(solution);
        if has_double_visit(solution) {
            found.push(Violation::DoubleVisit);
        }
        for plan in &solution.plans {
            found.extend(load_violation(plan));
            found.extend(accessibility_violations(plan));
        }
        for step in solution.steps().filter(|s| !s.location.is_depot) {
            let location = &step.location;
            if !location.is_open_at(step.arrival_time) {
                found.push(Violation::InvalidTiming(location.name.clone()));
            }
            let unload = step.arrival_load.saturating_sub(step.departure_load);
            if location.demand >= 0 && unload != location.demand {
                found.push(Violation::InvalidUnload(location.name.clone()));
            }
        }
        found
    }

    /// Check `solution` and downgrade it when a rule is broken.
    ///
    /// Solutions the engine failed to produce are left untouched. Running
    /// the verifier twice yields the same status and message.
    pub fn verify(&self, solution: &mut RoutingSolution) -> Vec<Violation> {
        if solution.status == SolutionStatus::Failed {
            return Vec::new();
        }
        let found = self.violations(solution);
        if !found.is_empty() {
            let messages: Vec<String> = found.iter().map(ToString::to_string).collect();
            solution.status = SolutionStatus::VerificationFailed;
            solution.message = messages.join(" ");
            log::warn!(
                "solution failed verification with {} violation(s)",
                found.len()
            );
        }
        found
    }

    fn priority_violations(&self, solution: &RoutingSolution) -> Vec<Violation> {
        let visited = solution.visited_locations();
        self.graph
            .locations()
            .iter()
            .filter(|l| l.high_priority && !visited.contains(l.name.as_str()))
            .map(|l| Violation::PriorityNotDelivered(l.name.clone()))
            .collect()
    }
}

fn has_double_visit(solution: &RoutingSolution) -> bool {
    let mut seen = HashSet::new();
    solution
        .steps()
        .filter(|s| !s.location.is_depot)
        .any(|s| !seen.insert(s.location.name.as_str()))
}

fn load_violation(plan: &VehiclePlan) -> Option<Violation> {
    plan.steps
        .first()
        .filter(|first| first.departure_load > plan.vehicle.max_load)
        .map(|_| Violation::Overloaded(plan.vehicle.name.clone()))
}

fn accessibility_violations(plan: &VehiclePlan) -> impl Iterator<Item = Violation> + '_ {
    plan.steps
        .iter()
        .filter(|s| !plan.vehicle.can_access(&s.location))
        .map(|s| Violation::Inaccessible {
            vehicle: plan.vehicle.name.clone(),
            types: format_tags(&plan.vehicle.capabilities),
            location: s.location.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::RouteStep;
    use crate::test_support::{sample_fleet, sample_graph};
    use rstest::{fixture, rstest};

    /// Truck drives depot -> a -> b -> depot with consistent loads.
    #[fixture]
    fn solved() -> (LocationGraph, RoutingSolution) {
        let graph = sample_graph();
        let names = graph.locations().iter().map(|l| l.name.clone());
        let mut solution = RoutingSolution::new(SolutionStatus::Success, "Solution found", names);
        let mut plan = VehiclePlan::new(sample_fleet().remove(0));
        let visits = [(0, 480, 480, 0, 10), (1, 485, 495, 10, 5), (2, 500, 500, 5, 0), (0, 505, 505, 0, 0)];
        for (node, arrival, departure, arrival_load, departure_load) in visits {
            let location = graph.location(node).expect("sample node").clone();
            let mut step = RouteStep::new(location, arrival, departure, 0);
            step.arrival_load = arrival_load;
            step.departure_load = departure_load;
            plan.steps.push(step);
        }
        solution.plans.push(plan);
        (graph, solution)
    }

    #[rstest]
    fn consistent_routes_pass(solved: (LocationGraph, RoutingSolution)) {
        let (graph, mut solution) = solved;
        assert!(SolutionVerifier::new(&graph).verify(&mut solution).is_empty());
        assert_eq!(solution.status, SolutionStatus::Success);
        assert_eq!(solution.message, "Solution found");
    }

    #[rstest]
    fn late_arrival_is_reported(solved: (LocationGraph, RoutingSolution)) {
        let (graph, mut solution) = solved;
        solution.plans[0].steps[1].arrival_time = -10;
        let found = SolutionVerifier::new(&graph).verify(&mut solution);
        assert_eq!(found, vec![Violation::InvalidTiming("a".into())]);
        assert_eq!(solution.status, SolutionStatus::VerificationFailed);
        assert_eq!(solution.message, "Invalid timing at a.");
    }

    #[rstest]
    fn inaccessible_stop_lists_vehicle_types(solved: (LocationGraph, RoutingSolution)) {
        let (graph, mut solution) = solved;
        let car_stop = graph.location(3).expect("stop c").clone();
        let mut step = RouteStep::new(car_stop, 502, 512, 0);
        step.arrival_load = 0;
        solution.plans[0].steps.insert(3, step);
        SolutionVerifier::new(&graph).verify(&mut solution);
        assert_eq!(
            solution.message,
            "Vehicle truck types [truck] has no accessibility to location c."
        );
    }

    #[rstest]
    fn violations_are_ordered_and_joined(solved: (LocationGraph, RoutingSolution)) {
        let (mut graph, mut solution) = solved;
        graph = {
            let mut locations = graph.locations().to_vec();
            locations[3] = locations[3].clone().with_high_priority();
            LocationGraph::new(locations, graph.penalty_strategy()).expect("graph")
        };
        solution.plans[0].steps[0].departure_load = 11;
        solution.plans[0].steps[2].departure_load = 2;
        SolutionVerifier::new(&graph).verify(&mut solution);
        assert_eq!(
            solution.message,
            "Priority location c not delivered. \
             Vehicle truck departure load is above maximum. \
             Invalid unload at b."
        );
    }

    #[rstest]
    fn reloads_are_exempt_from_unload_checks(solved: (LocationGraph, RoutingSolution)) {
        let (mut graph, mut solution) = solved;
        graph.add_depot_clones(1);
        graph.set_reload_demand(10);
        let mut reload = graph.location(4).expect("clone").clone();
        reload.is_depot = false;
        let mut step = RouteStep::new(reload, 501, 501, 0);
        step.arrival_load = 0;
        step.departure_load = 10;
        solution.plans[0].steps.insert(3, step);
        assert!(SolutionVerifier::new(&graph).violations(&solution).is_empty());
    }

    #[rstest]
    fn failed_solutions_are_not_checked(solved: (LocationGraph, RoutingSolution)) {
        let (graph, mut solution) = solved;
        solution.status = SolutionStatus::Failed;
        solution.message = "Solution not found".into();
        solution.plans[0].steps[1].arrival_time = -10;
        assert!(SolutionVerifier::new(&graph).verify(&mut solution).is_empty());
        assert_eq!(solution.status, SolutionStatus::Failed);
    }
}
