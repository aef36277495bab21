//! Tests for `CpPlanner`.

use super::*;
use courier_core::test_support::{sample_fleet, sample_locations, uniform_graph};
use courier_core::{GraphError, Location, RegistryError, Vehicle};
use courier_engine::InsertionEngine;
use rstest::rstest;

use crate::test_support::RecordingEngine;

fn sample_request() -> PlanRequest {
    PlanRequest::new(sample_locations(), sample_fleet())
}

/// Depot plus three stops of five units each, served by one truck that
/// carries ten.
fn reload_request() -> PlanRequest {
    let graph = uniform_graph(&["s1", "s2", "s3"], |_, _| 5);
    let locations: Vec<Location> = graph
        .locations()
        .iter()
        .cloned()
        .map(|mut l| {
            if !l.is_depot {
                l.demand = 5;
            }
            l
        })
        .collect();
    PlanRequest::new(locations, vec![Vehicle::new("truck", ["truck"], 10)])
}

#[rstest]
fn engines_without_a_solution_yield_a_failed_plan() {
    let solution = CpPlanner::<RecordingEngine>::new()
        .plan(&sample_request())
        .expect("plan");
    assert_eq!(solution.status, SolutionStatus::Failed);
    assert_eq!(solution.message, "Solution not found");
    assert!(solution.plans.is_empty());
    assert_eq!(solution.dropped_locations().len(), 4);
}

#[rstest]
fn an_empty_fleet_is_rejected() {
    let request = PlanRequest::new(sample_locations(), Vec::new());
    let err = CpPlanner::<RecordingEngine>::new()
        .plan(&request)
        .expect_err("no vehicles");
    assert_eq!(err, PlanError::Registry(RegistryError::EmptyFleet));
}

#[rstest]
fn a_request_without_depot_is_rejected() {
    let mut locations = sample_locations();
    locations[0].is_depot = false;
    let request = PlanRequest::new(locations, sample_fleet());
    let err = CpPlanner::<RecordingEngine>::new()
        .plan(&request)
        .expect_err("no depot");
    assert!(matches!(err, PlanError::Graph(GraphError::MissingDepot)));
}

#[rstest]
fn the_sample_day_is_fully_served() {
    let solution = CpPlanner::<InsertionEngine>::new()
        .plan(&sample_request())
        .expect("plan");
    assert_eq!(solution.status, SolutionStatus::Success, "{}", solution.message);
    assert!(solution.dropped_locations().is_empty());
    for step in solution.steps().filter(|s| !s.location.is_depot) {
        assert_eq!(
            step.arrival_load - step.departure_load,
            step.location.demand,
            "unload at {}",
            step.location.name
        );
    }
    let truck: Vec<&str> = solution.plans[0]
        .steps
        .iter()
        .map(|s| s.location.name.as_str())
        .collect();
    assert_eq!(truck, vec!["depot", "a", "b", "depot"]);
    assert_eq!(solution.plans[0].steps[1].arrival_time, 480);
}

#[rstest]
fn capacity_drops_a_stop_without_reloads() {
    let solution = CpPlanner::<InsertionEngine>::new()
        .plan(&reload_request())
        .expect("plan");
    assert_eq!(solution.status, SolutionStatus::Success, "{}", solution.message);
    assert_eq!(solution.dropped_locations().len(), 1);
}

#[rstest]
#[case::overridden_by_config(0, Some(1))]
#[case::taken_from_the_request(1, None)]
fn a_reload_serves_every_stop(#[case] requested: usize, #[case] configured: Option<usize>) {
    let mut request = reload_request();
    request.max_reload = requested;
    let planner = CpPlanner::<InsertionEngine>::with_config(PlannerConfig {
        max_reload: configured,
        ..PlannerConfig::default()
    });
    let solution = planner.plan(&request).expect("plan");
    assert_eq!(solution.status, SolutionStatus::Success, "{}", solution.message);
    assert!(solution.dropped_locations().is_empty());
    let depot_visits = solution.plans[0]
        .steps
        .iter()
        .filter(|s| s.location.is_depot)
        .count();
    assert_eq!(depot_visits, 3);
}

#[rstest]
fn configured_penalties_replace_the_request_strategy() {
    let mut locations = sample_locations();
    locations[2].demand = -3;
    let request = PlanRequest::new(locations, sample_fleet());
    let planner = CpPlanner::<RecordingEngine>::with_config(PlannerConfig {
        penalty: Some(PenaltyStrategy::DemandMultiplier),
        ..PlannerConfig::default()
    });
    let err = planner.plan(&request).expect_err("negative penalty");
    assert!(matches!(err, PlanError::NegativePenalty { .. }));
}
