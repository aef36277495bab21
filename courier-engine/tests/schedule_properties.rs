//! Property tests for routes built by `InsertionEngine`.
//!
//! Invariants covered:
//! - every mandatory stop appears exactly once when a solution exists;
//! - load cumuls stay within `[0, capacity]` along the route;
//! - time cumuls grow by at least the travel time on every hop;
//! - a solution exists whenever the total demand fits the vehicle.
#![expect(
    clippy::expect_used,
    reason = "property tests use expect for readable failures"
)]

use courier_core::engine::{
    Assignment, DimensionHandle, DimensionSpec, IndexSpace, RoutingEngine, SearchParameters,
};
use courier_engine::{InsertionEngine, InsertionSolution};
use proptest::prelude::*;

const LEG: i64 = 7;

fn solve(demands: Vec<i64>, capacity: i64) -> (IndexSpace, Option<InsertionSolution>) {
    let stops = demands.len();
    let space = IndexSpace::new(stops + 1, 1, 0).expect("space");
    let mut engine = InsertionEngine::create(space).expect("engine");
    let travel = engine
        .register_vehicle_transit(0, Box::new(|_, _| LEG))
        .expect("travel");
    engine
        .add_dimension(DimensionSpec {
            name: "time".into(),
            transits: vec![travel],
            slack: 0,
            capacities: vec![10_000],
            start_at_zero: true,
        })
        .expect("time");
    let load = engine
        .register_unary_transit(Box::new(move |index| {
            demands.get(index).copied().unwrap_or(0)
        }))
        .expect("demand");
    engine
        .add_dimension(DimensionSpec {
            name: "load".into(),
            transits: vec![load],
            slack: capacity,
            capacities: vec![capacity],
            start_at_zero: true,
        })
        .expect("load");
    (space, engine.solve(&SearchParameters::default()))
}

fn route(space: &IndexSpace, solution: &InsertionSolution) -> Vec<usize> {
    let mut visited = vec![space.start(0).expect("start")];
    while let Some(next) = visited.last().and_then(|i| solution.next(*i)) {
        visited.push(next);
    }
    visited
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routes_respect_every_dimension(
        demands in prop::collection::vec(0_i64..=6, 1..6),
        capacity in 1_i64..=30,
    ) {
        let total: i64 = demands.iter().sum();
        let stops = demands.len();
        let (space, outcome) = solve(demands, capacity);
        prop_assert_eq!(outcome.is_some(), total <= capacity);
        if let Some(solution) = outcome {
            let visited = route(&space, &solution);
            for stop in 0..stops {
                prop_assert_eq!(visited.iter().filter(|i| **i == stop).count(), 1);
            }
            let time = DimensionHandle::new(0);
            let load = DimensionHandle::new(1);
            for index in &visited {
                let value = solution.cumul_min(load, *index).expect("load cumul");
                prop_assert!((0..=capacity).contains(&value));
            }
            for pair in visited.windows(2) {
                let before = solution.cumul_min(time, pair[0]).expect("time cumul");
                let after = solution.cumul_min(time, pair[1]).expect("time cumul");
                prop_assert!(after - before >= LEG);
            }
        }
    }
}
