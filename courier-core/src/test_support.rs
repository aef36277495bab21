//! Fixtures shared by unit and behaviour tests.
//!
//! The sample request has a depot reachable by trucks and cars, two truck
//! stops and one car stop, with every leg costing five minutes.

use crate::{Location, LocationGraph, PenaltyStrategy, Tags, TimeWindow, Vehicle};

/// Uniform travel cost between any two sample locations.
pub const SAMPLE_LEG: i64 = 5;

/// Build a tag set from string slices.
#[must_use]
pub fn tags(values: &[&str]) -> Tags {
    values.iter().map(|v| (*v).to_owned()).collect()
}

fn full_day() -> Vec<TimeWindow> {
    vec![TimeWindow::new(0, 1440)]
}

/// Depot, stop `a` (truck, 08:00-20:00, demand 5, 10 minutes on site),
/// stop `b` (truck, demand 5) and stop `c` (car, 10 minutes on site).
#[must_use]
pub fn sample_locations() -> Vec<Location> {
    let specs: [(&str, &[&str], Vec<TimeWindow>, i64, i64, bool); 4] = [
        ("depot", &["truck", "car"], full_day(), 0, 0, true),
        ("a", &["truck"], vec![TimeWindow::new(480, 1200)], 5, 10, false),
        ("b", &["truck"], full_day(), 5, 0, false),
        ("c", &["car"], full_day(), 0, 10, false),
    ];
    let names: Vec<&str> = specs.iter().map(|s| s.0).collect();
    specs
        .into_iter()
        .map(|(name, access, windows, demand, service, depot)| {
            let mut location =
                Location::new(name, access.iter().copied(), windows, demand, service);
            location.is_depot = depot;
            for other in names.iter().filter(|n| **n != name) {
                location.add_distance(*other, SAMPLE_LEG);
            }
            location
        })
        .collect()
}

/// Graph over [`sample_locations`] with the default penalty strategy.
///
/// # Panics
/// Never, the sample data is valid.
#[must_use]
#[expect(clippy::expect_used, reason = "sample data is always valid")]
pub fn sample_graph() -> LocationGraph {
    LocationGraph::new(sample_locations(), PenaltyStrategy::default()).expect("valid sample graph")
}

/// A truck and a car, each carrying up to ten units.
#[must_use]
pub fn sample_fleet() -> Vec<Vehicle> {
    vec![
        Vehicle::new("truck", ["truck"], 10),
        Vehicle::new("car", ["car"], 10),
    ]
}

/// A depot plus `stops`, all truck-accessible and open all day.
///
/// Every stop delivers one unit and `distance(from, to)` prices each leg.
///
/// # Panics
/// Panics when `stops` repeats a name or contains `depot`.
#[must_use]
#[expect(clippy::expect_used, reason = "test fixture with caller-controlled names")]
pub fn uniform_graph(stops: &[&str], distance: impl Fn(&str, &str) -> i64) -> LocationGraph {
    let names: Vec<&str> = std::iter::once("depot").chain(stops.iter().copied()).collect();
    let locations = names
        .iter()
        .map(|name| {
            let demand = i64::from(*name != "depot");
            let mut location = Location::new(*name, ["truck"], full_day(), demand, 0);
            location.is_depot = *name == "depot";
            for other in names.iter().filter(|n| *n != name) {
                location.add_distance(*other, distance(*name, *other));
            }
            location
        })
        .collect();
    LocationGraph::new(locations, PenaltyStrategy::default()).expect("valid uniform graph")
}
