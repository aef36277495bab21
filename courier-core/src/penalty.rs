//! Drop-penalty strategies.
//!
//! A strategy prices leaving a location unvisited. All arithmetic is done on
//! integers and saturates rather than overflowing.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::graph::{INFINITY, LocationGraph};
use crate::location::Location;

/// Errors raised when parsing a [`PenaltyStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PenaltyError {
    /// The identifier matches no known strategy.
    #[error("unknown drop penalty strategy `{0}`")]
    UnknownStrategy(String),
}

/// How the cost of dropping a location is computed.
///
/// # Examples
/// ```
/// use courier_core::PenaltyStrategy;
///
/// let strategy: PenaltyStrategy = "Max_Distance".parse()?;
/// assert_eq!(strategy, PenaltyStrategy::MaxDistance);
/// assert_eq!(PenaltyStrategy::default(), PenaltyStrategy::DepotDistance);
/// # Ok::<(), courier_core::PenaltyError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PenaltyStrategy {
    /// Length of a greedy nearest-neighbour tour through every location.
    MaxRoute,
    /// Order of magnitude of the greedy tour, scaled by the location's demand.
    DemandMultiplier,
    /// Twice the longest single leg, service time included.
    MaxDistance,
    /// Twice the round trip to the depot plus both service times and a day.
    #[default]
    DepotDistance,
}

impl PenaltyStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::MaxRoute,
        Self::DemandMultiplier,
        Self::MaxDistance,
        Self::DepotDistance,
    ];

    /// Configuration identifier of the strategy.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::MaxRoute => "max-route",
            Self::DemandMultiplier => "demand",
            Self::MaxDistance => "max-distance",
            Self::DepotDistance => "depot-distance",
        }
    }

    /// Cost of dropping `location` from `graph`.
    #[must_use]
    pub fn penalty(self, graph: &LocationGraph, location: &Location) -> i64 {
        match self {
            Self::MaxRoute => max_route(graph),
            Self::DemandMultiplier => demand_multiplier(graph, location),
            Self::MaxDistance => max_distance(graph),
            Self::DepotDistance => depot_distance(graph, location),
        }
    }
}

impl fmt::Display for PenaltyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for PenaltyStrategy {
    type Err = PenaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c.to_ascii_lowercase() })
            .collect();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.identifier() == normalised)
            .ok_or_else(|| PenaltyError::UnknownStrategy(s.to_owned()))
    }
}

/// Greedy tour from the depot, always moving to the cheapest unvisited
/// location, then back to the depot.
///
/// Depot copies share the depot's name and are never revisited. Ties go to
/// the lower node index.
fn max_route(graph: &LocationGraph) -> i64 {
    let Ok(depot) = graph.depot() else {
        return INFINITY;
    };
    let mut visited: HashSet<&str> = HashSet::from([depot.name.as_str()]);
    let mut current = depot;
    let mut total: i64 = 0;

    loop {
        let next = graph
            .locations()
            .iter()
            .filter(|l| !l.is_clone && !visited.contains(l.name.as_str()))
            .filter_map(|l| current.distance_to(&l.name).map(|d| (d, l)))
            .min_by_key(|(d, _)| *d);
        let Some((leg, location)) = next else {
            break;
        };
        total = total.saturating_add(leg);
        visited.insert(location.name.as_str());
        current = location;
    }

    total.saturating_add(current.distance_to(&depot.name).unwrap_or(INFINITY))
}

/// `round(log10(value))`, rounding half up, for positive `value`.
fn decimal_magnitude(value: i64) -> u32 {
    if value <= 0 {
        return 0;
    }
    let floor = value.ilog10();
    let squared = u128::from(value.unsigned_abs()).saturating_mul(u128::from(value.unsigned_abs()));
    let threshold = 10_u128.checked_pow(floor.saturating_mul(2).saturating_add(1));
    match threshold {
        Some(t) if squared >= t => floor.saturating_add(1),
        _ => floor,
    }
}

fn demand_multiplier(graph: &LocationGraph, location: &Location) -> i64 {
    let magnitude = decimal_magnitude(max_route(graph));
    10_i64
        .checked_pow(magnitude)
        .map_or(i64::MAX, |scale| scale.saturating_mul(location.demand))
}

fn max_distance(graph: &LocationGraph) -> i64 {
    let longest = graph
        .locations()
        .iter()
        .flat_map(|l| l.distances().iter())
        .map(|(name, distance)| {
            let service = graph.location_by_name(name).map_or(0, |l| l.service_time);
            distance.saturating_add(service)
        })
        .max()
        .unwrap_or(0);
    longest.max(0).saturating_mul(2)
}

fn depot_distance(graph: &LocationGraph, location: &Location) -> i64 {
    let Ok(depot) = graph.depot() else {
        return INFINITY;
    };
    let leg = location.distance_to(&depot.name).unwrap_or(INFINITY);
    leg.saturating_mul(2)
        .saturating_add(location.service_time)
        .saturating_add(depot.service_time)
        .saturating_add(crate::graph::DAY_END)
}
