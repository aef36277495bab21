//! The set of locations a request plans over.
//!
//! [`LocationGraph`] owns every location, knows which one is the depot and
//! answers the questions the model builder and verifier ask about them:
//! gated travel costs, forbidden visit periods and drop penalties.

use std::collections::HashSet;

use thiserror::Error;

use crate::location::{Location, Tags, TimeWindow};
use crate::penalty::PenaltyStrategy;

/// Cost standing in for "unreachable" and "never drop".
pub const INFINITY: i64 = 100_000_000;

/// First minute of the planning day.
pub const DAY_START: i64 = 0;

/// Last minute of the planning day.
pub const DAY_END: i64 = 1440;

/// Errors raised while building or querying a [`LocationGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No location was flagged as the depot.
    #[error("no depot location was supplied")]
    MissingDepot,
    /// Two locations share a name.
    #[error("location `{0}` is defined more than once")]
    DuplicateLocation(String),
    /// A distance entry names a location that does not exist.
    #[error("location `{from}` has a distance to unknown location `{to}`")]
    UnknownDistanceTarget {
        /// Location owning the distance map.
        from: String,
        /// Name that could not be resolved.
        to: String,
    },
    /// A node index outside the graph was requested.
    #[error("location index {index} is out of range for {len} locations")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of locations in the graph.
        len: usize,
    },
    /// A name lookup failed.
    #[error("location `{0}` not found")]
    LocationNotFound(String),
}

/// Closed periods during which a location must not be visited.
///
/// `starts[i]..=ends[i]` is the `i`th forbidden period. The vectors always
/// have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenWindows {
    /// Inclusive start of each forbidden period.
    pub starts: Vec<i64>,
    /// Inclusive end of each forbidden period.
    pub ends: Vec<i64>,
}

impl ForbiddenWindows {
    /// Number of forbidden periods.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.starts.len()
    }

    /// Whether the location is open for the whole day.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Iterate over `(start, end)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.starts.iter().copied().zip(self.ends.iter().copied())
    }

    /// Whether `minute` lies inside any forbidden period.
    #[must_use]
    pub fn forbids(&self, minute: i64) -> bool {
        self.iter().any(|(start, end)| minute >= start && minute <= end)
    }

    fn push(&mut self, start: i64, end: i64) {
        if start <= end {
            self.starts.push(start);
            self.ends.push(end);
        }
    }
}

/// Complement of `windows` within the planning day.
///
/// Windows are clipped to `[DAY_START, DAY_END]` and merged before the gaps
/// between them are emitted. Each gap stops one minute short of the
/// neighbouring allowed window. An empty list yields no forbidden periods.
///
/// # Examples
/// ```
/// use courier_core::{forbidden_windows, TimeWindow};
///
/// let forbidden = forbidden_windows(&[TimeWindow::new(480, 1200)]);
/// assert_eq!(forbidden.starts, vec![0, 1201]);
/// assert_eq!(forbidden.ends, vec![479, 1440]);
/// ```
#[must_use]
pub fn forbidden_windows(windows: &[TimeWindow]) -> ForbiddenWindows {
    let mut forbidden = ForbiddenWindows::default();
    if windows.is_empty() {
        return forbidden;
    }

    let mut clipped: Vec<TimeWindow> = windows
        .iter()
        .map(|w| TimeWindow::new(w.start.max(DAY_START), w.end.min(DAY_END)))
        .filter(|w| w.start <= w.end)
        .collect();
    clipped.sort_unstable();

    let mut merged: Vec<TimeWindow> = Vec::with_capacity(clipped.len());
    for window in clipped {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => last.end = last.end.max(window.end),
            _ => merged.push(window),
        }
    }

    let mut next_free = DAY_START;
    for window in &merged {
        forbidden.push(next_free, window.start.saturating_sub(1));
        next_free = window.end.saturating_add(1);
    }
    forbidden.push(next_free, DAY_END);
    forbidden
}

/// Locations of one planning request, depot first among equals.
#[derive(Debug, Clone)]
pub struct LocationGraph {
    locations: Vec<Location>,
    depot: usize,
    penalty: PenaltyStrategy,
}

impl LocationGraph {
    /// Validate `locations` and build a graph.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingDepot`] when no location is a depot,
    /// [`GraphError::DuplicateLocation`] for repeated names and
    /// [`GraphError::UnknownDistanceTarget`] when a distance entry names a
    /// location that is not part of the request.
    pub fn new(locations: Vec<Location>, penalty: PenaltyStrategy) -> Result<Self, GraphError> {
        let mut names = HashSet::with_capacity(locations.len());
        for location in &locations {
            if !names.insert(location.name.as_str()) {
                return Err(GraphError::DuplicateLocation(location.name.clone()));
            }
        }
        for location in &locations {
            let mut targets: Vec<&String> = location.distances().keys().collect();
            targets.sort_unstable();
            if let Some(unknown) = targets.into_iter().find(|t| !names.contains(t.as_str())) {
                return Err(GraphError::UnknownDistanceTarget {
                    from: location.name.clone(),
                    to: unknown.clone(),
                });
            }
        }
        let depot = locations
            .iter()
            .position(|l| l.is_depot)
            .ok_or(GraphError::MissingDepot)?;
        Ok(Self {
            locations,
            depot,
            penalty,
        })
    }

    /// Append `count` reload copies of the depot.
    ///
    /// Copies share the depot's distance map. Call before the model is built.
    pub fn add_depot_clones(&mut self, count: usize) {
        let Some(depot) = self.locations.get(self.depot) else {
            return;
        };
        let clone = depot.clone_for_reload();
        self.locations.extend(std::iter::repeat_n(clone, count));
    }

    /// Give every depot copy a demand of `-capacity`.
    pub fn set_reload_demand(&mut self, capacity: i64) {
        for location in self.locations.iter_mut().filter(|l| l.is_clone) {
            location.demand = capacity.saturating_neg();
        }
    }

    /// Indices of nodes that refill the vehicle.
    #[must_use]
    pub fn reload_nodes(&self) -> Vec<usize> {
        self.locations
            .iter()
            .enumerate()
            .filter(|(_, l)| l.demand < 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of nodes, depot copies included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the graph holds no nodes. Never true for a built graph.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// All nodes in index order.
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// The configured drop-penalty strategy.
    #[must_use]
    pub const fn penalty_strategy(&self) -> PenaltyStrategy {
        self.penalty
    }

    /// Node index of the depot.
    #[must_use]
    pub const fn depot_index(&self) -> usize {
        self.depot
    }

    /// The depot itself.
    ///
    /// # Errors
    /// Only fails if the graph was emptied after construction, which the
    /// public API does not allow.
    pub fn depot(&self) -> Result<&Location, GraphError> {
        self.location(self.depot)
    }

    /// Location at `index`.
    ///
    /// # Errors
    /// Returns [`GraphError::IndexOutOfRange`] for unknown indices.
    pub fn location(&self, index: usize) -> Result<&Location, GraphError> {
        self.locations.get(index).ok_or(GraphError::IndexOutOfRange {
            index,
            len: self.locations.len(),
        })
    }

    /// First location called `name`.
    ///
    /// # Errors
    /// Returns [`GraphError::LocationNotFound`] when no location matches.
    pub fn location_by_name(&self, name: &str) -> Result<&Location, GraphError> {
        self.locations
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| GraphError::LocationNotFound(name.to_owned()))
    }

    /// Travel cost from `from` to `to` for a vehicle with `capabilities`.
    ///
    /// The vehicle must be able to access both endpoints; otherwise, or when
    /// no distance is recorded, the cost is [`INFINITY`].
    ///
    /// # Errors
    /// Returns [`GraphError::IndexOutOfRange`] for unknown indices.
    pub fn distance(&self, capabilities: &Tags, from: usize, to: usize) -> Result<i64, GraphError> {
        let origin = self.location(from)?;
        let target = self.location(to)?;
        if !origin.is_accessible_with(capabilities) || !target.is_accessible_with(capabilities) {
            return Ok(INFINITY);
        }
        Ok(origin.distance_to(&target.name).unwrap_or(INFINITY))
    }

    /// Minutes spent on site at `index`.
    ///
    /// # Errors
    /// Returns [`GraphError::IndexOutOfRange`] for unknown indices.
    pub fn service_time(&self, index: usize) -> Result<i64, GraphError> {
        Ok(self.location(index)?.service_time)
    }

    /// Load delivered at `index`.
    ///
    /// # Errors
    /// Returns [`GraphError::IndexOutOfRange`] for unknown indices.
    pub fn demand(&self, index: usize) -> Result<i64, GraphError> {
        Ok(self.location(index)?.demand)
    }

    /// Whether dropping `location` should be priced at all.
    ///
    /// Only the original depot is exempt.
    #[must_use]
    pub const fn has_penalty(location: &Location) -> bool {
        !location.is_depot || location.is_clone
    }

    /// Cost of leaving `location` unvisited.
    ///
    /// High-priority stops cost [`INFINITY`], depots and their copies are
    /// free and everything else is priced by the configured strategy.
    #[must_use]
    pub fn drop_penalty(&self, location: &Location) -> i64 {
        if location.high_priority {
            INFINITY
        } else if location.is_depot {
            0
        } else {
            self.penalty.penalty(self, location)
        }
    }
}
