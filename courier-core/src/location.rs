//! Delivery locations and their opening hours.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use geo::Coord;

/// Free-form tags describing accessibility or vehicle capabilities.
///
/// A vehicle may serve a location when the two tag sets intersect.
pub type Tags = BTreeSet<String>;

/// Travel cost from one location to others, keyed by destination name.
pub type DistanceMap = HashMap<String, i64>;

/// Whether two tag sets share at least one entry.
#[must_use]
pub fn tags_intersect(lhs: &Tags, rhs: &Tags) -> bool {
    lhs.iter().any(|tag| rhs.contains(tag))
}

/// Inclusive period, in minutes from midnight, during which a location
/// accepts visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    /// First minute a visit may begin.
    pub start: i64,
    /// Last minute a visit may begin.
    pub end: i64,
}

impl TimeWindow {
    /// Construct a window from its inclusive bounds.
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `minute` falls inside the window, bounds included.
    #[must_use]
    pub const fn contains(&self, minute: i64) -> bool {
        minute >= self.start && minute <= self.end
    }
}

/// A stop the fleet may visit, or the depot it starts from.
///
/// The distance map is shared through an [`Arc`]: depot clones created by
/// [`Location::clone_for_reload`] point at the same map as the original and
/// the map is read-only once the clone exists.
///
/// # Examples
/// ```
/// use courier_core::{Location, TimeWindow};
///
/// let depot = Location::new("depot", ["truck"], vec![TimeWindow::new(0, 1440)], 0, 0)
///     .with_depot()
///     .with_distance("shop", 12);
///
/// assert_eq!(depot.distance_to("shop"), Some(12));
/// assert_eq!(depot.distance_to("depot"), Some(0));
/// assert_eq!(depot.distance_to("elsewhere"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Unique name used as the key in distance maps.
    pub name: String,
    /// Tags a vehicle must share to reach this location.
    pub accessibility: Tags,
    /// Allowed visit windows. An empty list means open all day.
    pub time_windows: Vec<TimeWindow>,
    /// Load delivered here. Negative values mark reload points.
    pub demand: i64,
    /// Minutes spent on site.
    pub service_time: i64,
    /// Whether this is the fleet's depot.
    pub is_depot: bool,
    /// Whether this is a depot duplicate used to model reloads.
    pub is_clone: bool,
    /// High-priority stops are never dropped.
    pub high_priority: bool,
    /// Planar position, used for reporting only.
    pub coordinates: Coord<f64>,
    distances: Arc<DistanceMap>,
}

impl Location {
    /// Construct a regular, non-priority stop at the origin.
    ///
    /// The distance map starts with a single zero-cost entry for the
    /// location itself.
    #[must_use]
    pub fn new<I, T>(
        name: impl Into<String>,
        accessibility: I,
        time_windows: Vec<TimeWindow>,
        demand: i64,
        service_time: i64,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let owned_name: String = name.into();
        let distances = DistanceMap::from([(owned_name.clone(), 0)]);
        Self {
            name: owned_name,
            accessibility: accessibility.into_iter().map(Into::into).collect(),
            time_windows,
            demand,
            service_time,
            is_depot: false,
            is_clone: false,
            high_priority: false,
            coordinates: Coord { x: 0.0, y: 0.0 },
            distances: Arc::new(distances),
        }
    }

    /// Mark the location as the depot.
    #[must_use]
    pub const fn with_depot(mut self) -> Self {
        self.is_depot = true;
        self
    }

    /// Mark the location as high priority.
    #[must_use]
    pub const fn with_high_priority(mut self) -> Self {
        self.high_priority = true;
        self
    }

    /// Set the location's coordinates.
    #[must_use]
    pub const fn with_coordinates(mut self, coordinates: Coord<f64>) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// Record the travel cost to another location.
    #[must_use]
    pub fn with_distance(mut self, to: impl Into<String>, distance: i64) -> Self {
        self.add_distance(to, distance);
        self
    }

    /// Record the travel cost to another location in place.
    ///
    /// Clones sharing this map detach from it on the first write, so a
    /// clone never observes distances added afterwards.
    pub fn add_distance(&mut self, to: impl Into<String>, distance: i64) {
        Arc::make_mut(&mut self.distances).insert(to.into(), distance);
    }

    /// Travel cost to `name`, or `None` when it is unreachable.
    #[must_use]
    pub fn distance_to(&self, name: &str) -> Option<i64> {
        self.distances.get(name).copied()
    }

    /// The full distance map.
    #[must_use]
    pub fn distances(&self) -> &DistanceMap {
        &self.distances
    }

    /// Whether `other` shares this location's distance map.
    #[must_use]
    pub fn shares_distances_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.distances, &other.distances)
    }

    /// Whether a vehicle with `capabilities` may visit this location.
    #[must_use]
    pub fn is_accessible_with(&self, capabilities: &Tags) -> bool {
        tags_intersect(capabilities, &self.accessibility)
    }

    /// Whether `minute` lies inside at least one allowed window.
    ///
    /// A location without windows is open at any time.
    #[must_use]
    pub fn is_open_at(&self, minute: i64) -> bool {
        self.time_windows.is_empty() || self.time_windows.iter().any(|w| w.contains(minute))
    }

    /// A shallow depot duplicate used to model an extra reload visit.
    ///
    /// The clone shares the original's distance map and keeps every other
    /// attribute, with `is_clone` set.
    #[must_use]
    pub fn clone_for_reload(&self) -> Self {
        Self {
            is_clone: true,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn shop() -> Location {
        Location::new("shop", ["truck"], vec![TimeWindow::new(480, 1200)], 3, 10)
    }

    #[rstest]
    fn new_location_knows_its_own_distance() {
        assert_eq!(shop().distance_to("shop"), Some(0));
    }

    #[rstest]
    #[case(479, false)]
    #[case(480, true)]
    #[case(1200, true)]
    #[case(1201, false)]
    fn windows_include_their_bounds(#[case] minute: i64, #[case] open: bool) {
        assert_eq!(shop().is_open_at(minute), open);
    }

    #[rstest]
    fn location_without_windows_is_always_open() {
        let location = Location::new("yard", ["truck"], Vec::new(), 0, 0);
        assert!(location.is_open_at(-10));
        assert!(location.is_open_at(5000));
    }

    #[rstest]
    fn reload_clone_shares_distances() {
        let depot = Location::new("depot", ["truck"], Vec::new(), 0, 0)
            .with_depot()
            .with_distance("shop", 7);
        let clone = depot.clone_for_reload();
        assert!(clone.is_clone);
        assert!(clone.is_depot);
        assert!(clone.shares_distances_with(&depot));
        assert_eq!(clone.distance_to("shop"), Some(7));
    }

    #[rstest]
    #[case(&["truck"], true)]
    #[case(&["car", "truck"], true)]
    #[case(&["car"], false)]
    #[case(&[], false)]
    fn accessibility_needs_a_shared_tag(#[case] capabilities: &[&str], #[case] expected: bool) {
        let tags: Tags = capabilities.iter().map(|tag| (*tag).to_owned()).collect();
        assert_eq!(shop().is_accessible_with(&tags), expected);
    }
}
