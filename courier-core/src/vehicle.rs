//! Fleet vehicles and their rest policies.

use crate::location::{Location, Tags};

/// Longest shift, in minutes, when a vehicle does not set its own.
pub const DEFAULT_JOURNEY: i64 = 480;

/// Window in which a vehicle's lunch break must begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LunchWindow {
    /// Earliest start, minutes from midnight.
    pub minimum_start: i64,
    /// Latest start, minutes from midnight.
    pub maximum_start: i64,
    /// Break length in minutes.
    pub duration: i64,
}

/// Recurring short rest taken every `frequency` minutes of the depot's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShortBreakPolicy {
    /// Minutes between break centres. Zero disables short breaks.
    pub frequency: i64,
    /// Break length in minutes.
    pub duration: i64,
}

/// A delivery vehicle.
///
/// # Examples
/// ```
/// use courier_core::{LunchWindow, Vehicle, DEFAULT_JOURNEY};
///
/// let van = Vehicle::new("van-1", ["van"], 12).with_lunch(LunchWindow {
///     minimum_start: 690,
///     maximum_start: 780,
///     duration: 45,
/// });
/// assert_eq!(van.journey, DEFAULT_JOURNEY);
/// assert!(van.lunch.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    /// Unique vehicle name.
    pub name: String,
    /// Tags matched against location accessibility.
    pub capabilities: Tags,
    /// Largest load carried at once.
    pub max_load: i64,
    /// Longest shift in minutes.
    pub journey: i64,
    /// Optional lunch break.
    pub lunch: Option<LunchWindow>,
    /// Optional short-break policy.
    pub short_break: Option<ShortBreakPolicy>,
}

impl Vehicle {
    /// Construct a vehicle with the default journey and no breaks.
    #[must_use]
    pub fn new<I, T>(name: impl Into<String>, capabilities: I, max_load: i64) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            max_load,
            journey: DEFAULT_JOURNEY,
            lunch: None,
            short_break: None,
        }
    }

    /// Override the maximum shift length.
    #[must_use]
    pub const fn with_journey(mut self, journey: i64) -> Self {
        self.journey = journey;
        self
    }

    /// Give the vehicle a lunch break.
    #[must_use]
    pub const fn with_lunch(mut self, lunch: LunchWindow) -> Self {
        self.lunch = Some(lunch);
        self
    }

    /// Give the vehicle recurring short breaks.
    #[must_use]
    pub const fn with_short_breaks(mut self, policy: ShortBreakPolicy) -> Self {
        self.short_break = Some(policy);
        self
    }

    /// Whether the vehicle may serve `location`.
    #[must_use]
    pub fn can_access(&self, location: &Location) -> bool {
        location.is_accessible_with(&self.capabilities)
    }
}
