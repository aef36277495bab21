//! Wire format for planning requests.
//!
//! Documents mirror the JSON accepted by the `courier` command. Numbers may
//! be fractional; they are rounded up to whole minutes or units when the
//! document is turned into a [`PlanRequest`].

use std::time::Duration;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{Location, TimeWindow};
use crate::penalty::{PenaltyError, PenaltyStrategy};
use crate::planner::{DEFAULT_SEARCH_TIME_LIMIT, PlanRequest};
use crate::vehicle::{DEFAULT_JOURNEY, LunchWindow, ShortBreakPolicy, Vehicle};

/// Largest magnitude accepted for any numeric field.
const MAX_MAGNITUDE: f64 = 1.0e15;

/// Errors raised while converting a [`RequestDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The penalty identifier is unknown.
    #[error(transparent)]
    Penalty(#[from] PenaltyError),
    /// A number was NaN, infinite or absurdly large.
    #[error("field `{0}` must be a finite number")]
    InvalidNumber(&'static str),
    /// A count or duration was negative.
    #[error("field `{0}` must not be negative")]
    Negative(&'static str),
}

/// Round `value` up to the next integer.
#[expect(
    clippy::cast_possible_truncation,
    reason = "magnitude is bounded by MAX_MAGNITUDE before the cast"
)]
fn round_up(value: f64, field: &'static str) -> Result<i64, RequestError> {
    if !value.is_finite() || value.abs() > MAX_MAGNITUDE {
        return Err(RequestError::InvalidNumber(field));
    }
    Ok(value.ceil() as i64)
}

fn round_up_count(value: f64, field: &'static str) -> Result<u64, RequestError> {
    let rounded = round_up(value, field)?;
    u64::try_from(rounded).map_err(|_| RequestError::Negative(field))
}

/// Allowed visit window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowDocument {
    /// First minute.
    pub start: f64,
    /// Last minute.
    pub end: f64,
}

/// Planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinatesDocument {
    /// North-south position.
    pub latitude: f64,
    /// East-west position.
    pub longitude: f64,
}

/// Travel cost to another location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceDocument {
    /// Destination name.
    pub name: String,
    /// Travel cost in minutes.
    pub distance: f64,
}

/// A location entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDocument {
    /// Unique name.
    pub name: String,
    /// Whether this is the depot.
    #[serde(default)]
    pub is_depot: bool,
    /// Tags a vehicle must share to visit.
    pub accessibility: Vec<String>,
    /// Load delivered.
    #[serde(default)]
    pub demand: f64,
    /// Minutes on site.
    pub service_time: f64,
    /// Allowed windows.
    #[serde(default)]
    pub time_windows: Vec<WindowDocument>,
    /// Whether the stop must be served.
    #[serde(default)]
    pub high_priority: bool,
    /// Position, for reporting.
    #[serde(default)]
    pub coordinates: CoordinatesDocument,
    /// Travel costs to other locations.
    #[serde(default)]
    pub distances: Vec<DistanceDocument>,
}

/// Lunch break settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunchDocument {
    /// Earliest start.
    pub minimum_start: f64,
    /// Latest start.
    pub maximum_start: f64,
    /// Length.
    pub duration: f64,
}

/// Short break settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortBreakDocument {
    /// Minutes between breaks.
    pub frequency: f64,
    /// Length.
    pub duration: f64,
}

/// A vehicle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDocument {
    /// Unique name.
    pub name: String,
    /// Capability tags.
    pub types: Vec<String>,
    /// Capacity.
    pub max_load_weight: f64,
    /// Longest shift in minutes.
    #[serde(default)]
    pub journey: Option<f64>,
    /// Lunch break, if any.
    #[serde(default)]
    pub lunch_time_window: Option<LunchDocument>,
    /// Short breaks, if any.
    #[serde(default)]
    pub short_break: Option<ShortBreakDocument>,
}

/// A complete planning request as received on the wire.
///
/// # Examples
/// ```
/// use courier_core::request::{RequestDocument, VehicleDocument};
/// use courier_core::PlanRequest;
///
/// let document = RequestDocument {
///     locations: Vec::new(),
///     vehicles: vec![VehicleDocument {
///         name: "van".into(),
///         types: vec!["van".into()],
///         max_load_weight: 9.5,
///         journey: None,
///         lunch_time_window: None,
///         short_break: None,
///     }],
///     drop_penalty_type: Some("max_distance".into()),
///     max_reload: None,
///     search_time_limit: None,
/// };
/// let request = PlanRequest::try_from(document)?;
/// assert_eq!(request.vehicles[0].max_load, 10);
/// # Ok::<(), courier_core::request::RequestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDocument {
    /// Depot and stops.
    pub locations: Vec<LocationDocument>,
    /// Fleet.
    pub vehicles: Vec<VehicleDocument>,
    /// Penalty strategy identifier.
    #[serde(default)]
    pub drop_penalty_type: Option<String>,
    /// Extra depot visits for reloading.
    #[serde(default)]
    pub max_reload: Option<f64>,
    /// Search budget in seconds.
    #[serde(default)]
    pub search_time_limit: Option<f64>,
}

impl TryFrom<LocationDocument> for Location {
    type Error = RequestError;

    fn try_from(document: LocationDocument) -> Result<Self, Self::Error> {
        let windows = document
            .time_windows
            .iter()
            .map(|w| {
                Ok(TimeWindow::new(
                    round_up(w.start, "time_windows.start")?,
                    round_up(w.end, "time_windows.end")?,
                ))
            })
            .collect::<Result<Vec<_>, RequestError>>()?;
        let mut location = Self::new(
            document.name,
            document.accessibility,
            windows,
            round_up(document.demand, "demand")?,
            round_up(document.service_time, "service_time")?,
        )
        .with_coordinates(Coord {
            x: document.coordinates.longitude,
            y: document.coordinates.latitude,
        });
        location.is_depot = document.is_depot;
        location.high_priority = document.high_priority;
        for entry in document.distances {
            let distance = round_up(entry.distance, "distance")?;
            location.add_distance(entry.name, distance);
        }
        Ok(location)
    }
}

impl TryFrom<VehicleDocument> for Vehicle {
    type Error = RequestError;

    fn try_from(document: VehicleDocument) -> Result<Self, Self::Error> {
        let journey = document
            .journey
            .map(|j| round_up(j, "journey"))
            .transpose()?
            .unwrap_or(DEFAULT_JOURNEY);
        let mut vehicle = Self::new(
            document.name,
            document.types,
            round_up(document.max_load_weight, "max_load_weight")?,
        )
        .with_journey(journey);
        if let Some(lunch) = document.lunch_time_window {
            vehicle = vehicle.with_lunch(LunchWindow {
                minimum_start: round_up(lunch.minimum_start, "lunch_time_window.minimum_start")?,
                maximum_start: round_up(lunch.maximum_start, "lunch_time_window.maximum_start")?,
                duration: round_up(lunch.duration, "lunch_time_window.duration")?,
            });
        }
        if let Some(short) = document.short_break {
            let frequency = round_up(short.frequency, "short_break.frequency")?;
            if frequency < 0 {
                return Err(RequestError::Negative("short_break.frequency"));
            }
            vehicle = vehicle.with_short_breaks(ShortBreakPolicy {
                frequency,
                duration: round_up(short.duration, "short_break.duration")?,
            });
        }
        Ok(vehicle)
    }
}

impl TryFrom<RequestDocument> for PlanRequest {
    type Error = RequestError;

    fn try_from(document: RequestDocument) -> Result<Self, Self::Error> {
        let penalty: PenaltyStrategy = document
            .drop_penalty_type
            .as_deref()
            .map(str::parse::<PenaltyStrategy>)
            .transpose()?
            .unwrap_or_default();
        let max_reload = document
            .max_reload
            .map(|r| round_up_count(r, "max_reload"))
            .transpose()?
            .unwrap_or(0);
        let seconds = document
            .search_time_limit
            .map(|s| round_up_count(s, "search_time_limit"))
            .transpose()?
            .unwrap_or(DEFAULT_SEARCH_TIME_LIMIT.as_secs());
        Ok(Self {
            locations: document
                .locations
                .into_iter()
                .map(Location::try_from)
                .collect::<Result<_, _>>()?,
            vehicles: document
                .vehicles
                .into_iter()
                .map(Vehicle::try_from)
                .collect::<Result<_, _>>()?,
            penalty,
            max_reload: usize::try_from(max_reload)
                .map_err(|_| RequestError::InvalidNumber("max_reload"))?,
            search_time_limit: Duration::from_secs(seconds),
        })
    }
}
