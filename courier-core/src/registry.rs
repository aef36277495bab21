//! Fleet registry and per-vehicle break ledgers.
//!
//! Breaks are only ever created while a routing model is configured, so the
//! registry hands out identifiers from a per-vehicle counter. The counter
//! keeps identifiers stable across runs of the same request.

use std::fmt;

use thiserror::Error;

use crate::location::Location;
use crate::vehicle::Vehicle;

/// Errors raised by [`VehicleRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The request listed no vehicles.
    #[error("at least one vehicle is required")]
    EmptyFleet,
    /// A vehicle index outside the fleet was requested.
    #[error("vehicle index {index} is out of range for a fleet of {len}")]
    VehicleOutOfRange {
        /// Requested index.
        index: usize,
        /// Fleet size.
        len: usize,
    },
}

/// Kind of rest a vehicle takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BreakKind {
    /// The single midday break.
    Lunch,
    /// One of the recurring short breaks.
    Short,
}

impl fmt::Display for BreakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lunch => "lunch",
            Self::Short => "short",
        })
    }
}

/// Identifier of a break, unique within its vehicle's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakId(String);

impl BreakId {
    /// Build the identifier for the `sequence`th break of `vehicle`.
    #[must_use]
    pub fn new(vehicle: &str, kind: BreakKind, sequence: usize) -> Self {
        Self(format!("{vehicle}-{kind}-{sequence}"))
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BreakId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A break created for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Break {
    /// Identifier, unique per vehicle.
    pub id: BreakId,
    /// Lunch or short break.
    pub kind: BreakKind,
    /// Earliest start.
    pub min_start: i64,
    /// Latest start.
    pub max_start: i64,
    /// Length in minutes.
    pub duration: i64,
}

/// Every break created for one vehicle, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakLedger {
    owner: String,
    breaks: Vec<Break>,
    next_sequence: usize,
}

impl BreakLedger {
    fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            breaks: Vec::new(),
            next_sequence: 0,
        }
    }

    fn push(&mut self, kind: BreakKind, min_start: i64, max_start: i64, duration: i64) -> BreakId {
        self.next_sequence = self.next_sequence.saturating_add(1);
        let id = BreakId::new(&self.owner, kind, self.next_sequence);
        self.breaks.push(Break {
            id: id.clone(),
            kind,
            min_start,
            max_start,
            duration,
        });
        id
    }

    /// Name of the owning vehicle.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Break with identifier `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Break> {
        self.breaks.iter().find(|b| b.id.as_str() == id)
    }

    /// Whether a break called `id` belongs to this vehicle.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Kind of break `id`, if owned.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<BreakKind> {
        self.get(id).map(|b| b.kind)
    }

    /// Breaks of one kind, in creation order.
    pub fn of_kind(&self, kind: BreakKind) -> impl Iterator<Item = &Break> + '_ {
        self.breaks.iter().filter(move |b| b.kind == kind)
    }

    /// The vehicle's lunch break, if configured.
    #[must_use]
    pub fn lunch(&self) -> Option<&Break> {
        self.of_kind(BreakKind::Lunch).next()
    }

    /// All breaks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Break> + '_ {
        self.breaks.iter()
    }

    /// Number of breaks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.breaks.len()
    }

    /// Whether no break was created.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }
}

/// The fleet of a request together with each vehicle's breaks.
#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    vehicles: Vec<Vehicle>,
    ledgers: Vec<BreakLedger>,
}

impl VehicleRegistry {
    /// Build a registry with empty ledgers.
    ///
    /// # Errors
    /// Returns [`RegistryError::EmptyFleet`] when `vehicles` is empty.
    pub fn new(vehicles: Vec<Vehicle>) -> Result<Self, RegistryError> {
        if vehicles.is_empty() {
            return Err(RegistryError::EmptyFleet);
        }
        let ledgers = vehicles.iter().map(|v| BreakLedger::new(&v.name)).collect();
        Ok(Self { vehicles, ledgers })
    }

    /// Number of vehicles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the fleet is empty. Never true for a built registry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// All vehicles in index order.
    #[must_use]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Vehicle at `index`.
    ///
    /// # Errors
    /// Returns [`RegistryError::VehicleOutOfRange`] for unknown indices.
    pub fn vehicle(&self, index: usize) -> Result<&Vehicle, RegistryError> {
        self.vehicles
            .get(index)
            .ok_or(RegistryError::VehicleOutOfRange {
                index,
                len: self.vehicles.len(),
            })
    }

    /// Indices of vehicles able to reach `location`.
    #[must_use]
    pub fn allowed_vehicles(&self, location: &Location) -> Vec<usize> {
        self.vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| v.can_access(location))
            .map(|(i, _)| i)
            .collect()
    }

    /// Capacity of vehicle `index`.
    ///
    /// # Errors
    /// Returns [`RegistryError::VehicleOutOfRange`] for unknown indices.
    pub fn max_load(&self, index: usize) -> Result<i64, RegistryError> {
        Ok(self.vehicle(index)?.max_load)
    }

    /// Capacity of every vehicle in index order.
    #[must_use]
    pub fn max_loads(&self) -> Vec<i64> {
        self.vehicles.iter().map(|v| v.max_load).collect()
    }

    /// Largest capacity in the fleet.
    #[must_use]
    pub fn fleet_max_load(&self) -> i64 {
        self.vehicles.iter().map(|v| v.max_load).max().unwrap_or(0)
    }

    /// Record a new break for vehicle `index` and return its identifier.
    ///
    /// # Errors
    /// Returns [`RegistryError::VehicleOutOfRange`] for unknown indices.
    pub fn add_break(
        &mut self,
        index: usize,
        kind: BreakKind,
        min_start: i64,
        max_start: i64,
        duration: i64,
    ) -> Result<BreakId, RegistryError> {
        let len = self.ledgers.len();
        let ledger = self
            .ledgers
            .get_mut(index)
            .ok_or(RegistryError::VehicleOutOfRange { index, len })?;
        Ok(ledger.push(kind, min_start, max_start, duration))
    }

    /// Break ledger of vehicle `index`.
    ///
    /// # Errors
    /// Returns [`RegistryError::VehicleOutOfRange`] for unknown indices.
    pub fn breaks(&self, index: usize) -> Result<&BreakLedger, RegistryError> {
        self.ledgers
            .get(index)
            .ok_or(RegistryError::VehicleOutOfRange {
                index,
                len: self.ledgers.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_fleet;
    use rstest::rstest;

    #[rstest]
    fn empty_fleet_is_rejected() {
        let err = VehicleRegistry::new(Vec::new()).expect_err("empty fleet");
        assert_eq!(err, RegistryError::EmptyFleet);
    }

    #[rstest]
    fn break_ids_count_up_per_vehicle() {
        let mut registry = VehicleRegistry::new(sample_fleet()).expect("fleet");
        let first = registry
            .add_break(0, BreakKind::Lunch, 600, 660, 30)
            .expect("lunch");
        let second = registry
            .add_break(0, BreakKind::Short, 120, 180, 10)
            .expect("short");
        let other = registry
            .add_break(1, BreakKind::Short, 120, 180, 10)
            .expect("short");
        assert_eq!(first.as_str(), "truck-lunch-1");
        assert_eq!(second.as_str(), "truck-short-2");
        assert_eq!(other.as_str(), "car-short-1");

        let ledger = registry.breaks(0).expect("ledger");
        assert!(ledger.contains("truck-lunch-1"));
        assert!(!ledger.contains("car-short-1"));
        assert_eq!(ledger.kind_of("truck-short-2"), Some(BreakKind::Short));
        assert_eq!(ledger.lunch().map(|b| b.duration), Some(30));
        assert_eq!(ledger.of_kind(BreakKind::Short).count(), 1);
    }

    #[rstest]
    fn unknown_vehicle_is_reported() {
        let mut registry = VehicleRegistry::new(sample_fleet()).expect("fleet");
        let err = registry
            .add_break(7, BreakKind::Lunch, 0, 1, 1)
            .expect_err("no such vehicle");
        assert_eq!(err, RegistryError::VehicleOutOfRange { index: 7, len: 2 });
    }

    #[rstest]
    fn loads_are_reported_per_vehicle_and_fleet() {
        let mut fleet = sample_fleet();
        if let Some(car) = fleet.get_mut(1) {
            car.max_load = 4;
        }
        let registry = VehicleRegistry::new(fleet).expect("fleet");
        assert_eq!(registry.max_loads(), vec![10, 4]);
        assert_eq!(registry.max_load(1), Ok(4));
        assert_eq!(registry.fleet_max_load(), 10);
    }

    #[rstest]
    fn allowed_vehicles_follow_accessibility() {
        let registry = VehicleRegistry::new(sample_fleet()).expect("fleet");
        let yard = Location::new("yard", ["truck", "car"], Vec::new(), 0, 0);
        let lane = Location::new("lane", ["car"], Vec::new(), 0, 0);
        assert_eq!(registry.allowed_vehicles(&yard), vec![0, 1]);
        assert_eq!(registry.allowed_vehicles(&lane), vec![1]);
    }
}
