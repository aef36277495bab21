//! Solved assignment returned by [`InsertionEngine`](crate::InsertionEngine).

use courier_core::engine::{Assignment, DimensionHandle, IntervalValue};

/// Routes, cumul values and break placements of a solved model.
///
/// Cumuls are exact, so [`Assignment::cumul_min`] and
/// [`Assignment::cumul_max`] agree. Indices that were not routed have no
/// cumul and are their own successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionSolution {
    objective: i64,
    next: Vec<Option<usize>>,
    cumuls: Vec<Vec<Option<i64>>>,
    intervals: Vec<IntervalValue>,
}

impl InsertionSolution {
    pub(crate) const fn new(
        objective: i64,
        next: Vec<Option<usize>>,
        cumuls: Vec<Vec<Option<i64>>>,
        intervals: Vec<IntervalValue>,
    ) -> Self {
        Self {
            objective,
            next,
            cumuls,
            intervals,
        }
    }

    fn cumul(&self, dimension: DimensionHandle, index: usize) -> Option<i64> {
        self.cumuls
            .get(dimension.index())?
            .get(index)
            .copied()
            .flatten()
    }
}

impl Assignment for InsertionSolution {
    fn objective(&self) -> i64 {
        self.objective
    }

    fn next(&self, index: usize) -> Option<usize> {
        self.next.get(index).copied().flatten()
    }

    fn cumul_min(&self, dimension: DimensionHandle, index: usize) -> Option<i64> {
        self.cumul(dimension, index)
    }

    fn cumul_max(&self, dimension: DimensionHandle, index: usize) -> Option<i64> {
        self.cumul(dimension, index)
    }

    fn intervals(&self) -> &[IntervalValue] {
        &self.intervals
    }
}
