//! Cumul values of one dimension along one route.
//!
//! Along a route `i0 -> i1 -> ... -> ik` every dimension satisfies
//! `cumul(j) = cumul(i) + transit(i, j) + slack(i, j)` with
//! `0 <= slack <= spec.slack`. Slack absorbs waiting for a range or a
//! forbidden period to pass and any break taken between the two visits.
//! When waiting alone overflows the slack, the route start is pushed later
//! and the pass is repeated.

use std::collections::{HashMap, VecDeque};

use courier_core::ForbiddenWindows;
use courier_core::engine::{DimensionSpec, IntervalHandle, IntervalSpec, TransitHandle};

/// Attempts at pushing the route start before giving up.
const MAX_SHIFTS: usize = 64;

/// Breaks of one vehicle and the service time that may not overlap them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VehicleBreaks {
    pub(crate) intervals: Vec<IntervalHandle>,
    pub(crate) service: Vec<i64>,
}

/// Cumul values along a route, with the breaks placed on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Schedule {
    pub(crate) cumuls: Vec<i64>,
    pub(crate) breaks: Vec<(IntervalHandle, i64)>,
}

enum Pass {
    Done(Schedule),
    Shift(i64),
    Infeasible,
}

/// A dimension together with every constraint placed on it.
#[derive(Debug, Clone)]
pub(crate) struct Dimension {
    spec: DimensionSpec,
    ranges: HashMap<usize, (i64, i64)>,
    exclusions: HashMap<usize, Vec<ForbiddenWindows>>,
    spans: HashMap<usize, i64>,
    breaks: HashMap<usize, VehicleBreaks>,
}

impl Dimension {
    pub(crate) fn new(spec: DimensionSpec) -> Self {
        Self {
            spec,
            ranges: HashMap::new(),
            exclusions: HashMap::new(),
            spans: HashMap::new(),
            breaks: HashMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.spec.name
    }

    pub(crate) fn transit_for(&self, vehicle: usize) -> Option<TransitHandle> {
        self.spec.transit_for(vehicle)
    }

    /// Intersect the range at `index` with `[lower, upper]`.
    pub(crate) fn restrict(&mut self, index: usize, lower: i64, upper: i64) {
        let range = self.ranges.entry(index).or_insert((lower, upper));
        range.0 = range.0.max(lower);
        range.1 = range.1.min(upper);
    }

    pub(crate) fn bound_span(&mut self, vehicle: usize, bound: i64) {
        let span = self.spans.entry(vehicle).or_insert(bound);
        *span = (*span).min(bound);
    }

    pub(crate) fn exclude(&mut self, index: usize, windows: ForbiddenWindows) {
        self.exclusions.entry(index).or_default().push(windows);
    }

    pub(crate) fn attach_breaks(&mut self, vehicle: usize, breaks: VehicleBreaks) {
        self.breaks.insert(vehicle, breaks);
    }

    /// Earliest cumul values for `route` driven by `vehicle`, or `None` when
    /// the route violates a bound, a span or a break window.
    pub(crate) fn schedule<F>(
        &self,
        vehicle: usize,
        route: &[usize],
        intervals: &[IntervalSpec],
        transit: &F,
    ) -> Option<Schedule>
    where
        F: Fn(usize, usize) -> Option<i64>,
    {
        let capacity = self.spec.capacity_for(vehicle)?;
        let first = *route.first()?;
        let (lower, upper) = self.bounds(first, capacity);
        let mut start = if self.spec.start_at_zero {
            0
        } else {
            self.ready(first, lower)
        };
        for _ in 0..MAX_SHIFTS {
            if start < lower || start > upper {
                return None;
            }
            match self.forward(vehicle, route, intervals, transit, start, capacity) {
                Pass::Done(schedule) => return self.within_span(vehicle, schedule),
                Pass::Shift(by) if !self.spec.start_at_zero => {
                    start = self.ready(first, start.saturating_add(by));
                }
                Pass::Shift(_) | Pass::Infeasible => return None,
            }
        }
        None
    }

    fn forward<F>(
        &self,
        vehicle: usize,
        route: &[usize],
        intervals: &[IntervalSpec],
        transit: &F,
        start: i64,
        capacity: i64,
    ) -> Pass
    where
        F: Fn(usize, usize) -> Option<i64>,
    {
        let attached = self.breaks.get(&vehicle);
        let mut pending = pending_breaks(attached, intervals);
        let mut schedule = Schedule {
            cumuls: vec![start],
            breaks: Vec::new(),
        };
        pending.retain(|(handle, spec)| {
            let before_start = spec.min_start.saturating_add(spec.duration) <= start;
            if before_start {
                schedule.breaks.push((*handle, spec.min_start));
            }
            !before_start
        });

        let mut current = start;
        for pair in route.windows(2) {
            let &[from, to] = pair else {
                return Pass::Infeasible;
            };
            let Some(step) = transit(from, to) else {
                return Pass::Infeasible;
            };
            let service = attached
                .and_then(|b| b.service.get(from).copied())
                .unwrap_or(0);
            let (lower, upper) = self.bounds(to, capacity);
            let mut cursor = current.saturating_add(service);
            let mut remaining = step.saturating_sub(service);
            while let Some(&(handle, spec)) = pending.front() {
                let target = self.ready(to, cursor.saturating_add(remaining).max(lower));
                if spec.min_start >= target {
                    break;
                }
                let begin = cursor.max(spec.min_start);
                if begin > spec.max_start {
                    return Pass::Infeasible;
                }
                let travelled = begin.saturating_sub(cursor).clamp(0, remaining.max(0));
                remaining = remaining.saturating_sub(travelled);
                cursor = begin.saturating_add(spec.duration);
                schedule.breaks.push((handle, begin));
                pending.pop_front();
            }
            let reached = cursor.saturating_add(remaining);
            let value = self.ready(to, reached.max(lower));
            if value > upper {
                return Pass::Infeasible;
            }
            let slack = value.saturating_sub(current).saturating_sub(step);
            if slack > self.spec.slack {
                let excess = slack.saturating_sub(self.spec.slack);
                let waited = value.saturating_sub(reached);
                return if waited >= excess {
                    Pass::Shift(excess)
                } else {
                    Pass::Infeasible
                };
            }
            schedule.cumuls.push(value);
            current = value;
        }

        for (handle, spec) in pending {
            let begin = current.max(spec.min_start);
            if begin > spec.max_start {
                return Pass::Infeasible;
            }
            schedule.breaks.push((handle, begin));
            current = begin.saturating_add(spec.duration);
        }
        Pass::Done(schedule)
    }

    fn within_span(&self, vehicle: usize, schedule: Schedule) -> Option<Schedule> {
        let Some(bound) = self.spans.get(&vehicle) else {
            return Some(schedule);
        };
        let first = schedule.cumuls.first().copied().unwrap_or(0);
        let last = schedule.cumuls.last().copied().unwrap_or(first);
        (last.saturating_sub(first) <= *bound).then_some(schedule)
    }

    fn bounds(&self, index: usize, capacity: i64) -> (i64, i64) {
        let (lower, upper) = self.ranges.get(&index).copied().unwrap_or((0, capacity));
        (lower.max(0), upper.min(capacity))
    }

    /// First value at or after `from` outside every forbidden period of
    /// `index`.
    fn ready(&self, index: usize, from: i64) -> i64 {
        let Some(windows) = self.exclusions.get(&index) else {
            return from;
        };
        let blocking = |value: i64| {
            windows
                .iter()
                .flat_map(ForbiddenWindows::iter)
                .find(|(start, end)| *start <= value && value <= *end)
                .map(|(_, end)| end.saturating_add(1))
        };
        let mut value = from;
        while let Some(next) = blocking(value) {
            value = next;
        }
        value
    }
}

fn pending_breaks<'a>(
    attached: Option<&VehicleBreaks>,
    intervals: &'a [IntervalSpec],
) -> VecDeque<(IntervalHandle, &'a IntervalSpec)> {
    let mut pending: Vec<(IntervalHandle, &IntervalSpec)> = attached
        .map(|b| {
            b.intervals
                .iter()
                .filter_map(|h| intervals.get(h.index()).map(|spec| (*h, spec)))
                .collect()
        })
        .unwrap_or_default();
    pending.sort_by_key(|(_, spec)| spec.min_start);
    pending.into()
}
