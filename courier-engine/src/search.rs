//! Route construction for [`InsertionEngine`].
//!
//! Every vehicle starts with the empty route `start -> end`. Mandatory
//! indices are placed first, then optional ones while their insertion costs
//! less than their penalty. A stop that fits nowhere on its own may still be
//! placed together with an unused zero-penalty index, which is how depot
//! reload copies enter a route.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Instant;

use courier_core::engine::{FirstSolutionStrategy, IntervalValue, SearchParameters};

use crate::engine::{Disjunction, InsertionEngine};
use crate::schedule::{Dimension, Schedule};
use crate::solution::InsertionSolution;

/// A feasible replacement route for one vehicle.
#[derive(Debug)]
struct Candidate {
    vehicle: usize,
    route: Vec<usize>,
    delta: i64,
}

pub(crate) struct Search<'a> {
    engine: &'a InsertionEngine,
    strategy: FirstSolutionStrategy,
    deadline: Option<Instant>,
    routes: Vec<Vec<usize>>,
    routed: Vec<bool>,
    auxiliaries: Vec<usize>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(engine: &'a InsertionEngine, parameters: &SearchParameters) -> Self {
        let space = engine.space();
        let stops = space.num_nodes().saturating_sub(1);
        let routes = (0..space.num_vehicles())
            .map(|vehicle| {
                space
                    .start(vehicle)
                    .into_iter()
                    .chain(space.end(vehicle))
                    .collect()
            })
            .collect();
        let routed = (0..space.total()).map(|index| index >= stops).collect();
        let auxiliaries = engine
            .disjunctions()
            .iter()
            .filter(|d| d.penalty <= 0)
            .flat_map(|d| d.indices.iter().copied())
            .collect();
        Self {
            engine,
            strategy: parameters.first_solution,
            deadline: Instant::now().checked_add(parameters.time_limit),
            routes,
            routed,
            auxiliaries,
        }
    }

    /// Build routes, or `None` when a mandatory index cannot be served.
    pub(crate) fn run(mut self) -> Option<InsertionSolution> {
        if !self.routes_feasible() {
            log::debug!("empty routes violate the model");
            return None;
        }
        let engine = self.engine;
        let mandatory = self.mandatory();
        let mut optional: Vec<&'a Disjunction> = engine
            .disjunctions()
            .iter()
            .filter(|d| d.penalty > 0)
            .collect();
        if self.strategy != FirstSolutionStrategy::Sequential {
            optional.sort_by_key(|d| (Reverse(d.penalty), d.indices.first().copied()));
        }
        if self.strategy == FirstSolutionStrategy::LocalCheapestArc {
            self.extend_routes(&mandatory, &optional);
        }

        for node in mandatory {
            if self.is_routed(node) {
                continue;
            }
            let Some(candidate) = self.place(node) else {
                log::debug!("mandatory index {node} fits no route");
                return None;
            };
            self.apply(candidate);
        }

        for disjunction in optional {
            if self.expired() {
                log::debug!("time limit reached, leaving remaining stops unrouted");
                break;
            }
            if disjunction.indices.iter().any(|i| self.is_routed(*i)) {
                continue;
            }
            let best = disjunction
                .indices
                .iter()
                .filter_map(|i| self.place(*i))
                .min_by_key(|c| c.delta);
            if let Some(candidate) = best.filter(|c| c.delta < disjunction.penalty) {
                self.apply(candidate);
            }
        }
        Some(self.finish())
    }

    fn mandatory(&self) -> Vec<usize> {
        let stops = self.engine.space().num_nodes().saturating_sub(1);
        (0..stops)
            .filter(|index| {
                !self
                    .engine
                    .disjunctions()
                    .iter()
                    .any(|d| d.indices.contains(index))
            })
            .collect()
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn is_routed(&self, index: usize) -> bool {
        self.routed.get(index).copied().unwrap_or(true)
    }

    fn apply(&mut self, candidate: Candidate) {
        for index in &candidate.route {
            if let Some(flag) = self.routed.get_mut(*index) {
                *flag = true;
            }
        }
        if let Some(route) = self.routes.get_mut(candidate.vehicle) {
            *route = candidate.route;
        }
    }

    fn routes_feasible(&self) -> bool {
        self.routes
            .iter()
            .enumerate()
            .all(|(vehicle, route)| self.feasible(vehicle, route))
    }

    /// Grow each route from its last stop along the cheapest arc that keeps
    /// it feasible and pays for itself.
    fn extend_routes(&mut self, mandatory: &[usize], optional: &[&Disjunction]) {
        for vehicle in 0..self.routes.len() {
            while let Some(candidate) = self.cheapest_arc(vehicle, mandatory, optional) {
                self.apply(candidate);
            }
        }
    }

    fn cheapest_arc(
        &self,
        vehicle: usize,
        mandatory: &[usize],
        optional: &[&Disjunction],
    ) -> Option<Candidate> {
        let route = self.routes.get(vehicle)?;
        let at = route.len().checked_sub(1)?;
        let last = *route.get(at.checked_sub(1)?)?;
        let open = optional
            .iter()
            .filter(|d| !d.indices.iter().any(|i| self.is_routed(*i)))
            .flat_map(|d| d.indices.iter().map(move |i| (*i, d.penalty)));
        let mut options: Vec<(i64, usize, i64)> = mandatory
            .iter()
            .map(|node| (*node, i64::MAX))
            .chain(open)
            .filter(|(node, _)| !self.is_routed(*node))
            .map(|(node, limit)| (self.engine.arc_cost(vehicle, last, node), node, limit))
            .collect();
        options.sort_unstable();
        options.into_iter().find_map(|(_, node, limit)| {
            self.candidate(vehicle, insert(route, at, node))
                .filter(|c| c.delta < limit)
        })
    }

    /// Cheapest feasible placement of `node`, alone or with an auxiliary.
    fn place(&self, node: usize) -> Option<Candidate> {
        self.cheapest(node).or_else(|| self.with_auxiliary(node))
    }

    fn cheapest(&self, node: usize) -> Option<Candidate> {
        let mut best = None;
        for (vehicle, route) in self.routes.iter().enumerate() {
            for at in 1..route.len() {
                if let Some(candidate) = self.candidate(vehicle, insert(route, at, node)) {
                    keep_cheaper(&mut best, candidate);
                }
            }
        }
        best
    }

    fn with_auxiliary(&self, node: usize) -> Option<Candidate> {
        let mut best = None;
        for auxiliary in self.auxiliaries.iter().filter(|a| !self.is_routed(**a)) {
            for (vehicle, route) in self.routes.iter().enumerate() {
                for at in 1..route.len() {
                    let extended = insert(route, at, *auxiliary);
                    for other in 1..extended.len() {
                        let pair = insert(&extended, other, node);
                        if let Some(candidate) = self.candidate(vehicle, pair) {
                            keep_cheaper(&mut best, candidate);
                        }
                    }
                }
            }
        }
        best
    }

    fn candidate(&self, vehicle: usize, route: Vec<usize>) -> Option<Candidate> {
        if !self.feasible(vehicle, &route) {
            return None;
        }
        let current = self
            .routes
            .get(vehicle)
            .map_or(0, |r| self.cost(vehicle, r));
        let delta = self.cost(vehicle, &route).saturating_sub(current);
        Some(Candidate {
            vehicle,
            route,
            delta,
        })
    }

    fn feasible(&self, vehicle: usize, route: &[usize]) -> bool {
        self.engine
            .dimensions()
            .iter()
            .all(|d| self.schedule(d, vehicle, route).is_some())
    }

    fn schedule(&self, dimension: &Dimension, vehicle: usize, route: &[usize]) -> Option<Schedule> {
        let handle = dimension.transit_for(vehicle)?;
        let transit = |from: usize, to: usize| self.engine.transit(handle, from, to);
        dimension.schedule(vehicle, route, self.engine.intervals(), &transit)
    }

    fn cost(&self, vehicle: usize, route: &[usize]) -> i64 {
        route
            .windows(2)
            .map(|pair| {
                let &[from, to] = pair else {
                    return 0;
                };
                self.engine.arc_cost(vehicle, from, to)
            })
            .fold(0, i64::saturating_add)
    }

    fn finish(self) -> InsertionSolution {
        let engine = self.engine;
        let space = engine.space();
        let mut next: Vec<Option<usize>> = (0..space.total())
            .map(|index| (!space.is_end(index)).then_some(index))
            .collect();
        let mut cumuls = vec![vec![None; space.total()]; engine.dimensions().len()];
        let mut placed: HashMap<usize, i64> = HashMap::new();
        let mut objective = 0_i64;

        for (vehicle, route) in self.routes.iter().enumerate() {
            objective = objective.saturating_add(self.cost(vehicle, route));
            for pair in route.windows(2) {
                if let (Some(&from), Some(&to)) = (pair.first(), pair.get(1)) {
                    if let Some(slot) = next.get_mut(from) {
                        *slot = Some(to);
                    }
                }
            }
            for (dimension, values) in engine.dimensions().iter().zip(cumuls.iter_mut()) {
                let Some(schedule) = self.schedule(dimension, vehicle, route) else {
                    continue;
                };
                for (index, value) in route.iter().zip(schedule.cumuls) {
                    if let Some(slot) = values.get_mut(*index) {
                        *slot = Some(value);
                    }
                }
                for (handle, start) in schedule.breaks {
                    placed.insert(handle.index(), start);
                }
            }
        }

        let dropped: i64 = engine
            .disjunctions()
            .iter()
            .filter(|d| !d.indices.iter().any(|i| self.is_routed(*i)))
            .map(|d| d.penalty)
            .fold(0, i64::saturating_add);
        let intervals = engine
            .intervals()
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let start = placed.get(&index).copied();
                IntervalValue {
                    name: spec.name.clone(),
                    performed: start.is_some(),
                    start: start.unwrap_or(spec.min_start),
                    duration: spec.duration,
                }
            })
            .collect();
        log::debug!("built routes with cost {objective} and penalties {dropped}");
        InsertionSolution::new(
            objective.saturating_add(dropped),
            next,
            cumuls,
            intervals,
        )
    }
}

fn keep_cheaper(best: &mut Option<Candidate>, candidate: Candidate) {
    if best.as_ref().is_none_or(|b| candidate.delta < b.delta) {
        *best = Some(candidate);
    }
}

/// Copy of `route` with `node` inserted before position `at`.
fn insert(route: &[usize], at: usize, node: usize) -> Vec<usize> {
    let mut extended = Vec::with_capacity(route.len().saturating_add(1));
    extended.extend_from_slice(route.get(..at).unwrap_or(route));
    extended.push(node);
    extended.extend_from_slice(route.get(at..).unwrap_or_default());
    extended
}
