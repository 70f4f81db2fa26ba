//! Iterated local search entry point. A deliberately thin outer loop: it
//! constructs an initial solution, then alternates perturbation and local
//! search under a stopping criterion, escalating the infeasibility penalties
//! when consecutive passes fail to reach feasibility.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::repair::greedy_repair;
use crate::rng::XorShift128;
use crate::search::{LocalSearch, NeighbourhoodParams, compute_neighbours};
use crate::solution::Solution;

/// When to stop the solve loop. Checked once per iteration; the search
/// itself always runs to a local optimum.
#[derive(Debug, Clone, Copy)]
pub enum StopCriterion {
    MaxIterations(usize),
    MaxRuntime(Duration),
}

impl StopCriterion {
    fn should_stop(&self, iteration: usize, started: Instant) -> bool {
        match self {
            StopCriterion::MaxIterations(limit) => iteration >= *limit,
            StopCriterion::MaxRuntime(limit) => started.elapsed() >= *limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveParams {
    pub neighbourhood: NeighbourhoodParams,
    /// Initial penalty per unit of excess load.
    pub initial_capacity_penalty: Cost,
    /// Initial penalty per unit of time warp.
    pub initial_tw_penalty: Cost,
    /// Multiplier applied to the penalties after an infeasible pass.
    pub penalty_increase: f64,
    /// Multiplier applied to the penalties after a feasible pass.
    pub penalty_decrease: f64,
    /// Number of clients removed and reinserted per perturbation.
    pub perturbation_size: usize,
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams {
            neighbourhood: NeighbourhoodParams::default(),
            initial_capacity_penalty: measure::from_f64(20.0),
            initial_tw_penalty: measure::from_f64(6.0),
            penalty_increase: 1.34,
            penalty_decrease: 0.32,
            perturbation_size: 4,
        }
    }
}

/// Runs iterated local search on the given instance until the stopping
/// criterion fires, and returns the best solution found. Deterministic per
/// seed.
#[instrument(skip_all)]
pub fn solve(
    data: &ProblemData,
    params: &SolveParams,
    stop: StopCriterion,
    seed: u32,
) -> Solution {
    let started = Instant::now();
    let mut rng = XorShift128::new(seed);

    let neighbours = compute_neighbours(data, &params.neighbourhood);
    let mut local_search = LocalSearch::with_default_operators(neighbours);

    let mut capacity_penalty = params.initial_capacity_penalty;
    let mut tw_penalty = params.initial_tw_penalty;

    // The reference evaluator keeps incumbent comparisons stable while the
    // search penalties move around.
    let reference = CostEvaluator::new(params.initial_capacity_penalty, params.initial_tw_penalty);

    let clients: Vec<usize> = data.client_indices().collect();
    let initial = greedy_repair(
        &Solution::empty(data),
        &clients,
        data,
        &CostEvaluator::new(capacity_penalty, tw_penalty),
    );

    let mut best = local_search.search(
        data,
        &CostEvaluator::new(capacity_penalty, tw_penalty),
        &initial,
        &mut rng,
    );

    let mut iteration = 0;
    while !stop.should_stop(iteration, started) {
        iteration += 1;

        let cost_evaluator = CostEvaluator::new(capacity_penalty, tw_penalty);

        let perturbed = perturb(&best, data, &cost_evaluator, params.perturbation_size, &mut rng);
        let candidate = local_search.search(data, &cost_evaluator, &perturbed, &mut rng);

        if candidate.is_feasible() {
            capacity_penalty = scale_penalty(capacity_penalty, params.penalty_decrease);
            tw_penalty = scale_penalty(tw_penalty, params.penalty_decrease);
        } else {
            capacity_penalty = scale_penalty(capacity_penalty, params.penalty_increase);
            tw_penalty = scale_penalty(tw_penalty, params.penalty_increase);
        }

        if improves(&candidate, &best, &reference) {
            debug!(
                iteration,
                cost = reference.penalised_cost(&candidate),
                feasible = candidate.is_feasible(),
                "new incumbent"
            );
            best = candidate;
        }
    }

    info!(
        iterations = iteration,
        distance = best.distance(),
        feasible = best.is_feasible(),
        "solve finished"
    );

    best
}

/// Multiplies a penalty coefficient, keeping it within a sane band so
/// repeated escalation cannot overflow and repeated decay cannot reach zero.
fn scale_penalty(penalty: Cost, factor: f64) -> Cost {
    let scaled = measure::from_f64(penalty as f64 * factor);
    scaled.clamp(measure::ONE, measure::from_f64(1e7))
}

fn improves(candidate: &Solution, best: &Solution, reference: &CostEvaluator) -> bool {
    match (candidate.is_feasible(), best.is_feasible()) {
        (true, false) => true,
        (false, true) => false,
        _ => reference.penalised_cost(candidate) < reference.penalised_cost(best),
    }
}

/// Removes a few random clients and greedily reinserts them, yielding a
/// nearby but different starting point for the next search pass.
fn perturb(
    solution: &Solution,
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    size: usize,
    rng: &mut XorShift128,
) -> Solution {
    let mut planned: Vec<usize> = data
        .client_indices()
        .filter(|&client| solution.neighbours()[client].is_some())
        .collect();

    if planned.is_empty() {
        return solution.clone();
    }

    rng.shuffle(&mut planned);
    planned.truncate(size.min(planned.len()));

    let removed: Vec<(usize, Vec<usize>)> = solution
        .routes()
        .iter()
        .map(|route| {
            let visits = route
                .visits()
                .iter()
                .copied()
                .filter(|client| !planned.contains(client))
                .collect();
            (route.vehicle_type(), visits)
        })
        .collect();

    let partial = Solution::new(data, removed).expect("removal keeps the solution valid");
    greedy_repair(&partial, &planned, data, cost_evaluator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VehicleType;
    use crate::test_utils;

    #[test]
    fn solves_a_line_instance_to_optimality() {
        let data = test_utils::line_problem(6, vec![VehicleType::new(1, 100)]);
        let solution = solve(
            &data,
            &SolveParams::default(),
            StopCriterion::MaxIterations(20),
            1,
        );

        assert!(solution.is_feasible());
        assert_eq!(solution.distance(), 12);
    }

    #[test]
    fn same_seed_gives_same_solution() {
        let data = test_utils::ok_small();
        let stop = StopCriterion::MaxIterations(10);

        let a = solve(&data, &SolveParams::default(), stop, 42);
        let b = solve(&data, &SolveParams::default(), stop, 42);

        assert_eq!(a, b);
    }

    #[test]
    fn respects_vehicle_capacity_on_ok_small() {
        let data = test_utils::ok_small();
        let solution = solve(
            &data,
            &SolveParams::default(),
            StopCriterion::MaxIterations(50),
            7,
        );

        assert!(solution.is_complete());
        assert!(!solution.has_excess_load());
    }
}
