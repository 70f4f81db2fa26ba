use fxhash::FxHashSet;

use crate::eval::CostEvaluator;
use crate::problem::{ProblemData, measure};
use crate::repair::greedy_repair;
use crate::rng::XorShift128;
use crate::solution::Solution;

/// Selective route exchange (SREX): replaces a window of the first parent's
/// routes with an equally sized window of the second parent's routes. Routes
/// are ordered by the polar angle of their centroids so the exchanged
/// windows cover neighbouring parts of the plane; clients that would appear
/// twice are dropped from the incoming routes, and clients that went missing
/// are greedily reinserted.
pub fn selective_route_exchange(
    parents: (&Solution, &Solution),
    data: &ProblemData,
    rng: &mut XorShift128,
) -> Solution {
    let (first, second) = parents;

    if first.num_routes() == 0 || second.num_routes() == 0 {
        return if first.num_routes() == 0 {
            second.clone()
        } else {
            first.clone()
        };
    }

    let order_a = angular_order(first);
    let order_b = angular_order(second);

    let max_moved = first.num_routes().min(second.num_routes());
    let num_moved = 1 + rng.randint(max_moved as u32) as usize;
    let start_a = rng.randint(first.num_routes() as u32) as usize;
    let start_b = rng.randint(second.num_routes() as u32) as usize;

    let window_a: Vec<usize> = (0..num_moved)
        .map(|offset| order_a[(start_a + offset) % order_a.len()])
        .collect();
    let window_b: Vec<usize> = (0..num_moved)
        .map(|offset| order_b[(start_b + offset) % order_b.len()])
        .collect();

    // Keep the first parent's routes outside the window.
    let mut offspring: Vec<(usize, Vec<usize>)> = Vec::with_capacity(first.num_routes());
    let mut seen = FxHashSet::default();
    for (idx, route) in first.routes().iter().enumerate() {
        if !window_a.contains(&idx) {
            offspring.push((route.vehicle_type(), route.visits().to_vec()));
            seen.extend(route.visits().iter().copied());
        }
    }

    // The incoming routes reuse the vehicles freed by the removed window, so
    // fleet availability is preserved.
    for (offset, &b_idx) in window_b.iter().enumerate() {
        let vehicle_type = first.routes()[window_a[offset]].vehicle_type();
        let visits: Vec<usize> = second.routes()[b_idx]
            .visits()
            .iter()
            .copied()
            .filter(|client| seen.insert(*client))
            .collect();

        if !visits.is_empty() {
            offspring.push((vehicle_type, visits));
        }
    }

    let partial = Solution::new(data, offspring).expect("parents are valid solutions");

    let missing: Vec<usize> = data
        .client_indices()
        .filter(|client| first.neighbours()[*client].is_some() && !seen.contains(client))
        .collect();

    if missing.is_empty() {
        partial
    } else {
        // Unit penalty coefficients; the caller's search pass re-optimises
        // the repaired offspring anyway.
        let cost_evaluator = CostEvaluator::new(measure::ONE, measure::ONE);
        greedy_repair(&partial, &missing, data, &cost_evaluator)
    }
}

/// Route indices sorted by the polar angle of each route's centroid around
/// the mean depot location.
fn angular_order(solution: &Solution) -> Vec<usize> {
    let reference = solution
        .routes()
        .iter()
        .fold((0.0, 0.0), |(x, y), route| {
            let (cx, cy) = route.centroid();
            (
                x + cx / solution.num_routes() as f64,
                y + cy / solution.num_routes() as f64,
            )
        });

    let mut order: Vec<usize> = (0..solution.num_routes()).collect();
    order.sort_by(|&a, &b| {
        let (ax, ay) = solution.routes()[a].centroid();
        let (bx, by) = solution.routes()[b].centroid();
        let angle_a = (ay - reference.1).atan2(ax - reference.0);
        let angle_b = (by - reference.1).atan2(bx - reference.0);
        angle_a
            .partial_cmp(&angle_b)
            .expect("angles are never NaN")
            .then(a.cmp(&b))
    });

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VehicleType;
    use crate::test_utils;

    #[test]
    fn offspring_is_complete_and_respects_the_fleet() {
        let data = test_utils::line_problem(6, vec![VehicleType::new(3, 100)]);
        let a = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![3, 4]), (0, vec![5, 6])])
            .unwrap();
        let b = Solution::new(&data, vec![(0, vec![2, 1]), (0, vec![4, 6]), (0, vec![5, 3])])
            .unwrap();

        let mut rng = XorShift128::new(7);
        for _ in 0..20 {
            let child = selective_route_exchange((&a, &b), &data, &mut rng);
            assert_eq!(child.num_missing_clients(), 0);
            assert!(child.num_routes() <= 3);
        }
    }

    #[test]
    fn single_route_parents_exchange_whole_routes() {
        let data = test_utils::line_problem(4, vec![VehicleType::new(2, 100)]);
        let a = Solution::new(&data, vec![(0, vec![1, 2, 3, 4])]).unwrap();
        let b = Solution::new(&data, vec![(0, vec![4, 3, 2, 1])]).unwrap();

        let mut rng = XorShift128::new(3);
        let child = selective_route_exchange((&a, &b), &data, &mut rng);

        // With one route per parent, the child is the second parent's route
        // on the first parent's vehicle.
        assert_eq!(child.num_routes(), 1);
        assert_eq!(child.routes()[0].visits(), &[4, 3, 2, 1]);
    }
}
