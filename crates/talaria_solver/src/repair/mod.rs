//! Repair utilities used by the outer loop to complete partial solutions,
//! e.g. after crossover or a destroy step.

use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::local_search::{export_routes, insert_cost, load_routes};
use crate::search::route::SearchRoute;
use crate::solution::Solution;

/// Inserts every unvisited client at its globally cheapest position, in the
/// given order. Clients are always inserted, whatever the cost; deciding
/// *whether* a client is worth visiting is the search's job.
pub fn greedy_repair(
    solution: &Solution,
    unvisited: &[usize],
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
) -> Solution {
    let mut routes = load_routes(data, solution);

    for &client in unvisited {
        let mut best: Option<(Cost, usize, usize)> = None;

        for route in &routes {
            for slot in 0..=route.size() {
                let cost = insert_cost(data, cost_evaluator, route, slot, client);
                if best.is_none_or(|(current, _, _)| cost < current) {
                    best = Some((cost, route.idx(), slot));
                }
            }
        }

        let (_, route_idx, slot) = best.expect("at least one vehicle");
        routes[route_idx].insert(slot + 1, client);
        routes[route_idx].update(data);
    }

    export_routes(data, &routes)
}

/// Inserts every unvisited client into the non-empty route whose centroid is
/// nearest, at the cheapest position within that route. Falls back to the
/// globally cheapest position while no route has any clients yet.
pub fn nearest_route_insert(
    solution: &Solution,
    unvisited: &[usize],
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
) -> Solution {
    let mut routes = load_routes(data, solution);

    for &client in unvisited {
        let location = data.location(client);
        let (x, y) = (location.x() as f64, location.y() as f64);

        let nearest = routes
            .iter()
            .filter(|route| !route.is_empty())
            .min_by(|a, b| {
                let da = centroid_distance(data, a, x, y);
                let db = centroid_distance(data, b, x, y);
                da.partial_cmp(&db)
                    .expect("centroid distances are never NaN")
                    .then(a.idx().cmp(&b.idx()))
            })
            .map(SearchRoute::idx);

        let (route_idx, slot) = match nearest {
            Some(route_idx) => {
                let route = &routes[route_idx];
                let slot = (0..=route.size())
                    .min_by(|&a, &b| {
                        let ca = insert_cost(data, cost_evaluator, route, a, client);
                        let cb = insert_cost(data, cost_evaluator, route, b, client);
                        measure::cmp(ca, cb)
                    })
                    .expect("routes have at least the depot slot");
                (route_idx, slot)
            }
            None => {
                let mut best: Option<(Cost, usize, usize)> = None;
                for route in &routes {
                    for slot in 0..=route.size() {
                        let cost = insert_cost(data, cost_evaluator, route, slot, client);
                        if best.is_none_or(|(current, _, _)| cost < current) {
                            best = Some((cost, route.idx(), slot));
                        }
                    }
                }
                let (_, route_idx, slot) = best.expect("at least one vehicle");
                (route_idx, slot)
            }
        };

        routes[route_idx].insert(slot + 1, client);
        routes[route_idx].update(data);
    }

    export_routes(data, &routes)
}

fn centroid_distance(data: &ProblemData, route: &SearchRoute, x: f64, y: f64) -> f64 {
    let mut cx = 0.0;
    let mut cy = 0.0;
    for slot in 1..=route.size() {
        let location = data.location(route.location(slot));
        cx += location.x() as f64 / route.size() as f64;
        cy += location.y() as f64 / route.size() as f64;
    }

    (cx - x).hypot(cy - y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VehicleType;
    use crate::test_utils;

    #[test]
    fn greedy_repair_completes_a_partial_solution() {
        let data = test_utils::ok_small();
        let cost_evaluator = CostEvaluator::new(20, 6);

        let partial = Solution::new(&data, vec![(0, vec![1])]).unwrap();
        let repaired = greedy_repair(&partial, &[2, 3, 4], &data, &cost_evaluator);

        assert_eq!(repaired.num_missing_clients(), 0);
        assert!(repaired.is_complete());
    }

    #[test]
    fn greedy_repair_from_empty_uses_available_vehicles() {
        let data = test_utils::ok_small();
        let cost_evaluator = CostEvaluator::new(20, 6);

        let empty = Solution::empty(&data);
        let repaired = greedy_repair(&empty, &[1, 2, 3, 4], &data, &cost_evaluator);

        assert!(repaired.is_complete());
        assert!(repaired.num_routes() >= 1);
        assert!(repaired.num_routes() <= 3);
    }

    #[test]
    fn nearest_route_insert_prefers_the_closer_route() {
        // Two tight clusters at either end of a line.
        let data = test_utils::line_problem(6, vec![VehicleType::new(2, 100)]);
        let cost_evaluator = CostEvaluator::new(1, 1);

        let partial = Solution::new(&data, vec![(0, vec![1]), (0, vec![6])]).unwrap();
        let repaired = nearest_route_insert(&partial, &[2, 5], &data, &cost_evaluator);

        let with_1 = repaired
            .routes()
            .iter()
            .find(|route| route.visits().contains(&1))
            .unwrap();
        let with_6 = repaired
            .routes()
            .iter()
            .find(|route| route.visits().contains(&6))
            .unwrap();

        assert!(with_1.visits().contains(&2));
        assert!(with_6.visits().contains(&5));
    }
}
