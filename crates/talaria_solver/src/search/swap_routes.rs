use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::operator::{NodeOperator, NodePos, RouteOperator};
use crate::search::route::SearchRoute;
use crate::search::two_opt::TwoOpt;

/// Exchanges the entire client sequences of two routes with *different*
/// vehicle types, implemented as a 2-opt between the two depot positions.
/// Swapping routes of the same type cannot change the cost, so those pairs
/// are skipped.
pub struct SwapRoutes {
    two_opt: TwoOpt,
}

impl SwapRoutes {
    pub fn new() -> Self {
        SwapRoutes {
            two_opt: TwoOpt::new(),
        }
    }

    fn depots(first: usize, second: usize) -> (NodePos, NodePos) {
        // The tail exchange is evaluated for ordered route pairs only.
        let (lo, hi) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        (NodePos::new(lo, 0), NodePos::new(hi, 0))
    }
}

impl Default for SwapRoutes {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteOperator for SwapRoutes {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        first: usize,
        second: usize,
    ) -> Cost {
        if routes[first].vehicle_type() == routes[second].vehicle_type() {
            return measure::ZERO;
        }

        if routes[first].is_empty() || routes[second].is_empty() {
            return measure::ZERO;
        }

        let (u, v) = Self::depots(first, second);
        self.two_opt.evaluate(data, cost_evaluator, routes, u, v)
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], first: usize, second: usize) {
        let (u, v) = Self::depots(first, second);
        self.two_opt.apply(data, routes, u, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Client, Depot, VehicleType};
    use crate::test_utils;

    fn two_type_data() -> ProblemData {
        let coords = [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)];
        let demands = [4, 4, 4, 2];
        let clients = coords[1..]
            .iter()
            .zip(demands)
            .map(|(&(x, y), delivery)| Client {
                delivery,
                ..Client::new(x, y)
            })
            .collect();

        let mut small = VehicleType::new(1, 5);
        small.fixed_cost = 10;
        let mut large = VehicleType::new(1, 50);
        large.fixed_cost = 25;

        test_utils::create_problem(
            clients,
            vec![Depot::new(0, 0)],
            vec![small, large],
            test_utils::manhattan_matrix(&coords),
        )
    }

    fn routes_with_types(data: &ProblemData, sets: &[(usize, &[usize])]) -> Vec<SearchRoute> {
        sets.iter()
            .enumerate()
            .map(|(idx, (vehicle_type, visits))| {
                let mut route = SearchRoute::new(data, idx, *vehicle_type);
                route.set_visits(visits.to_vec());
                route.update(data);
                route
            })
            .collect()
    }

    #[test]
    fn same_vehicle_type_evaluates_to_zero() {
        let data = test_utils::line_problem(4, vec![VehicleType::new(2, 100)]);
        let routes = routes_with_types(&data, &[(0, &[1, 2]), (0, &[3, 4])]);

        let mut op = SwapRoutes::new();
        let cost_evaluator = CostEvaluator::new(1, 1);
        assert_eq!(
            op.evaluate(&data, &cost_evaluator, &routes, 0, 1),
            measure::ZERO
        );
    }

    #[test]
    fn moves_overload_onto_the_larger_vehicle() {
        let data = two_type_data();

        // The small vehicle (capacity 5) carries 12 demand; the large one
        // carries 2. Swapping the routes removes all excess load.
        let mut routes = routes_with_types(&data, &[(0, &[1, 2, 3]), (1, &[4])]);

        let mut op = SwapRoutes::new();
        let cost_evaluator = CostEvaluator::new(100, 1);

        let before: Cost = routes
            .iter()
            .map(|route| route.penalised_cost(&cost_evaluator))
            .sum();

        let delta = op.evaluate(&data, &cost_evaluator, &routes, 0, 1);
        op.apply(&data, &mut routes, 0, 1);
        routes[0].update(&data);
        routes[1].update(&data);

        let after: Cost = routes
            .iter()
            .map(|route| route.penalised_cost(&cost_evaluator))
            .sum();

        assert_eq!(after - before, delta);
        assert_eq!(routes[0].visits(), &[4]);
        assert_eq!(routes[1].visits(), &[1, 2, 3]);
    }

    #[test]
    fn apply_swaps_whole_visit_sequences() {
        let data = two_type_data();
        let mut routes = routes_with_types(&data, &[(0, &[1]), (1, &[2, 3])]);

        let mut op = SwapRoutes::new();
        op.apply(&data, &mut routes, 0, 1);
        routes[0].update(&data);
        routes[1].update(&data);

        assert_eq!(routes[0].visits(), &[2, 3]);
        assert_eq!(routes[1].visits(), &[1]);
    }
}
