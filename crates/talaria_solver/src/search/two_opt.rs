use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::operator::{NodeOperator, NodePos};
use crate::search::route::{SearchRoute, route_pair_mut};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// 2-opt. Within a route, reverses the segment between `U` and `V`; between
/// routes, exchanges the tails following `U` and `V`. The between-route
/// variant is symmetric in the pair, so only ordered route pairs are
/// evaluated.
pub struct TwoOpt;

impl TwoOpt {
    pub fn new() -> Self {
        TwoOpt
    }

    fn eval_within(
        &self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        let route = &routes[u.route];
        let last = route.size() + 1;

        let mut delta = measure::ZERO;
        delta -= route.distance();
        delta -= cost_evaluator.load_penalty(route.load(), route.capacity());
        delta -= cost_evaluator.tw_penalty(route.time_warp());

        delta += route.dist_before(u.slot).distance()
            + data.dist(route.location(u.slot), route.location(v.slot))
            + route.dist_between_reversed(data, u.slot + 1, v.slot)
            + data.dist(route.location(u.slot + 1), route.location(v.slot + 1))
            + route.dist_between(v.slot + 1, last).distance();

        if delta >= measure::ZERO {
            return delta;
        }

        // Reversal keeps the client set but reorders it, which moves the
        // order-dependent peak load as well as the schedule.
        let new_ls = LoadSegment::merge3(
            route.load_before(u.slot),
            route.load_between_reversed(u.slot + 1, v.slot),
            route.load_after(v.slot + 1),
        );
        delta += cost_evaluator.load_penalty(new_ls.load(), route.capacity());

        let new_ds = DurationSegment::merge3(
            data.duration_matrix(),
            route.dur_before(u.slot),
            route.dur_between_reversed(data, u.slot + 1, v.slot),
            route.dur_after(v.slot + 1),
        );
        delta += cost_evaluator.tw_penalty(new_ds.time_warp(route.max_duration()));

        delta
    }

    fn eval_between(
        &self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        let u_route = &routes[u.route];
        let v_route = &routes[v.route];

        let mut delta = measure::ZERO;
        delta -= u_route.distance() + v_route.distance();
        delta -= cost_evaluator.tw_penalty(u_route.time_warp());
        delta -= cost_evaluator.tw_penalty(v_route.time_warp());
        delta -= cost_evaluator.load_penalty(u_route.load(), u_route.capacity());
        delta -= cost_evaluator.load_penalty(v_route.load(), v_route.capacity());

        let u_dist = DistanceSegment::merge(
            data.distance_matrix(),
            u_route.dist_before(u.slot),
            v_route.dist_after(v.slot + 1),
        );
        let v_dist = DistanceSegment::merge(
            data.distance_matrix(),
            v_route.dist_before(v.slot),
            u_route.dist_after(u.slot + 1),
        );
        delta += u_dist.distance() + v_dist.distance();

        let u_becomes_empty = u.slot == 0 && v.slot == v_route.size();
        let v_becomes_empty = v.slot == 0 && u.slot == u_route.size();
        if !u_route.is_empty() && u_becomes_empty {
            delta -= u_route.fixed_vehicle_cost();
        }
        if u_route.is_empty() && !u_becomes_empty {
            delta += u_route.fixed_vehicle_cost();
        }
        if !v_route.is_empty() && v_becomes_empty {
            delta -= v_route.fixed_vehicle_cost();
        }
        if v_route.is_empty() && !v_becomes_empty {
            delta += v_route.fixed_vehicle_cost();
        }

        if delta >= measure::ZERO {
            return delta;
        }

        let u_ls = LoadSegment::merge(u_route.load_before(u.slot), v_route.load_after(v.slot + 1));
        delta += cost_evaluator.load_penalty(u_ls.load(), u_route.capacity());

        let v_ls = LoadSegment::merge(v_route.load_before(v.slot), u_route.load_after(u.slot + 1));
        delta += cost_evaluator.load_penalty(v_ls.load(), v_route.capacity());

        let u_ds = DurationSegment::merge(
            data.duration_matrix(),
            u_route.dur_before(u.slot),
            v_route.dur_after(v.slot + 1),
        );
        delta += cost_evaluator.tw_penalty(u_ds.time_warp(u_route.max_duration()));

        let v_ds = DurationSegment::merge(
            data.duration_matrix(),
            v_route.dur_before(v.slot),
            u_route.dur_after(u.slot + 1),
        );
        delta += cost_evaluator.tw_penalty(v_ds.time_warp(v_route.max_duration()));

        delta
    }
}

impl Default for TwoOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeOperator for TwoOpt {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        if u.route > v.route {
            // Symmetric between routes; the mirrored pair covers this.
            return measure::ZERO;
        }

        if u.route != v.route {
            return self.eval_between(data, cost_evaluator, routes, u, v);
        }

        if u.slot + 1 >= v.slot {
            // Nothing to reverse.
            return measure::ZERO;
        }

        self.eval_within(data, cost_evaluator, routes, u, v)
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], u: NodePos, v: NodePos) {
        let _ = data;

        if u.route == v.route {
            routes[u.route].reverse(u.slot + 1, v.slot);
        } else {
            let (u_route, v_route) = route_pair_mut(routes, u.route, v.route);

            let mut u_visits = u_route.visits()[..u.slot].to_vec();
            let mut v_visits = v_route.visits()[..v.slot].to_vec();
            u_visits.extend_from_slice(&v_route.visits()[v.slot..]);
            v_visits.extend_from_slice(&u_route.visits()[u.slot..]);

            u_route.set_visits(u_visits);
            v_route.set_visits(v_visits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VehicleType;
    use crate::search::route::SearchRoute;
    use crate::test_utils;

    fn routes_for(data: &ProblemData, visit_sets: &[&[usize]]) -> Vec<SearchRoute> {
        visit_sets
            .iter()
            .enumerate()
            .map(|(idx, visits)| {
                let mut route = SearchRoute::new(data, idx, 0);
                route.set_visits(visits.to_vec());
                route.update(data);
                route
            })
            .collect()
    }

    #[test]
    fn within_route_reversal_uncrosses_edges() {
        // Clients on a line; visiting them in the order 1, 3, 2, 4 doubles
        // back twice, and reversing the middle pair fixes that.
        let data = test_utils::line_problem(4, vec![VehicleType::new(1, 100)]);
        let mut routes = routes_for(&data, &[&[1, 3, 2, 4]]);
        let mut op = TwoOpt::new();
        let cost_evaluator = CostEvaluator::new(1, 1);

        let before = routes[0].distance();
        let delta = op.evaluate(
            &data,
            &cost_evaluator,
            &routes,
            NodePos::new(0, 1),
            NodePos::new(0, 3),
        );
        assert!(delta < measure::ZERO);

        op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(0, 3));
        routes[0].update(&data);

        assert_eq!(routes[0].visits(), &[1, 2, 3, 4]);
        assert_eq!(routes[0].distance() - before, delta);
    }

    #[test]
    fn within_route_reversal_accounts_for_peak_load() {
        // The route visits the big pickup before the big delivery, so its
        // peak load of 18 far exceeds the capacity of 10. Reversing the
        // middle segment drops the peak to 12 at a distance cost of 4.
        let data = test_utils::mixed_load_problem();
        let mut routes = routes_for(&data, &[&[4, 3, 2, 1]]);
        let mut op = TwoOpt::new();
        let cost_evaluator = CostEvaluator::new(20, 6);

        assert_eq!(routes[0].load(), 18);

        let before = routes[0].penalised_cost(&cost_evaluator);
        let delta = op.evaluate(
            &data,
            &cost_evaluator,
            &routes,
            NodePos::new(0, 1),
            NodePos::new(0, 4),
        );
        assert_eq!(delta, 4 + 20 * (2 - 8));

        op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(0, 4));
        routes[0].update(&data);

        assert_eq!(routes[0].visits(), &[4, 1, 2, 3]);
        assert_eq!(routes[0].load(), 12);
        assert_eq!(routes[0].penalised_cost(&cost_evaluator) - before, delta);
    }

    #[test]
    fn between_routes_exchanges_tails() {
        let data = test_utils::line_problem(6, vec![VehicleType::new(2, 100)]);
        let mut routes = routes_for(&data, &[&[1, 2, 3], &[4, 5, 6]]);
        let mut op = TwoOpt::new();

        op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(1, 2));
        routes[0].update(&data);
        routes[1].update(&data);

        assert_eq!(routes[0].visits(), &[1, 6]);
        assert_eq!(routes[1].visits(), &[4, 5, 2, 3]);
    }

    #[test]
    fn between_routes_delta_matches_apply() {
        let data = test_utils::ok_small();

        // Clients deliberately interleaved across the two routes.
        let mut routes = routes_for(&data, &[&[2, 1], &[3, 4]]);
        let mut op = TwoOpt::new();
        let cost_evaluator = CostEvaluator::new(20, 6);

        let before: Cost = routes
            .iter()
            .map(|route| route.penalised_cost(&cost_evaluator))
            .sum();

        let delta = op.evaluate(
            &data,
            &cost_evaluator,
            &routes,
            NodePos::new(0, 1),
            NodePos::new(1, 1),
        );

        if delta < measure::ZERO {
            op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(1, 1));
            routes[0].update(&data);
            routes[1].update(&data);

            let after: Cost = routes
                .iter()
                .map(|route| route.penalised_cost(&cost_evaluator))
                .sum();
            assert_eq!(after - before, delta);
        }
    }

    #[test]
    fn depot_pair_swaps_whole_routes() {
        let data = test_utils::line_problem(4, vec![VehicleType::new(2, 100)]);
        let mut routes = routes_for(&data, &[&[1, 2], &[3, 4]]);
        let mut op = TwoOpt::new();

        op.apply(&data, &mut routes, NodePos::new(0, 0), NodePos::new(1, 0));
        routes[0].update(&data);
        routes[1].update(&data);

        assert_eq!(routes[0].visits(), &[3, 4]);
        assert_eq!(routes[1].visits(), &[1, 2]);
    }

    #[test]
    fn mirrored_route_pairs_are_skipped() {
        let data = test_utils::line_problem(4, vec![VehicleType::new(2, 100)]);
        let routes = routes_for(&data, &[&[1, 2], &[3, 4]]);
        let mut op = TwoOpt::new();
        let cost_evaluator = CostEvaluator::new(1, 1);

        let delta = op.evaluate(
            &data,
            &cost_evaluator,
            &routes,
            NodePos::new(1, 1),
            NodePos::new(0, 1),
        );
        assert_eq!(delta, measure::ZERO);
    }
}
