use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::operator::{NodeOperator, NodePos};
use crate::search::route::{SearchRoute, route_pair_mut};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// Relocates the pair `U`, `n(U)` to just after `V`, inserting the two
/// clients in reverse order.
pub struct MoveTwoClientsReversed;

impl MoveTwoClientsReversed {
    pub fn new() -> Self {
        MoveTwoClientsReversed
    }
}

impl Default for MoveTwoClientsReversed {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeOperator for MoveTwoClientsReversed {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        let u_route = &routes[u.route];

        // The moved pair must be two clients, and V must neither be inside
        // the pair nor U's immediate predecessor (that move is a no-op's
        // mirror, handled as a pair reversal by other operators).
        if u_route.is_depot_slot(u.slot) || u.slot + 1 > u_route.size() {
            return measure::ZERO;
        }

        if u.route == v.route && (v.slot == u.slot || v.slot == u.slot + 1 || u.slot == v.slot + 1)
        {
            return measure::ZERO;
        }

        let v_route = &routes[v.route];
        let dist = data.distance_matrix();
        let dur = data.duration_matrix();

        // The pair is reinserted in reverse: first n(U), then U.
        let first = u.slot + 1;
        let second = u.slot;

        let mut delta = measure::ZERO;

        if u.route != v.route {
            let u_dist = DistanceSegment::merge(
                dist,
                u_route.dist_before(u.slot - 1),
                u_route.dist_after(u.slot + 2),
            );
            delta += u_dist.distance() - u_route.distance();

            let v_dist = DistanceSegment::merge(
                dist,
                DistanceSegment::merge3(
                    dist,
                    v_route.dist_before(v.slot),
                    u_route.dist_between(first, first),
                    u_route.dist_between(second, second),
                ),
                v_route.dist_after(v.slot + 1),
            );
            delta += v_dist.distance() - v_route.distance();

            if v_route.is_empty() {
                delta += v_route.fixed_vehicle_cost();
            }
            if u_route.size() == 2 {
                delta -= u_route.fixed_vehicle_cost();
            }

            delta -= cost_evaluator.load_penalty(u_route.load(), u_route.capacity());
            delta -= cost_evaluator.tw_penalty(u_route.time_warp());

            if delta >= measure::ZERO {
                return delta;
            }

            let u_ds = DurationSegment::merge(
                dur,
                u_route.dur_before(u.slot - 1),
                u_route.dur_after(u.slot + 2),
            );
            delta += cost_evaluator.tw_penalty(u_ds.time_warp(u_route.max_duration()));

            let u_ls = LoadSegment::merge(
                u_route.load_before(u.slot - 1),
                u_route.load_after(u.slot + 2),
            );
            delta += cost_evaluator.load_penalty(u_ls.load(), u_route.capacity());

            let v_ls = LoadSegment::merge(
                LoadSegment::merge3(
                    v_route.load_before(v.slot),
                    u_route.load_at(first),
                    u_route.load_at(second),
                ),
                v_route.load_after(v.slot + 1),
            );
            delta += cost_evaluator.load_penalty(v_ls.load(), v_route.capacity());
            delta -= cost_evaluator.load_penalty(v_route.load(), v_route.capacity());

            let v_ds = DurationSegment::merge(
                dur,
                DurationSegment::merge3(
                    dur,
                    v_route.dur_before(v.slot),
                    u_route.dur_at(first),
                    u_route.dur_at(second),
                ),
                v_route.dur_after(v.slot + 1),
            );
            delta += cost_evaluator.tw_penalty(v_ds.time_warp(v_route.max_duration()));
            delta -= cost_evaluator.tw_penalty(v_route.time_warp());
        } else {
            delta -= u_route.distance();
            delta -= cost_evaluator.load_penalty(u_route.load(), u_route.capacity());
            delta -= cost_evaluator.tw_penalty(u_route.time_warp());

            if u.slot < v.slot {
                let new_dist = DistanceSegment::merge(
                    dist,
                    DistanceSegment::merge3(
                        dist,
                        DistanceSegment::merge(
                            dist,
                            u_route.dist_before(u.slot - 1),
                            u_route.dist_between(u.slot + 2, v.slot),
                        ),
                        u_route.dist_between(first, first),
                        u_route.dist_between(second, second),
                    ),
                    u_route.dist_after(v.slot + 1),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                // Reinserting the pair reversed reorders the route, which
                // moves the order-dependent peak load.
                let new_ls = LoadSegment::merge(
                    LoadSegment::merge3(
                        LoadSegment::merge(
                            u_route.load_before(u.slot - 1),
                            u_route.load_between(u.slot + 2, v.slot),
                        ),
                        u_route.load_at(first),
                        u_route.load_at(second),
                    ),
                    u_route.load_after(v.slot + 1),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let new_ds = DurationSegment::merge(
                    dur,
                    DurationSegment::merge3(
                        dur,
                        DurationSegment::merge(
                            dur,
                            u_route.dur_before(u.slot - 1),
                            u_route.dur_between(data, u.slot + 2, v.slot),
                        ),
                        u_route.dur_at(first),
                        u_route.dur_at(second),
                    ),
                    u_route.dur_after(v.slot + 1),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            } else {
                let head = DistanceSegment::merge3(
                    dist,
                    u_route.dist_before(v.slot),
                    u_route.dist_between(first, first),
                    u_route.dist_between(second, second),
                );
                let new_dist = DistanceSegment::merge3(
                    dist,
                    head,
                    u_route.dist_between(v.slot + 1, u.slot - 1),
                    u_route.dist_after(u.slot + 2),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                let ls_head = LoadSegment::merge3(
                    u_route.load_before(v.slot),
                    u_route.load_at(first),
                    u_route.load_at(second),
                );
                let new_ls = LoadSegment::merge3(
                    ls_head,
                    u_route.load_between(v.slot + 1, u.slot - 1),
                    u_route.load_after(u.slot + 2),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let ds_head = DurationSegment::merge3(
                    dur,
                    u_route.dur_before(v.slot),
                    u_route.dur_at(first),
                    u_route.dur_at(second),
                );
                let new_ds = DurationSegment::merge3(
                    dur,
                    ds_head,
                    u_route.dur_between(data, v.slot + 1, u.slot - 1),
                    u_route.dur_after(u.slot + 2),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            }
        }

        delta
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], u: NodePos, v: NodePos) {
        let _ = data;

        if u.route != v.route {
            let (u_route, v_route) = route_pair_mut(routes, u.route, v.route);
            let second = u_route.remove(u.slot + 1);
            let first = u_route.remove(u.slot);

            v_route.insert(v.slot + 1, second);
            v_route.insert(v.slot + 2, first);
        } else {
            let route = &mut routes[u.route];
            let visits = route.visits();
            let pair = [visits[u.slot], visits[u.slot - 1]];

            let mut out = Vec::with_capacity(visits.len());
            if v.slot == 0 {
                out.extend_from_slice(&pair);
            }
            for idx in 0..visits.len() {
                if idx == u.slot - 1 || idx == u.slot {
                    continue;
                }
                out.push(visits[idx]);
                if idx + 1 == v.slot {
                    out.extend_from_slice(&pair);
                }
            }

            route.set_visits(out);
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
    fn apply_moves_pair_reversed_between_routes() {
        let data = test_utils::line_problem(6, vec![VehicleType::new(2, 100)]);
        let mut routes = routes_for(&data, &[&[1, 2, 3], &[4, 5, 6]]);
        let mut op = MoveTwoClientsReversed::new();

        // Move [1, 2] after client 5, reversed.
        op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(1, 2));
        routes[0].update(&data);
        routes[1].update(&data);

        assert_eq!(routes[0].visits(), &[3]);
        assert_eq!(routes[1].visits(), &[4, 5, 2, 1, 6]);
    }

    #[test]
    fn apply_moves_pair_reversed_within_route() {
        let data = test_utils::line_problem(5, vec![VehicleType::new(1, 100)]);
        let mut routes = routes_for(&data, &[&[1, 2, 3, 4, 5]]);
        let mut op = MoveTwoClientsReversed::new();

        // Move [1, 2] after client 4, reversed.
        op.apply(&data, &mut routes, NodePos::new(0, 1), NodePos::new(0, 4));
        routes[0].update(&data);
        assert_eq!(routes[0].visits(), &[3, 4, 2, 1, 5]);

        // And back towards the front: move [2, 1] after the depot.
        op.apply(&data, &mut routes, NodePos::new(0, 3), NodePos::new(0, 0));
        routes[0].update(&data);
        assert_eq!(routes[0].visits(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn guards_reject_depot_pairs_and_overlap() {
        let data = test_utils::line_problem(4, vec![VehicleType::new(2, 100)]);
        let routes = routes_for(&data, &[&[1, 2, 3], &[4]]);
        let mut op = MoveTwoClientsReversed::new();
        let cost_evaluator = CostEvaluator::new(1, 1);

        // n(U) would be the depot.
        assert_eq!(
            op.evaluate(&data, &cost_evaluator, &routes, NodePos::new(0, 3), NodePos::new(1, 1)),
            measure::ZERO
        );

        // V inside the moved pair.
        assert_eq!(
            op.evaluate(&data, &cost_evaluator, &routes, NodePos::new(0, 1), NodePos::new(0, 2)),
            measure::ZERO
        );
    }

    #[test]
    fn evaluate_matches_apply_with_simultaneous_pickup_and_delivery() {
        // Reinserting the pair reversed reorders pickups and deliveries, so
        // the delta must track the order-dependent peak load.
        let data = test_utils::mixed_load_problem();
        let mut routes = routes_for(&data, &[&[2, 1, 3, 4]]);
        let mut op = MoveTwoClientsReversed::new();
        let cost_evaluator = CostEvaluator::new(20, 6);

        let mut best = (measure::ZERO, NodePos::new(0, 0), NodePos::new(0, 0));
        for u_slot in 1..routes[0].size() {
            for v_slot in 0..=routes[0].size() {
                let u = NodePos::new(0, u_slot);
                let v = NodePos::new(0, v_slot);
                let delta = op.evaluate(&data, &cost_evaluator, &routes, u, v);
                if delta < best.0 {
                    best = (delta, u, v);
                }
            }
        }

        assert!(best.0 < measure::ZERO);

        let before = routes[0].penalised_cost(&cost_evaluator);
        op.apply(&data, &mut routes, best.1, best.2);
        routes[0].update(&data);
        let after = routes[0].penalised_cost(&cost_evaluator);

        assert_eq!(after - before, best.0);
    }

    #[test]
    fn evaluate_matches_apply() {
        let data = test_utils::ok_small();
        let mut routes = routes_for(&data, &[&[1, 4, 2, 3]]);
        let mut op = MoveTwoClientsReversed::new();
        let cost_evaluator = CostEvaluator::new(20, 6);

        let mut best = (measure::ZERO, NodePos::new(0, 0), NodePos::new(0, 0));
        for u_slot in 1..=routes[0].size() {
            for v_slot in 0..=routes[0].size() {
                let u = NodePos::new(0, u_slot);
                let v = NodePos::new(0, v_slot);
                let delta = op.evaluate(&data, &cost_evaluator, &routes, u, v);
                if delta < best.0 {
                    best = (delta, u, v);
                }
            }
        }

        assert!(best.0 < measure::ZERO);

        let before = routes[0].penalised_cost(&cost_evaluator);
        op.apply(&data, &mut routes, best.1, best.2);
        routes[0].update(&data);
        let after = routes[0].penalised_cost(&cost_evaluator);

        assert_eq!(after - before, best.0);
    }
}
