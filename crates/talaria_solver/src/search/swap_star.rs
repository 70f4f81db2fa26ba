use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::operator::{NodePos, RouteOperator};
use crate::search::route::SearchRoute;
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// The SWAP* neighbourhood of Vidal (2022): exchanges a client `U` of the
/// first route with a client `V` of the second, but reinserts each in its
/// best position in the other route rather than in its counterpart's place.
///
/// Candidate moves are ranked with cached estimates: per-route removal
/// costs, and the three cheapest insertion positions per (route, client)
/// pair. Keeping three guarantees a usable position even when the best ones
/// coincide with the removed client. The caches are invalidated per route
/// through the `init`/`update` hooks; the chosen move is then re-evaluated
/// exactly before being reported.
pub struct SwapStar {
    removal_costs: Vec<Vec<Cost>>,
    cache: Vec<Vec<ThreeBest>>,
    updated: Vec<bool>,
    num_depots: usize,
    best: Option<BestMove>,
}

/// The three cheapest insertion positions of one client in one route,
/// sorted by estimated cost.
#[derive(Clone)]
struct ThreeBest {
    should_update: bool,
    costs: [Cost; 3],
    slots: [Option<usize>; 3],
}

impl ThreeBest {
    fn stale() -> Self {
        ThreeBest {
            should_update: true,
            costs: [measure::MAX; 3],
            slots: [None; 3],
        }
    }

    fn maybe_add(&mut self, cost: Cost, slot: usize) {
        if cost >= self.costs[2] {
            return;
        }

        if cost >= self.costs[1] {
            self.costs[2] = cost;
            self.slots[2] = Some(slot);
        } else if cost >= self.costs[0] {
            self.costs[2] = self.costs[1];
            self.slots[2] = self.slots[1];
            self.costs[1] = cost;
            self.slots[1] = Some(slot);
        } else {
            self.costs[2] = self.costs[1];
            self.slots[2] = self.slots[1];
            self.costs[1] = self.costs[0];
            self.slots[1] = self.slots[0];
            self.costs[0] = cost;
            self.slots[0] = Some(slot);
        }
    }
}

#[derive(Clone, Copy)]
struct BestMove {
    u: NodePos,
    /// Insert U after this slot of V's route.
    u_after: usize,
    v: NodePos,
    /// Insert V after this slot of U's route.
    v_after: usize,
}

impl SwapStar {
    pub fn new() -> Self {
        SwapStar {
            removal_costs: Vec::new(),
            cache: Vec::new(),
            updated: Vec::new(),
            num_depots: 0,
            best: None,
        }
    }

    fn update_removal_costs(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        route: &SearchRoute,
    ) {
        let costs = &mut self.removal_costs[route.idx()];
        costs.fill(measure::ZERO);

        for slot in 1..=route.size() {
            let client = route.location(slot) - self.num_depots;

            let dist = DistanceSegment::merge(
                data.distance_matrix(),
                route.dist_before(slot - 1),
                route.dist_after(slot + 1),
            );
            let ds = DurationSegment::merge(
                data.duration_matrix(),
                route.dur_before(slot - 1),
                route.dur_after(slot + 1),
            );

            costs[client] = dist.distance() - route.distance()
                + cost_evaluator.tw_penalty(ds.time_warp(route.max_duration()))
                - cost_evaluator.tw_penalty(route.time_warp());
        }
    }

    fn update_insertion_costs(
        entry: &mut ThreeBest,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        route: &SearchRoute,
        client: usize,
    ) {
        *entry = ThreeBest {
            should_update: false,
            ..ThreeBest::stale()
        };

        let seg_dur = DurationSegment::at(client, data.location(client));

        for slot in 0..=route.size() {
            let here = route.location(slot);
            let next = route.location(slot + 1);

            let dist_delta = data.dist(here, client) + data.dist(client, next)
                - data.dist(here, next);

            let ds = DurationSegment::merge3(
                data.duration_matrix(),
                route.dur_before(slot),
                seg_dur,
                route.dur_after(slot + 1),
            );

            let cost = dist_delta
                + cost_evaluator.tw_penalty(ds.time_warp(route.max_duration()))
                - cost_evaluator.tw_penalty(route.time_warp());

            entry.maybe_add(cost, slot);
        }
    }

    /// Estimated cost and insert-after slot for placing `client` in `route`,
    /// assuming the client at `removed_slot` is taken out. Falls back to the
    /// vacated position itself when all three cached spots collide with it.
    fn best_insert_point(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        route: &SearchRoute,
        client: usize,
        removed_slot: usize,
    ) -> (Cost, usize) {
        let entry = &mut self.cache[route.idx()][client - self.num_depots];
        if entry.should_update {
            Self::update_insertion_costs(entry, data, cost_evaluator, route, client);
        }

        for k in 0..3 {
            if let Some(slot) = entry.slots[k]
                && slot != removed_slot
                && slot + 1 != removed_slot
            {
                return (entry.costs[k], slot);
            }
        }

        // In place of the removed client.
        let prev = route.location(removed_slot - 1);
        let next = route.location(removed_slot + 1);
        let dist_delta =
            data.dist(prev, client) + data.dist(client, next) - data.dist(prev, next);

        let ds = DurationSegment::merge3(
            data.duration_matrix(),
            route.dur_before(removed_slot - 1),
            DurationSegment::at(client, data.location(client)),
            route.dur_after(removed_slot + 1),
        );

        let cost = dist_delta
            + cost_evaluator.tw_penalty(ds.time_warp(route.max_duration()))
            - cost_evaluator.tw_penalty(route.time_warp());

        (cost, removed_slot - 1)
    }

    /// Exact penalised-cost delta for one route after removing the client at
    /// `removed_slot` and inserting `client` after `insert_after`.
    fn exact_route_delta(
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        route: &SearchRoute,
        removed_slot: usize,
        client: usize,
        insert_after: usize,
    ) -> Cost {
        let dist = data.distance_matrix();
        let dur = data.duration_matrix();
        let location = data.location(client);

        let seg_dist = DistanceSegment::at(client);
        let seg_load = LoadSegment::client(data.client(client));
        let seg_dur = DurationSegment::at(client, location);

        let (new_dist, new_load, new_dur) = if insert_after + 1 >= removed_slot
            && insert_after <= removed_slot
        {
            // In place of the removed client.
            (
                DistanceSegment::merge3(
                    dist,
                    route.dist_before(removed_slot - 1),
                    seg_dist,
                    route.dist_after(removed_slot + 1),
                ),
                LoadSegment::merge3(
                    route.load_before(removed_slot - 1),
                    seg_load,
                    route.load_after(removed_slot + 1),
                ),
                DurationSegment::merge3(
                    dur,
                    route.dur_before(removed_slot - 1),
                    seg_dur,
                    route.dur_after(removed_slot + 1),
                ),
            )
        } else if insert_after < removed_slot {
            (
                DistanceSegment::merge(
                    dist,
                    DistanceSegment::merge3(
                        dist,
                        route.dist_before(insert_after),
                        seg_dist,
                        route.dist_between(insert_after + 1, removed_slot - 1),
                    ),
                    route.dist_after(removed_slot + 1),
                ),
                LoadSegment::merge(
                    LoadSegment::merge3(
                        route.load_before(insert_after),
                        seg_load,
                        route.load_between(insert_after + 1, removed_slot - 1),
                    ),
                    route.load_after(removed_slot + 1),
                ),
                DurationSegment::merge(
                    dur,
                    DurationSegment::merge3(
                        dur,
                        route.dur_before(insert_after),
                        seg_dur,
                        route.dur_between(data, insert_after + 1, removed_slot - 1),
                    ),
                    route.dur_after(removed_slot + 1),
                ),
            )
        } else {
            (
                DistanceSegment::merge(
                    dist,
                    DistanceSegment::merge3(
                        dist,
                        route.dist_before(removed_slot - 1),
                        route.dist_between(removed_slot + 1, insert_after),
                        seg_dist,
                    ),
                    route.dist_after(insert_after + 1),
                ),
                LoadSegment::merge(
                    LoadSegment::merge3(
                        route.load_before(removed_slot - 1),
                        route.load_between(removed_slot + 1, insert_after),
                        seg_load,
                    ),
                    route.load_after(insert_after + 1),
                ),
                DurationSegment::merge(
                    dur,
                    DurationSegment::merge3(
                        dur,
                        route.dur_before(removed_slot - 1),
                        route.dur_between(data, removed_slot + 1, insert_after),
                        seg_dur,
                    ),
                    route.dur_after(insert_after + 1),
                ),
            )
        };

        new_dist.distance() - route.distance()
            + cost_evaluator.load_penalty(new_load.load(), route.capacity())
            - cost_evaluator.load_penalty(route.load(), route.capacity())
            + cost_evaluator.tw_penalty(new_dur.time_warp(route.max_duration()))
            - cost_evaluator.tw_penalty(route.time_warp())
    }

    fn rebuild_visits(
        visits: &[usize],
        removed_slot: usize,
        insert_after: usize,
        client: usize,
    ) -> Vec<usize> {
        let mut out = Vec::with_capacity(visits.len());
        if insert_after == 0 {
            out.push(client);
        }

        for slot in 1..=visits.len() {
            if slot != removed_slot {
                out.push(visits[slot - 1]);
            }
            if slot == insert_after {
                out.push(client);
            }
        }

        out
    }
}

impl Default for SwapStar {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteOperator for SwapStar {
    fn init(&mut self, data: &ProblemData, routes: &[SearchRoute]) {
        self.num_depots = data.num_depots();
        self.removal_costs = vec![vec![measure::ZERO; data.num_clients()]; routes.len()];
        self.cache = vec![vec![ThreeBest::stale(); data.num_clients()]; routes.len()];
        self.updated = vec![true; routes.len()];
        self.best = None;
    }

    fn update(&mut self, route: &SearchRoute) {
        self.updated[route.idx()] = true;
    }

    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        first: usize,
        second: usize,
    ) -> Cost {
        debug_assert_ne!(first, second);
        self.best = None;

        for route in [first, second] {
            if self.updated[route] {
                self.update_removal_costs(data, cost_evaluator, &routes[route]);
                for entry in &mut self.cache[route] {
                    entry.should_update = true;
                }
                self.updated[route] = false;
            }
        }

        let mut best_estimate = measure::ZERO;
        for u_slot in 1..=routes[first].size() {
            let u_client = routes[first].location(u_slot);

            for v_slot in 1..=routes[second].size() {
                let v_client = routes[second].location(v_slot);

                let removals = self.removal_costs[first][u_client - self.num_depots]
                    + self.removal_costs[second][v_client - self.num_depots];

                let (u_cost, u_after) = self.best_insert_point(
                    data,
                    cost_evaluator,
                    &routes[second],
                    u_client,
                    v_slot,
                );
                let (v_cost, v_after) = self.best_insert_point(
                    data,
                    cost_evaluator,
                    &routes[first],
                    v_client,
                    u_slot,
                );

                let estimate = removals + u_cost + v_cost;
                if estimate < best_estimate {
                    best_estimate = estimate;
                    self.best = Some(BestMove {
                        u: NodePos::new(first, u_slot),
                        u_after,
                        v: NodePos::new(second, v_slot),
                        v_after,
                    });
                }
            }
        }

        // The estimate ignores load interactions, so the winning candidate
        // is re-evaluated exactly before being reported to the driver.
        match self.best {
            Some(best) => {
                Self::exact_route_delta(
                    data,
                    cost_evaluator,
                    &routes[second],
                    best.v.slot,
                    routes[best.u.route].location(best.u.slot),
                    best.u_after,
                ) + Self::exact_route_delta(
                    data,
                    cost_evaluator,
                    &routes[first],
                    best.u.slot,
                    routes[best.v.route].location(best.v.slot),
                    best.v_after,
                )
            }
            None => measure::ZERO,
        }
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], first: usize, second: usize) {
        let _ = data;
        let best = self.best.take().expect("apply without improving evaluate");

        let u_client = routes[best.u.route].location(best.u.slot);
        let v_client = routes[best.v.route].location(best.v.slot);

        let first_visits = Self::rebuild_visits(
            routes[first].visits(),
            best.u.slot,
            best.v_after,
            v_client,
        );
        let second_visits = Self::rebuild_visits(
            routes[second].visits(),
            best.v.slot,
            best.u_after,
            u_client,
        );

        routes[first].set_visits(first_visits);
        routes[second].set_visits(second_visits);
    }
}
