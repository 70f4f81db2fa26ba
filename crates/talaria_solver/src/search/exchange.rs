use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::operator::{NodeOperator, NodePos};
use crate::search::route::{SearchRoute, route_pair_mut, swap_slots};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// The `(N, M)`-exchange operator: exchanges `N` consecutive clients
/// starting at `U` with `M` consecutive clients starting at `V`. `M == 0`
/// yields the relocate family, `N == M` the symmetric swaps. Monomorphised
/// over `N` and `M` so each variant compiles to straight-line segment
/// merges.
pub struct Exchange<const N: usize, const M: usize>;

pub type Relocate = Exchange<1, 0>;

impl<const N: usize, const M: usize> Exchange<N, M> {
    pub fn new() -> Self {
        const {
            assert!(N >= M && N > 0, "N < M or N == 0 does not make sense");
        }

        Exchange
    }

    /// Whether the segment of the given length starting at `pos` runs into a
    /// depot slot.
    fn contains_depot(route: &SearchRoute, slot: usize, seg_length: usize) -> bool {
        route.is_depot_slot(slot) || slot + seg_length - 1 > route.size()
    }

    /// Whether the two segments overlap in the same route.
    fn overlap(u: NodePos, v: NodePos) -> bool {
        u.route == v.route
            // max(M, 1): when V is a depot and M == 0 the segment still
            // occupies V's own slot for overlap purposes.
            && u.slot <= v.slot + M.max(1) - 1
            && v.slot <= u.slot + N - 1
    }

    /// Whether the two segments are adjacent in the same route.
    fn adjacent(u: NodePos, v: NodePos) -> bool {
        u.route == v.route && (u.slot + N == v.slot || v.slot + M == u.slot)
    }

    fn eval_relocate(
        &self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        debug_assert!(u.slot > 0);

        let u_route = &routes[u.route];
        let v_route = &routes[v.route];
        let dist = data.distance_matrix();
        let dur = data.duration_matrix();

        let mut delta = measure::ZERO;

        if u.route != v.route {
            let u_dist = DistanceSegment::merge(
                dist,
                u_route.dist_before(u.slot - 1),
                u_route.dist_after(u.slot + N),
            );
            delta += u_dist.distance() - u_route.distance();

            let v_dist = DistanceSegment::merge3(
                dist,
                v_route.dist_before(v.slot),
                u_route.dist_between(u.slot, u.slot + N - 1),
                v_route.dist_after(v.slot + 1),
            );
            delta += v_dist.distance() - v_route.distance();

            // We incur V's fixed cost if V's route is currently empty, and
            // gain U's fixed cost back if this moves all of U's clients.
            if v_route.is_empty() {
                delta += v_route.fixed_vehicle_cost();
            }
            if u_route.size() == N {
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
                u_route.dur_after(u.slot + N),
            );
            delta += cost_evaluator.tw_penalty(u_ds.time_warp(u_route.max_duration()));

            let u_ls = LoadSegment::merge(
                u_route.load_before(u.slot - 1),
                u_route.load_after(u.slot + N),
            );
            delta += cost_evaluator.load_penalty(u_ls.load(), u_route.capacity());

            let v_ls = LoadSegment::merge3(
                v_route.load_before(v.slot),
                u_route.load_between(u.slot, u.slot + N - 1),
                v_route.load_after(v.slot + 1),
            );
            delta += cost_evaluator.load_penalty(v_ls.load(), v_route.capacity());
            delta -= cost_evaluator.load_penalty(v_route.load(), v_route.capacity());

            let v_ds = DurationSegment::merge3(
                dur,
                v_route.dur_before(v.slot),
                u_route.dur_between(data, u.slot, u.slot + N - 1),
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
                        u_route.dist_before(u.slot - 1),
                        u_route.dist_between(u.slot + N, v.slot),
                        u_route.dist_between(u.slot, u.slot + N - 1),
                    ),
                    u_route.dist_after(v.slot + 1),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                // The peak load depends on visit order, so the reordered
                // route needs a fresh load segment.
                let new_ls = LoadSegment::merge(
                    LoadSegment::merge3(
                        u_route.load_before(u.slot - 1),
                        u_route.load_between(u.slot + N, v.slot),
                        u_route.load_between(u.slot, u.slot + N - 1),
                    ),
                    u_route.load_after(v.slot + 1),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let new_ds = DurationSegment::merge(
                    dur,
                    DurationSegment::merge3(
                        dur,
                        u_route.dur_before(u.slot - 1),
                        u_route.dur_between(data, u.slot + N, v.slot),
                        u_route.dur_between(data, u.slot, u.slot + N - 1),
                    ),
                    u_route.dur_after(v.slot + 1),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            } else {
                let new_dist = DistanceSegment::merge(
                    dist,
                    DistanceSegment::merge3(
                        dist,
                        u_route.dist_before(v.slot),
                        u_route.dist_between(u.slot, u.slot + N - 1),
                        u_route.dist_between(v.slot + 1, u.slot - 1),
                    ),
                    u_route.dist_after(u.slot + N),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                let new_ls = LoadSegment::merge(
                    LoadSegment::merge3(
                        u_route.load_before(v.slot),
                        u_route.load_between(u.slot, u.slot + N - 1),
                        u_route.load_between(v.slot + 1, u.slot - 1),
                    ),
                    u_route.load_after(u.slot + N),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let new_ds = DurationSegment::merge(
                    dur,
                    DurationSegment::merge3(
                        dur,
                        u_route.dur_before(v.slot),
                        u_route.dur_between(data, u.slot, u.slot + N - 1),
                        u_route.dur_between(data, v.slot + 1, u.slot - 1),
                    ),
                    u_route.dur_after(u.slot + N),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            }
        }

        delta
    }

    fn eval_swap(
        &self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        debug_assert!(u.slot > 0 && v.slot > 0);

        let u_route = &routes[u.route];
        let v_route = &routes[v.route];
        let dist = data.distance_matrix();
        let dur = data.duration_matrix();

        let mut delta = measure::ZERO;

        if u.route != v.route {
            let u_dist = DistanceSegment::merge3(
                dist,
                u_route.dist_before(u.slot - 1),
                v_route.dist_between(v.slot, v.slot + M - 1),
                u_route.dist_after(u.slot + N),
            );
            delta += u_dist.distance() - u_route.distance();

            let v_dist = DistanceSegment::merge3(
                dist,
                v_route.dist_before(v.slot - 1),
                u_route.dist_between(u.slot, u.slot + N - 1),
                v_route.dist_after(v.slot + M),
            );
            delta += v_dist.distance() - v_route.distance();

            delta -= cost_evaluator.tw_penalty(u_route.time_warp());
            delta -= cost_evaluator.load_penalty(u_route.load(), u_route.capacity());
            delta -= cost_evaluator.tw_penalty(v_route.time_warp());
            delta -= cost_evaluator.load_penalty(v_route.load(), v_route.capacity());

            if delta >= measure::ZERO {
                return delta;
            }

            let u_ds = DurationSegment::merge3(
                dur,
                u_route.dur_before(u.slot - 1),
                v_route.dur_between(data, v.slot, v.slot + M - 1),
                u_route.dur_after(u.slot + N),
            );
            delta += cost_evaluator.tw_penalty(u_ds.time_warp(u_route.max_duration()));

            let u_ls = LoadSegment::merge3(
                u_route.load_before(u.slot - 1),
                v_route.load_between(v.slot, v.slot + M - 1),
                u_route.load_after(u.slot + N),
            );
            delta += cost_evaluator.load_penalty(u_ls.load(), u_route.capacity());

            let v_ds = DurationSegment::merge3(
                dur,
                v_route.dur_before(v.slot - 1),
                u_route.dur_between(data, u.slot, u.slot + N - 1),
                v_route.dur_after(v.slot + M),
            );
            delta += cost_evaluator.tw_penalty(v_ds.time_warp(v_route.max_duration()));

            let v_ls = LoadSegment::merge3(
                v_route.load_before(v.slot - 1),
                u_route.load_between(u.slot, u.slot + N - 1),
                v_route.load_after(v.slot + M),
            );
            delta += cost_evaluator.load_penalty(v_ls.load(), v_route.capacity());
        } else {
            delta -= u_route.distance();
            delta -= cost_evaluator.load_penalty(u_route.load(), u_route.capacity());
            delta -= cost_evaluator.tw_penalty(u_route.time_warp());

            if u.slot < v.slot {
                let head = DistanceSegment::merge3(
                    dist,
                    u_route.dist_before(u.slot - 1),
                    u_route.dist_between(v.slot, v.slot + M - 1),
                    u_route.dist_between(u.slot + N, v.slot - 1),
                );
                let new_dist = DistanceSegment::merge3(
                    dist,
                    head,
                    u_route.dist_between(u.slot, u.slot + N - 1),
                    u_route.dist_after(v.slot + M),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                // The peak load depends on visit order, so the reordered
                // route needs a fresh load segment.
                let ls_head = LoadSegment::merge3(
                    u_route.load_before(u.slot - 1),
                    u_route.load_between(v.slot, v.slot + M - 1),
                    u_route.load_between(u.slot + N, v.slot - 1),
                );
                let new_ls = LoadSegment::merge3(
                    ls_head,
                    u_route.load_between(u.slot, u.slot + N - 1),
                    u_route.load_after(v.slot + M),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let ds_head = DurationSegment::merge3(
                    dur,
                    u_route.dur_before(u.slot - 1),
                    u_route.dur_between(data, v.slot, v.slot + M - 1),
                    u_route.dur_between(data, u.slot + N, v.slot - 1),
                );
                let new_ds = DurationSegment::merge3(
                    dur,
                    ds_head,
                    u_route.dur_between(data, u.slot, u.slot + N - 1),
                    u_route.dur_after(v.slot + M),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            } else {
                let head = DistanceSegment::merge3(
                    dist,
                    u_route.dist_before(v.slot - 1),
                    u_route.dist_between(u.slot, u.slot + N - 1),
                    u_route.dist_between(v.slot + M, u.slot - 1),
                );
                let new_dist = DistanceSegment::merge3(
                    dist,
                    head,
                    u_route.dist_between(v.slot, v.slot + M - 1),
                    u_route.dist_after(u.slot + N),
                );
                delta += new_dist.distance();

                if delta >= measure::ZERO {
                    return delta;
                }

                let ls_head = LoadSegment::merge3(
                    u_route.load_before(v.slot - 1),
                    u_route.load_between(u.slot, u.slot + N - 1),
                    u_route.load_between(v.slot + M, u.slot - 1),
                );
                let new_ls = LoadSegment::merge3(
                    ls_head,
                    u_route.load_between(v.slot, v.slot + M - 1),
                    u_route.load_after(u.slot + N),
                );
                delta += cost_evaluator.load_penalty(new_ls.load(), u_route.capacity());

                let ds_head = DurationSegment::merge3(
                    dur,
                    u_route.dur_before(v.slot - 1),
                    u_route.dur_between(data, u.slot, u.slot + N - 1),
                    u_route.dur_between(data, v.slot + M, u.slot - 1),
                );
                let new_ds = DurationSegment::merge3(
                    dur,
                    ds_head,
                    u_route.dur_between(data, v.slot, v.slot + M - 1),
                    u_route.dur_after(u.slot + N),
                );
                delta += cost_evaluator.tw_penalty(new_ds.time_warp(u_route.max_duration()));
            }
        }

        delta
    }
}

impl<const N: usize, const M: usize> Default for Exchange<N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const M: usize> NodeOperator for Exchange<N, M> {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost {
        if Self::contains_depot(&routes[u.route], u.slot, N) || Self::overlap(u, v) {
            return measure::ZERO;
        }

        if M > 0 && Self::contains_depot(&routes[v.route], v.slot, M) {
            return measure::ZERO;
        }

        if M == 0 {
            // Relocating U directly after its own predecessor does nothing.
            if u.route == v.route && u.slot == v.slot + 1 {
                return measure::ZERO;
            }

            self.eval_relocate(data, cost_evaluator, routes, u, v)
        } else {
            // Symmetric when N == M, so only evaluate ordered client pairs.
            if N == M && routes[u.route].location(u.slot) >= routes[v.route].location(v.slot) {
                return measure::ZERO;
            }

            if Self::adjacent(u, v) {
                return measure::ZERO;
            }

            self.eval_swap(data, cost_evaluator, routes, u, v)
        }
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], u: NodePos, v: NodePos) {
        let _ = data;

        if u.route != v.route {
            // Splice the N - M extra clients of U's segment in after V's
            // segment, back to front so the insertion slot stays put...
            let (u_route, v_route) = route_pair_mut(routes, u.route, v.route);
            for slot in (u.slot + M..u.slot + N).rev() {
                let client = u_route.remove(slot);
                v_route.insert(v.slot + M.max(1), client);
            }

            // ...and swap the overlapping M positions pairwise.
            for offset in 0..M {
                swap_slots(
                    routes,
                    (u.route, u.slot + offset),
                    (v.route, v.slot + offset),
                );
            }
        } else {
            let route = &mut routes[u.route];
            let visits = route.visits();
            let mut out = Vec::with_capacity(visits.len());

            let u_range = u.slot - 1..u.slot + N - 1;
            let v_range = v.slot - 1..v.slot + M.max(1) - 1;

            if M == 0 {
                // Relocate U's segment to just after V.
                for idx in 0..visits.len() {
                    if u_range.contains(&idx) {
                        continue;
                    }
                    out.push(visits[idx]);
                    if idx + 1 == v.slot {
                        out.extend_from_slice(&visits[u_range.clone()]);
                    }
                }
                if v.slot == 0 {
                    let mut front = visits[u_range].to_vec();
                    front.extend_from_slice(&out);
                    out = front;
                }
            } else {
                // Swap the two disjoint segments in place.
                for idx in 0..visits.len() {
                    if u_range.contains(&idx) {
                        if idx == u_range.start {
                            out.extend_from_slice(&visits[v.slot - 1..v.slot + M - 1]);
                        }
                    } else if v_range.contains(&idx) {
                        if idx == v_range.start {
                            out.extend_from_slice(&visits[u_range.clone()]);
                        }
                    } else {
                        out.push(visits[idx]);
                    }
                }
            }

            route.set_visits(out);
        }
    }
}
