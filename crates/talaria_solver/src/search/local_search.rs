use smallvec::SmallVec;
use tracing::{debug, instrument, trace};

use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::rng::XorShift128;
use crate::search::exchange::Exchange;
use crate::search::move_two_clients_reversed::MoveTwoClientsReversed;
use crate::search::operator::{NodeOperator, NodePos, RouteOperator};
use crate::search::relocate_star::RelocateStar;
use crate::search::route::SearchRoute;
use crate::search::swap_routes::SwapRoutes;
use crate::search::swap_star::SwapStar;
use crate::search::two_opt::TwoOpt;
use crate::solution::{Route, Solution};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// Exact penalised-cost delta of inserting `client` directly after
/// `after_slot` in the given route.
pub(crate) fn insert_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &SearchRoute,
    after_slot: usize,
    client: usize,
) -> Cost {
    let new_dist = DistanceSegment::merge3(
        data.distance_matrix(),
        route.dist_before(after_slot),
        DistanceSegment::at(client),
        route.dist_after(after_slot + 1),
    );
    let new_load = LoadSegment::merge3(
        route.load_before(after_slot),
        LoadSegment::client(data.client(client)),
        route.load_after(after_slot + 1),
    );
    let new_dur = DurationSegment::merge3(
        data.duration_matrix(),
        route.dur_before(after_slot),
        DurationSegment::at(client, data.location(client)),
        route.dur_after(after_slot + 1),
    );

    let fixed = if route.is_empty() {
        route.fixed_vehicle_cost()
    } else {
        measure::ZERO
    };

    new_dist.distance() - route.distance()
        + fixed
        + cost_evaluator.load_penalty(new_load.load(), route.capacity())
        - cost_evaluator.load_penalty(route.load(), route.capacity())
        + cost_evaluator.tw_penalty(new_dur.time_warp(route.max_duration()))
        - cost_evaluator.tw_penalty(route.time_warp())
}

/// Exact penalised-cost delta of removing the client at `slot` from the
/// given route.
pub(crate) fn remove_cost(
    data: &ProblemData,
    cost_evaluator: &CostEvaluator,
    route: &SearchRoute,
    slot: usize,
) -> Cost {
    let new_dist = DistanceSegment::merge(
        data.distance_matrix(),
        route.dist_before(slot - 1),
        route.dist_after(slot + 1),
    );
    let new_load = LoadSegment::merge(route.load_before(slot - 1), route.load_after(slot + 1));
    let new_dur = DurationSegment::merge(
        data.duration_matrix(),
        route.dur_before(slot - 1),
        route.dur_after(slot + 1),
    );

    let fixed = if route.size() == 1 {
        -route.fixed_vehicle_cost()
    } else {
        measure::ZERO
    };

    new_dist.distance() - route.distance()
        + fixed
        + cost_evaluator.load_penalty(new_load.load(), route.capacity())
        - cost_evaluator.load_penalty(route.load(), route.capacity())
        + cost_evaluator.tw_penalty(new_dur.time_warp(route.max_duration()))
        - cost_evaluator.tw_penalty(route.time_warp())
}

/// Projects an immutable solution onto one mutable route per available
/// vehicle, assigning each solution route to an unused vehicle of its type.
pub(crate) fn load_routes(data: &ProblemData, solution: &Solution) -> Vec<SearchRoute> {
    let mut routes = Vec::with_capacity(data.num_vehicles());
    for (vehicle_type, vt) in data.vehicle_types().iter().enumerate() {
        for _ in 0..vt.num_available {
            routes.push(SearchRoute::new(data, routes.len(), vehicle_type));
        }
    }

    let mut used = vec![false; routes.len()];
    for route in solution.routes() {
        let slot = routes
            .iter()
            .position(|r| r.vehicle_type() == route.vehicle_type() && !used[r.idx()])
            .expect("solution uses more vehicles than available");
        used[slot] = true;
        routes[slot].set_visits(route.visits().to_vec());
        routes[slot].update(data);
    }

    routes
}

/// Collapses mutable routes back into an immutable solution, dropping empty
/// routes.
pub(crate) fn export_routes(data: &ProblemData, routes: &[SearchRoute]) -> Solution {
    let routes = routes
        .iter()
        .filter(|route| !route.is_empty())
        .map(|route| Route::new(data, route.visits().to_vec(), route.vehicle_type()))
        .collect();

    Solution::from_routes(data, routes)
}

struct SearchState {
    routes: Vec<SearchRoute>,
    /// Current placement of every location; `None` for depots and unplanned
    /// clients.
    client_pos: Vec<Option<NodePos>>,
}

impl SearchState {
    fn load(data: &ProblemData, solution: &Solution) -> Self {
        let mut state = SearchState {
            routes: load_routes(data, solution),
            client_pos: vec![None; data.num_locations()],
        };
        for idx in 0..state.routes.len() {
            state.sync(idx);
        }

        state
    }

    /// Re-derives the client placement map of one route after a mutation.
    fn sync(&mut self, route_idx: usize) {
        let route = &self.routes[route_idx];
        for slot in 1..=route.size() {
            self.client_pos[route.location(slot)] = Some(NodePos::new(route_idx, slot));
        }
    }

    fn export(&self, data: &ProblemData) -> Solution {
        export_routes(data, &self.routes)
    }
}

/// The local search driver. Iterates node operators over the granular
/// neighbourhoods of all clients in a randomised order, applying the first
/// improving move found, then sweeps route operators over route pairs, and
/// alternates the two phases until neither improves the solution.
pub struct LocalSearch {
    neighbours: Vec<Vec<usize>>,
    node_ops: Vec<Box<dyn NodeOperator>>,
    route_ops: Vec<Box<dyn RouteOperator>>,
}

impl LocalSearch {
    pub fn new(neighbours: Vec<Vec<usize>>) -> Self {
        LocalSearch {
            neighbours,
            node_ops: Vec::new(),
            route_ops: Vec::new(),
        }
    }

    /// A driver loaded with the full operator suite.
    pub fn with_default_operators(neighbours: Vec<Vec<usize>>) -> Self {
        let mut ls = Self::new(neighbours);

        ls.add_node_operator(Box::new(Exchange::<1, 0>::new()));
        ls.add_node_operator(Box::new(Exchange::<2, 0>::new()));
        ls.add_node_operator(Box::new(Exchange::<3, 0>::new()));
        ls.add_node_operator(Box::new(Exchange::<1, 1>::new()));
        ls.add_node_operator(Box::new(Exchange::<2, 1>::new()));
        ls.add_node_operator(Box::new(Exchange::<3, 1>::new()));
        ls.add_node_operator(Box::new(Exchange::<2, 2>::new()));
        ls.add_node_operator(Box::new(Exchange::<3, 2>::new()));
        ls.add_node_operator(Box::new(Exchange::<3, 3>::new()));
        ls.add_node_operator(Box::new(MoveTwoClientsReversed::new()));
        ls.add_node_operator(Box::new(TwoOpt::new()));

        ls.add_route_operator(Box::new(RelocateStar::new()));
        ls.add_route_operator(Box::new(SwapStar::new()));
        ls.add_route_operator(Box::new(SwapRoutes::new()));

        ls
    }

    pub fn add_node_operator(&mut self, op: Box<dyn NodeOperator>) {
        self.node_ops.push(op);
    }

    pub fn add_route_operator(&mut self, op: Box<dyn RouteOperator>) {
        self.route_ops.push(op);
    }

    /// Runs the search to a local optimum of all registered operators. The
    /// input solution is not mutated; a possibly improved solution is
    /// returned.
    #[instrument(skip_all, level = "debug")]
    pub fn search(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        solution: &Solution,
        rng: &mut XorShift128,
    ) -> Solution {
        let mut state = SearchState::load(data, solution);

        let mut order: Vec<usize> = data.client_indices().collect();
        rng.shuffle(&mut order);

        for op in &mut self.route_ops {
            op.init(data, &state.routes);
        }

        loop {
            let node_improved = self.node_phase(data, cost_evaluator, &mut state, &order);
            let route_improved = self.route_phase(data, cost_evaluator, &mut state);

            if !node_improved && !route_improved {
                break;
            }
        }

        state.export(data)
    }

    fn node_phase(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        state: &mut SearchState,
        order: &[usize],
    ) -> bool {
        let mut improved_any = false;

        loop {
            let mut improved_pass = false;

            for &u_client in order {
                match state.client_pos[u_client] {
                    None => {
                        if self.try_insert_missing(data, cost_evaluator, state, u_client) {
                            improved_pass = true;
                        }
                    }
                    Some(_) => {
                        if self.improve_client(data, cost_evaluator, state, u_client) {
                            improved_pass = true;
                        }
                    }
                }
            }

            if !improved_pass {
                break;
            }
            improved_any = true;
        }

        improved_any
    }

    /// Scans U's neighbourhood with every node operator, applying the first
    /// improving move and rescanning until U's neighbourhood is exhausted.
    fn improve_client(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        state: &mut SearchState,
        u_client: usize,
    ) -> bool {
        let mut improved = false;

        'rescan: loop {
            let Some(u_pos) = state.client_pos[u_client] else {
                return improved;
            };

            // Forfeiting an optional client can beat any detour.
            if !data.client(u_client).required {
                let route = &state.routes[u_pos.route];
                let delta = remove_cost(data, cost_evaluator, route, u_pos.slot)
                    + data.client(u_client).prize;
                if delta < measure::ZERO {
                    trace!(client = u_client, delta, "removing optional client");
                    state.routes[u_pos.route].remove(u_pos.slot);
                    state.client_pos[u_client] = None;
                    self.after_mutation(data, state, &[u_pos.route]);
                    improved = true;
                    continue 'rescan;
                }
            }

            for n_idx in 0..self.neighbours[u_client].len() {
                let v_client = self.neighbours[u_client][n_idx];
                let Some(v_pos) = state.client_pos[v_client] else {
                    continue;
                };
                let u_pos = state.client_pos[u_client].expect("u is planned");

                if self.try_node_ops(data, cost_evaluator, state, u_pos, v_pos) {
                    improved = true;
                    continue 'rescan;
                }
            }

            // Also consider moving U into one empty route per vehicle type.
            let mut tried = vec![false; data.num_vehicle_types()];
            for route_idx in 0..state.routes.len() {
                let vehicle_type = state.routes[route_idx].vehicle_type();
                if !state.routes[route_idx].is_empty() || tried[vehicle_type] {
                    continue;
                }
                tried[vehicle_type] = true;

                let u_pos = state.client_pos[u_client].expect("u is planned");
                let v_pos = NodePos::new(route_idx, 0);
                if self.try_node_ops(data, cost_evaluator, state, u_pos, v_pos) {
                    improved = true;
                    continue 'rescan;
                }
            }

            return improved;
        }
    }

    fn try_node_ops(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        state: &mut SearchState,
        u_pos: NodePos,
        v_pos: NodePos,
    ) -> bool {
        for op_idx in 0..self.node_ops.len() {
            let delta =
                self.node_ops[op_idx].evaluate(data, cost_evaluator, &state.routes, u_pos, v_pos);
            if delta < measure::ZERO {
                trace!(?u_pos, ?v_pos, delta, "applying node move");
                self.node_ops[op_idx].apply(data, &mut state.routes, u_pos, v_pos);

                let touched: SmallVec<[usize; 2]> = if u_pos.route == v_pos.route {
                    SmallVec::from_slice(&[u_pos.route])
                } else {
                    SmallVec::from_slice(&[u_pos.route, v_pos.route])
                };
                self.after_mutation(data, state, &touched);
                return true;
            }
        }

        false
    }

    /// Tries to place an unplanned client. Required clients are inserted at
    /// their cheapest position regardless of cost; optional clients only
    /// when the detour is cheaper than the forfeited prize.
    fn try_insert_missing(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        state: &mut SearchState,
        client: usize,
    ) -> bool {
        let mut best: Option<(Cost, NodePos)> = None;

        let mut consider = |cost: Cost, pos: NodePos, best: &mut Option<(Cost, NodePos)>| {
            if best.is_none_or(|(current, _)| cost < current) {
                *best = Some((cost, pos));
            }
        };

        for &v_client in &self.neighbours[client] {
            if let Some(v_pos) = state.client_pos[v_client] {
                let route = &state.routes[v_pos.route];
                let cost = insert_cost(data, cost_evaluator, route, v_pos.slot, client);
                consider(cost, v_pos, &mut best);
            }
        }

        let mut tried = vec![false; data.num_vehicle_types()];
        for route_idx in 0..state.routes.len() {
            let route = &state.routes[route_idx];
            if !route.is_empty() || tried[route.vehicle_type()] {
                continue;
            }
            tried[route.vehicle_type()] = true;

            let cost = insert_cost(data, cost_evaluator, route, 0, client);
            consider(cost, NodePos::new(route_idx, 0), &mut best);
        }

        let Some((cost, after)) = best else {
            return false;
        };

        let required = data.client(client).required;
        if !required && cost - data.client(client).prize >= measure::ZERO {
            return false;
        }

        trace!(client, cost, "inserting unplanned client");
        state.routes[after.route].insert(after.slot + 1, client);
        self.after_mutation(data, state, &[after.route]);

        true
    }

    fn route_phase(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        state: &mut SearchState,
    ) -> bool {
        let mut improved_any = false;

        loop {
            let mut improved_pass = false;

            for first in 0..state.routes.len() {
                for second in first + 1..state.routes.len() {
                    for op_idx in 0..self.route_ops.len() {
                        let delta = self.route_ops[op_idx].evaluate(
                            data,
                            cost_evaluator,
                            &state.routes,
                            first,
                            second,
                        );
                        if delta < measure::ZERO {
                            debug!(first, second, delta, "applying route move");
                            self.route_ops[op_idx].apply(data, &mut state.routes, first, second);
                            self.after_mutation(data, state, &[first, second]);
                            improved_pass = true;
                        }
                    }
                }
            }

            if !improved_pass {
                break;
            }
            improved_any = true;
        }

        improved_any
    }

    /// Refreshes caches and bookkeeping for the given mutated routes.
    fn after_mutation(&mut self, data: &ProblemData, state: &mut SearchState, touched: &[usize]) {
        for &route_idx in touched {
            state.routes[route_idx].update(data);
        }
        for &route_idx in touched {
            for op in &mut self.route_ops {
                op.update(&state.routes[route_idx]);
            }
            state.sync(route_idx);
        }
    }
}
