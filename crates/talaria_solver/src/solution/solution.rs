use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;

use crate::problem::{
    ProblemData,
    measure::{self, Cost, Distance, Duration, Load},
};
use crate::solution::Route;

#[derive(Error, Debug)]
pub enum SolutionError {
    #[error("route visits location {location}, which is not a client")]
    NotAClient { location: usize },
    #[error("client {client} is visited more than once")]
    DuplicateClient { client: usize },
    #[error("route uses vehicle type {vehicle_type}, but there are {num_vehicle_types} types")]
    VehicleTypeOutOfRange {
        vehicle_type: usize,
        num_vehicle_types: usize,
    },
    #[error("vehicle type {vehicle_type} is used by {used} routes, but only {available} are available")]
    TooManyVehicles {
        vehicle_type: usize,
        used: usize,
        available: usize,
    },
}

/// An immutable set of routes, with aggregates and the per-location
/// predecessor/successor map precomputed. Field order matches the
/// serialization contract.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    num_clients: usize,
    num_missing_clients: usize,
    distance: Distance,
    excess_load: Load,
    fixed_vehicle_cost: Cost,
    prizes: Cost,
    uncollected_prizes: Cost,
    time_warp: Duration,
    routes: Vec<Route>,
    /// For each location, the (predecessor, successor) pair in its route.
    /// `None` for depots and unvisited clients.
    neighbours: Vec<Option<(usize, usize)>>,
    #[serde(skip)]
    is_complete: bool,
}

impl Solution {
    /// Builds a solution from `(vehicle_type, visits)` route descriptions.
    /// Empty route descriptions are dropped.
    pub fn new(
        data: &ProblemData,
        routes: Vec<(usize, Vec<usize>)>,
    ) -> Result<Self, SolutionError> {
        let mut used = vec![0usize; data.num_vehicle_types()];
        let mut seen = vec![false; data.num_locations()];

        for (vehicle_type, visits) in &routes {
            if *vehicle_type >= data.num_vehicle_types() {
                return Err(SolutionError::VehicleTypeOutOfRange {
                    vehicle_type: *vehicle_type,
                    num_vehicle_types: data.num_vehicle_types(),
                });
            }

            if !visits.is_empty() {
                used[*vehicle_type] += 1;
            }

            for &client in visits {
                if client < data.num_depots() || client >= data.num_locations() {
                    return Err(SolutionError::NotAClient { location: client });
                }

                if std::mem::replace(&mut seen[client], true) {
                    return Err(SolutionError::DuplicateClient { client });
                }
            }
        }

        for (vehicle_type, &count) in used.iter().enumerate() {
            let available = data.vehicle_type(vehicle_type).num_available;
            if count > available {
                return Err(SolutionError::TooManyVehicles {
                    vehicle_type,
                    used: count,
                    available,
                });
            }
        }

        let routes = routes
            .into_iter()
            .filter(|(_, visits)| !visits.is_empty())
            .map(|(vehicle_type, visits)| Route::new(data, visits, vehicle_type))
            .collect::<Vec<_>>();

        Ok(Self::from_routes(data, routes))
    }

    /// Assembles a solution from already-computed routes. Used by the search
    /// driver's export path, which constructs routes that are valid by
    /// construction.
    pub(crate) fn from_routes(data: &ProblemData, routes: Vec<Route>) -> Self {
        let mut neighbours = vec![None; data.num_locations()];
        for route in &routes {
            let depot = data.vehicle_type(route.vehicle_type()).depot;
            let visits = route.visits();
            for (pos, &client) in visits.iter().enumerate() {
                let pred = if pos == 0 { depot } else { visits[pos - 1] };
                let succ = if pos + 1 == visits.len() {
                    depot
                } else {
                    visits[pos + 1]
                };
                neighbours[client] = Some((pred, succ));
            }
        }

        let num_clients = routes.iter().map(Route::len).sum();
        let mut uncollected_prizes = measure::ZERO;
        let mut is_complete = true;
        for client in data.client_indices() {
            if neighbours[client].is_none() {
                let client_data = data.client(client);
                uncollected_prizes = uncollected_prizes + client_data.prize;
                is_complete &= !client_data.required;
            }
        }

        Solution {
            num_clients,
            num_missing_clients: data.num_clients() - num_clients,
            distance: routes.iter().map(Route::distance).sum(),
            excess_load: routes.iter().map(Route::excess_load).sum(),
            fixed_vehicle_cost: routes.iter().map(Route::fixed_vehicle_cost).sum(),
            prizes: routes.iter().map(Route::prizes).sum(),
            uncollected_prizes,
            time_warp: routes.iter().map(Route::time_warp).sum(),
            routes,
            neighbours,
            is_complete,
        }
    }

    /// The solution without any routes; every client is unvisited.
    pub fn empty(data: &ProblemData) -> Self {
        Self::from_routes(data, Vec::new())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_clients(&self) -> usize {
        self.num_clients
    }

    pub fn num_missing_clients(&self) -> usize {
        self.num_missing_clients
    }

    pub fn neighbours(&self) -> &[Option<(usize, usize)>] {
        &self.neighbours
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn excess_load(&self) -> Load {
        self.excess_load
    }

    pub fn has_excess_load(&self) -> bool {
        self.excess_load > measure::ZERO
    }

    pub fn fixed_vehicle_cost(&self) -> Cost {
        self.fixed_vehicle_cost
    }

    pub fn prizes(&self) -> Cost {
        self.prizes
    }

    pub fn uncollected_prizes(&self) -> Cost {
        self.uncollected_prizes
    }

    pub fn time_warp(&self) -> Duration {
        self.time_warp
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp > measure::ZERO
    }

    /// Whether all required clients are visited.
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_feasible(&self) -> bool {
        self.is_complete && !self.has_excess_load() && !self.has_time_warp()
    }

    fn signature(&self) -> Vec<(usize, &[usize])> {
        let mut signature = self
            .routes
            .iter()
            .map(|route| (route.vehicle_type(), route.visits()))
            .collect::<Vec<_>>();

        signature.sort_unstable();
        signature
    }
}

/// Two solutions are equal when they consist of the same routes, regardless
/// of the order in which the routes are listed.
impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn rejects_depot_visits_and_duplicates() {
        let data = test_utils::ok_small();

        let result = Solution::new(&data, vec![(0, vec![0, 1])]);
        assert!(matches!(result, Err(SolutionError::NotAClient { location: 0 })));

        let result = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![2])]);
        assert!(matches!(
            result,
            Err(SolutionError::DuplicateClient { client: 2 })
        ));
    }

    #[test]
    fn rejects_unavailable_vehicles() {
        let data = test_utils::ok_small();

        let result = Solution::new(&data, vec![(7, vec![1])]);
        assert!(matches!(
            result,
            Err(SolutionError::VehicleTypeOutOfRange { .. })
        ));

        // ok_small has three vehicles of type 0.
        let result = Solution::new(
            &data,
            vec![(0, vec![1]), (0, vec![2]), (0, vec![3]), (0, vec![4])],
        );
        assert!(matches!(result, Err(SolutionError::TooManyVehicles { .. })));
    }

    #[test]
    fn neighbours_wrap_around_the_depot() {
        let data = test_utils::ok_small();
        let solution = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![3])]).unwrap();

        assert_eq!(solution.neighbours()[0], None);
        assert_eq!(solution.neighbours()[1], Some((0, 2)));
        assert_eq!(solution.neighbours()[2], Some((1, 0)));
        assert_eq!(solution.neighbours()[3], Some((0, 0)));
        assert_eq!(solution.neighbours()[4], None);

        assert_eq!(solution.num_clients(), 3);
        assert_eq!(solution.num_missing_clients(), 1);
        assert!(!solution.is_complete());
    }

    #[test]
    fn equality_ignores_route_order() {
        let data = test_utils::ok_small();
        let a = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![3, 4])]).unwrap();
        let b = Solution::new(&data, vec![(0, vec![3, 4]), (0, vec![1, 2])]).unwrap();
        let c = Solution::new(&data, vec![(0, vec![2, 1]), (0, vec![3, 4])]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn penalised_cost_ignores_route_order_and_vehicle_relabelling() {
        let data = test_utils::ok_small();
        let evaluator = crate::eval::CostEvaluator::new(20, 6);

        // Same routes listed in a different order, on different (same-type)
        // vehicles.
        let a = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![3, 4])]).unwrap();
        let b = Solution::new(&data, vec![(0, vec![3, 4]), (0, vec![1, 2])]).unwrap();

        assert_eq!(evaluator.penalised_cost(&a), evaluator.penalised_cost(&b));
    }

    #[test]
    fn aggregates_sum_over_routes() {
        let data = test_utils::ok_small();
        let solution = Solution::new(&data, vec![(0, vec![1, 2]), (0, vec![3, 4])]).unwrap();

        let by_routes: Distance = solution.routes().iter().map(Route::distance).sum();
        assert_eq!(solution.distance(), by_routes);
        assert!(solution.is_complete());
    }
}
