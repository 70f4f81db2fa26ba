use crate::problem::measure::{self, Cost, Duration, Load};
use crate::solution::Solution;

/// Turns raw route statistics into a scalar objective. Infeasibility is not
/// an error: excess load and time warp are priced into the penalised cost
/// using the two coefficients carried here, which the outer loop tunes to
/// steer the search towards feasibility.
#[derive(Debug, Clone, Copy)]
pub struct CostEvaluator {
    capacity_penalty: Cost,
    tw_penalty: Cost,
}

impl CostEvaluator {
    pub fn new(capacity_penalty: Cost, tw_penalty: Cost) -> Self {
        CostEvaluator {
            capacity_penalty,
            tw_penalty,
        }
    }

    /// Penalty for carrying the given amount of excess load.
    pub fn excess_load_penalty(&self, excess_load: Load) -> Cost {
        excess_load * self.capacity_penalty
    }

    /// Penalty incurred by loading `load` into a vehicle of the given
    /// capacity. Zero when the load fits.
    pub fn load_penalty(&self, load: Load, capacity: Load) -> Cost {
        self.excess_load_penalty((load - capacity).max(measure::ZERO))
    }

    /// Penalty incurred by the given amount of time warp.
    pub fn tw_penalty(&self, time_warp: Duration) -> Cost {
        time_warp * self.tw_penalty
    }

    /// Objective value with infeasibility priced in: travel distance, fixed
    /// vehicle costs, load and time-warp penalties, and the prizes of
    /// unvisited clients.
    pub fn penalised_cost(&self, solution: &Solution) -> Cost {
        solution.distance()
            + solution.fixed_vehicle_cost()
            + self.excess_load_penalty(solution.excess_load())
            + self.tw_penalty(solution.time_warp())
            + solution.uncollected_prizes()
    }

    /// Objective value of a feasible solution. Returns [`measure::MAX`] - the
    /// documented infeasible sentinel, unreachable as a penalised cost of any
    /// valid instance - when the solution is infeasible.
    pub fn cost(&self, solution: &Solution) -> Cost {
        if solution.is_feasible() {
            self.penalised_cost(solution)
        } else {
            measure::MAX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_penalty_is_zero_within_capacity() {
        let evaluator = CostEvaluator::new(2, 1);
        assert_eq!(evaluator.load_penalty(10, 10), measure::ZERO);
        assert_eq!(evaluator.load_penalty(8, 10), measure::ZERO);
        assert_eq!(evaluator.load_penalty(13, 10), 6);
    }

    #[test]
    fn tw_penalty_scales_linearly() {
        let evaluator = CostEvaluator::new(1, 3);
        assert_eq!(evaluator.tw_penalty(measure::ZERO), measure::ZERO);
        assert_eq!(evaluator.tw_penalty(4), 12);
    }
}
