pub mod crossover;
pub mod diversity;
pub mod eval;
pub mod problem;
pub mod repair;
pub mod rng;
pub mod search;
pub mod segment;
pub mod solution;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use eval::CostEvaluator;
pub use problem::{Client, Depot, ProblemData, VehicleType};
pub use rng::XorShift128;
pub use solution::{Route, Solution};
pub use solver::{SolveParams, StopCriterion, solve};
