pub mod route;
pub mod solution;

pub use route::Route;
pub use solution::{Solution, SolutionError};
