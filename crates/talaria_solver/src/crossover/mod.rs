//! Crossover operators consumed by the outer loop's reproduction step.

pub mod ordered;
pub mod selective_route_exchange;

pub use ordered::ordered_crossover;
pub use selective_route_exchange::selective_route_exchange;
