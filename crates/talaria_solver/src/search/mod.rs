//! The local search engine: the mutable route representation, the node and
//! route operators, the granular neighbourhoods, and the driver that
//! coordinates them.

pub mod exchange;
pub mod local_search;
pub mod move_two_clients_reversed;
pub mod neighbours;
pub mod operator;
pub mod relocate_star;
pub mod route;
pub mod swap_routes;
pub mod swap_star;
pub mod two_opt;

pub use exchange::{Exchange, Relocate};
pub use local_search::LocalSearch;
pub use move_two_clients_reversed::MoveTwoClientsReversed;
pub use neighbours::{NeighbourhoodParams, compute_neighbours};
pub use operator::{NodeOperator, NodePos, RouteOperator};
pub use relocate_star::RelocateStar;
pub use route::SearchRoute;
pub use swap_routes::SwapRoutes;
pub use swap_star::SwapStar;
pub use two_opt::TwoOpt;
