use crate::eval::CostEvaluator;
use crate::problem::{ProblemData, measure::Cost};
use crate::search::route::SearchRoute;

/// A client position: a route index and a slot within that route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePos {
    pub route: usize,
    pub slot: usize,
}

impl NodePos {
    pub fn new(route: usize, slot: usize) -> Self {
        NodePos { route, slot }
    }
}

/// An operator over a pair of client positions.
///
/// `evaluate` is pure: it returns the signed change in penalised cost that
/// `apply` would cause, without mutating anything. Invalid candidates (depot
/// crossings, overlaps) evaluate to a neutral zero, never an error. `apply`
/// mutates the visit sequences only; refreshing the routes' caches is the
/// driver's responsibility.
pub trait NodeOperator {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        u: NodePos,
        v: NodePos,
    ) -> Cost;

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], u: NodePos, v: NodePos);
}

/// An operator over a pair of routes. `init` runs once per search pass;
/// `update` is called whenever a route changed, so implementations can
/// invalidate per-route caches.
pub trait RouteOperator {
    fn init(&mut self, data: &ProblemData, routes: &[SearchRoute]) {
        let _ = (data, routes);
    }

    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        first: usize,
        second: usize,
    ) -> Cost;

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], first: usize, second: usize);

    fn update(&mut self, route: &SearchRoute) {
        let _ = route;
    }
}
