use crate::eval::CostEvaluator;
use crate::problem::{
    ProblemData,
    measure::{self, Cost},
};
use crate::search::exchange::Relocate;
use crate::search::operator::{NodeOperator, NodePos, RouteOperator};
use crate::search::route::SearchRoute;

/// Evaluates all single-client relocations between a pair of routes, in both
/// directions, and applies the best. Amortises the per-route scan that the
/// granular neighbourhoods would otherwise repeat per client.
pub struct RelocateStar {
    relocate: Relocate,
    best: Option<(Cost, NodePos, NodePos)>,
}

impl RelocateStar {
    pub fn new() -> Self {
        RelocateStar {
            relocate: Relocate::new(),
            best: None,
        }
    }

    fn consider(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        from: usize,
        to: usize,
    ) {
        for u_slot in 1..=routes[from].size() {
            let u = NodePos::new(from, u_slot);
            for v_slot in 0..=routes[to].size() {
                let v = NodePos::new(to, v_slot);
                let delta = self.relocate.evaluate(data, cost_evaluator, routes, u, v);

                let improves = match self.best {
                    Some((best, _, _)) => delta < best,
                    None => delta < measure::ZERO,
                };
                if improves {
                    self.best = Some((delta, u, v));
                }
            }
        }
    }
}

impl Default for RelocateStar {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteOperator for RelocateStar {
    fn evaluate(
        &mut self,
        data: &ProblemData,
        cost_evaluator: &CostEvaluator,
        routes: &[SearchRoute],
        first: usize,
        second: usize,
    ) -> Cost {
        self.best = None;
        self.consider(data, cost_evaluator, routes, first, second);
        self.consider(data, cost_evaluator, routes, second, first);

        self.best.map_or(measure::ZERO, |(delta, _, _)| delta)
    }

    fn apply(&mut self, data: &ProblemData, routes: &mut [SearchRoute], first: usize, second: usize) {
        let _ = (first, second);
        let (_, u, v) = self.best.take().expect("apply without improving evaluate");
        self.relocate.apply(data, routes, u, v);
    }
}
