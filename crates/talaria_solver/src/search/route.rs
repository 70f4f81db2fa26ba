use crate::problem::{
    ProblemData,
    measure::{self, Cost, Distance, Duration, Load},
};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// A single vehicle's route under mutation by the local search.
///
/// Slots are indexed `0..=size + 1`: slot `0` is the starting depot, slots
/// `1..=size` hold clients, and slot `size + 1` is the returning depot. For
/// every slot the route caches the prefix and suffix segment summaries of all
/// three algebras, so operators can evaluate candidate moves by merging O(1)
/// cached segments.
///
/// Mutations mark the caches dirty; [`update`](SearchRoute::update) must run
/// before the next segment query. Queries on a dirty route are rejected in
/// debug builds.
pub struct SearchRoute {
    idx: usize,
    vehicle_type: usize,
    depot: usize,
    capacity: Load,
    fixed_cost: Cost,
    max_duration: Duration,

    visits: Vec<usize>,

    /// Cumulative distance up to each slot.
    cum_dist: Vec<Distance>,
    /// Single-slot segments, the building blocks for `between` queries.
    load_at: Vec<LoadSegment>,
    dur_at: Vec<DurationSegment>,
    /// Prefix [0..=i] and suffix [i..=size+1] summaries.
    load_before: Vec<LoadSegment>,
    load_after: Vec<LoadSegment>,
    dur_before: Vec<DurationSegment>,
    dur_after: Vec<DurationSegment>,

    dirty: bool,
    version: u64,
}

impl SearchRoute {
    pub fn new(data: &ProblemData, idx: usize, vehicle_type: usize) -> Self {
        let vt = data.vehicle_type(vehicle_type);

        let mut route = SearchRoute {
            idx,
            vehicle_type,
            depot: vt.depot,
            capacity: vt.capacity,
            fixed_cost: vt.fixed_cost,
            max_duration: vt.max_duration,
            visits: Vec::new(),
            cum_dist: Vec::new(),
            load_at: Vec::new(),
            dur_at: Vec::new(),
            load_before: Vec::new(),
            load_after: Vec::new(),
            dur_before: Vec::new(),
            dur_after: Vec::new(),
            dirty: true,
            version: 0,
        };

        route.update(data);
        route
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn capacity(&self) -> Load {
        self.capacity
    }

    pub fn fixed_vehicle_cost(&self) -> Cost {
        self.fixed_cost
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Number of clients on the route.
    pub fn size(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    /// The location at the given slot; the depot for slots `0` and
    /// `size + 1`.
    pub fn location(&self, slot: usize) -> usize {
        if slot == 0 || slot == self.visits.len() + 1 {
            self.depot
        } else {
            self.visits[slot - 1]
        }
    }

    pub fn is_depot_slot(&self, slot: usize) -> bool {
        slot == 0 || slot == self.visits.len() + 1
    }

    /// Bumped by every [`update`](SearchRoute::update); lets per-operator
    /// caches detect routes they have stale data for.
    pub fn version(&self) -> u64 {
        self.version
    }

    // -- mutations ---------------------------------------------------------

    /// Inserts `client` so that it ends up at the given slot,
    /// `1 <= slot <= size + 1`.
    pub fn insert(&mut self, slot: usize, client: usize) {
        self.visits.insert(slot - 1, client);
        self.dirty = true;
    }

    pub fn push(&mut self, client: usize) {
        self.visits.push(client);
        self.dirty = true;
    }

    /// Removes and returns the client at the given slot.
    pub fn remove(&mut self, slot: usize) -> usize {
        self.dirty = true;
        self.visits.remove(slot - 1)
    }

    /// Replaces the client at the given slot, returning the previous client.
    pub fn replace(&mut self, slot: usize, client: usize) -> usize {
        self.dirty = true;
        std::mem::replace(&mut self.visits[slot - 1], client)
    }

    /// Replaces the whole visit sequence.
    pub fn set_visits(&mut self, visits: Vec<usize>) {
        self.visits = visits;
        self.dirty = true;
    }

    /// Reverses the clients in slots `from..=to`.
    pub fn reverse(&mut self, from: usize, to: usize) {
        self.visits[from - 1..to].reverse();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recomputes all cached prefix and suffix summaries in one forward and
    /// one backward pass. Must be called after mutations, before any further
    /// segment query.
    pub fn update(&mut self, data: &ProblemData) {
        let num_slots = self.visits.len() + 2;
        let vt = data.vehicle_type(self.vehicle_type);
        let depot_location = data.location(self.depot);

        self.load_at.clear();
        self.dur_at.clear();
        self.load_at.push(LoadSegment::empty());
        self.dur_at
            .push(DurationSegment::depot(self.depot, depot_location, vt));
        for &client in &self.visits {
            self.load_at.push(LoadSegment::client(data.client(client)));
            self.dur_at
                .push(DurationSegment::at(client, data.location(client)));
        }
        self.load_at.push(LoadSegment::empty());
        self.dur_at
            .push(DurationSegment::depot(self.depot, depot_location, vt));

        self.cum_dist.clear();
        self.cum_dist.push(measure::ZERO);
        for slot in 1..num_slots {
            let edge = data.dist(self.location(slot - 1), self.location(slot));
            self.cum_dist.push(self.cum_dist[slot - 1] + edge);
        }

        self.load_before.clear();
        self.dur_before.clear();
        self.load_before.push(self.load_at[0]);
        self.dur_before.push(self.dur_at[0]);
        for slot in 1..num_slots {
            self.load_before
                .push(LoadSegment::merge(self.load_before[slot - 1], self.load_at[slot]));
            self.dur_before.push(DurationSegment::merge(
                data.duration_matrix(),
                self.dur_before[slot - 1],
                self.dur_at[slot],
            ));
        }

        self.load_after.resize(num_slots, LoadSegment::empty());
        self.dur_after.resize(num_slots, self.dur_at[num_slots - 1]);
        self.load_after[num_slots - 1] = self.load_at[num_slots - 1];
        self.dur_after[num_slots - 1] = self.dur_at[num_slots - 1];
        for slot in (0..num_slots - 1).rev() {
            self.load_after[slot] =
                LoadSegment::merge(self.load_at[slot], self.load_after[slot + 1]);
            self.dur_after[slot] = DurationSegment::merge(
                data.duration_matrix(),
                self.dur_at[slot],
                self.dur_after[slot + 1],
            );
        }

        self.version += 1;
        self.dirty = false;
    }

    // -- cached segment queries --------------------------------------------

    fn assert_fresh(&self) {
        debug_assert!(
            !self.dirty,
            "segment query on a mutated route; call update() first"
        );
    }

    pub fn dist_before(&self, slot: usize) -> DistanceSegment {
        self.assert_fresh();
        DistanceSegment::new(self.depot, self.location(slot), self.cum_dist[slot])
    }

    pub fn dist_after(&self, slot: usize) -> DistanceSegment {
        self.assert_fresh();
        let last = self.visits.len() + 1;
        DistanceSegment::new(
            self.location(slot),
            self.depot,
            self.cum_dist[last] - self.cum_dist[slot],
        )
    }

    /// Distance summary of slots `from..=to`.
    pub fn dist_between(&self, from: usize, to: usize) -> DistanceSegment {
        self.assert_fresh();
        DistanceSegment::new(
            self.location(from),
            self.location(to),
            self.cum_dist[to] - self.cum_dist[from],
        )
    }

    pub fn load_before(&self, slot: usize) -> LoadSegment {
        self.assert_fresh();
        self.load_before[slot]
    }

    pub fn load_after(&self, slot: usize) -> LoadSegment {
        self.assert_fresh();
        self.load_after[slot]
    }

    /// Load summary of slots `from..=to`, synthesised from the single-slot
    /// segments.
    pub fn load_between(&self, from: usize, to: usize) -> LoadSegment {
        self.assert_fresh();
        self.load_at[from + 1..=to]
            .iter()
            .fold(self.load_at[from], |acc, &seg| LoadSegment::merge(acc, seg))
    }

    /// Load summary of slots `from..=to` traversed in reverse order. The
    /// peak load is order-dependent, so this is not the same segment as
    /// [`load_between`](Self::load_between).
    pub fn load_between_reversed(&self, from: usize, to: usize) -> LoadSegment {
        self.assert_fresh();
        self.load_at[from..to]
            .iter()
            .rev()
            .fold(self.load_at[to], |acc, &seg| LoadSegment::merge(acc, seg))
    }

    /// Load summary of the single given slot.
    pub fn load_at(&self, slot: usize) -> LoadSegment {
        self.assert_fresh();
        self.load_at[slot]
    }

    /// Duration summary of the single given slot.
    pub fn dur_at(&self, slot: usize) -> DurationSegment {
        self.assert_fresh();
        self.dur_at[slot]
    }

    pub fn dur_before(&self, slot: usize) -> DurationSegment {
        self.assert_fresh();
        self.dur_before[slot]
    }

    pub fn dur_after(&self, slot: usize) -> DurationSegment {
        self.assert_fresh();
        self.dur_after[slot]
    }

    /// Duration summary of slots `from..=to`.
    pub fn dur_between(&self, data: &ProblemData, from: usize, to: usize) -> DurationSegment {
        self.assert_fresh();
        self.dur_at[from + 1..=to].iter().fold(self.dur_at[from], |acc, &seg| {
            DurationSegment::merge(data.duration_matrix(), acc, seg)
        })
    }

    /// Duration summary of slots `from..=to` traversed in reverse order.
    pub fn dur_between_reversed(
        &self,
        data: &ProblemData,
        from: usize,
        to: usize,
    ) -> DurationSegment {
        self.assert_fresh();
        self.dur_at[from..to].iter().rev().fold(self.dur_at[to], |acc, &seg| {
            DurationSegment::merge(data.duration_matrix(), acc, seg)
        })
    }

    /// Distance of slots `from..=to` traversed in reverse order.
    pub fn dist_between_reversed(&self, data: &ProblemData, from: usize, to: usize) -> Distance {
        self.assert_fresh();
        (from..to)
            .map(|slot| data.dist(self.location(slot + 1), self.location(slot)))
            .sum()
    }

    // -- route-level aggregates --------------------------------------------

    pub fn distance(&self) -> Distance {
        self.assert_fresh();
        self.cum_dist[self.visits.len() + 1]
    }

    pub fn load(&self) -> Load {
        self.assert_fresh();
        self.load_before[self.visits.len() + 1].load()
    }

    pub fn excess_load(&self) -> Load {
        (self.load() - self.capacity).max(measure::ZERO)
    }

    pub fn has_excess_load(&self) -> bool {
        self.excess_load() > measure::ZERO
    }

    pub fn duration(&self) -> Duration {
        self.assert_fresh();
        self.dur_before[self.visits.len() + 1].duration()
    }

    /// Time warp of the whole route, including any overrun of the vehicle's
    /// maximum duration.
    pub fn time_warp(&self) -> Duration {
        self.assert_fresh();
        self.dur_before[self.visits.len() + 1].time_warp(self.max_duration)
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp() > measure::ZERO
    }

    /// Penalised cost contribution of this route alone.
    pub fn penalised_cost(&self, cost_evaluator: &crate::eval::CostEvaluator) -> Cost {
        let fixed = if self.is_empty() {
            measure::ZERO
        } else {
            self.fixed_cost
        };

        self.distance()
            + fixed
            + cost_evaluator.load_penalty(self.load(), self.capacity)
            + cost_evaluator.tw_penalty(self.time_warp())
    }
}

/// Both routes of a pair, mutably. The two indices must differ.
pub fn route_pair_mut(
    routes: &mut [SearchRoute],
    first: usize,
    second: usize,
) -> (&mut SearchRoute, &mut SearchRoute) {
    assert_ne!(first, second);

    if first < second {
        let (head, tail) = routes.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = routes.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

/// Swaps the clients at two slots, possibly across routes.
pub fn swap_slots(
    routes: &mut [SearchRoute],
    (first_route, first_slot): (usize, usize),
    (second_route, second_slot): (usize, usize),
) {
    if first_route == second_route {
        let route = &mut routes[first_route];
        route.visits.swap(first_slot - 1, second_slot - 1);
        route.dirty = true;
    } else {
        let (first, second) = route_pair_mut(routes, first_route, second_route);
        std::mem::swap(
            &mut first.visits[first_slot - 1],
            &mut second.visits[second_slot - 1],
        );
        first.dirty = true;
        second.dirty = true;
    }
}
