use serde::Serialize;

use crate::problem::{
    ProblemData,
    measure::{self, Cost, Distance, Duration, Load},
};
use crate::segment::{DistanceSegment, DurationSegment, LoadSegment};

/// A single vehicle's circuit: an ordered list of client visits starting and
/// ending at the vehicle type's depot, with all aggregates precomputed at
/// construction. Immutable; the search engine works on its own mutable
/// projection and exports back to this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    visits: Vec<usize>,
    vehicle_type: usize,
    distance: Distance,
    duration: Duration,
    delivery: Load,
    pickup: Load,
    excess_load: Load,
    time_warp: Duration,
    prizes: Cost,
    fixed_vehicle_cost: Cost,
    release_time: Duration,
    start_time: Duration,
    end_time: Duration,
    slack: Duration,
    centroid: (f64, f64),
}

impl Route {
    /// Computes a route visiting the given clients with a vehicle of the
    /// given type. Panics when a visit is not a valid client location; use
    /// [`Solution::new`](crate::solution::Solution::new) for checked
    /// construction.
    pub fn new(data: &ProblemData, visits: Vec<usize>, vehicle_type: usize) -> Self {
        let vt = data.vehicle_type(vehicle_type);
        let depot = vt.depot;

        let mut distance = DistanceSegment::at(depot);
        let mut load = LoadSegment::empty();
        let mut duration = DurationSegment::depot(depot, data.location(depot), vt);
        let mut prizes = measure::ZERO;
        let mut centroid = (0.0, 0.0);

        for &client in &visits {
            let location = data.location(client);
            distance = DistanceSegment::merge(
                data.distance_matrix(),
                distance,
                DistanceSegment::at(client),
            );
            load = LoadSegment::merge(load, LoadSegment::client(data.client(client)));
            duration = DurationSegment::merge(
                data.duration_matrix(),
                duration,
                DurationSegment::at(client, location),
            );

            prizes = prizes + data.client(client).prize;
            centroid.0 += location.x() as f64 / visits.len() as f64;
            centroid.1 += location.y() as f64 / visits.len() as f64;
        }

        distance = DistanceSegment::merge(
            data.distance_matrix(),
            distance,
            DistanceSegment::at(depot),
        );
        duration = DurationSegment::merge(
            data.duration_matrix(),
            duration,
            DurationSegment::depot(depot, data.location(depot), vt),
        );

        let time_warp = duration.time_warp(vt.max_duration);
        let start_time = duration.tw_early();

        Route {
            vehicle_type,
            distance: distance.distance(),
            duration: duration.duration(),
            delivery: load.delivery(),
            pickup: load.pickup(),
            excess_load: (load.load() - vt.capacity).max(measure::ZERO),
            time_warp,
            prizes,
            fixed_vehicle_cost: if visits.is_empty() {
                measure::ZERO
            } else {
                vt.fixed_cost
            },
            release_time: duration.release_time(),
            start_time,
            end_time: start_time + duration.duration() - time_warp,
            slack: duration.tw_late() - duration.tw_early(),
            centroid,
            visits,
        }
    }

    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    pub fn excess_load(&self) -> Load {
        self.excess_load
    }

    pub fn has_excess_load(&self) -> bool {
        self.excess_load > measure::ZERO
    }

    pub fn time_warp(&self) -> Duration {
        self.time_warp
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp > measure::ZERO
    }

    pub fn is_feasible(&self) -> bool {
        !self.has_excess_load() && !self.has_time_warp()
    }

    pub fn prizes(&self) -> Cost {
        self.prizes
    }

    pub fn fixed_vehicle_cost(&self) -> Cost {
        self.fixed_vehicle_cost
    }

    pub fn release_time(&self) -> Duration {
        self.release_time
    }

    /// Earliest departure time from the depot that minimises this route's
    /// duration.
    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn end_time(&self) -> Duration {
        self.end_time
    }

    /// How much the departure from the depot can be delayed beyond
    /// [`start_time`](Self::start_time) without increasing duration or time
    /// warp.
    pub fn slack(&self) -> Duration {
        self.slack
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }
}
