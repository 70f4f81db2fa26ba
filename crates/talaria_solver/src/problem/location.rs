use serde::{Deserialize, Serialize};

use crate::problem::measure::{self, Coordinate, Cost, Duration, Load};

/// A location that must (or, when optional, may) be visited by some vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub x: Coordinate,
    pub y: Coordinate,
    pub delivery: Load,
    pub pickup: Load,
    pub service_duration: Duration,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub release_time: Duration,
    pub prize: Cost,
    /// Required clients must be visited; optional clients may be skipped at
    /// the cost of forfeiting their prize.
    pub required: bool,
    pub name: String,
}

impl Client {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Client {
            x,
            y,
            delivery: measure::ZERO,
            pickup: measure::ZERO,
            service_duration: measure::ZERO,
            tw_early: measure::ZERO,
            tw_late: measure::MAX,
            release_time: measure::ZERO,
            prize: measure::ZERO,
            required: true,
            name: String::new(),
        }
    }
}

/// A start and end point for vehicle routes. Depots have a time window but
/// no demand, service duration, or prize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub x: Coordinate,
    pub y: Coordinate,
    pub tw_early: Duration,
    pub tw_late: Duration,
    pub name: String,
}

impl Depot {
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Depot {
            x,
            y,
            tw_early: measure::ZERO,
            tw_late: measure::MAX,
            name: String::new(),
        }
    }
}

/// Uniform view over the client or depot at a location index. Depot demand,
/// service and prize read as zero.
#[derive(Debug, Clone, Copy)]
pub enum Location<'a> {
    Depot(&'a Depot),
    Client(&'a Client),
}

impl Location<'_> {
    pub fn x(&self) -> Coordinate {
        match self {
            Location::Depot(depot) => depot.x,
            Location::Client(client) => client.x,
        }
    }

    pub fn y(&self) -> Coordinate {
        match self {
            Location::Depot(depot) => depot.y,
            Location::Client(client) => client.y,
        }
    }

    pub fn delivery(&self) -> Load {
        match self {
            Location::Depot(_) => measure::ZERO,
            Location::Client(client) => client.delivery,
        }
    }

    pub fn pickup(&self) -> Load {
        match self {
            Location::Depot(_) => measure::ZERO,
            Location::Client(client) => client.pickup,
        }
    }

    pub fn service_duration(&self) -> Duration {
        match self {
            Location::Depot(_) => measure::ZERO,
            Location::Client(client) => client.service_duration,
        }
    }

    pub fn tw_early(&self) -> Duration {
        match self {
            Location::Depot(depot) => depot.tw_early,
            Location::Client(client) => client.tw_early,
        }
    }

    pub fn tw_late(&self) -> Duration {
        match self {
            Location::Depot(depot) => depot.tw_late,
            Location::Client(client) => client.tw_late,
        }
    }

    pub fn release_time(&self) -> Duration {
        match self {
            Location::Depot(_) => measure::ZERO,
            Location::Client(client) => client.release_time,
        }
    }
}
